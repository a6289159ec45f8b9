use folio::{FilesystemResourceProvider, PdfRendererBuilder, PipelineError, RenderConfig, parse_xhtml};
use folio_types::LaidOutDocument;
use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

fn usage(program: &str) -> ! {
    eprintln!("Paints a laid-out document into a tagged PDF.");
    eprintln!();
    eprintln!("Usage: {} <layout.json> <output.pdf> [--source <document.xhtml>]", program);
    eprintln!();
    eprintln!("Settings are read from FOLIO_* environment variables, e.g. FOLIO_TAGGED=false.");
    std::process::exit(1);
}

fn main() -> Result<(), PipelineError> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("folio");
    let (layout_path, output_path, source_path) = match args.as_slice() {
        [_, layout, output] => (layout, output, None),
        [_, layout, output, flag, source] if flag == "--source" => (layout, output, Some(source)),
        _ => usage(program),
    };

    let config = RenderConfig::from_env()?;
    log::info!("Loading layout from {}", layout_path);
    let mut doc: LaidOutDocument = serde_json::from_str(&fs::read_to_string(layout_path)?)?;
    if let Some(source_path) = source_path {
        log::info!("Loading source document from {}", source_path);
        doc.elements = parse_xhtml(&fs::read_to_string(source_path)?)?;
    }

    let base = Path::new(layout_path).parent().unwrap_or_else(|| Path::new("."));
    let output = BufWriter::new(File::create(output_path)?);
    let mut renderer = PdfRendererBuilder::new()
        .with_config(config)
        .with_resources(Arc::new(FilesystemResourceProvider::new(base)))
        .build(output)?;
    renderer.create_pdf(&doc)?;
    let pages = renderer.page_count();
    renderer.finish()?.flush()?;

    println!("Wrote {} pages to {}", pages, output_path);
    Ok(())
}
