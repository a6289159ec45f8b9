pub mod fixtures;
pub mod pdf_assertions;

use folio::{CreationListener, PdfRendererBuilder, PipelineError, RenderConfig};
use folio_types::LaidOutDocument;
use lopdf::Document as LopdfDocument;
use std::io::Cursor;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Device units per point used by every fixture.
pub const DPP: f32 = 20.0;

/// Wrapper around a generated PDF with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    /// Create a GeneratedPdf from raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc })
    }

    /// Get the number of pages in the PDF
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Save PDF to a file for manual debugging
    #[allow(dead_code)]
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

pub fn test_config() -> RenderConfig {
    RenderConfig {
        dots_per_point: DPP,
        ..RenderConfig::default()
    }
}

/// Render a single document with the test configuration
pub fn render(doc: &LaidOutDocument) -> Result<GeneratedPdf, Box<dyn std::error::Error>> {
    render_with(doc, test_config())
}

pub fn render_with(doc: &LaidOutDocument, config: RenderConfig) -> Result<GeneratedPdf, Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut renderer = PdfRendererBuilder::new().with_config(config).build(Cursor::new(Vec::new()))?;
    renderer.create_pdf(doc)?;
    let bytes = renderer.finish()?.into_inner();
    GeneratedPdf::from_bytes(bytes)
}

/// Render with a creation listener attached
#[allow(dead_code)]
pub fn render_with_listener(
    doc: &LaidOutDocument,
    listener: Box<dyn CreationListener>,
) -> Result<GeneratedPdf, Box<dyn std::error::Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut renderer = PdfRendererBuilder::new()
        .with_config(test_config())
        .with_listener(listener)
        .build(Cursor::new(Vec::new()))?;
    renderer.create_pdf(doc)?;
    let bytes = renderer.finish()?.into_inner();
    GeneratedPdf::from_bytes(bytes)
}

/// Render several documents into one file
#[allow(dead_code)]
pub fn render_all(docs: &[LaidOutDocument]) -> Result<GeneratedPdf, PipelineError> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut renderer = PdfRendererBuilder::new()
        .with_config(test_config())
        .build(Cursor::new(Vec::new()))?;
    let (first, rest) = docs.split_first().ok_or(PipelineError::EmptyDocument)?;
    renderer.create_pdf(first)?;
    for doc in rest {
        renderer.write_next_document(doc)?;
    }
    let bytes = renderer.finish()?.into_inner();
    GeneratedPdf::from_bytes(bytes).map_err(|e| PipelineError::State(e.to_string()))
}
