mod common;

use common::fixtures::*;
use common::pdf_assertions::*;
use common::{GeneratedPdf, TestResult, render, render_with, test_config};
use folio::{
    FilesystemResourceProvider, InMemoryResourceProvider, PdfRendererBuilder, PipelineError, RenderConfig, RenderError,
};
use folio_types::{
    BackgroundImage, BackgroundRepeat, Border, BorderStyle, BoxStyle, Color, FsImage, ImageData, ImageKind, Insets,
    LaidOutDocument, ResourceUri,
};
use lopdf::content::{Content, Operation};
use lopdf::{Document as LopdfDocument, Object, Stream, dictionary};
use std::io::Cursor;
use std::sync::Arc;

/// One paragraph whose box carries `style`.
fn styled_paragraph(style: BoxStyle) -> LaidOutDocument {
    let mut b = DocumentBuilder::new(1);
    let root = b.root();
    let (_, p_box) = b.text_block(root, "p", 0.0, &["Decorated"]);
    b.layout_box(p_box).style = style;
    b.build()
}

/// A one-page PDF with a 300x200pt media box inherited from the page tree.
fn one_page_pdf() -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut doc = LopdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content = Content {
        operations: vec![
            Operation::new("re", vec![0.into(), 0.into(), 100.into(), 100.into()]),
            Operation::new("f", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => vec![0.into(), 0.into(), 300.into(), 200.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

fn embedded_page(uri: &str) -> FsImage {
    FsImage {
        width: 6000.0,
        height: 4000.0,
        source: None,
        kind: ImageKind::PdfPage {
            uri: ResourceUri::from(uri),
            page: None,
            scale_width: 1.0,
            scale_height: 1.0,
        },
    }
}

fn document_with_image(image: FsImage) -> LaidOutDocument {
    let mut b = DocumentBuilder::new(1);
    let (body, body_box) = b.root();
    let img = b.element(body, "img");
    b.replaced(body_box, Some(img), image, 0.0, 0.0);
    b.build()
}

fn render_with_resources(
    doc: &LaidOutDocument,
    provider: InMemoryResourceProvider,
) -> Result<GeneratedPdf, Box<dyn std::error::Error>> {
    let mut renderer = PdfRendererBuilder::new()
        .with_config(test_config())
        .with_resources(Arc::new(provider))
        .build(Cursor::new(Vec::new()))?;
    renderer.create_pdf(doc)?;
    GeneratedPdf::from_bytes(renderer.finish()?.into_inner())
}

fn render_error(doc: &LaidOutDocument) -> Option<PipelineError> {
    let mut renderer = PdfRendererBuilder::new()
        .with_config(test_config())
        .build(Cursor::new(Vec::new()))
        .ok()?;
    renderer.create_pdf(doc).err()
}

fn xobject_count(pdf: &GeneratedPdf) -> usize {
    page_resources(&pdf.doc, 1)
        .and_then(|r| r.get(b"XObject").ok())
        .and_then(|x| deref(&pdf.doc, x))
        .and_then(|x| x.as_dict().ok())
        .map_or(0, |x| x.len())
}

#[test]
fn test_box_decorations_are_artifacts() -> TestResult {
    let style = BoxStyle {
        background: Some(Color::rgb(255, 255, 0)),
        border_top: Some(Border {
            width: 40.0,
            style: BorderStyle::Dashed,
            color: Color::BLACK,
        }),
        border_bottom: Some(Border {
            width: 20.0,
            style: BorderStyle::Dotted,
            color: Color::rgb(0, 0, 255),
        }),
        ..BoxStyle::default()
    };
    let pdf = render(&styled_paragraph(style))?;
    assert_tagged_structure(&pdf.doc);

    let ops = page_operators(&pdf.doc, 1);
    assert_eq!(count_operator(&ops, "BMC"), 2, "background and borders: {:?}", ops);
    assert_eq!(count_operator(&ops, "f"), 1);
    assert_eq!(count_operator(&ops, "S"), 2);

    let dashes: Vec<Vec<Object>> = page_operations(&pdf.doc, 1)
        .into_iter()
        .filter(|op| op.operator == "d")
        .filter_map(|op| op.operands.first().and_then(|a| a.as_array().ok()).cloned())
        .collect();
    assert!(dashes.iter().any(|d| d.len() == 2), "dash patterns: {:?}", dashes);

    let fills = operands_of(&pdf.doc, 1, "rg");
    assert!(fills.iter().any(|c| c.len() == 3 && approx_eq(c[0], 1.0) && approx_eq(c[1], 1.0) && approx_eq(c[2], 0.0)));
    assert_eq!(shown_text(&pdf.doc, 1), "Decorated");
    Ok(())
}

#[test]
fn test_invisible_borders_are_skipped() -> TestResult {
    let style = BoxStyle {
        border_left: Some(Border {
            width: 20.0,
            style: BorderStyle::None,
            color: Color::BLACK,
        }),
        border_right: Some(Border {
            width: 0.0,
            style: BorderStyle::Solid,
            color: Color::BLACK,
        }),
        ..BoxStyle::default()
    };
    let pdf = render(&styled_paragraph(style))?;
    let ops = page_operators(&pdf.doc, 1);
    assert_eq!(count_operator(&ops, "BMC"), 0);
    assert_eq!(count_operator(&ops, "S"), 0);
    Ok(())
}

#[test]
fn test_page_background_is_painted_before_clip() -> TestResult {
    let mut doc = DocumentBuilder::with_margins(1, Insets::uniform(1000.0)).build();
    doc.pages[0].style.background = Some(Color::rgb(240, 240, 240));
    let pdf = render(&doc)?;

    let ops = page_operators(&pdf.doc, 1);
    let fill = ops.iter().position(|o| o == "f").ok_or("no page fill")?;
    let clip = ops.iter().position(|o| o == "W").ok_or("no content clip")?;
    assert!(fill < clip, "{:?}", ops);
    assert_state_balanced(&ops);
    Ok(())
}

#[test]
fn test_content_is_offset_by_page_margins() -> TestResult {
    let mut b = DocumentBuilder::with_margins(1, Insets::uniform(1000.0));
    let root = b.root();
    b.text_block(root, "p", 0.0, &["Inset"]);
    let pdf = render(&b.build())?;

    let matrices = operands_of(&pdf.doc, 1, "Tm");
    assert_eq!(matrices.len(), 1);
    let expected = [1.0, 0.0, 0.0, 1.0, 50.0, 735.0];
    assert!(
        matrices[0].iter().zip(expected).all(|(a, b)| approx_eq(*a, b)),
        "text matrix {:?}",
        matrices[0]
    );
    Ok(())
}

#[test]
fn test_unsupported_color_is_an_error() {
    let style = BoxStyle {
        background: Some(Color::Other {
            space: "Lab".to_string(),
        }),
        ..BoxStyle::default()
    };
    let err = render_error(&styled_paragraph(style));
    assert!(
        matches!(err, Some(PipelineError::Render(RenderError::UnsupportedColor(_)))),
        "{:?}",
        err
    );
}

#[test]
fn test_debug_font_metrics_overlay() -> TestResult {
    let config = RenderConfig {
        debug_font_metrics: true,
        ..test_config()
    };
    let mut b = DocumentBuilder::new(1);
    let root = b.root();
    b.text_block(root, "p", 0.0, &["Measured"]);
    let pdf = render_with(&b.build(), config)?;

    let ops = page_operators(&pdf.doc, 1);
    assert_eq!(count_operator(&ops, "BMC"), 1);
    assert_eq!(count_operator(&ops, "S"), 3);
    let strokes = operands_of(&pdf.doc, 1, "RG");
    assert!(
        strokes
            .iter()
            .any(|c| c.len() == 3 && approx_eq(c[0], 1.0) && approx_eq(c[1], 0.2) && approx_eq(c[2], 1.0)),
        "stroke colors {:?}",
        strokes
    );
    assert_tagged_structure(&pdf.doc);
    Ok(())
}

#[test]
fn test_repeat_x_background_tiles_across_box() -> TestResult {
    let style = BoxStyle {
        background_image: Some(BackgroundImage {
            image: raster_image(1000.0),
            repeat: BackgroundRepeat::RepeatX,
        }),
        ..BoxStyle::default()
    };
    let pdf = render(&styled_paragraph(style))?;
    let ops = page_operators(&pdf.doc, 1);
    assert_eq!(count_operator(&ops, "Do"), 12);
    assert_eq!(count_operator(&ops, "BMC"), 1);
    assert_state_balanced(&ops);
    Ok(())
}

#[test]
fn test_images_from_one_source_share_an_xobject() -> TestResult {
    let mut b = DocumentBuilder::new(1);
    let (body, body_box) = b.root();
    for y in [0.0, 3000.0] {
        let img = b.element(body, "img");
        let mut image = raster_image(2000.0);
        image.source = Some(ResourceUri::from("logo.png"));
        b.replaced(body_box, Some(img), image, 0.0, y);
    }
    let pdf = render(&b.build())?;
    assert_eq!(count_operator(&page_operators(&pdf.doc, 1), "Do"), 2);
    assert_eq!(xobject_count(&pdf), 1);
    Ok(())
}

#[test]
fn test_embedded_pdf_page_becomes_form() -> TestResult {
    let provider = InMemoryResourceProvider::new();
    provider.add("attachment.pdf", one_page_pdf()?)?;
    let pdf = render_with_resources(&document_with_image(embedded_page("attachment.pdf#page=1")), provider)?;

    let xobjects = page_resources(&pdf.doc, 1)
        .and_then(|r| r.get(b"XObject").ok())
        .and_then(|x| deref(&pdf.doc, x))
        .and_then(|x| x.as_dict().ok())
        .ok_or("no XObject resources")?;
    assert_eq!(xobjects.len(), 1);
    let (_, form) = xobjects.iter().next().ok_or("empty XObject dictionary")?;
    let form = pdf.doc.get_object(form.as_reference()?)?.as_stream()?;
    assert_eq!(form.dict.get(b"Subtype")?.as_name()?, b"Form");
    let bbox: Vec<f32> = form.dict.get(b"BBox")?.as_array()?.iter().filter_map(|v| v.as_float().ok()).collect();
    assert_eq!(bbox, vec![0.0, 0.0, 300.0, 200.0]);

    let ops = page_operators(&pdf.doc, 1);
    assert_eq!(count_operator(&ops, "Do"), 1);
    // the content clip is set up again after the form restores the state
    assert!(count_operator(&ops, "W") >= 2, "{:?}", ops);
    assert_state_balanced(&ops);
    assert_marked_content_balanced(&ops);
    Ok(())
}

#[test]
fn test_missing_embedded_document_is_an_error() {
    let err = render_error(&document_with_image(embedded_page("missing.pdf")));
    assert!(
        matches!(
            err,
            Some(PipelineError::Render(
                RenderError::Resource(_) | RenderError::EmbeddedDocument { .. }
            ))
        ),
        "{:?}",
        err
    );
}

#[test]
fn test_malformed_raster_is_an_error() {
    let mut image = raster_image(2000.0);
    image.kind = ImageKind::Raster {
        pixel_width: 2,
        pixel_height: 2,
        data: ImageData::Rgb8(vec![255, 0, 0]),
    };
    let err = render_error(&document_with_image(image));
    assert!(matches!(err, Some(PipelineError::Render(RenderError::InvalidImage(_)))), "{:?}", err);

    let mut jpeg = raster_image(2000.0);
    jpeg.kind = ImageKind::Raster {
        pixel_width: 2,
        pixel_height: 2,
        data: ImageData::Jpeg(vec![0xFF, 0xD8, 0xFF, 0xD9]),
    };
    let err = render_error(&document_with_image(jpeg));
    assert!(matches!(err, Some(PipelineError::Render(RenderError::InvalidImage(_)))), "{:?}", err);
}

#[test]
fn test_degenerate_image_is_not_placed() -> TestResult {
    let mut image = raster_image(2000.0);
    image.width = 0.0;
    let pdf = render(&document_with_image(image))?;
    let ops = page_operators(&pdf.doc, 1);
    assert_eq!(count_operator(&ops, "Do"), 0);
    assert_eq!(xobject_count(&pdf), 0);
    Ok(())
}

#[test]
fn test_every_page_restores_its_state() -> TestResult {
    let mut b = DocumentBuilder::with_margins(3, Insets::uniform(500.0));
    let root = b.root();
    for page in 0..3 {
        let y = page as f32 * 15000.0 + 200.0;
        b.text_block(root, "p", y, &["Page text"]);
    }
    let pdf = render(&b.build())?;
    assert_eq!(pdf.page_count(), 3);
    for page in 1..=3 {
        let ops = page_operators(&pdf.doc, page);
        assert_state_balanced(&ops);
        assert!(count_operator(&ops, "W") >= 1);
        assert_eq!(shown_text(&pdf.doc, page), "Page text");
    }
    assert_tagged_structure(&pdf.doc);
    Ok(())
}

#[test]
fn test_embedded_pdf_from_filesystem_into_file() -> TestResult {
    let dir = tempfile::tempdir()?;
    std::fs::create_dir(dir.path().join("attachments"))?;
    std::fs::write(dir.path().join("attachments/form.pdf"), one_page_pdf()?)?;
    let output_path = dir.path().join("out.pdf");

    let doc = document_with_image(embedded_page("attachments/form.pdf"));
    let mut renderer = PdfRendererBuilder::new()
        .with_config(test_config())
        .with_resources(Arc::new(FilesystemResourceProvider::new(dir.path())))
        .build(std::fs::File::create(&output_path)?)?;
    renderer.create_pdf(&doc)?;
    renderer.finish()?;

    let pdf = GeneratedPdf::from_bytes(std::fs::read(&output_path)?)?;
    assert_eq!(pdf.page_count(), 1);
    assert_eq!(xobject_count(&pdf), 1);

    let escaping = document_with_image(embedded_page("../secret.pdf"));
    let mut renderer = PdfRendererBuilder::new()
        .with_resources(Arc::new(FilesystemResourceProvider::new(dir.path())))
        .build(Cursor::new(Vec::new()))?;
    assert!(matches!(
        renderer.create_pdf(&escaping),
        Err(PipelineError::Render(RenderError::Resource(_)))
    ));
    Ok(())
}
