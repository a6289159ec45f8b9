//! Text objects: font selection, synthetic bold and italic, justification.

use crate::fonts::{FontRegistry, win_ansi_bytes, win_ansi_covers};
use crate::graphics::GraphicsStateTracker;
use crate::sink::ContentSink;
use crate::transform::CoordinateTransformer;
use folio_render_core::RenderError;
use folio_render_core::utils::is_justification_space;
use folio_types::{FontDescription, FontStyle, TextRun};
use lopdf::{Object, StringFormat};
use std::borrow::Cow;

/// Stroke width of synthetic bold, relative to the font size.
const BOLD_STROKE_RATIO: f32 = 0.04;
/// Horizontal shear of synthetic italic.
const ITALIC_SKEW: f32 = 0.21256;

pub struct TextPainter;

impl TextPainter {
    /// Paints `run` with its baseline origin at device `(x, y)`.
    pub fn paint(
        sink: &mut ContentSink,
        state: &mut GraphicsStateTracker,
        transformer: &CoordinateTransformer,
        fonts: &mut FontRegistry,
        run: &TextRun,
        x: f32,
        y: f32,
    ) -> Result<(), RenderError> {
        let dpp = transformer.dots_per_point();
        state.ensure_fill_color(sink);

        let m = transformer.text_matrix(x, y);
        let font_size = run.font_size / dpp;
        let resource = fonts.resource_name(&run.font.base_font);

        sink.op("BT", vec![]);
        sink.op("Tf", vec![Object::Name(resource.into_bytes()), Object::Real(font_size)]);

        let requested = run.requested.unwrap_or_default();
        let synthetic_bold = requested.weight > run.font.weight;
        if synthetic_bold {
            sink.op("Tr", vec![Object::Integer(2)]);
            sink.op("w", vec![Object::Real(font_size * BOLD_STROKE_RATIO)]);
            state.ensure_stroke_color(sink);
        }

        let (mut b, mut c) = (m.b, m.c);
        if requested.style.is_slanted() && !run.font.style.is_slanted() {
            b = 0.0;
            c = ITALIC_SKEW;
        }
        sink.op(
            "Tm",
            [m.a, b, c, m.d, m.e, m.f].into_iter().map(Object::Real).collect(),
        );

        match &run.justification {
            Some(info) => {
                let mut items = Vec::new();
                let mut chars = run.text.chars().peekable();
                while let Some(ch) = chars.next() {
                    items.push(encoded(&ch.to_string())?);
                    if chars.peek().is_some() {
                        let adjust = if is_justification_space(ch) {
                            info.space_adjust
                        } else {
                            info.non_space_adjust
                        };
                        items.push(Object::Real((-adjust / dpp) * 1000.0 / font_size));
                    }
                }
                sink.op("TJ", vec![Object::Array(items)]);
            }
            None => sink.op("Tj", vec![encoded(&run.text)?]),
        }

        if synthetic_bold {
            sink.op("Tr", vec![Object::Integer(0)]);
            sink.op("w", vec![Object::Integer(1)]);
            state.invalidate_stroke();
        }
        sink.op("ET", vec![]);
        Ok(())
    }
}

fn encoded(text: &str) -> Result<Object, RenderError> {
    Ok(Object::String(win_ansi_bytes(text)?, StringFormat::Literal))
}

fn has_glyph(font: &FontDescription, c: char) -> Result<bool, RenderError> {
    match font.explicit_coverage(c) {
        Some(covered) => Ok(covered),
        None => win_ansi_covers(c),
    }
}

/// Swaps characters the font cannot show for `replacement`. Space characters
/// are left alone; when the font lacks `replacement` itself the text is
/// returned unchanged.
pub fn replace_missing_characters<'a>(
    text: &'a str,
    font: &FontDescription,
    replacement: char,
) -> Result<Cow<'a, str>, RenderError> {
    if !has_glyph(font, replacement)? {
        log::info!(
            "Font {} has no glyph for replacement character {:?}; leaving text as is",
            font.base_font,
            replacement
        );
        return Ok(Cow::Borrowed(text));
    }
    let mut missing = Vec::new();
    for c in text.chars() {
        missing.push(!is_justification_space(c) && !has_glyph(font, c)?);
    }
    if !missing.contains(&true) {
        return Ok(Cow::Borrowed(text));
    }
    Ok(Cow::Owned(
        text.chars()
            .zip(missing)
            .map(|(c, missing)| if missing { replacement } else { c })
            .collect(),
    ))
}
