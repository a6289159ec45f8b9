//! Shapes to path construction and painting operators.

use crate::graphics::GraphicsStateTracker;
use crate::sink::ContentSink;
use crate::transform::CoordinateTransformer;
use folio_render_core::{PathSegment, RenderError, Shape, Stroke, WindingRule};
use lopdf::Object;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintIntent {
    Fill,
    Stroke,
    /// The shape is already in page space and only narrows the clip.
    Clip,
}

pub struct PathRenderer;

impl PathRenderer {
    /// Emits `shape` as a path and paints it according to `intent`.
    ///
    /// Paths without any segment produce no painting operator; an empty clip
    /// becomes a zero-area rectangle so nothing stays visible.
    pub fn follow_path(
        sink: &mut ContentSink,
        state: &mut GraphicsStateTracker,
        transformer: &CoordinateTransformer,
        shape: &Shape,
        intent: PaintIntent,
    ) -> Result<(), RenderError> {
        if intent == PaintIntent::Stroke {
            if let Stroke::Custom(outliner) = state.stroke().clone() {
                let outline = outliner.outline(shape);
                return Self::follow_path(sink, state, transformer, &outline, PaintIntent::Fill);
            }
            state.apply_stroke(sink);
            state.ensure_stroke_color(sink);
        } else if intent == PaintIntent::Fill {
            state.ensure_fill_color(sink);
        }

        let mapped;
        let shape = if intent == PaintIntent::Clip {
            shape
        } else {
            mapped = shape.transformed(transformer.current());
            &mapped
        };

        let traces = emit_segments(sink, transformer, shape);

        match intent {
            PaintIntent::Fill => {
                if traces > 0 {
                    sink.op(fill_operator(shape.winding), vec![]);
                }
            }
            PaintIntent::Stroke => {
                if traces > 0 {
                    sink.op("S", vec![]);
                }
            }
            PaintIntent::Clip => {
                if traces == 0 {
                    sink.op("re", vec![0.into(), 0.into(), 0.into(), 0.into()]);
                }
                sink.op(clip_operator(shape.winding), vec![]);
                sink.op("n", vec![]);
            }
        }
        Ok(())
    }
}

fn fill_operator(winding: WindingRule) -> &'static str {
    match winding {
        WindingRule::NonZero => "f",
        WindingRule::EvenOdd => "f*",
    }
}

fn clip_operator(winding: WindingRule) -> &'static str {
    match winding {
        WindingRule::NonZero => "W",
        WindingRule::EvenOdd => "W*",
    }
}

/// Writes the path construction operators and returns how many were written.
fn emit_segments(sink: &mut ContentSink, transformer: &CoordinateTransformer, shape: &Shape) -> usize {
    let point = |x: f32, y: f32| -> [Object; 2] { [Object::Real(x), Object::Real(transformer.normalize_y(y))] };
    let mut traces = 0;
    let mut current = (0.0_f32, 0.0_f32);
    let mut subpath_start = current;

    for segment in &shape.segments {
        traces += 1;
        match *segment {
            PathSegment::MoveTo(x, y) => {
                sink.op("m", point(x, y).to_vec());
                current = (x, y);
                subpath_start = current;
            }
            PathSegment::LineTo(x, y) => {
                sink.op("l", point(x, y).to_vec());
                current = (x, y);
            }
            PathSegment::QuadTo(qx, qy, x, y) => {
                // degree elevation to a cubic
                let c1 = (current.0 + 2.0 / 3.0 * (qx - current.0), current.1 + 2.0 / 3.0 * (qy - current.1));
                let c2 = (x + 2.0 / 3.0 * (qx - x), y + 2.0 / 3.0 * (qy - y));
                let mut operands = point(c1.0, c1.1).to_vec();
                operands.extend(point(c2.0, c2.1));
                operands.extend(point(x, y));
                sink.op("c", operands);
                current = (x, y);
            }
            PathSegment::CubicTo(x1, y1, x2, y2, x, y) => {
                let mut operands = point(x1, y1).to_vec();
                operands.extend(point(x2, y2));
                operands.extend(point(x, y));
                sink.op("c", operands);
                current = (x, y);
            }
            PathSegment::Close => {
                sink.op("h", vec![]);
                current = subpath_start;
            }
        }
    }
    traces
}
