//! Core painting abstractions shared by PDF backends.
//!
//! - [`OutputDevice`]: the narrow capability set the page orchestrator drives
//! - [`Shape`] and [`Stroke`]: geometry and stroke style handed to a device
//! - [`RenderError`]: errors raised while painting
//! - [`utils`]: justification and coordinate helpers

mod error;
pub mod shape;
pub mod stroke;
mod traits;
pub mod utils;

pub use error::RenderError;
pub use shape::{PathSegment, Shape, WindingRule};
pub use stroke::{BasicStroke, LineCap, LineJoin, Stroke, StrokeOutliner};
pub use traits::OutputDevice;
