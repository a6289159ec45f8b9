//! Input model for the folio page painter.
//!
//! A layout engine hands us three things: the source element tree, a tree of
//! positioned boxes (absolute device units, Y growing downward across the
//! whole document) and the list of pages slicing that coordinate space.

pub mod boxes;
pub mod color;
pub mod document;
pub mod dom;
pub mod font;
pub mod geometry;
pub mod ids;
pub mod image;
pub mod page;
pub mod transform;

pub use boxes::{
    BackgroundImage, BackgroundRepeat, Border, BorderStyle, BoxKind, BoxStyle, BoxTree, LayoutBox,
    Side, TextRun,
};
pub use color::Color;
pub use document::LaidOutDocument;
pub use dom::{Element, ElementTree};
pub use font::{FontDescription, FontSpecification, FontStyle, JustificationInfo};
pub use geometry::{Insets, Point, Rect, Size};
pub use ids::{AnchorId, BoxId, ElementId, ResourceUri};
pub use image::{FsImage, ImageData, ImageKind};
pub use page::PageBox;
pub use transform::AffineTransform;
