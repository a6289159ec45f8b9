use crate::boxes::BoxStyle;
use crate::geometry::{Insets, Rect};
use serde::{Deserialize, Serialize};

/// One physical page: a horizontal slice `[top, bottom)` of the document
/// space plus the page's own size and margin area, all in device units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    /// 0-based index within its document.
    pub page_no: usize,
    pub width: f32,
    pub height: f32,
    pub top: f32,
    pub bottom: f32,
    /// Margin + border + padding of the page box.
    #[serde(default)]
    pub margins: Insets,
    #[serde(default)]
    pub style: BoxStyle,
    /// Serialized XMP body attached to this page.
    #[serde(default)]
    pub metadata: Option<String>,
}

impl PageBox {
    pub fn new(page_no: usize, width: f32, height: f32, top: f32, margins: Insets) -> Self {
        let content_height = height - margins.top - margins.bottom;
        Self {
            page_no,
            width,
            height,
            top,
            bottom: top + content_height,
            margins,
            style: BoxStyle::default(),
            metadata: None,
        }
    }

    pub fn content_height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn content_width(&self) -> f32 {
        self.width - self.margins.left - self.margins.right
    }

    /// True when document Y `y` falls on this page.
    pub fn contains_y(&self, y: f32) -> bool {
        y >= self.top && y < self.bottom
    }

    /// The printable area in page-local device coordinates.
    pub fn content_clip(&self) -> Rect {
        Rect::new(
            self.margins.left,
            self.margins.top,
            self.content_width(),
            self.content_height(),
        )
    }
}
