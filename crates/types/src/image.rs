use crate::ids::ResourceUri;
use serde::{Deserialize, Serialize};

/// A replaced-element image, already decoded and sized by the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsImage {
    /// Placed width in device units.
    pub width: f32,
    /// Placed height in device units.
    pub height: f32,
    /// Where the image came from; repeated placements of one URI share a
    /// single XObject.
    #[serde(default)]
    pub source: Option<ResourceUri>,
    pub kind: ImageKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageKind {
    Raster {
        pixel_width: u32,
        pixel_height: u32,
        data: ImageData,
    },
    /// A page of another PDF placed as a vector form.
    PdfPage {
        uri: ResourceUri,
        /// 1-based page; falls back to the URI's `#page=N` fragment.
        #[serde(default)]
        page: Option<u32>,
        scale_width: f32,
        scale_height: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "encoding", content = "bytes", rename_all = "snake_case")]
pub enum ImageData {
    Jpeg(Vec<u8>),
    Rgb8(Vec<u8>),
    Gray8(Vec<u8>),
}

impl FsImage {
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

impl ImageKind {
    pub fn pdf_page_number(&self) -> Option<u32> {
        match self {
            ImageKind::PdfPage { uri, page, .. } => Some(page.unwrap_or_else(|| uri.page_number())),
            ImageKind::Raster { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_page_number_prefers_explicit_page() {
        let kind = ImageKind::PdfPage {
            uri: ResourceUri::from("a.pdf#page=4"),
            page: None,
            scale_width: 1.0,
            scale_height: 1.0,
        };
        assert_eq!(kind.pdf_page_number(), Some(4));

        let explicit = ImageKind::PdfPage {
            uri: ResourceUri::from("a.pdf#page=4"),
            page: Some(2),
            scale_width: 1.0,
            scale_height: 1.0,
        };
        assert_eq!(explicit.pdf_page_number(), Some(2));
    }

    #[test]
    fn raster_deserializes_from_tagged_json() {
        let json = r#"{"width":20,"height":10,"kind":{"type":"raster","pixel_width":2,"pixel_height":1,
            "data":{"encoding":"rgb8","bytes":[255,0,0,0,255,0]}}}"#;
        let img: FsImage = serde_json::from_str(json).unwrap();
        assert!(!img.is_degenerate());
        assert!(matches!(img.kind, ImageKind::Raster { pixel_width: 2, .. }));
    }
}
