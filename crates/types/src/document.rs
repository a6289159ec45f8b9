use crate::boxes::BoxTree;
use crate::dom::ElementTree;
use crate::page::PageBox;
use serde::{Deserialize, Serialize};

/// Everything the painter needs for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaidOutDocument {
    pub elements: ElementTree,
    pub boxes: BoxTree,
    pub pages: Vec<PageBox>,
    /// Base for resolving relative link targets.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl LaidOutDocument {
    /// The page whose slice contains document Y `y`; the last page when `y`
    /// lies past the end.
    pub fn page_for_y(&self, y: f32) -> Option<&PageBox> {
        self.pages
            .iter()
            .find(|p| p.contains_y(y))
            .or_else(|| self.pages.iter().rev().find(|p| y >= p.top))
            .or_else(|| self.pages.first())
    }
}
