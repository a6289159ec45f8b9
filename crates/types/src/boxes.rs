//! Positioned boxes produced by layout.
//!
//! All coordinates are absolute device units in the continuous document
//! space; pages are horizontal slices of it (see [`PageBox`](crate::PageBox)).

use crate::color::Color;
use crate::font::{FontDescription, FontSpecification, JustificationInfo};
use crate::geometry::Rect;
use crate::ids::{BoxId, ElementId};
use crate::image::FsImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub width: f32,
    #[serde(default)]
    pub style: BorderStyle,
    #[serde(default)]
    pub color: Color,
}

impl Border {
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.style != BorderStyle::None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundRepeat {
    #[default]
    NoRepeat,
    RepeatX,
    RepeatY,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub image: FsImage,
    #[serde(default)]
    pub repeat: BackgroundRepeat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxStyle {
    pub color: Color,
    pub background: Option<Color>,
    pub background_image: Option<BackgroundImage>,
    pub border_top: Option<Border>,
    pub border_right: Option<Border>,
    pub border_bottom: Option<Border>,
    pub border_left: Option<Border>,
}

impl BoxStyle {
    pub fn has_decoration(&self) -> bool {
        self.background.is_some()
            || self.background_image.is_some()
            || self.borders().iter().any(|(_, b)| b.is_some_and(Border::is_visible))
    }

    /// Borders in painting order: top, right, bottom, left.
    pub fn borders(&self) -> [(Side, Option<&Border>); 4] {
        [
            (Side::Top, self.border_top.as_ref()),
            (Side::Right, self.border_right.as_ref()),
            (Side::Bottom, self.border_bottom.as_ref()),
            (Side::Left, self.border_left.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

/// One shaped fragment of text on a single line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub font: FontDescription,
    /// Font size in device units.
    pub font_size: f32,
    #[serde(default)]
    pub requested: Option<FontSpecification>,
    #[serde(default)]
    pub justification: Option<JustificationInfo>,
}

impl TextRun {
    pub fn new(text: impl Into<String>, font: FontDescription, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font,
            font_size,
            requested: None,
            justification: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoxKind {
    Block,
    Inline,
    Text(TextRun),
    Replaced(FsImage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub kind: BoxKind,
    #[serde(default)]
    pub element: Option<ElementId>,
    #[serde(default)]
    pub parent: Option<BoxId>,
    #[serde(default)]
    pub children: Vec<BoxId>,
    pub bounds: Rect,
    /// Union of all line fragments of an inline box, when layout tracked it.
    #[serde(default)]
    pub aggregate_bounds: Option<Rect>,
    #[serde(default)]
    pub margin_top: f32,
    /// Baseline offset from `bounds.y` for inline and text boxes.
    #[serde(default)]
    pub baseline: f32,
    #[serde(default)]
    pub style: BoxStyle,
}

impl LayoutBox {
    pub fn new(kind: BoxKind, element: Option<ElementId>, bounds: Rect) -> Self {
        Self {
            kind,
            element,
            parent: None,
            children: Vec::new(),
            bounds,
            aggregate_bounds: None,
            margin_top: 0.0,
            baseline: 0.0,
            style: BoxStyle::default(),
        }
    }

    pub fn with_style(mut self, style: BoxStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_baseline(mut self, baseline: f32) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn is_block(&self) -> bool {
        matches!(self.kind, BoxKind::Block)
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.kind, BoxKind::Inline | BoxKind::Text(_))
    }

    pub fn text_run(&self) -> Option<&TextRun> {
        match &self.kind {
            BoxKind::Text(run) => Some(run),
            _ => None,
        }
    }

    /// Y used to decide which page a box belongs to: the baseline for
    /// inline content, the top edge otherwise.
    pub fn page_ref_y(&self) -> f32 {
        if self.is_inline() {
            self.bounds.y + self.baseline
        } else {
            self.bounds.y
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<LayoutBox>", into = "Vec<LayoutBox>")]
pub struct BoxTree {
    boxes: Vec<LayoutBox>,
}

impl From<Vec<LayoutBox>> for BoxTree {
    fn from(boxes: Vec<LayoutBox>) -> Self {
        BoxTree { boxes }
    }
}

impl From<BoxTree> for Vec<LayoutBox> {
    fn from(tree: BoxTree) -> Self {
        tree.boxes
    }
}

impl BoxTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn push(&mut self, parent: Option<BoxId>, mut layout_box: LayoutBox) -> BoxId {
        let id = BoxId(self.boxes.len());
        layout_box.parent = parent;
        self.boxes.push(layout_box);
        if let Some(p) = parent {
            self.boxes[p.0].children.push(id);
        }
        id
    }

    pub fn get(&self, id: BoxId) -> Option<&LayoutBox> {
        self.boxes.get(id.0)
    }

    pub fn get_mut(&mut self, id: BoxId) -> Option<&mut LayoutBox> {
        self.boxes.get_mut(id.0)
    }

    pub fn parent(&self, id: BoxId) -> Option<BoxId> {
        self.get(id).and_then(|b| b.parent)
    }

    pub fn children(&self, id: BoxId) -> &[BoxId] {
        self.get(id).map(|b| b.children.as_slice()).unwrap_or(&[])
    }

    /// Every box in painting (pre-order document) order.
    pub fn document_order(&self) -> Vec<BoxId> {
        let mut out = Vec::with_capacity(self.boxes.len());
        let roots = self
            .boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.parent.is_none())
            .map(|(i, _)| BoxId(i));
        for root in roots {
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                out.push(id);
                stack.extend(self.children(id).iter().rev().copied());
            }
        }
        out
    }

    fn sibling(&self, id: BoxId, offset: isize) -> Option<BoxId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let idx = siblings.iter().position(|s| *s == id)? as isize + offset;
        if idx < 0 {
            return None;
        }
        siblings.get(idx as usize).copied()
    }

    pub fn previous_sibling(&self, id: BoxId) -> Option<BoxId> {
        self.sibling(id, -1)
    }

    pub fn next_sibling(&self, id: BoxId) -> Option<BoxId> {
        self.sibling(id, 1)
    }

    /// Nearest block-level ancestor carrying an element.
    pub fn nearest_block(&self, id: BoxId) -> Option<BoxId> {
        let mut current = self.parent(id);
        while let Some(b) = current {
            let layout_box = self.get(b)?;
            if layout_box.is_block() && layout_box.element.is_some() {
                return Some(b);
            }
            current = layout_box.parent;
        }
        None
    }

    /// Text boxes whose nearest block ancestor is `block`, in document order.
    pub fn text_runs_of_block(&self, block: BoxId) -> Vec<BoxId> {
        let mut out = Vec::new();
        let mut stack: Vec<BoxId> = self.children(block).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(b) = self.get(id) else { continue };
            match &b.kind {
                BoxKind::Text(_) => out.push(id),
                BoxKind::Block if b.element.is_some() => {}
                _ => stack.extend(b.children.iter().rev().copied()),
            }
        }
        out
    }

    /// First box generated for `element`.
    pub fn box_for_element(&self, element: ElementId) -> Option<BoxId> {
        self.boxes
            .iter()
            .position(|b| b.element == Some(element))
            .map(BoxId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontDescription;

    fn text(s: &str) -> LayoutBox {
        LayoutBox::new(
            BoxKind::Text(TextRun::new(s, FontDescription::new("Helvetica"), 240.0)),
            None,
            Rect::new(0.0, 0.0, 100.0, 20.0),
        )
    }

    #[test]
    fn text_runs_stop_at_nested_blocks() {
        let mut tree = BoxTree::new();
        let div = tree.push(None, LayoutBox::new(BoxKind::Block, Some(ElementId(0)), Rect::default()));
        let t1 = tree.push(Some(div), text("one"));
        let p = tree.push(Some(div), LayoutBox::new(BoxKind::Block, Some(ElementId(1)), Rect::default()));
        let t2 = tree.push(Some(p), text("two"));
        let span = tree.push(Some(div), LayoutBox::new(BoxKind::Inline, Some(ElementId(2)), Rect::default()));
        let t3 = tree.push(Some(span), text("three"));

        assert_eq!(tree.text_runs_of_block(div), vec![t1, t3]);
        assert_eq!(tree.text_runs_of_block(p), vec![t2]);
        assert_eq!(tree.nearest_block(t3), Some(div));
        assert_eq!(tree.nearest_block(t2), Some(p));
    }

    #[test]
    fn siblings_and_document_order() {
        let mut tree = BoxTree::new();
        let root = tree.push(None, LayoutBox::new(BoxKind::Block, None, Rect::default()));
        let a = tree.push(Some(root), text("a"));
        let b = tree.push(Some(root), text("b"));
        assert_eq!(tree.previous_sibling(b), Some(a));
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.previous_sibling(a), None);
        assert_eq!(tree.document_order(), vec![root, a, b]);
    }
}
