//! The source element tree, stored as an arena.
//!
//! Element names are compared case-insensitively everywhere, matching how
//! HTML documents arrive from both XHTML and HTML parsers.

use crate::ids::{AnchorId, ElementId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub parent: Option<ElementId>,
    #[serde(default)]
    pub children: Vec<ElementId>,
    /// Character data directly inside this element.
    #[serde(default)]
    pub text: String,
}

impl Element {
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Element>", into = "Vec<Element>")]
pub struct ElementTree {
    elements: Vec<Element>,
    ids: HashMap<AnchorId, ElementId>,
}

impl From<Vec<Element>> for ElementTree {
    fn from(elements: Vec<Element>) -> Self {
        let mut tree = ElementTree {
            elements,
            ids: HashMap::new(),
        };
        tree.reindex();
        tree
    }
}

impl From<ElementTree> for Vec<Element> {
    fn from(tree: ElementTree) -> Self {
        tree.elements
    }
}

impl ElementTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn reindex(&mut self) {
        self.ids.clear();
        for (idx, el) in self.elements.iter().enumerate() {
            if let Some(id) = el.attributes.get("id") {
                self.ids.entry(AnchorId::from(id.as_str())).or_insert(ElementId(idx));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Adds an element under `parent` (or as a root) and returns its id.
    pub fn append(&mut self, parent: Option<ElementId>, name: &str) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(Element {
            name: name.to_string(),
            parent,
            ..Default::default()
        });
        if let Some(p) = parent {
            self.elements[p.0].children.push(id);
        }
        id
    }

    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) {
        if let Some(el) = self.elements.get_mut(id.0) {
            el.attributes.insert(name.to_string(), value.to_string());
            if name == "id" {
                self.ids.entry(AnchorId::from(value)).or_insert(id);
            }
        }
    }

    pub fn set_text(&mut self, id: ElementId, text: &str) {
        if let Some(el) = self.elements.get_mut(id.0) {
            el.text = text.to_string();
        }
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn root(&self) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|el| el.parent.is_none())
            .map(ElementId)
    }

    pub fn name(&self, id: ElementId) -> Option<&str> {
        self.get(id).map(|el| el.name.as_str())
    }

    pub fn is(&self, id: ElementId, name: &str) -> bool {
        self.get(id).is_some_and(|el| el.is(name))
    }

    pub fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.get(id)
            .and_then(|el| el.attributes.get(name))
            .map(String::as_str)
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.get(id).and_then(|el| el.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.get(id).map(|el| el.children.as_slice()).unwrap_or(&[])
    }

    /// First direct child with the given name.
    pub fn child(&self, id: ElementId, name: &str) -> Option<ElementId> {
        self.children(id).iter().copied().find(|c| self.is(*c, name))
    }

    pub fn children_named<'a>(
        &'a self,
        id: ElementId,
        name: &'a str,
    ) -> impl Iterator<Item = ElementId> + 'a {
        self.children(id).iter().copied().filter(move |c| self.is(*c, name))
    }

    pub fn by_anchor(&self, anchor: &str) -> Option<ElementId> {
        self.ids.get(anchor).copied()
    }

    pub fn anchors(&self) -> impl Iterator<Item = (&AnchorId, ElementId)> {
        self.ids.iter().map(|(k, v)| (k, *v))
    }

    /// Pre-order traversal starting at (and including) `id`.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Concatenated character data of the element and its descendants.
    pub fn text_content(&self, id: ElementId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|e| self.get(e))
            .map(|el| el.text.as_str())
            .collect()
    }

    /// `LI` directly inside `OL` or `UL`.
    pub fn is_list_item(&self, id: ElementId) -> bool {
        self.is(id, "li")
            && self
                .parent(id)
                .is_some_and(|p| self.is(p, "ol") || self.is(p, "ul"))
    }

    /// `DT` or `DD` directly inside `DL`.
    pub fn is_description_list_item(&self, id: ElementId) -> bool {
        (self.is(id, "dt") || self.is(id, "dd"))
            && self.parent(id).is_some_and(|p| self.is(p, "dl"))
    }

    pub fn is_list_element(&self, id: ElementId) -> bool {
        ["li", "ol", "ul", "dt", "dd", "dl"]
            .iter()
            .any(|name| self.is(id, name))
    }

    /// 1-based position of a list item among its item siblings, with the item count.
    pub fn list_item_position(&self, item: ElementId) -> Option<(usize, usize)> {
        let list = self.parent(item)?;
        let is_item = |e: ElementId| {
            if self.is(list, "dl") {
                self.is(e, "dt") || self.is(e, "dd")
            } else {
                self.is(e, "li")
            }
        };
        let items: Vec<ElementId> = self.children(list).iter().copied().filter(|e| is_item(*e)).collect();
        let position = items.iter().position(|e| *e == item)? + 1;
        Some((position, items.len()))
    }

    /// True when `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: ElementId, id: ElementId) -> bool {
        let mut current = self.parent(id);
        while let Some(el) = current {
            if el == ancestor {
                return true;
            }
            current = self.parent(el);
        }
        false
    }

    /// Nearest strict ancestor that is an item of an `OL`, `UL` or `DL`.
    pub fn enclosing_list_item(&self, id: ElementId) -> Option<ElementId> {
        let mut current = self.parent(id);
        while let Some(el) = current {
            if self.is_list_item(el) || self.is_description_list_item(el) {
                return Some(el);
            }
            current = self.parent(el);
        }
        None
    }

    /// Nearest ancestor-or-self with the given name.
    pub fn closest(&self, id: ElementId, name: &str) -> Option<ElementId> {
        let mut current = Some(id);
        while let Some(el) = current {
            if self.is(el, name) {
                return Some(el);
            }
            current = self.parent(el);
        }
        None
    }
}
