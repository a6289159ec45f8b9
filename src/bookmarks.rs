//! Document outline sources: explicit `<bookmarks>` in `<head>`, or the
//! heading hierarchy when there are none.

use crate::metadata::head_element;
use folio_types::{ElementId, ElementTree};
use std::iter::Peekable;

/// One outline entry before destinations are resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub name: String,
    /// Link target; only `#id` targets resolve to a box.
    pub href: String,
    /// Element the bookmark points at when it was generated from a heading.
    pub element: Option<ElementId>,
    pub children: Vec<Bookmark>,
}

impl Bookmark {
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
            element: None,
            children: Vec::new(),
        }
    }

    /// Element the bookmark targets: its own element, or the anchor named by
    /// a `#id` href.
    pub fn target(&self, elements: &ElementTree) -> Option<ElementId> {
        match self.href.strip_prefix('#') {
            Some(anchor) => elements.by_anchor(anchor),
            None => self.element,
        }
    }
}

/// `<head><bookmarks><bookmark name href>...` with nested bookmarks.
pub fn load_bookmarks(elements: &ElementTree) -> Vec<Bookmark> {
    let Some(bookmarks) = head_element(elements).and_then(|head| elements.child(head, "bookmarks")) else {
        return Vec::new();
    };
    elements
        .children_named(bookmarks, "bookmark")
        .map(|b| load_bookmark(elements, b))
        .collect()
}

fn load_bookmark(elements: &ElementTree, element: ElementId) -> Bookmark {
    let mut bookmark = Bookmark::new(
        elements.attribute(element, "name").unwrap_or_default(),
        elements.attribute(element, "href").unwrap_or_default(),
    );
    bookmark.children = elements
        .children_named(element, "bookmark")
        .map(|b| load_bookmark(elements, b))
        .collect();
    bookmark
}

fn heading_level(elements: &ElementTree, id: ElementId) -> Option<u8> {
    let name = elements.name(id)?;
    let mut chars = name.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('h' | 'H'), Some(d @ '1'..='6'), None) => d.to_digit(10).map(|d| d as u8),
        _ => None,
    }
}

/// Outline built from `h1`..`h6` in document order; each heading nests
/// under the closest preceding heading of a higher rank.
pub fn generate_from_headings(elements: &ElementTree) -> Vec<Bookmark> {
    let Some(root) = elements.root() else {
        return Vec::new();
    };
    let headings: Vec<(u8, Bookmark)> = elements
        .descendants(root)
        .into_iter()
        .filter_map(|id| {
            let level = heading_level(elements, id)?;
            let title = elements.text_content(id).split_whitespace().collect::<Vec<_>>().join(" ");
            if title.is_empty() {
                return None;
            }
            let mut bookmark = Bookmark::new(title, "");
            bookmark.element = Some(id);
            Some((level, bookmark))
        })
        .collect();
    nest(&mut headings.into_iter().peekable(), 0)
}

fn nest<I>(items: &mut Peekable<I>, parent_level: u8) -> Vec<Bookmark>
where
    I: Iterator<Item = (u8, Bookmark)>,
{
    let mut out = Vec::new();
    while let Some((level, mut bookmark)) = items.next_if(|(level, _)| *level > parent_level) {
        bookmark.children = nest(items, level);
        out.push(bookmark);
    }
    out
}

/// Explicit bookmarks when present, headings otherwise.
pub fn document_outline(elements: &ElementTree) -> Vec<Bookmark> {
    let explicit = load_bookmarks(elements);
    if explicit.is_empty() {
        generate_from_headings(elements)
    } else {
        explicit
    }
}

/// Depth-first walk yielding `(level, bookmark)` with levels starting at 1.
pub fn flatten(bookmarks: &[Bookmark]) -> Vec<(u8, &Bookmark)> {
    fn walk<'a>(bookmarks: &'a [Bookmark], level: u8, out: &mut Vec<(u8, &'a Bookmark)>) {
        for b in bookmarks {
            out.push((level, b));
            walk(&b.children, level.saturating_add(1), out);
        }
    }
    let mut out = Vec::new();
    walk(bookmarks, 1, &mut out);
    out
}
