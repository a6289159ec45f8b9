//! Link annotations: target areas, actions and per-page de-duplication.

use crate::transform::CoordinateTransformer;
use folio_types::{BoxId, BoxTree, ElementId, Rect};
use lopdf::{Dictionary, Object, ObjectId, StringFormat, dictionary, text_string};
use std::collections::HashSet;
use url::Url;

/// A link rectangle in PDF page space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkArea {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl LinkArea {
    pub fn merge(&self, other: &LinkArea) -> LinkArea {
        LinkArea {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
        }
    }

    /// Identity used to drop duplicate annotations on one page.
    pub fn key(&self) -> String {
        format!("{}:{}:{}:{}", self.left, self.bottom, self.right, self.top)
    }

    fn to_object(self) -> Object {
        Object::Array(
            [self.left, self.bottom, self.right, self.top]
                .into_iter()
                .map(Object::Real)
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkAction {
    /// `[page /XYZ left top zoom]`
    GoTo(Vec<Object>),
    JavaScript(String),
    Uri(String),
}

impl LinkAction {
    fn to_dictionary(&self) -> Dictionary {
        match self {
            LinkAction::GoTo(dest) => dictionary! { "S" => "GoTo", "D" => dest.clone() },
            LinkAction::JavaScript(script) => dictionary! {
                "S" => "JavaScript",
                "JS" => text_string(script),
            },
            LinkAction::Uri(uri) => dictionary! {
                "S" => "URI",
                "URI" => Object::String(uri.as_bytes().to_vec(), StringFormat::Literal),
            },
        }
    }
}

/// Remembers which link areas a page already carries.
#[derive(Debug, Default)]
pub struct LinkAnnotator {
    seen: HashSet<String>,
}

impl LinkAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time `area` is claimed on this page.
    pub fn claim(&mut self, area: &LinkArea) -> bool {
        self.seen.insert(area.key())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Area covered by `start` and the adjacent sibling boxes generated for
    /// the same element, so a link wrapped across fragments yields one rectangle.
    pub fn link_area(boxes: &BoxTree, transformer: &CoordinateTransformer, start: BoxId) -> Option<LinkArea> {
        let element = boxes.get(start)?.element;
        let same = |id: BoxId| boxes.get(id).is_some_and(|b| b.element == element);

        let mut first = start;
        while let Some(prev) = boxes.previous_sibling(first).filter(|p| same(*p)) {
            first = prev;
        }

        let mut area = local_area(boxes, transformer, first)?;
        let mut current = first;
        while let Some(next) = boxes.next_sibling(current).filter(|n| same(*n)) {
            if let Some(next_area) = local_area(boxes, transformer, next) {
                area = area.merge(&next_area);
            }
            current = next;
        }
        Some(area)
    }

    pub fn annotation(area: &LinkArea, action: &LinkAction, contents: Option<&str>) -> Dictionary {
        let mut annot = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => area.to_object(),
            "Border" => vec![0.into(), 0.into(), 0.into()],
            "A" => action.to_dictionary(),
        };
        if let Some(contents) = contents {
            annot.set("Contents", text_string(contents));
        }
        annot
    }
}

fn local_area(boxes: &BoxTree, transformer: &CoordinateTransformer, id: BoxId) -> Option<LinkArea> {
    let b = boxes.get(id)?;
    let bounds: Rect = b.aggregate_bounds.unwrap_or(b.bounds);
    let (left, bottom) = transformer.to_page_point(bounds.x, bounds.bottom());
    Some(LinkArea {
        left,
        bottom,
        right: left + transformer.to_points(bounds.width),
        top: bottom + transformer.to_points(bounds.height),
    })
}

/// Destination array `[page /XYZ 0 top 0]`.
pub fn xyz_destination(page: ObjectId, top: f32) -> Vec<Object> {
    vec![
        Object::Reference(page),
        "XYZ".into(),
        0.into(),
        Object::Real(top),
        0.into(),
    ]
}

/// `[page /FitH top]`
pub fn fit_h_destination(page: ObjectId, top: f32) -> Vec<Object> {
    vec![Object::Reference(page), "FitH".into(), Object::Real(top)]
}

/// Resolves `uri` against `base`. Absolute URIs and fragment-only
/// references come back unchanged, as does anything `base` cannot join.
pub fn resolve_uri(uri: &str, base: Option<&str>) -> String {
    let Some(base) = base else {
        return uri.to_string();
    };
    if uri.starts_with('#') || Url::parse(uri).is_ok() {
        return uri.to_string();
    }
    match Url::parse(base).and_then(|base| base.join(uri)) {
        Ok(resolved) => resolved.into(),
        Err(err) => {
            log::warn!("Cannot resolve link {:?} against {:?}: {}", uri, base, err);
            uri.to_string()
        }
    }
}

/// The `href` of an element that is a hyperlink, if any.
pub fn link_target(elements: &folio_types::ElementTree, element: ElementId) -> Option<&str> {
    if !elements.is(element, "a") {
        return None;
    }
    elements.attribute(element, "href").filter(|h| !h.trim().is_empty())
}
