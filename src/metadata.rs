//! Name/content metadata pairs taken from the document `<head>`.

use folio_types::{ElementId, ElementTree};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub name: String,
    pub content: String,
}

/// Ordered metadata list. Names compare case-insensitively; one name may
/// appear several times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataList {
    entries: Vec<Metadata>,
}

impl MetadataList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every `<meta name content>` in `<head>`. Without a `title`
    /// entry, the trimmed text of `<title>` becomes one.
    pub fn from_document(elements: &ElementTree) -> Self {
        let mut list = Self::new();
        list.load(elements);
        list
    }

    pub fn load(&mut self, elements: &ElementTree) {
        let Some(head) = head_element(elements) else {
            return;
        };
        for meta in elements.children_named(head, "meta") {
            if let Some(name) = elements.attribute(meta, "name") {
                let content = elements.attribute(meta, "content").unwrap_or_default();
                self.add(name, content);
            }
        }
        if self.by_name("title").is_none() {
            if let Some(title) = elements.child(head, "title") {
                let text = elements.text_content(title);
                self.add("title", text.trim());
            }
        }
    }

    pub fn add(&mut self, name: &str, content: &str) {
        self.entries.push(Metadata {
            name: name.to_string(),
            content: content.to_string(),
        });
    }

    /// Replaces every entry named `name` with a single one holding `content`,
    /// kept at the position of the first match. `None` removes them all.
    pub fn set(&mut self, name: &str, content: Option<&str>) {
        let first = self.entries.iter().position(|m| m.name.eq_ignore_ascii_case(name));
        match (first, content) {
            (Some(idx), Some(content)) => {
                self.entries[idx].content = content.to_string();
                let mut seen = 0;
                self.entries.retain(|m| {
                    if !m.name.eq_ignore_ascii_case(name) {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            (None, Some(content)) => self.add(name, content),
            (_, None) => self.entries.retain(|m| !m.name.eq_ignore_ascii_case(name)),
        }
    }

    /// Content of the first entry named `name`.
    pub fn by_name(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .map(|m| m.content.as_str())
    }

    pub fn list_by_name(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|m| m.name.eq_ignore_ascii_case(name))
            .map(|m| m.content.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Metadata> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// `<head>` directly under the root element.
pub fn head_element(elements: &ElementTree) -> Option<ElementId> {
    let root = elements.root()?;
    elements.child(root, "head")
}
