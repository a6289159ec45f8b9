//! Reads an XHTML source document into an [`ElementTree`].
//!
//! Elements are numbered in document (pre-)order, which is how layout files
//! refer to them.

use crate::error::PipelineError;
use folio_types::{ElementId, ElementTree};
use roxmltree::{Document, Node, ParsingOptions};

pub fn parse_xhtml(text: &str) -> Result<ElementTree, PipelineError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, options)?;
    let mut tree = ElementTree::new();
    append_element(&mut tree, None, doc.root_element());
    log::debug!("Parsed source document with {} elements", tree.len());
    Ok(tree)
}

fn append_element(tree: &mut ElementTree, parent: Option<ElementId>, node: Node<'_, '_>) {
    let id = tree.append(parent, node.tag_name().name());
    for attr in node.attributes() {
        tree.set_attribute(id, attr.name(), attr.value());
    }
    let text: String = node
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect();
    if !text.is_empty() {
        tree.set_text(id, &text);
    }
    for child in node.children().filter(|c| c.is_element()) {
        append_element(tree, Some(id), child);
    }
}
