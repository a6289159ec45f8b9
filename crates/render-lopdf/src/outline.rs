use crate::writer::StreamingPdfWriter;
use lopdf::{Object, ObjectId, dictionary, text_string};
use std::collections::HashMap;
use std::io::{Seek, Write};

/// One bookmark in document order. `level` starts at 1; an entry nests under
/// the closest preceding entry with a lower level.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub level: u8,
    pub title: String,
    pub dest: Vec<Object>,
}

struct OutlineNode {
    id: ObjectId,
    title: String,
    dest: Vec<Object>,
    children: Vec<OutlineNode>,
}

/// Buffers the outline tree and returns the id of its `Outlines` root, or
/// `None` for an empty outline.
pub fn build_outlines<W: Write + Seek>(
    writer: &mut StreamingPdfWriter<W>,
    entries: &[OutlineEntry],
) -> Option<ObjectId> {
    if entries.is_empty() {
        return None;
    }

    let mut parents: Vec<Option<usize>> = Vec::with_capacity(entries.len());
    let mut level_stack: Vec<(u8, usize)> = Vec::new();
    for (idx, entry) in entries.iter().enumerate() {
        while level_stack.last().is_some_and(|(level, _)| *level >= entry.level) {
            level_stack.pop();
        }
        parents.push(level_stack.last().map(|(_, parent)| *parent));
        level_stack.push((entry.level, idx));
    }

    let mut children_map: HashMap<usize, Vec<OutlineNode>> = HashMap::new();
    let mut root_items = Vec::new();
    for (idx, entry) in entries.iter().enumerate().rev() {
        let mut children = children_map.remove(&idx).unwrap_or_default();
        children.reverse();
        let node = OutlineNode {
            id: writer.new_object_id(),
            title: entry.title.clone(),
            dest: entry.dest.clone(),
            children,
        };
        match parents[idx] {
            Some(parent) => children_map.entry(parent).or_default().push(node),
            None => root_items.push(node),
        }
    }
    root_items.reverse();

    let (first, last) = (root_items.first()?.id, root_items.last()?.id);
    let outline_root_id = writer.new_object_id();
    writer.buffer_object_at_id(
        outline_root_id,
        dictionary! {
            "Type" => "Outlines",
            "First" => first,
            "Last" => last,
            "Count" => root_items.len() as i64,
        }
        .into(),
    );

    fn buffer_outline_level<W: Write + Seek>(
        items: &[OutlineNode],
        parent_id: ObjectId,
        writer: &mut StreamingPdfWriter<W>,
    ) {
        for (i, item) in items.iter().enumerate() {
            let mut dict = dictionary! {
                "Title" => text_string(&item.title),
                "Parent" => parent_id,
                "Dest" => item.dest.clone(),
            };
            if i > 0 {
                dict.set("Prev", items[i - 1].id);
            }
            if i + 1 < items.len() {
                dict.set("Next", items[i + 1].id);
            }
            if let (Some(first), Some(last)) = (item.children.first(), item.children.last()) {
                dict.set("First", first.id);
                dict.set("Last", last.id);
                dict.set("Count", -(item.children.len() as i64));
                buffer_outline_level(&item.children, item.id, writer);
            }
            writer.buffer_object_at_id(item.id, dict.into());
        }
    }
    buffer_outline_level(&root_items, outline_root_id, writer);
    Some(outline_root_id)
}
