//! The logical structure tree of a tagged document.
//!
//! Nodes live in an arena with the `Document` element at index 0. Marked
//! content and link annotations are attached as kids and collected into the
//! parent tree when the document is written.

use crate::sink::ContentSink;
use crate::writer::StreamingPdfWriter;
use lopdf::{Dictionary, Object, ObjectId, dictionary, text_string};
use std::collections::BTreeMap;
use std::io::{self, Seek, Write};

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum StructKid {
    Node(NodeId),
    MarkedContent { page: usize, mcid: u32 },
    Annotation { page: usize, annotation: ObjectId },
}

#[derive(Debug, Clone)]
pub struct StructNode {
    pub role: String,
    pub parent: Option<NodeId>,
    pub kids: Vec<StructKid>,
    pub alt: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug)]
pub struct StructureTree {
    nodes: Vec<StructNode>,
    /// Per page: owner node of each MCID, indexed by MCID.
    page_mcids: BTreeMap<usize, Vec<NodeId>>,
    page_keys: BTreeMap<usize, i64>,
    annotation_keys: Vec<(i64, NodeId)>,
    next_key: i64,
}

impl Default for StructureTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![StructNode {
                role: "Document".to_string(),
                parent: None,
                kids: Vec::new(),
                alt: None,
                title: None,
            }],
            page_mcids: BTreeMap::new(),
            page_keys: BTreeMap::new(),
            annotation_keys: Vec::new(),
            next_key: 0,
        }
    }

    pub const fn document() -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> Option<&StructNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn add_node(&mut self, role: &str, parent: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(StructNode {
            role: role.to_string(),
            parent: Some(parent),
            kids: Vec::new(),
            alt: None,
            title: None,
        });
        if let Some(p) = self.nodes.get_mut(parent) {
            p.kids.push(StructKid::Node(id));
        }
        id
    }

    pub fn set_alt(&mut self, node: NodeId, alt: &str) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.alt = Some(alt.to_string());
        }
    }

    pub fn set_title(&mut self, node: NodeId, title: &str) {
        if let Some(n) = self.nodes.get_mut(node) {
            n.title = Some(title.to_string());
        }
    }

    /// Creates a `role` node under `parent` and opens a marked-content
    /// sequence for it on `page`.
    pub fn open(&mut self, sink: &mut ContentSink, role: &str, parent: NodeId, page: usize) -> NodeId {
        let node = self.add_node(role, parent);
        self.begin_marked_content(sink, node, page);
        node
    }

    /// Opens another marked-content sequence owned by an existing node.
    pub fn begin_marked_content(&mut self, sink: &mut ContentSink, node: NodeId, page: usize) {
        let owners = self.page_mcids.entry(page).or_default();
        let mcid = owners.len() as u32;
        owners.push(node);
        if let Some(n) = self.nodes.get_mut(node) {
            n.kids.push(StructKid::MarkedContent { page, mcid });
            sink.begin_tagged(&n.role, mcid);
        }
    }

    pub fn mcid_count(&self, page: usize) -> usize {
        self.page_mcids.get(&page).map_or(0, Vec::len)
    }

    /// Attaches a link annotation to `node` and returns the annotation's
    /// `StructParent` key.
    pub fn attach_annotation(&mut self, node: NodeId, page: usize, annotation: ObjectId) -> i64 {
        let key = self.next_key;
        self.next_key += 1;
        if let Some(n) = self.nodes.get_mut(node) {
            n.kids.push(StructKid::Annotation { page, annotation });
        }
        self.annotation_keys.push((key, node));
        key
    }

    /// The page's `StructParents` key, allocated the first time it is asked
    /// for. Pages without marked content get none.
    pub fn page_key(&mut self, page: usize) -> Option<i64> {
        if self.mcid_count(page) == 0 {
            return None;
        }
        if let Some(key) = self.page_keys.get(&page) {
            return Some(*key);
        }
        let key = self.next_key;
        self.next_key += 1;
        self.page_keys.insert(page, key);
        Some(key)
    }

    /// Writes every node, the parent tree and the `StructTreeRoot`.
    /// `page_ids` maps global page indices to page objects.
    pub fn write<W: Write + Seek>(
        &self,
        writer: &mut StreamingPdfWriter<W>,
        page_ids: &[ObjectId],
    ) -> io::Result<ObjectId> {
        let root_id = writer.new_object_id();
        let node_ids: Vec<ObjectId> = self.nodes.iter().map(|_| writer.new_object_id()).collect();
        let page_ref = |page: usize| page_ids.get(page).copied().map(Object::Reference).unwrap_or(Object::Null);

        for (idx, node) in self.nodes.iter().enumerate() {
            let kids: Vec<Object> = node
                .kids
                .iter()
                .map(|kid| match kid {
                    StructKid::Node(child) => Object::Reference(node_ids[*child]),
                    StructKid::MarkedContent { page, mcid } => Object::Dictionary(dictionary! {
                        "Type" => "MCR",
                        "Pg" => page_ref(*page),
                        "MCID" => *mcid as i64,
                    }),
                    StructKid::Annotation { page, annotation } => Object::Dictionary(dictionary! {
                        "Type" => "OBJR",
                        "Pg" => page_ref(*page),
                        "Obj" => *annotation,
                    }),
                })
                .collect();
            let parent = match node.parent {
                Some(p) => node_ids[p],
                None => root_id,
            };
            let mut dict = dictionary! {
                "Type" => "StructElem",
                "S" => Object::Name(node.role.as_bytes().to_vec()),
                "P" => parent,
                "K" => kids,
            };
            if let Some(alt) = &node.alt {
                dict.set("Alt", text_string(alt));
            }
            if let Some(title) = &node.title {
                dict.set("T", text_string(title));
            }
            writer.buffer_object_at_id(node_ids[idx], dict.into());
        }

        let mut nums: BTreeMap<i64, Object> = BTreeMap::new();
        for (page, key) in &self.page_keys {
            let owners = self.page_mcids.get(page).map(Vec::as_slice).unwrap_or(&[]);
            let refs = owners.iter().map(|n| Object::Reference(node_ids[*n])).collect::<Vec<_>>();
            nums.insert(*key, Object::Array(refs));
        }
        for (key, node) in &self.annotation_keys {
            nums.insert(*key, Object::Reference(node_ids[*node]));
        }
        let parent_tree = dictionary! {
            "Nums" => nums.into_iter().flat_map(|(k, v)| [Object::Integer(k), v]).collect::<Vec<_>>(),
        };
        let parent_tree_id = writer.buffer_object(parent_tree.into());

        let root: Dictionary = dictionary! {
            "Type" => "StructTreeRoot",
            "K" => vec![Object::Reference(node_ids[Self::document()])],
            "ParentTree" => parent_tree_id,
            "ParentTreeNextKey" => self.next_key,
        };
        writer.buffer_object_at_id(root_id, root.into());
        Ok(root_id)
    }
}
