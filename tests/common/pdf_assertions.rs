#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};
use std::collections::BTreeMap;

/// Extract all text content from a PDF document
pub fn extract_text(doc: &LopdfDocument) -> String {
    let mut text = String::new();
    let pages = doc.get_pages();
    for page_num in 1..=pages.len() {
        if let Ok(page_text) = doc.extract_text(&[page_num as u32]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }
    text
}

/// Page object ids in page order
pub fn page_ids(doc: &LopdfDocument) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// Decoded content stream operations of a 1-based page
pub fn page_operations(doc: &LopdfDocument, page_num: u32) -> Vec<Operation> {
    let Some(page_id) = doc.get_pages().get(&page_num).copied() else {
        return Vec::new();
    };
    doc.get_page_content(page_id)
        .ok()
        .and_then(|content| Content::decode(&content).ok())
        .map(|content| content.operations)
        .unwrap_or_default()
}

pub fn page_operators(doc: &LopdfDocument, page_num: u32) -> Vec<String> {
    page_operations(doc, page_num).into_iter().map(|op| op.operator).collect()
}

pub fn count_operator(ops: &[String], operator: &str) -> usize {
    ops.iter().filter(|op| *op == operator).count()
}

fn resolve<'a>(doc: &'a LopdfDocument, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a LopdfDocument, object: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, object).and_then(|o| o.as_dict().ok())
}

pub fn catalog(doc: &LopdfDocument) -> &Dictionary {
    doc.catalog().expect("document has a catalog")
}

pub fn info_entry(doc: &LopdfDocument, key: &str) -> Option<String> {
    let info = doc.trailer.get(b"Info").ok()?;
    let info = resolve_dict(doc, info)?;
    let value = info.get(key.as_bytes()).ok()?;
    decode_text_string(value)
}

/// Literal or UTF-16BE text string as Rust text
pub fn decode_text_string(value: &Object) -> Option<String> {
    let bytes = value.as_str().ok()?;
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]))
            .collect();
        String::from_utf16(&units).ok()
    } else {
        Some(bytes.iter().map(|b| *b as char).collect())
    }
}

/// Link annotation dictionaries of a 1-based page
pub fn annotations(doc: &LopdfDocument, page_num: u32) -> Vec<&Dictionary> {
    let Some(page_id) = doc.get_pages().get(&page_num).copied() else {
        return Vec::new();
    };
    let Ok(page) = doc.get_dictionary(page_id) else {
        return Vec::new();
    };
    let Ok(annots) = page.get(b"Annots").and_then(Object::as_array) else {
        return Vec::new();
    };
    annots.iter().filter_map(|a| resolve_dict(doc, a)).collect()
}

/// One structure element, flattened in depth-first order
#[derive(Debug, Clone)]
pub struct StructElem {
    pub id: ObjectId,
    pub role: String,
    pub depth: usize,
    pub parent_role: Option<String>,
    pub alt: Option<String>,
    /// (page object, MCID) of every marked-content kid
    pub mcids: Vec<(ObjectId, i64)>,
    pub annotations: usize,
}

/// Structure elements below the StructTreeRoot, the root `Document` included
pub fn struct_elements(doc: &LopdfDocument) -> Vec<StructElem> {
    let mut out = Vec::new();
    let Ok(root) = catalog(doc).get(b"StructTreeRoot") else {
        return out;
    };
    let Some(root) = resolve_dict(doc, root) else {
        return out;
    };
    let Ok(kids) = root.get(b"K").and_then(Object::as_array) else {
        return out;
    };
    for kid in kids {
        if let Ok(id) = kid.as_reference() {
            walk_struct(doc, id, 0, None, &mut out);
        }
    }
    out
}

fn walk_struct(doc: &LopdfDocument, id: ObjectId, depth: usize, parent_role: Option<String>, out: &mut Vec<StructElem>) {
    let Ok(dict) = doc.get_dictionary(id) else { return };
    let role = dict
        .get(b"S")
        .and_then(Object::as_name)
        .map(|n| String::from_utf8_lossy(n).to_string())
        .unwrap_or_default();
    let alt = dict.get(b"Alt").ok().and_then(decode_text_string);

    let mut elem = StructElem {
        id,
        role: role.clone(),
        depth,
        parent_role,
        alt,
        mcids: Vec::new(),
        annotations: 0,
    };
    let mut children = Vec::new();
    if let Ok(kids) = dict.get(b"K").and_then(Object::as_array) {
        for kid in kids {
            match kid {
                Object::Reference(child) => children.push(*child),
                Object::Dictionary(d) => {
                    let kind = d.get(b"Type").and_then(Object::as_name).unwrap_or_default();
                    if kind == b"MCR" {
                        if let (Ok(page), Ok(mcid)) = (
                            d.get(b"Pg").and_then(Object::as_reference),
                            d.get(b"MCID").and_then(Object::as_i64),
                        ) {
                            elem.mcids.push((page, mcid));
                        }
                    } else if kind == b"OBJR" {
                        elem.annotations += 1;
                    }
                }
                _ => {}
            }
        }
    }
    out.push(elem);
    for child in children {
        walk_struct(doc, child, depth + 1, Some(role.clone()), out);
    }
}

pub fn roles(doc: &LopdfDocument) -> Vec<String> {
    struct_elements(doc).into_iter().map(|e| e.role).collect()
}

/// ParentTree `Nums` as a map from key to value
pub fn parent_tree(doc: &LopdfDocument) -> BTreeMap<i64, Object> {
    let mut out = BTreeMap::new();
    let tree = catalog(doc)
        .get(b"StructTreeRoot")
        .ok()
        .and_then(|r| resolve_dict(doc, r))
        .and_then(|root| root.get(b"ParentTree").ok())
        .and_then(|t| resolve_dict(doc, t));
    let Some(nums) = tree.and_then(|t| t.get(b"Nums").ok()).and_then(|n| n.as_array().ok()) else {
        return out;
    };
    for pair in nums.chunks(2) {
        if let [Object::Integer(key), value] = pair {
            out.insert(*key, value.clone());
        }
    }
    out
}

/// Marked-content nesting of one stream: depth never drops below zero and
/// ends at zero.
pub fn assert_marked_content_balanced(ops: &[String]) {
    let mut depth: i64 = 0;
    for (idx, op) in ops.iter().enumerate() {
        match op.as_str() {
            "BDC" | "BMC" => depth += 1,
            "EMC" => {
                depth -= 1;
                assert!(depth >= 0, "EMC without open sequence at operation {}: {:?}", idx, ops);
            }
            _ => {}
        }
    }
    assert_eq!(depth, 0, "unclosed marked content: {:?}", ops);
}

/// Graphics state saves and restores pair up
pub fn assert_state_balanced(ops: &[String]) {
    let mut depth: i64 = 0;
    for op in ops {
        match op.as_str() {
            "q" => depth += 1,
            "Q" => {
                depth -= 1;
                assert!(depth >= 0, "Q without q: {:?}", ops);
            }
            _ => {}
        }
    }
    assert_eq!(depth, 0, "unrestored graphics state: {:?}", ops);
}

/// Structural conformance of a tagged file: every page stream is balanced,
/// MCIDs are 0..n per page, and the parent tree maps each of them back to
/// the structure element that lists it.
pub fn assert_tagged_structure(doc: &LopdfDocument) {
    let elements = struct_elements(doc);
    let tree = parent_tree(doc);
    assert!(!elements.is_empty(), "no structure tree");
    assert_eq!(elements[0].role, "Document");

    for (page_num, page_id) in doc.get_pages() {
        let operations = page_operations(doc, page_num);
        let ops: Vec<String> = operations.iter().map(|op| op.operator.clone()).collect();
        assert_marked_content_balanced(&ops);
        assert_state_balanced(&ops);

        let mcids: Vec<i64> = operations
            .iter()
            .filter(|op| op.operator == "BDC")
            .filter_map(|op| op.operands.get(1))
            .filter_map(|props| props.as_dict().ok())
            .filter_map(|props| props.get(b"MCID").and_then(Object::as_i64).ok())
            .collect();
        let expected: Vec<i64> = (0..mcids.len() as i64).collect();
        assert_eq!(mcids, expected, "MCIDs on page {} are not sequential", page_num);
        if mcids.is_empty() {
            continue;
        }

        let page = doc.get_dictionary(page_id).expect("page dictionary");
        let key = page
            .get(b"StructParents")
            .and_then(Object::as_i64)
            .expect("tagged page has StructParents");
        let owners = tree
            .get(&key)
            .and_then(|o| o.as_array().ok())
            .expect("parent tree entry for page");
        assert_eq!(owners.len(), mcids.len(), "parent tree size on page {}", page_num);
        for (mcid, owner) in owners.iter().enumerate() {
            let owner = owner.as_reference().expect("owner reference");
            let elem = elements.iter().find(|e| e.id == owner).expect("owner is in the tree");
            assert!(
                elem.mcids.contains(&(page_id, mcid as i64)),
                "{} does not list MCID {} of page {}",
                elem.role,
                mcid,
                page_num
            );
        }
    }
}

/// Text shown with `Tj`/`TJ` on a 1-based page, decoded as WinAnsi bytes
pub fn shown_text(doc: &LopdfDocument, page_num: u32) -> String {
    let latin1 = |bytes: &[u8]| bytes.iter().map(|b| *b as char).collect::<String>();
    let mut text = String::new();
    for op in page_operations(doc, page_num) {
        match op.operator.as_str() {
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    text.push_str(&latin1(bytes));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    for item in items {
                        if let Object::String(bytes, _) = item {
                            text.push_str(&latin1(bytes));
                        }
                    }
                }
            }
            _ => {}
        }
    }
    text
}

/// Numeric operands of every `operator` on a 1-based page
pub fn operands_of(doc: &LopdfDocument, page_num: u32, operator: &str) -> Vec<Vec<f32>> {
    page_operations(doc, page_num)
        .into_iter()
        .filter(|op| op.operator == operator)
        .map(|op| op.operands.iter().filter_map(|o| o.as_float().ok()).collect())
        .collect()
}

pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

/// Page-level resource dictionary, following a shared reference
pub fn page_resources(doc: &LopdfDocument, page_num: u32) -> Option<&Dictionary> {
    let page_id = doc.get_pages().get(&page_num).copied()?;
    let page = doc.get_dictionary(page_id).ok()?;
    resolve_dict(doc, page.get(b"Resources").ok()?)
}

/// Resolves `object` when it is an indirect reference
pub fn deref<'a>(doc: &'a LopdfDocument, object: &'a Object) -> Option<&'a Object> {
    resolve(doc, object)
}
