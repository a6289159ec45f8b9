//! Per-page painting session.

use crate::links::LinkAnnotator;
use crate::sink::ContentSink;
use crate::tagger::StructureContext;
use folio_render_core::RenderError;
use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};

/// XMP packet wrapper for page and document metadata streams.
pub fn xmp_packet(body: &str) -> String {
    format!(
        "<?xpacket begin='\u{FEFF}' id='W5M0MpCehiHzreSzNTczkc9d'?>\n{}\n<?xpacket end='r'?>",
        body
    )
}

pub fn metadata_stream(xmp: &str) -> Object {
    Object::Stream(Stream::new(
        dictionary! { "Type" => "Metadata", "Subtype" => "XML" },
        xmp.as_bytes().to_vec(),
    ))
}

/// Everything that lives exactly as long as one page: its content stream,
/// the tagging state, the link areas already annotated and the annotations
/// written so far.
#[derive(Debug)]
pub struct PageSession {
    /// Index among all pages of the output file.
    pub index: usize,
    pub page_id: ObjectId,
    /// Page size in points.
    pub width: f32,
    pub height: f32,
    pub sink: ContentSink,
    pub context: StructureContext,
    pub links: LinkAnnotator,
    pub annotations: Vec<ObjectId>,
    pub metadata: Option<String>,
}

impl PageSession {
    pub fn new(index: usize, page_id: ObjectId, width: f32, height: f32) -> Self {
        Self {
            index,
            page_id,
            width,
            height,
            sink: ContentSink::new(),
            context: StructureContext::new(),
            links: LinkAnnotator::new(),
            annotations: Vec::new(),
            metadata: None,
        }
    }

    /// Closes every open marked-content sequence, restores the graphics
    /// state saved at page open and returns the encoded content stream.
    pub fn finish_content(mut self) -> Result<FinishedPage, RenderError> {
        recover_tag_imbalance(&mut self.sink, self.context.open_sequences(), self.index);
        let closed = self.sink.end_all_marked_content();
        if closed > 0 {
            log::debug!("Closed {} marked-content sequences at end of page {}", closed, self.index + 1);
        }
        while self.sink.save_depth() > 0 {
            self.sink.restore_state();
        }
        Ok(FinishedPage {
            index: self.index,
            page_id: self.page_id,
            width: self.width,
            height: self.height,
            content: self.sink.encode()?,
            annotations: self.annotations,
            metadata: self.metadata,
        })
    }
}

/// A closed page ready to be written.
#[derive(Debug)]
pub struct FinishedPage {
    pub index: usize,
    pub page_id: ObjectId,
    pub width: f32,
    pub height: f32,
    pub content: Vec<u8>,
    pub annotations: Vec<ObjectId>,
    pub metadata: Option<String>,
}

impl FinishedPage {
    pub fn page_dictionary(
        &self,
        resources_id: ObjectId,
        contents_id: ObjectId,
        struct_parents: Option<i64>,
        metadata_id: Option<ObjectId>,
    ) -> Dictionary {
        let mut page = dictionary! {
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(self.width), Object::Real(self.height)],
            "Resources" => resources_id,
            "Contents" => contents_id,
        };
        if !self.annotations.is_empty() {
            page.set(
                "Annots",
                self.annotations.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            );
        }
        if let Some(key) = struct_parents {
            page.set("StructParents", key);
            page.set("Tabs", "S");
        }
        if let Some(id) = metadata_id {
            page.set("Metadata", id);
        }
        page
    }
}

/// Last-resort repair of a page whose marked content does not match the
/// `tracked` sequences the tagger holds open: log it and force one more
/// close. Returns the imbalance that was found, if any.
pub fn recover_tag_imbalance(sink: &mut ContentSink, tracked: usize, page_index: usize) -> Option<RenderError> {
    let open = sink.marked_depth();
    let unmatched = sink.unmatched_ends();
    if open == tracked && unmatched == 0 {
        return None;
    }
    let err = RenderError::TagImbalance {
        open: open.saturating_sub(tracked),
        unmatched,
    };
    log::warn!(
        "Marked content on page {} is unbalanced ({}); forcing an extra close",
        page_index + 1,
        err
    );
    if open > tracked {
        sink.end_marked_content();
    }
    Some(err)
}
