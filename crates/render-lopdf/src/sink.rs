//! Buffered page content with marked-content bookkeeping.

use folio_render_core::RenderError;
use lopdf::Object;
use lopdf::content::{Content, Operation};
use lopdf::dictionary;

/// Collects the operators of one page content stream.
///
/// Marked-content operators go through [`begin_tagged`](Self::begin_tagged),
/// [`begin_artifact`](Self::begin_artifact) and
/// [`end_marked_content`](Self::end_marked_content) so the sink can tell
/// whether the stream is balanced before it is written.
#[derive(Debug, Default)]
pub struct ContentSink {
    operations: Vec<Operation>,
    marked_depth: usize,
    unmatched_ends: usize,
    save_depth: usize,
}

impl ContentSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }

    pub fn save_state(&mut self) {
        self.save_depth += 1;
        self.op("q", vec![]);
    }

    /// Emits `Q` when a matching `q` is outstanding.
    pub fn restore_state(&mut self) {
        if self.save_depth == 0 {
            log::warn!("Ignoring graphics state restore without a matching save");
            return;
        }
        self.save_depth -= 1;
        self.op("Q", vec![]);
    }

    pub fn save_depth(&self) -> usize {
        self.save_depth
    }

    /// `/Role <</MCID n>> BDC`
    pub fn begin_tagged(&mut self, role: &str, mcid: u32) {
        self.marked_depth += 1;
        self.op(
            "BDC",
            vec![
                Object::Name(role.as_bytes().to_vec()),
                Object::Dictionary(dictionary! { "MCID" => mcid as i64 }),
            ],
        );
    }

    /// `/Artifact BMC`
    pub fn begin_artifact(&mut self) {
        self.marked_depth += 1;
        self.op("BMC", vec![Object::Name(b"Artifact".to_vec())]);
    }

    /// Emits `EMC`, or records the close as unmatched when nothing is open.
    pub fn end_marked_content(&mut self) {
        if self.marked_depth == 0 {
            self.unmatched_ends += 1;
            return;
        }
        self.marked_depth -= 1;
        self.op("EMC", vec![]);
    }

    /// Closes every open marked-content sequence and returns how many were closed.
    pub fn end_all_marked_content(&mut self) -> usize {
        let open = self.marked_depth;
        for _ in 0..open {
            self.end_marked_content();
        }
        open
    }

    pub fn marked_depth(&self) -> usize {
        self.marked_depth
    }

    /// Closes requested while nothing was open.
    pub fn unmatched_ends(&self) -> usize {
        self.unmatched_ends
    }

    /// Fails with [`RenderError::TagImbalance`] when a sequence is still open
    /// or a close arrived with nothing open.
    pub fn check_balance(&self) -> Result<(), RenderError> {
        if self.marked_depth == 0 && self.unmatched_ends == 0 {
            Ok(())
        } else {
            Err(RenderError::TagImbalance {
                open: self.marked_depth,
                unmatched: self.unmatched_ends,
            })
        }
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn encode(self) -> Result<Vec<u8>, RenderError> {
        Content {
            operations: self.operations,
        }
        .encode()
        .map_err(RenderError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operators(sink: &ContentSink) -> Vec<&str> {
        sink.operations().iter().map(|op| op.operator.as_str()).collect()
    }

    #[test]
    fn nested_sequences_balance() {
        let mut sink = ContentSink::new();
        sink.begin_tagged("L", 0);
        sink.begin_tagged("LI", 1);
        sink.end_marked_content();
        sink.end_marked_content();
        assert!(sink.check_balance().is_ok());
        assert_eq!(operators(&sink), vec!["BDC", "BDC", "EMC", "EMC"]);
    }

    #[test]
    fn stray_close_is_reported_not_written() {
        let mut sink = ContentSink::new();
        sink.end_marked_content();
        assert_eq!(operators(&sink), Vec::<&str>::new());
        match sink.check_balance() {
            Err(RenderError::TagImbalance { open, unmatched }) => {
                assert_eq!(open, 0);
                assert_eq!(unmatched, 1);
            }
            other => panic!("expected imbalance, got {:?}", other),
        }
    }

    #[test]
    fn end_all_closes_everything() {
        let mut sink = ContentSink::new();
        sink.begin_artifact();
        sink.begin_tagged("P", 0);
        assert_eq!(sink.end_all_marked_content(), 2);
        assert!(sink.check_balance().is_ok());
        assert_eq!(sink.end_all_marked_content(), 0);
    }

    #[test]
    fn restore_without_save_is_dropped() {
        let mut sink = ContentSink::new();
        sink.save_state();
        sink.restore_state();
        sink.restore_state();
        assert_eq!(operators(&sink), vec!["q", "Q"]);
    }

    #[test]
    fn encodes_marked_content_operands() {
        let mut sink = ContentSink::new();
        sink.begin_tagged("P", 3);
        sink.end_marked_content();
        let text = String::from_utf8(sink.encode().unwrap()).unwrap();
        assert!(text.contains("/P"));
        assert!(text.contains("/MCID 3"));
        assert!(text.contains("EMC"));
    }
}
