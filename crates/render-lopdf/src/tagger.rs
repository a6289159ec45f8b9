//! Decides which structure elements wrap each painted text run.
//!
//! Text arrives one run at a time, in painting order. The tagger keeps the
//! open block and the stack of open lists in a [`StructureContext`] and
//! opens or closes marked-content sequences around each run so that every
//! run ends up inside the element it belongs to.

use crate::sink::ContentSink;
use crate::structure::{NodeId, StructureTree};
use folio_types::{ElementId, ElementTree};

/// A structure element with an open marked-content sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenTag {
    pub element: Option<ElementId>,
    pub node: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenList {
    root: OpenTag,
    item: Option<OpenTag>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum RunKind {
    #[default]
    Block,
    ListItem,
}

/// Tagging state carried from one text run to the next.
#[derive(Debug, Default)]
pub struct StructureContext {
    block: Option<OpenTag>,
    lists: Vec<OpenList>,
    run_kind: RunKind,
    end_item_now: bool,
    end_parent_now: bool,
    paint_text: bool,
}

impl StructureContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        self.block.is_none() && self.lists.is_empty()
    }

    pub fn open_block(&self) -> Option<OpenTag> {
        self.block
    }

    pub fn open_list_root(&self) -> Option<OpenTag> {
        self.lists.last().map(|l| l.root)
    }

    pub fn open_list_item(&self) -> Option<OpenTag> {
        self.lists.last().and_then(|l| l.item)
    }

    pub fn list_depth(&self) -> usize {
        self.lists.len()
    }

    /// Marked-content sequences held open across runs: the block plus every
    /// open list and list item.
    pub fn open_sequences(&self) -> usize {
        let lists: usize = self.lists.iter().map(|l| 1 + usize::from(l.item.is_some())).sum();
        usize::from(self.block.is_some()) + lists
    }

    pub fn should_paint_text(&self) -> bool {
        self.paint_text
    }

    /// Innermost open structure node; new children such as figures and
    /// links attach here.
    pub fn current_node(&self) -> Option<NodeId> {
        self.block
            .map(|b| b.node)
            .or_else(|| self.open_list_item().map(|i| i.node))
            .or_else(|| self.open_list_root().map(|r| r.node))
    }

    fn list_parent(&self) -> NodeId {
        self.open_list_item()
            .or_else(|| self.open_list_root())
            .map_or(StructureTree::document(), |t| t.node)
    }
}

/// Position of a text run among the runs of its block, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPosition {
    pub index: usize,
    pub count: usize,
}

impl RunPosition {
    pub fn new(index: usize, count: usize) -> Self {
        Self { index, count }
    }

    /// A run with no siblings.
    pub fn single() -> Self {
        Self { index: 1, count: 1 }
    }

    pub fn is_first(&self) -> bool {
        self.index <= 1
    }

    pub fn is_last(&self) -> bool {
        self.index >= self.count
    }
}

/// Structure role for a block element.
pub fn block_role(elements: &ElementTree, element: ElementId) -> &'static str {
    let Some(name) = elements.name(element) else {
        return "Div";
    };
    match name.to_ascii_lowercase().as_str() {
        "p" => "P",
        "h1" => "H1",
        "h2" => "H2",
        "h3" => "H3",
        "h4" => "H4",
        "h5" => "H5",
        "h6" => "H6",
        "blockquote" => "BlockQuote",
        "section" => "Sect",
        "article" => "Art",
        "caption" | "figcaption" => "Caption",
        "li" | "dt" | "dd" => "LI",
        "ol" | "ul" | "dl" => "L",
        _ => "Div",
    }
}

/// Writes marked-content operators and structure nodes for one page while
/// updating a [`StructureContext`].
pub struct StructureTagger<'a> {
    tree: &'a mut StructureTree,
    sink: &'a mut ContentSink,
    page: usize,
}

impl<'a> StructureTagger<'a> {
    pub fn new(tree: &'a mut StructureTree, sink: &'a mut ContentSink, page: usize) -> Self {
        Self { tree, sink, page }
    }

    /// Prepares tagging for a run whose nearest block is `block`.
    pub fn begin_run(
        &mut self,
        ctx: &mut StructureContext,
        elements: &ElementTree,
        block: Option<ElementId>,
        position: RunPosition,
    ) {
        ctx.end_item_now = false;
        ctx.end_parent_now = false;
        ctx.paint_text = true;

        match block {
            Some(item) if elements.is_list_item(item) || elements.is_description_list_item(item) => {
                ctx.run_kind = RunKind::ListItem;
                self.close_block(ctx);
                self.enter_item(ctx, elements, item);
                if position.is_last() {
                    ctx.end_item_now = true;
                    let (item_index, item_count) = elements.list_item_position(item).unwrap_or((1, 1));
                    if item_index >= item_count {
                        ctx.end_parent_now = true;
                    }
                }
            }
            _ => {
                ctx.run_kind = RunKind::Block;
                if ctx.block.is_some_and(|open| open.element != block) {
                    self.close_block(ctx);
                }
                match block.and_then(|b| elements.enclosing_list_item(b)) {
                    Some(item) => self.enter_item(ctx, elements, item),
                    None => self.leave_lists(ctx, elements, block),
                }
                if ctx.block.is_some() && position.is_first() {
                    self.close_block(ctx);
                }
                if ctx.block.is_none() {
                    let role = block.map_or("P", |b| block_role(elements, b));
                    let parent = ctx.list_parent();
                    let node = self.tree.open(self.sink, role, parent, self.page);
                    ctx.block = Some(OpenTag { element: block, node });
                }
                if position.is_last() {
                    ctx.end_parent_now = true;
                }
            }
        }
    }

    /// Closes whatever [`begin_run`](Self::begin_run) marked as finished.
    pub fn end_run(&mut self, ctx: &mut StructureContext) {
        if ctx.end_item_now {
            if let Some(list) = ctx.lists.last_mut() {
                if list.item.take().is_some() {
                    self.sink.end_marked_content();
                }
            }
        }
        if ctx.end_parent_now {
            match ctx.run_kind {
                RunKind::ListItem => self.pop_list(ctx),
                RunKind::Block => self.close_block(ctx),
            }
        }
        ctx.end_item_now = false;
        ctx.end_parent_now = false;
    }

    /// Opens a `Figure` with alternate text under the innermost open node.
    pub fn begin_figure(&mut self, ctx: &StructureContext, alt: &str) -> NodeId {
        let parent = ctx.current_node().unwrap_or(StructureTree::document());
        let node = self.tree.open(self.sink, "Figure", parent, self.page);
        self.tree.set_alt(node, alt);
        node
    }

    pub fn end_figure(&mut self) {
        self.sink.end_marked_content();
    }

    fn close_block(&mut self, ctx: &mut StructureContext) {
        if ctx.block.take().is_some() {
            self.sink.end_marked_content();
        }
    }

    fn pop_list(&mut self, ctx: &mut StructureContext) {
        if let Some(list) = ctx.lists.pop() {
            if list.item.is_some() {
                self.sink.end_marked_content();
            }
            self.sink.end_marked_content();
        }
    }

    /// Pops open lists until the top one is `list` or one of its ancestors,
    /// then opens `list` unless it is already on top.
    fn enter_list(&mut self, ctx: &mut StructureContext, elements: &ElementTree, list: ElementId) {
        while let Some(open) = ctx.lists.last().map(|top| top.root.element) {
            match open {
                Some(open) if open == list => return,
                Some(open) if elements.is_ancestor(open, list) => break,
                _ => self.pop_list(ctx),
            }
        }
        let parent = ctx.list_parent();
        let node = self.tree.open(self.sink, "L", parent, self.page);
        ctx.lists.push(OpenList {
            root: OpenTag {
                element: Some(list),
                node,
            },
            item: None,
        });
    }

    fn enter_item(&mut self, ctx: &mut StructureContext, elements: &ElementTree, item: ElementId) {
        let Some(list) = elements.parent(item) else {
            return;
        };
        self.enter_list(ctx, elements, list);
        let Some(top) = ctx.lists.last_mut() else {
            return;
        };
        if top.item.is_some_and(|open| open.element == Some(item)) {
            return;
        }
        if top.item.take().is_some() {
            self.sink.end_marked_content();
        }
        let node = self.tree.open(self.sink, "LI", top.root.node, self.page);
        top.item = Some(OpenTag {
            element: Some(item),
            node,
        });
    }

    /// Closes lists that do not contain `block`; with no block every list closes.
    fn leave_lists(&mut self, ctx: &mut StructureContext, elements: &ElementTree, block: Option<ElementId>) {
        while let Some(open) = ctx.lists.last().map(|top| top.root.element) {
            let contains = match (open, block) {
                (Some(list), Some(b)) => elements.is_ancestor(list, b),
                _ => false,
            };
            if contains {
                break;
            }
            self.pop_list(ctx);
        }
    }
}
