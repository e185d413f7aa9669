// Mutation hooks
// Every document mutation is described as a list of edits and offered to the
// hooks before anything changes. A single rejection cancels the whole mutation.

use std::fmt;

use super::document::Document;
use super::text_block::BlockKind;

/// The category of an edit, reported back when it is vetoed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    BlockStartInserted,
    BlockStartRemoved,
    BlockTypeChanged,
    BlockIndentChanged,
    TextInserted,
    TextRemoved,
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditKind::BlockStartInserted => "block split",
            EditKind::BlockStartRemoved => "block merge",
            EditKind::BlockTypeChanged => "block type change",
            EditKind::BlockIndentChanged => "indent change",
            EditKind::TextInserted => "text insertion",
            EditKind::TextRemoved => "text removal",
        };
        f.write_str(name)
    }
}

/// One primitive change, in the coordinates of the document as it was when the
/// mutation was planned
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// A new block starts at `offset` of `block`
    InsertBlockStart { block: usize, offset: usize },
    /// `block` is joined onto the block before it
    RemoveBlockStart { block: usize },
    ChangeBlockKind { block: usize, kind: BlockKind },
    ChangeIndent { block: usize, indent_level: u8 },
    InsertText { block: usize, offset: usize, text: String },
    RemoveText { block: usize, offset: usize, length: usize },
}

impl Edit {
    pub fn kind(&self) -> EditKind {
        match self {
            Edit::InsertBlockStart { .. } => EditKind::BlockStartInserted,
            Edit::RemoveBlockStart { .. } => EditKind::BlockStartRemoved,
            Edit::ChangeBlockKind { .. } => EditKind::BlockTypeChanged,
            Edit::ChangeIndent { .. } => EditKind::BlockIndentChanged,
            Edit::InsertText { .. } => EditKind::TextInserted,
            Edit::RemoveText { .. } => EditKind::TextRemoved,
        }
    }
}

/// Host callbacks that may accept (`true`) or reject (`false`) a change.
///
/// The document passed in has not been modified yet. Every method accepts by
/// default, so an implementation only overrides what it cares about.
pub trait MutationHooks {
    fn on_block_start_inserted(&mut self, _document: &Document, _block: usize, _offset: usize) -> bool {
        true
    }

    fn on_block_start_removed(&mut self, _document: &Document, _block: usize) -> bool {
        true
    }

    fn on_block_type_changed(&mut self, _document: &Document, _block: usize, _kind: BlockKind) -> bool {
        true
    }

    fn on_block_indent_changed(
        &mut self,
        _document: &Document,
        _block: usize,
        _indent_level: u8,
    ) -> bool {
        true
    }

    fn on_text_inserted(
        &mut self,
        _document: &Document,
        _block: usize,
        _offset: usize,
        _text: &str,
    ) -> bool {
        true
    }

    fn on_text_removed(
        &mut self,
        _document: &Document,
        _block: usize,
        _offset: usize,
        _length: usize,
    ) -> bool {
        true
    }
}

/// Hooks that never object
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl MutationHooks for AcceptAll {}

/// Dispatch `edit` to the matching hook
pub(crate) fn offer(hooks: &mut dyn MutationHooks, document: &Document, edit: &Edit) -> bool {
    match edit {
        Edit::InsertBlockStart { block, offset } => {
            hooks.on_block_start_inserted(document, *block, *offset)
        }
        Edit::RemoveBlockStart { block } => hooks.on_block_start_removed(document, *block),
        Edit::ChangeBlockKind { block, kind } => {
            hooks.on_block_type_changed(document, *block, *kind)
        }
        Edit::ChangeIndent {
            block,
            indent_level,
        } => hooks.on_block_indent_changed(document, *block, *indent_level),
        Edit::InsertText {
            block,
            offset,
            text,
        } => hooks.on_text_inserted(document, *block, *offset, text),
        Edit::RemoveText {
            block,
            offset,
            length,
        } => hooks.on_text_removed(document, *block, *offset, *length),
    }
}
