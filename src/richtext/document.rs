// Rich Text Document
// The never-empty sequence of blocks and every mutation that can be applied to it.
// Mutations are planned as edits, offered to the hooks, and only then applied.

use std::fmt;
use std::ops::RangeInclusive;

use tracing::debug;

use super::caret::CaretPosition;
use super::config::EditorConfig;
use super::error::{EditError, EditResult};
use super::font::FontSet;
use super::hooks::{AcceptAll, Edit, MutationHooks, offer};
use super::text_block::{BlockKind, LayoutContext, MAX_INDENT_LEVEL, TextBlock};
use super::text_span::TextSpan;

/// The editable document
pub struct Document {
    blocks: Vec<TextBlock>,
    fonts: Box<dyn FontSet>,
    wrap_width: f32,
    indent_width: f32,
    hooks: Box<dyn MutationHooks>,
}

impl Document {
    /// A document holding one empty paragraph
    pub fn new(fonts: impl FontSet + 'static) -> Self {
        Self::from_config(fonts, &EditorConfig::default())
    }

    pub fn from_config(fonts: impl FontSet + 'static, config: &EditorConfig) -> Self {
        Document {
            blocks: vec![TextBlock::paragraph()],
            fonts: Box::new(fonts),
            wrap_width: config.wrap_width,
            indent_width: config.indent_width,
            hooks: Box::new(AcceptAll),
        }
    }

    /// Replace the document's blocks; an empty list leaves one empty paragraph
    pub fn with_blocks(mut self, blocks: Vec<TextBlock>) -> Self {
        self.set_blocks(blocks);
        self
    }

    pub fn with_hooks(mut self, hooks: impl MutationHooks + 'static) -> Self {
        self.hooks = Box::new(hooks);
        self
    }

    pub fn set_hooks(&mut self, hooks: Box<dyn MutationHooks>) {
        self.hooks = hooks;
    }

    /// Swap in new content without consulting the hooks
    pub fn set_blocks(&mut self, blocks: Vec<TextBlock>) {
        self.blocks = blocks;
        if self.blocks.is_empty() {
            self.blocks.push(TextBlock::paragraph());
        }
        for block in &mut self.blocks {
            block.invalidate_layout();
        }
    }

    /// Reset to a single empty paragraph without consulting the hooks
    pub fn clear(&mut self) {
        self.set_blocks(Vec::new());
    }

    pub fn wrap_width(&self) -> f32 {
        self.wrap_width
    }

    /// Set the width text wraps at; every block rewraps lazily
    pub fn set_wrap_width(&mut self, wrap_width: f32) {
        if self.wrap_width != wrap_width {
            self.wrap_width = wrap_width;
            self.invalidate_layout();
        }
    }

    pub fn indent_width(&self) -> f32 {
        self.indent_width
    }

    pub fn set_indent_width(&mut self, indent_width: f32) {
        if self.indent_width != indent_width {
            self.indent_width = indent_width;
            self.invalidate_layout();
        }
    }

    pub fn set_fonts(&mut self, fonts: impl FontSet + 'static) {
        self.fonts = Box::new(fonts);
        self.invalidate_layout();
    }

    fn invalidate_layout(&mut self) {
        for block in &mut self.blocks {
            block.invalidate_layout();
        }
    }

    pub fn layout_context(&self) -> LayoutContext<'_> {
        LayoutContext {
            fonts: self.fonts.as_ref(),
            wrap_width: self.wrap_width,
            indent_width: self.indent_width,
        }
    }

    pub fn blocks(&self) -> &[TextBlock] {
        &self.blocks
    }

    pub fn block_count(&self) -> usize {
        assert!(!self.blocks.is_empty(), "document has no blocks");
        self.blocks.len()
    }

    pub fn last_block_index(&self) -> usize {
        self.block_count() - 1
    }

    pub fn clamp_block_index(&self, index: usize) -> usize {
        index.min(self.last_block_index())
    }

    /// The block at `index`, clamped to the last block
    pub fn block(&self, index: usize) -> &TextBlock {
        &self.blocks[self.clamp_block_index(index)]
    }

    /// Validate and clamp a position to document bounds
    pub fn clamp_position(&self, pos: CaretPosition) -> CaretPosition {
        let block = self.clamp_block_index(pos.block);
        let offset = self.blocks[block].clamp_offset(pos.offset);
        CaretPosition::new(block, offset)
    }

    pub fn start_position(&self) -> CaretPosition {
        CaretPosition::new(0, 0)
    }

    pub fn end_position(&self) -> CaretPosition {
        let last = self.last_block_index();
        CaretPosition::new(last, self.blocks[last].text_length())
    }

    /// Plain text of all blocks joined by newlines
    pub fn to_plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.simple_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Plain text in [start..end), blocks joined by newlines
    pub fn text_in_range(&self, start: CaretPosition, end: CaretPosition) -> String {
        let (a, b) = self.ordered(start, end);
        if a.block == b.block {
            return self.blocks[a.block].simple_text()[a.offset..b.offset].to_string();
        }

        let mut out = String::new();
        out.push_str(&self.blocks[a.block].simple_text()[a.offset..]);
        for block in &self.blocks[a.block + 1..b.block] {
            out.push('\n');
            out.push_str(block.simple_text());
        }
        out.push('\n');
        out.push_str(&self.blocks[b.block].simple_text()[..b.offset]);
        out
    }

    fn ordered(&self, start: CaretPosition, end: CaretPosition) -> (CaretPosition, CaretPosition) {
        let a = self.clamp_position(start);
        let b = self.clamp_position(end);
        if b < a { (b, a) } else { (a, b) }
    }

    // -- Mutation plumbing --

    /// Offer every edit to the hooks; nothing may be applied unless this succeeds
    fn approve(&mut self, edits: &[Edit]) -> EditResult {
        let mut hooks = std::mem::replace(&mut self.hooks, Box::new(AcceptAll));
        let rejected = edits
            .iter()
            .find(|edit| !offer(hooks.as_mut(), self, edit))
            .cloned();
        self.hooks = hooks;

        match rejected {
            Some(edit) => {
                debug!(?edit, "mutation vetoed");
                Err(EditError::Vetoed(edit.kind()))
            }
            None => Ok(()),
        }
    }

    fn plan_delete(&self, a: CaretPosition, b: CaretPosition) -> Vec<Edit> {
        let mut edits = Vec::new();
        if a.block == b.block {
            if a.offset < b.offset {
                edits.push(Edit::RemoveText {
                    block: a.block,
                    offset: a.offset,
                    length: b.offset - a.offset,
                });
            }
            return edits;
        }

        let head_len = self.blocks[a.block].text_length() - a.offset;
        if head_len > 0 {
            edits.push(Edit::RemoveText {
                block: a.block,
                offset: a.offset,
                length: head_len,
            });
        }
        for block in a.block + 1..b.block {
            let length = self.blocks[block].text_length();
            if length > 0 {
                edits.push(Edit::RemoveText {
                    block,
                    offset: 0,
                    length,
                });
            }
        }
        if b.offset > 0 {
            edits.push(Edit::RemoveText {
                block: b.block,
                offset: 0,
                length: b.offset,
            });
        }
        for block in a.block + 1..=b.block {
            edits.push(Edit::RemoveBlockStart { block });
        }
        edits
    }

    fn apply_delete(&mut self, a: CaretPosition, b: CaretPosition) {
        if a.block == b.block {
            self.blocks[a.block].remove_text(a.offset, b.offset - a.offset);
            return;
        }

        let tail = self.blocks[b.block].split_off(b.offset);
        self.blocks[a.block].remove_text(a.offset, usize::MAX);
        self.blocks.drain(a.block + 1..=b.block);
        self.blocks[a.block].append(tail);
        debug!(from = a.block, to = b.block, "merged blocks while deleting");
    }

    fn apply_split(&mut self, at: CaretPosition) -> CaretPosition {
        let block = &mut self.blocks[at.block];
        let (kind, indent_level) = if !block.is_empty() && block.kind().carries_over_on_split() {
            (block.kind(), block.indent_level())
        } else {
            (BlockKind::Paragraph, 0)
        };
        let right = block.split_off(at.offset);
        self.blocks
            .insert(at.block + 1, TextBlock::from_soup(kind, indent_level, right));
        debug!(block = at.block, offset = at.offset, %kind, "split block");
        CaretPosition::new(at.block + 1, 0)
    }

    // -- Mutations --

    /// Insert plain text; returns the position just after it
    pub fn insert_text(&mut self, pos: CaretPosition, text: &str) -> EditResult<CaretPosition> {
        let pos = self.clamp_position(pos);
        if text.is_empty() {
            return Ok(pos);
        }
        self.approve(&[Edit::InsertText {
            block: pos.block,
            offset: pos.offset,
            text: text.to_string(),
        }])?;
        self.blocks[pos.block].insert_text(pos.offset, text);
        Ok(CaretPosition::new(pos.block, pos.offset + text.len()))
    }

    /// Remove `length` bytes of one block's text
    pub fn remove_text(&mut self, block: usize, offset: usize, length: usize) -> EditResult {
        let start = self.clamp_position(CaretPosition::new(block, offset));
        let end = self.clamp_position(CaretPosition::new(
            start.block,
            start.offset.saturating_add(length),
        ));
        self.delete_range(start, end).map(|_| ())
    }

    /// Delete content in [start..end) across blocks.
    /// If the range spans multiple blocks, merges the tail of the end block into the start block
    /// and removes all blocks in between. Returns the join point.
    pub fn delete_range(
        &mut self,
        start: CaretPosition,
        end: CaretPosition,
    ) -> EditResult<CaretPosition> {
        let (a, b) = self.ordered(start, end);
        let edits = self.plan_delete(a, b);
        if edits.is_empty() {
            return Ok(a);
        }
        self.approve(&edits)?;
        self.apply_delete(a, b);
        Ok(a)
    }

    /// Replace [start..end) with plain text as one atomic mutation
    pub fn replace_range(
        &mut self,
        start: CaretPosition,
        end: CaretPosition,
        text: &str,
    ) -> EditResult<CaretPosition> {
        self.replace_range_with_paragraphs(start, end, &[text])
    }

    /// Replace [start..end) with one or more paragraphs as one atomic mutation.
    ///
    /// The first paragraph continues the block at `start`, every further one
    /// starts a new block. Returns the position after the last paragraph.
    pub fn replace_range_with_paragraphs(
        &mut self,
        start: CaretPosition,
        end: CaretPosition,
        paragraphs: &[&str],
    ) -> EditResult<CaretPosition> {
        let (a, b) = self.ordered(start, end);
        let mut edits = self.plan_delete(a, b);
        let mut cursor = a;
        for (i, text) in paragraphs.iter().enumerate() {
            if i > 0 {
                edits.push(Edit::InsertBlockStart {
                    block: cursor.block,
                    offset: cursor.offset,
                });
                cursor = CaretPosition::new(cursor.block + 1, 0);
            }
            if !text.is_empty() {
                edits.push(Edit::InsertText {
                    block: cursor.block,
                    offset: cursor.offset,
                    text: text.to_string(),
                });
                cursor.offset += text.len();
            }
        }
        if edits.is_empty() {
            return Ok(a);
        }
        self.approve(&edits)?;

        self.apply_delete(a, b);
        let mut cursor = a;
        for (i, text) in paragraphs.iter().enumerate() {
            if i > 0 {
                cursor = self.apply_split(cursor);
            }
            self.blocks[cursor.block].insert_text(cursor.offset, text);
            cursor.offset += text.len();
        }
        Ok(cursor)
    }

    /// Move the text after `pos` into a new block inserted after it.
    ///
    /// The new block keeps the kind and indent of a non-empty paragraph or list item;
    /// anything else continues as a plain paragraph. Returns the start of the new block.
    pub fn split_block(&mut self, pos: CaretPosition) -> EditResult<CaretPosition> {
        self.split_range(pos, pos)
    }

    /// Delete [start..end) and split at the join point, atomically
    pub fn split_range(
        &mut self,
        start: CaretPosition,
        end: CaretPosition,
    ) -> EditResult<CaretPosition> {
        let (a, b) = self.ordered(start, end);
        let mut edits = self.plan_delete(a, b);
        edits.push(Edit::InsertBlockStart {
            block: a.block,
            offset: a.offset,
        });
        self.approve(&edits)?;
        self.apply_delete(a, b);
        Ok(self.apply_split(a))
    }

    /// Join `block` onto the block before it; returns the join point.
    ///
    /// When both blocks are empty the block is simply dropped.
    pub fn merge_backward(&mut self, block: usize) -> EditResult<CaretPosition> {
        let block = self.clamp_block_index(block);
        if block == 0 {
            return Ok(self.start_position());
        }
        self.approve(&[Edit::RemoveBlockStart { block }])?;

        let prev_len = self.blocks[block - 1].text_length();
        let current = self.blocks.remove(block);
        if prev_len + current.text_length() > 0 {
            self.blocks[block - 1].append(current.into_content());
        }
        debug!(block, "merged block into previous");
        Ok(CaretPosition::new(block - 1, prev_len))
    }

    /// Join the block after `block` onto it; returns the end of `block` before the join
    pub fn merge_forward(&mut self, block: usize) -> EditResult<CaretPosition> {
        let block = self.clamp_block_index(block);
        let end = CaretPosition::new(block, self.blocks[block].text_length());
        if block == self.last_block_index() {
            return Ok(end);
        }
        self.merge_backward(block + 1)?;
        Ok(end)
    }

    /// Change the indent of every block in `blocks` by `delta`, clamped to `[0, 4]`
    pub fn change_indent(&mut self, blocks: RangeInclusive<usize>, delta: i32) -> EditResult {
        let edits: Vec<Edit> = self
            .block_range(blocks)
            .filter_map(|block| {
                let current = self.blocks[block].indent_level();
                let target = i32::from(current)
                    .saturating_add(delta)
                    .clamp(0, i32::from(MAX_INDENT_LEVEL)) as u8;
                (target != current).then_some(Edit::ChangeIndent {
                    block,
                    indent_level: target,
                })
            })
            .collect();
        self.apply_block_edits(edits)
    }

    pub fn set_indent_level(&mut self, block: usize, indent_level: u8) -> EditResult {
        let block = self.clamp_block_index(block);
        let indent_level = indent_level.min(MAX_INDENT_LEVEL);
        if self.blocks[block].indent_level() == indent_level {
            return Ok(());
        }
        self.apply_block_edits(vec![Edit::ChangeIndent {
            block,
            indent_level,
        }])
    }

    /// Re-type every block in `blocks`
    pub fn set_block_kinds(&mut self, blocks: RangeInclusive<usize>, kind: BlockKind) -> EditResult {
        let edits: Vec<Edit> = self
            .block_range(blocks)
            .filter(|&block| self.blocks[block].kind() != kind)
            .map(|block| Edit::ChangeBlockKind { block, kind })
            .collect();
        self.apply_block_edits(edits)
    }

    pub fn set_block_kind(&mut self, block: usize, kind: BlockKind) -> EditResult {
        let block = self.clamp_block_index(block);
        self.set_block_kinds(block..=block, kind)
    }

    fn block_range(&self, blocks: RangeInclusive<usize>) -> RangeInclusive<usize> {
        let start = self.clamp_block_index(*blocks.start());
        let end = self.clamp_block_index(*blocks.end());
        start.min(end)..=start.max(end)
    }

    fn apply_block_edits(&mut self, edits: Vec<Edit>) -> EditResult {
        if edits.is_empty() {
            return Ok(());
        }
        self.approve(&edits)?;
        for edit in edits {
            match edit {
                Edit::ChangeIndent {
                    block,
                    indent_level,
                } => self.blocks[block].set_indent_level(indent_level),
                Edit::ChangeBlockKind { block, kind } => self.blocks[block].set_kind(kind),
                _ => unreachable!("only block attribute edits are applied here"),
            }
        }
        Ok(())
    }

    /// Remove a whole block. The last remaining block is emptied instead.
    pub fn remove_block(&mut self, block: usize) -> EditResult {
        let block = self.clamp_block_index(block);
        let length = self.blocks[block].text_length();
        let mut edits = Vec::new();
        if length > 0 {
            edits.push(Edit::RemoveText {
                block,
                offset: 0,
                length,
            });
        }

        if self.blocks.len() == 1 {
            if edits.is_empty() {
                return Ok(());
            }
            self.approve(&edits)?;
            self.blocks[block].clear();
            return Ok(());
        }

        edits.push(Edit::RemoveBlockStart { block });
        self.approve(&edits)?;
        self.blocks.remove(block);
        Ok(())
    }

    // -- Geometry --

    /// Y of the top of `block` in document space
    pub fn block_top(&self, block: usize) -> f32 {
        let ctx = self.layout_context();
        let block = self.clamp_block_index(block);
        self.blocks[..block]
            .iter()
            .map(|b| b.total_height(&ctx))
            .sum()
    }

    pub fn total_height(&self) -> f32 {
        let ctx = self.layout_context();
        self.blocks.iter().map(|b| b.total_height(&ctx)).sum()
    }

    /// Pixel x and visual line of a position within its block
    pub fn offset_to_xy(&self, pos: CaretPosition) -> (f32, usize) {
        let pos = self.clamp_position(pos);
        self.blocks[pos.block].offset_to_xy(pos.offset, &self.layout_context())
    }

    pub fn xy_to_offset(&self, block: usize, x: f32, line: usize) -> usize {
        self.block(block)
            .xy_to_offset(x, line, &self.layout_context())
    }

    /// Top-left corner of the caret at `pos` in document space
    pub fn position_to_point(&self, pos: CaretPosition) -> (f32, f32) {
        let pos = self.clamp_position(pos);
        let (x, line) = self.offset_to_xy(pos);
        let line_height = self.blocks[pos.block].line_height(&self.layout_context());
        (x, self.block_top(pos.block) + line as f32 * line_height)
    }

    /// Block and visual line under document-space `y`, clamped to the content.
    /// The paragraph gap below a block belongs to its last line.
    pub fn line_at_y(&self, y: f32) -> (usize, usize) {
        let ctx = self.layout_context();
        let mut top = 0.0;
        for (index, block) in self.blocks.iter().enumerate() {
            let height = block.total_height(&ctx);
            if y < top + height || index == self.blocks.len() - 1 {
                let line = ((y - top) / block.line_height(&ctx)).max(0.0) as usize;
                return (index, line.min(block.line_count(&ctx) - 1));
            }
            top += height;
        }
        unreachable!("document has at least one block")
    }

    /// Position nearest to a document-space point
    pub fn hit_test(&self, x: f32, y: f32) -> CaretPosition {
        let (block, line) = self.line_at_y(y);
        CaretPosition::new(block, self.xy_to_offset(block, x, line))
    }

    /// The span drawn at a document-space point
    pub fn span_at(&self, x: f32, y: f32) -> Option<&TextSpan> {
        let ctx = self.layout_context();
        let (block, line) = self.line_at_y(y);
        let top = self.block_top(block);
        let line_height = self.blocks[block].line_height(&ctx);
        let line_top = top + line as f32 * line_height;
        if y < line_top || y >= line_top + line_height {
            return None;
        }
        self.blocks[block].span_at_point(x, line, &ctx)
    }

    /// The link span drawn at a document-space point, for the host to open
    pub fn link_at(&self, x: f32, y: f32) -> Option<&TextSpan> {
        self.span_at(x, y).filter(|span| span.is_link())
    }

    /// Marker drawn in front of a list item: a bullet, or the item's number
    pub fn list_marker(&self, block: usize) -> Option<String> {
        let block = self.clamp_block_index(block);
        let item = &self.blocks[block];
        match item.kind() {
            BlockKind::UnorderedListItem => Some("•".to_string()),
            BlockKind::OrderedListItem => {
                let mut number = 1;
                for prev in self.blocks[..block].iter().rev() {
                    if prev.kind().is_list_item() && prev.indent_level() > item.indent_level() {
                        continue;
                    }
                    if prev.kind() == BlockKind::OrderedListItem
                        && prev.indent_level() == item.indent_level()
                    {
                        number += 1;
                        continue;
                    }
                    break;
                }
                Some(format!("{number}."))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Document ({} blocks):", self.blocks.len())?;
        for (i, block) in self.blocks.iter().enumerate() {
            write!(f, "  [{}] {}", i, block.kind())?;
            if block.indent_level() > 0 {
                write!(f, " (indent {})", block.indent_level())?;
            }
            writeln!(f, ": {:?}", block.simple_text())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("blocks", &self.blocks)
            .field("wrap_width", &self.wrap_width)
            .field("indent_width", &self.indent_width)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::font::FixedWidthFonts;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn doc(texts: &[&str]) -> Document {
        Document::new(FixedWidthFonts::uniform(4.0, 10.0)).with_blocks(
            texts
                .iter()
                .map(|t| TextBlock::with_text(BlockKind::Paragraph, *t))
                .collect(),
        )
    }

    fn texts(doc: &Document) -> Vec<&str> {
        doc.blocks().iter().map(|b| b.simple_text()).collect()
    }

    /// Records every edit and rejects the ones matching `reject`
    struct Recorder {
        seen: Rc<RefCell<Vec<Edit>>>,
        reject: fn(&Edit) -> bool,
    }

    impl Recorder {
        fn record(&mut self, edit: Edit) -> bool {
            let ok = !(self.reject)(&edit);
            self.seen.borrow_mut().push(edit);
            ok
        }
    }

    impl MutationHooks for Recorder {
        fn on_block_start_inserted(&mut self, _: &Document, block: usize, offset: usize) -> bool {
            self.record(Edit::InsertBlockStart { block, offset })
        }
        fn on_block_start_removed(&mut self, _: &Document, block: usize) -> bool {
            self.record(Edit::RemoveBlockStart { block })
        }
        fn on_text_inserted(&mut self, _: &Document, block: usize, offset: usize, text: &str) -> bool {
            self.record(Edit::InsertText {
                block,
                offset,
                text: text.to_string(),
            })
        }
        fn on_text_removed(&mut self, _: &Document, block: usize, offset: usize, length: usize) -> bool {
            self.record(Edit::RemoveText {
                block,
                offset,
                length,
            })
        }
    }

    #[test]
    fn test_new_document_has_one_empty_paragraph() {
        let doc = Document::new(FixedWidthFonts::uniform(4.0, 10.0));
        assert_eq!(doc.block_count(), 1);
        assert_eq!(doc.blocks()[0].kind(), BlockKind::Paragraph);
        assert!(doc.blocks()[0].is_empty());

        let doc = doc.with_blocks(Vec::new());
        assert_eq!(doc.block_count(), 1);
    }

    #[test]
    fn test_position_clamping() {
        let doc = doc(&["hello", "héllo"]);
        assert_eq!(
            doc.clamp_position(CaretPosition::new(0, 100)),
            CaretPosition::new(0, 5)
        );
        assert_eq!(
            doc.clamp_position(CaretPosition::new(7, 1)),
            CaretPosition::new(1, 1)
        );
        // Inside the two-byte 'é' snaps back to its start
        assert_eq!(
            doc.clamp_position(CaretPosition::new(1, 2)),
            CaretPosition::new(1, 1)
        );
    }

    #[test]
    fn test_split_paragraph() {
        let mut doc = doc(&["Hello world"]);
        let pos = doc.split_block(CaretPosition::new(0, 5)).unwrap();
        assert_eq!(texts(&doc), vec!["Hello", " world"]);
        assert_eq!(pos, CaretPosition::new(1, 0));
    }

    #[test]
    fn test_split_inherits_only_from_body_blocks() {
        let mut doc = doc(&["Title", "item"]);
        doc.set_block_kind(0, BlockKind::Header).unwrap();
        doc.set_block_kind(1, BlockKind::UnorderedListItem).unwrap();
        doc.set_indent_level(1, 2).unwrap();

        doc.split_block(CaretPosition::new(1, 4)).unwrap();
        assert_eq!(doc.blocks()[2].kind(), BlockKind::UnorderedListItem);
        assert_eq!(doc.blocks()[2].indent_level(), 2);

        doc.split_block(CaretPosition::new(0, 5)).unwrap();
        assert_eq!(doc.blocks()[1].kind(), BlockKind::Paragraph);
        assert_eq!(doc.blocks()[1].indent_level(), 0);
    }

    #[test]
    fn test_split_then_merge_restores_block() {
        for kind in [BlockKind::Header, BlockKind::Paragraph, BlockKind::OrderedListItem] {
            for offset in 0..=5 {
                let mut doc = doc(&["abcde"]);
                doc.set_block_kind(0, kind).unwrap();
                let pos = doc.split_block(CaretPosition::new(0, offset)).unwrap();
                let joined = doc.merge_backward(pos.block).unwrap();
                assert_eq!(joined, CaretPosition::new(0, offset));
                assert_eq!(texts(&doc), vec!["abcde"]);
                assert_eq!(doc.blocks()[0].kind(), kind);
            }
        }
    }

    #[test]
    fn test_merge_backward_of_empty_blocks() {
        let mut doc = doc(&["", ""]);
        let pos = doc.merge_backward(1).unwrap();
        assert_eq!(doc.block_count(), 1);
        assert_eq!(pos, CaretPosition::new(0, 0));

        // First block cannot merge backward
        assert_eq!(doc.merge_backward(0).unwrap(), CaretPosition::new(0, 0));
        assert_eq!(doc.block_count(), 1);
    }

    #[test]
    fn test_merge_forward() {
        let mut doc = doc(&["ab", "cd"]);
        let pos = doc.merge_forward(0).unwrap();
        assert_eq!(texts(&doc), vec!["abcd"]);
        assert_eq!(pos, CaretPosition::new(0, 2));
        assert_eq!(doc.merge_forward(0).unwrap(), CaretPosition::new(0, 4));
    }

    #[test]
    fn test_delete_range_across_blocks_merges() {
        let mut doc = doc(&["First para", "Second", "Third para"]);
        let pos = doc
            .delete_range(CaretPosition::new(2, 2), CaretPosition::new(0, 3))
            .unwrap();
        assert_eq!(texts(&doc), vec!["Firird para"]);
        assert_eq!(pos, CaretPosition::new(0, 3));
    }

    #[test]
    fn test_replace_range() {
        let mut doc = doc(&["AB"]);
        let pos = doc
            .replace_range(CaretPosition::new(0, 0), CaretPosition::new(0, 2), "X")
            .unwrap();
        assert_eq!(texts(&doc), vec!["X"]);
        assert_eq!(pos, CaretPosition::new(0, 1));
    }

    #[test]
    fn test_replace_with_paragraphs() {
        let mut doc = doc(&["head tail"]);
        let pos = doc
            .replace_range_with_paragraphs(
                CaretPosition::new(0, 4),
                CaretPosition::new(0, 5),
                &["-one", "two", "three-"],
            )
            .unwrap();
        assert_eq!(texts(&doc), vec!["head-one", "two", "three-tail"]);
        assert_eq!(pos, CaretPosition::new(2, 6));
    }

    #[test]
    fn test_indent_is_clamped_and_type_changes() {
        let mut doc = doc(&["a", "b"]);
        doc.change_indent(0..=1, 9).unwrap();
        assert!(doc.blocks().iter().all(|b| b.indent_level() == 4));
        doc.change_indent(1..=0, -1).unwrap();
        assert!(doc.blocks().iter().all(|b| b.indent_level() == 3));
        doc.change_indent(0..=0, -10).unwrap();
        assert_eq!(doc.blocks()[0].indent_level(), 0);

        doc.set_block_kinds(0..=5, BlockKind::SubHeader).unwrap();
        assert!(doc.blocks().iter().all(|b| b.kind() == BlockKind::SubHeader));
    }

    #[test]
    fn test_extreme_indent_deltas_saturate() {
        let mut doc = doc(&["a"]);
        doc.set_indent_level(0, 1).unwrap();
        doc.change_indent(0..=0, i32::MAX).unwrap();
        assert_eq!(doc.blocks()[0].indent_level(), 4);
        doc.change_indent(0..=0, i32::MIN).unwrap();
        assert_eq!(doc.blocks()[0].indent_level(), 0);
    }

    #[test]
    fn test_remove_last_block_clears_it() {
        let mut doc = doc(&["only"]);
        doc.remove_block(0).unwrap();
        assert_eq!(doc.block_count(), 1);
        assert!(doc.blocks()[0].is_empty());

        let mut doc = self::doc(&["a", "b"]);
        doc.remove_block(0).unwrap();
        assert_eq!(texts(&doc), vec!["b"]);
    }

    #[test]
    fn test_hooks_see_planned_edits() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut doc = doc(&["one", "two", "three"]).with_hooks(Recorder {
            seen: seen.clone(),
            reject: |_| false,
        });

        doc.replace_range(CaretPosition::new(0, 1), CaretPosition::new(2, 2), "X")
            .unwrap();
        assert_eq!(texts(&doc), vec!["oXree"]);
        assert_eq!(
            *seen.borrow(),
            vec![
                Edit::RemoveText { block: 0, offset: 1, length: 2 },
                Edit::RemoveText { block: 1, offset: 0, length: 3 },
                Edit::RemoveText { block: 2, offset: 0, length: 2 },
                Edit::RemoveBlockStart { block: 1 },
                Edit::RemoveBlockStart { block: 2 },
                Edit::InsertText { block: 0, offset: 1, text: "X".to_string() },
            ]
        );
    }

    #[test]
    fn test_veto_leaves_document_untouched() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut doc = doc(&["one", "two"]).with_hooks(Recorder {
            seen: seen.clone(),
            reject: |edit| matches!(edit, Edit::InsertText { .. }),
        });

        let err = doc
            .replace_range(CaretPosition::new(0, 1), CaretPosition::new(1, 1), "X")
            .unwrap_err();
        assert_eq!(err, EditError::Vetoed(crate::richtext::hooks::EditKind::TextInserted));
        assert_eq!(texts(&doc), vec!["one", "two"]);

        // Edits that are not rejected still go through
        doc.split_block(CaretPosition::new(0, 1)).unwrap();
        assert_eq!(texts(&doc), vec!["o", "ne", "two"]);
    }

    #[test]
    fn test_insert_then_remove_restores() {
        let mut doc = doc(&["hello"]);
        let end = doc.insert_text(CaretPosition::new(0, 2), "XYZ").unwrap();
        assert_eq!(end, CaretPosition::new(0, 5));
        doc.remove_text(0, 2, 3).unwrap();
        assert_eq!(texts(&doc), vec!["hello"]);
    }

    #[test]
    fn test_geometry() {
        let mut doc = doc(&["Hello world foo", "x"]);
        doc.set_wrap_width(40.0);
        // 2 lines + half-line gap
        assert_eq!(doc.block_top(1), 25.0);
        assert_eq!(doc.total_height(), 40.0);
        assert_eq!(doc.position_to_point(CaretPosition::new(0, 8)), (8.0, 10.0));
        assert_eq!(doc.position_to_point(CaretPosition::new(1, 1)), (4.0, 25.0));

        assert_eq!(doc.hit_test(9.0, 12.0), CaretPosition::new(0, 8));
        // The gap under a block belongs to its last line
        assert_eq!(doc.hit_test(0.0, 22.0), CaretPosition::new(0, 6));
        assert_eq!(doc.hit_test(100.0, 26.0), CaretPosition::new(1, 1));
        assert_eq!(doc.hit_test(-5.0, 500.0), CaretPosition::new(1, 0));
        assert_eq!(doc.hit_test(3.0, -5.0), CaretPosition::new(0, 1));

        // Rewrap on width change
        doc.set_wrap_width(400.0);
        assert_eq!(doc.block_top(1), 15.0);
    }

    #[test]
    fn test_link_at() {
        let mut doc = doc(&["x"]);
        doc.set_blocks(vec![TextBlock::from_soup(
            BlockKind::Paragraph,
            0,
            crate::richtext::text_soup::TextSoup::from_spans([
                TextSpan::plain("go "),
                TextSpan::link("home", "doc://home"),
            ]),
        )]);
        assert_eq!(
            doc.link_at(14.0, 5.0).and_then(|s| s.link_target()),
            Some("doc://home")
        );
        assert!(doc.link_at(2.0, 5.0).is_none());
        // Inside the paragraph gap, not on a line
        assert!(doc.link_at(14.0, 12.0).is_none());
    }

    #[test]
    fn test_list_markers() {
        let mut doc = doc(&["a", "b", "nested", "c", "para", "d"]);
        for i in [0, 1, 3, 5] {
            doc.set_block_kind(i, BlockKind::OrderedListItem).unwrap();
        }
        doc.set_block_kind(2, BlockKind::UnorderedListItem).unwrap();
        doc.set_indent_level(2, 1).unwrap();

        assert_eq!(doc.list_marker(0).as_deref(), Some("1."));
        assert_eq!(doc.list_marker(1).as_deref(), Some("2."));
        assert_eq!(doc.list_marker(2).as_deref(), Some("•"));
        assert_eq!(doc.list_marker(3).as_deref(), Some("3."));
        assert_eq!(doc.list_marker(4), None);
        assert_eq!(doc.list_marker(5).as_deref(), Some("1."));
    }

    #[test]
    fn test_text_in_range() {
        let doc = doc(&["one", "two", "three"]);
        assert_eq!(
            doc.text_in_range(CaretPosition::new(2, 3), CaretPosition::new(0, 1)),
            "ne\ntwo\nthr"
        );
        assert_eq!(
            doc.text_in_range(CaretPosition::new(1, 0), CaretPosition::new(1, 2)),
            "tw"
        );
    }
}
