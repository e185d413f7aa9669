// Rich Text Editor
// Glue between host input, the local caret and the document.
// Navigation moves the caret; editing turns the caret's selection into document mutations.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::caret::{CaretPosition, RichTextCaret, Selection};
use super::clipboard::{Clipboard, normalize_newlines};
use super::config::EditorConfig;
use super::document::Document;
use super::error::{EditError, EditResult};
use super::font::FontSet;
use super::geometry::{Rect, caret_rect, selection_rects};
use super::remote::RemoteCarets;
use super::text_block::BlockKind;
use super::text_span::TextSpan;

type CaretMovedCallback = Box<dyn FnMut(&Selection)>;

/// A document with one local caret and any number of remote carets
pub struct RichTextEditor {
    document: Document,
    caret: RichTextCaret,
    remotes: RemoteCarets,
    read_only: bool,
    on_caret_moved: Option<CaretMovedCallback>,
}

impl RichTextEditor {
    /// Create an editor over an empty document
    pub fn new(fonts: impl FontSet + 'static, config: &EditorConfig) -> Self {
        Self::with_document(Document::from_config(fonts, config), config)
    }

    /// Create an editor with an existing document
    pub fn with_document(document: Document, config: &EditorConfig) -> Self {
        RichTextEditor {
            document,
            caret: RichTextCaret::local(config, Utc::now()),
            remotes: RemoteCarets::new(config),
            read_only: config.read_only,
            on_caret_moved: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Direct document access; the carets are re-clamped on their next read
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Called after every caret movement or selection change
    pub fn set_on_caret_moved(&mut self, callback: impl FnMut(&Selection) + 'static) {
        self.on_caret_moved = Some(Box::new(callback));
    }

    pub fn caret(&self) -> &RichTextCaret {
        &self.caret
    }

    /// The local selection, clamped to the document
    pub fn selection(&self) -> Selection {
        self.caret.selection().clamped(&self.document)
    }

    pub fn cursor(&self) -> CaretPosition {
        self.selection().end()
    }

    pub fn remotes(&self) -> &RemoteCarets {
        &self.remotes
    }

    pub fn remotes_mut(&mut self) -> &mut RemoteCarets {
        &mut self.remotes
    }

    /// Replace the local selection
    pub fn set_selection(&mut self, selection: Selection) {
        let selection = selection.clamped(&self.document);
        self.caret.set_selection(selection, Utc::now());
        if let Some(callback) = self.on_caret_moved.as_mut() {
            callback(&selection);
        }
    }

    pub fn set_cursor(&mut self, pos: CaretPosition) {
        self.set_selection(Selection::collapsed(pos));
    }

    fn navigate(&mut self, f: impl FnOnce(&Selection, &Document) -> Selection) {
        let selection = f(&self.selection(), &self.document);
        self.set_selection(selection);
    }

    // -- Navigation --

    pub fn move_left(&mut self, extend: bool, by_word: bool) {
        self.navigate(|sel, doc| sel.move_left(doc, extend, by_word));
    }

    pub fn move_right(&mut self, extend: bool, by_word: bool) {
        self.navigate(|sel, doc| sel.move_right(doc, extend, by_word));
    }

    pub fn move_up(&mut self, extend: bool) {
        self.navigate(|sel, doc| sel.move_up(doc, extend));
    }

    pub fn move_down(&mut self, extend: bool) {
        self.navigate(|sel, doc| sel.move_down(doc, extend));
    }

    pub fn move_home(&mut self, extend: bool) {
        self.navigate(|sel, doc| sel.move_home(doc, extend));
    }

    pub fn move_end(&mut self, extend: bool) {
        self.navigate(|sel, doc| sel.move_end(doc, extend));
    }

    pub fn move_page_up(&mut self, extend: bool, page_height: f32) {
        self.navigate(|sel, doc| sel.move_page_up(doc, extend, page_height));
    }

    pub fn move_page_down(&mut self, extend: bool, page_height: f32) {
        self.navigate(|sel, doc| sel.move_page_down(doc, extend, page_height));
    }

    pub fn move_document_start(&mut self, extend: bool) {
        self.navigate(|sel, doc| sel.move_document_start(doc, extend));
    }

    pub fn move_document_end(&mut self, extend: bool) {
        self.navigate(|sel, doc| sel.move_document_end(doc, extend));
    }

    pub fn select_all(&mut self) {
        self.navigate(|_, doc| Selection::select_all(doc));
    }

    /// Select the word under a document-space point (double click)
    pub fn select_word_at(&mut self, x: f32, y: f32) {
        self.navigate(|_, doc| Selection::select_word_at(doc, doc.hit_test(x, y)));
    }

    /// Select the block under a document-space point (triple click)
    pub fn select_block_at(&mut self, x: f32, y: f32) {
        self.navigate(|_, doc| Selection::select_block_at(doc, doc.hit_test(x, y).block));
    }

    /// Place the caret at a document-space point, or extend the selection to it
    pub fn click(&mut self, x: f32, y: f32, extend: bool) {
        self.navigate(|sel, doc| {
            let pos = doc.hit_test(x, y);
            if extend {
                sel.extend(pos)
            } else {
                Selection::collapsed(pos)
            }
        });
    }

    /// The link under a document-space point, for the host to open
    pub fn link_at(&self, x: f32, y: f32) -> Option<&TextSpan> {
        self.document.link_at(x, y)
    }

    // -- Editing --

    fn check_writable(&self) -> EditResult {
        if self.read_only {
            Err(EditError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// Collapse the caret at `pos` after a successful edit
    fn edited(&mut self, pos: CaretPosition) {
        self.remotes.clamp_all(&self.document);
        self.set_cursor(pos);
    }

    /// Type text at the caret, replacing the selection
    pub fn insert_text(&mut self, text: &str) -> EditResult {
        self.check_writable()?;
        let (a, b) = self.selection().ordered();
        let text = normalize_newlines(text);
        let pos = self.document.replace_range(a, b, &text)?;
        self.edited(pos);
        Ok(())
    }

    /// Insert a line break that stays inside the current block
    pub fn insert_line_break(&mut self) -> EditResult {
        self.insert_text("\n")
    }

    /// Split the block at the caret.
    ///
    /// Enter in an empty list item ends the list instead: the item becomes a paragraph.
    pub fn enter(&mut self) -> EditResult {
        self.check_writable()?;
        let selection = self.selection();
        let (a, b) = selection.ordered();
        let block = self.document.block(a.block);
        if !selection.has_selection() && block.kind().is_list_item() && block.is_empty() {
            debug!(block = a.block, "leaving list on empty item");
            self.document.set_block_kind(a.block, BlockKind::Paragraph)?;
            self.edited(a);
            return Ok(());
        }

        let pos = self.document.split_range(a, b)?;
        self.edited(pos);
        Ok(())
    }

    /// Delete the selection, or the grapheme before the caret.
    /// At the start of a block the block is merged into the previous one.
    pub fn backspace(&mut self) -> EditResult {
        self.check_writable()?;
        let selection = self.selection();
        if selection.has_selection() {
            return self.delete_selection();
        }

        let pos = selection.end();
        let pos = if pos.offset == 0 {
            self.document.merge_backward(pos.block)?
        } else {
            let prev = selection.move_left(&self.document, true, false).end();
            self.document.delete_range(prev, pos)?
        };
        self.edited(pos);
        Ok(())
    }

    /// Delete the selection, or the grapheme after the caret.
    /// At the end of a block the next block is merged into this one.
    pub fn delete_forward(&mut self) -> EditResult {
        self.check_writable()?;
        let selection = self.selection();
        if selection.has_selection() {
            return self.delete_selection();
        }

        let pos = selection.end();
        let pos = if pos.offset == self.document.block(pos.block).text_length() {
            self.document.merge_forward(pos.block)?
        } else {
            let next = selection.move_right(&self.document, true, false).end();
            self.document.delete_range(pos, next)?
        };
        self.edited(pos);
        Ok(())
    }

    pub fn delete_word_backward(&mut self) -> EditResult {
        self.check_writable()?;
        let selection = self.selection();
        let target = if selection.has_selection() {
            selection
        } else {
            selection.move_left(&self.document, true, true)
        };
        let (a, b) = target.ordered();
        let pos = self.document.delete_range(a, b)?;
        self.edited(pos);
        Ok(())
    }

    pub fn delete_word_forward(&mut self) -> EditResult {
        self.check_writable()?;
        let selection = self.selection();
        let target = if selection.has_selection() {
            selection
        } else {
            selection.move_right(&self.document, true, true)
        };
        let (a, b) = target.ordered();
        let pos = self.document.delete_range(a, b)?;
        self.edited(pos);
        Ok(())
    }

    /// Delete the selected content, merging blocks it spans
    pub fn delete_selection(&mut self) -> EditResult {
        self.check_writable()?;
        let (a, b) = self.selection().ordered();
        let pos = self.document.delete_range(a, b)?;
        self.edited(pos);
        Ok(())
    }

    fn selected_blocks(&self) -> std::ops::RangeInclusive<usize> {
        let (a, b) = self.selection().ordered();
        a.block..=b.block
    }

    /// Indent every block touched by the selection
    pub fn indent(&mut self) -> EditResult {
        self.check_writable()?;
        self.document.change_indent(self.selected_blocks(), 1)
    }

    pub fn outdent(&mut self) -> EditResult {
        self.check_writable()?;
        self.document.change_indent(self.selected_blocks(), -1)
    }

    /// Re-type every block touched by the selection
    pub fn set_block_kind(&mut self, kind: BlockKind) -> EditResult {
        self.check_writable()?;
        self.document.set_block_kinds(self.selected_blocks(), kind)
    }

    // -- Clipboard --

    /// Plain text of the selection, blocks separated by newlines
    pub fn selected_text(&self) -> String {
        let (a, b) = self.selection().ordered();
        self.document.text_in_range(a, b)
    }

    /// Copy the selection; returns false when nothing is selected
    pub fn copy(&self, clipboard: &mut dyn Clipboard) -> bool {
        if !self.selection().has_selection() {
            return false;
        }
        clipboard.set_text(&self.selected_text());
        true
    }

    pub fn cut(&mut self, clipboard: &mut dyn Clipboard) -> EditResult {
        self.check_writable()?;
        if self.copy(clipboard) {
            self.delete_selection()?;
        }
        Ok(())
    }

    /// Paste plain text over the selection.
    /// Paragraphs separated by a blank line become separate blocks.
    pub fn paste(&mut self, clipboard: &mut dyn Clipboard) -> EditResult {
        self.check_writable()?;
        let Some(text) = clipboard.get_text() else {
            return Ok(());
        };
        let text = normalize_newlines(&text);
        if text.is_empty() {
            return Ok(());
        }

        let paragraphs: Vec<&str> = text.split("\n\n").collect();
        let (a, b) = self.selection().ordered();
        let pos = self
            .document
            .replace_range_with_paragraphs(a, b, &paragraphs)?;
        self.edited(pos);
        Ok(())
    }

    // -- Presentation --

    pub fn caret_rect(&self) -> Rect {
        caret_rect(&self.document, self.cursor())
    }

    pub fn selection_rects(&self) -> Vec<Rect> {
        selection_rects(&self.document, &self.selection())
    }

    pub fn caret_opacity(&self, now: DateTime<Utc>) -> f32 {
        self.caret.opacity(now)
    }
}

impl fmt::Debug for RichTextEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RichTextEditor")
            .field("document", &self.document)
            .field("caret", &self.caret)
            .field("remotes", &self.remotes.len())
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}
