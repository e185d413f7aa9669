// Caret and Selection
// Positional math shared by the local caret and every remote caret.
// Navigation never mutates: each move returns a new selection.

use chrono::{DateTime, TimeDelta, Utc};
use unicode_segmentation::UnicodeSegmentation;

use super::config::EditorConfig;
use super::document::Document;

/// A block index plus a byte offset into that block's text.
/// Ordered by block first, then offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CaretPosition {
    pub block: usize,
    pub offset: usize,
}

impl CaretPosition {
    pub fn new(block: usize, offset: usize) -> Self {
        CaretPosition { block, offset }
    }
}

/// Anchor (`start`) and active end (`end`) of a caret.
///
/// Equal ends mean a plain caret without a selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct Selection {
    start: CaretPosition,
    end: CaretPosition,
    /// Column kept while moving vertically
    preferred_x: Option<f32>,
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl Eq for Selection {}

impl From<CaretPosition> for Selection {
    fn from(pos: CaretPosition) -> Self {
        Selection::collapsed(pos)
    }
}

impl Selection {
    pub fn new(start: CaretPosition, end: CaretPosition) -> Self {
        Selection {
            start,
            end,
            preferred_x: None,
        }
    }

    pub fn collapsed(pos: CaretPosition) -> Self {
        Self::new(pos, pos)
    }

    /// The anchor
    pub fn start(&self) -> CaretPosition {
        self.start
    }

    /// The end the user is moving
    pub fn end(&self) -> CaretPosition {
        self.end
    }

    /// Move the anchor; the selection collapses onto it
    pub fn set_start(&mut self, pos: CaretPosition) {
        self.start = pos;
        self.end = pos;
        self.preferred_x = None;
    }

    /// Move the active end, keeping the anchor
    pub fn set_end(&mut self, pos: CaretPosition) {
        self.end = pos;
        self.preferred_x = None;
    }

    pub fn has_selection(&self) -> bool {
        self.start != self.end
    }

    pub fn has_forward_selection(&self) -> bool {
        self.end > self.start
    }

    pub fn has_backward_selection(&self) -> bool {
        self.end < self.start
    }

    /// Both ends in document order
    pub fn ordered(&self) -> (CaretPosition, CaretPosition) {
        if self.has_backward_selection() {
            (self.end, self.start)
        } else {
            (self.start, self.end)
        }
    }

    /// Both ends clamped into `doc`
    #[must_use]
    pub fn clamped(&self, doc: &Document) -> Self {
        Selection {
            start: doc.clamp_position(self.start),
            end: doc.clamp_position(self.end),
            preferred_x: self.preferred_x,
        }
    }

    /// A caret at the active end
    #[must_use]
    pub fn collapse(&self) -> Self {
        Self::collapsed(self.end)
    }

    /// Keep the anchor and move the active end to `end`
    #[must_use]
    pub fn extend(&self, end: CaretPosition) -> Self {
        Self::new(self.start, end)
    }

    fn maybe_extend(&self, end: CaretPosition, extend: bool) -> Self {
        if extend {
            self.extend(end)
        } else {
            Self::collapsed(end)
        }
    }

    /// One grapheme (or word) left, crossing into the previous block at offset 0.
    ///
    /// Without `extend` an existing selection collapses to its first edge instead.
    #[must_use]
    pub fn move_left(&self, doc: &Document, extend: bool, by_word: bool) -> Self {
        let sel = self.clamped(doc);
        if sel.has_selection() && !extend {
            return Self::collapsed(sel.ordered().0);
        }
        sel.maybe_extend(previous_position(doc, sel.end, by_word), extend)
    }

    /// One grapheme (or word) right, crossing into the next block at the block end.
    ///
    /// Without `extend` an existing selection collapses to its last edge instead.
    #[must_use]
    pub fn move_right(&self, doc: &Document, extend: bool, by_word: bool) -> Self {
        let sel = self.clamped(doc);
        if sel.has_selection() && !extend {
            return Self::collapsed(sel.ordered().1);
        }
        sel.maybe_extend(next_position(doc, sel.end, by_word), extend)
    }

    /// One wrapped line up, keeping the horizontal position
    #[must_use]
    pub fn move_up(&self, doc: &Document, extend: bool) -> Self {
        self.move_lines(doc, -1, extend)
    }

    /// One wrapped line down, keeping the horizontal position
    #[must_use]
    pub fn move_down(&self, doc: &Document, extend: bool) -> Self {
        self.move_lines(doc, 1, extend)
    }

    fn move_lines(&self, doc: &Document, delta: isize, extend: bool) -> Self {
        let sel = self.clamped(doc);
        let ctx = doc.layout_context();
        let (x, line) = doc.offset_to_xy(sel.end);
        let x = sel.preferred_x.unwrap_or(x);
        let block = sel.end.block;

        let target = if delta < 0 {
            if line > 0 {
                Some((block, line - 1))
            } else if block > 0 {
                Some((block - 1, doc.blocks()[block - 1].line_count(&ctx) - 1))
            } else {
                None
            }
        } else if line + 1 < doc.blocks()[block].line_count(&ctx) {
            Some((block, line + 1))
        } else if block < doc.last_block_index() {
            Some((block + 1, 0))
        } else {
            None
        };

        // Past the first or last line the caret goes to the document edge
        let end = match target {
            Some((block, line)) => CaretPosition::new(block, doc.xy_to_offset(block, x, line)),
            None if delta < 0 => doc.start_position(),
            None => doc.end_position(),
        };
        let mut moved = sel.maybe_extend(end, extend);
        moved.preferred_x = Some(x);
        moved
    }

    /// Start of the current visual line
    #[must_use]
    pub fn move_home(&self, doc: &Document, extend: bool) -> Self {
        let sel = self.clamped(doc);
        let ctx = doc.layout_context();
        let block = doc.block(sel.end.block);
        let line = block.line(block.line_of_offset(sel.end.offset, &ctx), &ctx);
        sel.maybe_extend(CaretPosition::new(sel.end.block, line.start), extend)
    }

    /// End of the current visual line
    #[must_use]
    pub fn move_end(&self, doc: &Document, extend: bool) -> Self {
        let sel = self.clamped(doc);
        let ctx = doc.layout_context();
        let block = doc.block(sel.end.block);
        let line = block.line(block.line_of_offset(sel.end.offset, &ctx), &ctx);
        sel.maybe_extend(CaretPosition::new(sel.end.block, line.end()), extend)
    }

    /// Up by `page_height` pixels, keeping the horizontal position
    #[must_use]
    pub fn move_page_up(&self, doc: &Document, extend: bool, page_height: f32) -> Self {
        self.move_pixels(doc, -page_height, extend)
    }

    /// Down by `page_height` pixels, keeping the horizontal position
    #[must_use]
    pub fn move_page_down(&self, doc: &Document, extend: bool, page_height: f32) -> Self {
        self.move_pixels(doc, page_height, extend)
    }

    fn move_pixels(&self, doc: &Document, dy: f32, extend: bool) -> Self {
        let sel = self.clamped(doc);
        let (x, y) = doc.position_to_point(sel.end);
        let x = sel.preferred_x.unwrap_or(x);
        let y = y + dy;

        let end = if y < 0.0 {
            doc.start_position()
        } else if y >= doc.total_height() {
            doc.end_position()
        } else {
            doc.hit_test(x, y)
        };
        let mut moved = sel.maybe_extend(end, extend);
        moved.preferred_x = Some(x);
        moved
    }

    #[must_use]
    pub fn move_document_start(&self, doc: &Document, extend: bool) -> Self {
        self.clamped(doc).maybe_extend(doc.start_position(), extend)
    }

    #[must_use]
    pub fn move_document_end(&self, doc: &Document, extend: bool) -> Self {
        self.clamped(doc).maybe_extend(doc.end_position(), extend)
    }

    pub fn select_all(doc: &Document) -> Self {
        Self::new(doc.start_position(), doc.end_position())
    }

    /// The run of word (or whitespace) characters around `pos`
    pub fn select_word_at(doc: &Document, pos: CaretPosition) -> Self {
        let pos = doc.clamp_position(pos);
        let text = doc.block(pos.block).simple_text();

        let on_space = match text[pos.offset..].chars().next() {
            Some(c) => c.is_whitespace(),
            None => text[..pos.offset]
                .chars()
                .next_back()
                .is_some_and(char::is_whitespace),
        };
        let same_class = |c: char| c.is_whitespace() == on_space;

        let start = text[..pos.offset]
            .char_indices()
            .rev()
            .take_while(|&(_, c)| same_class(c))
            .last()
            .map_or(pos.offset, |(i, _)| i);
        let end = text[pos.offset..]
            .char_indices()
            .find(|&(_, c)| !same_class(c))
            .map_or(text.len(), |(i, _)| pos.offset + i);

        Self::new(
            CaretPosition::new(pos.block, start),
            CaretPosition::new(pos.block, end),
        )
    }

    /// The whole of `block`
    pub fn select_block_at(doc: &Document, block: usize) -> Self {
        let block = doc.clamp_block_index(block);
        Self::new(
            CaretPosition::new(block, 0),
            CaretPosition::new(block, doc.blocks()[block].text_length()),
        )
    }
}

fn previous_position(doc: &Document, pos: CaretPosition, by_word: bool) -> CaretPosition {
    if pos.offset == 0 {
        if pos.block == 0 {
            return pos;
        }
        let block = pos.block - 1;
        return CaretPosition::new(block, doc.blocks()[block].text_length());
    }

    let text = doc.blocks()[pos.block].simple_text();
    let offset = if by_word {
        previous_word_start(text, pos.offset)
    } else {
        text[..pos.offset]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(i, _)| i)
    };
    CaretPosition::new(pos.block, offset)
}

fn next_position(doc: &Document, pos: CaretPosition, by_word: bool) -> CaretPosition {
    let text = doc.blocks()[pos.block].simple_text();
    if pos.offset >= text.len() {
        if pos.block == doc.last_block_index() {
            return pos;
        }
        return CaretPosition::new(pos.block + 1, 0);
    }

    let offset = if by_word {
        next_word_end(text, pos.offset)
    } else {
        text[pos.offset..]
            .graphemes(true)
            .next()
            .map_or(text.len(), |g| pos.offset + g.len())
    };
    CaretPosition::new(pos.block, offset)
}

/// Skip whitespace backwards, then the word before it
pub(crate) fn previous_word_start(text: &str, offset: usize) -> usize {
    let head = &text[..offset];
    let trimmed = head.trim_end();
    trimmed
        .char_indices()
        .rev()
        .find(|&(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8())
}

/// Skip whitespace forwards, then the word after it
pub(crate) fn next_word_end(text: &str, offset: usize) -> usize {
    let tail = &text[offset..];
    let skipped = tail.len() - tail.trim_start().len();
    tail[skipped..]
        .char_indices()
        .find(|&(_, c)| c.is_whitespace())
        .map_or(text.len(), |(i, _)| offset + skipped + i)
}

/// How a caret is drawn
#[derive(Debug, Clone, PartialEq)]
pub enum CaretStyle {
    /// The local caret: on for the first half of every period
    Blinking {
        epoch: DateTime<Utc>,
        period: TimeDelta,
    },
    /// A collaborator's caret: opaque for `fade_delay` after activity, then
    /// fading out over `fade_duration`
    Labeled {
        label: String,
        color: u32,
        last_activity: DateTime<Utc>,
        fade_delay: TimeDelta,
        fade_duration: TimeDelta,
    },
}

/// A selection plus how it is presented
#[derive(Debug, Clone, PartialEq)]
pub struct RichTextCaret {
    selection: Selection,
    style: CaretStyle,
}

impl RichTextCaret {
    /// The local editing caret, blinking from `now`
    pub fn local(config: &EditorConfig, now: DateTime<Utc>) -> Self {
        RichTextCaret {
            selection: Selection::default(),
            style: CaretStyle::Blinking {
                epoch: now,
                period: millis(config.blink_period_ms),
            },
        }
    }

    /// A collaborator's caret; it never edits the document
    pub fn remote(
        label: impl Into<String>,
        color: u32,
        config: &EditorConfig,
        now: DateTime<Utc>,
    ) -> Self {
        RichTextCaret {
            selection: Selection::default(),
            style: CaretStyle::Labeled {
                label: label.into(),
                color,
                last_activity: now,
                fade_delay: millis(config.remote_fade_delay_ms),
                fade_duration: millis(config.remote_fade_duration_ms),
            },
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn position(&self) -> CaretPosition {
        self.selection.end()
    }

    pub fn style(&self) -> &CaretStyle {
        &self.style
    }

    pub fn label(&self) -> Option<&str> {
        match &self.style {
            CaretStyle::Labeled { label, .. } => Some(label),
            CaretStyle::Blinking { .. } => None,
        }
    }

    pub fn color(&self) -> Option<u32> {
        match self.style {
            CaretStyle::Labeled { color, .. } => Some(color),
            CaretStyle::Blinking { .. } => None,
        }
    }

    /// Replace the selection and restart the blink cycle or fade timer
    pub fn set_selection(&mut self, selection: Selection, now: DateTime<Utc>) {
        self.selection = selection;
        self.touch(now);
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        match &mut self.style {
            CaretStyle::Blinking { epoch, .. } => *epoch = now,
            CaretStyle::Labeled { last_activity, .. } => *last_activity = now,
        }
    }

    /// Re-clamp after blocks were removed
    pub fn clamp(&mut self, doc: &Document) {
        self.selection = self.selection.clamped(doc);
    }

    /// Opacity in `[0, 1]` at `now`
    pub fn opacity(&self, now: DateTime<Utc>) -> f32 {
        match &self.style {
            CaretStyle::Blinking { epoch, period } => {
                let period = period.num_milliseconds();
                if period <= 0 {
                    return 1.0;
                }
                let elapsed = (now - *epoch).num_milliseconds().max(0);
                if elapsed % period < period / 2 { 1.0 } else { 0.0 }
            }
            CaretStyle::Labeled {
                last_activity,
                fade_delay,
                fade_duration,
                ..
            } => {
                let idle = now - *last_activity;
                if idle <= *fade_delay {
                    return 1.0;
                }
                let fading = (idle - *fade_delay).num_milliseconds() as f32;
                let duration = fade_duration.num_milliseconds() as f32;
                if duration <= 0.0 {
                    return 0.0;
                }
                (1.0 - fading / duration).clamp(0.0, 1.0)
            }
        }
    }

    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.opacity(now) > 0.0
    }
}

fn millis(ms: u64) -> TimeDelta {
    TimeDelta::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::font::FixedWidthFonts;
    use crate::richtext::text_block::{BlockKind, TextBlock};

    fn doc(texts: &[&str], wrap_width: f32) -> Document {
        let mut doc = Document::new(FixedWidthFonts::uniform(4.0, 10.0)).with_blocks(
            texts
                .iter()
                .map(|t| TextBlock::with_text(BlockKind::Paragraph, *t))
                .collect(),
        );
        doc.set_wrap_width(wrap_width);
        doc
    }

    fn at(block: usize, offset: usize) -> Selection {
        Selection::collapsed(CaretPosition::new(block, offset))
    }

    #[test]
    fn test_direction_predicates() {
        let a = CaretPosition::new(0, 3);
        let b = CaretPosition::new(1, 0);

        let none = Selection::collapsed(a);
        assert!(!none.has_selection());
        assert!(!none.has_forward_selection() && !none.has_backward_selection());

        let forward = Selection::new(a, b);
        assert!(forward.has_forward_selection() && !forward.has_backward_selection());
        assert_eq!(forward.ordered(), (a, b));

        let backward = Selection::new(b, a);
        assert!(backward.has_backward_selection() && !backward.has_forward_selection());
        assert_eq!(backward.ordered(), (a, b));
    }

    #[test]
    fn test_setting_start_collapses() {
        let mut sel = Selection::new(CaretPosition::new(0, 1), CaretPosition::new(0, 4));
        sel.set_end(CaretPosition::new(1, 2));
        assert_eq!(sel.start(), CaretPosition::new(0, 1));
        sel.set_start(CaretPosition::new(0, 2));
        assert!(!sel.has_selection());
        assert_eq!(sel.end(), CaretPosition::new(0, 2));
    }

    #[test]
    fn test_clamped_reads() {
        let doc = doc(&["abc"], 400.0);
        let sel = Selection::new(CaretPosition::new(3, 9), CaretPosition::new(0, 99));
        let sel = sel.clamped(&doc);
        assert_eq!(sel.start(), CaretPosition::new(0, 3));
        assert_eq!(sel.end(), CaretPosition::new(0, 3));
    }

    #[test]
    fn test_left_right_cross_blocks() {
        let doc = doc(&["ab", "c"], 400.0);
        assert_eq!(at(0, 2).move_right(&doc, false, false), at(1, 0));
        assert_eq!(at(1, 0).move_left(&doc, false, false), at(0, 2));
        assert_eq!(at(0, 0).move_left(&doc, false, false), at(0, 0));
        assert_eq!(at(1, 1).move_right(&doc, false, false), at(1, 1));
    }

    #[test]
    fn test_left_right_step_graphemes() {
        let doc = doc(&["ae\u{301}b"], 400.0);
        assert_eq!(at(0, 1).move_right(&doc, false, false), at(0, 4));
        assert_eq!(at(0, 4).move_left(&doc, false, false), at(0, 1));
    }

    #[test]
    fn test_collapse_to_selection_edge() {
        let doc = doc(&["hello world"], 400.0);
        let sel = Selection::new(CaretPosition::new(0, 8), CaretPosition::new(0, 2));
        assert_eq!(sel.move_left(&doc, false, false), at(0, 2));
        assert_eq!(sel.move_right(&doc, false, false), at(0, 8));

        let extended = sel.move_right(&doc, true, false);
        assert_eq!(
            extended,
            Selection::new(CaretPosition::new(0, 8), CaretPosition::new(0, 3))
        );
    }

    #[test]
    fn test_word_movement() {
        let doc = doc(&["one two  three"], 400.0);
        assert_eq!(at(0, 0).move_right(&doc, false, true), at(0, 3));
        assert_eq!(at(0, 3).move_right(&doc, false, true), at(0, 7));
        assert_eq!(at(0, 7).move_right(&doc, false, true), at(0, 14));
        assert_eq!(at(0, 14).move_left(&doc, false, true), at(0, 9));
        assert_eq!(at(0, 9).move_left(&doc, false, true), at(0, 4));
        assert_eq!(at(0, 5).move_left(&doc, false, true), at(0, 4));
        assert_eq!(at(0, 4).move_left(&doc, false, true), at(0, 0));
    }

    #[test]
    fn test_vertical_movement_keeps_column() {
        // Lines: "Hello" | "world foo" ; "hi"
        let doc = doc(&["Hello world foo", "hi"], 40.0);
        let sel = at(0, 14).move_up(&doc, false);
        assert_eq!(sel, at(0, 5));

        // Column 32px is kept through the short line below
        let sel = sel.move_down(&doc, false);
        assert_eq!(sel, at(0, 14));
        let sel = sel.move_down(&doc, false);
        assert_eq!(sel, at(1, 2));
        let sel = sel.move_up(&doc, false);
        assert_eq!(sel, at(0, 14));

        assert_eq!(at(0, 3).move_up(&doc, false), at(0, 0));
        assert_eq!(at(1, 0).move_down(&doc, false), at(1, 2));
    }

    #[test]
    fn test_home_end_use_visual_line() {
        let doc = doc(&["Hello world foo"], 40.0);
        assert_eq!(at(0, 8).move_home(&doc, false), at(0, 6));
        assert_eq!(at(0, 8).move_end(&doc, false), at(0, 15));
        assert_eq!(at(0, 2).move_end(&doc, false), at(0, 5));
        assert_eq!(
            at(0, 8).move_home(&doc, true),
            Selection::new(CaretPosition::new(0, 8), CaretPosition::new(0, 6))
        );
    }

    #[test]
    fn test_page_and_document_movement() {
        let doc = doc(&["a", "b", "c", "d"], 400.0);
        assert_eq!(at(0, 1).move_page_down(&doc, false, 30.0), at(2, 1));
        assert_eq!(at(3, 0).move_page_up(&doc, false, 30.0), at(1, 0));
        assert_eq!(at(1, 0).move_page_up(&doc, false, 100.0), at(0, 0));
        assert_eq!(at(1, 0).move_page_down(&doc, false, 100.0), at(3, 1));

        assert_eq!(at(2, 1).move_document_start(&doc, false), at(0, 0));
        assert_eq!(
            at(2, 1).move_document_end(&doc, true),
            Selection::new(CaretPosition::new(2, 1), CaretPosition::new(3, 1))
        );
    }

    #[test]
    fn test_select_word_and_block() {
        let doc = doc(&["one two  three", "x"], 400.0);
        let word = |offset| {
            let sel = Selection::select_word_at(&doc, CaretPosition::new(0, offset));
            (sel.start().offset, sel.end().offset)
        };
        assert_eq!(word(5), (4, 7));
        assert_eq!(word(4), (4, 7));
        assert_eq!(word(7), (7, 9));
        assert_eq!(word(14), (9, 14));

        let all = Selection::select_all(&doc);
        assert_eq!(all.ordered(), (CaretPosition::new(0, 0), CaretPosition::new(1, 1)));
        let block = Selection::select_block_at(&doc, 9);
        assert_eq!(block.ordered(), (CaretPosition::new(1, 0), CaretPosition::new(1, 1)));
    }

    #[test]
    fn test_blinking_caret() {
        let config = EditorConfig::default();
        let t0 = Utc::now();
        let mut caret = RichTextCaret::local(&config, t0);
        assert!(caret.is_visible(t0));
        assert!(!caret.is_visible(t0 + TimeDelta::milliseconds(600)));
        assert!(caret.is_visible(t0 + TimeDelta::milliseconds(1100)));

        // Moving restarts the cycle
        let t1 = t0 + TimeDelta::milliseconds(600);
        caret.set_selection(at(0, 0), t1);
        assert!(caret.is_visible(t1));
        assert_eq!(caret.label(), None);
    }

    #[test]
    fn test_labeled_caret_fades() {
        let config = EditorConfig::default();
        let t0 = Utc::now();
        let caret = RichTextCaret::remote("ada", 0xff8800, &config, t0);
        assert_eq!(caret.label(), Some("ada"));
        assert_eq!(caret.color(), Some(0xff8800));
        assert_eq!(caret.opacity(t0 + TimeDelta::milliseconds(5000)), 1.0);
        assert_eq!(caret.opacity(t0 + TimeDelta::milliseconds(5500)), 0.5);
        assert_eq!(caret.opacity(t0 + TimeDelta::milliseconds(7000)), 0.0);
        assert!(!caret.is_visible(t0 + TimeDelta::milliseconds(6000)));
    }
}
