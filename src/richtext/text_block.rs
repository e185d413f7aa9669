// Text Blocks
// One paragraph-level unit: a kind, an indent level and a soup of spans.
// Wrapped lines are computed lazily and mapped to and from pixel coordinates.

use std::cell::OnceCell;
use std::fmt;

use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

use super::font::{FontMetrics, FontRole, FontSet};
use super::text_soup::{TextSoup, WrappedLine};
use super::text_span::TextSpan;

/// Deepest indent level a block can have
pub const MAX_INDENT_LEVEL: u8 = 4;

/// Block-level content types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockKind {
    #[default]
    Paragraph,
    Header,
    SubHeader,
    OrderedListItem,
    UnorderedListItem,
}

impl BlockKind {
    pub fn font_role(self) -> FontRole {
        match self {
            BlockKind::Paragraph => FontRole::Paragraph,
            BlockKind::Header => FontRole::Header,
            BlockKind::SubHeader => FontRole::SubHeader,
            BlockKind::OrderedListItem | BlockKind::UnorderedListItem => FontRole::List,
        }
    }

    pub fn is_list_item(self) -> bool {
        matches!(
            self,
            BlockKind::OrderedListItem | BlockKind::UnorderedListItem
        )
    }

    /// Whether a block created by splitting this one keeps its kind and indent
    pub fn carries_over_on_split(self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph | BlockKind::OrderedListItem | BlockKind::UnorderedListItem
        )
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Paragraph => "Paragraph",
            BlockKind::Header => "Header",
            BlockKind::SubHeader => "SubHeader",
            BlockKind::OrderedListItem => "OrderedListItem",
            BlockKind::UnorderedListItem => "UnorderedListItem",
        };
        f.write_str(name)
    }
}

/// Everything a block needs from its surroundings to lay itself out
#[derive(Clone, Copy)]
pub struct LayoutContext<'a> {
    pub fonts: &'a dyn FontSet,
    /// Content width before the block's own indentation is subtracted
    pub wrap_width: f32,
    pub indent_width: f32,
}

/// Cached result of wrapping a block
#[derive(Debug, Clone)]
pub struct BlockLayout {
    pub lines: Vec<WrappedLine>,
    pub line_height: f32,
    pub indent_offset: f32,
}

/// A block of content
#[derive(Clone)]
pub struct TextBlock {
    kind: BlockKind,
    indent_level: u8,
    content: TextSoup,
    layout: OnceCell<BlockLayout>,
}

impl TextBlock {
    pub fn new(kind: BlockKind) -> Self {
        Self::from_soup(kind, 0, TextSoup::new())
    }

    pub fn paragraph() -> Self {
        Self::new(BlockKind::Paragraph)
    }

    pub fn from_soup(kind: BlockKind, indent_level: u8, content: TextSoup) -> Self {
        TextBlock {
            kind,
            indent_level: indent_level.min(MAX_INDENT_LEVEL),
            content,
            layout: OnceCell::new(),
        }
    }

    pub fn with_text(kind: BlockKind, text: impl Into<String>) -> Self {
        Self::from_soup(kind, 0, TextSoup::plain(text))
    }

    pub fn with_indent(mut self, indent_level: u8) -> Self {
        self.set_indent_level(indent_level);
        self
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: BlockKind) {
        if self.kind != kind {
            self.kind = kind;
            self.invalidate_layout();
        }
    }

    pub fn indent_level(&self) -> u8 {
        self.indent_level
    }

    /// Set the indent level, clamped to `[0, MAX_INDENT_LEVEL]`
    pub fn set_indent_level(&mut self, indent_level: u8) {
        let indent_level = indent_level.min(MAX_INDENT_LEVEL);
        if self.indent_level != indent_level {
            self.indent_level = indent_level;
            self.invalidate_layout();
        }
    }

    /// Indent including the extra level list items reserve for their marker
    pub fn effective_indent(&self) -> u8 {
        if self.kind.is_list_item() {
            self.indent_level + 1
        } else {
            self.indent_level
        }
    }

    pub fn content(&self) -> &TextSoup {
        &self.content
    }

    pub fn into_content(self) -> TextSoup {
        self.content
    }

    pub fn simple_text(&self) -> &str {
        self.content.simple_text()
    }

    pub fn text_length(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Clamp an offset into this block, onto a char boundary
    pub fn clamp_offset(&self, offset: usize) -> usize {
        self.content.clamp_offset(offset)
    }

    pub fn insert_text(&mut self, offset: usize, text: &str) {
        self.content.insert(offset, text);
        self.invalidate_layout();
    }

    pub fn remove_text(&mut self, start: usize, length: usize) {
        self.content.remove(start, length);
        self.invalidate_layout();
    }

    /// Split this block's content at `offset`, returning the right part.
    /// The left part remains in self.
    pub fn split_off(&mut self, offset: usize) -> TextSoup {
        let right = self.content.split_off(offset);
        self.invalidate_layout();
        right
    }

    pub fn append(&mut self, content: TextSoup) {
        self.content.append(content.into_spans());
        self.invalidate_layout();
    }

    pub fn clear(&mut self) {
        self.content = TextSoup::new();
        self.invalidate_layout();
    }

    pub(crate) fn invalidate_layout(&mut self) {
        self.layout.take();
    }

    fn font<'a>(&self, ctx: &LayoutContext<'a>) -> &'a dyn FontMetrics {
        ctx.fonts.font(self.kind.font_role())
    }

    pub fn indent_offset(&self, ctx: &LayoutContext<'_>) -> f32 {
        f32::from(self.effective_indent()) * ctx.indent_width
    }

    /// Wrapped lines, computed on first use after a change
    pub fn layout(&self, ctx: &LayoutContext<'_>) -> &BlockLayout {
        self.layout.get_or_init(|| {
            let font = self.font(ctx);
            let indent_offset = self.indent_offset(ctx);
            let available = (ctx.wrap_width - indent_offset).max(0.0);
            let lines = self
                .content
                .wrap_lines(available, |text| font.measure(text));
            trace!(
                kind = %self.kind,
                lines = lines.len(),
                width = available,
                "rewrapped block"
            );
            BlockLayout {
                lines,
                line_height: font.line_spacing(),
                indent_offset,
            }
        })
    }

    pub fn lines(&self, ctx: &LayoutContext<'_>) -> &[WrappedLine] {
        &self.layout(ctx).lines
    }

    pub fn line_count(&self, ctx: &LayoutContext<'_>) -> usize {
        self.lines(ctx).len()
    }

    pub fn line_height(&self, ctx: &LayoutContext<'_>) -> f32 {
        self.layout(ctx).line_height
    }

    /// Height of all lines plus half a line of paragraph spacing
    pub fn total_height(&self, ctx: &LayoutContext<'_>) -> f32 {
        let layout = self.layout(ctx);
        layout.line_height * layout.lines.len() as f32 + layout.line_height / 2.0
    }

    /// The wrapped line `index`, clamped to the last line
    pub fn line(&self, index: usize, ctx: &LayoutContext<'_>) -> &WrappedLine {
        let lines = self.lines(ctx);
        &lines[index.min(lines.len() - 1)]
    }

    /// Visual line an offset is drawn on.
    ///
    /// An offset equal to the start of a following line belongs to that line, so a
    /// caret at a wrap point sits at the left edge of the new line. Offsets inside
    /// a consumed run of spaces stay on the line before it.
    pub fn line_of_offset(&self, offset: usize, ctx: &LayoutContext<'_>) -> usize {
        let lines = self.lines(ctx);
        let last = lines.len() - 1;
        lines[..last]
            .iter()
            .position(|line| offset < line.next_start())
            .unwrap_or(last)
    }

    /// Pixel x (including indentation) and visual line of an offset
    pub fn offset_to_xy(&self, offset: usize, ctx: &LayoutContext<'_>) -> (f32, usize) {
        let offset = self.clamp_offset(offset);
        let index = self.line_of_offset(offset, ctx);
        let layout = self.layout(ctx);
        let line = &layout.lines[index];
        let width = self
            .content
            .measure_subset(self.font(ctx), line.start, offset - line.start);
        (width + layout.indent_offset, index)
    }

    /// Offset nearest to pixel `x` on visual line `line` (clamped)
    pub fn xy_to_offset(&self, x: f32, line: usize, ctx: &LayoutContext<'_>) -> usize {
        let layout = self.layout(ctx);
        let line = &layout.lines[line.min(layout.lines.len() - 1)];
        let font = self.font(ctx);
        let x = x - layout.indent_offset;
        if x <= 0.0 {
            return line.start;
        }

        let text = line.text();
        let mut prev_boundary = 0;
        let mut prev_width = 0.0;
        for (index, grapheme) in text.grapheme_indices(true) {
            let boundary = index + grapheme.len();
            let width = font.measure(&text[..boundary]);
            if width > x {
                let nearest = if x - prev_width < width - x {
                    prev_boundary
                } else {
                    boundary
                };
                return line.start + nearest;
            }
            prev_boundary = boundary;
            prev_width = width;
        }
        line.end()
    }

    /// Offset of the grapheme drawn under pixel `x` on `line`, if any
    pub fn char_at_point(&self, x: f32, line: usize, ctx: &LayoutContext<'_>) -> Option<usize> {
        let layout = self.layout(ctx);
        let line = layout.lines.get(line)?;
        let font = self.font(ctx);
        let x = x - layout.indent_offset;
        if x < 0.0 {
            return None;
        }

        let text = line.text();
        let mut left = 0.0;
        for (index, grapheme) in text.grapheme_indices(true) {
            let right = font.measure(&text[..index + grapheme.len()]);
            if x >= left && x < right {
                return Some(line.start + index);
            }
            left = right;
        }
        None
    }

    /// The span under pixel `x` on `line`, used for link activation
    pub fn span_at_point(&self, x: f32, line: usize, ctx: &LayoutContext<'_>) -> Option<&TextSpan> {
        let offset = self.char_at_point(x, line, ctx)?;
        self.content.span_at(offset).map(|(_, span)| span)
    }
}

impl Default for TextBlock {
    fn default() -> Self {
        Self::paragraph()
    }
}

impl PartialEq for TextBlock {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.indent_level == other.indent_level
            && self.content == other.content
    }
}

impl fmt::Debug for TextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextBlock")
            .field("kind", &self.kind)
            .field("indent_level", &self.indent_level)
            .field("content", &self.content)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::font::FixedWidthFonts;

    fn ctx(fonts: &FixedWidthFonts, wrap_width: f32) -> LayoutContext<'_> {
        LayoutContext {
            fonts,
            wrap_width,
            indent_width: 8.0,
        }
    }

    #[test]
    fn test_wrapping_and_height() {
        let fonts = FixedWidthFonts::uniform(4.0, 10.0);
        let ctx = ctx(&fonts, 40.0);
        let block = TextBlock::with_text(BlockKind::Paragraph, "Hello world foo");

        let lines: Vec<&str> = block.lines(&ctx).iter().map(|l| l.text()).collect();
        assert_eq!(lines, vec!["Hello", "world foo"]);
        assert_eq!(block.total_height(&ctx), 25.0);
    }

    #[test]
    fn test_offset_to_xy_binds_wrap_point_to_next_line() {
        let fonts = FixedWidthFonts::uniform(4.0, 10.0);
        let ctx = ctx(&fonts, 40.0);
        let block = TextBlock::with_text(BlockKind::Paragraph, "Hello world foo");

        assert_eq!(block.offset_to_xy(0, &ctx), (0.0, 0));
        assert_eq!(block.offset_to_xy(5, &ctx), (20.0, 0));
        assert_eq!(block.offset_to_xy(6, &ctx), (0.0, 1));
        assert_eq!(block.offset_to_xy(15, &ctx), (36.0, 1));
        assert_eq!(block.offset_to_xy(99, &ctx), (36.0, 1));
    }

    #[test]
    fn test_offsets_inside_consumed_spaces_stay_on_previous_line() {
        let fonts = FixedWidthFonts::uniform(4.0, 10.0);
        let ctx = ctx(&fonts, 40.0);
        let block = TextBlock::with_text(BlockKind::Paragraph, "Hello   world");

        let lines: Vec<&str> = block.lines(&ctx).iter().map(|l| l.text()).collect();
        assert_eq!(lines, vec!["Hello", "world"]);
        assert_eq!(block.offset_to_xy(5, &ctx), (20.0, 0));
        assert_eq!(block.offset_to_xy(7, &ctx), (28.0, 0));
        assert_eq!(block.offset_to_xy(8, &ctx), (0.0, 1));
    }

    #[test]
    fn test_coordinate_round_trip() {
        let fonts = FixedWidthFonts::uniform(4.0, 10.0);
        let ctx = ctx(&fonts, 48.0);
        let block = TextBlock::with_text(
            BlockKind::UnorderedListItem,
            "the quick brown fox\njumps over the lazy dog",
        );
        assert!(block.line_count(&ctx) > 2);

        for offset in 0..=block.text_length() {
            let (x, line) = block.offset_to_xy(offset, &ctx);
            assert_eq!(block.xy_to_offset(x, line, &ctx), offset, "offset {offset}");
        }
    }

    #[test]
    fn test_xy_to_offset_picks_nearer_boundary() {
        let fonts = FixedWidthFonts::uniform(4.0, 10.0);
        let ctx = ctx(&fonts, 400.0);
        let block = TextBlock::with_text(BlockKind::Paragraph, "abcd");

        assert_eq!(block.xy_to_offset(-3.0, 0, &ctx), 0);
        assert_eq!(block.xy_to_offset(5.0, 0, &ctx), 1);
        assert_eq!(block.xy_to_offset(6.0, 0, &ctx), 2);
        assert_eq!(block.xy_to_offset(7.0, 0, &ctx), 2);
        assert_eq!(block.xy_to_offset(500.0, 0, &ctx), 4);
        // Line index is clamped
        assert_eq!(block.xy_to_offset(500.0, 7, &ctx), 4);
    }

    #[test]
    fn test_list_items_reserve_marker_room() {
        let fonts = FixedWidthFonts::uniform(4.0, 10.0);
        let ctx = ctx(&fonts, 40.0);
        let mut block = TextBlock::with_text(BlockKind::OrderedListItem, "ab");
        assert_eq!(block.effective_indent(), 1);
        assert_eq!(block.offset_to_xy(1, &ctx), (12.0, 0));

        block.set_indent_level(2);
        assert_eq!(block.offset_to_xy(1, &ctx), (28.0, 0));

        block.set_kind(BlockKind::Paragraph);
        assert_eq!(block.offset_to_xy(1, &ctx), (20.0, 0));
    }

    #[test]
    fn test_indent_is_clamped() {
        let mut block = TextBlock::paragraph();
        block.set_indent_level(9);
        assert_eq!(block.indent_level(), MAX_INDENT_LEVEL);
        assert_eq!(TextBlock::paragraph().with_indent(200).indent_level(), 4);
    }

    #[test]
    fn test_edits_invalidate_wrap_cache() {
        let fonts = FixedWidthFonts::uniform(4.0, 10.0);
        let ctx = ctx(&fonts, 40.0);
        let mut block = TextBlock::with_text(BlockKind::Paragraph, "short");
        assert_eq!(block.line_count(&ctx), 1);

        block.insert_text(5, " and then much longer");
        assert!(block.line_count(&ctx) > 1);

        block.remove_text(5, 100);
        assert_eq!(block.line_count(&ctx), 1);
    }

    #[test]
    fn test_span_at_point_finds_links() {
        let fonts = FixedWidthFonts::uniform(4.0, 10.0);
        let ctx = ctx(&fonts, 400.0);
        let block = TextBlock::from_soup(
            BlockKind::Paragraph,
            0,
            TextSoup::from_spans([TextSpan::plain("see "), TextSpan::link("here", "doc://here")]),
        );

        assert_eq!(block.span_at_point(2.0, 0, &ctx).and_then(|s| s.link_target()), None);
        assert_eq!(
            block.span_at_point(17.0, 0, &ctx).and_then(|s| s.link_target()),
            Some("doc://here")
        );
        assert!(block.span_at_point(40.0, 0, &ctx).is_none());
        assert!(block.span_at_point(17.0, 3, &ctx).is_none());
    }
}
