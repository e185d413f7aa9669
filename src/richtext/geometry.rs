// Caret and selection geometry
// Rectangles in document space for the host's draw code.

use super::caret::{CaretPosition, Selection};
use super::document::Document;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanning `left..right` horizontally, never of negative width
    fn span(left: f32, right: f32, y: f32, height: f32) -> Self {
        Rect::new(left, y, (right - left).max(0.0), height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// A one pixel wide caret as tall as the line it sits on
pub fn caret_rect(doc: &Document, pos: CaretPosition) -> Rect {
    let pos = doc.clamp_position(pos);
    let (x, y) = doc.position_to_point(pos);
    let line_height = doc.block(pos.block).line_height(&doc.layout_context());
    Rect::new(x, y, 1.0, line_height)
}

/// Highlight rectangles for a selection.
///
/// Both ends on one line give a single rectangle. Otherwise the first line is
/// covered from the selection start to the right edge, each block's run of fully
/// covered lines gets one rectangle from the block's left edge, and the last
/// line is covered from its block's left edge up to the selection end.
pub fn selection_rects(doc: &Document, selection: &Selection) -> Vec<Rect> {
    let selection = selection.clamped(doc);
    if !selection.has_selection() {
        return Vec::new();
    }

    let ctx = doc.layout_context();
    let right_edge = doc.wrap_width();
    let (a, b) = selection.ordered();
    let (ax, a_line) = doc.offset_to_xy(a);
    let (bx, b_line) = doc.offset_to_xy(b);

    let row = |block: usize, line: usize| {
        let height = doc.blocks()[block].line_height(&ctx);
        (doc.block_top(block) + line as f32 * height, height)
    };

    if a.block == b.block && a_line == b_line {
        let (y, height) = row(a.block, a_line);
        return vec![Rect::span(ax, bx, y, height)];
    }

    let mut rects = Vec::new();
    let (y, height) = row(a.block, a_line);
    rects.push(Rect::span(ax, right_edge.max(ax), y, height));

    // Fully covered lines, one run per block
    for block in a.block..=b.block {
        let first = if block == a.block { a_line + 1 } else { 0 };
        let last = if block == b.block {
            b_line
        } else {
            doc.blocks()[block].line_count(&ctx)
        };
        if first >= last {
            continue;
        }
        let left = doc.blocks()[block].indent_offset(&ctx);
        let (top, height) = row(block, first);
        let lines = (last - first) as f32;
        rects.push(Rect::span(left, right_edge.max(left), top, lines * height));
    }

    let left = doc.blocks()[b.block].indent_offset(&ctx);
    let (y, height) = row(b.block, b_line);
    rects.push(Rect::span(left, bx, y, height));
    rects
}
