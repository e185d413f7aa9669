// Text Soup
// An ordered sequence of spans with a memoized plain-text view and a greedy word wrapper

use std::borrow::Cow;
use std::cell::OnceCell;
use std::fmt;

use super::font::FontMetrics;
use super::text_span::{SpanKind, TextSpan};

/// Clamp `offset` into `text` and move it back onto a char boundary
pub(crate) fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// How a wrapped line ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// Soft wrap; the run of spaces at the wrap point was consumed
    Wrap { spaces: usize },
    /// The line was closed by a '\n' in the text
    HardBreak,
    /// Last line of the soup
    End,
}

impl LineEnding {
    /// Number of source bytes consumed after the line's text
    pub fn len(self) -> usize {
        match self {
            LineEnding::Wrap { spaces } => spaces,
            LineEnding::HardBreak => 1,
            LineEnding::End => 0,
        }
    }

    pub fn separator(self) -> Cow<'static, str> {
        match self {
            LineEnding::Wrap { spaces: 1 } => Cow::Borrowed(" "),
            LineEnding::Wrap { spaces } => Cow::Owned(" ".repeat(spaces)),
            LineEnding::HardBreak => Cow::Borrowed("\n"),
            LineEnding::End => Cow::Borrowed(""),
        }
    }
}

/// One visual line produced by wrapping
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    /// Byte offset of the line's first character in the source soup
    pub start: usize,
    pub soup: TextSoup,
    pub ending: LineEnding,
}

impl WrappedLine {
    pub fn len(&self) -> usize {
        self.soup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.soup.is_empty()
    }

    /// Offset just past the line's last visible character
    pub fn end(&self) -> usize {
        self.start + self.len()
    }

    /// Offset where the following line starts
    pub fn next_start(&self) -> usize {
        self.end() + self.ending.len()
    }

    pub fn text(&self) -> &str {
        self.soup.simple_text()
    }
}

enum Insertion {
    Into(usize, usize),
    Before(usize),
}

/// An ordered, never-empty sequence of spans
#[derive(Clone)]
pub struct TextSoup {
    spans: Vec<TextSpan>,
    text: OnceCell<String>,
}

impl TextSoup {
    pub fn new() -> Self {
        TextSoup {
            spans: vec![TextSpan::plain("")],
            text: OnceCell::new(),
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::from_spans([TextSpan::plain(text)])
    }

    /// Build a soup from spans, dropping empty ones and joining neighbours of equal kind
    pub fn from_spans(spans: impl IntoIterator<Item = TextSpan>) -> Self {
        let mut soup = Self::new();
        soup.append(spans);
        soup
    }

    pub fn spans(&self) -> &[TextSpan] {
        &self.spans
    }

    pub fn into_spans(self) -> Vec<TextSpan> {
        self.spans
    }

    /// Concatenated text of all spans
    pub fn simple_text(&self) -> &str {
        self.text
            .get_or_init(|| self.spans.iter().map(|s| s.text.as_str()).collect())
    }

    pub fn len(&self) -> usize {
        self.simple_text().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn invalidate(&mut self) {
        self.text.take();
    }

    pub(crate) fn clamp_offset(&self, offset: usize) -> usize {
        floor_char_boundary(self.simple_text(), offset)
    }

    fn insertion_point(&self, offset: usize) -> Insertion {
        let mut pos = 0;
        for (i, span) in self.spans.iter().enumerate() {
            let end = pos + span.len();
            if span.is_link() {
                if offset > pos && offset < end {
                    return Insertion::Into(i, offset - pos);
                }
                if offset == pos {
                    return Insertion::Before(i);
                }
            } else if offset >= pos && offset <= end {
                return Insertion::Into(i, offset - pos);
            }
            pos = end;
        }
        Insertion::Before(self.spans.len())
    }

    /// Insert plain text at a byte offset.
    ///
    /// Text typed strictly inside a link becomes part of the link; text typed at
    /// either edge of a link lands in the neighbouring plain span instead.
    pub fn insert(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let offset = self.clamp_offset(offset);
        match self.insertion_point(offset) {
            Insertion::Into(index, local) => self.spans[index].insert_text(local, text),
            Insertion::Before(index) => {
                self.spans.insert(index, TextSpan::plain(text));
                self.spans.retain(|s| !s.is_empty());
            }
        }
        self.invalidate();
    }

    /// Remove `length` bytes starting at `start`; the range is clamped to the soup
    pub fn remove(&mut self, start: usize, length: usize) {
        let start = self.clamp_offset(start);
        let end = self.clamp_offset(start.saturating_add(length));
        if start >= end {
            return;
        }

        let mut pos = 0;
        for span in self.spans.iter_mut() {
            let span_end = pos + span.len();
            let local_start = start.clamp(pos, span_end) - pos;
            let local_end = end.clamp(pos, span_end) - pos;
            if local_start < local_end {
                span.delete_range(local_start, local_end);
            }
            pos = span_end;
        }

        // Rebuild so the spans left on either side of the hole join up
        let spans = std::mem::take(&mut self.spans);
        self.append(spans);
    }

    /// Copy of `length` bytes starting at `start`, with span kinds preserved
    pub fn subset(&self, start: usize, length: usize) -> TextSoup {
        let start = self.clamp_offset(start);
        let end = self.clamp_offset(start.saturating_add(length));

        let mut pieces = Vec::new();
        let mut pos = 0;
        for span in &self.spans {
            let span_end = pos + span.len();
            let local_start = start.clamp(pos, span_end) - pos;
            let local_end = end.clamp(pos, span_end) - pos;
            if local_start < local_end {
                pieces.push(span.slice(local_start, local_end));
            }
            pos = span_end;
        }
        TextSoup::from_spans(pieces)
    }

    /// Append spans at the end, joining neighbours of equal kind
    pub fn append(&mut self, spans: impl IntoIterator<Item = TextSpan>) {
        for span in spans {
            if span.is_empty() {
                continue;
            }
            if self.spans.len() == 1 && self.spans[0].is_empty() {
                self.spans[0] = span;
                continue;
            }
            if let Some(last) = self.spans.last_mut() {
                if last.kind() == span.kind() {
                    last.text.push_str(&span.text);
                    continue;
                }
            }
            self.spans.push(span);
        }
        if self.spans.is_empty() {
            self.spans.push(TextSpan::plain(""));
        }
        self.invalidate();
    }

    /// Split at `offset`; `self` keeps the left part and the right part is returned
    pub fn split_off(&mut self, offset: usize) -> TextSoup {
        let offset = self.clamp_offset(offset);
        let tail = self.len() - offset;
        let right = self.subset(offset, tail);
        self.remove(offset, tail);
        right
    }

    /// The span holding the character that starts at or covers `offset`
    pub fn span_at(&self, offset: usize) -> Option<(usize, &TextSpan)> {
        let mut pos = 0;
        for (i, span) in self.spans.iter().enumerate() {
            let end = pos + span.len();
            if offset >= pos && offset < end {
                return Some((i, span));
            }
            pos = end;
        }
        None
    }

    /// Kind of the span covering `offset`, if any
    pub fn kind_at(&self, offset: usize) -> Option<&SpanKind> {
        self.span_at(offset).map(|(_, span)| span.kind())
    }

    /// Width of the text in [start..start+length) measured with `font`
    pub fn measure_subset(&self, font: &dyn FontMetrics, start: usize, length: usize) -> f32 {
        let text = self.simple_text();
        let start = floor_char_boundary(text, start);
        let end = floor_char_boundary(text, start.saturating_add(length));
        font.measure(&text[start..end])
    }

    /// Greedy word wrap into one soup per visual line
    pub fn wrap(&self, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<TextSoup> {
        self.wrap_lines(max_width, measure)
            .into_iter()
            .map(|line| line.soup)
            .collect()
    }

    /// Greedy word wrap keeping each line's source position and how it ends.
    ///
    /// Hard breaks ('\n') always close a line. Within a hard-break segment words
    /// are accumulated while `measure(line + spaces + word) <= max_width`; a word
    /// that is wider than `max_width` on its own gets a line to itself. Lines never
    /// contain their separator, so `line.next_start()` is the next line's `start`.
    /// A line is empty only when its whole hard-break segment is.
    pub fn wrap_lines(&self, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<WrappedLine> {
        let text = self.simple_text();
        let mut ranges: Vec<(usize, usize, LineEnding)> = Vec::new();

        let mut segment_start = 0;
        for segment in text.split('\n') {
            let segment_end = segment_start + segment.len();
            let mut line_start = segment_start;
            let mut line_end: Option<usize> = None;
            let mut word_start = segment_start;

            // Spaces never start a wrapped line: leading spaces stay with the
            // segment's first word and the whole run at a wrap point is consumed
            for word in segment.split(' ') {
                let word_end = word_start + word.len();
                if !word.is_empty() {
                    if let Some(end) = line_end {
                        if measure(&text[line_start..word_end]) > max_width {
                            let spaces = word_start - end;
                            ranges.push((line_start, end, LineEnding::Wrap { spaces }));
                            line_start = word_start;
                        }
                    }
                    line_end = Some(word_end);
                }
                word_start = word_end + 1;
            }

            let ending = if segment_end == text.len() {
                LineEnding::End
            } else {
                LineEnding::HardBreak
            };
            ranges.push((line_start, segment_end, ending));
            segment_start = segment_end + 1;
        }

        ranges
            .into_iter()
            .map(|(start, end, ending)| WrappedLine {
                start,
                soup: self.subset(start, end - start),
                ending,
            })
            .collect()
    }
}

impl Default for TextSoup {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TextSoup {
    fn eq(&self, other: &Self) -> bool {
        self.spans == other.spans
    }
}

impl fmt::Debug for TextSoup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextSoup").field(&self.spans).finish()
    }
}

impl From<&str> for TextSoup {
    fn from(text: &str) -> Self {
        TextSoup::plain(text)
    }
}
