// Text Spans
// The atomic run of text inside a block: plain text or a link

/// What a span is, independent of its text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpanKind {
    #[default]
    Default,
    Link {
        target: String,
    },
}

/// A run of text sharing one kind (a contiguous piece of text with uniform styling)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    kind: SpanKind,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, kind: SpanKind) -> Self {
        TextSpan {
            text: text.into(),
            kind,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, SpanKind::Default)
    }

    pub fn link(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(
            text,
            SpanKind::Link {
                target: target.into(),
            },
        )
    }

    pub fn kind(&self) -> &SpanKind {
        &self.kind
    }

    pub fn is_link(&self) -> bool {
        matches!(self.kind, SpanKind::Link { .. })
    }

    pub fn link_target(&self) -> Option<&str> {
        match &self.kind {
            SpanKind::Link { target } => Some(target),
            SpanKind::Default => None,
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// A fresh span of the same kind holding `text`
    pub fn with_text(&self, text: impl Into<String>) -> TextSpan {
        TextSpan::new(text, self.kind.clone())
    }

    /// Copy of the byte range [start..end) as a new span of the same kind
    pub fn slice(&self, start: usize, end: usize) -> TextSpan {
        self.with_text(&self.text[start..end])
    }

    /// Split this span at the given byte offset
    /// Returns (left_span, right_span)
    pub fn split_at(&self, offset: usize) -> (TextSpan, TextSpan) {
        let (left, right) = self.text.split_at(offset);
        (self.with_text(left), self.with_text(right))
    }

    /// Insert text at the given offset
    pub fn insert_text(&mut self, offset: usize, text: &str) {
        self.text.insert_str(offset, text);
    }

    /// Delete text in the given range [start..end)
    pub fn delete_range(&mut self, start: usize, end: usize) {
        self.text.drain(start..end);
    }
}
