// Outline format
// A plain line-per-block text format for loading and dumping documents.
// Two spaces per indent level, then an optional "# ", "## ", "- " or "1. " prefix.
// Inline links are written as [text](target). Soft breaks inside a block are
// written as "\n" and literal backslashes as "\\".

use std::fmt::Write as _;

use crate::richtext::document::Document;
use crate::richtext::text_block::{BlockKind, TextBlock};
use crate::richtext::text_soup::TextSoup;
use crate::richtext::text_span::{SpanKind, TextSpan};

/// Parse outline text into blocks; every line becomes one block
pub fn parse_outline(text: &str) -> Vec<TextBlock> {
    text.lines().map(parse_line).collect()
}

fn parse_line(line: &str) -> TextBlock {
    let trimmed = line.trim_start_matches(' ');
    let indent = ((line.len() - trimmed.len()) / 2).min(u8::MAX as usize) as u8;

    let (kind, rest) = if let Some(rest) = trimmed.strip_prefix("## ") {
        (BlockKind::SubHeader, rest)
    } else if let Some(rest) = trimmed.strip_prefix("# ") {
        (BlockKind::Header, rest)
    } else if let Some(rest) = trimmed.strip_prefix("- ") {
        (BlockKind::UnorderedListItem, rest)
    } else if let Some(rest) = strip_number_prefix(trimmed) {
        (BlockKind::OrderedListItem, rest)
    } else {
        (BlockKind::Paragraph, trimmed)
    };

    TextBlock::from_soup(kind, indent, parse_spans(&unescape(rest)))
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Undo `escape`; any other backslash is kept as typed
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('\\') => {
                chars.next();
                out.push('\\');
            }
            _ => out.push('\\'),
        }
    }
    out
}

/// "12. rest" -> "rest"
fn strip_number_prefix(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    line[digits..].strip_prefix(". ")
}

fn parse_spans(text: &str) -> TextSoup {
    let mut spans = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let Some((label, target, len)) = parse_link(&rest[open..]) else {
            spans.push(TextSpan::plain(&rest[..open + 1]));
            rest = &rest[open + 1..];
            continue;
        };
        spans.push(TextSpan::plain(&rest[..open]));
        spans.push(TextSpan::link(label, target));
        rest = &rest[open + len..];
    }
    spans.push(TextSpan::plain(rest));
    TextSoup::from_spans(spans)
}

/// "[label](target)..." -> (label, target, bytes consumed)
fn parse_link(text: &str) -> Option<(&str, &str, usize)> {
    let close = text.find("](")?;
    let label = &text[1..close];
    if label.is_empty() || label.contains('[') {
        return None;
    }
    let after = &text[close + 2..];
    let end = after.find(')')?;
    Some((label, &after[..end], close + 2 + end + 1))
}

/// Render a document back into outline text
pub fn to_outline(doc: &Document) -> String {
    let mut out = String::new();
    for (i, block) in doc.blocks().iter().enumerate() {
        out.push_str(&"  ".repeat(block.indent_level() as usize));
        match block.kind() {
            BlockKind::Header => out.push_str("# "),
            BlockKind::SubHeader => out.push_str("## "),
            BlockKind::UnorderedListItem => out.push_str("- "),
            BlockKind::OrderedListItem => {
                let marker = doc.list_marker(i).unwrap_or_else(|| "1.".to_string());
                out.push_str(&marker);
                out.push(' ');
            }
            BlockKind::Paragraph => {}
        }
        for span in block.content().spans() {
            match span.kind() {
                SpanKind::Default => out.push_str(&escape(&span.text)),
                SpanKind::Link { target } => {
                    let _ = write!(out, "[{}]({})", escape(&span.text), target);
                }
            }
        }
        out.push('\n');
    }
    out
}

/// Human-readable dump of how every block wrapped
pub fn layout_report(doc: &Document) -> String {
    let ctx = doc.layout_context();
    let mut out = String::new();
    for (i, block) in doc.blocks().iter().enumerate() {
        let _ = write!(
            out,
            "[{}] {} indent={} top={} height={}",
            i,
            block.kind(),
            block.indent_level(),
            doc.block_top(i),
            block.total_height(&ctx)
        );
        if let Some(marker) = doc.list_marker(i) {
            let _ = write!(out, " marker={marker:?}");
        }
        out.push('\n');

        for line in block.lines(&ctx) {
            let _ = writeln!(
                out,
                "    {:>3}..{:<3} {:?}",
                line.start,
                line.end(),
                line.text()
            );
        }
    }
    out
}
