//! Text squashing, measurement, and wrapping.
//!
//! Squashing merges a row of adjacent text-bearing children into one logical
//! string so the output buffer receives a single write (and so region
//! markers can bracket the whole run instead of each fragment). Wrapping
//! re-flows or truncates that string against a maximum content width while
//! keeping embedded SGR styling valid on every produced line.

use crate::ansi::{char_width, visible_width, wrap_region, SgrState, Token, Tokens, RESET};
use crate::node::{LayoutNode, NodeKind};
use crate::style::TextWrap;

/// Visible width of the widest line in `text`.
pub fn widest_line(text: &str) -> usize {
    text.split('\n').map(visible_width).max().unwrap_or(0)
}

/// Merge a row-oriented node's text-bearing children into one string.
///
/// The first child's computed offset becomes leading indentation (`top`
/// newlines then `left` spaces); only the first child can carry margin or
/// padding in this layout, so later children are flush against it. Each
/// child's text passes through its own output transform and is bracketed in
/// region markers if the child declares a region name. Inline elements
/// without direct text squash their own subtree recursively.
pub fn squash_text_nodes(node: &LayoutNode) -> String {
    let mut text = String::new();
    let Some(first) = node.children.first() else {
        return text;
    };

    let offset_x = first.geometry.left.max(0) as usize;
    let offset_y = first.geometry.top.max(0) as usize;
    text.push_str(&"\n".repeat(offset_y));
    text.push_str(&" ".repeat(offset_x));

    for child in &node.children {
        let mut node_text = match child.kind {
            NodeKind::Text => child.text.clone().unwrap_or_default(),
            NodeKind::Span => child
                .text
                .clone()
                .unwrap_or_else(|| squash_text_nodes(child)),
            NodeKind::Box => String::new(),
        };

        if child.kind != NodeKind::Text {
            // Squashed fragments bypass the per-line transformer chain, so
            // the child's own transform and region markers apply here.
            if let Some(transform) = &child.style.transform {
                node_text = transform(&node_text);
            }
            if let Some(name) = &child.style.region_name {
                node_text = wrap_region(name, &node_text);
            }
        }

        text.push_str(&node_text);
    }

    text
}

/// Re-flow or truncate `text` at `max_width` columns.
///
/// `Wrap` word-wraps each line, hard-breaking words longer than a full
/// line; whitespace is preserved, with break-point spaces left at the end
/// of the split line. Truncation modes shorten each overlong line with an
/// `…` ellipsis. SGR styling is closed at every produced line end and
/// re-opened on the next line, so each line renders correctly alone.
///
/// Wrapping is idempotent: output re-wrapped at the same width is unchanged.
pub fn wrap_text(text: &str, max_width: usize, mode: TextWrap) -> String {
    if max_width == 0 {
        return text.to_owned();
    }
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| match mode {
            TextWrap::Wrap => wrap_line(line, max_width),
            TextWrap::Truncate | TextWrap::TruncateEnd => {
                truncate_line(line, max_width, Position::End)
            }
            TextWrap::TruncateStart => truncate_line(line, max_width, Position::Start),
            TextWrap::TruncateMiddle => truncate_line(line, max_width, Position::Middle),
        })
        .collect();
    lines.join("\n")
}

enum Position {
    Start,
    Middle,
    End,
}

fn truncate_line(line: &str, max_width: usize, position: Position) -> String {
    let width = visible_width(line);
    if width <= max_width {
        return line.to_owned();
    }
    if max_width == 1 {
        return "…".to_owned();
    }

    let keep = max_width - 1;
    match position {
        Position::End => {
            let head = crate::ansi::slice_visible(line, 0, keep);
            format!("{head}…")
        }
        Position::Start => {
            let tail = crate::ansi::slice_visible(line, width - keep, width);
            format!("…{tail}")
        }
        Position::Middle => {
            let left = (keep + 1) / 2;
            let right = keep - left;
            let head = crate::ansi::slice_visible(line, 0, left);
            let tail = crate::ansi::slice_visible(line, width - right, width);
            format!("{head}…{tail}")
        }
    }
}

/// One visible character with its style state and any zero-width sequences
/// (region markers, non-SGR escapes) immediately preceding it.
struct WrapCell {
    prefix: String,
    ch: char,
    width: usize,
    state: SgrState,
}

/// Split a line into wrap cells plus any trailing zero-width sequences.
fn decompose(line: &str) -> (Vec<WrapCell>, String) {
    let mut cells = Vec::new();
    let mut pending = String::new();
    let mut state = SgrState::default();

    for token in Tokens::new(line) {
        match token {
            Token::Csi(raw) => {
                if raw.ends_with('m') {
                    state.apply_raw(raw);
                } else {
                    pending.push_str(raw);
                }
            }
            Token::Apc(raw) | Token::Esc(raw) => pending.push_str(raw),
            Token::Char(c) => cells.push(WrapCell {
                prefix: std::mem::take(&mut pending),
                ch: c,
                width: char_width(c),
                state: state.clone(),
            }),
        }
    }

    (cells, pending)
}

/// Emit a row of cells with canonical styling: styles open where they start,
/// reset where they change or at the row end.
fn emit_row(cells: &[WrapCell], trailing: &str) -> String {
    let mut out = String::new();
    let mut current = SgrState::default();

    for cell in cells {
        out.push_str(&cell.prefix);
        if cell.state != current {
            if !current.is_default() {
                out.push_str(RESET);
            }
            cell.state.emit_into(&mut out);
            current = cell.state.clone();
        }
        out.push(cell.ch);
    }

    out.push_str(trailing);
    if !current.is_default() {
        out.push_str(RESET);
    }
    out
}

fn wrap_line(line: &str, max_width: usize) -> String {
    let (cells, trailing) = decompose(line);

    let mut rows: Vec<Vec<WrapCell>> = vec![Vec::new()];
    let mut row_width = 0usize;
    // Index of the last space in the current row, the candidate break point.
    let mut last_space: Option<usize> = None;

    for cell in cells {
        let is_space = cell.ch == ' ';
        let overflows = row_width + cell.width > max_width;

        // Spaces may run past the width; they land at the end of the row
        // and are invisible after trailing trim.
        if overflows && !is_space && row_width > 0 {
            let mut moved: Vec<WrapCell> = Vec::new();
            if let (Some(space), Some(row)) = (last_space, rows.last_mut()) {
                let tail_width: usize = row[space + 1..].iter().map(|c| c.width).sum();
                if tail_width + cell.width <= max_width {
                    // The word in progress fits on a fresh line; move it.
                    moved = row.split_off(space + 1);
                }
            }
            row_width = moved.iter().map(|c| c.width).sum();
            rows.push(moved);
            last_space = None;
        }

        row_width += cell.width;
        if let Some(row) = rows.last_mut() {
            row.push(cell);
            if is_space {
                last_space = Some(row.len() - 1);
            }
        }
    }

    let last = rows.len() - 1;
    rows.iter()
        .enumerate()
        .map(|(i, row)| emit_row(row, if i == last { trailing.as_str() } else { "" }))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ansi::{close_region_tag, open_region_tag};
    use crate::style::Style;
    use std::sync::Arc;

    #[test]
    fn test_widest_line() {
        assert_eq!(widest_line(""), 0);
        assert_eq!(widest_line("ab\nabcd\nc"), 4);
        assert_eq!(widest_line("\x1b[31mabc\x1b[0m\nd"), 3);
    }

    #[test]
    fn test_wrap_short_text_unchanged() {
        assert_eq!(wrap_text("hello", 10, TextWrap::Wrap), "hello");
    }

    #[test]
    fn test_wrap_breaks_at_spaces() {
        assert_eq!(wrap_text("hello world", 5, TextWrap::Wrap), "hello \nworld");
    }

    #[test]
    fn test_wrap_hard_breaks_long_words() {
        assert_eq!(wrap_text("abcdefgh", 3, TextWrap::Wrap), "abc\ndef\ngh");
    }

    #[test]
    fn test_wrap_preserves_existing_newlines() {
        assert_eq!(wrap_text("ab\ncd", 10, TextWrap::Wrap), "ab\ncd");
    }

    #[test]
    fn test_wrap_styles_reopen_per_line() {
        let wrapped = wrap_text("\x1b[32mhello world\x1b[0m", 5, TextWrap::Wrap);
        assert_eq!(
            wrapped,
            "\x1b[32mhello \x1b[0m\n\x1b[32mworld\x1b[0m"
        );
    }

    #[test]
    fn test_wrap_is_idempotent() {
        let cases = [
            "hello world wrapping test",
            "\x1b[1;31mstyled text that will wrap here\x1b[0m",
            "short",
            "one-extremelylongwordthatmustbreak",
        ];
        for case in cases {
            let once = wrap_text(case, 7, TextWrap::Wrap);
            let twice = wrap_text(&once, 7, TextWrap::Wrap);
            assert_eq!(once, twice, "re-wrap changed: {case:?}");
        }
    }

    #[test]
    fn test_wrap_zero_width_is_noop() {
        assert_eq!(wrap_text("abc def", 0, TextWrap::Wrap), "abc def");
    }

    #[test]
    fn test_wrap_carries_region_markers() {
        let text = format!("{}hello world{}", open_region_tag("r"), close_region_tag("r"));
        let wrapped = wrap_text(&text, 5, TextWrap::Wrap);
        assert_eq!(
            wrapped,
            format!("{}hello \nworld{}", open_region_tag("r"), close_region_tag("r"))
        );
    }

    #[test]
    fn test_truncate_end() {
        assert_eq!(wrap_text("abcdefgh", 5, TextWrap::TruncateEnd), "abcd…");
        assert_eq!(wrap_text("abcdefgh", 5, TextWrap::Truncate), "abcd…");
    }

    #[test]
    fn test_truncate_start() {
        assert_eq!(wrap_text("abcdefgh", 5, TextWrap::TruncateStart), "…efgh");
    }

    #[test]
    fn test_truncate_middle() {
        assert_eq!(wrap_text("abcdefgh", 5, TextWrap::TruncateMiddle), "ab…gh");
    }

    #[test]
    fn test_truncate_short_line_unchanged() {
        assert_eq!(wrap_text("abc", 5, TextWrap::TruncateEnd), "abc");
    }

    #[test]
    fn test_truncate_tiny_widths() {
        assert_eq!(wrap_text("abcdefgh", 1, TextWrap::TruncateEnd), "…");
    }

    #[test]
    fn test_truncate_per_line() {
        assert_eq!(
            wrap_text("abcdefgh\nxy", 5, TextWrap::TruncateEnd),
            "abcd…\nxy"
        );
    }

    #[test]
    fn test_squash_plain_children() {
        let node = LayoutNode::element()
            .child(LayoutNode::text("hello"))
            .child(LayoutNode::text(" world"));
        assert_eq!(squash_text_nodes(&node), "hello world");
    }

    #[test]
    fn test_squash_uses_first_child_offset() {
        let node = LayoutNode::element()
            .child(LayoutNode::text("abc").at(2, 1))
            .child(LayoutNode::text("def"));
        assert_eq!(squash_text_nodes(&node), "\n  abcdef");
    }

    #[test]
    fn test_squash_applies_child_transform() {
        let mut span = LayoutNode::span().content("hi");
        span.style = Style {
            transform: Some(Arc::new(|s: &str| s.to_uppercase())),
            ..Style::default()
        };
        let node = LayoutNode::element().child(span);
        assert_eq!(squash_text_nodes(&node), "HI");
    }

    #[test]
    fn test_squash_wraps_child_region() {
        let span = LayoutNode::span().content("link").region_name("url");
        let node = LayoutNode::element()
            .child(LayoutNode::text("see "))
            .child(span);
        assert_eq!(
            squash_text_nodes(&node),
            format!("see {}link{}", open_region_tag("url"), close_region_tag("url"))
        );
    }

    #[test]
    fn test_squash_recurses_into_nested_spans() {
        let inner = LayoutNode::span()
            .child(LayoutNode::text("a"))
            .child(LayoutNode::text("b"));
        let node = LayoutNode::element().child(inner);
        assert_eq!(squash_text_nodes(&node), "ab");
    }

    #[test]
    fn test_squash_empty_node() {
        assert_eq!(squash_text_nodes(&LayoutNode::element()), "");
    }
}
