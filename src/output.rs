//! Virtual output buffer.
//!
//! Collects the positioned write requests produced by the tree compositor
//! and assembles the final text block that the caller hands to the terminal
//! (or diffs against the previous frame). Nothing here touches stdout.
//!
//! A buffer lives for exactly one render pass: `Created → Writing →
//! Finalized`. In immediate mode every write is composited onto the row grid
//! as it arrives, so overlapping writes resolve by call order (last write
//! wins). In layered mode writes are deferred and composited at
//! [`OutputBuffer::finalize`] in ascending z order; ties keep original call
//! order, which overlapping same-z writes depend on.

use std::borrow::Cow;

use thiserror::Error;

use crate::ansi::{slice_visible, visible_width};

/// Errors surfaced by the strict write path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutputError {
    /// A write was issued after [`OutputBuffer::finalize`].
    #[error("write issued after the buffer was finalized")]
    Finalized,
}

/// A positioned, z-tagged write deferred until finalize in layered mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    /// Absolute buffer column of the first character.
    pub x: i32,
    /// Absolute buffer row of the first line.
    pub y: i32,
    /// Stacking order; higher z composites later.
    pub z: i32,
    /// Text to place, possibly multi-line.
    pub text: String,
}

/// A fixed-size character grid accepting positioned writes.
pub struct OutputBuffer {
    width: usize,
    rows: Vec<String>,
    pending: Vec<WriteRequest>,
    layered: bool,
    finalized: Option<String>,
}

impl OutputBuffer {
    /// Create an immediate-mode buffer of `width`×`height` blank cells.
    ///
    /// Rows are pre-initialized to full width so margin or padding at the
    /// bottom of the tree is preserved in the final output.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            rows: vec![" ".repeat(width); height],
            pending: Vec::new(),
            layered: false,
            finalized: None,
        }
    }

    /// Create a layered (z-aware) buffer. Writes are buffered and composited
    /// at [`finalize`](Self::finalize), ordered by ascending z with ties
    /// broken by call order.
    pub fn layered(width: usize, height: usize) -> Self {
        Self {
            layered: true,
            ..Self::new(width, height)
        }
    }

    /// Buffer width in columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Buffer height in rows.
    #[inline]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Whether [`finalize`](Self::finalize) has been called.
    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Overlay `text` starting at column `x` of row `y`, at z 0.
    ///
    /// Multi-line text advances one row per line. Empty text is a no-op;
    /// lines landing outside `[0, height)` are dropped (later lines of the
    /// same block keep their rows). Calls after finalize are ignored.
    pub fn write(&mut self, x: i32, y: i32, text: &str) {
        self.write_at(x, y, 0, text);
    }

    /// Like [`write`](Self::write) with an explicit z. Immediate-mode
    /// buffers ignore z.
    pub fn write_at(&mut self, x: i32, y: i32, z: i32, text: &str) {
        if self.finalized.is_none() {
            self.push(x, y, z, text);
        }
    }

    /// Strict variant of [`write_at`](Self::write_at): reports a write after
    /// finalize instead of ignoring it.
    pub fn try_write(&mut self, x: i32, y: i32, z: i32, text: &str) -> Result<(), OutputError> {
        if self.finalized.is_some() {
            return Err(OutputError::Finalized);
        }
        self.push(x, y, z, text);
        Ok(())
    }

    fn push(&mut self, x: i32, y: i32, z: i32, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.layered {
            self.pending.push(WriteRequest {
                x,
                y,
                z,
                text: text.to_owned(),
            });
        } else {
            blit(&mut self.rows, self.width, x, y, text);
        }
    }

    /// Composite any pending writes and return the final text block: every
    /// row trimmed of trailing whitespace, rows joined by `\n`.
    ///
    /// Idempotent; repeated calls return the same string.
    pub fn finalize(&mut self) -> &str {
        if self.finalized.is_none() {
            if self.layered {
                let mut pending = std::mem::take(&mut self.pending);
                // Stable sort: equal z keeps original call order.
                pending.sort_by_key(|w| w.z);
                for w in &pending {
                    blit(&mut self.rows, self.width, w.x, w.y, &w.text);
                }
            }
            let text = self
                .rows
                .iter()
                .map(|row| row.trim_end())
                .collect::<Vec<_>>()
                .join("\n");
            self.finalized = Some(text);
        }
        self.finalized.as_deref().unwrap_or_default()
    }
}

/// Apply a (possibly multi-line) write onto the row grid.
fn blit(rows: &mut [String], width: usize, x: i32, y: i32, text: &str) {
    for (offset, line) in text.split('\n').enumerate() {
        let row_y = y + offset as i32;
        if row_y < 0 || row_y as usize >= rows.len() {
            continue;
        }
        blit_line(&mut rows[row_y as usize], width, x, line);
    }
}

/// Overlay a single line onto a row, keeping the row exactly `width`
/// visible columns: `slice(row, 0, x) + line + slice(row, x + len, width)`.
fn blit_line(row: &mut String, width: usize, x: i32, line: &str) {
    if line.is_empty() {
        return;
    }

    let mut line = Cow::Borrowed(line);
    let mut x = x;
    if x < 0 {
        // Clip against the left buffer edge.
        let skip = (-x) as usize;
        let len = visible_width(&line);
        if skip >= len {
            return;
        }
        line = Cow::Owned(slice_visible(&line, skip, len));
        x = 0;
    }
    let x = x as usize;
    if x >= width {
        return;
    }

    let mut len = visible_width(&line);
    let avail = width - x;
    if len > avail {
        // Clip against the right buffer edge.
        line = Cow::Owned(slice_visible(&line, 0, avail));
        len = avail;
    }

    let left = slice_visible(row, 0, x);
    let right = slice_visible(row, x + len, width);

    let mut new_row = left;
    let left_width = visible_width(&new_row);
    if left_width < x {
        // Columns past the row's visible width are space-padded.
        new_row.push_str(&" ".repeat(x - left_width));
    }
    new_row.push_str(&line);
    new_row.push_str(&right);
    *row = new_row;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_buffer_trims_to_newlines() {
        let mut buf = OutputBuffer::new(10, 3);
        assert_eq!(buf.finalize(), "\n\n");
    }

    #[test]
    fn test_simple_write() {
        let mut buf = OutputBuffer::new(10, 3);
        buf.write(2, 1, "abc");
        assert_eq!(buf.finalize(), "\n  abc\n");
    }

    #[test]
    fn test_last_write_wins_on_overlap() {
        let mut buf = OutputBuffer::new(20, 1);
        buf.write(2, 0, "hello Frank!");
        buf.write(8, 0, "Mary!");
        assert_eq!(buf.finalize(), "  hello Mary!!");
    }

    #[test]
    fn test_empty_text_is_noop() {
        let mut buf = OutputBuffer::new(5, 1);
        buf.write(0, 0, "");
        assert_eq!(buf.finalize(), "");
    }

    #[test]
    fn test_rows_outside_height_are_dropped() {
        let mut buf = OutputBuffer::new(5, 2);
        buf.write(0, -1, "up");
        buf.write(0, 2, "down");
        buf.write(0, 1, "ok");
        assert_eq!(buf.finalize(), "\nok");
    }

    #[test]
    fn test_multiline_write_skips_missing_rows_but_keeps_later_ones() {
        let mut buf = OutputBuffer::new(5, 2);
        // First line lands above the buffer; second line must still land on
        // row 0, not shift up.
        buf.write(0, -1, "a\nb\nc");
        assert_eq!(buf.finalize(), "b\nc");
    }

    #[test]
    fn test_write_clipped_at_right_edge() {
        let mut buf = OutputBuffer::new(5, 1);
        buf.write(3, 0, "abcdef");
        let out = buf.finalize();
        assert_eq!(out, "   ab");
        assert!(visible_width(out) <= 5);
    }

    #[test]
    fn test_negative_x_clips_at_left_edge() {
        let mut buf = OutputBuffer::new(5, 1);
        buf.write(-2, 0, "abcdef");
        assert_eq!(buf.finalize(), "cdef");
    }

    #[test]
    fn test_write_past_width_is_dropped() {
        let mut buf = OutputBuffer::new(3, 1);
        buf.write(5, 0, "x");
        assert_eq!(buf.finalize(), "");
    }

    #[test]
    fn test_styled_overlay_preserves_neighbor_styles() {
        let mut buf = OutputBuffer::new(10, 1);
        buf.write(0, 0, "\x1b[31mredredred\x1b[0m");
        buf.write(3, 0, "X");
        let out = buf.finalize();
        // Left of the overlay stays red, is closed, and re-opens after it.
        assert_eq!(out, "\x1b[31mred\x1b[0mX\x1b[31medred\x1b[0m");
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let mut buf = OutputBuffer::new(4, 2);
        buf.write(0, 0, "hi");
        let first = buf.finalize().to_owned();
        assert_eq!(buf.finalize(), first);
        assert_eq!(buf.finalize(), first);
    }

    #[test]
    fn test_write_after_finalize_is_ignored() {
        let mut buf = OutputBuffer::new(4, 1);
        buf.write(0, 0, "a");
        let first = buf.finalize().to_owned();
        buf.write(1, 0, "b");
        assert_eq!(buf.finalize(), first);
    }

    #[test]
    fn test_try_write_after_finalize_errors() {
        let mut buf = OutputBuffer::new(4, 1);
        assert_eq!(buf.try_write(0, 0, 0, "a"), Ok(()));
        buf.finalize();
        assert_eq!(buf.try_write(1, 0, 0, "b"), Err(OutputError::Finalized));
    }

    #[test]
    fn test_layered_orders_by_z() {
        let mut buf = OutputBuffer::layered(10, 1);
        buf.write_at(0, 0, 2, "above");
        buf.write_at(0, 0, 1, "below");
        assert_eq!(buf.finalize(), "above");
    }

    #[test]
    fn test_layered_equal_z_keeps_call_order() {
        let mut buf = OutputBuffer::layered(20, 1);
        buf.write_at(2, 0, 0, "hello Frank!");
        buf.write_at(8, 0, 0, "Mary!");
        assert_eq!(buf.finalize(), "  hello Mary!!");
    }

    #[test]
    fn test_layered_negative_z_below_default() {
        let mut buf = OutputBuffer::layered(10, 1);
        buf.write_at(0, 0, 0, "top");
        buf.write_at(0, 0, -1, "bottom");
        // "bottom" composites first despite being written later; "top"
        // overlays only its own three columns.
        assert_eq!(buf.finalize(), "toptom");
    }

    #[test]
    fn test_immediate_mode_ignores_z() {
        let mut buf = OutputBuffer::new(10, 1);
        buf.write_at(0, 0, 5, "first");
        buf.write_at(0, 0, 1, "last!");
        assert_eq!(buf.finalize(), "last!");
    }

    #[test]
    fn test_wide_chars_overlay() {
        let mut buf = OutputBuffer::new(6, 1);
        buf.write(0, 0, "日本語");
        buf.write(2, 0, "xx");
        // The middle glyph is replaced column-exactly.
        assert_eq!(buf.finalize(), "日xx語");
    }
}
