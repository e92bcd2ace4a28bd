//! Viewport clipping of per-line write requests.
//!
//! A node with `overflow: hidden` or `overflow: scroll` establishes a clip
//! region for every write issued by its descendants: its own absolute
//! bounding box. Nested clipping containers REPLACE the inherited region with
//! their own rectangle rather than intersecting with it; an inner viewport
//! defines its own window.

use crate::ansi::visible_width;

/// A clip rectangle in absolute buffer coordinates, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRegion {
    /// Leftmost visible column.
    pub left: i32,
    /// Topmost visible row.
    pub top: i32,
    /// Rightmost visible column (inclusive).
    pub right: i32,
    /// Bottommost visible row (inclusive).
    pub bottom: i32,
}

impl ClipRegion {
    /// Build a region from a box origin and dimensions.
    pub fn from_box(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            right: left + width - 1,
            bottom: top + height - 1,
        }
    }

    /// Number of visible columns.
    #[inline]
    pub fn width(&self) -> i32 {
        self.right - self.left + 1
    }

    /// Number of visible rows.
    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom - self.top + 1
    }
}

/// Outcome of clipping a single-row write against a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// The whole write is visible; no slicing needed.
    Visible,
    /// Part of the write is visible. `start..end` are column offsets into
    /// the write's own text, not buffer columns.
    Clipped {
        /// First visible column offset within the text.
        start: usize,
        /// One past the last visible column offset within the text.
        end: usize,
    },
    /// Nothing of the write is visible.
    Hidden,
}

/// Clip a single-line write at `(x, y)` spanning `width` columns against
/// `region`.
///
/// With no active region the write is fully visible. A write on a row
/// outside the region, or wholly left/right of it, is hidden. Degenerate
/// slice bounds (`end <= start`) are reported as hidden rather than
/// producing a negative-length slice.
pub fn clip_line(region: Option<&ClipRegion>, x: i32, y: i32, width: usize) -> Visibility {
    let Some(region) = region else {
        return Visibility::Visible;
    };

    if y < region.top || y > region.bottom {
        return Visibility::Hidden;
    }

    let width = width as i32;
    let text_right = x + width - 1;
    if text_right < region.left || x > region.right {
        return Visibility::Hidden;
    }

    let slice_start = (region.left - x).max(0);
    // The window is bounded by the region's right edge, so the visible
    // portion never extends past it regardless of where the write starts.
    let slice_end = slice_start + (width - slice_start).min(region.right - (x + slice_start) + 1);
    if slice_end <= slice_start {
        return Visibility::Hidden;
    }

    if slice_start == 0 && slice_end >= width {
        Visibility::Visible
    } else {
        Visibility::Clipped {
            start: slice_start as usize,
            end: slice_end as usize,
        }
    }
}

/// Convenience wrapper measuring `text` with [`visible_width`].
pub fn clip_text(region: Option<&ClipRegion>, x: i32, y: i32, text: &str) -> Visibility {
    clip_line(region, x, y, visible_width(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(left: i32, top: i32, width: i32, height: i32) -> ClipRegion {
        ClipRegion::from_box(left, top, width, height)
    }

    #[test]
    fn test_no_region_is_fully_visible() {
        assert_eq!(clip_line(None, -5, 100, 3), Visibility::Visible);
    }

    #[test]
    fn test_region_dimensions() {
        let r = region(2, 3, 5, 4);
        assert_eq!(r.right, 6);
        assert_eq!(r.bottom, 6);
        assert_eq!(r.width(), 5);
        assert_eq!(r.height(), 4);
    }

    #[test]
    fn test_row_outside_region_is_hidden() {
        let r = region(0, 2, 10, 3);
        assert_eq!(clip_line(Some(&r), 0, 1, 5), Visibility::Hidden);
        assert_eq!(clip_line(Some(&r), 0, 5, 5), Visibility::Hidden);
        assert_eq!(clip_line(Some(&r), 0, 2, 5), Visibility::Visible);
        assert_eq!(clip_line(Some(&r), 0, 4, 5), Visibility::Visible);
    }

    #[test]
    fn test_fully_left_or_right_is_hidden() {
        let r = region(10, 0, 5, 1);
        assert_eq!(clip_line(Some(&r), 2, 0, 5), Visibility::Hidden); // ends at 6
        assert_eq!(clip_line(Some(&r), 15, 0, 5), Visibility::Hidden); // starts past 14
    }

    #[test]
    fn test_overlap_on_left_edge() {
        // Text at 5, viewport left at 6: first visible text column is 1.
        let r = region(6, 0, 5, 1);
        assert_eq!(
            clip_line(Some(&r), 5, 0, 7),
            Visibility::Clipped { start: 1, end: 6 }
        );
    }

    #[test]
    fn test_overlap_on_right_edge() {
        let r = region(0, 0, 5, 1);
        assert_eq!(
            clip_line(Some(&r), 3, 0, 7),
            Visibility::Clipped { start: 0, end: 2 }
        );
    }

    #[test]
    fn test_write_starting_inside_region_clips_at_right_edge() {
        // Write begins right of the region's left edge; the visible
        // portion still ends at the region's right edge, columns 4-5.
        let r = region(2, 0, 4, 1);
        assert_eq!(
            clip_line(Some(&r), 4, 0, 10),
            Visibility::Clipped { start: 0, end: 2 }
        );
    }

    #[test]
    fn test_text_wider_than_region_on_both_sides() {
        let r = region(3, 0, 4, 1);
        assert_eq!(
            clip_line(Some(&r), 0, 0, 10),
            Visibility::Clipped { start: 3, end: 7 }
        );
    }

    #[test]
    fn test_contained_write_is_visible() {
        let r = region(0, 0, 10, 2);
        assert_eq!(clip_line(Some(&r), 2, 1, 5), Visibility::Visible);
    }

    #[test]
    fn test_zero_width_write_is_hidden() {
        let r = region(0, 0, 10, 1);
        assert_eq!(clip_line(Some(&r), 2, 0, 0), Visibility::Hidden);
    }

    #[test]
    fn test_degenerate_region_is_hidden() {
        // Zero-width region: right < left.
        let r = ClipRegion::from_box(5, 0, 0, 3);
        assert_eq!(clip_line(Some(&r), 0, 0, 10), Visibility::Hidden);
    }

    #[test]
    fn test_clip_text_measures_ansi() {
        let r = region(0, 0, 3, 1);
        // 5 visible columns of styled text, clipped to the first 3.
        assert_eq!(
            clip_text(Some(&r), 0, 0, "\x1b[31mhello\x1b[0m"),
            Visibility::Clipped { start: 0, end: 3 }
        );
    }
}
