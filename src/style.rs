//! Resolved style values consumed by the compositor.
//!
//! Styles are resolved by the external layout provider before a render pass
//! begins. The compositor only reads final values; it never walks ancestors
//! or merges style objects itself.

use std::fmt;
use std::sync::Arc;

/// Overflow behavior of an element's content box.
///
/// `Hidden` and `Scroll` introduce a clip region for descendants; `Visible`
/// passes any inherited clip region through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    /// Content may paint outside the element's box.
    #[default]
    Visible,
    /// Content outside the element's box is clipped.
    Hidden,
    /// Like `Hidden`, but rendered content is shifted by the element's
    /// scroll offsets before clipping.
    Scroll,
}

impl Overflow {
    /// Whether this overflow mode establishes a clip region for descendants.
    #[inline]
    pub fn clips(self) -> bool {
        matches!(self, Self::Hidden | Self::Scroll)
    }

    /// Parse an overflow keyword. Unknown values fall back to `Visible`.
    pub fn parse(value: &str) -> Self {
        match value {
            "hidden" => Self::Hidden,
            "scroll" => Self::Scroll,
            _ => Self::Visible,
        }
    }
}

/// Main axis direction of a flex container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    /// Children laid out left to right.
    #[default]
    Row,
    /// Children laid out right to left.
    RowReverse,
    /// Children laid out top to bottom.
    Column,
    /// Children laid out bottom to top.
    ColumnReverse,
}

impl FlexDirection {
    /// Whether the main axis is horizontal. Text squashing only applies to
    /// row-oriented containers.
    #[inline]
    pub fn is_row(self) -> bool {
        matches!(self, Self::Row | Self::RowReverse)
    }
}

/// Text wrapping mode applied when content is wider than its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextWrap {
    /// Word-wrap at the maximum width, hard-breaking words longer than a line.
    Wrap,
    /// Alias of [`TextWrap::TruncateEnd`].
    Truncate,
    /// Keep the end of each line, eliding the start with `…`.
    TruncateStart,
    /// Keep both ends of each line, eliding the middle with `…`.
    TruncateMiddle,
    /// Keep the start of each line, eliding the end with `…`.
    TruncateEnd,
}

/// A per-node output transform: a pure function applied to every rendered
/// line of the node's subtree before clipping.
///
/// Transforms compose while descending the tree; the innermost node's
/// transform runs first.
pub type OutputTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Resolved style fields the compositor reads.
///
/// Box-model fields (margin, padding, flex factors) are consumed by the
/// layout provider and never appear here; their effect is already baked into
/// node geometry.
#[derive(Clone, Default)]
pub struct Style {
    /// Overflow behavior for this element's content.
    pub overflow: Overflow,
    /// Main axis direction; decides squashing eligibility.
    pub flex_direction: FlexDirection,
    /// Wrapping mode for text content, if any.
    pub text_wrap: Option<TextWrap>,
    /// Rows of content scrolled out of view (only meaningful with
    /// `Overflow::Scroll`).
    pub scroll_offset_top: i32,
    /// Columns of content scrolled out of view (only meaningful with
    /// `Overflow::Scroll`).
    pub scroll_offset_left: i32,
    /// Region name for annotation markers bracketing this node's output.
    pub region_name: Option<String>,
    /// Output transform applied to rendered lines of this node's subtree.
    pub transform: Option<OutputTransform>,
    /// Stacking order in layered compositing. `None` inherits the parent's z.
    pub z_index: Option<i32>,
}

impl fmt::Debug for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Style")
            .field("overflow", &self.overflow)
            .field("flex_direction", &self.flex_direction)
            .field("text_wrap", &self.text_wrap)
            .field("scroll_offset_top", &self.scroll_offset_top)
            .field("scroll_offset_left", &self.scroll_offset_left)
            .field("region_name", &self.region_name)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .field("z_index", &self.z_index)
            .finish()
    }
}
