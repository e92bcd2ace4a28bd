//! Terminal output compositor.
//!
//! weft rasterizes an already-laid-out tree of visual nodes into a
//! fixed-size grid of terminal text. Box-model math belongs to an external
//! layout provider and tree construction to a component framework; this
//! crate owns everything between the two and the final string: overflow
//! clipping, scroll-offset translation, z-ordering, text squashing and
//! wrapping, and ANSI-safe slicing.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │  LayoutNode  │ -> │  Compositor  │ -> │ OutputBuffer │ -> String
//! │  (computed)  │    │  (traverse)  │    │  (composite) │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use weft::{composite, CompositeOptions, LayoutNode};
//!
//! let root = LayoutNode::element()
//!     .size(10, 4)
//!     .child(
//!         LayoutNode::element()
//!             .at(2, 2)
//!             .size(3, 1)
//!             .child(LayoutNode::text("abc")),
//!     );
//!
//! let rendered = composite(&root, 10, 4, CompositeOptions::default());
//! assert_eq!(rendered.text, "\n\n  abc\n");
//! ```
//!
//! # Error handling
//!
//! The compositor degrades silently rather than failing: writes outside the
//! viewport are dropped, unknown overflow values fall back to `visible`,
//! and degenerate clip math hides the write. A thrown error mid-redraw
//! would corrupt the terminal; no recoverable errors ever surface from a
//! render pass. The only fallible surface is the strict
//! [`OutputBuffer::try_write`] path, which rejects writes after finalize.

pub mod ansi;
pub mod clip;
pub mod compositor;
pub mod node;
pub mod output;
pub mod style;
pub mod text;

pub use ansi::{close_region_tag, open_region_tag, slice_visible, strip_ansi, visible_width, wrap_region};
pub use clip::{clip_line, clip_text, ClipRegion, Visibility};
pub use compositor::{composite, CompositeOptions, Rendered};
pub use node::{Geometry, LayoutNode, NodeClass, NodeKind};
pub use output::{OutputBuffer, OutputError, WriteRequest};
pub use style::{FlexDirection, Overflow, OutputTransform, Style, TextWrap};
pub use text::{squash_text_nodes, widest_line, wrap_text};
