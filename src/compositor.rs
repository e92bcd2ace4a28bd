//! Recursive tree traversal producing positioned writes.
//!
//! The compositor walks an already-laid-out [`LayoutNode`] tree depth-first
//! in pre-order and turns it into clipped, z-tagged writes against an
//! [`OutputBuffer`]. Each step of the walk carries an accumulated context:
//! the absolute offset of the parent's content origin, the transformer
//! chain, pending region markers, the active clip region, wrap settings
//! inherited from the parent, and the current z layer.
//!
//! The traversal is single-threaded and synchronous: one pass per render,
//! no I/O, no shared state between passes. Content that cannot be shown is
//! dropped silently; a pass always completes and returns a string.

use std::borrow::Cow;

use smallvec::SmallVec;

use crate::ansi::{close_region_tag, open_region_tag, slice_visible};
use crate::clip::{clip_text, ClipRegion, Visibility};
use crate::node::{LayoutNode, NodeClass};
use crate::output::OutputBuffer;
use crate::style::{Overflow, OutputTransform, Style, TextWrap};
use crate::text::{squash_text_nodes, widest_line, wrap_text};

/// Transformer chains are almost always empty or a single entry.
type TransformChain = SmallVec<[OutputTransform; 2]>;

/// Options for a render pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeOptions {
    /// Skip nodes marked static (append-only historical output rendered
    /// separately from the interactive region).
    pub skip_static: bool,
    /// Composite in layered (z-aware) mode: writes are ordered by z at
    /// finalize instead of by call order alone.
    pub layered: bool,
}

/// The finalized result of a render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Trimmed, newline-joined text block.
    pub text: String,
    /// Number of rows in the block (the viewport height).
    pub height: usize,
}

/// Rasterize `root` into a `width`×`height` text grid.
///
/// The single entry point of the crate: walks the tree, writes every
/// visible text run into a fresh [`OutputBuffer`], and finalizes it. The
/// buffer lives only for this pass.
pub fn composite(
    root: &LayoutNode,
    width: usize,
    height: usize,
    options: CompositeOptions,
) -> Rendered {
    #[cfg(feature = "tracing")]
    tracing::trace!(width, height, layered = options.layered, "render pass");

    let mut output = if options.layered {
        OutputBuffer::layered(width, height)
    } else {
        OutputBuffer::new(width, height)
    };

    let ctx = RenderContext {
        offset_x: 0,
        offset_y: 0,
        transformers: TransformChain::new(),
        open_region: String::new(),
        close_region: String::new(),
        clip: None,
        inherited_wrap: None,
        z: 0,
    };
    render_node(root, &mut output, &ctx, options.skip_static);

    let text = output.finalize().to_owned();
    let height = output.height();
    Rendered { text, height }
}

/// Accumulated traversal state, rebuilt per child while descending.
struct RenderContext {
    offset_x: i32,
    offset_y: i32,
    transformers: TransformChain,
    open_region: String,
    close_region: String,
    clip: Option<ClipRegion>,
    /// Wrap mode and max content width inherited from the parent, applied
    /// to elements carrying literal text.
    inherited_wrap: Option<(TextWrap, usize)>,
    z: i32,
}

fn render_node(node: &LayoutNode, output: &mut OutputBuffer, ctx: &RenderContext, skip_static: bool) {
    if skip_static && node.is_static {
        return;
    }

    let geometry = &node.geometry;
    let style = &node.style;

    // Positions are relative to the parent's content origin.
    let box_left = ctx.offset_x + geometry.left;
    let box_top = ctx.offset_y + geometry.top;

    // hidden/scroll establish a fresh clip region from the unshifted box;
    // it replaces any inherited region rather than intersecting with it.
    let clip = if style.overflow.clips() {
        Some(ClipRegion::from_box(
            box_left,
            box_top,
            geometry.width,
            geometry.height,
        ))
    } else {
        ctx.clip
    };

    // Scroll offsets shift rendered content without moving the clip region.
    let (x, y) = if style.overflow == Overflow::Scroll {
        (
            box_left - style.scroll_offset_left,
            box_top - style.scroll_offset_top,
        )
    } else {
        (box_left, box_top)
    };

    let z = style.z_index.unwrap_or(ctx.z);

    match node.classify() {
        NodeClass::TextLeaf => {
            let text = node.text.as_deref().unwrap_or_default();
            let text = bracket_regions(ctx, style, text);
            write_lines(output, x, y, z, &text, clip.as_ref(), &ctx.transformers);
        }
        NodeClass::TextElement => {
            let mut text = node.text.clone().unwrap_or_default();
            // Text elements always wrap an inner string child, so the wrap
            // settings live on the parent.
            if let Some((mode, max_width)) = ctx.inherited_wrap {
                if widest_line(&text) > max_width {
                    text = wrap_text(&text, max_width, mode);
                }
            }
            let transformers = with_own_transform(ctx, style);
            let text = bracket_regions(ctx, style, &text);
            write_lines(output, x, y, z, &text, clip.as_ref(), &transformers);
        }
        NodeClass::SquashableGroup => {
            let mut text = squash_text_nodes(node);
            if let Some(mode) = style.text_wrap {
                let max_width = geometry.width.max(0) as usize;
                if widest_line(&text) > max_width {
                    text = wrap_text(&text, max_width, mode);
                }
            }
            let transformers = with_own_transform(ctx, style);
            let text = bracket_regions(ctx, style, &text);
            write_lines(output, x, y, z, &text, clip.as_ref(), &transformers);
        }
        NodeClass::Container => {
            let transformers = with_own_transform(ctx, style);
            let own_open = style.region_name.as_deref().map(open_region_tag);
            let own_close = style.region_name.as_deref().map(close_region_tag);

            let last = node.children.len().saturating_sub(1);
            for (index, child) in node.children.iter().enumerate() {
                // The node's own open tag goes to the first child only and
                // its close tag to the last, composed with inherited
                // markers, so a multi-child region brackets exactly once.
                let open_region = if index == 0 {
                    format!("{}{}", ctx.open_region, own_open.as_deref().unwrap_or(""))
                } else {
                    String::new()
                };
                let close_region = if index == last {
                    format!("{}{}", own_close.as_deref().unwrap_or(""), ctx.close_region)
                } else {
                    String::new()
                };

                let child_ctx = RenderContext {
                    offset_x: x,
                    offset_y: y,
                    transformers: transformers.clone(),
                    open_region,
                    close_region,
                    clip,
                    inherited_wrap: style
                        .text_wrap
                        .map(|mode| (mode, geometry.width.max(0) as usize)),
                    z,
                };
                render_node(child, output, &child_ctx, skip_static);
            }
        }
    }
}

/// Prepend the node's own transform so the innermost one runs first.
fn with_own_transform(ctx: &RenderContext, style: &Style) -> TransformChain {
    let mut chain = ctx.transformers.clone();
    if let Some(transform) = &style.transform {
        chain.insert(0, transform.clone());
    }
    chain
}

/// Bracket `text` in the accumulated region markers plus the node's own.
fn bracket_regions(ctx: &RenderContext, style: &Style, text: &str) -> String {
    let own_open = style.region_name.as_deref().map(open_region_tag);
    let own_close = style.region_name.as_deref().map(close_region_tag);
    if ctx.open_region.is_empty()
        && ctx.close_region.is_empty()
        && own_open.is_none()
        && own_close.is_none()
    {
        return text.to_owned();
    }
    format!(
        "{}{}{}{}{}",
        ctx.open_region,
        own_open.as_deref().unwrap_or(""),
        text,
        own_close.as_deref().unwrap_or(""),
        ctx.close_region
    )
}

/// Transform, clip, and issue one buffer write per physical line.
fn write_lines(
    output: &mut OutputBuffer,
    x: i32,
    y: i32,
    z: i32,
    text: &str,
    clip: Option<&ClipRegion>,
    transformers: &TransformChain,
) {
    if text.is_empty() {
        return;
    }

    for (index, line) in text.split('\n').enumerate() {
        let row = y + index as i32;

        let mut line = Cow::Borrowed(line);
        for transform in transformers {
            line = Cow::Owned(transform(&line));
        }

        match clip_text(clip, x, row, &line) {
            Visibility::Hidden => {}
            Visibility::Visible => output.write_at(x, row, z, &line),
            Visibility::Clipped { start, end } => {
                output.write_at(x + start as i32, row, z, &slice_visible(&line, start, end));
            }
        }
    }
}
