//! The laid-out node tree consumed by the compositor.
//!
//! A [`LayoutNode`] is produced by the external layout provider: geometry is
//! fully computed (flexbox math is not this crate's job) and styles are
//! resolved to final values. The compositor reads the tree; it never mutates
//! geometry or styles.
//!
//! Three node kinds exist, mirroring the source DOM: raw text leaves,
//! inline `Span` elements, and block `Box` elements. The distinction matters
//! for text squashing: a row of text leaves and inline spans renders as one
//! merged string, while a `Box` child forces per-child traversal.

use crate::style::{FlexDirection, Overflow, OutputTransform, Style, TextWrap};

/// What a node is, structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A raw text leaf; `text` holds its content.
    Text,
    /// An inline element; participates in text squashing.
    Span,
    /// A block element.
    Box,
}

/// Computed box geometry, relative to the parent's content origin.
///
/// Negative margins in the source styles produce negative `left`/`top`
/// values here; the compositor must handle them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    /// Columns right of the parent's content origin.
    pub left: i32,
    /// Rows below the parent's content origin.
    pub top: i32,
    /// Width in columns.
    pub width: i32,
    /// Height in rows.
    pub height: i32,
}

/// How the compositor will render a node, decided once at traversal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    /// A pure text leaf: write its content directly.
    TextLeaf,
    /// An element carrying literal text content; wrap settings come from
    /// the parent.
    TextElement,
    /// A row-oriented element whose children are all text-bearing; render
    /// the squashed string instead of descending.
    SquashableGroup,
    /// Anything else: recurse into children.
    Container,
}

/// One node of the laid-out tree.
#[derive(Debug, Clone, Default)]
pub struct LayoutNode {
    /// Structural kind.
    pub kind: NodeKind,
    /// Text content. Always present on `Text` leaves; optionally present on
    /// elements whose children were plain strings.
    pub text: Option<String>,
    /// Child nodes, in document order.
    pub children: Vec<LayoutNode>,
    /// Computed geometry, valid once the layout pass has run.
    pub geometry: Geometry,
    /// Resolved style.
    pub style: Style,
    /// Marks append-only historical output that a render pass may skip.
    pub is_static: bool,
}

impl Default for NodeKind {
    fn default() -> Self {
        Self::Box
    }
}

impl LayoutNode {
    /// Create a text leaf.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text,
            text: Some(content.into()),
            ..Self::default()
        }
    }

    /// Create an inline element.
    pub fn span() -> Self {
        Self {
            kind: NodeKind::Span,
            ..Self::default()
        }
    }

    /// Create a block element.
    pub fn element() -> Self {
        Self::default()
    }

    /// Set the node's position relative to its parent's content origin.
    pub fn at(mut self, left: i32, top: i32) -> Self {
        self.geometry.left = left;
        self.geometry.top = top;
        self
    }

    /// Set the node's computed dimensions.
    pub fn size(mut self, width: i32, height: i32) -> Self {
        self.geometry.width = width;
        self.geometry.height = height;
        self
    }

    /// Set literal text content on an element.
    pub fn content(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Append a child node.
    pub fn child(mut self, child: LayoutNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several child nodes.
    pub fn children(mut self, children: impl IntoIterator<Item = LayoutNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Set the overflow mode.
    pub fn overflow(mut self, overflow: Overflow) -> Self {
        self.style.overflow = overflow;
        self
    }

    /// Set the flex direction.
    pub fn flex_direction(mut self, direction: FlexDirection) -> Self {
        self.style.flex_direction = direction;
        self
    }

    /// Set the text wrap mode.
    pub fn text_wrap(mut self, wrap: TextWrap) -> Self {
        self.style.text_wrap = Some(wrap);
        self
    }

    /// Set scroll offsets (rows, columns).
    pub fn scroll_offset(mut self, top: i32, left: i32) -> Self {
        self.style.scroll_offset_top = top;
        self.style.scroll_offset_left = left;
        self
    }

    /// Set the region name bracketing this node's output in markers.
    pub fn region_name(mut self, name: impl Into<String>) -> Self {
        self.style.region_name = Some(name.into());
        self
    }

    /// Set the output transform applied to this node's rendered lines.
    pub fn transform(mut self, transform: OutputTransform) -> Self {
        self.style.transform = Some(transform);
        self
    }

    /// Set an explicit z-index for layered compositing.
    pub fn z_index(mut self, z: i32) -> Self {
        self.style.z_index = Some(z);
        self
    }

    /// Mark the node static.
    pub fn static_node(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Replace the whole resolved style.
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Whether this subtree is entirely text-bearing: a text leaf, or an
    /// inline element whose content is (recursively) all text.
    pub fn is_all_text(&self) -> bool {
        match self.kind {
            NodeKind::Text => true,
            NodeKind::Span => {
                self.text.is_some() || self.children.iter().all(LayoutNode::is_all_text)
            }
            NodeKind::Box => false,
        }
    }

    /// Decide how the compositor renders this node. Called once per node at
    /// traversal entry; no runtime type probing afterwards.
    pub fn classify(&self) -> NodeClass {
        if self.kind == NodeKind::Text {
            return NodeClass::TextLeaf;
        }
        if self.text.is_some() {
            return NodeClass::TextElement;
        }
        if self.style.flex_direction.is_row()
            && !self.children.is_empty()
            && self.children.iter().all(LayoutNode::is_all_text)
        {
            return NodeClass::SquashableGroup;
        }
        NodeClass::Container
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::FlexDirection;

    #[test]
    fn test_text_leaf_classification() {
        assert_eq!(LayoutNode::text("hi").classify(), NodeClass::TextLeaf);
    }

    #[test]
    fn test_text_element_classification() {
        let node = LayoutNode::span().content("hi");
        assert_eq!(node.classify(), NodeClass::TextElement);
        let node = LayoutNode::element().content("hi");
        assert_eq!(node.classify(), NodeClass::TextElement);
    }

    #[test]
    fn test_row_of_text_is_squashable() {
        let node = LayoutNode::element()
            .child(LayoutNode::text("a"))
            .child(LayoutNode::span().content("b"));
        assert_eq!(node.classify(), NodeClass::SquashableGroup);
    }

    #[test]
    fn test_column_of_text_is_not_squashable() {
        let node = LayoutNode::element()
            .flex_direction(FlexDirection::Column)
            .child(LayoutNode::text("a"));
        assert_eq!(node.classify(), NodeClass::Container);
    }

    #[test]
    fn test_box_child_blocks_squashing() {
        let node = LayoutNode::element()
            .child(LayoutNode::text("a"))
            .child(LayoutNode::element().content("b"));
        assert_eq!(node.classify(), NodeClass::Container);
    }

    #[test]
    fn test_nested_spans_are_all_text() {
        let inner = LayoutNode::span().child(LayoutNode::text("x"));
        let node = LayoutNode::element().child(inner);
        assert_eq!(node.classify(), NodeClass::SquashableGroup);
    }

    #[test]
    fn test_empty_element_is_container() {
        assert_eq!(LayoutNode::element().classify(), NodeClass::Container);
    }

    #[test]
    fn test_builder_geometry() {
        let node = LayoutNode::element().at(2, 3).size(10, 4);
        assert_eq!(node.geometry.left, 2);
        assert_eq!(node.geometry.top, 3);
        assert_eq!(node.geometry.width, 10);
        assert_eq!(node.geometry.height, 4);
    }
}
