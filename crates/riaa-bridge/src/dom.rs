//! Abstract document query surface.
//!
//! The bridge never holds raw DOM nodes; it works through [`DomQuery`],
//! which the embedding binds to the real document. Tests bind it to an
//! in-memory fake. Node identity is an opaque [`NodeId`] that is meaningful
//! only to the implementation behind the trait.

use serde_json::Value;

/// Opaque handle to one document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u64);

/// Tags treated as directly measurable media elements.
pub const MEDIA_TAGS: &[&str] = &["img", "picture", "video", "canvas", "figure", "svg"];

/// Fixed selector used to find a measurable descendant of a container.
pub const MEDIA_SELECTOR: &str = "img, picture, video, canvas, figure, svg";

/// Whether a tag names a media-like element.
pub fn is_media_tag(tag: &str) -> bool {
    let tag = tag.to_ascii_lowercase();
    MEDIA_TAGS.contains(&tag.as_str())
}

/// Read-only view of the document the bridge script is embedded in.
pub trait DomQuery: Send + Sync {
    /// Resolve a node handle carried inside a raw selection payload.
    fn node_from_handle(&self, handle: &Value) -> Option<NodeId>;

    /// First node matching a CSS selector, document-wide.
    fn query_selector(&self, selector: &str) -> Option<NodeId>;

    /// Node with the given element id.
    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Lowercase tag name of a node.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    /// True when the node has a non-none CSS background-image.
    fn has_background_image(&self, node: NodeId) -> bool;

    /// First descendant of `node` matching `selector`.
    fn find_descendant(&self, node: NodeId, selector: &str) -> Option<NodeId>;

    /// Current bounding-box width of a node, in CSS pixels.
    fn bounding_width(&self, node: NodeId) -> Option<f64>;

    /// Best-effort CSS-like path to a node.
    fn css_path(&self, node: NodeId) -> Option<String>;

    /// Human-readable label for a node (alt text, aria-label, or similar).
    fn label(&self, node: NodeId) -> Option<String>;

    /// The node's element id attribute, if set.
    fn element_id(&self, node: NodeId) -> Option<String>;
}
