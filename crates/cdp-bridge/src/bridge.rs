//! The capability trait upper layers wire against.

use async_trait::async_trait;
use reweave_core_types::{FrameId, TargetId};

use crate::error::BridgeError;
use crate::types::{BoundingBox, FrameSnapshot, NodeRef, QuerySession};

/// Minimal browser capability surface required by the locator and the
/// workflow controller.
///
/// Query methods are potentially-blocking external calls; none of them
/// retry internally. A failed `query_selector` for one candidate must not
/// poison anything else, so implementations report "no match" as
/// `Ok(None)` and reserve `Err` for transport-level trouble.
#[async_trait]
pub trait DomBridge: Send + Sync {
    /// Snapshot the current frame hierarchy. Fetched fresh per locate call.
    async fn frame_tree(&self) -> Result<FrameSnapshot, BridgeError>;

    /// Session attached to the currently focused target. Used as the
    /// fallback query channel when a frame-specific session cannot be
    /// opened.
    async fn focus_session(&self) -> Result<QuerySession, BridgeError>;

    /// Open (or reuse) a session for the given target.
    async fn open_session(&self, target: &TargetId) -> Result<QuerySession, BridgeError>;

    /// Query one selector, scoped to `frame` when the implementation
    /// supports frame-scoped queries, else against the document root.
    async fn query_selector(
        &self,
        session: &QuerySession,
        frame: Option<&FrameId>,
        selector: &str,
    ) -> Result<Option<NodeRef>, BridgeError>;

    /// Bounding geometry of a node, or `None` when it has no layout.
    async fn bounding_box(&self, node: &NodeRef) -> Result<Option<BoundingBox>, BridgeError>;

    async fn click(&self, node: &NodeRef) -> Result<(), BridgeError>;

    /// Focus the node and replace its value with `value`.
    async fn fill(&self, node: &NodeRef, value: &str) -> Result<(), BridgeError>;

    /// Select the `<option>` whose visible label matches `label`.
    async fn select_option(&self, node: &NodeRef, label: &str) -> Result<(), BridgeError>;

    async fn focus(&self, node: &NodeRef) -> Result<(), BridgeError>;

    /// Dispatch a key press into the target behind `session`.
    async fn press_key(&self, session: &QuerySession, key: &str) -> Result<(), BridgeError>;

    async fn navigate(&self, url: &str) -> Result<(), BridgeError>;

    /// URL of the focused page, if one is loaded.
    async fn current_url(&self) -> Result<Option<String>, BridgeError>;

    async fn scroll_by(&self, dx: i64, dy: i64) -> Result<(), BridgeError>;

    /// Text content of one node, for element-scoped assertions.
    async fn text_content(&self, node: &NodeRef) -> Result<String, BridgeError>;

    /// Rendered text of the focused page, for page-level assertions.
    async fn page_text(&self) -> Result<String, BridgeError>;
}
