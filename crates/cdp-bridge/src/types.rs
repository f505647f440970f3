//! Value types exchanged across the bridge boundary.

use std::collections::HashMap;

use reweave_core_types::{FrameId, SessionId, TargetId};
use serde::{Deserialize, Serialize};

/// One node of a frame tree snapshot.
///
/// A snapshot is taken once per locate call and is expected to go stale
/// immediately afterwards; nothing holds on to it across calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub frame_id: FrameId,
    /// Owning devtools target, when the frame has a dedicated execution
    /// context (out-of-process iframes). `None` for same-process frames.
    pub target_id: Option<TargetId>,
    pub url: Option<String>,
    /// `None` marks a root frame.
    pub parent_id: Option<FrameId>,
    /// Child frames in document order; the resolver indexes into this.
    pub child_ids: Vec<FrameId>,
}

/// Frame tree snapshot keyed by frame identity.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frames: HashMap<FrameId, FrameInfo>,
}

impl FrameSnapshot {
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn insert(&mut self, info: FrameInfo) {
        self.frames.insert(info.frame_id.clone(), info);
    }
}

/// Handle to a devtools session attached to one target, used to scope
/// queries to that target's execution context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySession {
    pub session_id: SessionId,
    pub target_id: TargetId,
}

impl QuerySession {
    pub fn new(session_id: SessionId, target_id: TargetId) -> Self {
        Self {
            session_id,
            target_id,
        }
    }
}

/// Opaque reference to a located DOM node. Valid only until the DOM
/// mutates; callers must not reuse it across actions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    pub backend_node_id: u64,
    pub session_id: SessionId,
}

/// Bounding geometry of a node as reported by the browser.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// A node is visible iff its box has non-zero area.
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
