//! Core types for the locator.

use cdp_bridge::{FrameInfo, NodeRef, QuerySession};
use reweave_core_types::FrameId;
use serde::{Deserialize, Serialize};

/// Hints captured at record time alongside the seed selector.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocateHints {
    /// Tag of the recorded element, e.g. `button`.
    pub element_tag: Option<String>,
    /// Visible text of the recorded element.
    pub element_text: Option<String>,
    /// URL of the frame the element lived in.
    pub frame_url: Option<String>,
    /// Dot-separated child-index path from the root frame.
    pub frame_path: Option<String>,
    /// URL of the page the step was recorded on.
    pub page_url: Option<String>,
}

impl LocateHints {
    pub fn with_element_tag(mut self, tag: impl Into<String>) -> Self {
        self.element_tag = Some(tag.into());
        self
    }

    pub fn with_element_text(mut self, text: impl Into<String>) -> Self {
        self.element_text = Some(text.into());
        self
    }

    pub fn with_frame_url(mut self, url: impl Into<String>) -> Self {
        self.frame_url = Some(url.into());
        self
    }

    pub fn with_frame_path(mut self, path: impl Into<String>) -> Self {
        self.frame_path = Some(path.into());
        self
    }

    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = Some(url.into());
        self
    }

    /// Best available URL for ranking fallback frames.
    pub fn prefer_url(&self) -> Option<&str> {
        self.frame_url.as_deref().or(self.page_url.as_deref())
    }
}

/// Resolved search context: one frame plus the session queries against it
/// go through. Owned by a single locate attempt, never cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameScope {
    /// `None` when frame isolation was lost and queries run unscoped.
    pub frame_id: Option<FrameId>,
    pub frame: Option<FrameInfo>,
    pub session: QuerySession,
}

impl FrameScope {
    pub fn new(frame_id: Option<FrameId>, frame: Option<FrameInfo>, session: QuerySession) -> Self {
        Self {
            frame_id,
            frame,
            session,
        }
    }

    pub fn frame_url(&self) -> Option<&str> {
        self.frame.as_ref().and_then(|info| info.url.as_deref())
    }
}

/// A successfully located element: the node, the candidate selector that
/// matched, and the scope it was found in. Valid for one action only.
#[derive(Clone, Debug)]
pub struct ElementHandle {
    pub node: NodeRef,
    pub selector_used: String,
    pub scope: FrameScope,
}

/// Truncate a selector for log/diagnostic output.
pub fn truncate_selector(selector: &str) -> String {
    const MAX_LEN: usize = 35;
    if selector.chars().count() <= MAX_LEN {
        selector.to_string()
    } else {
        let head: String = selector.chars().take(MAX_LEN).collect();
        format!("{head}...")
    }
}
