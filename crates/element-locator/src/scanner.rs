//! Single-pass candidate sweep across fallback frames.

use cdp_bridge::DomBridge;

use crate::poller::probe_candidate;
use crate::types::{ElementHandle, FrameScope};

/// Try every candidate once in every scope, in the order given. No polling
/// and no sleeping: one pass, first visible hit wins.
pub(crate) async fn scan_frames_once(
    bridge: &dyn DomBridge,
    scopes: Vec<FrameScope>,
    candidates: &[String],
) -> Option<ElementHandle> {
    for scope in scopes {
        for selector in candidates {
            if let Some(node) = probe_candidate(bridge, &scope, selector).await {
                return Some(ElementHandle {
                    node,
                    selector_used: selector.clone(),
                    scope,
                });
            }
        }
    }
    None
}
