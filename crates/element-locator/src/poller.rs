//! Visibility-gated polling of one frame scope.

use std::time::Duration;

use cdp_bridge::{DomBridge, NodeRef};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::errors::LocatorError;
use crate::types::FrameScope;

const POLL_CAP: Duration = Duration::from_millis(100);
const POLL_FLOOR: Duration = Duration::from_millis(50);

/// Sleep interval between candidate sweeps: capped at 100ms, never more
/// than a quarter of the remaining budget, floored at 50ms.
pub(crate) fn poll_interval(remaining: Duration) -> Duration {
    POLL_CAP.min((remaining / 4).max(POLL_FLOOR))
}

/// Probe one candidate in one scope: query, then gate on a non-zero-area
/// bounding box. Any error counts as "not found" so a single bad selector
/// cannot abort the sweep.
pub(crate) async fn probe_candidate(
    bridge: &dyn DomBridge,
    scope: &FrameScope,
    selector: &str,
) -> Option<NodeRef> {
    let node = match bridge
        .query_selector(&scope.session, scope.frame_id.as_ref(), selector)
        .await
    {
        Ok(Some(node)) => node,
        Ok(None) => return None,
        Err(err) => {
            debug!(selector, frame = ?scope.frame_id, "selector query failed: {err}");
            return None;
        }
    };

    match bridge.bounding_box(&node).await {
        Ok(Some(bounds)) if bounds.is_visible() => Some(node),
        Ok(_) => None,
        Err(err) => {
            debug!(selector, "bounding box check failed: {err}");
            None
        }
    }
}

/// Sweep the candidates in priority order until one resolves to a visible
/// node or the deadline elapses. Candidate order is a priority: every tick
/// restarts from candidate 0 rather than committing to a later match.
pub(crate) async fn wait_for_visible_element(
    bridge: &dyn DomBridge,
    scope: &FrameScope,
    candidates: &[String],
    timeout: Duration,
) -> Result<(NodeRef, String), LocatorError> {
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        for selector in candidates {
            if let Some(node) = probe_candidate(bridge, scope, selector).await {
                return Ok((node, selector.clone()));
            }
        }

        sleep(poll_interval(remaining)).await;
    }

    Err(LocatorError::Timeout(
        "timed out waiting for visible element".to_string(),
    ))
}
