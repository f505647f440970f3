//! The locate orchestrator.

use std::sync::Arc;
use std::time::Duration;

use cdp_bridge::DomBridge;
use tracing::{debug, info};

use crate::candidates::{dedup_preserving_order, generate_stable_selectors};
use crate::errors::LocatorError;
use crate::types::{truncate_selector, ElementHandle, LocateHints};
use crate::{frames, poller, scanner};

/// Default budget for the primary-frame poll.
pub const DEFAULT_LOCATE_TIMEOUT: Duration = Duration::from_millis(2500);

/// Two-phase element locator.
///
/// Phase 1 resolves the primary frame scope and polls it with the full
/// candidate list until the budget elapses. Phase 2 sweeps every other
/// frame once, best-scoring frame URLs first. There is no retry of phase 1
/// after phase 2 fails; callers needing more re-invoke.
pub struct ElementLocator {
    bridge: Arc<dyn DomBridge>,
}

impl ElementLocator {
    pub fn new(bridge: Arc<dyn DomBridge>) -> Self {
        Self { bridge }
    }

    /// Find the best live element for a recorded selector.
    ///
    /// Fails with [`LocatorError::NotFound`] carrying the original seed
    /// selector only after both the primary poll and the cross-frame sweep
    /// exhaust every candidate.
    pub async fn locate(
        &self,
        selector: &str,
        hints: &LocateHints,
        timeout: Duration,
    ) -> Result<ElementHandle, LocatorError> {
        let mut candidates = vec![selector.to_string()];
        candidates.extend(generate_stable_selectors(selector, hints));
        let candidates = dedup_preserving_order(candidates);

        let (scope, snapshot) = frames::resolve_scope(self.bridge.as_ref(), hints).await?;

        match poller::wait_for_visible_element(self.bridge.as_ref(), &scope, &candidates, timeout)
            .await
        {
            Ok((node, selector_used)) => {
                info!(
                    selector = %truncate_selector(&selector_used),
                    frame = ?scope.frame_id,
                    "element located in primary frame"
                );
                return Ok(ElementHandle {
                    node,
                    selector_used,
                    scope,
                });
            }
            Err(LocatorError::Timeout(_)) => {
                debug!(
                    selector = %truncate_selector(selector),
                    "primary frame lookup timed out, widening to other frames"
                );
            }
            Err(err) => return Err(err),
        }

        let other_scopes = frames::collect_other_scopes(
            self.bridge.as_ref(),
            &snapshot,
            scope.frame_id.as_ref(),
            hints.prefer_url(),
        )
        .await?;

        if let Some(handle) =
            scanner::scan_frames_once(self.bridge.as_ref(), other_scopes, &candidates).await
        {
            info!(
                selector = %truncate_selector(&handle.selector_used),
                frame = ?handle.scope.frame_id,
                "element located in fallback frame"
            );
            return Ok(handle);
        }

        Err(LocatorError::not_found(selector))
    }
}
