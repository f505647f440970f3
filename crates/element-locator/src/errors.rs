//! Error types for the locator.

use cdp_bridge::BridgeError;
use thiserror::Error;

/// Locator failure taxonomy.
///
/// Per-candidate query errors never surface here: they are swallowed where
/// they happen and count as "not found this tick". `Timeout` is the
/// internal phase transition out of primary-frame polling; `locate` itself
/// only ever fails with `NotFound` or `Bridge`.
#[derive(Debug, Error)]
pub enum LocatorError {
    /// Every candidate exhausted in every frame scope.
    #[error("no visible element matched; original selector: {selector}")]
    NotFound { selector: String },

    /// The primary-frame poll ran out of budget.
    #[error("timed out waiting for visible element: {0}")]
    Timeout(String),

    /// The bridge could not provide a query channel at all.
    #[error("bridge failure: {0}")]
    Bridge(#[from] BridgeError),
}

impl LocatorError {
    pub fn not_found(selector: impl Into<String>) -> Self {
        Self::NotFound {
            selector: selector.into(),
        }
    }
}
