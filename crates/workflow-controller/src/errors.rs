use cdp_bridge::BridgeError;
use element_locator::LocatorError;
use thiserror::Error;

/// Failure modes of a single replayed step.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Locate(#[from] LocatorError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// A declared assertion did not hold.
    #[error("assertion failed: {0}")]
    AssertionFailed(String),
}
