//! Deterministic replay of recorded workflow steps.
//!
//! A step arrives as a JSON payload captured by a browser recorder. This
//! crate parses it into a typed [`WorkflowStep`], resolves the target
//! element through the locator, and performs the interaction through the
//! [`cdp_bridge::DomBridge`] capability surface.

pub mod errors;
pub mod service;
pub mod views;

pub use errors::ControllerError;
pub use service::{ActionOutcome, WorkflowController};
pub use views::{RecorderMeta, WorkflowStep};
