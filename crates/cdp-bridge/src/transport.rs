//! Pluggable protocol transport.
//!
//! The bridge issues devtools commands through this seam; the concrete
//! websocket/browser-process runtime lives outside this repository and is
//! injected by the embedding application.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{BridgeError, BridgeErrorKind};

/// Where a command is addressed: the browser endpoint itself, or one
/// attached target session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandTarget {
    Browser,
    Session(String),
}

#[async_trait]
pub trait CdpTransport: Send + Sync {
    /// Send one protocol command and await its result payload.
    async fn send_command(
        &self,
        target: CommandTarget,
        method: &str,
        params: Value,
    ) -> Result<Value, BridgeError>;
}

/// Transport that rejects every command. Placeholder for wiring tests and
/// for builds where no browser is attached.
#[derive(Default)]
pub struct NoopTransport;

#[async_trait]
impl CdpTransport for NoopTransport {
    async fn send_command(
        &self,
        _target: CommandTarget,
        method: &str,
        _params: Value,
    ) -> Result<Value, BridgeError> {
        Err(BridgeError::new(BridgeErrorKind::Internal)
            .with_hint(format!("transport not available for method {method}")))
    }
}
