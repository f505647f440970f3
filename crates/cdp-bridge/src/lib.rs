//! Browser-facing capability surface for the reweave stack.
//!
//! The locator and controller layers never speak the devtools protocol
//! directly; they depend on the [`DomBridge`] trait, which captures the
//! minimal query/action surface they need. [`RawCdpBridge`] implements that
//! surface with raw protocol commands over a pluggable [`CdpTransport`], so
//! the concrete websocket/browser-process plumbing stays swappable.

pub mod bridge;
pub mod error;
pub mod raw;
pub mod transport;
pub mod types;

pub use bridge::DomBridge;
pub use error::{BridgeError, BridgeErrorKind};
pub use raw::RawCdpBridge;
pub use transport::{CdpTransport, CommandTarget, NoopTransport};
pub use types::{BoundingBox, FrameInfo, FrameSnapshot, NodeRef, QuerySession};
