//! Resilient element location for workflow replay.
//!
//! Given the CSS selector a step was recorded with plus whatever hints the
//! recorder captured (element tag, visible text, frame path/URL), this crate
//! finds the live DOM element the step referred to even when the page has
//! drifted since recording:
//! - candidate generation degrades the seed selector from exact to loose
//! - the frame resolver picks the right search scope in the frame tree
//! - a visibility-gated poller works the primary scope within a time budget
//! - on timeout, a single sweep searches every other frame, best-scoring
//!   frame URLs first

pub mod candidates;
pub mod errors;
pub mod frames;
pub mod locator;
pub mod poller;
pub mod scanner;
pub mod types;

pub use errors::LocatorError;
pub use locator::ElementLocator;
pub use types::{truncate_selector, ElementHandle, FrameScope, LocateHints};
