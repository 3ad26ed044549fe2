//! Kiosk input sources.
//!
//! The display process reports touches, pointer movement, key presses, and
//! card/close taps. This module normalizes them into [`KioskInput`] values and
//! provides the [`InputSource`] abstraction the runtime loop reads from.

mod channel;
mod line;

use async_trait::async_trait;
pub use channel::ChannelSource;
pub use line::{LineSource, parse_input_line};
use thiserror::Error;

use crate::domain::{ActivityKind, FormId};

/// Normalized input from the display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KioskInput {
    /// Pointer, touch, or key activity.
    Activity(ActivityKind),
    /// A form card was tapped.
    Select(FormId),
    /// The modal close control was tapped.
    Close,
}

/// Trait for kiosk input sources.
#[async_trait]
pub trait InputSource: Send {
    /// Get the next input.
    ///
    /// Returns `Ok(None)` once the source is exhausted and will produce no
    /// more input.
    async fn next_input(&mut self) -> Result<Option<KioskInput>, InputError>;
}

/// Errors that can occur while reading input.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read input: {0}")]
    ReadError(#[from] std::io::Error),
}
