//! Domain-specific error types for rcast.
//!
//! All fallible operations return `Result<T, CastError>`.
//! No panics on invalid input — every error is typed and recoverable.

use std::time::Duration;
use thiserror::Error;

/// The canonical error type for the rcast protocol and pipelines.
#[derive(Debug, Error)]
pub enum CastError {
    // ── Transport Errors ─────────────────────────────────────────
    /// The TCP/IO layer reported an error.
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// An operation exceeded its deadline.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A framed record exceeded the codec limit.
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An mpsc channel was closed unexpectedly.
    #[error("channel closed")]
    ChannelClosed,

    // ── Payload Errors ───────────────────────────────────────────
    /// A command payload could not be parsed.
    #[error("malformed command: {0}")]
    MalformedCommand(String),

    /// Frame encoding (scale + JPEG compress) failed.
    #[error("frame encode error: {0}")]
    Encode(String),

    /// A received frame payload could not be decoded as an image.
    #[error("frame decode error: {0}")]
    Decode(String),

    // ── OS Capability Errors ─────────────────────────────────────
    /// Screen capture failed at the OS level.
    #[error("screen capture error: {0}")]
    Capture(String),

    /// The capture source has no new frame yet.
    #[error("no new frame available")]
    CaptureNotReady,

    /// Input injection failed at the OS level.
    #[error("input injection error: {0}")]
    Inject(String),

    // ── Admission / Configuration Errors ─────────────────────────
    /// A new connection was refused because the session limit is reached.
    #[error("session limit reached ({0} active)")]
    SessionLimit(usize),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for CastError {
    fn from(s: String) -> Self {
        CastError::Other(s)
    }
}

impl From<&str> for CastError {
    fn from(s: &str) -> Self {
        CastError::Other(s.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for CastError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        CastError::ChannelClosed
    }
}
