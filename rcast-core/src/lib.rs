//! # rcast-core
//!
//! Core library for the rcast remote display system.
//!
//! This crate contains:
//! - **Codec**: `FrameCodec` — length-prefixed record framing for both channels
//! - **Commands**: `Command` — the JSON input-command protocol
//! - **Capture**: `FrameSource` seam and the DXGI `DisplayCapturer`
//! - **Encode/Decode**: JPEG pipeline between raw captures and displayable pixels
//! - **Transform**: `DisplayTransform` — letterbox fit and coordinate mapping
//! - **Input**: `InputBackend` seam and the `SendInput`-based `SystemInput`
//! - **Executor**: `CommandExecutor` — scale-aware command dispatch
//! - **Error**: `CastError` — typed, `thiserror`-based error hierarchy

pub mod capture;
pub mod codec;
pub mod command;
pub mod decode;
pub mod encode;
pub mod error;
pub mod executor;
pub mod input;
pub mod monitor;
pub mod transform;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use capture::{DisplayCapturer, FrameSource, PixelFormat, RawFrame};
pub use codec::{FrameCodec, LEN_PREFIX, MAX_FRAME_SIZE};
pub use command::{Command, MouseButton};
pub use decode::{DecodedImage, FrameDecoder};
pub use encode::{EncodedFrame, FrameEncoder};
pub use error::CastError;
pub use executor::CommandExecutor;
pub use input::{InputBackend, SystemInput};
pub use monitor::PerfMonitor;
pub use transform::DisplayTransform;
