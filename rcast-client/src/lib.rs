//! # rcast-client
//!
//! Remote display viewer: receives JPEG frames from an rcast server,
//! renders them letterboxed in a native window, and forwards local
//! mouse and keyboard input as commands.

pub mod compositor;
pub mod config;
pub mod connection;
pub mod consumer;
pub mod input;
pub mod window;

pub use config::ClientConfig;
pub use input::InputMapper;
