//! # rcast-server
//!
//! Screen streaming and remote input execution service.
//!
//! Accepts TCP clients, streams JPEG-compressed frames of the local
//! display to each, and replays the input commands they send back.

pub mod config;
pub mod executor;
pub mod producer;
pub mod server;
pub mod session;

pub use config::ServerConfig;
pub use server::RemoteServer;
pub use session::{Session, SessionRegistry};
