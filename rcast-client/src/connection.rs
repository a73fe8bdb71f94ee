//! TCP connection to the rcast server.
//!
//! One socket carries both channels: the read half streams framed
//! JPEG frames, the write half carries framed JSON commands.

use std::time::Duration;

use bytes::Bytes;
use futures::SinkExt;
use rcast_core::{CastError, Command, FrameCodec};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::info;

/// The frame-receiving half of a server connection.
pub type FrameStream = FramedRead<OwnedReadHalf, FrameCodec>;

/// Sends commands to the server. Failures surface as `CastError` so
/// the main loop can decide whether the session is over.
pub struct CommandSender {
    sink: FramedWrite<OwnedWriteHalf, FrameCodec>,
}

impl CommandSender {
    pub async fn send(&mut self, command: &Command) -> Result<(), CastError> {
        self.sink.send(Bytes::from(command.to_bytes()?)).await
    }
}

/// Connect to the server, with a bound on how long we wait.
pub async fn connect(
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<(FrameStream, CommandSender), CastError> {
    let addr = format!("{host}:{port}");
    info!("connecting to {addr}");

    let stream = tokio::time::timeout(timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| CastError::Timeout(timeout))??;
    stream.set_nodelay(true)?;
    info!("connected to {addr}");

    let (read, write) = stream.into_split();
    Ok((
        FramedRead::new(read, FrameCodec),
        CommandSender {
            sink: FramedWrite::new(write, FrameCodec),
        },
    ))
}

// ── Tests ────────────────────────────────────────────────────────
