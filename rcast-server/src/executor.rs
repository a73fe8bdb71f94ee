//! Per-session command loop — reads framed JSON commands and replays
//! them through the input backend.
//!
//! One bad command never ends a session: parse and injection failures
//! are logged and the loop moves on. Only a closed or broken socket
//! (or the session stopping) ends it.

use std::time::Duration;

use futures::StreamExt;
use rcast_core::{Command, CommandExecutor, FrameCodec, InputBackend};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use crate::session::Session;

/// Run the command loop until the client disconnects or the session
/// stops.
pub async fn run_executor<R, B>(
    session: Session,
    mut commands: FramedRead<R, FrameCodec>,
    executor: CommandExecutor<B>,
    read_timeout: Duration,
) where
    R: AsyncRead + Unpin,
    B: InputBackend,
{
    while session.is_running() {
        // The timeout bounds how long a dead flag goes unnoticed; an
        // idle client is normal and just loops again.
        let record = match tokio::time::timeout(read_timeout, commands.next()).await {
            Err(_elapsed) => continue,
            Ok(None) => {
                info!(session = session.id, "command channel closed by client");
                break;
            }
            Ok(Some(Err(e))) => {
                warn!(session = session.id, "command channel error: {e}");
                break;
            }
            Ok(Some(Ok(record))) => record,
        };

        let command = match Command::from_bytes(&record) {
            Ok(command) => command,
            Err(e) => {
                warn!(session = session.id, "discarding malformed command: {e}");
                continue;
            }
        };

        debug!(session = session.id, command = command.name(), "executing");
        if let Err(e) = executor.execute(&command) {
            warn!(
                session = session.id,
                command = command.name(),
                "injection failed: {e}"
            );
        }
    }

    session.stop();
}

// ── Tests ────────────────────────────────────────────────────────
