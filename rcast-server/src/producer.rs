//! Frame production — per-session capture thread and the async
//! writer that drains it onto the socket.
//!
//! Capture and JPEG encoding are blocking, so each session gets a
//! dedicated OS thread. The thread feeds a capacity-1 channel: at
//! most one encoded frame is in flight, and a slow client simply
//! back-pressures the producer instead of growing a queue.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::SinkExt;
use rcast_core::{CastError, FrameCodec, FrameEncoder, FrameSource, PerfMonitor};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio_util::codec::FramedWrite;
use tracing::{debug, info, warn};

use crate::config::CaptureConfig;
use crate::session::{Session, wait_for_stop};

/// Builds a session's frame source on the capture thread itself, so
/// the source never has to be `Send`.
pub type SourceFactory = Box<dyn FnOnce() -> Result<Box<dyn FrameSource>, CastError> + Send>;

/// Spawn the capture thread for one session.
///
/// Returns the receiving end of the frame channel; the thread exits
/// when the session stops or the receiver is dropped, and clears the
/// session flag on its way out.
pub fn spawn_capture(
    session: Session,
    factory: SourceFactory,
    capture: CaptureConfig,
    monitor: Arc<PerfMonitor>,
) -> std::io::Result<mpsc::Receiver<Bytes>> {
    let (tx, rx) = mpsc::channel::<Bytes>(1);

    std::thread::Builder::new()
        .name(format!("capture-{}", session.id))
        .spawn(move || {
            capture_loop(&session, factory, &capture, &monitor, &tx);
            session.stop();
            debug!(session = session.id, "capture thread exiting");
        })?;

    Ok(rx)
}

fn capture_loop(
    session: &Session,
    factory: SourceFactory,
    capture: &CaptureConfig,
    monitor: &PerfMonitor,
    tx: &mpsc::Sender<Bytes>,
) {
    let mut source = match factory() {
        Ok(s) => s,
        Err(e) => {
            warn!(session = session.id, "capture source unavailable: {e}");
            return;
        }
    };

    let mut encoder = FrameEncoder::new(capture.quality, capture.scale);
    let interval = Duration::from_secs_f64(1.0 / capture.frame_rate as f64);
    let mut last_sent = Instant::now() - interval;

    while session.is_running() {
        // Soft pacing: never send faster than the target rate, but
        // never sleep through a frame that is already due.
        if last_sent.elapsed() < interval {
            std::thread::sleep(Duration::from_millis(1));
            continue;
        }

        let raw = match source.next_frame() {
            Ok(raw) => raw,
            Err(CastError::CaptureNotReady) => {
                std::thread::sleep(Duration::from_millis(1));
                continue;
            }
            Err(e) => {
                warn!(session = session.id, "capture error: {e}");
                std::thread::sleep(Duration::from_millis(50));
                continue;
            }
        };

        let frame = match encoder.encode(&raw) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(session = session.id, "encode error: {e}");
                return;
            }
        };

        monitor.record_frame(frame.data.len());

        // Blocks while the previous frame is still unsent; a closed
        // channel means the writer is gone.
        if tx.blocking_send(Bytes::from(frame.data)).is_err() {
            return;
        }
        last_sent = Instant::now();
    }
}

/// Drain encoded frames onto the socket until the session stops or
/// the client disconnects.
pub async fn run_writer<W>(
    session: Session,
    mut rx: mpsc::Receiver<Bytes>,
    mut sink: FramedWrite<W, FrameCodec>,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        let frame = tokio::select! {
            frame = rx.recv() => frame,
            _ = wait_for_stop(&session.running) => break,
        };

        let Some(frame) = frame else {
            // Producer ended.
            break;
        };

        if let Err(e) = sink.send(frame).await {
            info!(session = session.id, "frame write failed: {e}");
            break;
        }
    }

    session.stop();
    // Dropping `rx` unblocks the capture thread if it is mid-send.
}

// ── Tests ────────────────────────────────────────────────────────
