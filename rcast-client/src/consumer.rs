//! Frame consumer — receives framed JPEG payloads and publishes the
//! latest decoded image.
//!
//! Runs as its own task so a slow render loop never blocks the
//! socket. The render loop only ever wants the newest frame, so a
//! `watch` channel holds exactly one image and silently replaces it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use rcast_core::{DecodedImage, FrameDecoder};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::connection::FrameStream;

/// Receiving side for the render loop.
pub type FrameReceiver = watch::Receiver<Option<DecodedImage>>;

/// Drain the frame stream until the server disconnects.
///
/// Undecodable payloads are logged and skipped; the previous image
/// stays on screen. Clears `connected` on exit.
pub async fn run_consumer(
    mut frames: FrameStream,
    tx: watch::Sender<Option<DecodedImage>>,
    connected: Arc<AtomicBool>,
) {
    let decoder = FrameDecoder::new();
    let mut received: u64 = 0;

    loop {
        match frames.next().await {
            Some(Ok(payload)) => match decoder.decode(&payload) {
                Ok(image) => {
                    received += 1;
                    let _ = tx.send(Some(image));
                }
                Err(e) => {
                    warn!("skipping undecodable frame: {e}");
                }
            },
            Some(Err(e)) => {
                warn!("frame stream error: {e}");
                break;
            }
            None => {
                info!("server closed the frame stream");
                break;
            }
        }
    }

    info!(frames = received, "frame stream ended");
    connected.store(false, Ordering::SeqCst);
}

/// Build the watch pair the consumer publishes through.
pub fn frame_channel() -> (watch::Sender<Option<DecodedImage>>, FrameReceiver) {
    watch::channel(None)
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::SinkExt;
    use rcast_core::{FrameCodec, FrameEncoder, RawFrame};
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio_util::codec::{FramedRead, FramedWrite};

    async fn socket_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    fn jpeg_payload(width: u32, height: u32) -> Bytes {
        let rgb = vec![90u8; (width * height * 3) as usize];
        let frame = RawFrame::packed_rgb(width, height, rgb);
        Bytes::from(FrameEncoder::new(80, 1.0).encode(&frame).unwrap().data)
    }

    #[tokio::test]
    async fn publishes_latest_frame_and_survives_garbage() {
        let (client, server) = socket_pair().await;
        let mut sender = FramedWrite::new(server, FrameCodec);

        let (tx, mut rx) = frame_channel();
        let connected = Arc::new(AtomicBool::new(true));
        let consumer = tokio::spawn(run_consumer(
            FramedRead::new(client.into_split().0, FrameCodec),
            tx,
            Arc::clone(&connected),
        ));

        // Garbage first; the consumer must not publish or die.
        sender.send(Bytes::from_static(b"not a jpeg")).await.unwrap();
        sender.send(jpeg_payload(24, 12)).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        let image = rx.borrow_and_update().clone().unwrap();
        assert_eq!((image.width, image.height), (24, 12));
        assert!(connected.load(Ordering::SeqCst));

        // Closing the stream clears the connected flag.
        drop(sender);
        tokio::time::timeout(Duration::from_secs(5), consumer)
            .await
            .unwrap()
            .unwrap();
        assert!(!connected.load(Ordering::SeqCst));
    }
}
