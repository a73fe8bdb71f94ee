//! End-to-end server tests over real TCP sockets, with a synthetic
//! frame source and a recording input backend injected in place of
//! the display and OS input devices.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use rcast_core::{
    CastError, Command, FrameCodec, FrameDecoder, FrameSource, InputBackend, MouseButton, RawFrame,
};
use rcast_server::config::ServerConfig;
use rcast_server::server::RemoteServer;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{FramedRead, FramedWrite};

// ── Test doubles ─────────────────────────────────────────────────

struct SolidSource {
    width: u32,
    height: u32,
}

impl FrameSource for SolidSource {
    fn next_frame(&mut self) -> Result<RawFrame, CastError> {
        let data = vec![120u8; (self.width * self.height * 3) as usize];
        Ok(RawFrame::packed_rgb(self.width, self.height, data))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Click(i32, i32, MouseButton),
    TypeText(String),
}

#[derive(Clone, Default)]
struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl InputBackend for Recorder {
    fn move_to(&self, _x: i32, _y: i32) -> Result<(), CastError> {
        Ok(())
    }
    fn click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), CastError> {
        self.calls.lock().unwrap().push(Call::Click(x, y, button));
        Ok(())
    }
    fn double_click(&self, _x: i32, _y: i32) -> Result<(), CastError> {
        Ok(())
    }
    fn drag(
        &self,
        _x1: i32,
        _y1: i32,
        _x2: i32,
        _y2: i32,
        _duration: Duration,
    ) -> Result<(), CastError> {
        Ok(())
    }
    fn scroll(&self, _x: i32, _y: i32, _clicks: i32) -> Result<(), CastError> {
        Ok(())
    }
    fn key_press(&self, _key: &str) -> Result<(), CastError> {
        Ok(())
    }
    fn key_chord(&self, _keys: &[String]) -> Result<(), CastError> {
        Ok(())
    }
    fn type_text(&self, text: &str) -> Result<(), CastError> {
        self.calls.lock().unwrap().push(Call::TypeText(text.to_string()));
        Ok(())
    }
}

// ── Harness ──────────────────────────────────────────────────────

fn test_config(max_sessions: usize) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.network.max_sessions = max_sessions;
    config.capture.scale = 0.5;
    config.capture.quality = 50;
    config.capture.frame_rate = 100;
    config.timeouts.command_read_timeout_ms = 100;
    config
}

async fn start_server(max_sessions: usize, backend: Recorder) -> (Arc<RemoteServer>, String) {
    let server = Arc::new(RemoteServer::with_factories(
        test_config(max_sessions),
        Arc::new(|| {
            Ok(Box::new(SolidSource {
                width: 64,
                height: 32,
            }) as Box<dyn FrameSource>)
        }),
        Arc::new(move || Box::new(backend.clone()) as Box<dyn InputBackend>),
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let serve = Arc::clone(&server);
    tokio::spawn(async move {
        serve.serve(listener).await.unwrap();
    });

    (server, addr)
}

struct TestClient {
    frames: FramedRead<tokio::net::tcp::OwnedReadHalf, FrameCodec>,
    commands: FramedWrite<tokio::net::tcp::OwnedWriteHalf, FrameCodec>,
}

impl TestClient {
    async fn connect(addr: &str) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, write) = stream.into_split();
        Self {
            frames: FramedRead::new(read, FrameCodec),
            commands: FramedWrite::new(write, FrameCodec),
        }
    }

    async fn next_frame(&mut self) -> Option<Bytes> {
        tokio::time::timeout(Duration::from_secs(5), self.frames.next())
            .await
            .ok()?
            .transpose()
            .unwrap()
    }

    async fn send(&mut self, command: &Command) {
        self.commands
            .send(Bytes::from(command.to_bytes().unwrap()))
            .await
            .unwrap();
    }

    async fn send_raw(&mut self, payload: &'static [u8]) {
        self.commands
            .send(Bytes::from_static(payload))
            .await
            .unwrap();
    }
}

async fn wait_for<F: Fn() -> bool>(cond: F) {
    for _ in 0..100 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("condition not reached within 5s");
}

// ── Tests ────────────────────────────────────────────────────────

#[tokio::test]
async fn streams_scaled_decodable_frames() {
    let (server, addr) = start_server(2, Recorder::default()).await;

    let mut client = TestClient::connect(&addr).await;
    let payload = client.next_frame().await.expect("no frame received");

    // 64×32 capture at scale 0.5.
    let img = FrameDecoder::new().decode(&payload).unwrap();
    assert_eq!((img.width, img.height), (32, 16));

    server.stop_handle().store(false, Ordering::SeqCst);
}

#[tokio::test]
async fn session_limit_refuses_then_readmits() {
    let (server, addr) = start_server(1, Recorder::default()).await;

    // First client is admitted and streams.
    let mut first = TestClient::connect(&addr).await;
    assert!(first.next_frame().await.is_some());
    assert_eq!(server.session_count(), 1);

    // Second client is refused: connection closes without a frame.
    let mut refused = TestClient::connect(&addr).await;
    assert!(refused.next_frame().await.is_none());
    assert_eq!(server.session_count(), 1);

    // Closing the first client frees the slot.
    drop(first);
    wait_for(|| server.session_count() == 0).await;

    let mut third = TestClient::connect(&addr).await;
    assert!(third.next_frame().await.is_some());

    server.stop_handle().store(false, Ordering::SeqCst);
}

#[tokio::test]
async fn commands_are_scaled_and_injected() {
    let backend = Recorder::default();
    let (server, addr) = start_server(1, backend.clone()).await;

    let mut client = TestClient::connect(&addr).await;
    assert!(client.next_frame().await.is_some());

    client
        .send(&Command::MouseClick {
            x: 40.0,
            y: 30.0,
            button: MouseButton::Left,
        })
        .await;

    // Captured-frame coordinates divided by the 0.5 capture scale.
    wait_for(|| {
        backend.calls.lock().unwrap().as_slice() == [Call::Click(80, 60, MouseButton::Left)]
    })
    .await;

    server.stop_handle().store(false, Ordering::SeqCst);
}

#[tokio::test]
async fn malformed_command_does_not_disturb_other_sessions() {
    let backend = Recorder::default();
    let (server, addr) = start_server(2, backend.clone()).await;

    let mut noisy = TestClient::connect(&addr).await;
    let mut polite = TestClient::connect(&addr).await;
    assert!(noisy.next_frame().await.is_some());
    assert!(polite.next_frame().await.is_some());

    noisy.send_raw(b"\xde\xad{garbage").await;
    polite
        .send(&Command::TypeText { text: "ok".into() })
        .await;

    wait_for(|| {
        backend
            .calls
            .lock()
            .unwrap()
            .contains(&Call::TypeText("ok".into()))
    })
    .await;

    // Both sessions are still streaming.
    assert!(noisy.next_frame().await.is_some());
    assert!(polite.next_frame().await.is_some());
    assert_eq!(server.session_count(), 2);

    server.stop_handle().store(false, Ordering::SeqCst);
}
