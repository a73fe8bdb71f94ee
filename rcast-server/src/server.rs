//! The rcast server — accept loop, admission control, and per-session
//! task wiring.
//!
//! Each admitted client gets three cooperating workers sharing one
//! `running` flag:
//!
//! ```text
//! capture thread ──(capacity-1 channel)──► writer task ──► TCP write half
//! TCP read half  ──► executor task ──► InputBackend
//! ```
//!
//! Whichever worker fails first clears the flag; a supervisor task
//! waits for both async halves and then frees the registry slot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rcast_core::{
    CastError, CommandExecutor, DisplayCapturer, FrameCodec, FrameSource, InputBackend,
    PerfMonitor, SystemInput,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::executor::run_executor;
use crate::producer::{SourceFactory, run_writer, spawn_capture};
use crate::session::{Session, SessionRegistry, wait_for_stop};

/// Interval between throughput log lines.
const REPORT_INTERVAL: Duration = Duration::from_secs(10);

type SourceFn = dyn Fn() -> Result<Box<dyn FrameSource>, CastError> + Send + Sync;
type InputFn = dyn Fn() -> Box<dyn InputBackend> + Send + Sync;

/// The top-level streaming server.
pub struct RemoteServer {
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
    monitor: Arc<PerfMonitor>,
    running: Arc<AtomicBool>,
    sources: Arc<SourceFn>,
    inputs: Arc<InputFn>,
}

impl RemoteServer {
    /// Create a server backed by the real display and input devices.
    pub fn new(config: ServerConfig) -> Self {
        let timeout_ms = config.capture.capture_timeout_ms;
        Self::with_factories(
            config,
            Arc::new(move || {
                DisplayCapturer::new(timeout_ms).map(|c| Box::new(c) as Box<dyn FrameSource>)
            }),
            Arc::new(|| Box::new(SystemInput::new()) as Box<dyn InputBackend>),
        )
    }

    /// Create a server with injected capture and input factories.
    pub fn with_factories(config: ServerConfig, sources: Arc<SourceFn>, inputs: Arc<InputFn>) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.network.max_sessions));
        Self {
            config,
            registry,
            monitor: Arc::new(PerfMonitor::new()),
            running: Arc::new(AtomicBool::new(false)),
            sources,
            inputs,
        }
    }

    /// Handle for stopping the server from another task or a signal
    /// handler.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.registry.shutdown_all();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Live session count.
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Validate config, bind the listener, and serve until stopped.
    pub async fn run(&self) -> Result<(), CastError> {
        self.config.validate()?;

        let addr = format!("{}:{}", self.config.network.host, self.config.network.port);
        let listener = TcpListener::bind(&addr).await?;
        info!("rcast server listening on {addr}");

        self.serve(listener).await
    }

    /// Serve on an already-bound listener (tests bind to port 0 and
    /// pass the listener in).
    pub async fn serve(&self, listener: TcpListener) -> Result<(), CastError> {
        self.running.store(true, Ordering::SeqCst);

        // Periodic throughput report.
        let reporter = {
            let monitor = Arc::clone(&self.monitor);
            let registry = Arc::clone(&self.registry);
            let running = Arc::clone(&self.running);
            tokio::spawn(async move {
                while running.load(Ordering::SeqCst) {
                    tokio::select! {
                        _ = tokio::time::sleep(REPORT_INTERVAL) => {
                            monitor.report(registry.len());
                        }
                        _ = wait_for_stop(&running) => break,
                    }
                }
            })
        };

        while self.running.load(Ordering::SeqCst) {
            let accept = tokio::select! {
                result = listener.accept() => result,
                _ = wait_for_stop(&self.running) => break,
            };

            let (stream, peer) = match accept {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("accept error: {e}");
                    continue;
                }
            };

            let session = match self.registry.register(peer) {
                Ok(session) => session,
                Err(e) => {
                    // Dropping the stream closes the connection; the
                    // refused client sees EOF.
                    warn!("refusing {peer}: {e}");
                    continue;
                }
            };

            info!(session = session.id, %peer, "client connected");
            self.spawn_session(stream, session);
        }

        self.running.store(false, Ordering::SeqCst);
        self.registry.shutdown_all();
        let _ = reporter.await;
        info!("rcast server stopped");
        Ok(())
    }

    fn spawn_session(&self, stream: TcpStream, session: Session) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!(session = session.id, "set_nodelay failed: {e}");
        }

        let (read_half, write_half) = stream.into_split();

        let sources = Arc::clone(&self.sources);
        let factory: SourceFactory = Box::new(move || sources());

        let rx = match spawn_capture(
            session.clone(),
            factory,
            self.config.capture.clone(),
            Arc::clone(&self.monitor),
        ) {
            Ok(rx) => rx,
            Err(e) => {
                warn!(session = session.id, "failed to spawn capture thread: {e}");
                self.registry.remove(session.id);
                return;
            }
        };

        let writer = tokio::spawn(run_writer(
            session.clone(),
            rx,
            FramedWrite::new(write_half, FrameCodec),
        ));

        let executor = tokio::spawn(run_executor(
            session.clone(),
            FramedRead::new(read_half, FrameCodec),
            CommandExecutor::new((self.inputs)(), self.config.capture.scale),
            Duration::from_millis(self.config.timeouts.command_read_timeout_ms),
        ));

        // Supervisor: free the slot exactly once, after both halves
        // have wound down.
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let _ = writer.await;
            let _ = executor.await;
            registry.remove(session.id);
            info!(session = session.id, peer = %session.peer, "session ended");
        });
    }
}
