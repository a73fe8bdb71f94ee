//! Session identity and the bounded session registry.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rcast_core::CastError;

/// One connected client.
///
/// The `running` flag links the session's producer, writer, and
/// executor tasks: any of them clearing it winds the others down.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: u64,
    pub peer: SocketAddr,
    pub running: Arc<AtomicBool>,
}

impl Session {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Tracks live sessions and enforces the admission limit.
#[derive(Debug)]
pub struct SessionRegistry {
    max_sessions: usize,
    next_id: AtomicU64,
    sessions: Mutex<HashMap<u64, Session>>,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            max_sessions,
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Admit a new session, or refuse when the limit is reached.
    ///
    /// The capacity check and the insert happen under one lock so a
    /// burst of simultaneous connections cannot overshoot the limit.
    pub fn register(&self, peer: SocketAddr) -> Result<Session, CastError> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.len() >= self.max_sessions {
            return Err(CastError::SessionLimit(sessions.len()));
        }

        let session = Session {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            peer,
            running: Arc::new(AtomicBool::new(true)),
        };
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    /// Remove a session, freeing its slot. Idempotent; returns
    /// whether the session was still present.
    pub fn remove(&self, id: u64) -> bool {
        self.sessions.lock().unwrap().remove(&id).is_some()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signal every live session to stop.
    pub fn shutdown_all(&self) {
        for session in self.sessions.lock().unwrap().values() {
            session.stop();
        }
    }
}

/// Async helper: resolves when `running` becomes false.
pub async fn wait_for_stop(running: &Arc<AtomicBool>) {
    loop {
        if !running.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

// ── Tests ────────────────────────────────────────────────────────
