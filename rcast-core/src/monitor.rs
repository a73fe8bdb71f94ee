//! Lightweight throughput accounting for the streaming pipeline.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Per-window counters, reset on every report.
#[derive(Debug)]
struct Window {
    started: Instant,
    frames: u64,
    bytes: u64,
}

/// Aggregates frame and byte counts across all sessions.
///
/// Producers call [`record_frame`](Self::record_frame) from their
/// capture threads; a single reporter task calls
/// [`report`](Self::report) periodically, which logs the window's
/// rates and resets it.
#[derive(Debug)]
pub struct PerfMonitor {
    total_frames: AtomicU64,
    total_bytes: AtomicU64,
    window: Mutex<Window>,
}

impl PerfMonitor {
    pub fn new() -> Self {
        Self {
            total_frames: AtomicU64::new(0),
            total_bytes: AtomicU64::new(0),
            window: Mutex::new(Window {
                started: Instant::now(),
                frames: 0,
                bytes: 0,
            }),
        }
    }

    /// Account one encoded frame of `bytes` length.
    pub fn record_frame(&self, bytes: usize) {
        self.total_frames.fetch_add(1, Ordering::Relaxed);
        self.total_bytes.fetch_add(bytes as u64, Ordering::Relaxed);

        let mut win = self.window.lock().unwrap();
        win.frames += 1;
        win.bytes += bytes as u64;
    }

    /// Frames recorded since startup.
    pub fn total_frames(&self) -> u64 {
        self.total_frames.load(Ordering::Relaxed)
    }

    /// Bytes recorded since startup.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    /// Log the current window's rates and start a new window.
    ///
    /// Returns `(fps, bytes_per_sec)` for the closed window.
    pub fn report(&self, active_sessions: usize) -> (f64, f64) {
        let mut win = self.window.lock().unwrap();
        let elapsed = win.started.elapsed().as_secs_f64().max(1e-6);
        let fps = win.frames as f64 / elapsed;
        let rate = win.bytes as f64 / elapsed;

        tracing::info!(
            sessions = active_sessions,
            fps,
            kib_per_sec = rate / 1024.0,
            total_frames = self.total_frames(),
            "streaming throughput"
        );

        win.started = Instant::now();
        win.frames = 0;
        win.bytes = 0;
        (fps, rate)
    }
}

impl Default for PerfMonitor {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_accumulate_across_reports() {
        let mon = PerfMonitor::new();
        mon.record_frame(1000);
        mon.record_frame(500);
        mon.report(1);
        mon.record_frame(250);

        assert_eq!(mon.total_frames(), 3);
        assert_eq!(mon.total_bytes(), 1750);
    }

    #[test]
    fn report_resets_the_window() {
        let mon = PerfMonitor::new();
        mon.record_frame(100);
        mon.report(1);

        // Nothing recorded in the new window.
        let (fps, rate) = mon.report(1);
        assert_eq!(fps, 0.0);
        assert_eq!(rate, 0.0);
    }
}
