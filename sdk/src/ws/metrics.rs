//! Push-channel metrics tracking.
//!
//! Provides atomic counters for monitoring both channels.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics shared by the trading and price channels.
#[derive(Debug)]
pub struct ChannelMetrics {
    /// Total connections opened.
    connections_opened: AtomicU64,

    /// Total connections closed (including failed connects).
    connections_closed: AtomicU64,

    /// Total text frames received.
    frames_received: AtomicU64,

    /// Frames that were not valid JSON.
    frames_malformed: AtomicU64,

    /// Frames with an unknown type or undecodable payload.
    frames_dropped: AtomicU64,

    /// Total messages sent.
    messages_sent: AtomicU64,

    /// Sends attempted while not connected.
    sends_dropped: AtomicU64,

    /// Reconnects scheduled.
    reconnects_scheduled: AtomicU64,

    /// Error events raised.
    errors: AtomicU64,

    /// Start time for uptime.
    start_time: Instant,
}

impl Default for ChannelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelMetrics {
    /// Creates a new metrics instance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections_opened: AtomicU64::new(0),
            connections_closed: AtomicU64::new(0),
            frames_received: AtomicU64::new(0),
            frames_malformed: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            sends_dropped: AtomicU64::new(0),
            reconnects_scheduled: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Records a connection opened.
    pub fn record_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a connection closed.
    pub fn record_connection_closed(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a frame received.
    pub fn record_frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a malformed frame.
    pub fn record_frame_malformed(&self) {
        self.frames_malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a dropped frame.
    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a message sent.
    pub fn record_message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a send attempted while disconnected.
    pub fn record_send_dropped(&self) {
        self.sends_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a scheduled reconnect.
    pub fn record_reconnect_scheduled(&self) {
        self.reconnects_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an error event.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns total connections opened.
    #[must_use]
    pub fn connections_opened(&self) -> u64 {
        self.connections_opened.load(Ordering::Relaxed)
    }

    /// Returns total connections closed.
    #[must_use]
    pub fn connections_closed(&self) -> u64 {
        self.connections_closed.load(Ordering::Relaxed)
    }

    /// Returns total frames received.
    #[must_use]
    pub fn frames_received(&self) -> u64 {
        self.frames_received.load(Ordering::Relaxed)
    }

    /// Returns total malformed frames.
    #[must_use]
    pub fn frames_malformed(&self) -> u64 {
        self.frames_malformed.load(Ordering::Relaxed)
    }

    /// Returns total dropped frames.
    #[must_use]
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    /// Returns total messages sent.
    #[must_use]
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Returns total sends dropped while disconnected.
    #[must_use]
    pub fn sends_dropped(&self) -> u64 {
        self.sends_dropped.load(Ordering::Relaxed)
    }

    /// Returns total reconnects scheduled.
    #[must_use]
    pub fn reconnects_scheduled(&self) -> u64 {
        self.reconnects_scheduled.load(Ordering::Relaxed)
    }

    /// Returns total error events.
    #[must_use]
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns the uptime.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened(),
            connections_closed: self.connections_closed(),
            frames_received: self.frames_received(),
            frames_malformed: self.frames_malformed(),
            frames_dropped: self.frames_dropped(),
            messages_sent: self.messages_sent(),
            sends_dropped: self.sends_dropped(),
            reconnects_scheduled: self.reconnects_scheduled(),
            errors: self.errors(),
            uptime_secs: self.uptime().as_secs(),
        }
    }
}

/// Snapshot of channel metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total connections opened.
    pub connections_opened: u64,
    /// Total connections closed.
    pub connections_closed: u64,
    /// Total frames received.
    pub frames_received: u64,
    /// Malformed frames.
    pub frames_malformed: u64,
    /// Dropped frames.
    pub frames_dropped: u64,
    /// Messages sent.
    pub messages_sent: u64,
    /// Sends dropped while disconnected.
    pub sends_dropped: u64,
    /// Reconnects scheduled.
    pub reconnects_scheduled: u64,
    /// Error events.
    pub errors: u64,
    /// Uptime in seconds.
    pub uptime_secs: u64,
}
