//! Observability and Metrics
//!
//! Counters for the decode → dispatch → encode pipeline. One [`Metrics`]
//! instance belongs to each message controller; there is no global instance.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for one message controller
#[derive(Debug)]
pub struct Metrics {
    /// Frames handed to the controller
    pub messages_received: AtomicU64,
    /// Outbound frames encoded, requests and responses alike
    pub messages_sent: AtomicU64,
    /// Total bytes received
    pub bytes_received: AtomicU64,
    /// Total bytes sent
    pub bytes_sent: AtomicU64,
    /// Frames rejected by the decoder, including trailing bytes
    pub decode_errors: AtomicU64,
    /// Outbound messages the encoder refused
    pub encode_errors: AtomicU64,
    /// Objects of unregistered types skipped while decoding
    pub unknown_types_skipped: AtomicU64,
    /// Properties with unknown hashes skipped while decoding
    pub unknown_properties_skipped: AtomicU64,
    /// Requests handed to a handler
    pub requests_dispatched: AtomicU64,
    /// Responses handed to a handler
    pub responses_dispatched: AtomicU64,
    /// Messages without a bound handler
    pub unroutable: AtomicU64,
    /// Handler or construction failures
    pub handler_errors: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_sent: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            encode_errors: AtomicU64::new(0),
            unknown_types_skipped: AtomicU64::new(0),
            unknown_properties_skipped: AtomicU64::new(0),
            requests_dispatched: AtomicU64::new(0),
            responses_dispatched: AtomicU64::new(0),
            unroutable: AtomicU64::new(0),
            handler_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an incoming frame
    pub fn message_received(&self, byte_count: u64) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record an outgoing frame
    pub fn message_sent(&self, byte_count: u64) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn encode_error(&self) {
        self.encode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record what a decoder skipped
    pub fn skipped(&self, types: usize, properties: usize) {
        self.unknown_types_skipped
            .fetch_add(types as u64, Ordering::Relaxed);
        self.unknown_properties_skipped
            .fetch_add(properties as u64, Ordering::Relaxed);
    }

    pub fn request_dispatched(&self) {
        self.requests_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn response_dispatched(&self) {
        self.responses_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn unroutable_message(&self) {
        self.unroutable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn handler_error(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
            unknown_types_skipped: self.unknown_types_skipped.load(Ordering::Relaxed),
            unknown_properties_skipped: self.unknown_properties_skipped.load(Ordering::Relaxed),
            requests_dispatched: self.requests_dispatched.load(Ordering::Relaxed),
            responses_dispatched: self.responses_dispatched.load(Ordering::Relaxed),
            unroutable: self.unroutable.load(Ordering::Relaxed),
            handler_errors: self.handler_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            messages_received = snapshot.messages_received,
            messages_sent = snapshot.messages_sent,
            bytes_received = snapshot.bytes_received,
            bytes_sent = snapshot.bytes_sent,
            decode_errors = snapshot.decode_errors,
            encode_errors = snapshot.encode_errors,
            unknown_types_skipped = snapshot.unknown_types_skipped,
            unknown_properties_skipped = snapshot.unknown_properties_skipped,
            requests_dispatched = snapshot.requests_dispatched,
            responses_dispatched = snapshot.responses_dispatched,
            unroutable = snapshot.unroutable,
            handler_errors = snapshot.handler_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Controller metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub messages_received: u64,
    pub messages_sent: u64,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub decode_errors: u64,
    pub encode_errors: u64,
    pub unknown_types_skipped: u64,
    pub unknown_properties_skipped: u64,
    pub requests_dispatched: u64,
    pub responses_dispatched: u64,
    pub unroutable: u64,
    pub handler_errors: u64,
    pub uptime_seconds: u64,
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Operation completed"
        );
    }
}
