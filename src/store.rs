//! Thread-safe metrics register shared by the probes and the HTTP server
//!
//! Every read and write goes through one mutex. Writers that must keep a
//! working gauge consistent with its counter do both under a single lock
//! acquisition, so a scrape never sees half of an outcome.

use crate::models::{Counter, Gauge, MetricsSnapshot, Step};
use crate::types::Direction;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Current wall-clock time as fractional epoch seconds
pub fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[derive(Debug)]
pub struct MetricsStore {
    inner: Mutex<MetricsSnapshot>,
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsStore {
    /// Create a store with every metric at its initial value
    pub fn new() -> Self {
        Self::with_start_time(epoch_seconds())
    }

    pub fn with_start_time(now_epoch_seconds: f64) -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::initial(now_epoch_seconds)),
        }
    }

    // A panic while holding the lock cannot leave a half-written value
    // behind: every critical section is a plain store or add.
    fn lock(&self) -> MutexGuard<'_, MetricsSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add one to a counter
    pub fn increment(&self, counter: Counter) {
        let mut metrics = self.lock();
        metrics.counters[counter.index()] += 1;
    }

    /// Overwrite a gauge
    pub fn set(&self, gauge: Gauge, value: f64) {
        let mut metrics = self.lock();
        metrics.gauges[gauge.index()] = value;
    }

    /// Consistent copy of every value
    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().clone()
    }

    /// Record a send outcome: working gauge and direction counter together
    pub fn record_send(&self, direction: Direction, success: bool) {
        self.record_step(Step::Send, direction, success);
    }

    /// Record a receive outcome: working gauge and direction counter together
    pub fn record_receive(&self, direction: Direction, success: bool) {
        self.record_step(Step::Receive, direction, success);
    }

    fn record_step(&self, step: Step, direction: Direction, success: bool) {
        let counter = Counter::for_outcome(step, direction, success);
        let gauge = Gauge::working(step);

        let mut metrics = self.lock();
        metrics.gauges[gauge.index()] = if success { 1.0 } else { 0.0 };
        metrics.counters[counter.index()] += 1;
    }

    /// Record a completed bidirectional cycle
    pub fn record_roundtrip(&self, duration: Duration, finished_at_epoch_seconds: f64) {
        let mut metrics = self.lock();
        metrics.gauges[Gauge::RoundtripDurationSeconds.index()] = duration.as_secs_f64();
        metrics.gauges[Gauge::LastSendReceiveCheckTimestamp.index()] = finished_at_epoch_seconds;
    }

    /// Record a spam score sample
    pub fn record_spam_score(&self, score: u8, checked_at_epoch_seconds: f64) {
        let mut metrics = self.lock();
        metrics.gauges[Gauge::SpamScore.index()] = f64::from(score);
        metrics.gauges[Gauge::LastSpamScoreCheckTimestamp.index()] = checked_at_epoch_seconds;
    }
}
