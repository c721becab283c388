//! Purge metrics.
//!
//! Process-wide counters updated by purge ticks and schedulers. Lock-free;
//! read them through [`Metrics::snapshot`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicI64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicI64::new(0))
    }

    pub fn set(&self, val: i64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Collected purge metrics.
#[derive(Debug, Default)]
pub struct Metrics {
    // Tick metrics
    pub purge_ticks: Counter,
    pub purge_tick_failures: Counter,
    pub tables_purged: Counter,
    pub condition_compilations: Counter,

    // Scheduler metrics
    pub timers_installed: Counter,
    pub timers_cancelled: Counter,
    pub active_timers: Gauge,

    /// Wall-clock millis of the most recent tick.
    pub last_tick_millis: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            purge_ticks: self.purge_ticks.get(),
            purge_tick_failures: self.purge_tick_failures.get(),
            tables_purged: self.tables_purged.get(),
            condition_compilations: self.condition_compilations.get(),
            timers_installed: self.timers_installed.get(),
            timers_cancelled: self.timers_cancelled.get(),
            active_timers: self.active_timers.get(),
            last_tick_millis: self.last_tick_millis.get(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub purge_ticks: u64,
    pub purge_tick_failures: u64,
    pub tables_purged: u64,
    pub condition_compilations: u64,
    pub timers_installed: u64,
    pub timers_cancelled: u64,
    pub active_timers: i64,
    pub last_tick_millis: i64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
