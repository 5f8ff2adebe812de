use std::time::{Duration, Instant};

/// Trait for monotonic timers
///
/// Timestamps are nanoseconds since the timer's epoch. Everything downstream
/// works against this seam so the sequencer can run on a virtual clock in
/// tests.
pub trait Timer: Clone + Send + Sync {
    type Timestamp: Copy + Clone + Send + Sync;
    fn now(&self) -> Self::Timestamp;
    fn elapsed_since(&self, ts: Self::Timestamp) -> Duration;
}

/// Production timer backed by `Instant`.
#[derive(Debug, Clone)]
pub struct MonotonicTimer {
    start: Instant,
}

impl MonotonicTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for MonotonicTimer {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn elapsed_since(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
}

/// Explicitly advanced clock for tests and headless simulation.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: u64,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance_ms(&mut self, ms: u64) {
        self.now_ns += ms * 1_000_000;
    }

    pub fn advance_ns(&mut self, ns: u64) {
        self.now_ns += ns;
    }
}

impl Timer for ManualTimer {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.now_ns
    }

    fn elapsed_since(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now_ns.saturating_sub(ts))
    }
}
