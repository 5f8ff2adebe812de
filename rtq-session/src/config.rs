/// Session configuration parameters
///
/// Deliberately not loaded from anywhere: interval bounds and total duration
/// are fixed properties of the test protocol.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Inclusive bounds for the random pre-stimulus delay.
    pub wait_range_ms: (u64, u64),
    /// Total session length; the session ends when this expires.
    pub session_duration_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wait_range_ms: (3000, 6000),
            session_duration_ms: 120_000,
        }
    }
}
