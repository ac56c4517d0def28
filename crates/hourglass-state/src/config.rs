use hourglass_core::constants::{DEFAULT_MAX_HORIZON, DEFAULT_TICK_MS};
use std::time::Duration;

/// Tunables for the protocol engine and its ticker.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// An encrypt window must end no later than `current_tick + max_horizon`.
    pub max_horizon: u64,
    /// Real-time period between clock ticks.
    pub tick_period: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_horizon: DEFAULT_MAX_HORIZON,
            tick_period: Duration::from_millis(DEFAULT_TICK_MS),
        }
    }
}
