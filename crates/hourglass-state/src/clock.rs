use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hourglass_core::types::Tick;
use tokio::task::{spawn_blocking, JoinHandle};
use tokio::time::{interval_at, Instant};
use tracing::{debug, warn};

use crate::engine::ProtocolEngine;

/// Monotonic tick counter. Only the engine's clock transition moves it.
#[derive(Debug, Default)]
pub struct Clock {
    tick: AtomicU64,
}

impl Clock {
    pub fn starting_at(tick: Tick) -> Self {
        Self {
            tick: AtomicU64::new(tick),
        }
    }

    pub fn now(&self) -> Tick {
        self.tick.load(Ordering::Acquire)
    }

    pub(crate) fn advance(&self) -> Tick {
        self.tick.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Advance the engine clock once per `period`, independent of request traffic.
///
/// The schedule is fixed-rate: a late tick is followed by catch-up ticks
/// rather than shifting every later tick. Each transition takes std locks and
/// writes to sled, so it runs on the blocking pool.
pub fn spawn_ticker(engine: Arc<ProtocolEngine>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        loop {
            interval.tick().await;
            let engine = Arc::clone(&engine);
            match spawn_blocking(move || engine.advance_clock()).await {
                Ok(Ok(tick)) => debug!(tick, "clock advanced"),
                Ok(Err(e)) => warn!(error = %e, "clock tick failed"),
                Err(e) => warn!(error = %e, "clock tick task failed"),
            }
        }
    })
}
