//! Periodic ticker for snippet countdowns.
//!
//! [`Ticker::spawn`] runs a callback every `period` on the tokio runtime,
//! starting one period after the spawn, until the optional overall limit
//! passes or the handle stops it. Tick `n` (zero-based) fires at
//! `(n + 1) * period`; a tick landing exactly on the limit still fires.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::{Result, TuneError};

pub struct Ticker;

impl Ticker {
    /// Start ticking. `on_tick` receives the zero-based tick number.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F>(period: Duration, limit: Option<Duration>, mut on_tick: F) -> Result<TickerHandle>
    where
        F: FnMut(u64) + Send + 'static,
    {
        if period.is_zero() {
            return Err(TuneError::InvalidInput(
                "ticker period must be non-zero".to_string(),
            ));
        }

        let task = tokio::spawn(async move {
            let start = Instant::now();
            let mut interval = time::interval_at(start + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut tick = 0u64;
            loop {
                let at = interval.tick().await;
                if limit.is_some_and(|limit| at.duration_since(start) > limit) {
                    break;
                }
                on_tick(tick);
                tick += 1;
            }
            debug!(ticks = tick, "ticker finished");
        });

        Ok(TickerHandle { task })
    }
}

/// Handle to a running [`Ticker`]. Dropping it does not stop the ticker.
pub struct TickerHandle {
    task: JoinHandle<()>,
}

impl TickerHandle {
    /// Stop ticking. A callback already running completes; no later tick fires.
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait until the ticker reaches its limit or is stopped.
    ///
    /// Never returns for an unlimited ticker that nobody stops.
    pub async fn finished(self) {
        if let Err(e) = self.task.await
            && e.is_panic()
        {
            warn!("ticker callback panicked");
        }
    }
}
