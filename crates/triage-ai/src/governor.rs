//! Call pacing and per-run call quota.

use std::time::Duration;

use tracing::debug;
use triage_core::CoreError;

pub const DEFAULT_MIN_INTERVAL_SECS: f64 = 13.0;
pub const DEFAULT_MAX_CALLS: u32 = 20;

#[derive(Debug, Clone, Copy)]
pub struct Governor {
    min_interval: Duration,
    max_calls_per_run: u32,
}

impl Default for Governor {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs_f64(DEFAULT_MIN_INTERVAL_SECS),
            max_calls_per_run: DEFAULT_MAX_CALLS,
        }
    }
}

impl Governor {
    pub fn new(min_interval_secs: f64, max_calls_per_run: u32) -> Result<Self, CoreError> {
        if !min_interval_secs.is_finite() || min_interval_secs < 0.0 {
            return Err(CoreError::Config(format!(
                "minimum call interval must be a non-negative number of seconds, got {min_interval_secs}"
            )));
        }
        if max_calls_per_run == 0 {
            return Err(CoreError::Config(
                "max calls per run must be positive".into(),
            ));
        }
        let min_interval = Duration::try_from_secs_f64(min_interval_secs).map_err(|e| {
            CoreError::Config(format!(
                "minimum call interval of {min_interval_secs} seconds is out of range: {e}"
            ))
        })?;
        Ok(Self {
            min_interval,
            max_calls_per_run,
        })
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn max_calls_per_run(&self) -> u32 {
        self.max_calls_per_run
    }

    /// Whether another call may be issued after `calls_made` this run.
    pub fn should_continue(&self, calls_made: u32) -> bool {
        calls_made < self.max_calls_per_run
    }

    /// Wait out the minimum interval. Called between calls only.
    pub async fn throttle(&self) {
        if self.min_interval.is_zero() {
            return;
        }
        debug!(secs = self.min_interval.as_secs_f64(), "throttling before next call");
        tokio::time::sleep(self.min_interval).await;
    }
}
