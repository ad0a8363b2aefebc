use super::monitor::Monitor;
use chrono::Utc;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// A tick delayed by a long weather check still lands inside the alert hour.
/// The monitor sends at most one digest per day.
const DIGEST_TICK: Duration = Duration::from_secs(60);

/// Drives the monitor from two timers: the weather check every
/// `check_interval` and a digest tick every minute. Both fire once immediately.
pub struct Scheduler {
    monitor: Monitor,
    check_interval: Duration,
}

impl Scheduler {
    pub fn new(monitor: Monitor, check_interval: Duration) -> Self {
        Self {
            monitor,
            check_interval,
        }
    }

    /// Runs until Ctrl-C.
    pub async fn run(self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Runs until `shutdown` resolves. Ticks are handled one at a time, so a
    /// weather check never overlaps a digest or another check.
    pub async fn run_until<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut check = interval(self.check_interval);
        check.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut digest = interval(DIGEST_TICK);
        digest.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);

        tracing::info!(
            check_interval_secs = self.check_interval.as_secs(),
            alert_hour = self.monitor.settings().alert_hour,
            "Scheduler started"
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = check.tick() => {
                    if let Err(e) = self.monitor.run_weather_check_cycle(Utc::now()).await {
                        tracing::error!(error = %e, "Weather check failed");
                    }
                }
                _ = digest.tick() => {
                    match self.monitor.run_daily_digest_if_due(Utc::now()).await {
                        Ok(Some(report)) => tracing::debug!(?report, "Digest tick sent"),
                        Ok(None) => tracing::trace!("Digest not due"),
                        Err(e) => tracing::error!(error = %e, "Daily digest failed"),
                    }
                }
            }
        }
    }
}
