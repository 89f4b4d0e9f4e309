//! DailyReconciler - Background service that runs reconciliation every day.
//!
//! Runs one pass at startup so a restarted process catches up immediately,
//! then sleeps until `reconcile_at` local time and runs again, every day.
//! Reconciliation is idempotent, so the startup pass is harmless when the
//! day was already processed.
//!
//! ## Graceful Shutdown
//!
//! The service listens on a `watch` channel and stops between passes.

use chrono::{Days, NaiveTime, TimeZone};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::application::handlers::lifecycle::{
    ReconcileMembershipsCommand, ReconcileMembershipsHandler, ReconciliationReport,
};
use crate::domain::foundation::Timestamp;
use crate::ports::Clock;

/// Fallback wait when the next run can't be placed on the local calendar.
const FALLBACK_DELAY: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy)]
pub struct DailyReconcilerConfig {
    /// Local wall-clock time of the daily pass.
    pub reconcile_at: NaiveTime,
    /// Zone `reconcile_at` is read in.
    pub timezone: Tz,
    /// Whether to run a pass immediately on start.
    pub run_on_start: bool,
}

pub struct DailyReconciler {
    handler: Arc<ReconcileMembershipsHandler>,
    clock: Arc<dyn Clock>,
    config: DailyReconcilerConfig,
}

impl DailyReconciler {
    pub fn new(
        handler: Arc<ReconcileMembershipsHandler>,
        clock: Arc<dyn Clock>,
        config: DailyReconcilerConfig,
    ) -> Self {
        Self {
            handler,
            clock,
            config,
        }
    }

    /// Runs until the shutdown signal flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        if self.config.run_on_start {
            self.run_once().await;
        }

        loop {
            let delay = delay_until_next(
                self.clock.now(),
                self.config.reconcile_at,
                self.config.timezone,
            );
            tracing::debug!(delay_secs = delay.as_secs(), "Next reconciliation scheduled");

            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("Daily reconciler stopping");
                        return;
                    }
                }
                _ = tokio::time::sleep(delay) => {
                    self.run_once().await;
                }
            }
        }
    }

    /// One reconciliation pass over every gym.
    pub async fn run_once(&self) -> Option<ReconciliationReport> {
        match self.handler.handle(ReconcileMembershipsCommand::default()).await {
            Ok(report) => {
                tracing::info!(
                    gyms = report.gyms,
                    promoted = report.promoted,
                    expired = report.expired,
                    reminded = report.reminded,
                    purged = report.purged,
                    failed = report.failed,
                    "Scheduled reconciliation finished"
                );
                Some(report)
            }
            Err(e) => {
                tracing::error!(error = %e, "Scheduled reconciliation failed");
                None
            }
        }
    }
}

/// Time from `now` until the next `at` on the wall clock of `tz`.
pub fn delay_until_next(now: Timestamp, at: NaiveTime, tz: Tz) -> Duration {
    let now_utc = *now.as_datetime();
    let today = now_utc.with_timezone(&tz).date_naive();

    let next = [Some(today), today.checked_add_days(Days::new(1))]
        .into_iter()
        .flatten()
        .filter_map(|date| tz.from_local_datetime(&date.and_time(at)).earliest())
        .find(|candidate| *candidate > now_utc);

    match next {
        Some(next) => (next.with_timezone(&chrono::Utc) - now_utc)
            .to_std()
            .unwrap_or(FALLBACK_DELAY),
        None => FALLBACK_DELAY,
    }
}
