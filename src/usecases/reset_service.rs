//! Reset scheduler: low-frequency poller that detects a passed weekly
//! reset boundary and triggers one full reconciliation pass.
//!
//! Detection is boundary-relative, not edge-triggered: a delayed or
//! missed tick still fires on the next one, and running the
//! reconciliation twice in the same week just recomputes the same
//! window (the refresh pipeline fully replaces each snapshot).

use crate::domain::reset;
use crate::domain::ResetStatus;
use crate::usecases::refresh_service::RefreshService;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub struct ResetScheduler {
    refresh: Arc<RefreshService>,
    check_interval: Duration,
    /// Most recent boundary a reconciliation was run for.
    last_boundary: Mutex<DateTime<Utc>>,
    shutdown: Notify,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ResetScheduler {
    /// `started_at` seeds the last-seen boundary so only resets that
    /// happen after startup trigger a pass (the refresh loop already
    /// runs once at startup).
    pub fn new(
        refresh: Arc<RefreshService>,
        check_interval: Duration,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            refresh,
            check_interval,
            last_boundary: Mutex::new(reset::current_reset(started_at)),
            shutdown: Notify::new(),
            loop_handle: Mutex::new(None),
        }
    }

    /// Start the polling loop. A second call while running is a no-op.
    pub async fn start(self: Arc<Self>) {
        let mut guard = self.loop_handle.lock().await;
        if guard.is_some() {
            warn!("reset scheduler already running");
            return;
        }
        info!(
            check_interval_secs = self.check_interval.as_secs(),
            "starting weekly reset scheduler"
        );
        let scheduler = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = scheduler.shutdown.notified() => {
                        info!("reset scheduler stopped");
                        break;
                    }
                    _ = tokio::time::sleep(scheduler.check_interval) => {
                        scheduler.reconcile_if_reset_passed(Utc::now()).await;
                    }
                }
            }
        });
        *guard = Some(handle);
    }

    /// Cancel future ticks; an in-flight reconciliation finishes first.
    pub async fn stop(&self) {
        let mut guard = self.loop_handle.lock().await;
        if let Some(handle) = guard.take() {
            self.shutdown.notify_one();
            if let Err(e) = handle.await {
                warn!(error = %e, "reset scheduler join failed");
            }
        }
    }

    /// Run one reconciliation pass if a reset boundary has passed since
    /// the last one acted on. Returns whether a pass was triggered.
    pub async fn reconcile_if_reset_passed(&self, now: DateTime<Utc>) -> bool {
        let boundary = reset::current_reset(now);
        {
            let mut last = self.last_boundary.lock().await;
            if !reset::is_past_reset_since(now, *last) {
                return false;
            }
            *last = boundary;
        }
        info!(boundary = %boundary, "weekly reset detected, starting reconciliation pass");
        if let Err(e) = self.refresh.run_once().await {
            error!(error = %e, "reset reconciliation failed");
        }
        true
    }
}

/// Read-only projection of the reset clock for status reporting.
pub fn reset_status(now: DateTime<Utc>) -> ResetStatus {
    let next_reset = reset::next_reset(now);
    ResetStatus {
        is_reset_time: reset::is_reset_time(now),
        last_reset: reset::current_reset(now),
        next_reset,
        time_until_reset: format_remaining(next_reset - now),
    }
}

/// "1d 2h 3m" style remainder; zero-valued units are omitted.
fn format_remaining(remaining: chrono::Duration) -> String {
    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;
    let mut out = String::new();
    if days > 0 {
        out.push_str(&format!("{days}d "));
    }
    if hours > 0 {
        out.push_str(&format!("{hours}h "));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    let trimmed = out.trim_end();
    if trimmed.is_empty() {
        "0m".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{UserAccount, WeeklyActivityAnalyzer};
    use crate::ports::{GameDataGateway, ProgressStore, UserStore};
    use crate::usecases::refresh_service::RefreshConfig;
    use crate::usecases::testing::{RecordingStore, RosterOutcome, ScriptedGateway, StaticUsers};
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).single().unwrap()
    }

    fn scheduler_with_one_user(started_at: DateTime<Utc>) -> (Arc<ResetScheduler>, Arc<RecordingStore>) {
        let mut gateway = ScriptedGateway::default();
        gateway.roster.insert(
            "token1".to_string(),
            RosterOutcome::Characters(vec![crate::domain::Character {
                id: 1,
                name: "Solo".to_string(),
                realm_slug: "stormrage".to_string(),
                race: "Orc".to_string(),
                class_name: "Shaman".to_string(),
                level: 80,
                faction: "HORDE".to_string(),
            }]),
        );
        let store = Arc::new(RecordingStore::default());
        let refresh = Arc::new(RefreshService::new(
            Arc::new(StaticUsers::new(vec![UserAccount {
                id: "user1".to_string(),
                battle_tag: "Player#1".to_string(),
                credential: "token1".to_string(),
            }])) as Arc<dyn UserStore>,
            Arc::new(gateway) as Arc<dyn GameDataGateway>,
            Arc::clone(&store) as Arc<dyn ProgressStore>,
            WeeklyActivityAnalyzer::with_default_catalog(),
            RefreshConfig {
                batch_delay: Duration::ZERO,
                ..RefreshConfig::default()
            },
        ));
        let scheduler = Arc::new(ResetScheduler::new(
            refresh,
            Duration::from_secs(3600),
            started_at,
        ));
        (scheduler, store)
    }

    #[tokio::test]
    async fn reconciles_once_per_boundary() {
        // Started Monday; boundary passes Tuesday 10:00 UTC.
        let (scheduler, store) = scheduler_with_one_user(utc(2025, 6, 30, 12));

        // Still Monday evening: nothing to do.
        assert!(!scheduler.reconcile_if_reset_passed(utc(2025, 6, 30, 23)).await);
        assert!(store.persisted_ids().is_empty());

        // Wednesday: boundary crossed, even though several ticks were missed.
        assert!(scheduler.reconcile_if_reset_passed(utc(2025, 7, 2, 3)).await);
        assert_eq!(store.persisted_ids(), vec![1]);

        // Second detection in the same week is a no-op.
        assert!(!scheduler.reconcile_if_reset_passed(utc(2025, 7, 3, 3)).await);
    }

    #[test]
    fn remaining_string_omits_zero_units() {
        let d = chrono::Duration::days(1) + chrono::Duration::hours(2) + chrono::Duration::minutes(3);
        assert_eq!(format_remaining(d), "1d 2h 3m");
        assert_eq!(format_remaining(chrono::Duration::minutes(45)), "45m");
        assert_eq!(format_remaining(chrono::Duration::hours(5)), "5h");
        assert_eq!(format_remaining(chrono::Duration::seconds(30)), "0m");
    }

    #[test]
    fn status_projection_tracks_the_clock() {
        // Friday 2025-07-04 12:00 UTC.
        let now = utc(2025, 7, 4, 12);
        let status = reset_status(now);
        assert!(status.is_reset_time);
        assert_eq!(status.last_reset, utc(2025, 7, 1, 10));
        assert_eq!(status.next_reset, utc(2025, 7, 8, 10));
        assert_eq!(status.time_until_reset, "3d 22h");
    }
}
