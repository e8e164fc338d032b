//! Refresh orchestrator: enumerate users -> batch -> fetch -> analyze -> persist.
//!
//! - One run at a time process-wide; a trigger during a run is a logged no-op
//! - Users within a batch refresh concurrently; batches run sequentially with
//!   a short delay between them to back off the external API
//! - Per-category fetch failures settle into `(null, error)` pairs; one
//!   character's or user's failure never aborts the batch or the run
//! - Counters are accumulated per run and published atomically at run end

use crate::domain::payloads::{CategoryFetch, CharacterActivityData};
use crate::domain::{Character, DomainError, RefreshStats, UserAccount, WeeklyActivityAnalyzer};
use crate::ports::{GameDataGateway, ProgressStore, UserStore};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Tuning for the recurring refresh.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Sleep between scheduled runs.
    pub interval: Duration,
    /// Users refreshed concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches (API backpressure).
    pub batch_delay: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30 * 60),
            batch_size: 5,
            batch_delay: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Default)]
struct RunTotals {
    users: usize,
    characters: usize,
    succeeded: usize,
    failed: usize,
}

/// Per-user outcome folded into the run totals.
#[derive(Debug, Default)]
struct UserTotals {
    characters: usize,
    succeeded: usize,
    failed: usize,
}

/// The fetch -> analyze -> persist pipeline for one user's roster.
/// Cheap to clone into the per-user tasks of a batch.
#[derive(Clone)]
struct UserRefresher {
    gateway: Arc<dyn GameDataGateway>,
    progress: Arc<dyn ProgressStore>,
    analyzer: Arc<WeeklyActivityAnalyzer>,
}

impl UserRefresher {
    async fn process_user(&self, user: UserAccount) -> UserTotals {
        let mut totals = UserTotals::default();
        if user.credential.trim().is_empty() {
            info!(user_id = %user.id, "skipping user without stored credential");
            return totals;
        }
        let characters = match self.gateway.fetch_characters(&user.credential).await {
            Ok(characters) => characters,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "character roster fetch failed");
                totals.failed += 1;
                return totals;
            }
        };
        if characters.is_empty() {
            info!(user_id = %user.id, "no characters on account");
            return totals;
        }
        totals.characters = characters.len();
        for character in &characters {
            match self.refresh_character(character, &user.credential).await {
                Ok(()) => totals.succeeded += 1,
                Err(e) => {
                    warn!(
                        character = %character.name,
                        realm = %character.realm_slug,
                        error = %e,
                        "character refresh failed"
                    );
                    totals.failed += 1;
                }
            }
        }
        totals
    }

    async fn refresh_character(
        &self,
        character: &Character,
        credential: &str,
    ) -> Result<(), DomainError> {
        let data = self
            .fetch_activity_data(&character.realm_slug, &character.name, credential)
            .await;
        let now = Utc::now();
        let results = self.analyzer.analyze(character.id, &data, now);
        let completed = results.iter().filter(|status| status.completed).count();
        debug!(
            character = %character.name,
            realm = %character.realm_slug,
            completed,
            total = results.len(),
            "weekly activities analyzed"
        );
        self.progress.persist_results(character, &results, now).await
    }

    /// Settle-all fan-out: the five category fetches run concurrently
    /// and each failure is captured on its own; `join!` never cancels
    /// siblings, so one rejected category cannot fail the others.
    async fn fetch_activity_data(
        &self,
        realm_slug: &str,
        name: &str,
        credential: &str,
    ) -> CharacterActivityData {
        let (mythic_plus, raids, quests, pvp, achievements) = tokio::join!(
            self.gateway.fetch_keystone_profile(realm_slug, name, credential),
            self.gateway.fetch_raid_encounters(realm_slug, name, credential),
            self.gateway.fetch_quest_log(realm_slug, name, credential),
            self.gateway.fetch_pvp_summary(realm_slug, name, credential),
            self.gateway.fetch_achievements(realm_slug, name, credential),
        );
        CharacterActivityData {
            mythic_plus: CategoryFetch::settle("mythic_plus", mythic_plus),
            raids: CategoryFetch::settle("raids", raids),
            quests: CategoryFetch::settle("quests", quests),
            pvp: CategoryFetch::settle("pvp", pvp),
            achievements: CategoryFetch::settle("achievements", achievements),
        }
    }
}

/// Refresh service. Owns its collaborators and the only mutable shared
/// state in the core: the stats snapshot and the run-in-progress flag.
pub struct RefreshService {
    users: Arc<dyn UserStore>,
    refresher: UserRefresher,
    config: RefreshConfig,
    stats: RwLock<RefreshStats>,
    running: AtomicBool,
    shutdown: Notify,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshService {
    pub fn new(
        users: Arc<dyn UserStore>,
        gateway: Arc<dyn GameDataGateway>,
        progress: Arc<dyn ProgressStore>,
        analyzer: WeeklyActivityAnalyzer,
        config: RefreshConfig,
    ) -> Self {
        Self {
            users,
            refresher: UserRefresher {
                gateway,
                progress,
                analyzer: Arc::new(analyzer),
            },
            config,
            stats: RwLock::new(RefreshStats::default()),
            running: AtomicBool::new(false),
            shutdown: Notify::new(),
            loop_handle: Mutex::new(None),
        }
    }

    /// Start the recurring refresh loop: one run immediately, then one
    /// per configured interval. A second call while running is a no-op.
    pub async fn start(self: Arc<Self>) {
        let mut guard = self.loop_handle.lock().await;
        if guard.is_some() {
            warn!("auto-refresh loop already running");
            return;
        }
        info!(
            interval_secs = self.config.interval.as_secs(),
            batch_size = self.config.batch_size,
            "starting auto-refresh loop"
        );
        let service = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            loop {
                if let Err(e) = service.run_once().await {
                    error!(error = %e, "refresh run failed");
                }
                tokio::select! {
                    _ = service.shutdown.notified() => {
                        info!("auto-refresh loop stopped");
                        break;
                    }
                    _ = tokio::time::sleep(service.config.interval) => {}
                }
            }
        });
        *guard = Some(handle);
    }

    /// Cancel future scheduled runs. An in-flight run always finishes;
    /// idempotent.
    pub async fn stop(&self) {
        let mut guard = self.loop_handle.lock().await;
        if let Some(handle) = guard.take() {
            self.shutdown.notify_one();
            if let Err(e) = handle.await {
                warn!(error = %e, "refresh loop join failed");
            }
        }
    }

    /// One full pass over every user and character. Returns immediately
    /// (without touching any counter) when a run is already in progress.
    pub async fn run_once(&self) -> Result<(), DomainError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            info!("refresh already in progress, skipping");
            return Ok(());
        }

        let started = Instant::now();
        let result = self.refresh_all().await;
        match &result {
            Ok(totals) => {
                let elapsed = started.elapsed();
                info!(
                    users = totals.users,
                    characters = totals.characters,
                    succeeded = totals.succeeded,
                    failed = totals.failed,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "refresh run complete"
                );
                self.publish_stats(totals, elapsed).await;
            }
            // Stats keep the last completed run; a failed user listing
            // never leaves them half-updated.
            Err(e) => error!(error = %e, "refresh run aborted"),
        }
        self.running.store(false, Ordering::SeqCst);
        result.map(|_| ())
    }

    /// Manual trigger, same pipeline and single-run rule as a scheduled
    /// run. Returns the stats snapshot after the pass.
    pub async fn force_refresh(&self) -> Result<RefreshStats, DomainError> {
        info!("manual refresh triggered");
        self.run_once().await?;
        Ok(self.stats().await)
    }

    /// Snapshot of the last completed run's counters.
    pub async fn stats(&self) -> RefreshStats {
        self.stats.read().await.clone()
    }

    async fn refresh_all(&self) -> Result<RunTotals, DomainError> {
        let users = self.users.fetch_users().await?;
        let mut totals = RunTotals {
            users: users.len(),
            ..RunTotals::default()
        };
        if users.is_empty() {
            info!("no users registered, nothing to refresh");
            return Ok(totals);
        }

        let batches = chunk_into(&users, self.config.batch_size);
        let batch_count = batches.len();
        for (index, batch) in batches.into_iter().enumerate() {
            let batch_totals = self.process_batch(batch).await;
            totals.characters += batch_totals.characters;
            totals.succeeded += batch_totals.succeeded;
            totals.failed += batch_totals.failed;
            if index + 1 < batch_count {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }
        Ok(totals)
    }

    /// All users in a batch refresh concurrently.
    async fn process_batch(&self, batch: Vec<UserAccount>) -> UserTotals {
        let mut handles = Vec::with_capacity(batch.len());
        for user in batch {
            let worker = self.refresher.clone();
            handles.push(tokio::spawn(async move { worker.process_user(user).await }));
        }
        let mut totals = UserTotals::default();
        for handle in handles {
            match handle.await {
                Ok(user_totals) => {
                    totals.characters += user_totals.characters;
                    totals.succeeded += user_totals.succeeded;
                    totals.failed += user_totals.failed;
                }
                Err(e) => {
                    totals.failed += 1;
                    error!(error = %e, "user refresh task panicked");
                }
            }
        }
        totals
    }

    async fn publish_stats(&self, totals: &RunTotals, elapsed: Duration) {
        let mut stats = self.stats.write().await;
        stats.total_users = totals.users;
        stats.total_characters = totals.characters;
        stats.successful_refreshes = totals.succeeded;
        stats.failed_refreshes = totals.failed;
        let now = Utc::now();
        stats.last_refresh = Some(now);
        stats.next_refresh =
            Some(now + chrono::Duration::milliseconds(self.config.interval.as_millis() as i64));
        stats.completed_runs += 1;
        let elapsed_ms = elapsed.as_millis() as u64;
        stats.average_refresh_ms = if stats.completed_runs == 1 {
            elapsed_ms
        } else {
            (stats.average_refresh_ms * (stats.completed_runs - 1) + elapsed_ms)
                / stats.completed_runs
        };
    }
}

/// Partition users into fixed-size batches; the last batch may be short.
fn chunk_into<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items
        .chunks(size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::testing::{RecordingStore, RosterOutcome, ScriptedGateway, StaticUsers};

    fn character(id: u64, name: &str) -> Character {
        Character {
            id,
            name: name.to_string(),
            realm_slug: "stormrage".to_string(),
            race: "Orc".to_string(),
            class_name: "Shaman".to_string(),
            level: 80,
            faction: "HORDE".to_string(),
        }
    }

    fn user(n: usize) -> UserAccount {
        UserAccount {
            id: format!("user{n}"),
            battle_tag: format!("Player{n}#1234"),
            credential: format!("token{n}"),
        }
    }

    fn test_config() -> RefreshConfig {
        RefreshConfig {
            interval: Duration::from_secs(60),
            batch_size: 2,
            batch_delay: Duration::ZERO,
        }
    }

    #[allow(clippy::type_complexity)]
    fn build_service(
        users: StaticUsers,
        gateway: ScriptedGateway,
        store: RecordingStore,
    ) -> (
        Arc<RefreshService>,
        Arc<StaticUsers>,
        Arc<ScriptedGateway>,
        Arc<RecordingStore>,
    ) {
        let users = Arc::new(users);
        let gateway = Arc::new(gateway);
        let store = Arc::new(store);
        let service = Arc::new(RefreshService::new(
            Arc::clone(&users) as Arc<dyn UserStore>,
            Arc::clone(&gateway) as Arc<dyn GameDataGateway>,
            Arc::clone(&store) as Arc<dyn ProgressStore>,
            WeeklyActivityAnalyzer::with_default_catalog(),
            test_config(),
        ));
        (service, users, gateway, store)
    }

    #[test]
    fn chunking_partitions_with_short_tail() {
        let batches = chunk_into(&[1, 2, 3, 4, 5], 2);
        assert_eq!(batches, vec![vec![1, 2], vec![3, 4], vec![5]]);
        // A zero batch size degrades to singletons instead of panicking.
        assert_eq!(chunk_into(&[1, 2], 0).len(), 2);
    }

    #[tokio::test]
    async fn one_failing_user_does_not_abort_the_run() {
        let mut gateway = ScriptedGateway::default();
        for n in 1..=5 {
            let outcome = if n == 3 {
                RosterOutcome::Fail("HTTP 500: oops".to_string())
            } else {
                RosterOutcome::Characters(vec![character(n as u64, &format!("Char{n}"))])
            };
            gateway.roster.insert(format!("token{n}"), outcome);
        }
        let (service, _, _, store) = build_service(
            StaticUsers::new((1..=5).map(user).collect()),
            gateway,
            RecordingStore::default(),
        );

        service.run_once().await.unwrap();

        let persisted = store.persisted_ids();
        assert_eq!(persisted.len(), 4);
        assert!(!persisted.contains(&3));

        let stats = service.stats().await;
        assert_eq!(stats.total_users, 5);
        assert_eq!(stats.total_characters, 4);
        assert_eq!(stats.successful_refreshes, 4);
        assert_eq!(stats.failed_refreshes, 1);
        assert_eq!(stats.completed_runs, 1);
    }

    #[tokio::test]
    async fn persistence_failure_counts_per_character() {
        let mut gateway = ScriptedGateway::default();
        gateway.roster.insert(
            "token1".to_string(),
            RosterOutcome::Characters(vec![character(10, "Ok"), character(11, "Broken")]),
        );
        let mut store = RecordingStore::default();
        store.fail_for.insert(11);
        let (service, _, _, store) = build_service(StaticUsers::new(vec![user(1)]), gateway, store);

        service.run_once().await.unwrap();

        assert_eq!(store.persisted_ids(), vec![10]);
        let stats = service.stats().await;
        assert_eq!(stats.total_characters, 2);
        assert_eq!(stats.successful_refreshes, 1);
        assert_eq!(stats.failed_refreshes, 1);
    }

    #[tokio::test]
    async fn user_without_credential_is_skipped_not_failed() {
        let mut no_token = user(1);
        no_token.credential = "  ".to_string();
        let (service, _, gateway, store) = build_service(
            StaticUsers::new(vec![no_token]),
            ScriptedGateway::default(),
            RecordingStore::default(),
        );

        service.run_once().await.unwrap();

        assert_eq!(gateway.roster_calls(), 0);
        assert!(store.persisted_ids().is_empty());
        let stats = service.stats().await;
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.failed_refreshes, 0);
    }

    #[tokio::test]
    async fn concurrent_trigger_is_a_no_op() {
        let mut gateway = ScriptedGateway::default();
        gateway.roster.insert(
            "token1".to_string(),
            RosterOutcome::Characters(vec![character(1, "Solo")]),
        );
        let gate = Arc::new(Notify::new());
        let mut users = StaticUsers::new(vec![user(1)]);
        users.gate = Some(Arc::clone(&gate));
        let (service, users, _, store) = build_service(users, gateway, RecordingStore::default());

        let first = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.run_once().await })
        };
        // Wait until the first run is parked inside the user listing.
        while users.fetch_calls() == 0 {
            tokio::task::yield_now().await;
        }

        // Second trigger must return immediately without a second listing.
        service.run_once().await.unwrap();
        assert_eq!(users.fetch_calls(), 1);

        gate.notify_one();
        first.await.unwrap().unwrap();

        assert_eq!(users.fetch_calls(), 1);
        assert_eq!(store.persisted_ids(), vec![1]);
        assert_eq!(service.stats().await.completed_runs, 1);
    }

    #[tokio::test]
    async fn force_refresh_returns_fresh_stats() {
        let mut gateway = ScriptedGateway::default();
        gateway.roster.insert(
            "token1".to_string(),
            RosterOutcome::Characters(vec![character(1, "Solo")]),
        );
        let (service, _, _, _) = build_service(
            StaticUsers::new(vec![user(1)]),
            gateway,
            RecordingStore::default(),
        );

        let stats = service.force_refresh().await.unwrap();
        assert_eq!(stats.successful_refreshes, 1);
        assert!(stats.last_refresh.is_some());
        assert!(stats.next_refresh.is_some());
    }
}
