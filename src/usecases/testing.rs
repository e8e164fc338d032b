//! In-memory port implementations for use case tests.

use crate::domain::payloads::{
    AchievementsSummary, KeystoneProfile, PvpSummary, QuestLog, RaidEncounters,
};
use crate::domain::{ActivityStatus, Character, DomainError, UserAccount};
use crate::ports::{GameDataGateway, ProgressStore, UserStore};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Fixed user listing; optionally parks inside `fetch_users` until the
/// gate is notified, to hold a run open mid-flight.
pub(crate) struct StaticUsers {
    pub users: Vec<UserAccount>,
    pub gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl StaticUsers {
    pub fn new(users: Vec<UserAccount>) -> Self {
        Self {
            users,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fetch_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl UserStore for StaticUsers {
    async fn fetch_users(&self) -> Result<Vec<UserAccount>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(self.users.clone())
    }
}

/// Scripted roster outcome per credential.
pub(crate) enum RosterOutcome {
    Characters(Vec<Character>),
    Fail(String),
}

/// Gateway with scripted rosters; category payloads are empty defaults.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    pub roster: HashMap<String, RosterOutcome>,
    roster_calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn roster_calls(&self) -> usize {
        self.roster_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl GameDataGateway for ScriptedGateway {
    async fn fetch_characters(&self, credential: &str) -> Result<Vec<Character>, DomainError> {
        self.roster_calls.fetch_add(1, Ordering::SeqCst);
        match self.roster.get(credential) {
            Some(RosterOutcome::Characters(characters)) => Ok(characters.clone()),
            Some(RosterOutcome::Fail(message)) => Err(DomainError::Gateway(message.clone())),
            None => Ok(vec![]),
        }
    }

    async fn fetch_keystone_profile(
        &self,
        _realm_slug: &str,
        _character_name: &str,
        _credential: &str,
    ) -> Result<KeystoneProfile, DomainError> {
        Ok(KeystoneProfile::default())
    }

    async fn fetch_raid_encounters(
        &self,
        _realm_slug: &str,
        _character_name: &str,
        _credential: &str,
    ) -> Result<RaidEncounters, DomainError> {
        Ok(RaidEncounters::default())
    }

    async fn fetch_quest_log(
        &self,
        _realm_slug: &str,
        _character_name: &str,
        _credential: &str,
    ) -> Result<QuestLog, DomainError> {
        Ok(QuestLog::default())
    }

    async fn fetch_pvp_summary(
        &self,
        _realm_slug: &str,
        _character_name: &str,
        _credential: &str,
    ) -> Result<PvpSummary, DomainError> {
        Ok(PvpSummary::default())
    }

    async fn fetch_achievements(
        &self,
        _realm_slug: &str,
        _character_name: &str,
        _credential: &str,
    ) -> Result<AchievementsSummary, DomainError> {
        Ok(AchievementsSummary::default())
    }
}

/// Records persisted snapshots; fails for configured character ids.
#[derive(Default)]
pub(crate) struct RecordingStore {
    pub fail_for: HashSet<u64>,
    persisted: Mutex<Vec<(u64, Vec<ActivityStatus>)>>,
}

impl RecordingStore {
    /// Character ids persisted so far, sorted for stable assertions.
    pub fn persisted_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .persisted
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait::async_trait]
impl ProgressStore for RecordingStore {
    async fn persist_results(
        &self,
        character: &Character,
        results: &[ActivityStatus],
        _updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if self.fail_for.contains(&character.id) {
            return Err(DomainError::Store("write failed".to_string()));
        }
        self.persisted
            .lock()
            .unwrap()
            .push((character.id, results.to_vec()));
        Ok(())
    }
}
