//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::payloads::{
    AchievementsSummary, KeystoneProfile, PvpSummary, QuestLog, RaidEncounters,
};
use crate::domain::{ActivityStatus, Character, DomainError, UserAccount};
use chrono::{DateTime, Utc};

/// Registered users with stored credentials.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// All known users. Users without a usable credential are returned
    /// with an empty one; the orchestrator skips them.
    async fn fetch_users(&self) -> Result<Vec<UserAccount>, DomainError>;
}

/// Battle.net profile gateway. One method per category payload; every
/// method may fail independently, and the caller settles failures into
/// `(null, error)` pairs rather than aborting sibling fetches.
#[async_trait::async_trait]
pub trait GameDataGateway: Send + Sync {
    /// The user's character roster.
    async fn fetch_characters(&self, credential: &str) -> Result<Vec<Character>, DomainError>;

    /// Mythic+ keystone profile (timed dungeon runs).
    async fn fetch_keystone_profile(
        &self,
        realm_slug: &str,
        character_name: &str,
        credential: &str,
    ) -> Result<KeystoneProfile, DomainError>;

    /// Raid encounter progress across expansions/instances/modes.
    async fn fetch_raid_encounters(
        &self,
        realm_slug: &str,
        character_name: &str,
        credential: &str,
    ) -> Result<RaidEncounters, DomainError>;

    /// Completed quests with timestamps.
    async fn fetch_quest_log(
        &self,
        realm_slug: &str,
        character_name: &str,
        credential: &str,
    ) -> Result<QuestLog, DomainError>;

    /// PvP honor summary.
    async fn fetch_pvp_summary(
        &self,
        realm_slug: &str,
        character_name: &str,
        credential: &str,
    ) -> Result<PvpSummary, DomainError>;

    /// Achievement statistics (snapshot completeness only).
    async fn fetch_achievements(
        &self,
        realm_slug: &str,
        character_name: &str,
        credential: &str,
    ) -> Result<AchievementsSummary, DomainError>;
}

/// Persistence for per-character weekly snapshots.
#[async_trait::async_trait]
pub trait ProgressStore: Send + Sync {
    /// Replace the character's current-week snapshot. Overwrite
    /// semantics — not an append log.
    async fn persist_results(
        &self,
        character: &Character,
        results: &[ActivityStatus],
        updated_at: DateTime<Utc>,
    ) -> Result<(), DomainError>;
}
