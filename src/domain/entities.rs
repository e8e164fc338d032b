//! Domain entities. Pure data structures for the core business.
//!
//! No HTTP/database types here — these are mapped from adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One kind of trackable source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    MythicPlus,
    Raid,
    Quest,
    Pvp,
    Seasonal,
}

/// Raid difficulty targeted by a tracked raid activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RaidDifficulty {
    Normal,
    Heroic,
    Mythic,
}

/// Cadence at which a tracked activity's completion restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetCadence {
    Weekly,
    Daily,
}

/// A registered account whose roster we refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub battle_tag: String,
    /// OAuth access token. Empty means the user is skipped for the run.
    pub credential: String,
}

/// A character on a user's roster, flattened from the profile API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: u64,
    pub name: String,
    pub realm_slug: String,
    pub race: String,
    pub class_name: String,
    pub level: u32,
    pub faction: String,
}

/// Per-activity completion verdict for one character, one catalog entry.
///
/// Invariant: `error` and `completed == true` are mutually exclusive —
/// a failed category fetch forces `completed = false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityStatus {
    /// `<characterId>_<activityId>`, unique per character and activity.
    pub id: String,
    pub name: String,
    pub category: ActivityCategory,
    pub description: String,
    pub completed: bool,
    pub progress: u32,
    pub max_progress: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<ActivityDetail>,
}

/// Category-specific completion detail, owned by its [`ActivityStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityDetail {
    /// Highest keystone level among runs completed this period.
    KeystoneLevel(u32),
    Quests(QuestDetail),
}

/// Quests completed since the weekly reset, most recent first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestDetail {
    pub completed_quests: Vec<CompletedQuestEntry>,
    pub total_quests_this_week: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedQuestEntry {
    pub name: String,
    pub completed_at: DateTime<Utc>,
    /// Hours elapsed since completion, computed at evaluation time.
    pub hours_ago: i64,
}

/// Full current-week snapshot persisted for a character. Overwritten on
/// every refresh, never appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterProgress {
    pub character_id: u64,
    pub character_name: String,
    pub realm: String,
    pub race: String,
    pub class_name: String,
    pub level: u32,
    pub faction: String,
    pub activities: Vec<ActivityStatus>,
    pub last_updated: DateTime<Utc>,
}

/// Aggregate counters for the most recent refresh run. Published
/// atomically at run end; readers always see the last completed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshStats {
    pub total_users: usize,
    pub total_characters: usize,
    pub successful_refreshes: usize,
    pub failed_refreshes: usize,
    pub last_refresh: Option<DateTime<Utc>>,
    pub next_refresh: Option<DateTime<Utc>>,
    pub completed_runs: u64,
    pub average_refresh_ms: u64,
}

/// Read-only projection of the weekly reset clock.
#[derive(Debug, Clone, Serialize)]
pub struct ResetStatus {
    pub is_reset_time: bool,
    pub last_reset: DateTime<Utc>,
    pub next_reset: DateTime<Utc>,
    pub time_until_reset: String,
}
