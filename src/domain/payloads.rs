//! Typed shapes for Battle.net profile payloads.
//!
//! The upstream API is an uncontrolled third party, so every nested
//! field is defensively optional and decoding happens once at the
//! gateway boundary. Evaluators operate on these types, never on raw
//! JSON. Timestamps are epoch milliseconds as delivered by the API.

use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Localized display name; only the en_US variant is consumed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalizedName {
    #[serde(rename = "en_US", default)]
    pub en_us: Option<String>,
}

// ── Mythic+ keystone profile ────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeystoneProfile {
    #[serde(default)]
    pub current_period: Option<KeystonePeriod>,
    #[serde(default)]
    pub seasons: Vec<KeystoneSeason>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeystonePeriod {
    #[serde(default)]
    pub best_runs: Vec<KeystoneRun>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeystoneSeason {
    #[serde(default)]
    pub best_runs: Vec<KeystoneRun>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeystoneRun {
    #[serde(default)]
    pub completed_timestamp: Option<i64>,
    #[serde(default)]
    pub keystone_level: Option<u32>,
}

// ── Raid encounters ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaidEncounters {
    #[serde(default)]
    pub expansions: Vec<RaidExpansion>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaidExpansion {
    #[serde(default)]
    pub instances: Vec<RaidInstance>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaidInstance {
    #[serde(default)]
    pub instance: Option<InstanceRef>,
    #[serde(default)]
    pub modes: Vec<RaidMode>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceRef {
    #[serde(default)]
    pub name: LocalizedName,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaidMode {
    #[serde(default)]
    pub difficulty: Option<DifficultyRef>,
    #[serde(default)]
    pub status: Option<StatusRef>,
    #[serde(default)]
    pub progress: Option<ModeProgress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DifficultyRef {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: LocalizedName,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusRef {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModeProgress {
    #[serde(default)]
    pub encounters: Vec<EncounterProgress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncounterProgress {
    #[serde(default)]
    pub last_kill_timestamp: Option<i64>,
}

// ── Completed quests ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestLog {
    #[serde(default)]
    pub quests: Vec<CompletedQuest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletedQuest {
    #[serde(default)]
    pub quest: Option<QuestRef>,
    #[serde(default)]
    pub completed_timestamp: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestRef {
    #[serde(default)]
    pub name: LocalizedName,
}

// ── PvP summary ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PvpSummary {
    #[serde(default)]
    pub honor_level: Option<u32>,
    #[serde(default)]
    pub honor_progress: Option<u32>,
}

// ── Achievements ────────────────────────────────────────────────────────

/// Fetched alongside the other categories so the per-character snapshot
/// is complete; no tracked activity currently consumes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AchievementsSummary {
    #[serde(default)]
    pub total_quantity: Option<u64>,
    #[serde(default)]
    pub total_points: Option<u64>,
}

// ── Per-category fetch results ──────────────────────────────────────────

/// Outcome of one category fetch: at most one of payload/error is set.
/// A missing fetch (neither set) is treated like a null payload.
#[derive(Debug, Clone, Default)]
pub struct CategoryFetch<T> {
    pub payload: Option<T>,
    pub error: Option<String>,
}

impl<T> CategoryFetch<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Settle one concurrent fetch: success keeps the payload, failure
    /// is recorded as the error string without aborting siblings.
    pub fn settle(category: &'static str, result: Result<T, DomainError>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(e) => {
                warn!(category, error = %e, "category fetch failed");
                Self::failed(e.to_string())
            }
        }
    }
}

/// All category payloads fetched for one character in one pass.
#[derive(Debug, Clone, Default)]
pub struct CharacterActivityData {
    pub mythic_plus: CategoryFetch<KeystoneProfile>,
    pub raids: CategoryFetch<RaidEncounters>,
    pub quests: CategoryFetch<QuestLog>,
    pub pvp: CategoryFetch<PvpSummary>,
    pub achievements: CategoryFetch<AchievementsSummary>,
}
