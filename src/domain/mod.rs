//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod analyzer;
pub mod catalog;
pub mod entities;
pub mod errors;
pub mod evaluate;
pub mod payloads;
pub mod reset;

pub use analyzer::WeeklyActivityAnalyzer;
pub use catalog::{SeasonalEventConfig, TrackedActivity};
pub use entities::{
    ActivityCategory, ActivityDetail, ActivityStatus, Character, CharacterProgress,
    CompletedQuestEntry, QuestDetail, RaidDifficulty, RefreshStats, ResetCadence, ResetStatus,
    UserAccount,
};
pub use errors::DomainError;
pub use payloads::{CategoryFetch, CharacterActivityData};
