//! Weekly activity analyzer. Orchestrates the evaluators over the
//! tracked-activity catalog.
//!
//! Pure: no I/O, no persistence. The reset boundary is recomputed from
//! `now` on every call, and identical inputs produce identical output.

use crate::domain::catalog::{self, TrackedActivity};
use crate::domain::entities::{ActivityCategory, ActivityStatus};
use crate::domain::evaluate::{self, Verdict};
use crate::domain::payloads::CharacterActivityData;
use crate::domain::reset;
use chrono::{DateTime, Utc};

pub struct WeeklyActivityAnalyzer {
    catalog: Vec<TrackedActivity>,
}

impl WeeklyActivityAnalyzer {
    pub fn new(catalog: Vec<TrackedActivity>) -> Self {
        Self { catalog }
    }

    pub fn with_default_catalog() -> Self {
        Self::new(catalog::default_catalog())
    }

    /// Produce the completion status of every tracked activity for one
    /// character, in catalog order. A category whose fetch errored gets
    /// the error attached and is never evaluated; a category that was
    /// not fetched at all behaves like a null payload.
    pub fn analyze(
        &self,
        character_id: u64,
        data: &CharacterActivityData,
        now: DateTime<Utc>,
    ) -> Vec<ActivityStatus> {
        let boundary = reset::current_reset(now);
        self.catalog
            .iter()
            .map(|definition| self.analyze_one(definition, character_id, data, boundary, now))
            .collect()
    }

    fn analyze_one(
        &self,
        definition: &TrackedActivity,
        character_id: u64,
        data: &CharacterActivityData,
        boundary: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ActivityStatus {
        let mut status = ActivityStatus {
            id: format!("{}_{}", character_id, definition.id),
            name: definition.name.to_string(),
            category: definition.category,
            description: definition.description.to_string(),
            completed: false,
            progress: 0,
            max_progress: 1,
            error: None,
            detail: None,
        };

        match definition.category {
            ActivityCategory::MythicPlus => {
                if let Some(err) = &data.mythic_plus.error {
                    status.error = Some(err.clone());
                } else {
                    apply(
                        &mut status,
                        evaluate::evaluate_mythic_plus(data.mythic_plus.payload.as_ref(), boundary),
                    );
                }
            }
            ActivityCategory::Raid => {
                if let Some(err) = &data.raids.error {
                    status.error = Some(err.clone());
                } else {
                    let target = catalog::raid_difficulty_for(definition.id);
                    apply(
                        &mut status,
                        evaluate::evaluate_raid(data.raids.payload.as_ref(), target, boundary),
                    );
                }
            }
            ActivityCategory::Quest => {
                if let Some(err) = &data.quests.error {
                    status.error = Some(err.clone());
                } else {
                    apply(
                        &mut status,
                        evaluate::evaluate_quests(data.quests.payload.as_ref(), boundary, now),
                    );
                }
            }
            ActivityCategory::Pvp => {
                if let Some(err) = &data.pvp.error {
                    status.error = Some(err.clone());
                } else {
                    apply(
                        &mut status,
                        evaluate::evaluate_pvp(data.pvp.payload.as_ref()),
                    );
                }
            }
            ActivityCategory::Seasonal => {
                // Seasonal draws on both raid and quest data; it is only
                // marked errored when neither source is usable.
                if data.raids.error.is_some() && data.quests.error.is_some() {
                    status.error = data.raids.error.clone();
                } else if let Some(event) = &definition.seasonal {
                    apply(
                        &mut status,
                        evaluate::evaluate_seasonal(
                            event,
                            data.raids.payload.as_ref(),
                            data.quests.payload.as_ref(),
                            now,
                        ),
                    );
                }
            }
        }

        status
    }
}

fn apply(status: &mut ActivityStatus, verdict: Verdict) {
    status.completed = verdict.completed;
    status.progress = u32::from(verdict.completed);
    status.detail = verdict.detail;
}
