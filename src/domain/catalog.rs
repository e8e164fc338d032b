//! Static catalog of tracked weekly activities.
//!
//! Loaded once at startup; iteration order is the order results are
//! reported in, so it must stay stable.

use crate::domain::entities::{ActivityCategory, RaidDifficulty, ResetCadence};
use chrono::{Datelike, NaiveDate};

/// One catalog entry a character's completion is evaluated against.
#[derive(Debug, Clone)]
pub struct TrackedActivity {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ActivityCategory,
    pub description: &'static str,
    pub cadence: ResetCadence,
    /// Present only for [`ActivityCategory::Seasonal`] entries.
    pub seasonal: Option<SeasonalEventConfig>,
}

/// Configuration for a limited-time event. The active window is a pair
/// of calendar (month, day) dates, deliberately not reset-boundary
/// relative; completion for these entries restarts daily.
#[derive(Debug, Clone)]
pub struct SeasonalEventConfig {
    pub event_id: &'static str,
    /// First active day, inclusive, as (month, day) in UTC.
    pub starts: (u32, u32),
    /// Last active day, inclusive, as (month, day) in UTC.
    pub ends: (u32, u32),
    /// Fragment matched against raid instance names in encounter data.
    pub raid_instance: &'static str,
    /// Substrings matched against completed quest names.
    pub quest_markers: &'static [&'static str],
}

impl SeasonalEventConfig {
    /// True iff `date` falls inside the configured window. Windows may
    /// wrap the year end (e.g. mid-December through early January).
    pub fn is_active(&self, date: NaiveDate) -> bool {
        let today = (date.month(), date.day());
        if self.starts <= self.ends {
            today >= self.starts && today <= self.ends
        } else {
            today >= self.starts || today <= self.ends
        }
    }
}

const WEEKLY_ACTIVITIES: &[TrackedActivity] = &[
    TrackedActivity {
        id: "mythic_plus_weekly",
        name: "Mythic+ Weekly",
        category: ActivityCategory::MythicPlus,
        description: "Complete a Mythic+ dungeon",
        cadence: ResetCadence::Weekly,
        seasonal: None,
    },
    TrackedActivity {
        id: "raid_normal_weekly",
        name: "Raid Normal Weekly",
        category: ActivityCategory::Raid,
        description: "Complete normal raid encounters",
        cadence: ResetCadence::Weekly,
        seasonal: None,
    },
    TrackedActivity {
        id: "raid_heroic_weekly",
        name: "Raid Heroic Weekly",
        category: ActivityCategory::Raid,
        description: "Complete heroic raid encounters",
        cadence: ResetCadence::Weekly,
        seasonal: None,
    },
    TrackedActivity {
        id: "raid_mythic_weekly",
        name: "Raid Mythic Weekly",
        category: ActivityCategory::Raid,
        description: "Complete mythic raid encounters",
        cadence: ResetCadence::Weekly,
        seasonal: None,
    },
    TrackedActivity {
        id: "weekly_quest",
        name: "Weekly Quest",
        category: ActivityCategory::Quest,
        description: "Complete weekly world quest",
        cadence: ResetCadence::Weekly,
        seasonal: None,
    },
    TrackedActivity {
        id: "pvp_weekly",
        name: "PvP Weekly",
        category: ActivityCategory::Pvp,
        description: "Complete PvP weekly objectives",
        cadence: ResetCadence::Weekly,
        seasonal: None,
    },
    TrackedActivity {
        id: "hallows_end_daily",
        name: "Hallow's End",
        category: ActivityCategory::Seasonal,
        description: "Defeat the Headless Horseman or complete an event quest",
        cadence: ResetCadence::Daily,
        seasonal: Some(SeasonalEventConfig {
            event_id: "hallows_end",
            starts: (10, 18),
            ends: (11, 1),
            raid_instance: "Headless Horseman",
            quest_markers: &["Hallow", "Candy Bucket", "Headless Horseman"],
        }),
    },
];

/// The default tracked-activity catalog, in reporting order.
pub fn default_catalog() -> Vec<TrackedActivity> {
    WEEKLY_ACTIVITIES.to_vec()
}

/// Raid difficulty a tracked raid activity targets, keyed by catalog id.
/// Unknown ids fall back to Normal.
pub fn raid_difficulty_for(activity_id: &str) -> RaidDifficulty {
    match activity_id {
        "raid_heroic_weekly" => RaidDifficulty::Heroic,
        "raid_mythic_weekly" => RaidDifficulty::Mythic,
        _ => RaidDifficulty::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_order_is_stable() {
        let catalog = default_catalog();
        for activity in &catalog {
            let expected = if activity.category == ActivityCategory::Seasonal {
                ResetCadence::Daily
            } else {
                ResetCadence::Weekly
            };
            assert_eq!(activity.cadence, expected, "{}", activity.id);
        }
        let ids: Vec<&str> = catalog.iter().map(|a| a.id).collect();
        assert_eq!(
            ids,
            vec![
                "mythic_plus_weekly",
                "raid_normal_weekly",
                "raid_heroic_weekly",
                "raid_mythic_weekly",
                "weekly_quest",
                "pvp_weekly",
                "hallows_end_daily",
            ]
        );
    }

    #[test]
    fn difficulty_lookup_matches_activity_ids() {
        assert_eq!(
            raid_difficulty_for("raid_normal_weekly"),
            RaidDifficulty::Normal
        );
        assert_eq!(
            raid_difficulty_for("raid_heroic_weekly"),
            RaidDifficulty::Heroic
        );
        assert_eq!(
            raid_difficulty_for("raid_mythic_weekly"),
            RaidDifficulty::Mythic
        );
        assert_eq!(raid_difficulty_for("unknown"), RaidDifficulty::Normal);
    }

    #[test]
    fn seasonal_window_is_calendar_inclusive() {
        let event = SeasonalEventConfig {
            event_id: "test",
            starts: (10, 18),
            ends: (11, 1),
            raid_instance: "",
            quest_markers: &[],
        };
        let date = |m, d| NaiveDate::from_ymd_opt(2025, m, d).unwrap();
        assert!(event.is_active(date(10, 18)));
        assert!(event.is_active(date(10, 25)));
        assert!(event.is_active(date(11, 1)));
        assert!(!event.is_active(date(10, 17)));
        assert!(!event.is_active(date(11, 2)));
    }

    #[test]
    fn seasonal_window_may_wrap_the_year() {
        let event = SeasonalEventConfig {
            event_id: "winter",
            starts: (12, 16),
            ends: (1, 2),
            raid_instance: "",
            quest_markers: &[],
        };
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert!(event.is_active(date(2025, 12, 25)));
        assert!(event.is_active(date(2026, 1, 1)));
        assert!(!event.is_active(date(2025, 11, 30)));
    }
}
