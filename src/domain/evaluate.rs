//! Per-category completion evaluators.
//!
//! Pure and total: upstream data is an uncontrolled third party, so a
//! malformed or absent shape yields "not completed" (with a log line),
//! never a panic or an error. An absent payload is distinct from a
//! fetch error — errors are attached upstream by the analyzer.

use crate::domain::catalog::SeasonalEventConfig;
use crate::domain::entities::{ActivityDetail, CompletedQuestEntry, QuestDetail, RaidDifficulty};
use crate::domain::payloads::{
    CompletedQuest, DifficultyRef, KeystoneProfile, KeystoneRun, PvpSummary, QuestLog,
    RaidEncounters,
};
use chrono::{DateTime, NaiveTime, Utc};
use tracing::debug;

/// Completion verdict for one activity, plus optional detail.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub completed: bool,
    pub detail: Option<ActivityDetail>,
}

impl Verdict {
    pub fn incomplete() -> Self {
        Self {
            completed: false,
            detail: None,
        }
    }

    pub fn done() -> Self {
        Self {
            completed: true,
            detail: None,
        }
    }

    pub fn done_with(detail: ActivityDetail) -> Self {
        Self {
            completed: true,
            detail: Some(detail),
        }
    }
}

/// Completed iff any keystone run finished at or after the weekly reset.
/// Detail is the highest keystone level among qualifying runs. Runs come
/// from the current period, falling back to the most recent season.
pub fn evaluate_mythic_plus(profile: Option<&KeystoneProfile>, reset: DateTime<Utc>) -> Verdict {
    let Some(profile) = profile else {
        return Verdict::incomplete();
    };
    let reset_ms = reset.timestamp_millis();
    let qualifying: Vec<&KeystoneRun> = keystone_runs(profile)
        .filter(|run| run.completed_timestamp.is_some_and(|ts| ts >= reset_ms))
        .collect();
    if qualifying.is_empty() {
        return Verdict::incomplete();
    }
    match qualifying.iter().filter_map(|run| run.keystone_level).max() {
        Some(level) => {
            debug!(level, "keystone run completed this week");
            Verdict::done_with(ActivityDetail::KeystoneLevel(level))
        }
        // Qualifying run without a reported level still counts.
        None => Verdict::done(),
    }
}

fn keystone_runs(profile: &KeystoneProfile) -> impl Iterator<Item = &KeystoneRun> {
    let period_runs = profile
        .current_period
        .iter()
        .flat_map(|period| period.best_runs.iter());
    let season_runs = profile
        .seasons
        .first()
        .into_iter()
        .flat_map(|season| season.best_runs.iter());
    period_runs.chain(season_runs)
}

/// Completed iff any mode matching the target difficulty reports an
/// aggregate status of COMPLETE and has an encounter killed at or after
/// the weekly reset. No detail beyond the boolean — the difficulty is
/// encoded in which tracked activity matched.
pub fn evaluate_raid(
    data: Option<&RaidEncounters>,
    target: RaidDifficulty,
    reset: DateTime<Utc>,
) -> Verdict {
    let Some(data) = data else {
        return Verdict::incomplete();
    };
    let reset_ms = reset.timestamp_millis();
    for expansion in &data.expansions {
        for instance in &expansion.instances {
            for mode in &instance.modes {
                let Some(difficulty) = &mode.difficulty else {
                    continue;
                };
                if !matches_difficulty(difficulty, target) {
                    continue;
                }
                let complete = mode
                    .status
                    .as_ref()
                    .and_then(|status| status.kind.as_deref())
                    == Some("COMPLETE");
                if !complete {
                    continue;
                }
                let Some(progress) = &mode.progress else {
                    continue;
                };
                let fresh_kill = progress
                    .encounters
                    .iter()
                    .any(|enc| enc.last_kill_timestamp.is_some_and(|ts| ts >= reset_ms));
                if fresh_kill {
                    debug!(?target, "raid kill found this week");
                    return Verdict::done();
                }
            }
        }
    }
    Verdict::incomplete()
}

/// Matches either the localized difficulty name or the type code.
/// Normal also accepts Raid Finder (LFR).
fn matches_difficulty(difficulty: &DifficultyRef, target: RaidDifficulty) -> bool {
    let name = difficulty.name.en_us.as_deref().unwrap_or("");
    let kind = difficulty.kind.as_deref().unwrap_or("");
    match target {
        RaidDifficulty::Normal => name == "Normal" || kind == "NORMAL" || kind == "LFR",
        RaidDifficulty::Heroic => name == "Heroic" || kind == "HEROIC",
        RaidDifficulty::Mythic => name == "Mythic" || kind == "MYTHIC",
    }
}

/// Completed iff any quest finished at or after the weekly reset.
///
/// Heuristic: any completed quest this period counts as weekly-quest
/// engagement — quest ids are not matched against a weekly-quest list.
/// Detail lists the period's quests most recent first, with hours-ago
/// computed at evaluation time.
pub fn evaluate_quests(
    log: Option<&QuestLog>,
    reset: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Verdict {
    let Some(log) = log else {
        return Verdict::incomplete();
    };
    if log.quests.is_empty() {
        debug!("no completed quests in profile");
        return Verdict::incomplete();
    }
    let reset_ms = reset.timestamp_millis();
    let mut this_week: Vec<&CompletedQuest> = log
        .quests
        .iter()
        .filter(|quest| quest.completed_timestamp.is_some_and(|ts| ts >= reset_ms))
        .collect();
    if this_week.is_empty() {
        return Verdict::incomplete();
    }
    this_week.sort_by_key(|quest| std::cmp::Reverse(quest.completed_timestamp.unwrap_or(0)));

    let now_ms = now.timestamp_millis();
    let completed_quests: Vec<CompletedQuestEntry> = this_week
        .iter()
        .map(|quest| {
            let ts = quest.completed_timestamp.unwrap_or(0);
            CompletedQuestEntry {
                name: quest_name(quest),
                completed_at: DateTime::<Utc>::from_timestamp_millis(ts)
                    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                hours_ago: (now_ms - ts) / 3_600_000,
            }
        })
        .collect();
    debug!(
        this_week = completed_quests.len(),
        total = log.quests.len(),
        "quests completed since reset"
    );
    Verdict::done_with(ActivityDetail::Quests(QuestDetail {
        total_quests_this_week: completed_quests.len(),
        completed_quests,
    }))
}

fn quest_name(quest: &CompletedQuest) -> String {
    quest
        .quest
        .as_ref()
        .and_then(|q| q.name.en_us.clone())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Completed iff the character has any honor level or honor progress.
/// Not boundary-relative — inherited heuristic, see DESIGN.md.
pub fn evaluate_pvp(summary: Option<&PvpSummary>) -> Verdict {
    let Some(summary) = summary else {
        return Verdict::incomplete();
    };
    let honor_level = summary.honor_level.unwrap_or(0);
    let honor_progress = summary.honor_progress.unwrap_or(0);
    if honor_level > 0 || honor_progress > 0 {
        Verdict::done()
    } else {
        Verdict::incomplete()
    }
}

/// Seasonal events are active within a calendar date window and reset
/// daily (midnight UTC), not weekly. Completed iff, today:
/// (a) the event's named instance has an encounter kill, or
/// (b) a completed quest name contains one of the event's markers.
pub fn evaluate_seasonal(
    event: &SeasonalEventConfig,
    raids: Option<&RaidEncounters>,
    quests: Option<&QuestLog>,
    now: DateTime<Utc>,
) -> Verdict {
    if !event.is_active(now.date_naive()) {
        return Verdict::incomplete();
    }
    let day_start_ms = now
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
        .timestamp_millis();

    if let Some(raids) = raids {
        for expansion in &raids.expansions {
            for instance in &expansion.instances {
                let name = instance
                    .instance
                    .as_ref()
                    .and_then(|i| i.name.en_us.as_deref())
                    .unwrap_or("");
                if !name.contains(event.raid_instance) {
                    continue;
                }
                let killed_today = instance.modes.iter().any(|mode| {
                    mode.progress.as_ref().is_some_and(|progress| {
                        progress
                            .encounters
                            .iter()
                            .any(|enc| enc.last_kill_timestamp.is_some_and(|ts| ts >= day_start_ms))
                    })
                });
                if killed_today {
                    debug!(event = event.event_id, instance = name, "event boss killed today");
                    return Verdict::done();
                }
            }
        }
    }

    if let Some(log) = quests {
        for quest in &log.quests {
            if !quest
                .completed_timestamp
                .is_some_and(|ts| ts >= day_start_ms)
            {
                continue;
            }
            let name = quest_name(quest);
            if event.quest_markers.iter().any(|m| name.contains(m)) {
                debug!(event = event.event_id, quest = %name, "event quest completed today");
                return Verdict::done();
            }
        }
    }

    Verdict::incomplete()
}
