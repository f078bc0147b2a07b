//! Typed legacy records and the patch each one applies to AppState.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    AppState, Bodyweight, DailyLog, DietPlan, ExerciseHistory, FoodEntry, MacroTotals,
    NutritionTargets, Quest, Suggestion, TodaySession, WeightEntry, WorkoutCompletion,
    WorkoutPlan,
};
use crate::storage::LegacyKey;

#[derive(Error, Debug)]
pub enum HydrationError {
    #[error("Malformed value for legacy key '{key}': {source}")]
    Malformed {
        key: LegacyKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid date '{date}' in legacy key '{key}'")]
    InvalidDate { key: LegacyKey, date: String },
}

/// The raw profile record. Every field is optional; only present fields
/// are copied into `progression`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_to_next: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shields: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightReading {
    pub date: NaiveDate,
    pub weight: f64,
}

/// Today's food log as written by the older nutrition screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TodayLogRecord {
    pub date: String,
    #[serde(default)]
    pub entries: Vec<FoodEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletionRecord {
    pub date: String,
    pub completed: bool,
}

/// A decoded legacy key write, one variant per known key.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyRecord {
    Profile(ProfileRecord),
    Quests(Vec<Quest>),
    WorkoutPlan(Option<WorkoutPlan>),
    ExerciseHistory(ExerciseHistory),
    WorkoutHistory(Vec<WorkoutCompletion>),
    TodaySession(Option<TodaySession>),
    ProgressionSuggestions(BTreeMap<String, Suggestion>),
    WeightHistory(Vec<WeightReading>),
    NutritionGoals(NutritionTargets),
    DietPlan(Option<DietPlan>),
    NutritionToday(TodayLogRecord),
    NutritionCompleted(CompletionRecord),
    NutritionTotals(BTreeMap<String, MacroTotals>),
}

fn decode<T>(key: LegacyKey, value: Value) -> Result<T, HydrationError>
where
    T: for<'de> Deserialize<'de>,
{
    serde_json::from_value(value).map_err(|source| HydrationError::Malformed { key, source })
}

fn check_date(key: LegacyKey, date: &str) -> Result<(), HydrationError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| HydrationError::InvalidDate {
            key,
            date: date.to_string(),
        })
}

/// Stores `value` into `slot`, reporting whether anything changed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

impl LegacyRecord {
    /// Decodes a legacy write. Returns `Ok(None)` for keys this bridge
    /// doesn't know about.
    pub fn parse(key: &str, value: Value) -> Result<Option<Self>, HydrationError> {
        let Some(legacy_key) = LegacyKey::parse(key) else {
            return Ok(None);
        };

        let record = match legacy_key {
            LegacyKey::Profile => LegacyRecord::Profile(decode(legacy_key, value)?),
            LegacyKey::Quests => LegacyRecord::Quests(decode(legacy_key, value)?),
            LegacyKey::WorkoutPlan => LegacyRecord::WorkoutPlan(decode(legacy_key, value)?),
            LegacyKey::ExerciseHistory => {
                LegacyRecord::ExerciseHistory(decode(legacy_key, value)?)
            }
            LegacyKey::WorkoutHistory => LegacyRecord::WorkoutHistory(decode(legacy_key, value)?),
            LegacyKey::TodaySession => LegacyRecord::TodaySession(decode(legacy_key, value)?),
            LegacyKey::ProgressionSuggestions => {
                LegacyRecord::ProgressionSuggestions(decode(legacy_key, value)?)
            }
            LegacyKey::WeightHistory => LegacyRecord::WeightHistory(decode(legacy_key, value)?),
            LegacyKey::NutritionGoals => LegacyRecord::NutritionGoals(decode(legacy_key, value)?),
            LegacyKey::DietPlan => LegacyRecord::DietPlan(decode(legacy_key, value)?),
            LegacyKey::NutritionToday => {
                let record: TodayLogRecord = decode(legacy_key, value)?;
                check_date(legacy_key, &record.date)?;
                LegacyRecord::NutritionToday(record)
            }
            LegacyKey::NutritionCompleted => {
                let record: CompletionRecord = decode(legacy_key, value)?;
                check_date(legacy_key, &record.date)?;
                LegacyRecord::NutritionCompleted(record)
            }
            LegacyKey::NutritionTotals => {
                LegacyRecord::NutritionTotals(decode(legacy_key, value)?)
            }
        };

        Ok(Some(record))
    }

    pub fn key(&self) -> LegacyKey {
        match self {
            LegacyRecord::Profile(_) => LegacyKey::Profile,
            LegacyRecord::Quests(_) => LegacyKey::Quests,
            LegacyRecord::WorkoutPlan(_) => LegacyKey::WorkoutPlan,
            LegacyRecord::ExerciseHistory(_) => LegacyKey::ExerciseHistory,
            LegacyRecord::WorkoutHistory(_) => LegacyKey::WorkoutHistory,
            LegacyRecord::TodaySession(_) => LegacyKey::TodaySession,
            LegacyRecord::ProgressionSuggestions(_) => LegacyKey::ProgressionSuggestions,
            LegacyRecord::WeightHistory(_) => LegacyKey::WeightHistory,
            LegacyRecord::NutritionGoals(_) => LegacyKey::NutritionGoals,
            LegacyRecord::DietPlan(_) => LegacyKey::DietPlan,
            LegacyRecord::NutritionToday(_) => LegacyKey::NutritionToday,
            LegacyRecord::NutritionCompleted(_) => LegacyKey::NutritionCompleted,
            LegacyRecord::NutritionTotals(_) => LegacyKey::NutritionTotals,
        }
    }

    /// Folds this record into `state`. Returns true if anything changed.
    pub fn apply(self, state: &mut AppState, now: i64) -> bool {
        match self {
            LegacyRecord::Profile(profile) => {
                let mut next = state.progression.clone();
                if let Some(level) = profile.level {
                    next.level = level;
                }
                if let Some(xp) = profile.xp {
                    next.xp = xp;
                }
                if let Some(xp_to_next) = profile.xp_to_next {
                    next.xp_to_next = xp_to_next;
                }
                if let Some(streak_days) = profile.streak_days {
                    next.streak_days = streak_days;
                }
                if let Some(shields) = profile.shields {
                    next.shields = shields;
                }
                if let Some(multiplier) = profile.multiplier {
                    next.multiplier = multiplier;
                }
                replace(&mut state.progression, next)
            }
            LegacyRecord::Quests(quests) => replace(&mut state.quests, quests),
            LegacyRecord::WorkoutPlan(plan) => replace(&mut state.plan, plan),
            LegacyRecord::ExerciseHistory(history) => {
                replace(&mut state.exercise_history, history)
            }
            LegacyRecord::WorkoutHistory(history) => replace(&mut state.workout_history, history),
            LegacyRecord::TodaySession(session) => replace(&mut state.today_session, session),
            LegacyRecord::ProgressionSuggestions(suggestions) => {
                replace(&mut state.progression_suggestions, suggestions)
            }
            LegacyRecord::WeightHistory(readings) => {
                let mut next = Bodyweight::default();
                for reading in readings {
                    // Unchanged readings keep their original stamp.
                    let stamp = state
                        .bodyweight
                        .entries
                        .iter()
                        .find(|e| e.date == reading.date && e.weight == reading.weight)
                        .map(|e| e.updated_at)
                        .unwrap_or(now);
                    next.upsert(reading.date, reading.weight, stamp);
                }
                replace(&mut state.bodyweight, next)
            }
            LegacyRecord::NutritionGoals(targets) => {
                replace(&mut state.nutrition.targets, targets)
            }
            LegacyRecord::DietPlan(plan) => replace(&mut state.nutrition.diet_plan, plan),
            LegacyRecord::NutritionToday(record) => {
                let logs = &mut state.nutrition.daily_logs;
                if record.entries.is_empty() && !logs.contains_key(&record.date) {
                    return false;
                }
                let log = DailyLog::from_entries(record.entries);
                match logs.get_mut(&record.date) {
                    Some(existing) => replace(existing, log),
                    None => {
                        logs.insert(record.date, log);
                        true
                    }
                }
            }
            LegacyRecord::NutritionCompleted(record) => {
                let previous = state
                    .nutrition_completed
                    .insert(record.date, record.completed);
                previous != Some(record.completed)
            }
            LegacyRecord::NutritionTotals(totals) => {
                replace(&mut state.nutrition.totals_logs, Some(totals))
            }
        }
    }

    /// Projects `state` down into the shape stored under `key`.
    ///
    /// Day-scoped keys (today's log and completion flag) are projected for
    /// `today`.
    pub fn from_state(key: LegacyKey, state: &AppState, today: NaiveDate) -> Self {
        let today = today.format("%Y-%m-%d").to_string();
        match key {
            LegacyKey::Profile => {
                let p = &state.progression;
                LegacyRecord::Profile(ProfileRecord {
                    level: Some(p.level),
                    xp: Some(p.xp),
                    xp_to_next: Some(p.xp_to_next),
                    streak_days: Some(p.streak_days),
                    shields: Some(p.shields),
                    multiplier: Some(p.multiplier),
                })
            }
            LegacyKey::Quests => LegacyRecord::Quests(state.quests.clone()),
            LegacyKey::WorkoutPlan => LegacyRecord::WorkoutPlan(state.plan.clone()),
            LegacyKey::ExerciseHistory => {
                LegacyRecord::ExerciseHistory(state.exercise_history.clone())
            }
            LegacyKey::WorkoutHistory => {
                LegacyRecord::WorkoutHistory(state.workout_history.clone())
            }
            LegacyKey::TodaySession => LegacyRecord::TodaySession(state.today_session.clone()),
            LegacyKey::ProgressionSuggestions => {
                LegacyRecord::ProgressionSuggestions(state.progression_suggestions.clone())
            }
            LegacyKey::WeightHistory => LegacyRecord::WeightHistory(
                state
                    .bodyweight
                    .entries
                    .iter()
                    .map(|WeightEntry { date, weight, .. }| WeightReading {
                        date: *date,
                        weight: *weight,
                    })
                    .collect(),
            ),
            LegacyKey::NutritionGoals => LegacyRecord::NutritionGoals(state.nutrition.targets),
            LegacyKey::DietPlan => LegacyRecord::DietPlan(state.nutrition.diet_plan.clone()),
            LegacyKey::NutritionToday => LegacyRecord::NutritionToday(TodayLogRecord {
                entries: state
                    .nutrition
                    .daily_logs
                    .get(&today)
                    .map(|log| log.entries.clone())
                    .unwrap_or_default(),
                date: today,
            }),
            LegacyKey::NutritionCompleted => LegacyRecord::NutritionCompleted(CompletionRecord {
                completed: state
                    .nutrition_completed
                    .get(&today)
                    .copied()
                    .unwrap_or(false),
                date: today,
            }),
            LegacyKey::NutritionTotals => LegacyRecord::NutritionTotals(
                state.nutrition.totals_logs.clone().unwrap_or_default(),
            ),
        }
    }

    /// Serializes the payload as stored under its legacy key.
    pub fn to_value(&self) -> Value {
        let value = match self {
            LegacyRecord::Profile(v) => serde_json::to_value(v),
            LegacyRecord::Quests(v) => serde_json::to_value(v),
            LegacyRecord::WorkoutPlan(v) => serde_json::to_value(v),
            LegacyRecord::ExerciseHistory(v) => serde_json::to_value(v),
            LegacyRecord::WorkoutHistory(v) => serde_json::to_value(v),
            LegacyRecord::TodaySession(v) => serde_json::to_value(v),
            LegacyRecord::ProgressionSuggestions(v) => serde_json::to_value(v),
            LegacyRecord::WeightHistory(v) => serde_json::to_value(v),
            LegacyRecord::NutritionGoals(v) => serde_json::to_value(v),
            LegacyRecord::DietPlan(v) => serde_json::to_value(v),
            LegacyRecord::NutritionToday(v) => serde_json::to_value(v),
            LegacyRecord::NutritionCompleted(v) => serde_json::to_value(v),
            LegacyRecord::NutritionTotals(v) => serde_json::to_value(v),
        };
        value.unwrap_or(Value::Null)
    }
}
