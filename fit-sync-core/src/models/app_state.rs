use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::bodyweight::Bodyweight;
use super::nutrition::{Nutrition, NutritionTargets};
use super::progression::Progression;
use super::quest::Quest;
use super::workout::{
    ExerciseHistory, Suggestion, TodaySession, WorkoutCompletion, WorkoutPlan, WorkoutProgress,
};

/// Current schema version written into every AppState.
pub const APP_STATE_VERSION: u32 = 1;

/// Milliseconds since the Unix epoch, the unit of `AppState::updated_at`.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The canonical per-user state record.
///
/// Every field carries a serde default so partially-populated documents
/// (older clients, a fresh remote account) still deserialize into the
/// documented empty shapes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub version: u32,
    pub progression: Progression,
    pub bodyweight: Bodyweight,
    pub nutrition: Nutrition,
    pub plan: Option<WorkoutPlan>,
    #[serde(rename = "treinoProgresso")]
    pub workout_progress: WorkoutProgress,
    pub workout_history: Vec<WorkoutCompletion>,
    pub quests: Vec<Quest>,
    #[serde(rename = "treinoHoje")]
    pub today_session: Option<TodaySession>,
    /// ISO date -> whether the day's nutrition was completed
    pub nutrition_completed: BTreeMap<String, bool>,
    pub exercise_history: ExerciseHistory,
    pub progression_suggestions: BTreeMap<String, Suggestion>,
    pub updated_at: i64,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            version: APP_STATE_VERSION,
            progression: Progression::default(),
            bodyweight: Bodyweight::default(),
            nutrition: Nutrition::default(),
            plan: None,
            workout_progress: WorkoutProgress::new(),
            workout_history: Vec::new(),
            quests: Vec::new(),
            today_session: None,
            nutrition_completed: BTreeMap::new(),
            exercise_history: ExerciseHistory::new(),
            progression_suggestions: BTreeMap::new(),
            updated_at: 0,
        }
    }
}

impl AppState {
    /// The state given to a user on first use: zeroed progression and the
    /// standard nutrition targets.
    pub fn new_user() -> Self {
        let mut state = Self::default();
        state.nutrition.targets = NutritionTargets::standard();
        state
    }

    /// True if a plan with at least one workout is present.
    pub fn has_plan(&self) -> bool {
        self.plan.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// True if this state holds anything a user would miss if it were
    /// replaced by a fresh default.
    pub fn has_significant_data(&self) -> bool {
        !self.workout_history.is_empty()
            || !self.exercise_history.is_empty()
            || !self.bodyweight.is_empty()
            || self.has_plan()
            || !self.workout_progress.is_empty()
            || self.nutrition.has_diet_plan()
            || !self.nutrition.daily_logs.is_empty()
    }

    /// Restores the shape invariants after loading from an arbitrary source.
    ///
    /// Fills empty targets with the standard ones, recomputes daily log
    /// totals and re-sorts bodyweight entries (dropping same-day duplicates,
    /// last one wins).
    pub fn normalize(&mut self) {
        if self.version == 0 {
            self.version = APP_STATE_VERSION;
        }
        if self.nutrition.targets.is_empty() {
            self.nutrition.targets = NutritionTargets::standard();
        }
        for log in self.nutrition.daily_logs.values_mut() {
            log.recompute_totals();
        }

        let sorted = self
            .bodyweight
            .entries
            .windows(2)
            .all(|w| w[0].date < w[1].date);
        if !sorted {
            let mut rebuilt = Bodyweight::default();
            for entry in self.bodyweight.entries.drain(..) {
                rebuilt.upsert(entry.date, entry.weight, entry.updated_at);
            }
            self.bodyweight = rebuilt;
        }
    }

    /// Returns the state serialized as a JSON value.
    pub fn to_value(&self) -> serde_json::Value {
        // AppState contains only string-keyed maps, so serialization can't fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailyLog, FoodEntry, Workout};
    use chrono::NaiveDate;

    #[test]
    fn test_new_user_defaults() {
        let state = AppState::new_user();
        assert_eq!(state.version, APP_STATE_VERSION);
        assert_eq!(state.nutrition.targets, NutritionTargets::standard());
        assert_eq!(state.progression, Progression::default());
        assert!(state.plan.is_none());
        assert!(state.nutrition.daily_logs.is_empty());
        assert_eq!(state.updated_at, 0);
        assert!(!state.has_significant_data());
    }

    #[test]
    fn test_empty_json_fills_every_domain() {
        let state: AppState = serde_json::from_str("{}").unwrap();
        assert!(state.bodyweight.entries.is_empty());
        assert!(state.workout_history.is_empty());
        assert!(state.today_session.is_none());
    }

    #[test]
    fn test_legacy_wire_names() {
        let json = AppState::new_user().to_value();
        assert!(json.get("treinoProgresso").is_some());
        assert!(json.get("treinoHoje").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("workoutHistory").is_some());
    }

    #[test]
    fn test_significant_data_detection() {
        let mut state = AppState::new_user();
        state.plan = Some(WorkoutPlan::default());
        assert!(!state.has_significant_data());

        state.plan = Some(WorkoutPlan::new(vec![Workout::new("a", "Legs")]));
        assert!(state.has_significant_data());

        let mut state = AppState::new_user();
        state
            .nutrition
            .daily_logs
            .insert("2024-01-01".to_string(), DailyLog::default());
        assert!(state.has_significant_data());

        let mut state = AppState::new_user();
        state.bodyweight.upsert(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            80.0,
            1,
        );
        assert!(state.has_significant_data());
    }

    #[test]
    fn test_normalize_restores_invariants() {
        let raw = r#"{
            "nutrition": {
                "targets": {"kcal": 0, "protein": 0, "carbs": 0, "fats": 0},
                "dailyLogs": {
                    "2024-01-02": {"entries": [{"name": "oats", "kcal": 300}], "totals": {"kcal": 1}}
                }
            },
            "bodyweight": {"entries": [
                {"date": "2024-01-03", "weight": 81.0},
                {"date": "2024-01-01", "weight": 80.0},
                {"date": "2024-01-03", "weight": 82.0}
            ]}
        }"#;
        let mut state: AppState = serde_json::from_str(raw).unwrap();
        state.normalize();

        assert_eq!(state.nutrition.targets, NutritionTargets::standard());
        assert_eq!(state.nutrition.daily_logs["2024-01-02"].totals.kcal, 300.0);
        assert_eq!(state.bodyweight.entries.len(), 2);
        assert_eq!(state.bodyweight.entries[1].weight, 82.0);
    }

    #[test]
    fn test_normalize_keeps_custom_targets() {
        let mut state = AppState::new_user();
        state.nutrition.targets = NutritionTargets::new(1500.0, 120.0, 100.0, 50.0);
        state.nutrition.daily_logs.insert(
            "2024-01-01".to_string(),
            DailyLog::from_entries(vec![FoodEntry::default()]),
        );
        let before = state.clone();
        state.normalize();
        assert_eq!(state, before);
    }
}
