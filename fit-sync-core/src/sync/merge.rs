//! Remote/local reconciliation when the remote copy is newer.
//!
//! The remote document wins wholesale, except for domains it has lost
//! entirely while the local copy still holds them. Those are restored from
//! local so a device that synced an empty state can't wipe a user's plan.
//! Data inside a domain the remote does have is not merged.

use std::fmt;

use crate::models::AppState;

/// A slice of AppState that merge can restore from the local copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Plan,
    WorkoutProgress,
    Targets,
    DietPlan,
    DailyLogs,
    Bodyweight,
    WorkoutHistory,
    ExerciseHistory,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Plan => "plan",
            Domain::WorkoutProgress => "workout progress",
            Domain::Targets => "nutrition targets",
            Domain::DietPlan => "diet plan",
            Domain::DailyLogs => "daily logs",
            Domain::Bodyweight => "bodyweight",
            Domain::WorkoutHistory => "workout history",
            Domain::ExerciseHistory => "exercise history",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    pub state: AppState,
    /// Domains copied over from the local state, in the order applied.
    pub restored: Vec<Domain>,
}

impl MergeResult {
    /// True if the merged state differs from the remote copy and has to be
    /// written back.
    pub fn restored_any(&self) -> bool {
        !self.restored.is_empty()
    }
}

/// Merges `local` into a newer `remote` copy.
pub fn merge(remote: &AppState, local: &AppState) -> MergeResult {
    let mut state = remote.clone();
    let mut restored = Vec::new();

    if !remote.has_plan() && local.has_plan() {
        state.plan = local.plan.clone();
        restored.push(Domain::Plan);

        // Progress is keyed by the plan's workouts, so it travels with it.
        if !local.workout_progress.is_empty() {
            state.workout_progress = local.workout_progress.clone();
            restored.push(Domain::WorkoutProgress);
        }
    }

    if remote.nutrition.targets.is_empty() && !local.nutrition.targets.is_empty() {
        state.nutrition.targets = local.nutrition.targets;
        restored.push(Domain::Targets);
    }

    if !remote.nutrition.has_diet_plan() && local.nutrition.has_diet_plan() {
        state.nutrition.diet_plan = local.nutrition.diet_plan.clone();
        restored.push(Domain::DietPlan);
    }

    let mut added_logs = false;
    for (date, log) in &local.nutrition.daily_logs {
        if !state.nutrition.daily_logs.contains_key(date) {
            state.nutrition.daily_logs.insert(date.clone(), log.clone());
            added_logs = true;
        }
    }
    if added_logs {
        restored.push(Domain::DailyLogs);
    }

    if remote.bodyweight.is_empty() && !local.bodyweight.is_empty() {
        state.bodyweight = local.bodyweight.clone();
        restored.push(Domain::Bodyweight);
    }

    if remote.workout_history.is_empty() && !local.workout_history.is_empty() {
        state.workout_history = local.workout_history.clone();
        restored.push(Domain::WorkoutHistory);
    }

    if remote.exercise_history.is_empty() && !local.exercise_history.is_empty() {
        state.exercise_history = local.exercise_history.clone();
        restored.push(Domain::ExerciseHistory);
    }

    MergeResult { state, restored }
}
