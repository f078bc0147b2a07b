use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// An exercise within a planned workout, with its rep/rest/set defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlannedExercise {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    pub rest_seconds: u32,
}

impl Default for PlannedExercise {
    fn default() -> Self {
        Self {
            name: String::new(),
            sets: 3,
            reps: 10,
            rest_seconds: 90,
        }
    }
}

impl PlannedExercise {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Workout {
    pub id: String,
    pub name: String,
    pub exercises: Vec<PlannedExercise>,
}

impl Workout {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            exercises: Vec::new(),
        }
    }

    pub fn with_exercises(mut self, exercises: Vec<PlannedExercise>) -> Self {
        self.exercises = exercises;
        self
    }
}

/// The user's workout plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkoutPlan {
    pub workouts: Vec<Workout>,
}

impl WorkoutPlan {
    pub fn new(workouts: Vec<Workout>) -> Self {
        Self { workouts }
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }
}

/// A set logged against a planned exercise.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggedSet {
    pub reps: u32,
    pub weight: f64,
    pub done: bool,
}

/// workout id -> exercise name -> logged sets
pub type WorkoutProgress = BTreeMap<String, BTreeMap<String, Vec<LoggedSet>>>;

/// An entry in the append-only workout history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutCompletion {
    pub id: Uuid,
    pub workout_id: String,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_minutes: u32,
    #[serde(default)]
    pub volume: f64,
}

impl WorkoutCompletion {
    pub fn new(workout_id: impl Into<String>, completed_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workout_id: workout_id.into(),
            completed_at,
            duration_minutes: 0,
            volume: 0.0,
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }
}

/// Pointer to today's in-progress session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TodaySession {
    pub workout_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub exercise_index: usize,
}

/// A historical performance of an exercise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseRecord {
    pub date: NaiveDate,
    pub weight: f64,
    pub reps: u32,
}

/// exercise name -> records
pub type ExerciseHistory = BTreeMap<String, Vec<ExerciseRecord>>;

/// Load suggestion produced by the progression heuristics.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Suggestion {
    pub next_weight: f64,
    pub reason: String,
}
