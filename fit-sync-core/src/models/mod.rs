mod app_state;
mod bodyweight;
mod nutrition;
mod progression;
mod quest;
mod workout;

pub use app_state::{now_millis, AppState, APP_STATE_VERSION};
pub use bodyweight::{Bodyweight, WeightEntry};
pub use nutrition::{
    DailyLog, DietMeal, DietPlan, FoodEntry, MacroTotals, Nutrition, NutritionTargets,
};
pub use progression::Progression;
pub use quest::Quest;
pub use workout::{
    ExerciseHistory, ExerciseRecord, LoggedSet, PlannedExercise, Suggestion, TodaySession,
    Workout, WorkoutCompletion, WorkoutPlan, WorkoutProgress,
};
