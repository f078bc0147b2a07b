//! Storage key names.

/// Key holding the serialized canonical AppState.
pub const APP_STATE_KEY: &str = "app_state";

/// Older per-feature keys that predate AppState and are still written by
/// some code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyKey {
    Profile,
    Quests,
    WorkoutPlan,
    ExerciseHistory,
    WorkoutHistory,
    TodaySession,
    ProgressionSuggestions,
    WeightHistory,
    NutritionGoals,
    DietPlan,
    NutritionToday,
    NutritionCompleted,
    NutritionTotals,
}

impl LegacyKey {
    pub const ALL: [LegacyKey; 13] = [
        LegacyKey::Profile,
        LegacyKey::Quests,
        LegacyKey::WorkoutPlan,
        LegacyKey::ExerciseHistory,
        LegacyKey::WorkoutHistory,
        LegacyKey::TodaySession,
        LegacyKey::ProgressionSuggestions,
        LegacyKey::WeightHistory,
        LegacyKey::NutritionGoals,
        LegacyKey::DietPlan,
        LegacyKey::NutritionToday,
        LegacyKey::NutritionCompleted,
        LegacyKey::NutritionTotals,
    ];

    /// Returns the stored key name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LegacyKey::Profile => "profile",
            LegacyKey::Quests => "quests",
            LegacyKey::WorkoutPlan => "workout_plan",
            LegacyKey::ExerciseHistory => "exercise_history",
            LegacyKey::WorkoutHistory => "workout_history",
            LegacyKey::TodaySession => "treino_hoje",
            LegacyKey::ProgressionSuggestions => "progression_suggestions",
            LegacyKey::WeightHistory => "weight_history",
            LegacyKey::NutritionGoals => "nutrition_goals",
            LegacyKey::DietPlan => "diet_plan",
            LegacyKey::NutritionToday => "nutrition_today",
            LegacyKey::NutritionCompleted => "nutrition_completed",
            LegacyKey::NutritionTotals => "nutrition_totals",
        }
    }

    /// Parse from a stored key name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

impl std::fmt::Display for LegacyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_every_key() {
        for key in LegacyKey::ALL {
            assert_eq!(LegacyKey::parse(key.as_str()), Some(key));
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(LegacyKey::parse("settings"), None);
        assert_eq!(LegacyKey::parse(APP_STATE_KEY), None);
    }
}
