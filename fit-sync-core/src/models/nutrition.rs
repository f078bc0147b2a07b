use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Daily macro targets.
///
/// An all-zero value means "no targets set" and is treated as empty by the
/// merge resolver. The documented defaults are [`NutritionTargets::standard`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NutritionTargets {
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

impl NutritionTargets {
    pub fn new(kcal: f64, protein: f64, carbs: f64, fats: f64) -> Self {
        Self {
            kcal,
            protein,
            carbs,
            fats,
        }
    }

    /// Targets given to a brand new user.
    pub fn standard() -> Self {
        Self::new(2000.0, 150.0, 200.0, 67.0)
    }

    pub fn is_empty(&self) -> bool {
        self.kcal == 0.0 && self.protein == 0.0 && self.carbs == 0.0 && self.fats == 0.0
    }
}

impl fmt::Display for NutritionTargets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} kcal, {}g protein, {}g carbs, {}g fats",
            self.kcal, self.protein, self.carbs, self.fats
        )
    }
}

/// Summed macros for a day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MacroTotals {
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

/// One food item logged on a day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FoodEntry {
    pub name: String,
    pub kcal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
}

/// Food log for a single date. `totals` always matches `entries`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DailyLog {
    pub entries: Vec<FoodEntry>,
    pub totals: MacroTotals,
}

impl DailyLog {
    pub fn from_entries(entries: Vec<FoodEntry>) -> Self {
        let mut log = Self {
            entries,
            totals: MacroTotals::default(),
        };
        log.recompute_totals();
        log
    }

    pub fn recompute_totals(&mut self) {
        self.totals = self
            .entries
            .iter()
            .fold(MacroTotals::default(), |acc, e| MacroTotals {
                kcal: acc.kcal + e.kcal,
                protein: acc.protein + e.protein,
                carbs: acc.carbs + e.carbs,
                fats: acc.fats + e.fats,
            });
    }
}

/// A meal in a diet plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DietMeal {
    pub name: String,
    pub items: Vec<String>,
    pub kcal: f64,
}

/// A generated or hand-written diet plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DietPlan {
    pub name: String,
    pub meals: Vec<DietMeal>,
    pub created_at: i64,
}

impl DietPlan {
    pub fn is_empty(&self) -> bool {
        self.meals.is_empty()
    }
}

/// Nutrition domain of the app state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Nutrition {
    pub targets: NutritionTargets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diet_plan: Option<DietPlan>,
    /// Keyed by ISO date (`YYYY-MM-DD`).
    pub daily_logs: BTreeMap<String, DailyLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals_logs: Option<BTreeMap<String, MacroTotals>>,
}

impl Nutrition {
    /// True if a non-empty diet plan is present.
    pub fn has_diet_plan(&self) -> bool {
        self.diet_plan.as_ref().is_some_and(|p| !p.is_empty())
    }
}
