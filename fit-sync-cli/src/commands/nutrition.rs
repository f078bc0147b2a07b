use std::sync::Arc;

use clap::{Args, Subcommand};

use fit_sync_core::{HydrationBridge, LegacyKey, LocalSession};

#[derive(Args)]
pub struct NutritionCommand {
    #[command(subcommand)]
    pub command: NutritionSubcommand,
}

#[derive(Subcommand)]
pub enum NutritionSubcommand {
    /// Show or change daily macro targets
    ///
    /// With no options, prints the current targets. Any option given replaces
    /// just that target.
    Goals {
        #[arg(long)]
        kcal: Option<f64>,

        #[arg(long)]
        protein: Option<f64>,

        #[arg(long)]
        carbs: Option<f64>,

        #[arg(long)]
        fats: Option<f64>,
    },
}

impl NutritionSubcommand {
    /// True if running this subcommand changes state.
    pub fn writes(&self) -> bool {
        match self {
            NutritionSubcommand::Goals {
                kcal,
                protein,
                carbs,
                fats,
            } => kcal.is_some() || protein.is_some() || carbs.is_some() || fats.is_some(),
        }
    }
}

impl NutritionCommand {
    pub fn run(&self, session: &LocalSession) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            NutritionSubcommand::Goals {
                kcal,
                protein,
                carbs,
                fats,
            } => {
                let mut targets = session.store().get().nutrition.targets;

                if !self.command.writes() {
                    println!("{}", targets);
                    return Ok(());
                }

                for value in [kcal, protein, carbs, fats].into_iter().flatten() {
                    if !value.is_finite() || *value < 0.0 {
                        return Err(format!("Invalid target '{}'. Must be >= 0.", value).into());
                    }
                }
                if let Some(v) = kcal {
                    targets.kcal = *v;
                }
                if let Some(v) = protein {
                    targets.protein = *v;
                }
                if let Some(v) = carbs {
                    targets.carbs = *v;
                }
                if let Some(v) = fats {
                    targets.fats = *v;
                }

                // Goals still go through the flat key the older screens read.
                write_goals(session.bridge(), serde_json::to_value(targets)?);

                println!("Targets: {}", session.store().get().nutrition.targets);
                Ok(())
            }
        }
    }
}

fn write_goals(bridge: &Arc<HydrationBridge>, value: serde_json::Value) {
    bridge.write_legacy(LegacyKey::NutritionGoals.as_str(), value);
    bridge.flush();
}
