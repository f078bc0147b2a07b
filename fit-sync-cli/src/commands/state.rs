use clap::{Args, Subcommand};

use fit_sync_core::LocalSession;

use super::OutputFormat;

#[derive(Args)]
pub struct StateCommand {
    #[command(subcommand)]
    pub command: StateSubcommand,
}

#[derive(Subcommand)]
pub enum StateSubcommand {
    /// Show the current app state
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl StateCommand {
    pub fn run(&self, session: &LocalSession) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            StateSubcommand::Show { format } => {
                let state = session.store().get();

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&state)?);
                    }
                    OutputFormat::Text => {
                        println!("App State (v{})", state.version);
                        println!("=============\n");

                        println!("Progression: {}", state.progression);
                        println!("Targets:     {}", state.nutrition.targets);

                        match state.bodyweight.latest() {
                            Some(entry) => {
                                println!("Weight:      {} kg on {}", entry.weight, entry.date)
                            }
                            None => println!("Weight:      (none logged)"),
                        }

                        match &state.plan {
                            Some(plan) if !plan.is_empty() => {
                                let names: Vec<&str> =
                                    plan.workouts.iter().map(|w| w.name.as_str()).collect();
                                println!("Plan:        {}", names.join(", "));
                            }
                            _ => println!("Plan:        (none)"),
                        }
                        if let Some(diet) = &state.nutrition.diet_plan {
                            println!("Diet:        {} ({} meals)", diet.name, diet.meals.len());
                        }

                        println!();
                        println!("Workouts completed: {}", state.workout_history.len());
                        println!("Days logged:        {}", state.nutrition.daily_logs.len());
                        println!("Quests:             {}", state.quests.len());
                        println!("Updated at:         {}", state.updated_at);
                    }
                }
                Ok(())
            }
        }
    }
}
