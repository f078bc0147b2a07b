use chrono::NaiveDate;
use clap::ValueEnum;

mod config_cmd;
mod legacy;
mod nutrition;
mod state;
mod sync_cmd;
mod weight;
mod workout;

pub use config_cmd::ConfigCommand;
pub use legacy::{LegacyCommand, LegacySubcommand};
pub use nutrition::NutritionCommand;
pub use state::StateCommand;
pub use sync_cmd::SyncCommand;
pub use weight::{WeightCommand, WeightSubcommand};
pub use workout::{WorkoutCommand, WorkoutSubcommand};

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn parse_date(date: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format '{}'. Use YYYY-MM-DD.", date))
}
