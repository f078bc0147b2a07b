use chrono::Local;
use clap::{Args, Subcommand};

use fit_sync_core::{now_millis, LocalSession};

use super::parse_date;

#[derive(Args)]
pub struct WeightCommand {
    #[command(subcommand)]
    pub command: WeightSubcommand,
}

#[derive(Subcommand)]
pub enum WeightSubcommand {
    /// Log a bodyweight reading
    Log {
        /// Weight in kg
        weight: f64,

        /// Date (YYYY-MM-DD), defaults to today
        #[arg(long, short)]
        date: Option<String>,
    },

    /// Show recent readings
    List {
        /// Number of readings to show
        #[arg(long, short, default_value = "10")]
        limit: usize,
    },
}

impl WeightCommand {
    pub fn run(&self, session: &LocalSession) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            WeightSubcommand::Log { weight, date } => {
                if !weight.is_finite() || *weight <= 0.0 {
                    return Err(format!("Invalid weight '{}'. Must be positive.", weight).into());
                }
                let date = match date {
                    Some(d) => parse_date(d)?,
                    None => Local::now().date_naive(),
                };

                session
                    .store()
                    .update(|state| state.bodyweight.upsert(date, *weight, now_millis()));

                println!("Logged {} kg for {}", weight, date);
                Ok(())
            }

            WeightSubcommand::List { limit } => {
                let state = session.store().get();
                if state.bodyweight.is_empty() {
                    println!("No weight readings logged.");
                    return Ok(());
                }

                for entry in state.bodyweight.entries.iter().rev().take(*limit) {
                    println!("{}  {:>6.1} kg", entry.date, entry.weight);
                }
                Ok(())
            }
        }
    }
}
