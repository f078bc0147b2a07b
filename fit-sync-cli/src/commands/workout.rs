use chrono::Utc;
use clap::{Args, Subcommand};

use fit_sync_core::{LocalSession, WorkoutCompletion};

#[derive(Args)]
pub struct WorkoutCommand {
    #[command(subcommand)]
    pub command: WorkoutSubcommand,
}

#[derive(Subcommand)]
pub enum WorkoutSubcommand {
    /// Record a finished workout
    Finish {
        /// Workout ID from the plan
        workout_id: String,

        /// Duration in minutes
        #[arg(long)]
        duration: Option<u32>,

        /// Total volume lifted (kg)
        #[arg(long)]
        volume: Option<f64>,
    },

    /// Show completed workouts, newest first
    History {
        /// Number of workouts to show
        #[arg(long, short, default_value = "10")]
        limit: usize,
    },
}

impl WorkoutCommand {
    pub fn run(&self, session: &LocalSession) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            WorkoutSubcommand::Finish {
                workout_id,
                duration,
                volume,
            } => {
                let current = session.store().get();
                let name = current
                    .plan
                    .as_ref()
                    .and_then(|plan| plan.workouts.iter().find(|w| &w.id == workout_id))
                    .map(|w| w.name.clone());
                if current.has_plan() && name.is_none() {
                    return Err(format!("Workout not found in plan: {}", workout_id).into());
                }

                let mut completion = WorkoutCompletion::new(workout_id.as_str(), Utc::now());
                if let Some(minutes) = duration {
                    completion = completion.with_duration(*minutes);
                }
                if let Some(volume) = volume {
                    completion = completion.with_volume(*volume);
                }

                session.store().update(|state| {
                    state.workout_history.push(completion);
                    if state
                        .today_session
                        .as_ref()
                        .is_some_and(|s| &s.workout_id == workout_id)
                    {
                        state.today_session = None;
                        state.workout_progress.remove(workout_id);
                    }
                });

                println!(
                    "Finished workout: {}",
                    name.as_deref().unwrap_or(workout_id.as_str())
                );
                Ok(())
            }

            WorkoutSubcommand::History { limit } => {
                let state = session.store().get();
                if state.workout_history.is_empty() {
                    println!("No workouts completed yet.");
                    return Ok(());
                }

                let mut history = state.workout_history.clone();
                history.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
                for completion in history.iter().take(*limit) {
                    println!(
                        "{}  {:<12} {:>4} min  {:>8.1} kg",
                        completion.completed_at.format("%Y-%m-%d %H:%M"),
                        completion.workout_id,
                        completion.duration_minutes,
                        completion.volume
                    );
                }
                Ok(())
            }
        }
    }
}
