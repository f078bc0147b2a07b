use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod sync;

use commands::{
    ConfigCommand, LegacyCommand, LegacySubcommand, NutritionCommand, StateCommand, SyncCommand,
    WeightCommand, WeightSubcommand, WorkoutCommand, WorkoutSubcommand,
};
use config::Config;
use sync::{open_session, try_auto_sync, Session};

#[derive(Parser)]
#[command(name = "fit")]
#[command(version)]
#[command(about = "A local-first fitness tracking CLI", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the local app state
    State(StateCommand),

    /// Log and list bodyweight
    Weight(WeightCommand),

    /// Record and review workouts
    Workout(WorkoutCommand),

    /// Nutrition targets
    Nutrition(NutritionCommand),

    /// Read and write legacy storage keys
    Legacy(LegacyCommand),

    /// Manage configuration
    Config(ConfigCommand),

    /// Sync with remote server
    Sync(SyncCommand),
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cli_config_path = cli.config.clone();
    let config = Config::load(cli.config)?;

    // Config commands don't touch local state.
    if let Some(Commands::Config(cmd)) = &cli.command {
        return cmd.run(&config, cli_config_path);
    }

    let session = open_session(&config);

    if is_read_command(&cli.command) {
        try_auto_sync(&config, &session);
    }

    let result = execute_command(&cli.command, &config, &session);

    if result.is_ok() && is_write_command(&cli.command) {
        try_auto_sync(&config, &session);
    }

    result
}

fn execute_command(
    command: &Option<Commands>,
    config: &Config,
    session: &Session,
) -> Result<(), Box<dyn std::error::Error>> {
    let local = &session.local;

    match command {
        Some(Commands::State(cmd)) => cmd.run(local)?,
        Some(Commands::Weight(cmd)) => cmd.run(local)?,
        Some(Commands::Workout(cmd)) => cmd.run(local)?,
        Some(Commands::Nutrition(cmd)) => cmd.run(local)?,
        Some(Commands::Legacy(cmd)) => cmd.run(local)?,
        Some(Commands::Sync(cmd)) => cmd.run(config, session)?,
        Some(Commands::Config(_)) => {}
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

/// Returns true if the command is a read operation that should sync before execution.
fn is_read_command(cmd: &Option<Commands>) -> bool {
    matches!(cmd, Some(Commands::State(_)))
        || matches!(
            cmd,
            Some(Commands::Weight(w)) if matches!(w.command, WeightSubcommand::List { .. })
        )
        || matches!(
            cmd,
            Some(Commands::Workout(w)) if matches!(w.command, WorkoutSubcommand::History { .. })
        )
        || matches!(cmd, Some(Commands::Nutrition(n)) if !n.command.writes())
}

/// Returns true if the command is a write operation that should sync after execution.
fn is_write_command(cmd: &Option<Commands>) -> bool {
    matches!(
        cmd,
        Some(Commands::Weight(w)) if matches!(w.command, WeightSubcommand::Log { .. })
    ) || matches!(
        cmd,
        Some(Commands::Workout(w)) if matches!(w.command, WorkoutSubcommand::Finish { .. })
    ) || matches!(cmd, Some(Commands::Nutrition(n)) if n.command.writes())
        || matches!(
            cmd,
            Some(Commands::Legacy(l)) if matches!(l.command, LegacySubcommand::Write { .. })
        )
}
