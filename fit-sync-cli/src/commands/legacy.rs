use clap::{Args, Subcommand};

use fit_sync_core::{LegacyKey, LocalSession, APP_STATE_KEY};

#[derive(Args)]
pub struct LegacyCommand {
    #[command(subcommand)]
    pub command: LegacySubcommand,
}

#[derive(Subcommand)]
pub enum LegacySubcommand {
    /// Write a raw value to a legacy key, as older feature code would
    Write {
        /// Legacy key (e.g. profile, nutrition_goals)
        key: String,

        /// JSON value
        json: String,
    },

    /// Print the raw value stored under a key
    Read {
        key: String,
    },

    /// Rewrite every legacy key from the current app state
    Mirror,

    /// List the keys folded into app state
    Keys,
}

impl LegacyCommand {
    pub fn run(&self, session: &LocalSession) -> Result<(), Box<dyn std::error::Error>> {
        let bridge = session.bridge();

        match &self.command {
            LegacySubcommand::Write { key, json } => {
                if key == APP_STATE_KEY {
                    return Err(format!(
                        "'{}' holds the app state itself and can't be written as a legacy key",
                        key
                    )
                    .into());
                }

                let value: serde_json::Value = serde_json::from_str(json)
                    .map_err(|e| format!("Invalid JSON for '{}': {}", key, e))?;

                bridge.write_legacy(key, value);
                let report = bridge.flush();

                if LegacyKey::parse(key).is_none() {
                    println!("Wrote {} (not folded into app state)", key);
                } else if report.failed > 0 {
                    println!("Wrote {} but could not apply it; see log output", key);
                } else {
                    println!("Wrote {}", key);
                }
                Ok(())
            }

            LegacySubcommand::Read { key } => {
                match bridge.read_legacy(key) {
                    Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                    None => println!("{} is not set", key),
                }
                Ok(())
            }

            LegacySubcommand::Mirror => {
                bridge.mirror_to_legacy(&session.store().get());
                println!("Mirrored app state into {} legacy keys", LegacyKey::ALL.len());
                Ok(())
            }

            LegacySubcommand::Keys => {
                for key in LegacyKey::ALL {
                    println!("{}", key);
                }
                Ok(())
            }
        }
    }
}
