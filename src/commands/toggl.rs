use clap::{Args, Subcommand};

use togglboard_core::TrackerAdapter;

use crate::config::Config;

#[derive(Debug, Args)]
pub struct TogglCommand {
    #[command(subcommand)]
    pub command: TogglSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum TogglSubcommand {
    /// Check that the API token is accepted
    Test,
    /// Show the running time entry's project
    Current,
}

impl TogglCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let client = config.toggl_client()?;

        match &self.command {
            TogglSubcommand::Test => {
                client.test().await?;
                println!("Successfully connected to Toggl API");
            }
            TogglSubcommand::Current => {
                let state = client.get_current_state().await?;
                match (state.project_id, &state.project_name) {
                    (Some(id), Some(name)) => println!("Project: {} ({})", name, id),
                    (Some(id), None) => println!("Project: {}", id),
                    (None, _) => println!("No project running"),
                }
                if let Some(entry) = &state.entry {
                    println!("Entry: {}", entry);
                }
            }
        }
        Ok(())
    }
}
