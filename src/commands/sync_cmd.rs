//! One-shot reconciliation from the command line.

use clap::Args;
use std::sync::Arc;

use crate::config::Config;
use crate::driver::Driver;

/// Run a single sync cycle and print what was observed
#[derive(Debug, Args)]
pub struct SyncCommand {}

impl SyncCommand {
    /// There is no previous snapshot here, so Toggl always wins.
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let driver = Driver::new(
            Arc::new(config.toggl_client()?),
            Arc::new(config.particle_client()?),
            config.position_table()?,
        );

        let observed = driver.run_cycle().await?;
        println!("{}", serde_json::to_string_pretty(&observed)?);
        Ok(())
    }
}
