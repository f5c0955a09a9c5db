use clap::{Args, Subcommand};

use togglboard_core::DeviceAdapter;

use crate::config::Config;

#[derive(Debug, Args)]
pub struct ParticleCommand {
    #[command(subcommand)]
    pub command: ParticleSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ParticleSubcommand {
    /// Ping the board through the Particle cloud
    Test,
    /// Show the board's position variables
    Current,
}

impl ParticleCommand {
    pub async fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        let client = config.particle_client()?;

        match &self.command {
            ParticleSubcommand::Test => {
                if client.test().await? {
                    println!("{} is online", client.device_name());
                } else {
                    return Err(format!("{} is offline", client.device_name()).into());
                }
            }
            ParticleSubcommand::Current => {
                let state = client.get_current_state().await?;
                println!("Device: {}", client.device_name());
                println!("  actual position: {}", show(state.actual_position));
                println!("  target position: {}", show(state.target_position));
                println!("  sensor value:    {}", show(state.sensor_value));
            }
        }
        Ok(())
    }
}

fn show(value: Option<i32>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
