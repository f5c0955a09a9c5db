use clap::{Args, Subcommand, ValueEnum};

use crate::config::{Config, ConfigValue};

const CONFIG_TEMPLATE: &str = "\
# togglboard configuration
# Environment variables (PORT, SYNC_PERIOD_MS, TOGGL_API_TOKEN, ...) override these values.

port: 3000
sync_period_ms: 10000
subscribe_events: true

toggl:
  api_token: \"your-toggl-api-token\"
  # One project per board slot, slot 1 first
  project_ids: []

particle:
  api_token: \"your-particle-access-token\"
  device_name: \"your-device-name\"
";

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Write a starter config file to the default location
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                let config = masked(config);
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&config)?);
                    }
                    OutputFormat::Text => print_text(&config),
                }
                Ok(())
            }
            ConfigSubcommand::Init { force } => {
                let path = config
                    .config_file
                    .clone()
                    .unwrap_or_else(Config::default_config_path);
                if path.exists() && !force {
                    return Err(format!(
                        "Config file already exists at {} (use --force to overwrite)",
                        path.display()
                    )
                    .into());
                }
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, CONFIG_TEMPLATE)?;
                println!("Wrote {}", path.display());
                Ok(())
            }
        }
    }
}

/// Copy of the config with API tokens hidden.
fn masked(config: &Config) -> Config {
    let mut config = config.clone();
    config.toggl.api_token = config.toggl.api_token.as_deref().map(mask);
    config.particle.api_token = config.particle.api_token.as_deref().map(mask);
    config
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if visible.len() == token.len() {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

fn print_value<T: std::fmt::Display>(name: &str, value: &ConfigValue<T>) {
    println!("{}: {}", name, value.value);
    println!("  source: {}", value.source);
}

fn print_text(config: &Config) {
    println!("Configuration");
    println!("=============\n");

    if let Some(path) = &config.config_file {
        println!("Config file: {}", path.display());
    } else {
        println!(
            "Config file: {} (not found)",
            Config::default_config_path().display()
        );
    }
    println!();

    print_value("port", &config.port);
    print_value("sync_period_ms", &config.sync_period_ms);
    print_value("subscribe_events", &config.subscribe_events);
    println!();

    let unset = || "(not set)".to_string();
    println!("toggl:");
    println!(
        "  api_token: {}",
        config.toggl.api_token.clone().unwrap_or_else(unset)
    );
    let ids: Vec<String> = config
        .toggl
        .project_ids
        .iter()
        .map(|id| id.to_string())
        .collect();
    println!("  project_ids: [{}]", ids.join(", "));
    if let Some(url) = &config.toggl.base_url {
        println!("  base_url: {}", url);
    }
    println!();

    println!("particle:");
    println!(
        "  api_token: {}",
        config.particle.api_token.clone().unwrap_or_else(unset)
    );
    println!(
        "  device_name: {}",
        config.particle.device_name.clone().unwrap_or_else(unset)
    );
    if let Some(url) = &config.particle.base_url {
        println!("  base_url: {}", url);
    }
}
