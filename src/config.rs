use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use togglboard_core::{ParticleClient, PositionTable, ProjectId, TogglClient};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SYNC_PERIOD_MS: u64 = 10_000;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Toggl account settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TogglConfig {
    /// API token from the Toggl profile page
    pub api_token: Option<String>,
    /// Project on each board slot, in slot order
    #[serde(default)]
    pub project_ids: Vec<u64>,
    /// Override for the API root
    pub base_url: Option<String>,
}

/// Particle device settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParticleConfig {
    pub api_token: Option<String>,
    pub device_name: Option<String>,
    /// Override for the API root
    pub base_url: Option<String>,
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// HTTP port for the server
    pub port: ConfigValue<u16>,
    /// Time between timer-driven sync cycles
    pub sync_period_ms: ConfigValue<u64>,
    /// Also sync when the device publishes a change event
    pub subscribe_events: ConfigValue<bool>,
    pub toggl: TogglConfig,
    pub particle: ParticleConfig,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    port: Option<u16>,
    sync_period_ms: Option<u64>,
    subscribe_events: Option<bool>,
    toggl: Option<TogglConfig>,
    particle: Option<ParticleConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |name| std::env::var(name).ok())
    }

    fn load_with_env<F>(config_path: Option<PathBuf>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Start with defaults
        let mut port = ConfigValue::new(DEFAULT_PORT, ConfigSource::Default);
        let mut sync_period_ms = ConfigValue::new(DEFAULT_SYNC_PERIOD_MS, ConfigSource::Default);
        let mut subscribe_events = ConfigValue::new(true, ConfigSource::Default);
        let mut toggl = TogglConfig::default();
        let mut particle = ParticleConfig::default();
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(value) = file_config.port {
                port = ConfigValue::new(value, ConfigSource::File);
            }
            if let Some(value) = file_config.sync_period_ms {
                sync_period_ms = ConfigValue::new(value, ConfigSource::File);
            }
            if let Some(value) = file_config.subscribe_events {
                subscribe_events = ConfigValue::new(value, ConfigSource::File);
            }
            if let Some(value) = file_config.toggl {
                toggl = value;
            }
            if let Some(value) = file_config.particle {
                particle = value;
            }
        }

        // Apply environment variable overrides
        if let Some(value) = env("PORT") {
            port = ConfigValue::new(parse_env("PORT", &value)?, ConfigSource::Environment);
        }
        if let Some(value) = env("SYNC_PERIOD_MS") {
            sync_period_ms =
                ConfigValue::new(parse_env("SYNC_PERIOD_MS", &value)?, ConfigSource::Environment);
        }
        if let Some(value) = env("TOGGLBOARD_SUBSCRIBE_EVENTS") {
            subscribe_events = ConfigValue::new(
                parse_env("TOGGLBOARD_SUBSCRIBE_EVENTS", &value)?,
                ConfigSource::Environment,
            );
        }
        if let Some(value) = env("TOGGL_API_TOKEN") {
            toggl.api_token = Some(value);
        }
        if let Some(value) = env("TOGGL_PROJECT_IDS") {
            toggl.project_ids = parse_project_ids(&value)?;
        }
        if let Some(value) = env("PARTICLE_API_TOKEN") {
            particle.api_token = Some(value);
        }
        if let Some(value) = env("PARTICLE_DEVICE_NAME") {
            particle.device_name = Some(value);
        }

        if sync_period_ms.value == 0 {
            return Err(ConfigError::InvalidValue(
                "SYNC_PERIOD_MS".to_string(),
                "0".to_string(),
            ));
        }

        Ok(Self {
            port,
            sync_period_ms,
            subscribe_events,
            toggl,
            particle,
            config_file,
        })
    }

    pub fn sync_period(&self) -> Duration {
        Duration::from_millis(self.sync_period_ms.value)
    }

    /// Builds the Toggl client; needs `TOGGL_API_TOKEN`.
    pub fn toggl_client(&self) -> Result<TogglClient, ConfigError> {
        let token = self
            .toggl
            .api_token
            .as_ref()
            .ok_or(ConfigError::Missing("TOGGL_API_TOKEN"))?;
        let client = TogglClient::new(token);
        Ok(match &self.toggl.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        })
    }

    /// Builds the Particle client; needs `PARTICLE_API_TOKEN` and
    /// `PARTICLE_DEVICE_NAME`.
    pub fn particle_client(&self) -> Result<ParticleClient, ConfigError> {
        let token = self
            .particle
            .api_token
            .as_ref()
            .ok_or(ConfigError::Missing("PARTICLE_API_TOKEN"))?;
        let device = self
            .particle
            .device_name
            .as_ref()
            .ok_or(ConfigError::Missing("PARTICLE_DEVICE_NAME"))?;
        let client = ParticleClient::new(token, device);
        Ok(match &self.particle.base_url {
            Some(url) => client.with_base_url(url),
            None => client,
        })
    }

    /// Board slot mapping; needs `TOGGL_PROJECT_IDS` with no project listed
    /// twice.
    ///
    /// A table with the wrong number of projects is returned as-is: every
    /// cycle against it takes no action, so it is only warned about here.
    pub fn position_table(&self) -> Result<PositionTable, ConfigError> {
        if self.toggl.project_ids.is_empty() {
            return Err(ConfigError::Missing("TOGGL_PROJECT_IDS"));
        }
        let table: PositionTable = self
            .toggl
            .project_ids
            .iter()
            .copied()
            .map(ProjectId)
            .collect();
        if let Some(id) = table.duplicate() {
            return Err(ConfigError::InvalidValue(
                "TOGGL_PROJECT_IDS".to_string(),
                format!("{} appears on more than one slot", id),
            ));
        }
        if !table.is_complete() {
            tracing::warn!(
                "TOGGL_PROJECT_IDS has {} project(s) but the board has {} slots; sync will do nothing",
                table.len(),
                table.slots()
            );
        }
        Ok(table)
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/togglboard/
    /// - macOS: ~/Library/Application Support/togglboard/
    /// - Windows: %APPDATA%/togglboard/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("togglboard")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string(), value.to_string()))
}

/// Parses a comma separated list such as `"1000, 2000,3000"`.
fn parse_project_ids(value: &str) -> Result<Vec<u64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| parse_env("TOGGL_PROJECT_IDS", id))
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(String, String),
    Missing(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: '{}'", name, value)
            }
            ConfigError::Missing(name) => write!(f, "{} is not configured", name),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::tempdir;

    fn load(path: PathBuf, vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::load_with_env(Some(path), move |name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_config() {
        let temp_dir = tempdir().unwrap();
        let config = load(temp_dir.path().join("nonexistent.yaml"), &[]).unwrap();

        assert_eq!(config.port.value, 3000);
        assert_eq!(config.port.source, ConfigSource::Default);
        assert_eq!(config.sync_period(), Duration::from_secs(10));
        assert!(config.subscribe_events.value);
        assert!(config.config_file.is_none());
        assert!(config.toggl.project_ids.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "port: 8080").unwrap();
        writeln!(file, "sync_period_ms: 5000").unwrap();
        writeln!(file, "toggl:").unwrap();
        writeln!(file, "  api_token: abc123").unwrap();
        writeln!(file, "  project_ids: [1000, 2000, 3000, 4000, 5000, 6000, 7000]").unwrap();
        writeln!(file, "particle:").unwrap();
        writeln!(file, "  api_token: particle123").unwrap();
        writeln!(file, "  device_name: my-particle-device").unwrap();

        let config = load(config_path.clone(), &[]).unwrap();
        assert_eq!(config.port.value, 8080);
        assert_eq!(config.port.source, ConfigSource::File);
        assert_eq!(config.sync_period_ms.value, 5000);
        assert_eq!(config.toggl.api_token.as_deref(), Some("abc123"));
        assert_eq!(config.particle.device_name.as_deref(), Some("my-particle-device"));
        assert_eq!(config.config_file, Some(config_path));

        let table = config.position_table().unwrap();
        assert!(table.is_complete());
        assert_eq!(table.get(3), Some(ProjectId(4000)));
        assert!(config.toggl_client().is_ok());
        assert_eq!(config.particle_client().unwrap().device_name(), "my-particle-device");
    }

    #[test]
    fn test_env_var_overrides_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "port: 8080").unwrap();
        writeln!(file, "toggl:").unwrap();
        writeln!(file, "  project_ids: [1, 2]").unwrap();

        let config = load(
            config_path,
            &[
                ("PORT", "9090"),
                ("SYNC_PERIOD_MS", "2500"),
                ("TOGGL_PROJECT_IDS", "1000, 2000,3000 ,4000,5000,6000,7000"),
                ("TOGGLBOARD_SUBSCRIBE_EVENTS", "false"),
            ],
        )
        .unwrap();
        assert_eq!(config.port.value, 9090);
        assert_eq!(config.port.source, ConfigSource::Environment);
        assert_eq!(config.sync_period_ms.value, 2500);
        assert!(!config.subscribe_events.value);
        assert_eq!(
            config.toggl.project_ids,
            vec![1000, 2000, 3000, 4000, 5000, 6000, 7000]
        );
    }

    #[test]
    fn test_missing_required_values() {
        let temp_dir = tempdir().unwrap();
        let config = load(temp_dir.path().join("none.yaml"), &[]).unwrap();

        let err = config.toggl_client().unwrap_err();
        assert_eq!(err.to_string(), "TOGGL_API_TOKEN is not configured");
        let err = config.particle_client().unwrap_err();
        assert_eq!(err.to_string(), "PARTICLE_API_TOKEN is not configured");
        let err = config.position_table().unwrap_err();
        assert_eq!(err.to_string(), "TOGGL_PROJECT_IDS is not configured");

        let config = load(
            temp_dir.path().join("none.yaml"),
            &[("PARTICLE_API_TOKEN", "particle123")],
        )
        .unwrap();
        let err = config.particle_client().unwrap_err();
        assert_eq!(err.to_string(), "PARTICLE_DEVICE_NAME is not configured");
    }

    #[test]
    fn test_short_table_is_loaded_but_incomplete() {
        let temp_dir = tempdir().unwrap();
        let config = load(
            temp_dir.path().join("none.yaml"),
            &[("TOGGL_PROJECT_IDS", "1,2,3")],
        )
        .unwrap();
        assert!(!config.position_table().unwrap().is_complete());
    }

    #[test]
    fn test_duplicate_project_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let config = load(
            temp_dir.path().join("none.yaml"),
            &[("TOGGL_PROJECT_IDS", "1000,1000,3000,4000,5000,6000,7000")],
        )
        .unwrap();

        let err = config.position_table().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref name, _) if name == "TOGGL_PROJECT_IDS"));
        assert_eq!(
            err.to_string(),
            "Invalid value for TOGGL_PROJECT_IDS: '1000 appears on more than one slot'"
        );
    }

    #[test]
    fn test_invalid_env_values() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("none.yaml");

        let err = load(path.clone(), &[("TOGGL_PROJECT_IDS", "1000,abc")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for TOGGL_PROJECT_IDS: 'abc'");

        assert!(load(path.clone(), &[("PORT", "not-a-port")]).is_err());
        assert!(load(path, &[("SYNC_PERIOD_MS", "0")]).is_err());
    }

    #[test]
    fn test_invalid_yaml_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = load(config_path, &[]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
