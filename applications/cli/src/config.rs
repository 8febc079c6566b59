/// CLI configuration
use crate::error::{CliError, Result};
use amp_playback::PlaybackConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "amp.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CliConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub simulator: SimulatorSettings,

    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    #[serde(default)]
    pub catalog_file: Option<PathBuf>,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

/// Behaviour of the simulated renderer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SimulatorSettings {
    /// Delay between a load and its prepared event
    #[serde(default = "default_prepare_delay_ms")]
    pub prepare_delay_ms: u64,

    /// Track ids whose prepare fails
    #[serde(default)]
    pub failing_ids: Vec<i64>,

    /// Error code reported for failing tracks
    #[serde(default = "default_error_code")]
    pub error_code: i32,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("amp-state.json")
}

fn default_log_filter() -> String {
    "amp_cli=info,amp_playback=info".to_string()
}

fn default_prepare_delay_ms() -> u64 {
    150
}

fn default_error_code() -> i32 {
    -1004
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            prepare_delay_ms: default_prepare_delay_ms(),
            failing_ids: Vec::new(),
            error_code: default_error_code(),
        }
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            simulator: SimulatorSettings::default(),
            state_file: default_state_file(),
            catalog_file: None,
            log_filter: default_log_filter(),
        }
    }
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `amp.toml` in the working
    /// directory is used when present. Environment variables prefixed with
    /// `AMP_` override file values, with `__` between section and key
    /// (`AMP_PLAYBACK__PREPARE_TIMEOUT_MS=5000`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with AMP_)
        settings = settings.add_source(
            config::Environment::with_prefix("AMP")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("simulator.failing_ids")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let config: CliConfig = config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.state_file.as_os_str().is_empty() {
            return Err(CliError::Config("state_file must not be empty".to_string()));
        }

        if self.playback.event_poll_interval_ms == 0 {
            return Err(CliError::Config(
                "playback.event_poll_interval_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
