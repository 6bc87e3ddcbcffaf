use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    client::{DEFAULT_ENDPOINT, FeedClient},
    error::ConfigError,
    feed::WEATHER_NAMESPACE,
    format::{DEFAULT_DATE_FORMAT, DEFAULT_FORMAT, DateFormatSpec, FormatSpec},
    model::Units,
    output::Output,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Defaults stored on disk. Every field is optional; command-line flags win.
///
/// Example TOML:
/// ```toml
/// endpoint = "http://weather.yahooapis.com/forecastrss"
/// format = "%c: %T"
/// units = "imperial"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    /// URI of the weather extension namespace in the feed.
    pub namespace: Option<String>,
    pub format: Option<String>,
    pub date_format: Option<String>,
    pub units: Option<Units>,
    /// Append rendered lines to this file instead of stdout.
    pub output: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

/// Per-invocation values that take precedence over [`Config`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub format: Option<String>,
    pub date_format: Option<String>,
    pub output: Option<PathBuf>,
    pub imperial: bool,
    pub use_current_time: bool,
}

/// Everything the orchestrator needs, validated and compiled.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub format: FormatSpec,
    pub date_format: DateFormatSpec,
    pub units: Units,
    pub use_current_time: bool,
    pub namespace: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            format: FormatSpec::default(),
            date_format: DateFormatSpec::default(),
            units: Units::default(),
            use_current_time: false,
            namespace: WEATHER_NAMESPACE.to_string(),
        }
    }
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxfeed", "wxfeed")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    pub fn format(&self) -> &str {
        self.format.as_deref().unwrap_or(DEFAULT_FORMAT)
    }

    pub fn date_format(&self) -> &str {
        self.date_format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Compile templates and merge command-line overrides.
    pub fn resolve(&self, overrides: &Overrides) -> Result<RunConfig, ConfigError> {
        let format = FormatSpec::compile(overrides.format.as_deref().unwrap_or(self.format()))?;
        let date_format =
            DateFormatSpec::new(overrides.date_format.as_deref().unwrap_or(self.date_format()))?;

        let units = if overrides.imperial {
            Units::Imperial
        } else {
            self.units.unwrap_or_default()
        };

        Ok(RunConfig {
            format,
            date_format,
            units,
            use_current_time: overrides.use_current_time,
            namespace: self
                .namespace
                .clone()
                .unwrap_or_else(|| WEATHER_NAMESPACE.to_string()),
        })
    }

    pub fn output(&self, overrides: &Overrides) -> Output {
        match overrides.output.as_ref().or(self.output.as_ref()) {
            Some(path) => Output::Append(path.clone()),
            None => Output::Stdout,
        }
    }

    pub fn client(&self) -> Result<FeedClient, ConfigError> {
        FeedClient::new(self.endpoint(), self.timeout())
    }
}
