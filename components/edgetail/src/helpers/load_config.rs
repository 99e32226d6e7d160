// External crates
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

/// Prefix of environment overrides, e.g. `EDGETAIL__GENERAL__TOKEN`.
const ENV_PREFIX: &str = "EDGETAIL";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GeneralConfig {
    pub token: Option<String>,
    pub events_url: String,
    pub request_timeout_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            token: None,
            events_url: "https://api.azionapi.net/events/graphql".to_string(),
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct TailConfig {
    pub interval_secs: u64,
    pub default_limit: i64,
    pub lookback_minutes: u64,
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            default_limit: 100,
            lookback_minutes: 5,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub tail: TailConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load the configuration: built-in defaults, then the TOML file, then
    /// `EDGETAIL__<SECTION>__<KEY>` environment overrides.
    ///
    /// An explicitly given file must exist; the default location is optional.
    #[instrument(
        name = "config_loader",
        target = "helpers::load_config",
        level = "trace",
        skip_all
    )]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path_ref, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path(), false),
        };

        tracing::trace!(
            configuration_file_path = %path_ref.display(),
            required,
            "Loading edgetail configuration file"
        );

        let settings = config::Config::builder()
            .add_source(
                config::File::from(path_ref.as_path())
                    .format(config::FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build();

        let settings = match settings {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read configuration sources");
                return Err(e)
                    .with_context(|| format!("Failed to read config file at {:?}", path_ref));
            }
        };

        let config: Config = match settings.try_deserialize() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse configuration");
                return Err(e)
                    .with_context(|| format!("Failed to parse configuration from {:?}", path_ref));
            }
        };

        tracing::trace!(configuration_file_path = %path_ref.display(), "edgetail configuration loaded successfully");
        Ok(config)
    }

    /// Stored API token, if one is configured and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.general
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Token required for any call to the events API.
    pub fn require_token(&self) -> Result<&str> {
        match self.token() {
            Some(token) => Ok(token),
            None => bail!(
                "no API token configured; pass --token, set EDGETAIL_TOKEN, or add `token` under [general]"
            ),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.general.request_timeout_secs.max(1))
    }

    /// Copy safe to print: the token is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.token().is_some() {
            copy.general.token = Some("<redacted>".to_string());
        }
        copy
    }
}

/// `$HOME/.config/edgetail/edgetail.toml`, or `edgetail.toml` in the working
/// directory when `HOME` is unset.
pub fn default_config_path() -> PathBuf {
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home)
            .join(".config")
            .join("edgetail")
            .join("edgetail.toml"),
        None => PathBuf::from("edgetail.toml"),
    }
}
