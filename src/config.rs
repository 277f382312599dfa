use crate::models::CabinClass;
use crate::sort::SortMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_BASE_URL: &str = "https://test.api.amadeus.com";

const ENV_CLIENT_ID: &str = "AMADEUS_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "AMADEUS_CLIENT_SECRET";
const ENV_BASE_URL: &str = "AMADEUS_API_URL";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub search: SearchDefaults,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub request_timeout_seconds: u64,
}

/// Values used for any search option not given on the command line.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SearchDefaults {
    pub origin: String,
    pub destination: String,
    pub departure_in_days: i64, // Offset from today when no date is given
    pub adults: u8,
    pub cabin: CabinClass,
    pub currency: String,
    pub max_results: u16,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UiConfig {
    pub default_sort: SortMode,
    pub tick_rate_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            origin: "JFK".to_string(),
            destination: "LAX".to_string(),
            departure_in_days: 30,
            adults: 1,
            cabin: CabinClass::Economy,
            currency: "USD".to_string(),
            max_results: 50,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_sort: SortMode::PriceAsc,
            tick_rate_ms: 150,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
        }
    }
}

/// Problems met while loading the config file. Loading still yields a usable
/// [`Config`]; these are reported once logging is up.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse {path}: {source}. Using defaults.")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not write default {path} to disk: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not serialise default configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Outcome of [`Config::load_from`].
#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    /// Set when the defaults were written to a file that didn't exist yet.
    pub wrote_default: Option<PathBuf>,
    pub problem: Option<ConfigError>,
}

impl ConfigLoad {
    /// Logs what happened during loading. Call after the subscriber is installed.
    pub fn report(&self) {
        if let Some(path) = &self.wrote_default {
            info!("Wrote default configuration to {}", path.display());
        }
        if let Some(problem) = &self.problem {
            warn!("{}", problem);
        }
    }
}

impl Config {
    /// Loads the config at `path`, then applies environment overrides for the
    /// API credentials. If the file doesn't exist, writes the defaults there
    /// for the user to edit later.
    pub fn load_from(path: &Path) -> ConfigLoad {
        let mut wrote_default = None;
        let mut problem = None;

        let mut config = match fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Config>(&content) {
                Ok(config) => config,
                Err(source) => {
                    problem = Some(ConfigError::Parse {
                        path: path.to_path_buf(),
                        source,
                    });
                    Config::default()
                }
            },
            Err(_) => {
                let config = Config::default();
                match config.write_default(path) {
                    Ok(()) => wrote_default = Some(path.to_path_buf()),
                    Err(e) => problem = Some(e),
                }
                config
            }
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        ConfigLoad {
            config,
            wrote_default,
            problem,
        }
    }

    fn write_default(&self, path: &Path) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = non_empty(ENV_CLIENT_ID) {
            self.api.client_id = id;
        }
        if let Some(secret) = non_empty(ENV_CLIENT_SECRET) {
            self.api.client_secret = secret;
        }
        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.api.base_url = url;
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.api.client_id.is_empty() && !self.api.client_secret.is_empty()
    }
}
