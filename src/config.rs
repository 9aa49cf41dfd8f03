use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::proctor::{DEFAULT_MAX_TAB_SWITCHES, DEFAULT_VIOLATION_COOLDOWN};
use crate::session::SessionSettings;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000/api/v1";
/// Upper bound for `submit_retries`; backoff doubles per attempt.
pub const MAX_SUBMIT_RETRIES: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub backend_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    pub submit_retries: u32,
    pub max_tab_switches: u32,
    pub violation_cooldown_ms: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            auth_token: None,
            request_timeout_secs: 30,
            submit_retries: 2,
            max_tab_switches: DEFAULT_MAX_TAB_SWITCHES,
            violation_cooldown_ms: DEFAULT_VIOLATION_COOLDOWN.as_millis() as u64,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Apply `MOCKTEST_*` overrides on top of the stored values.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = value("MOCKTEST_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Some(token) = value("MOCKTEST_AUTH_TOKEN") {
            self.auth_token = Some(token);
        }
        if let Some(level) = value("MOCKTEST_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(raw) = value("MOCKTEST_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_number("MOCKTEST_REQUEST_TIMEOUT_SECS", &raw)?;
        }
        if let Some(raw) = value("MOCKTEST_MAX_TAB_SWITCHES") {
            self.max_tab_switches = parse_number("MOCKTEST_MAX_TAB_SWITCHES", &raw)?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_secs",
                value: "0".to_string(),
            });
        }
        if self.submit_retries > MAX_SUBMIT_RETRIES {
            return Err(ConfigError::InvalidValue {
                field: "submit_retries",
                value: self.submit_retries.to_string(),
            });
        }
        if self.max_tab_switches == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_tab_switches",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            max_tab_switches: self.max_tab_switches,
            violation_cooldown: Duration::from_millis(self.violation_cooldown_ms),
        }
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        field,
        value: raw.to_string(),
    })
}

pub trait ConfigStore {
    fn load(&self) -> Result<Config, ConfigError>;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = ProjectDirs::from("", "", "mocktest")
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("mocktest_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// A missing file yields the defaults; a corrupt one is an error.
    fn load(&self) -> Result<Config, ConfigError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice::<Config>(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
