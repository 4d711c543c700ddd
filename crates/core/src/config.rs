use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use once_cell::sync::Lazy;
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

pub static DEFAULT_API_URL: &str = "http://localhost:3000";
static DEFAULT_LOG_FILTER: &str = "info";
static CONFIG_FILE_NAME: &str = "config.toml";
static ENV_API_URL: &str = "TAREAS_API_URL";
static ENV_DATA_DIR: &str = "TAREAS_DATA_DIR";

static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("dev", "tareas", "tareas"));

/// Values supplied on the command line; they win over everything else.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub log_filter: Option<String>,
}

/// Shape of the optional `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    timeout_secs: Option<u64>,
    log: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    api_url: Url,
    request_timeout: Option<Duration>,
    log_filter: String,
    data_dir: PathBuf,
}

impl AppConfig {
    /// Resolve the configuration from overrides, environment, the config file
    /// and finally the built-in defaults, in that order.
    pub fn discover(overrides: ConfigOverrides) -> Result<Self> {
        let file_path = overrides
            .config_path
            .clone()
            .or_else(default_config_path);
        let file = match &file_path {
            Some(path) if path.exists() => load_file(path)?,
            Some(path) if overrides.config_path.is_some() => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                }
                .into())
            }
            _ => FileConfig::default(),
        };

        let api_url = overrides
            .api_url
            .or_else(|| env::var(ENV_API_URL).ok())
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let data_dir = resolve_data_dir(overrides.data_dir)?;
        if !data_dir.exists() {
            fs::create_dir_all(&data_dir).with_context(|| {
                format!("Failed to create data directory at {}", data_dir.display())
            })?;
        }

        Ok(Self {
            api_url: parse_api_url(&api_url)?,
            request_timeout: file.timeout_secs.filter(|secs| *secs > 0).map(Duration::from_secs),
            log_filter: overrides
                .log_filter
                .or(file.log)
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            data_dir,
        })
    }

    /// Construct a configuration pointing at `api_url` with every other
    /// setting at its default.
    pub fn for_api(api_url: &str, data_dir: PathBuf) -> Result<Self> {
        Ok(Self {
            api_url: parse_api_url(api_url)?,
            request_timeout: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            data_dir,
        })
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("tareas.log")
    }
}

fn parse_api_url(value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        value: value.to_string(),
        source,
    })
}

fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn default_config_path() -> Option<PathBuf> {
    PROJECT_DIRS
        .as_ref()
        .map(|project| project.config_dir().join(CONFIG_FILE_NAME))
}

fn resolve_data_dir(data_dir_override: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = data_dir_override {
        return Ok(dir);
    }

    if let Ok(env_dir) = env::var(ENV_DATA_DIR) {
        return Ok(PathBuf::from(env_dir));
    }

    if let Some(project) = &*PROJECT_DIRS {
        return Ok(project.data_dir().to_path_buf());
    }

    if let Some(base) = BaseDirs::new() {
        return Ok(base.home_dir().join(".tareas"));
    }

    Ok(env::current_dir()?.join(".tareas"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn overrides_in(dir: &TempDir) -> ConfigOverrides {
        ConfigOverrides {
            data_dir: Some(dir.path().join("data")),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn config_file_values_are_applied() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_url = \"http://127.0.0.1:4000\"\ntimeout_secs = 5\nlog = \"debug\"\n",
        )
        .unwrap();

        let mut overrides = overrides_in(&dir);
        overrides.config_path = Some(path);
        let config = AppConfig::discover(overrides).unwrap();

        assert_eq!(config.api_url().as_str(), "http://127.0.0.1:4000/");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.log_filter(), "debug");
        assert!(config.data_dir().exists());
    }

    #[test]
    fn cli_override_beats_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_url = \"http://127.0.0.1:4000\"\n").unwrap();

        let mut overrides = overrides_in(&dir);
        overrides.config_path = Some(path);
        overrides.api_url = Some("http://127.0.0.1:5000".into());
        overrides.log_filter = Some("warn".into());
        let config = AppConfig::discover(overrides).unwrap();

        assert_eq!(config.api_url().as_str(), "http://127.0.0.1:5000/");
        assert_eq!(config.log_filter(), "warn");
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn explicit_missing_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut overrides = overrides_in(&dir);
        overrides.config_path = Some(dir.path().join("nope.toml"));
        assert!(AppConfig::discover(overrides).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "colour = \"blue\"\n").unwrap();

        let mut overrides = overrides_in(&dir);
        overrides.config_path = Some(path);
        let err = AppConfig::discover(overrides).unwrap_err();
        assert!(err.to_string().contains("failed to parse config file"));
    }

    #[test]
    fn invalid_url_is_reported() {
        let err = AppConfig::for_api("not a url", PathBuf::from(".")).unwrap_err();
        assert!(err.to_string().contains("invalid API url"));
    }
}
