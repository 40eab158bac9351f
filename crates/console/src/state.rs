use std::net::SocketAddr;
use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};
use storage::{StorageConfig, DEFAULT_REGION};
use url::Url;

pub const APP_NAME: &str = "console";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the console API listens on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Storage server the console manages
    #[serde(default = "default_storage")]
    pub storage: StorageConfig,
    #[serde(default)]
    pub session: SessionConfig,
    /// Default tracing directive (overridden by RUST_LOG)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret used to sign session tokens
    #[serde(default)]
    pub secret: String,
    /// How long an issued session stays valid
    #[serde(default = "default_lifetime_hours")]
    pub lifetime_hours: u64,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 9090))
}

fn default_storage() -> StorageConfig {
    // constant URL, always parses
    let endpoint = Url::parse("http://localhost:9000").expect("hardcoded URL must parse");
    StorageConfig::new(endpoint).with_region(DEFAULT_REGION)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_lifetime_hours() -> u64 {
    12
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            lifetime_hours: default_lifetime_hours(),
        }
    }
}

impl SessionConfig {
    /// A config with a freshly generated signing secret.
    pub fn generate() -> Self {
        let secret = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        Self {
            secret,
            ..Self::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            storage: default_storage(),
            session: SessionConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Parsed log level, falling back to INFO for unknown values.
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the console directory (~/.console)
    pub console_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the console directory path (custom or default ~/.console)
    pub fn console_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new console directory with a config file
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let console_dir = Self::console_dir(custom_path)?;

        if console_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&console_dir)?;

        let mut config = config.unwrap_or_default();
        if config.session.secret.is_empty() {
            config.session = SessionConfig {
                lifetime_hours: config.session.lifetime_hours,
                ..SessionConfig::generate()
            };
        }

        let config_path = console_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            console_dir,
            config_path,
            config,
        })
    }

    /// Load existing state from the console directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let console_dir = Self::console_dir(custom_path)?;

        if !console_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_path = console_dir.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        if config.session.secret.is_empty() {
            return Err(StateError::MissingSessionSecret);
        }

        Ok(Self {
            console_dir,
            config_path,
            config,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("console directory not initialized. Run 'console init' first")]
    NotInitialized,

    #[error("console directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("config has no session secret")]
    MissingSessionSecret,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console");

        let created = AppState::init(Some(path.clone()), None).unwrap();
        assert!(created.config_path.exists());
        assert_eq!(created.config.session.secret.len(), 64);

        let loaded = AppState::load(Some(path)).unwrap();
        assert_eq!(loaded.config, created.config);
    }

    #[test]
    fn test_init_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("console");

        AppState::init(Some(path.clone()), None).unwrap();
        assert!(matches!(
            AppState::init(Some(path), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppState::load(Some(dir.path().join("nope"))),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            log_level = "debug"

            [session]
            secret = "s3cr3t"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen_addr.port(), 9090);
        assert_eq!(config.storage.endpoint.as_str(), "http://localhost:9000/");
        assert_eq!(config.session.lifetime_hours, 12);
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);
    }
}
