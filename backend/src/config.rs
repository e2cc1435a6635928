//! Configuration management.

use crate::llm::{PromptConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::mcp::TransportMode;
use crate::paths::{DataPaths, PathConfig};
use crate::storage::{JsonFileStorage, MemoryStorage, PostgresStorage, TodoStorage};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Environment variable consulted when no LLM API key is configured.
pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Configuration structure that matches the TOML file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    llm: LlmConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ServerConfig {
    #[serde(default = "default_port")]
    port: u16,
    /// "stateful" or "stateless"
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default)]
    cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            mode: default_mode(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct StorageConfig {
    database_url: Option<String>,
    data_dir: Option<PathBuf>,
    todos_path: Option<PathBuf>,
    /// Keep todos in memory only
    #[serde(default)]
    in_memory: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LlmConfig {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LoggingConfig {
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    log_file: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    /// If not set, uses RUST_LOG environment variable or defaults to "info"
    log_level: Option<String>,
}

fn default_port() -> u16 {
    minimart_types::DEFAULT_PORT
}

fn default_mode() -> String {
    TransportMode::default().to_string()
}

/// Where todos are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    JsonFile(PathBuf),
    Postgres(String),
}

impl StorageBackend {
    /// Open the backend. PostgreSQL migrations run before it is returned.
    pub async fn open(&self) -> anyhow::Result<Arc<dyn TodoStorage>> {
        let storage: Arc<dyn TodoStorage> = match self {
            StorageBackend::Memory => {
                info!("Using in-memory todo storage");
                Arc::new(MemoryStorage::new())
            }
            StorageBackend::JsonFile(path) => {
                info!("Using JSON todo storage at {}", path.display());
                Arc::new(JsonFileStorage::new(path))
            }
            StorageBackend::Postgres(url) => {
                info!("Using PostgreSQL todo storage");
                let storage = PostgresStorage::new(url).await?;
                storage.run_migrations().await?;
                Arc::new(storage)
            }
        };
        Ok(storage)
    }
}

/// Values given on the command line. They override every other source.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub mode: Option<TransportMode>,
    pub data_dir: Option<PathBuf>,
    pub todos_path: Option<PathBuf>,
    pub database_url: Option<String>,
    pub in_memory: bool,
    pub log_level: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,
    /// How `/mcp` maps requests onto transports
    pub mode: TransportMode,
    /// Allowed CORS origins; empty allows any origin
    pub cors_allowed_origins: Vec<String>,
    /// Todo persistence
    pub storage: StorageBackend,
    /// Upstream settings for `POST /prompt`
    pub llm: PromptConfig,
    /// Path to log file (if set, logs will be written to file in addition to stdout)
    pub log_file: Option<PathBuf>,
    /// Log level (if set, overrides RUST_LOG environment variable)
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with full priority chain: CLI args > env vars > config files > defaults.
    ///
    /// Config files are searched in this order:
    /// 1. `config.toml` in user config directory (~/.config/minimart/ on Linux)
    /// 2. `.minimart.toml` in current directory
    ///
    /// Environment variables use the `MINIMART_` prefix; the first underscore
    /// after it separates the section, e.g. `MINIMART_SERVER_MODE` or
    /// `MINIMART_STORAGE_DATABASE_URL`.
    pub fn from_figment(overrides: ConfigOverrides) -> anyhow::Result<Self> {
        let local_config = env::current_dir().ok().map(|d| d.join(".minimart.toml"));
        let user_config = directories::ProjectDirs::from("", "", "minimart")
            .map(|dirs| dirs.config_dir().join("config.toml"));

        // Priority: defaults < user config < local config < env vars < CLI args
        let mut figment = Figment::new().merge(Serialized::defaults(ConfigFile::default()));

        if let Some(ref path) = user_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        if let Some(ref path) = local_config {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }

        figment = figment.merge(
            Env::prefixed("MINIMART_").map(|key| key.as_str().replacen('_', ".", 1).into()),
        );

        if let Some(port) = overrides.port {
            figment = figment.merge(Serialized::default("server.port", port));
        }
        if let Some(mode) = overrides.mode {
            figment = figment.merge(Serialized::default("server.mode", mode.as_str()));
        }
        if let Some(ref dir) = overrides.data_dir {
            figment = figment.merge(Serialized::default("storage.data_dir", dir));
        }
        if let Some(ref path) = overrides.todos_path {
            figment = figment.merge(Serialized::default("storage.todos_path", path));
        }
        if let Some(ref url) = overrides.database_url {
            figment = figment.merge(Serialized::default("storage.database_url", url));
        }
        if overrides.in_memory {
            figment = figment.merge(Serialized::default("storage.in_memory", true));
        }
        if let Some(ref level) = overrides.log_level {
            figment = figment.merge(Serialized::default("logging.log_level", level));
        }

        let config_file: ConfigFile = figment.extract()?;
        Self::from_file(config_file)
    }

    fn from_file(config_file: ConfigFile) -> anyhow::Result<Self> {
        let mode = config_file
            .server
            .mode
            .parse::<TransportMode>()
            .map_err(anyhow::Error::msg)?;

        let storage = match (config_file.storage.in_memory, config_file.storage.database_url) {
            (true, _) => StorageBackend::Memory,
            (false, Some(url)) => StorageBackend::Postgres(url),
            (false, None) => {
                let paths = DataPaths::resolve(PathConfig {
                    data_dir: config_file.storage.data_dir,
                    todos_path: config_file.storage.todos_path,
                })?;
                StorageBackend::JsonFile(paths.todos_path)
            }
        };

        let api_key = config_file
            .llm
            .api_key
            .or_else(|| env::var(GROQ_API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty());

        Ok(Self {
            port: config_file.server.port,
            mode,
            cors_allowed_origins: config_file.server.cors_allowed_origins,
            storage,
            llm: PromptConfig {
                api_key,
                model: config_file
                    .llm
                    .model
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: config_file
                    .llm
                    .base_url
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            },
            log_file: config_file.logging.log_file,
            log_level: config_file.logging.log_level,
        })
    }
}
