//! Layered configuration for the zit backend.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `zit.toml` in the working directory (optional)
//! 3. Environment variables with the `BACKEND__` prefix, `__` separating
//!    nested sections (`BACKEND__DB__POOL_SIZE` -> `db.pool_size`)
//!
//! [`Config::load_with_dotenv`] reads `.env` and `.env.dev` into the process
//! environment before building the figment.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "BACKEND__";

/// Optional TOML file merged over the defaults.
pub const CONFIG_FILE: &str = "zit.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Process-wide configuration, loaded once at startup and shared read-only.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub db: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            db: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            static_dir: default_static_dir(),
        }
    }
}

impl Config {
    /// Build the provider chain. Public so tests can layer extra providers.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load from defaults, `zit.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.env` / `.env.dev` first, then [`Config::load`].
    ///
    /// Variables already present in the process environment win over both
    /// files; `.env` wins over `.env.dev`.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        for file in [".env", ".env.dev"] {
            if let Err(err) = dotenvy::from_filename(file) {
                if !err.not_found() {
                    tracing::warn!(file, error = %err, "ignoring unreadable env file");
                }
            }
        }
        Self::load()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "db.pool_size",
                reason: "must be at least 1".into(),
            });
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                field: "auth.bcrypt_cost",
                reason: format!("{} is outside 4..=31", self.auth.bcrypt_cost),
            });
        }
        if self.auth.token_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth.token_ttl_minutes",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }
}

/// HTTP-facing settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Comma-separated list of allowed CORS origins.
    #[serde(default = "default_origins")]
    pub origins: String,
}

fn default_origins() -> String {
    "http://localhost,http://localhost:8000".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origins: default_origins(),
        }
    }
}

impl AppConfig {
    /// Individual origins, trimmed, empty entries dropped.
    pub fn origin_list(&self) -> Vec<String> {
        self.origins
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

/// Database connection and pool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
    pub name: String,

    /// Full connection URL; when set, the component fields above are ignored.
    /// Accepts `postgres://` and `sqlite://` URLs.
    pub url: Option<String>,

    /// Log every statement (`sqlx::query` target).
    pub echo: bool,
    /// Log session checkout, commit, rollback and release.
    pub echo_pool: bool,
    pub pool_size: u32,
    pub max_overflow: u32,
    pub pool_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            user: Some("postgres".to_string()),
            password: Some("postgres".to_string()),
            host: "localhost".to_string(),
            port: 5432,
            name: "postgres".to_string(),
            url: None,
            echo: false,
            echo_pool: false,
            pool_size: 50,
            max_overflow: 10,
            pool_timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    /// Connection URL, either the explicit override or one assembled from
    /// the component fields.
    pub fn url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        let credentials = match (&self.user, &self.password) {
            (Some(user), Some(password)) => format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(password)
            ),
            (Some(user), None) => format!("{}@", urlencoding::encode(user)),
            _ => String::new(),
        };

        format!(
            "postgres://{credentials}{}:{}/{}",
            self.host, self.port, self.name
        )
    }

    /// Upper bound on simultaneously open connections.
    pub fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }

    /// Config pointing at a SQLite file, used for local runs and tests.
    pub fn sqlite(path: impl AsRef<std::path::Path>) -> Self {
        Self {
            url: Some(format!("sqlite://{}?mode=rwc", path.as_ref().display())),
            pool_size: 4,
            max_overflow: 0,
            pool_timeout_secs: 5,
            ..Self::default()
        }
    }
}

/// Authentication settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 24 * 60,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_ttl_minutes)
    }
}
