use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OraConfig {
    pub connection: ConnectionConfig,
    pub logging: LoggingConfig,
    pub verify: VerifyConfig,
    pub collection: CollectionConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ConnectionConfig {
    pub user: String,
    pub password: String,
    pub connect_string: String,
    pub pool_min: u32,
    pub pool_max: u32,
    pub pool_increment: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

/// Tables the application's migrations are expected to create.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VerifyConfig {
    pub expected_tables: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollectionConfig {
    pub dir: String,
    pub base: String,
    pub output: String,
    /// Fragment files, in folder order: `parts[i]` replaces `item[i].item`.
    pub parts: Vec<String>,
}

impl Default for OraConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            logging: LoggingConfig::default(),
            verify: VerifyConfig::default(),
            collection: CollectionConfig::default(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            connect_string: "oracle.fiap.com.br:1521/orcl".into(),
            pool_min: 1,
            pool_max: 5,
            pool_increment: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        let expected_tables = [
            "NORMA_AMBIENTAL",
            "DEPARTAMENTO",
            "AUDITORIA",
            "CONFORMIDADE",
            "PENDENCIA",
            "LOG_CONFORMIDADE",
            "USUARIOS",
        ];
        Self {
            expected_tables: expected_tables.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        let parts = [
            "auth_requests.json",
            "health_requests.json",
            "auditorias_requests.json",
            "conformidades_requests.json",
            "logs_requests.json",
            "pendencias_requests.json",
        ];
        Self {
            dir: "postman".into(),
            base: "verdicomply-api-collection.json".into(),
            output: "verdicomply-api-collection-complete.json".into(),
            parts: parts.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Returns `~/.oraschema/`
pub fn default_oraschema_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".oraschema")
}

/// Returns the default config file path: `~/.oraschema/config.toml`
pub fn default_config_path() -> PathBuf {
    default_oraschema_dir().join("config.toml")
}

impl OraConfig {
    /// Load config from TOML file (if it exists), then `.env`, then env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply `.env` and env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            OraConfig::default()
        };

        // A missing .env is the normal case.
        if let Ok(env_path) = dotenvy::dotenv() {
            info!(path = %env_path.display(), "loaded .env");
        }

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    /// (ORACLE_USER, ORACLE_PASSWORD, ORACLE_CONNECT_STRING, ORASCHEMA_LOG_LEVEL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ORACLE_USER") {
            self.connection.user = val;
        }
        if let Ok(val) = std::env::var("ORACLE_PASSWORD") {
            self.connection.password = val;
        }
        if let Ok(val) = std::env::var("ORACLE_CONNECT_STRING") {
            self.connection.connect_string = val;
        }
        if let Ok(val) = std::env::var("ORASCHEMA_LOG_LEVEL") {
            self.logging.level = val;
        }
    }

    /// Check that credentials are present before any connection attempt.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.connection.user.is_empty(),
            "no Oracle user configured: set ORACLE_USER or [connection].user"
        );
        anyhow::ensure!(
            !self.connection.connect_string.is_empty(),
            "no connect string configured: set ORACLE_CONNECT_STRING or [connection].connect_string"
        );
        anyhow::ensure!(
            self.connection.pool_min <= self.connection.pool_max,
            "pool_min ({}) exceeds pool_max ({})",
            self.connection.pool_min,
            self.connection.pool_max
        );
        Ok(())
    }

    /// Resolve the collection directory, expanding `~` if needed.
    pub fn resolved_collection_dir(&self) -> PathBuf {
        expand_tilde(&self.collection.dir)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
