use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub rate_limit: RateLimitConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address of the HTTP gateway
    pub gateway_addr: String,
    /// Listen address of the device RPC service
    pub device_rpc_addr: String,
    /// Base URL the gateway uses to reach the device RPC service
    pub device_rpc_url: String,
    /// Base URL of the external user RPC service
    pub user_rpc_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" | "in-memory" => Ok(StorageBackend::Memory),
            other => Err(ConfigError::InvalidValue("DEVICE_STORAGE", other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// System of record connection string
    pub postgres_uri: Option<String>,
    /// Read store connection string
    pub read_store_uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Burst size
    pub capacity: u32,
    pub refill_per_sec: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
    pub legacy_inverted_alg_check: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        Self::preset(environment).with_overrides(|key| env::var(key).ok())
    }

    pub fn preset(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    /// Apply per-key overrides. Unparseable values keep the preset.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(v) = lookup("GATEWAY_ADDR") {
            self.server.gateway_addr = v;
        }
        if let Some(v) = lookup("DEVICE_RPC_ADDR") {
            self.server.device_rpc_addr = v;
        }
        if let Some(v) = lookup("DEVICE_RPC_URL") {
            self.server.device_rpc_url = v;
        }
        if let Some(v) = lookup("USER_RPC_URL") {
            self.server.user_rpc_url = v;
        }

        // Storage
        if let Some(v) = lookup("DEVICE_STORAGE") {
            match v.parse() {
                Ok(backend) => self.storage.backend = backend,
                Err(e) => tracing::warn!("{}; keeping {:?}", e, self.storage.backend),
            }
        }
        if let Some(v) = lookup("POSTGRES_URI").filter(|v| !v.is_empty()) {
            self.storage.postgres_uri = Some(v);
        }
        if let Some(v) = lookup("READ_STORE_URI").filter(|v| !v.is_empty()) {
            self.storage.read_store_uri = Some(v);
        }

        // Database pools
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout =
                v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Rate limiting
        if let Some(v) = lookup("RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = v.parse().unwrap_or(self.rate_limit.enabled);
        }
        if let Some(v) = lookup("RATE_LIMIT_CAPACITY") {
            self.rate_limit.capacity = v.parse().unwrap_or(self.rate_limit.capacity);
        }
        if let Some(v) = lookup("RATE_LIMIT_REFILL_PER_SEC") {
            self.rate_limit.refill_per_sec = v.parse().unwrap_or(self.rate_limit.refill_per_sec);
        }

        // Security
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(v) = lookup("AUTH_LEGACY_INVERTED_ALG_CHECK") {
            self.security.legacy_inverted_alg_check =
                v.parse().unwrap_or(self.security.legacy_inverted_alg_check);
        }

        self
    }

    /// Checks needed before the device service starts
    pub fn validate_device_service(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Postgres {
            if self.storage.postgres_uri.is_none() {
                return Err(ConfigError::Missing("POSTGRES_URI"));
            }
            if self.storage.read_store_uri.is_none() {
                return Err(ConfigError::Missing("READ_STORE_URI"));
            }
        }
        Ok(())
    }

    /// Checks needed before the gateway starts
    pub fn validate_gateway(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if self.rate_limit.enabled && self.rate_limit.capacity == 0 {
            return Err(ConfigError::InvalidValue("RATE_LIMIT_CAPACITY", "0".to_string()));
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                gateway_addr: "127.0.0.1:8080".to_string(),
                device_rpc_addr: "127.0.0.1:50051".to_string(),
                device_rpc_url: "http://127.0.0.1:50051".to_string(),
                user_rpc_url: "http://127.0.0.1:50052".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                postgres_uri: None,
                read_store_uri: None,
            },
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                capacity: 10,
                refill_per_sec: 1.0,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24 * 7, // 1 week
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                legacy_inverted_alg_check: false,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                gateway_addr: "0.0.0.0:8080".to_string(),
                device_rpc_addr: "0.0.0.0:50051".to_string(),
                device_rpc_url: "http://device-service:50051".to_string(),
                user_rpc_url: "http://user-service:50052".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                postgres_uri: None,
                read_store_uri: None,
            },
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                capacity: 10,
                refill_per_sec: 1.0,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["https://staging.example.com".to_string()],
                legacy_inverted_alg_check: false,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                gateway_addr: "0.0.0.0:8080".to_string(),
                device_rpc_addr: "0.0.0.0:50051".to_string(),
                device_rpc_url: "http://device-service:50051".to_string(),
                user_rpc_url: "http://user-service:50052".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                postgres_uri: None,
                read_store_uri: None,
            },
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                capacity: 10,
                refill_per_sec: 1.0,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                cors_origins: vec!["https://app.example.com".to_string()],
                legacy_inverted_alg_check: false,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}
