//! Application configuration loaded from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

/// Where usage counters are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local map. Counters are lost on restart and not shared
    /// between instances.
    Memory,
    Postgres,
    Redis,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreBackend::Memory => "memory",
            StoreBackend::Postgres => "postgres",
            StoreBackend::Redis => "redis",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "redis" => Ok(StoreBackend::Redis),
            _ => Err(ConfigError::UnknownStore(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown LICENSING_STORE '{0}' (expected memory, postgres or redis)")]
    UnknownStore(String),

    #[error("the in-memory counter store cannot be used when APP_ENV=production")]
    MemoryStoreInProduction,

    #[error(
        "LICENSING_STORE=redis in production requires REDIS_DURABILITY_ACKNOWLEDGED=true \
         (the server must run AOF with appendfsync always, or usage can be lost on restart)"
    )]
    UnacknowledgedRedisDurability,

    #[error("LICENSING_STORE=postgres requires DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("store backend '{0}' is not compiled in (enable the '{0}' feature)")]
    BackendDisabled(StoreBackend),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Deployment environment, `development` unless `APP_ENV` says otherwise.
    pub environment: String,
    pub store: StoreBackend,
    /// Tier reported for profiles without an active subscription.
    pub default_tier: String,
    /// Operator confirmation that Redis persists every write.
    pub redis_durability_acknowledged: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let store = match env::var("LICENSING_STORE") {
            Ok(value) => value.parse()?,
            Err(_) => StoreBackend::Memory,
        };

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            store,
            default_tier: env::var("LICENSING_DEFAULT_TIER").unwrap_or_else(|_| "FREE".to_string()),
            redis_durability_acknowledged: env::var("REDIS_DURABILITY_ACKNOWLEDGED")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        };
        config.validate()?;

        Ok(config)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Reject combinations that would let quotas silently reset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_production() {
            return Ok(());
        }
        match self.store {
            StoreBackend::Memory => Err(ConfigError::MemoryStoreInProduction),
            StoreBackend::Redis if !self.redis_durability_acknowledged => {
                Err(ConfigError::UnacknowledgedRedisDurability)
            }
            _ => Ok(()),
        }
    }
}
