//! Application state - shared across all handlers.

use std::sync::Arc;

use licensing_core::domain::PlanCatalog;
use licensing_core::ports::{RateLimitStore, StoreError, TierResolver};
use licensing_core::{LicensingError, LicensingService};
use licensing_infra::{InMemoryRateLimitStore, InMemoryTierResolver};

#[cfg(feature = "postgres")]
use licensing_infra::{DatabaseConfig, PostgresRateLimitStore, PostgresTierResolver, database};
#[cfg(feature = "redis")]
use licensing_infra::{RedisRateLimitConfig, RedisRateLimitStore};

use crate::config::{AppConfig, ConfigError, StoreBackend};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("plan catalog rejected: {0}")]
    Catalog(#[from] LicensingError),

    #[error("database connection failed: {0}")]
    Database(String),

    #[error("counter store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub licensing: Arc<LicensingService>,
    pub store_backend: StoreBackend,
}

impl AppState {
    /// Wrap an already assembled service.
    pub fn from_service(licensing: Arc<LicensingService>, store_backend: StoreBackend) -> Self {
        Self {
            licensing,
            store_backend,
        }
    }

    /// Build the licensing service with the configured store and resolver.
    ///
    /// Unlike a cache, the counter store is never swapped for an in-memory
    /// fallback at runtime: a backend that cannot be reached aborts startup.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let catalog = Arc::new(PlanCatalog::standard()?);

        #[cfg(feature = "postgres")]
        let db = match DatabaseConfig::from_env() {
            Some(db_config) => Some(Arc::new(
                database::connect(&db_config)
                    .await
                    .map_err(|e| StartupError::Database(e.to_string()))?,
            )),
            None => None,
        };

        #[cfg(feature = "postgres")]
        let resolver: Arc<dyn TierResolver> = match &db {
            Some(db) => Arc::new(
                PostgresTierResolver::new(db.clone()).with_fallback_tier(config.default_tier.clone()),
            ),
            None => memory_resolver(config),
        };
        #[cfg(not(feature = "postgres"))]
        let resolver: Arc<dyn TierResolver> = memory_resolver(config);

        let store: Arc<dyn RateLimitStore> = match config.store {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory counter store; usage resets on restart");
                Arc::new(InMemoryRateLimitStore::new())
            }
            #[cfg(feature = "postgres")]
            StoreBackend::Postgres => {
                let db = db.clone().ok_or(ConfigError::MissingDatabaseUrl)?;
                Arc::new(PostgresRateLimitStore::new(db))
            }
            #[cfg(feature = "redis")]
            StoreBackend::Redis => {
                Arc::new(RedisRateLimitStore::new(RedisRateLimitConfig::from_env()).await?)
            }
            #[allow(unreachable_patterns)]
            disabled => return Err(ConfigError::BackendDisabled(disabled).into()),
        };

        tracing::info!(
            store = %config.store,
            features = catalog.feature_keys().len(),
            "Application state initialized"
        );

        let licensing = LicensingService::new(catalog, resolver, store);
        Ok(Self::from_service(Arc::new(licensing), config.store))
    }
}

fn memory_resolver(config: &AppConfig) -> Arc<dyn TierResolver> {
    tracing::warn!(
        default_tier = %config.default_tier,
        "No subscription database configured; every profile resolves to the default tier"
    );
    Arc::new(InMemoryTierResolver::new(config.default_tier.clone()))
}
