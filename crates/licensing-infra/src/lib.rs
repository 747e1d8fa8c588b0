//! # Licensing Infrastructure
//!
//! Concrete implementations of the ports defined in `licensing-core`:
//! usage counter stores and tier resolvers.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL counter store and subscription resolver via SeaORM
//! - `redis` - Redis counter store

#[cfg(feature = "postgres")]
pub mod database;
pub mod rate_limit;
pub mod resolver;

// Re-exports - In-Memory
pub use rate_limit::InMemoryRateLimitStore;
pub use resolver::InMemoryTierResolver;

// Re-exports - PostgreSQL
#[cfg(feature = "postgres")]
pub use database::DatabaseConfig;
#[cfg(feature = "postgres")]
pub use rate_limit::PostgresRateLimitStore;
#[cfg(feature = "postgres")]
pub use resolver::PostgresTierResolver;

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use rate_limit::{RedisConfig, RedisRateLimitConfig, RedisRateLimitStore};
