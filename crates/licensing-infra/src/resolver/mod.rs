//! Tier resolver implementations.

mod memory;

pub use memory::InMemoryTierResolver;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "postgres")]
pub use postgres::PostgresTierResolver;
