use async_trait::async_trait;

/// Maps a subject (profile) to the name of its subscription tier.
///
/// Returns the raw tier name; the licensing service parses it and rejects
/// names outside the known tier set.
#[async_trait]
pub trait TierResolver: Send + Sync {
    async fn resolve_tier(&self, subject_id: &str) -> Result<String, ResolverError>;
}

/// Tier resolution errors.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    #[error("Subscription source unavailable: {0}")]
    Unavailable(String),

    #[error("Subscription lookup failed: {0}")]
    Lookup(String),
}
