use async_trait::async_trait;
use logtrail_core::AppResult;
use logtrail_domain::RetentionConfig;

/// Backing document for the retention policy.
#[async_trait]
pub trait RetentionConfigRepository: Send + Sync {
    /// Reads the stored policy, or `None` when no document exists yet.
    async fn load(&self) -> AppResult<Option<RetentionConfig>>;

    /// Replaces the stored policy atomically.
    async fn save(&self, config: &RetentionConfig) -> AppResult<()>;
}
