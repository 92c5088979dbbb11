use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use logtrail_core::AppResult;
use logtrail_domain::{RetentionConfig, RetentionConfigUpdate};

use crate::retention_ports::RetentionConfigRepository;

/// Cached access to the retention policy document.
///
/// Reads are served from an in-process cache; every write goes through one
/// write lock and reads the backing document fresh, so a pass-time update of
/// `last_execution` and an operator edit never drop each other's fields.
#[derive(Clone)]
pub struct RetentionPolicyService {
    repository: Arc<dyn RetentionConfigRepository>,
    cache: Arc<RwLock<Option<RetentionConfig>>>,
    write_lock: Arc<Mutex<()>>,
}

impl RetentionPolicyService {
    /// Creates a policy service over a backing document.
    #[must_use]
    pub fn new(repository: Arc<dyn RetentionConfigRepository>) -> Self {
        Self {
            repository,
            cache: Arc::new(RwLock::new(None)),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Reads the backing document, synthesizing defaults when it is absent,
    /// and refreshes the cache.
    pub async fn load(&self) -> AppResult<RetentionConfig> {
        let config = self.read_document().await?;
        *self.cache.write().await = Some(config.clone());
        Ok(config)
    }

    /// Returns the cached policy, loading it on first use.
    pub async fn get(&self) -> AppResult<RetentionConfig> {
        if let Some(config) = self.cache.read().await.as_ref() {
            return Ok(config.clone());
        }

        self.load().await
    }

    /// Validates and persists a whole policy, then replaces the cache.
    pub async fn save(&self, config: RetentionConfig) -> AppResult<()> {
        config.validate()?;

        let _guard = self.write_lock.lock().await;
        self.persist(config).await?;
        info!("retention policy saved");
        Ok(())
    }

    /// Applies a section-level partial update and persists the result.
    pub async fn update(&self, update: RetentionConfigUpdate) -> AppResult<RetentionConfig> {
        let _guard = self.write_lock.lock().await;
        let current = self.read_document().await?;
        let next = update.apply(&current)?;
        self.persist(next.clone()).await?;

        info!(
            time_based_enabled = next.time_based.enabled,
            duration = %next.time_based.duration,
            count_based_enabled = next.count_based.enabled,
            max_entries = next.count_based.max_entries,
            export_enabled = next.export.enabled,
            interval_hours = next.schedule.interval_hours,
            "retention policy updated"
        );
        Ok(next)
    }

    /// Records the time of the last attempted pass.
    ///
    /// Only the schedule marker changes; the rest of the stored document is
    /// written back as read, without re-validating it.
    pub async fn update_last_execution(&self, at: DateTime<Utc>) -> AppResult<RetentionConfig> {
        let _guard = self.write_lock.lock().await;
        let mut config = self.read_document().await?;
        config.schedule.record_execution(at);
        self.persist(config.clone()).await?;

        debug!(last_execution = ?config.schedule.last_execution, "retention pass recorded");
        Ok(config)
    }

    async fn read_document(&self) -> AppResult<RetentionConfig> {
        Ok(self.repository.load().await?.unwrap_or_default())
    }

    async fn persist(&self, config: RetentionConfig) -> AppResult<()> {
        self.repository.save(&config).await?;
        *self.cache.write().await = Some(config);
        Ok(())
    }
}
