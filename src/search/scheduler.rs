//! Cron-driven full resync of the search indexes

use crate::search::error::{SearchError, SearchResult};
use crate::search::sync::SearchIndexSynchronizer;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};

/// Periodically runs [`SearchIndexSynchronizer::run_full_sync`]
pub struct SyncScheduler {
    /// Underlying tokio-cron-scheduler instance
    scheduler: JobScheduler,

    cron: String,
    running: bool,
}

impl SyncScheduler {
    /// Create a scheduler with one full-sync job on `cron` (six fields,
    /// seconds first).
    pub async fn new(synchronizer: SearchIndexSynchronizer, cron: &str) -> SearchResult<Self> {
        info!(cron, "Initializing search sync scheduler");

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SearchError::InvalidConfiguration(format!("Scheduler init failed: {}", e)))?;

        let job = Job::new_async(cron, move |job_id, _scheduler| {
            let synchronizer = synchronizer.clone();
            Box::pin(async move {
                debug!(job_id = %job_id, "Executing scheduled search sync");
                synchronizer.run_full_sync().await;
            })
        })
        .map_err(|e| {
            SearchError::InvalidConfiguration(format!("Invalid sync cron '{}': {}", cron, e))
        })?;

        scheduler
            .add(job)
            .await
            .map_err(|e| SearchError::InvalidConfiguration(format!("Failed to add sync job: {}", e)))?;

        Ok(Self {
            scheduler,
            cron: cron.to_string(),
            running: false,
        })
    }

    pub fn cron(&self) -> &str {
        &self.cron
    }

    /// Start the scheduler
    pub async fn start(&mut self) -> SearchResult<()> {
        if self.running {
            warn!("Search sync scheduler is already running");
            return Ok(());
        }

        self.scheduler
            .start()
            .await
            .map_err(|e| SearchError::InvalidConfiguration(format!("Scheduler start failed: {}", e)))?;
        self.running = true;

        info!(cron = %self.cron, "Search sync scheduler started");
        Ok(())
    }

    /// Stop the scheduler
    pub async fn shutdown(&mut self) -> SearchResult<()> {
        if !self.running {
            return Ok(());
        }

        self.scheduler
            .shutdown()
            .await
            .map_err(|e| SearchError::InvalidConfiguration(format!("Scheduler shutdown failed: {}", e)))?;
        self.running = false;

        info!("Search sync scheduler shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{SearchConfig, SearchIndexes};
    use crate::state::create_in_memory_store;

    fn synchronizer() -> SearchIndexSynchronizer {
        let indexes = SearchIndexes::open(&SearchConfig::default()).unwrap();
        SearchIndexSynchronizer::new(indexes, create_in_memory_store())
    }

    #[tokio::test]
    async fn test_rejects_invalid_cron() {
        let result = SyncScheduler::new(synchronizer(), "every four hours").await;
        assert!(matches!(result, Err(SearchError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let mut scheduler = SyncScheduler::new(synchronizer(), "0 0 */4 * * *")
            .await
            .unwrap();
        assert_eq!(scheduler.cron(), "0 0 */4 * * *");

        scheduler.start().await.unwrap();
        scheduler.shutdown().await.unwrap();
    }
}
