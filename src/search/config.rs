//! Search configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Directory holding the indexes; `None` keeps them in memory
    pub index_path: Option<PathBuf>,

    /// Index writer heap size in bytes (default: 50MB)
    pub writer_heap_size: usize,

    /// Maximum hits per group in a site search
    pub max_results_per_group: usize,

    /// Maximum hits in a blog search
    pub max_blog_results: usize,

    /// Queries are truncated to this many characters
    pub max_query_length: usize,

    /// Shorter queries return no results
    pub min_query_length: usize,

    /// Run a full sync when the server starts
    pub sync_on_startup: bool,

    /// Run a full sync on `sync_cron`
    pub scheduled_sync_enabled: bool,

    /// Six-field cron expression (seconds first)
    pub sync_cron: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            index_path: None,
            writer_heap_size: 50_000_000, // 50MB
            max_results_per_group: 5,
            max_blog_results: 20,
            max_query_length: 200,
            min_query_length: 2,
            sync_on_startup: true,
            scheduled_sync_enabled: true,
            sync_cron: "0 0 */4 * * *".to_string(),
        }
    }
}
