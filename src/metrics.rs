//! Prometheus metrics for content mutations and search indexing.
//!
//! Metrics are registered once in [`PROMETHEUS_REGISTRY`] by [`init_metrics`]
//! and exposed in text format by [`gather`].

use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Opts, Registry, TextEncoder};

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    /// Full index synchronizations
    ///
    /// Labels: kind, outcome
    pub static ref SEARCH_SYNC_TOTAL: CounterVec = CounterVec::new(
        Opts::new("search_sync_total", "Total number of full search index syncs")
            .namespace("portfolio"),
        &["kind", "outcome"]
    ).expect("Failed to create SEARCH_SYNC_TOTAL metric");

    /// Incremental index writes
    ///
    /// Labels: operation, outcome
    pub static ref SEARCH_INDEX_OPERATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("search_index_operations_total", "Total number of incremental index operations")
            .namespace("portfolio"),
        &["operation", "outcome"]
    ).expect("Failed to create SEARCH_INDEX_OPERATIONS_TOTAL metric");

    /// Admin writes to the document store
    ///
    /// Labels: collection, operation
    pub static ref CONTENT_MUTATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("content_mutations_total", "Total number of content mutations")
            .namespace("portfolio"),
        &["collection", "operation"]
    ).expect("Failed to create CONTENT_MUTATIONS_TOTAL metric");
}

/// Register all metrics with the global registry
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_SYNC_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(SEARCH_INDEX_OPERATIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(CONTENT_MUTATIONS_TOTAL.clone()))?;
    Ok(())
}

/// Render the registry in the Prometheus text format
pub fn gather() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&PROMETHEUS_REGISTRY.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

pub fn record_mutation(collection: &str, operation: &str) {
    CONTENT_MUTATIONS_TOTAL
        .with_label_values(&[collection, operation])
        .inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_render() {
        // Registration may already have happened in another test.
        let _ = init_metrics();
        record_mutation("blogs", "create");

        let text = gather().unwrap();
        assert!(text.contains("portfolio_content_mutations_total"));
    }
}
