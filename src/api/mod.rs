pub mod admin;
pub mod auth;
pub mod extract;
pub mod handlers;
pub mod routes;

pub use auth::{AdminPrincipal, JwtVerifier};
pub use routes::*;

use crate::config::{AuthConfig, ServerConfig};
use crate::content::ContentServices;
use crate::search::{SearchIndexSynchronizer, SearchService};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub content: ContentServices,
    pub search: SearchService,
    pub synchronizer: SearchIndexSynchronizer,
    pub auth: Arc<JwtVerifier>,
    pub server: ServerConfig,
    pub started_at: Instant,
    pub metrics_enabled: bool,
}

impl AppState {
    pub fn new(
        content: ContentServices,
        search: SearchService,
        synchronizer: SearchIndexSynchronizer,
        auth: AuthConfig,
        server: ServerConfig,
    ) -> Self {
        Self {
            content,
            search,
            synchronizer,
            auth: Arc::new(JwtVerifier::new(auth)),
            server,
            started_at: Instant::now(),
            metrics_enabled: true,
        }
    }

    /// Enable or disable the `/metrics` endpoint
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.metrics_enabled = enabled;
        self
    }
}
