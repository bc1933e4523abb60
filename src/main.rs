use portfolio_backend::{
    api::{build_router, AppState},
    config::{Config, ObservabilityConfig},
    content::ContentServices,
    metrics,
    search::{SearchIndexSynchronizer, SearchIndexes, SearchService, SyncScheduler},
    state::create_store,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            eprintln!("Using default configuration");
            Config::defaults()?
        }
    };

    init_tracing(&config.observability);

    tracing::info!("Starting Portfolio Backend v{}", env!("CARGO_PKG_VERSION"));

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("✅ Prometheus metrics initialized");
        }
    } else {
        tracing::info!("⚠️  Prometheus metrics disabled in configuration");
    }

    // Initialize storage backend
    tracing::info!("Storage backend: {:?}", config.store.backend);
    let store = create_store(&config.store)?;
    tracing::info!("✅ Storage backend initialized");

    // Open search indexes
    let indexes = SearchIndexes::open(&config.search)?;
    let synchronizer = SearchIndexSynchronizer::new(indexes.clone(), store.clone());
    let search = SearchService::new(indexes, config.search.clone());
    tracing::info!("✅ Search indexes opened");

    if config.search.sync_on_startup {
        tracing::info!("Running startup search sync");
        synchronizer.run_full_sync().await;
    }

    let mut scheduler = if config.search.scheduled_sync_enabled {
        let mut scheduler = SyncScheduler::new(synchronizer.clone(), &config.search.sync_cron).await?;
        scheduler.start().await?;
        tracing::info!("✅ Search sync scheduled ({})", scheduler.cron());
        Some(scheduler)
    } else {
        tracing::info!("⚠️  Scheduled search sync disabled in configuration");
        None
    };

    let content = ContentServices::new(store, Some(synchronizer.clone()), config.media.clone());

    if !config.auth.enabled {
        tracing::warn!("⚠️  Admin authentication is DISABLED");
    }

    // Create application state for HTTP API
    let app_state = AppState::new(
        content,
        search,
        synchronizer,
        config.auth.clone(),
        config.server.clone(),
    )
    .with_metrics(config.observability.prometheus_enabled);

    let app = build_router(app_state);

    // Start HTTP server
    let http_addr = format!("{}:{}", config.server.host, config.server.port);
    let http_listener = tokio::net::TcpListener::bind(&http_addr).await?;

    tracing::info!("🚀 HTTP API server listening on http://{}", http_addr);
    tracing::info!("   Health check: http://{}/health", http_addr);
    tracing::info!("   Public API: http://{}/api", http_addr);
    tracing::info!("   Admin API: http://{}/api/admin", http_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(http_listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down gracefully...");
    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!("Failed to stop search sync scheduler: {}", e);
        }
    }
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("portfolio_backend={},tower_http=info", config.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
