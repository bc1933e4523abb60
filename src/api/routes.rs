use crate::api::{admin, auth, handlers, AppState};
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.server.cors_allowed_origins);
    let timeout = Duration::from_secs(state.server.request_timeout_secs);

    Router::new()
        // Health & metrics
        .route("/health", get(handlers::health_check))
        .route("/health/live", get(handlers::health_check))
        .route("/health/ready", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        // Blogs
        .route("/api/blogs", get(handlers::list_blogs))
        .route("/api/blogs/latest", get(handlers::latest_blogs))
        .route("/api/blogs/:id", get(handlers::get_blog))
        // Jobs
        .route("/api/jobs", get(handlers::list_jobs))
        .route("/api/jobs/:id", get(handlers::get_job))
        // Skills
        .route("/api/skills", get(handlers::list_skills))
        .route("/api/skills/:id", get(handlers::get_skill_group))
        // Profile & tour
        .route("/api/profile", get(handlers::get_profile))
        .route("/api/resume", get(handlers::get_resume))
        .route("/api/tour/steps", get(handlers::list_tour_steps))
        // Search
        .route("/api/search", get(handlers::site_search))
        .route("/api/search/blogs", get(handlers::blog_search))
        .nest("/api/admin", admin_router(state.clone()))
        // Add state
        .with_state(state)
        // Add middleware
        .layer(TimeoutLayer::new(timeout))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(cors)
}

fn admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Blogs
        .route("/blogs", get(admin::list_blogs).post(admin::create_blog))
        .route(
            "/blogs/:id",
            get(admin::get_blog)
                .put(admin::update_blog)
                .delete(admin::delete_blog),
        )
        // Jobs
        .route("/jobs", get(admin::list_jobs).post(admin::create_job))
        .route(
            "/jobs/:id",
            get(admin::get_job)
                .put(admin::update_job)
                .delete(admin::delete_job),
        )
        // Skills
        .route("/skills", get(admin::list_skills).post(admin::create_skill))
        .route("/skills/reorder", patch(admin::reorder_skills))
        .route(
            "/skills/:id",
            get(admin::get_skill)
                .put(admin::update_skill)
                .delete(admin::delete_skill),
        )
        // Skill groups
        .route(
            "/skill-groups",
            get(admin::list_skill_groups).post(admin::create_skill_group),
        )
        .route("/skill-groups/reorder", patch(admin::reorder_skill_groups))
        .route(
            "/skill-groups/:id",
            get(admin::get_skill_group)
                .put(admin::update_skill_group)
                .delete(admin::delete_skill_group),
        )
        // Tags
        .route("/tags", get(admin::list_tags).post(admin::create_tag))
        .route("/tags/bulk", post(admin::create_tags_bulk))
        .route(
            "/tags/:id",
            get(admin::get_tag)
                .put(admin::update_tag)
                .delete(admin::delete_tag),
        )
        // Tour steps
        .route(
            "/tour-steps",
            get(admin::list_tour_steps).post(admin::create_tour_step),
        )
        .route("/tour-steps/reorder", patch(admin::reorder_tour_steps))
        .route(
            "/tour-steps/:id",
            get(admin::get_tour_step)
                .put(admin::update_tour_step)
                .delete(admin::delete_tour_step),
        )
        // Social media
        .route(
            "/social-media",
            get(admin::list_social_media).post(admin::create_social_media),
        )
        .route(
            "/social-media/:id",
            get(admin::get_social_media)
                .put(admin::update_social_media)
                .delete(admin::delete_social_media),
        )
        // Profile
        .route("/profile", get(admin::get_profile).put(admin::put_profile))
        // Media
        .route("/media", get(admin::list_media).post(admin::register_media))
        .route(
            "/media/:id",
            get(admin::get_media).delete(admin::delete_media),
        )
        // Search
        .route("/search/sync", post(admin::sync_search))
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
