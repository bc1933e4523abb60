//! Public, read-only endpoints

use crate::api::extract::ApiQuery;
use crate::api::AppState;
use crate::content::{BlogView, JobView, ProfileView, ResumeData, SkillGroupDetail};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::models::{SkillGroup, TourStep};
use crate::search::{BlogSearchHit, IndexStats, SiteSearchResults};
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let indexes = state.search.stats().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to read search index stats");
        Vec::new()
    });

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        indexes,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub indexes: Vec<IndexStats>,
}

/// Prometheus text exposition
pub async fn metrics_handler(State(state): State<AppState>) -> Result<impl IntoResponse> {
    if !state.metrics_enabled {
        return Err(AppError::NotFound("Metrics are disabled".to_string()));
    }
    let body = metrics::gather().map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

pub async fn list_blogs(State(state): State<AppState>) -> Result<Json<Vec<BlogView>>> {
    Ok(Json(state.content.blogs.list_published().await?))
}

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub limit: Option<usize>,
}

pub async fn latest_blogs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<LatestQuery>,
) -> Result<Json<Vec<BlogView>>> {
    Ok(Json(state.content.blogs.latest(query.limit).await?))
}

pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlogView>> {
    Ok(Json(state.content.blogs.get_published(&id).await?))
}

pub async fn list_jobs(State(state): State<AppState>) -> Result<Json<Vec<JobView>>> {
    Ok(Json(state.content.jobs.list().await?))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobView>> {
    Ok(Json(state.content.jobs.get(&id).await?))
}

/// Skill groups in display order
pub async fn list_skills(State(state): State<AppState>) -> Result<Json<Vec<SkillGroup>>> {
    Ok(Json(state.content.skills.list_groups().await?))
}

pub async fn get_skill_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SkillGroupDetail>> {
    Ok(Json(state.content.skills.group_detail(&id).await?))
}

pub async fn get_profile(State(state): State<AppState>) -> Result<Json<ProfileView>> {
    Ok(Json(state.content.profile.public_view().await?))
}

/// Data for rendering the resume
pub async fn get_resume(State(state): State<AppState>) -> Result<Json<ResumeData>> {
    Ok(Json(state.content.resume.data().await?))
}

pub async fn list_tour_steps(State(state): State<AppState>) -> Result<Json<Vec<TourStep>>> {
    Ok(Json(state.content.tour.list().await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Site-wide search grouped by kind
pub async fn site_search(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Json<SiteSearchResults> {
    Json(state.search.site_search(&params.q))
}

pub async fn blog_search(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Json<Vec<BlogSearchHit>> {
    Json(state.search.blog_search(&params.q))
}
