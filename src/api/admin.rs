//! Admin endpoints. Every handler runs behind [`require_admin`], which
//! provides the caller's [`AdminPrincipal`].
//!
//! [`require_admin`]: crate::api::auth::require_admin

use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::{AdminPrincipal, AppState};
use crate::content::{
    BlogFilter, BlogRequest, BlogView, BulkTagRequest, JobFilter, JobRequest, JobView,
    MediaAssetRequest, MediaQuery, ProfileRequest, ReorderRequest, SkillGroupRequest,
    SkillRequest, SocialMediaRequest, TagRequest, TourStepRequest,
};
use crate::error::{AppError, Result};
use crate::models::{
    MediaAsset, Page, PageRequest, Profile, Skill, SkillGroup, SocialMediaLink, Tag, TourStep,
};
use crate::search::{EntityKind, SyncReport};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

/// Paging plus the optional list filters accepted by the admin list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub published: Option<bool>,
    pub education: Option<bool>,
}

impl ListQuery {
    fn page_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.size.unwrap_or(defaults.size),
        )
    }
}

// Blogs

pub async fn list_blogs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Page<BlogView>>> {
    Ok(Json(
        state
            .content
            .blogs
            .admin_list(
                query.page_request(),
                BlogFilter {
                    published: query.published,
                },
            )
            .await?,
    ))
}

pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BlogView>> {
    Ok(Json(state.content.blogs.admin_get(&id).await?))
}

pub async fn create_blog(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<BlogRequest>,
) -> Result<(StatusCode, Json<BlogView>)> {
    let blog = state.content.blogs.create(request, &principal.subject).await?;
    Ok((StatusCode::CREATED, Json(blog)))
}

pub async fn update_blog(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<BlogRequest>,
) -> Result<Json<BlogView>> {
    Ok(Json(
        state
            .content
            .blogs
            .update(&id, request, &principal.subject)
            .await?,
    ))
}

pub async fn delete_blog(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.content.blogs.delete(&id, &principal.subject).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Jobs

pub async fn list_jobs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Page<JobView>>> {
    Ok(Json(
        state
            .content
            .jobs
            .admin_list(
                query.page_request(),
                JobFilter {
                    education: query.education,
                },
            )
            .await?,
    ))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobView>> {
    Ok(Json(state.content.jobs.get(&id).await?))
}

pub async fn create_job(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<JobRequest>,
) -> Result<(StatusCode, Json<JobView>)> {
    let job = state.content.jobs.create(request, &principal.subject).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn update_job(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<JobRequest>,
) -> Result<Json<JobView>> {
    Ok(Json(
        state
            .content
            .jobs
            .update(&id, request, &principal.subject)
            .await?,
    ))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.content.jobs.delete(&id, &principal.subject).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Skills

pub async fn list_skills(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Page<Skill>>> {
    Ok(Json(state.content.skills.list_skills(query.page_request()).await?))
}

pub async fn get_skill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Skill>> {
    Ok(Json(state.content.skills.get_skill(&id).await?))
}

pub async fn create_skill(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<SkillRequest>,
) -> Result<(StatusCode, Json<Skill>)> {
    let skill = state
        .content
        .skills
        .create_skill(request, &principal.subject)
        .await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

pub async fn update_skill(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SkillRequest>,
) -> Result<Json<Skill>> {
    Ok(Json(
        state
            .content
            .skills
            .update_skill(&id, request, &principal.subject)
            .await?,
    ))
}

pub async fn delete_skill(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .content
        .skills
        .delete_skill(&id, &principal.subject)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_skills(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> Result<Json<Vec<Skill>>> {
    Ok(Json(
        state
            .content
            .skills
            .reorder_skills(&request, &principal.subject)
            .await?,
    ))
}

// Skill groups

pub async fn list_skill_groups(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Page<SkillGroup>>> {
    Ok(Json(state.content.skills.admin_list_groups(query.page_request()).await?))
}

pub async fn get_skill_group(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SkillGroup>> {
    Ok(Json(state.content.skills.get_group(&id).await?))
}

pub async fn create_skill_group(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<SkillGroupRequest>,
) -> Result<(StatusCode, Json<SkillGroup>)> {
    let group = state
        .content
        .skills
        .create_group(request, &principal.subject)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

pub async fn update_skill_group(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SkillGroupRequest>,
) -> Result<Json<SkillGroup>> {
    Ok(Json(
        state
            .content
            .skills
            .update_group(&id, request, &principal.subject)
            .await?,
    ))
}

pub async fn delete_skill_group(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .content
        .skills
        .delete_group(&id, &principal.subject)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_skill_groups(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> Result<Json<Vec<SkillGroup>>> {
    Ok(Json(
        state
            .content
            .skills
            .reorder_groups(&request, &principal.subject)
            .await?,
    ))
}

// Tags

pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>> {
    Ok(Json(state.content.tags.list().await?))
}

pub async fn get_tag(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Tag>> {
    Ok(Json(state.content.tags.get(&id).await?))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<TagRequest>,
) -> Result<(StatusCode, Json<Tag>)> {
    let tag = state.content.tags.create(request, &principal.subject).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn create_tags_bulk(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<BulkTagRequest>,
) -> Result<(StatusCode, Json<Vec<Tag>>)> {
    let tags = state
        .content
        .tags
        .create_bulk(request, &principal.subject)
        .await?;
    Ok((StatusCode::CREATED, Json(tags)))
}

pub async fn update_tag(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<TagRequest>,
) -> Result<Json<Tag>> {
    Ok(Json(
        state
            .content
            .tags
            .update(&id, request, &principal.subject)
            .await?,
    ))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.content.tags.delete(&id, &principal.subject).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Tour steps

pub async fn list_tour_steps(State(state): State<AppState>) -> Result<Json<Vec<TourStep>>> {
    Ok(Json(state.content.tour.list().await?))
}

pub async fn get_tour_step(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TourStep>> {
    Ok(Json(state.content.tour.get(&id).await?))
}

pub async fn create_tour_step(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<TourStepRequest>,
) -> Result<(StatusCode, Json<TourStep>)> {
    let step = state.content.tour.create(request, &principal.subject).await?;
    Ok((StatusCode::CREATED, Json(step)))
}

pub async fn update_tour_step(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<TourStepRequest>,
) -> Result<Json<TourStep>> {
    Ok(Json(
        state
            .content
            .tour
            .update(&id, request, &principal.subject)
            .await?,
    ))
}

pub async fn delete_tour_step(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.content.tour.delete(&id, &principal.subject).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_tour_steps(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<ReorderRequest>,
) -> Result<Json<Vec<TourStep>>> {
    Ok(Json(
        state
            .content
            .tour
            .reorder(&request, &principal.subject)
            .await?,
    ))
}

// Social media links

pub async fn list_social_media(
    State(state): State<AppState>,
) -> Result<Json<Vec<SocialMediaLink>>> {
    Ok(Json(state.content.profile.list_links().await?))
}

pub async fn get_social_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SocialMediaLink>> {
    Ok(Json(state.content.profile.get_link(&id).await?))
}

pub async fn create_social_media(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<SocialMediaRequest>,
) -> Result<(StatusCode, Json<SocialMediaLink>)> {
    let link = state
        .content
        .profile
        .create_link(request, &principal.subject)
        .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn update_social_media(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SocialMediaRequest>,
) -> Result<Json<SocialMediaLink>> {
    Ok(Json(
        state
            .content
            .profile
            .update_link(&id, request, &principal.subject)
            .await?,
    ))
}

pub async fn delete_social_media(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .content
        .profile
        .delete_link(&id, &principal.subject)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// Profile

pub async fn get_profile(State(state): State<AppState>) -> Result<Json<Profile>> {
    Ok(Json(state.content.profile.get().await?))
}

pub async fn put_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<ProfileRequest>,
) -> Result<Json<Profile>> {
    Ok(Json(
        state
            .content
            .profile
            .put(request, &principal.subject)
            .await?,
    ))
}

// Media

pub async fn list_media(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<MediaQuery>,
) -> Result<Json<Page<MediaAsset>>> {
    Ok(Json(state.content.media.list(&query).await?))
}

pub async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MediaAsset>> {
    Ok(Json(state.content.media.get(&id).await?))
}

pub async fn register_media(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiJson(request): ApiJson<MediaAssetRequest>,
) -> Result<(StatusCode, Json<MediaAsset>)> {
    let asset = state
        .content
        .media
        .register(request, &principal.subject)
        .await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

pub async fn delete_media(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.content.media.delete(&id, &principal.subject).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Search

#[derive(Debug, Deserialize)]
pub struct SyncParams {
    pub kind: Option<String>,
}

/// Full resync of one kind, or of every kind when `kind` is absent
pub async fn sync_search(
    State(state): State<AppState>,
    Extension(principal): Extension<AdminPrincipal>,
    ApiQuery(params): ApiQuery<SyncParams>,
) -> Result<Json<Vec<SyncReport>>> {
    tracing::info!(kind = ?params.kind, subject = %principal.subject, "Search sync requested");

    let reports = match params.kind.as_deref() {
        Some(kind) => {
            let kind: EntityKind = kind.parse().map_err(|_| {
                AppError::invalid_field("kind", "must be one of blog, job, skill")
            })?;
            vec![state.synchronizer.full_sync(kind).await?]
        }
        None => state.synchronizer.full_sync_all().await?,
    };
    Ok(Json(reports))
}
