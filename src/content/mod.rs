//! Content services behind the HTTP API.
//!
//! Each service validates requests, writes through a typed [`Repository`]
//! and, for searchable content, refreshes the search indexes after the store
//! write succeeds. Mutations take the authenticated subject for logging.
//!
//! [`Repository`]: crate::state::Repository

pub mod blogs;
pub mod jobs;
pub mod media;
pub mod profile;
pub mod resume;
pub mod skills;
pub mod tags;
pub mod tour;
pub mod validation;

pub use blogs::{BlogFilter, BlogRequest, BlogService, BlogView, NamedRef};
pub use jobs::{JobFilter, JobRequest, JobService, JobView};
pub use media::{MediaAssetRequest, MediaQuery, MediaService};
pub use profile::{ProfileRequest, ProfileService, ProfileView, SocialMediaRequest};
pub use resume::{ResumeData, ResumeService};
pub use skills::{SkillGroupDetail, SkillGroupRequest, SkillRequest, SkillService};
pub use tags::{BulkTagRequest, TagRequest, TagService};
pub use tour::{TourService, TourStepRequest};
pub use validation::{ReorderItem, ReorderRequest};

use crate::config::MediaConfig;
use crate::search::SearchIndexSynchronizer;
use crate::state::DocumentStore;
use std::sync::Arc;

/// All content services over one store
#[derive(Clone)]
pub struct ContentServices {
    pub blogs: Arc<BlogService>,
    pub jobs: Arc<JobService>,
    pub skills: Arc<SkillService>,
    pub tags: Arc<TagService>,
    pub tour: Arc<TourService>,
    pub profile: Arc<ProfileService>,
    pub resume: Arc<ResumeService>,
    pub media: Arc<MediaService>,
}

impl ContentServices {
    /// Build every service. With `search`, blog, job and skill group writes
    /// update the indexes.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        search: Option<SearchIndexSynchronizer>,
        media: MediaConfig,
    ) -> Self {
        let mut blogs = BlogService::new(store.clone());
        let mut jobs = JobService::new(store.clone());
        let mut skills = SkillService::new(store.clone());
        if let Some(search) = search {
            blogs = blogs.with_search(search.clone());
            jobs = jobs.with_search(search.clone());
            skills = skills.with_search(search);
        }

        let skills = Arc::new(skills);
        let profile = Arc::new(ProfileService::new(store.clone()));
        let resume = ResumeService::new(store.clone(), profile.clone(), skills.clone());

        Self {
            blogs: Arc::new(blogs),
            jobs: Arc::new(jobs),
            skills,
            tags: Arc::new(TagService::new(store.clone())),
            tour: Arc::new(TourService::new(store.clone())),
            profile,
            resume: Arc::new(resume),
            media: Arc::new(MediaService::new(store, media)),
        }
    }
}
