//! The site owner's profile and social media links

use crate::content::validation::{field_errors, finish, is_email, non_blank, require};
use crate::error::{AppError, FieldError, Result};
use crate::metrics::record_mutation;
use crate::models::{Collection, Profile, SocialMediaLink, PROFILE_ID};
use crate::state::{DocumentStore, Repository};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Public profile with its social media links
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub social_media: Vec<SocialMediaLink>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub primary_email: Option<String>,
    pub secondary_email: Option<String>,
    pub profile_image_url: Option<String>,
    pub sidebar_image_url: Option<String>,
    pub background_image_url: Option<String>,
    pub mobile_background_image_url: Option<String>,
    pub cv_url: Option<String>,
}

impl ProfileRequest {
    fn check(&self) -> Result<()> {
        let mut errors = field_errors(self, "");
        require(&mut errors, "name", &self.name);
        require(&mut errors, "title", &self.title);
        for (field, value) in [
            ("primaryEmail", &self.primary_email),
            ("secondaryEmail", &self.secondary_email),
        ] {
            if let Some(email) = value.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
                if !is_email(email) {
                    errors.push(FieldError::new(field, "must be a valid email address"));
                }
            }
        }
        finish(errors)
    }

    fn apply(self, profile: &mut Profile) {
        profile.name = self.name.trim().to_string();
        profile.title = self.title.trim().to_string();
        profile.headline = non_blank(self.headline);
        profile.description = non_blank(self.description);
        profile.location = non_blank(self.location);
        profile.phone_number = non_blank(self.phone_number);
        profile.primary_email = non_blank(self.primary_email);
        profile.secondary_email = non_blank(self.secondary_email);
        profile.profile_image_url = non_blank(self.profile_image_url);
        profile.sidebar_image_url = non_blank(self.sidebar_image_url);
        profile.background_image_url = non_blank(self.background_image_url);
        profile.mobile_background_image_url = non_blank(self.mobile_background_image_url);
        profile.cv_url = non_blank(self.cv_url);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialMediaRequest {
    #[serde(rename = "type", default)]
    pub link_type: String,
    #[serde(default)]
    pub link: String,
    pub name: Option<String>,
    #[serde(default)]
    pub include_on_resume: bool,
}

impl SocialMediaRequest {
    fn check(&self) -> Result<()> {
        let mut errors = Vec::new();
        require(&mut errors, "type", &self.link_type);
        require(&mut errors, "link", &self.link);
        finish(errors)
    }

    fn apply(self, link: &mut SocialMediaLink) {
        link.link_type = self.link_type.trim().to_string();
        link.link = self.link.trim().to_string();
        link.name = non_blank(self.name);
        link.include_on_resume = self.include_on_resume;
    }
}

pub struct ProfileService {
    profiles: Repository<Profile>,
    links: Repository<SocialMediaLink>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            profiles: Repository::new(store.clone()),
            links: Repository::new(store),
        }
    }

    pub async fn get(&self) -> Result<Profile> {
        self.profiles
            .find_by_id(PROFILE_ID)
            .await?
            .ok_or_else(|| AppError::NotFound("Profile has not been set up".to_string()))
    }

    /// Profile with links sorted by type, ignoring case
    pub async fn public_view(&self) -> Result<ProfileView> {
        Ok(ProfileView {
            profile: self.get().await?,
            social_media: self.list_links().await?,
        })
    }

    /// Create or replace the singleton profile
    pub async fn put(&self, request: ProfileRequest, actor: &str) -> Result<Profile> {
        request.check()?;

        let now = Utc::now();
        let mut profile = match self.profiles.find_by_id(PROFILE_ID).await? {
            Some(profile) => profile,
            None => Profile {
                id: PROFILE_ID.to_string(),
                name: String::new(),
                title: String::new(),
                headline: None,
                description: None,
                location: None,
                phone_number: None,
                primary_email: None,
                secondary_email: None,
                profile_image_url: None,
                sidebar_image_url: None,
                background_image_url: None,
                mobile_background_image_url: None,
                cv_url: None,
                created_at: now,
                updated_at: now,
            },
        };
        request.apply(&mut profile);
        profile.updated_at = now;
        let profile = self.profiles.save(profile).await?;

        record_mutation(Collection::Profiles.as_ref(), "put");
        tracing::info!(subject = %actor, "Profile updated");
        Ok(profile)
    }

    pub async fn list_links(&self) -> Result<Vec<SocialMediaLink>> {
        let mut links = self.links.find_all().await?;
        links.sort_by(|a, b| {
            a.link_type
                .to_lowercase()
                .cmp(&b.link_type.to_lowercase())
                .then_with(|| a.link.cmp(&b.link))
        });
        Ok(links)
    }

    pub async fn get_link(&self, id: &str) -> Result<SocialMediaLink> {
        self.links.get(id).await
    }

    pub async fn create_link(&self, request: SocialMediaRequest, actor: &str) -> Result<SocialMediaLink> {
        request.check()?;
        let mut link = SocialMediaLink::new("", "");
        request.apply(&mut link);
        let link = self.links.save(link).await?;

        record_mutation(Collection::SocialMediaLinks.as_ref(), "create");
        tracing::info!(link_id = %link.id, subject = %actor, "Social media link created");
        Ok(link)
    }

    pub async fn update_link(
        &self,
        id: &str,
        request: SocialMediaRequest,
        actor: &str,
    ) -> Result<SocialMediaLink> {
        request.check()?;
        let mut link = self.links.get(id).await?;
        request.apply(&mut link);
        link.updated_at = Utc::now();
        let link = self.links.save(link).await?;

        record_mutation(Collection::SocialMediaLinks.as_ref(), "update");
        tracing::info!(link_id = %link.id, subject = %actor, "Social media link updated");
        Ok(link)
    }

    pub async fn delete_link(&self, id: &str, actor: &str) -> Result<()> {
        if !self.links.delete(id).await? {
            return Err(AppError::NotFound(format!("Social media link not found: {}", id)));
        }
        record_mutation(Collection::SocialMediaLinks.as_ref(), "delete");
        tracing::info!(link_id = %id, subject = %actor, "Social media link deleted");
        Ok(())
    }
}
