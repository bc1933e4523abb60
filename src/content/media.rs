//! Media asset metadata. The files themselves live outside the store.

use crate::config::MediaConfig;
use crate::content::validation::{finish, non_blank, require};
use crate::error::{AppError, Result};
use crate::metrics::record_mutation;
use crate::models::{Collection, MediaAsset, MediaVariant, Page, PageRequest};
use crate::state::{DocumentStore, Repository};
use chrono::Utc;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_MEDIA_PAGE_SIZE: u32 = 24;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAssetRequest {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub mime_type: String,
    pub file_size: u64,
    /// Generated from the id and MIME type when absent
    pub original_path: Option<String>,
    #[serde(default)]
    pub variants: BTreeMap<String, MediaVariant>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    /// Case-insensitive substring of the file name
    pub search: Option<String>,
    pub mime_type: Option<String>,
}

impl MediaQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_MEDIA_PAGE_SIZE),
        )
    }
}

pub struct MediaService {
    assets: Repository<MediaAsset>,
    config: MediaConfig,
}

impl MediaService {
    pub fn new(store: Arc<dyn DocumentStore>, config: MediaConfig) -> Self {
        Self {
            assets: Repository::new(store),
            config,
        }
    }

    /// Newest first, filtered by file name and MIME type
    pub async fn list(&self, query: &MediaQuery) -> Result<Page<MediaAsset>> {
        let search = non_blank(query.search.clone()).map(|s| s.to_lowercase());
        let mime_type = non_blank(query.mime_type.clone());

        let mut assets: Vec<MediaAsset> = self
            .assets
            .find_all()
            .await?
            .into_iter()
            .filter(|a| {
                search
                    .as_deref()
                    .map_or(true, |s| a.file_name.to_lowercase().contains(s))
            })
            .filter(|a| {
                mime_type
                    .as_deref()
                    .map_or(true, |m| a.mime_type.eq_ignore_ascii_case(m))
            })
            .collect();
        assets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(Page::from_sorted(assets, query.page_request()))
    }

    pub async fn get(&self, id: &str) -> Result<MediaAsset> {
        self.assets.get(id).await
    }

    /// Record an uploaded file's metadata
    pub async fn register(&self, request: MediaAssetRequest, actor: &str) -> Result<MediaAsset> {
        let mut errors = Vec::new();
        require(&mut errors, "fileName", &request.file_name);
        require(&mut errors, "mimeType", &request.mime_type);
        finish(errors)?;

        let mime_type = request.mime_type.trim().to_lowercase();
        if !self.config.allowed_mime_types.iter().any(|m| m == &mime_type) {
            return Err(AppError::invalid_field(
                "mimeType",
                format!("unsupported type {}", mime_type),
            ));
        }
        if request.file_size > self.config.max_file_size {
            return Err(AppError::PayloadTooLarge(format!(
                "File size {} exceeds the limit of {} bytes",
                request.file_size, self.config.max_file_size
            )));
        }

        let id = Uuid::new_v4().to_string();
        let original_path = non_blank(request.original_path).unwrap_or_else(|| {
            let extension = MediaAsset::extension_for(&mime_type).unwrap_or("bin");
            format!("media/{}/original.{}", id, extension)
        });

        let now = Utc::now();
        let asset = MediaAsset {
            id,
            file_name: request.file_name.trim().to_string(),
            mime_type,
            file_size: request.file_size,
            original_path,
            variants: request.variants,
            created_at: now,
            updated_at: now,
            legacy_id: None,
        };
        let asset = self.assets.save(asset).await?;

        record_mutation(Collection::MediaAssets.as_ref(), "create");
        tracing::info!(
            media_id = %asset.id,
            mime_type = %asset.mime_type,
            file_size = asset.file_size,
            subject = %actor,
            "Media asset registered"
        );
        Ok(asset)
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<()> {
        if !self.assets.delete(id).await? {
            return Err(AppError::NotFound(format!("Media asset not found: {}", id)));
        }
        record_mutation(Collection::MediaAssets.as_ref(), "delete");
        tracing::info!(media_id = %id, subject = %actor, "Media asset deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_in_memory_store;

    fn service() -> MediaService {
        MediaService::new(create_in_memory_store(), MediaConfig::default())
    }

    fn upload(name: &str, mime: &str, size: u64) -> MediaAssetRequest {
        MediaAssetRequest {
            file_name: name.to_string(),
            mime_type: mime.to_string(),
            file_size: size,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_register_generates_path() {
        let asset = service()
            .register(upload("cat.png", "image/png", 1024), "tester")
            .await
            .unwrap();
        assert_eq!(asset.original_path, format!("media/{}/original.png", asset.id));
    }

    #[tokio::test]
    async fn test_rejects_disallowed_type_and_large_files() {
        let service = service();
        assert!(matches!(
            service.register(upload("doc.pdf", "application/pdf", 10), "tester").await,
            Err(AppError::InvalidFields(_))
        ));
        assert!(matches!(
            service
                .register(upload("huge.png", "image/png", 10 * 1024 * 1024 + 1), "tester")
                .await,
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let service = service();
        service.register(upload("Cat.png", "image/png", 1), "tester").await.unwrap();
        service.register(upload("dog.jpg", "image/jpeg", 1), "tester").await.unwrap();

        let page = service
            .list(&MediaQuery {
                search: Some("cat".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total_elements, 1);
        assert_eq!(page.size, DEFAULT_MEDIA_PAGE_SIZE);

        let page = service
            .list(&MediaQuery {
                mime_type: Some("image/jpeg".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.content[0].file_name, "dog.jpg");
    }
}
