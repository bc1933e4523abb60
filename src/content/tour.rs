//! Onboarding tour steps

use crate::content::validation::{apply_reorder, field_errors, finish, non_blank, require, ReorderRequest};
use crate::error::{AppError, Result};
use crate::metrics::record_mutation;
use crate::models::{Collection, TooltipPosition, TourStep};
use crate::state::{DocumentStore, Repository};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TourStepRequest {
    #[validate(range(min = 0, message = "must be at least 0"))]
    pub order: i32,
    #[serde(default)]
    pub target_selector: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub title: String,
    pub title_image_url: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub position: TooltipPosition,
}

impl TourStepRequest {
    fn check(&self) -> Result<()> {
        let mut errors = field_errors(self, "");
        require(&mut errors, "title", &self.title);
        require(&mut errors, "targetSelector", &self.target_selector);
        finish(errors)
    }

    fn apply(self, step: &mut TourStep) {
        step.order = self.order;
        step.target_selector = self.target_selector.trim().to_string();
        step.title = self.title.trim().to_string();
        step.title_image_url = non_blank(self.title_image_url);
        step.description = self.description;
        step.position = self.position;
    }
}

pub struct TourService {
    steps: Repository<TourStep>,
}

impl TourService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            steps: Repository::new(store),
        }
    }

    /// Steps in walkthrough order
    pub async fn list(&self) -> Result<Vec<TourStep>> {
        let mut steps = self.steps.find_all().await?;
        steps.sort_by_key(|s| s.order);
        Ok(steps)
    }

    pub async fn get(&self, id: &str) -> Result<TourStep> {
        self.steps.get(id).await
    }

    async fn ensure_order_free(&self, order: i32, except_id: Option<&str>) -> Result<()> {
        let taken = self
            .steps
            .find_all()
            .await?
            .into_iter()
            .any(|s| s.order == order && Some(s.id.as_str()) != except_id);
        if taken {
            return Err(AppError::Conflict(format!(
                "A tour step with order {} already exists",
                order
            )));
        }
        Ok(())
    }

    pub async fn create(&self, request: TourStepRequest, actor: &str) -> Result<TourStep> {
        request.check()?;
        self.ensure_order_free(request.order, None).await?;

        let mut step = TourStep::new(0, "", "");
        request.apply(&mut step);
        // The store's unique index still rejects a concurrent duplicate.
        let step = self.steps.save(step).await?;

        record_mutation(Collection::TourSteps.as_ref(), "create");
        tracing::info!(tour_step_id = %step.id, order = step.order, subject = %actor, "Tour step created");
        Ok(step)
    }

    pub async fn update(&self, id: &str, request: TourStepRequest, actor: &str) -> Result<TourStep> {
        request.check()?;
        let mut step = self.steps.get(id).await?;
        self.ensure_order_free(request.order, Some(id)).await?;

        request.apply(&mut step);
        step.updated_at = Utc::now();
        let step = self.steps.save(step).await?;

        record_mutation(Collection::TourSteps.as_ref(), "update");
        tracing::info!(tour_step_id = %step.id, subject = %actor, "Tour step updated");
        Ok(step)
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<()> {
        if !self.steps.delete(id).await? {
            return Err(AppError::NotFound(format!("Tour step not found: {}", id)));
        }
        record_mutation(Collection::TourSteps.as_ref(), "delete");
        tracing::info!(tour_step_id = %id, subject = %actor, "Tour step deleted");
        Ok(())
    }

    pub async fn reorder(&self, request: &ReorderRequest, actor: &str) -> Result<Vec<TourStep>> {
        let updated = apply_reorder(&self.steps, request).await?;
        record_mutation(Collection::TourSteps.as_ref(), "reorder");
        tracing::info!(count = updated.len(), subject = %actor, "Tour steps reordered");
        self.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_in_memory_store;

    fn step(order: i32, title: &str) -> TourStepRequest {
        TourStepRequest {
            order,
            target_selector: "#nav".to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_order_conflicts() {
        let service = TourService::new(create_in_memory_store());
        service.create(step(1, "Welcome"), "tester").await.unwrap();

        let err = service.create(step(1, "Again"), "tester").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reorder_swaps_positions() {
        let service = TourService::new(create_in_memory_store());
        let first = service.create(step(0, "First"), "tester").await.unwrap();
        let second = service.create(step(1, "Second"), "tester").await.unwrap();

        let steps = service
            .reorder(
                &ReorderRequest::OrderedIds {
                    ordered_ids: vec![second.id.clone(), first.id.clone()],
                },
                "tester",
            )
            .await
            .unwrap();
        assert_eq!(steps[0].id, second.id);
        assert_eq!(steps[1].order, 1);
    }

    #[tokio::test]
    async fn test_validation() {
        let service = TourService::new(create_in_memory_store());
        let mut bad = step(-1, "");
        bad.target_selector = " ".to_string();

        match service.create(bad, "tester").await.unwrap_err() {
            AppError::InvalidFields(fields) => {
                let mut names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                names.dedup();
                assert_eq!(names, vec!["order", "targetSelector", "title"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
