//! Request validation and batch reordering shared by the content services

use crate::error::{AppError, FieldError, Result};
use crate::models::{Document, Ordered};
use crate::state::Repository;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use validator::Validate;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// `short_description` -> `shortDescription`
pub fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Field errors reported by the `validator` derive, with camelCase field
/// names prefixed by `prefix` (e.g. `skills[0].`)
pub fn field_errors<T: Validate>(request: &T, prefix: &str) -> Vec<FieldError> {
    match request.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => match AppError::from(errors) {
            AppError::InvalidFields(fields) => fields
                .into_iter()
                .map(|f| FieldError::new(format!("{}{}", prefix, camel_case(&f.field)), f.message))
                .collect(),
            _ => Vec::new(),
        },
    }
}

/// Fail with every collected field error, if any
pub fn finish(mut errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    errors.sort_by(|a, b| a.field.cmp(&b.field).then(a.message.cmp(&b.message)));
    errors.dedup();
    Err(AppError::InvalidFields(errors))
}

pub fn validate<T: Validate>(request: &T) -> Result<()> {
    finish(field_errors(request, ""))
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Push a "must not be blank" error when `value` is blank
pub fn require(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if is_blank(value) {
        errors.push(FieldError::new(field, "must not be blank"));
    }
}

pub fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

/// Trimmed value, or `None` when blank
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// One explicit position assignment
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ReorderItem {
    pub id: String,
    pub order: i32,
}

/// Body of a reorder request: explicit `{id, order}` pairs, or ids in their
/// new display order
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ReorderRequest {
    Items(Vec<ReorderItem>),
    #[serde(rename_all = "camelCase")]
    OrderedIds { ordered_ids: Vec<String> },
}

impl ReorderRequest {
    /// Position assignments; ordered ids are numbered from zero
    pub fn assignments(&self) -> Vec<ReorderItem> {
        match self {
            ReorderRequest::Items(items) => items.clone(),
            ReorderRequest::OrderedIds { ordered_ids } => ordered_ids
                .iter()
                .enumerate()
                .map(|(order, id)| ReorderItem {
                    id: id.clone(),
                    order: order as i32,
                })
                .collect(),
        }
    }
}

/// Apply a reorder to `repository` in a single batch write. Every id must
/// exist; uniqueness is left to the store.
pub async fn apply_reorder<T: Document + Ordered>(
    repository: &Repository<T>,
    request: &ReorderRequest,
) -> Result<Vec<T>> {
    let assignments = request.assignments();

    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for (i, item) in assignments.iter().enumerate() {
        if !seen.insert(item.id.as_str()) {
            errors.push(FieldError::new(format!("[{}].id", i), "duplicate id"));
        }
        if item.order < 0 {
            errors.push(FieldError::new(format!("[{}].order", i), "must be at least 0"));
        }
    }
    finish(errors)?;

    let mut updated = Vec::with_capacity(assignments.len());
    for item in &assignments {
        let mut entity = repository.get(&item.id).await?;
        entity.set_order(item.order);
        updated.push(entity);
    }

    repository.save_all(updated).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Skill;
    use crate::state::create_in_memory_store;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, max = 3, message = "too long"))]
        short_description: String,
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("short_description"), "shortDescription");
        assert_eq!(camel_case("title"), "title");
        assert_eq!(camel_case("primaryEmail"), "primaryEmail");
    }

    #[test]
    fn test_field_errors_are_prefixed_and_camel_cased() {
        let errors = field_errors(
            &Sample {
                short_description: "toolong".to_string(),
            },
            "skills[1].",
        );
        assert_eq!(
            errors,
            vec![FieldError::new("skills[1].shortDescription", "too long")]
        );
    }

    #[test]
    fn test_email() {
        assert!(is_email("me@example.com"));
        assert!(!is_email("me@example"));
        assert!(!is_email("not an email"));
    }

    #[test]
    fn test_reorder_request_shapes() {
        let pairs: ReorderRequest =
            serde_json::from_str(r#"[{"id":"a","order":1},{"id":"b","order":0}]"#).unwrap();
        assert_eq!(pairs.assignments()[1].order, 0);

        let ids: ReorderRequest = serde_json::from_str(r#"{"orderedIds":["b","a"]}"#).unwrap();
        assert_eq!(
            ids.assignments(),
            vec![
                ReorderItem { id: "b".to_string(), order: 0 },
                ReorderItem { id: "a".to_string(), order: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_apply_reorder_swaps_unique_positions() {
        let repository = Repository::<Skill>::new(create_in_memory_store());
        let a = repository.save(Skill::new("A", None, 1)).await.unwrap();
        let b = repository.save(Skill::new("B", None, 0)).await.unwrap();

        let request = ReorderRequest::OrderedIds {
            ordered_ids: vec![a.id.clone(), b.id.clone()],
        };
        apply_reorder(&repository, &request).await.unwrap();

        assert_eq!(repository.get(&a.id).await.unwrap().order, 0);
        assert_eq!(repository.get(&b.id).await.unwrap().order, 1);
    }

    #[tokio::test]
    async fn test_apply_reorder_unknown_id() {
        let repository = Repository::<Skill>::new(create_in_memory_store());
        let request = ReorderRequest::Items(vec![ReorderItem {
            id: "missing".to_string(),
            order: 0,
        }]);
        let err = apply_reorder(&repository, &request).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
