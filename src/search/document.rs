//! Search document structures and the shared index schema

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use tantivy::schema::*;
use tantivy::tokenizer::{
    AsciiFoldingFilter, LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer,
};
use tantivy::TantivyDocument;

/// Name of the lowercasing, accent-folding analyzer used by all text fields
pub const FOLDED_TOKENIZER: &str = "folded";

/// The kinds of content that are searchable
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Blog,
    Job,
    Skill,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Blog, EntityKind::Job, EntityKind::Skill];
}

/// A flattened, denormalized view of one entity as stored in an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDocument {
    pub id: String,
    pub kind: EntityKind,
    /// Owning document, e.g. the skill group of a skill
    pub parent_id: Option<String>,
    pub title: String,
    pub short_description: Option<String>,
    /// Concatenated text used for relevance
    pub body: String,
    pub tags: Vec<String>,
    pub skills: Vec<String>,
    pub image_url: Option<String>,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl SearchDocument {
    /// Convert to Tantivy document
    pub fn to_tantivy_doc(&self, schema: &Schema) -> TantivyDocument {
        let mut doc = TantivyDocument::new();

        add_text(&mut doc, schema, "id", &self.id);
        add_text(&mut doc, schema, "kind", self.kind.as_ref());
        if let Some(ref parent_id) = self.parent_id {
            add_text(&mut doc, schema, "parent_id", parent_id);
        }
        add_text(&mut doc, schema, "title", &self.title);
        if let Some(ref short_description) = self.short_description {
            add_text(&mut doc, schema, "short_description", short_description);
        }
        add_text(&mut doc, schema, "body", &self.body);
        for tag in &self.tags {
            add_text(&mut doc, schema, "tags", tag);
        }
        for skill in &self.skills {
            add_text(&mut doc, schema, "skills", skill);
        }
        if let Some(ref image_url) = self.image_url {
            add_text(&mut doc, schema, "image_url", image_url);
        }
        add_text(&mut doc, schema, "url", &self.url);

        if let Some(published_at) = self.published_at {
            if let Ok(field) = schema.get_field("published_at") {
                doc.add_date(
                    field,
                    tantivy::DateTime::from_timestamp_secs(published_at.timestamp()),
                );
            }
        }

        doc
    }

    /// Rebuild from a stored Tantivy document
    pub fn from_tantivy_doc(doc: &TantivyDocument, schema: &Schema) -> Option<Self> {
        let kind = first_text(doc, schema, "kind")?.parse().ok()?;

        Some(Self {
            id: first_text(doc, schema, "id")?,
            kind,
            parent_id: first_text(doc, schema, "parent_id"),
            title: first_text(doc, schema, "title").unwrap_or_default(),
            short_description: first_text(doc, schema, "short_description"),
            body: first_text(doc, schema, "body").unwrap_or_default(),
            tags: all_text(doc, schema, "tags"),
            skills: all_text(doc, schema, "skills"),
            image_url: first_text(doc, schema, "image_url"),
            url: first_text(doc, schema, "url").unwrap_or_default(),
            published_at: schema.get_field("published_at").ok().and_then(|field| {
                doc.get_first(field)
                    .and_then(|v| v.as_datetime())
                    .and_then(|dt| DateTime::from_timestamp(dt.into_timestamp_secs(), 0))
            }),
        })
    }
}

fn add_text(doc: &mut TantivyDocument, schema: &Schema, field_name: &str, value: &str) {
    if let Ok(field) = schema.get_field(field_name) {
        doc.add_text(field, value);
    }
}

fn first_text(doc: &TantivyDocument, schema: &Schema, field_name: &str) -> Option<String> {
    schema.get_field(field_name).ok().and_then(|field| {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    })
}

fn all_text(doc: &TantivyDocument, schema: &Schema, field_name: &str) -> Vec<String> {
    schema
        .get_field(field_name)
        .ok()
        .map(|field| {
            doc.get_all(field)
                .filter_map(|v| v.as_str())
                .map(|s| s.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn folded_text() -> TextOptions {
    TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(FOLDED_TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored()
}

/// Lowercases and strips diacritics so "Café" matches "cafe"
pub fn folded_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build()
}

/// Build the schema shared by the site and blog indexes
pub fn build_content_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // Keyword fields
    schema_builder.add_text_field("id", STRING | STORED);
    schema_builder.add_text_field("kind", STRING | STORED);
    schema_builder.add_text_field("parent_id", STRING | STORED);

    // Full-text fields
    schema_builder.add_text_field("title", folded_text());
    schema_builder.add_text_field("short_description", folded_text());
    schema_builder.add_text_field("body", folded_text());
    schema_builder.add_text_field("tags", folded_text());
    schema_builder.add_text_field("skills", folded_text());

    // Stored only
    schema_builder.add_text_field("image_url", STORED);
    schema_builder.add_text_field("url", STORED);

    schema_builder.add_date_field("published_at", INDEXED | STORED | FAST);

    schema_builder.build()
}
