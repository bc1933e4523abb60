//! Search query normalization and building

use crate::search::config::SearchConfig;
use crate::search::document::EntityKind;
use tantivy::query::{BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema};
use tantivy::{Index, Term};

/// Text fields searched by every query
const TEXT_FIELDS: [&str; 5] = ["title", "short_description", "body", "tags", "skills"];

/// Field boosts applied to blog search
const BLOG_BOOSTS: [(&str, f32); 3] = [("title", 3.0), ("tags", 2.0), ("short_description", 2.0)];

/// A normalized user query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Trimmed and truncated query text
    pub text: String,

    /// Maximum number of hits
    pub limit: usize,
}

impl SearchQuery {
    /// Trim `raw` and truncate it to `max_query_length` characters.
    /// Returns `None` when the result is shorter than `min_query_length`.
    pub fn normalize(raw: &str, config: &SearchConfig) -> Option<Self> {
        let text: String = raw.trim().chars().take(config.max_query_length).collect();
        let text = text.trim_end().to_string();

        if text.chars().count() < config.min_query_length.max(1) {
            return None;
        }

        Some(Self { text, limit: 10 })
    }

    /// Set limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// Builds Tantivy queries against the shared content schema
pub struct QueryBuilder {
    index: Index,
    text_fields: Vec<Field>,
    kind_field: Option<Field>,
}

impl QueryBuilder {
    pub fn new(schema: &Schema, index: Index) -> Self {
        let text_fields = TEXT_FIELDS
            .iter()
            .filter_map(|name| schema.get_field(name).ok())
            .collect();

        Self {
            index,
            text_fields,
            kind_field: schema.get_field("kind").ok(),
        }
    }

    fn parser(&self) -> QueryParser {
        QueryParser::for_index(&self.index, self.text_fields.clone())
    }

    /// Parse user text, dropping syntax the parser cannot understand
    fn parse_lenient(parser: &QueryParser, text: &str) -> Box<dyn Query> {
        let (query, errors) = parser.parse_query_lenient(text);
        if !errors.is_empty() {
            tracing::debug!(query = text, errors = errors.len(), "Ignored query syntax errors");
        }
        query
    }

    /// Text query restricted to one entity kind
    pub fn site_query(&self, query: &SearchQuery, kind: EntityKind) -> Box<dyn Query> {
        let text_query = Self::parse_lenient(&self.parser(), &query.text);

        match self.kind_field {
            Some(kind_field) => {
                let kind_query: Box<dyn Query> = Box::new(TermQuery::new(
                    Term::from_field_text(kind_field, kind.as_ref()),
                    IndexRecordOption::Basic,
                ));
                Box::new(BooleanQuery::new(vec![
                    (Occur::Must, kind_query),
                    (Occur::Must, text_query),
                ]))
            }
            None => text_query,
        }
    }

    /// Text query with title, tags and short description boosted
    pub fn blog_query(&self, query: &SearchQuery) -> Box<dyn Query> {
        let mut parser = self.parser();
        let schema = self.index.schema();
        for (name, boost) in BLOG_BOOSTS {
            if let Ok(field) = schema.get_field(name) {
                parser.set_field_boost(field, boost);
            }
        }
        Self::parse_lenient(&parser, &query.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_truncates() {
        let config = SearchConfig {
            max_query_length: 5,
            ..Default::default()
        };

        let query = SearchQuery::normalize("   database error  ", &config).unwrap();
        assert_eq!(query.text, "datab");
    }

    #[test]
    fn test_normalize_rejects_short_queries() {
        let config = SearchConfig::default();
        assert!(SearchQuery::normalize(" a ", &config).is_none());
        assert!(SearchQuery::normalize("   ", &config).is_none());
        assert!(SearchQuery::normalize("ab", &config).is_some());
    }

    #[test]
    fn test_normalize_counts_characters() {
        let config = SearchConfig {
            max_query_length: 3,
            ..Default::default()
        };
        let query = SearchQuery::normalize("écoles", &config).unwrap();
        assert_eq!(query.text, "éco");
    }
}
