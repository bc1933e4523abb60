//! Search index management

use crate::search::config::SearchConfig;
use crate::search::document::{
    build_content_schema, folded_analyzer, EntityKind, SearchDocument, FOLDED_TOKENIZER,
};
use crate::search::error::{SearchError, SearchResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::{Count, DocSetCollector, TopDocs};
use tantivy::query::{AllQuery, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub name: String,

    /// Total number of documents in the index
    pub total_documents: u64,

    /// Number of segments
    pub num_segments: usize,
}

/// Manages one Tantivy index
pub struct IndexManager {
    name: String,

    /// The Tantivy index
    index: Index,

    /// The schema
    schema: Schema,

    /// Index writer (wrapped in RwLock for thread-safety)
    writer: Arc<RwLock<IndexWriter>>,

    /// Index reader, reloaded after every commit
    reader: IndexReader,

    id_field: Field,
    kind_field: Field,
    parent_field: Field,
}

impl IndexManager {
    /// Open the index `name` under the configured directory, creating it if
    /// needed. Without an `index_path` the index lives in memory.
    pub fn open(name: &str, config: &SearchConfig) -> SearchResult<Self> {
        let index = match &config.index_path {
            Some(root) => {
                let path = root.join(name);
                // Create index directory if it doesn't exist
                std::fs::create_dir_all(&path).map_err(|e| {
                    SearchError::IndexInitFailed(format!(
                        "Failed to create index directory: {}",
                        e
                    ))
                })?;

                if Self::index_exists(&path) {
                    Index::open_in_dir(&path).map_err(|e| {
                        SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
                    })?
                } else {
                    Index::create_in_dir(&path, build_content_schema()).map_err(|e| {
                        SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
                    })?
                }
            }
            None => Index::create_in_ram(build_content_schema()),
        };

        index
            .tokenizers()
            .register(FOLDED_TOKENIZER, folded_analyzer());
        let schema = index.schema();

        let writer = index
            .writer_with_num_threads(1, config.writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        let field = |field_name: &str| {
            schema
                .get_field(field_name)
                .map_err(|e| SearchError::SchemaError(e.to_string()))
        };
        let id_field = field("id")?;
        let kind_field = field("kind")?;
        let parent_field = field("parent_id")?;

        tracing::info!(index = name, in_memory = config.index_path.is_none(), "Opened search index");

        Ok(Self {
            name: name.to_string(),
            index,
            schema,
            writer: Arc::new(RwLock::new(writer)),
            reader,
            id_field,
            kind_field,
            parent_field,
        })
    }

    /// Check if an index exists at the given path
    fn index_exists(path: &Path) -> bool {
        path.join("meta.json").exists()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get the index
    pub fn index(&self) -> &Index {
        &self.index
    }

    fn commit(&self, writer: &mut IndexWriter) -> SearchResult<()> {
        writer
            .commit()
            .map_err(|e| SearchError::IndexingFailed(format!("Failed to commit: {}", e)))?;
        self.reader.reload()?;
        Ok(())
    }

    /// Discard uncommitted operations so a failed batch leaves the index as it was
    fn abort(&self, writer: &mut IndexWriter, err: SearchError) -> SearchError {
        if let Err(rollback_err) = writer.rollback() {
            tracing::error!(index = %self.name, error = %rollback_err, "Failed to roll back index writer");
        }
        err
    }

    fn kind_term(&self, kind: EntityKind) -> Term {
        Term::from_field_text(self.kind_field, kind.as_ref())
    }

    /// Insert or replace a single document
    pub async fn upsert(&self, document: &SearchDocument) -> SearchResult<()> {
        let mut writer = self.writer.write().await;

        // Delete existing document with same ID first
        writer.delete_term(Term::from_field_text(self.id_field, &document.id));
        if let Err(e) = writer.add_document(document.to_tantivy_doc(&self.schema)) {
            return Err(self.abort(
                &mut writer,
                SearchError::IndexingFailed(format!("Failed to add document: {}", e)),
            ));
        }

        self.commit(&mut writer)
    }

    /// Delete a document by ID
    pub async fn delete(&self, document_id: &str) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        writer.delete_term(Term::from_field_text(self.id_field, document_id));
        self.commit(&mut writer).map_err(|e| {
            SearchError::DeletionFailed(format!("Failed to commit deletion: {}", e))
        })
    }

    /// Delete every document owned by `parent_id`
    pub async fn delete_by_parent(&self, parent_id: &str) -> SearchResult<()> {
        let mut writer = self.writer.write().await;
        writer.delete_term(Term::from_field_text(self.parent_field, parent_id));
        self.commit(&mut writer).map_err(|e| {
            SearchError::DeletionFailed(format!("Failed to commit deletion: {}", e))
        })
    }

    /// Replace every document owned by `parent_id` with `documents`
    pub async fn replace_children(
        &self,
        parent_id: &str,
        documents: &[SearchDocument],
    ) -> SearchResult<usize> {
        let mut writer = self.writer.write().await;
        writer.delete_term(Term::from_field_text(self.parent_field, parent_id));
        for document in documents {
            writer.delete_term(Term::from_field_text(self.id_field, &document.id));
            if let Err(e) = writer.add_document(document.to_tantivy_doc(&self.schema)) {
                return Err(self.abort(
                    &mut writer,
                    SearchError::IndexingFailed(format!("Failed to add document: {}", e)),
                ));
            }
        }
        self.commit(&mut writer)?;
        Ok(documents.len())
    }

    /// Replace every document of `kind` with `documents` in a single commit.
    /// Documents of that kind not in `documents` are removed.
    pub async fn replace_kind(
        &self,
        kind: EntityKind,
        documents: &[SearchDocument],
    ) -> SearchResult<usize> {
        let mut writer = self.writer.write().await;
        writer.delete_term(self.kind_term(kind));

        let mut indexed = 0;
        for document in documents {
            if let Err(e) = writer.add_document(document.to_tantivy_doc(&self.schema)) {
                return Err(self.abort(
                    &mut writer,
                    SearchError::IndexingFailed(format!(
                        "Failed to add document {}: {}",
                        document.id, e
                    )),
                ));
            }
            indexed += 1;
        }

        self.commit(&mut writer)?;
        Ok(indexed)
    }

    fn kind_query(&self, kind: Option<EntityKind>) -> Box<dyn Query> {
        match kind {
            Some(kind) => Box::new(TermQuery::new(
                self.kind_term(kind),
                IndexRecordOption::Basic,
            )),
            None => Box::new(AllQuery),
        }
    }

    /// Count documents, optionally of one kind
    pub fn count(&self, kind: Option<EntityKind>) -> SearchResult<usize> {
        let searcher = self.reader.searcher();
        searcher
            .search(&*self.kind_query(kind), &Count)
            .map_err(|e| SearchError::SearchFailed(format!("Failed to count documents: {}", e)))
    }

    /// Ids of all documents, optionally of one kind, sorted
    pub fn all_ids(&self, kind: Option<EntityKind>) -> SearchResult<Vec<String>> {
        let searcher = self.reader.searcher();
        let addresses = searcher
            .search(&*self.kind_query(kind), &DocSetCollector)
            .map_err(|e| SearchError::SearchFailed(format!("Failed to list documents: {}", e)))?;

        let mut ids = Vec::with_capacity(addresses.len());
        for address in addresses {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(document) = SearchDocument::from_tantivy_doc(&doc, &self.schema) {
                ids.push(document.id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Fetch a stored document by id
    pub fn get(&self, document_id: &str) -> SearchResult<Option<SearchDocument>> {
        let query = TermQuery::new(
            Term::from_field_text(self.id_field, document_id),
            IndexRecordOption::Basic,
        );
        Ok(self.search(&query, 1)?.into_iter().next().map(|(_, doc)| doc))
    }

    /// Run `query` and return the top `limit` documents with their scores
    pub fn search(
        &self,
        query: &dyn Query,
        limit: usize,
    ) -> SearchResult<Vec<(f32, SearchDocument)>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let top_docs = searcher
            .search(query, &TopDocs::with_limit(limit))
            .map_err(|e| SearchError::SearchFailed(format!("Search execution failed: {}", e)))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address).map_err(|e| {
                SearchError::SearchFailed(format!("Failed to retrieve doc: {}", e))
            })?;
            if let Some(document) = SearchDocument::from_tantivy_doc(&doc, &self.schema) {
                hits.push((score, document));
            }
        }
        Ok(hits)
    }

    /// Get index statistics
    pub fn stats(&self) -> SearchResult<IndexStats> {
        let searcher = self.reader.searcher();
        Ok(IndexStats {
            name: self.name.clone(),
            total_documents: self.count(None)? as u64,
            num_segments: searcher.segment_readers().len(),
        })
    }
}

/// Name of the index holding blogs, jobs and skills
pub const SITE_INDEX: &str = "site_search";

/// Name of the index holding published blogs only
pub const BLOG_INDEX: &str = "blog_search";

/// The two indexes backing site-wide and blog search
#[derive(Clone)]
pub struct SearchIndexes {
    pub site: Arc<IndexManager>,
    pub blog: Arc<IndexManager>,
}

impl SearchIndexes {
    pub fn open(config: &SearchConfig) -> SearchResult<Self> {
        Ok(Self {
            site: Arc::new(IndexManager::open(SITE_INDEX, config)?),
            blog: Arc::new(IndexManager::open(BLOG_INDEX, config)?),
        })
    }

    pub fn stats(&self) -> SearchResult<Vec<IndexStats>> {
        Ok(vec![self.site.stats()?, self.blog.stats()?])
    }
}
