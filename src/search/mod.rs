//! Full-text search over published content, powered by Tantivy
//!
//! Two indexes share one schema and the `folded` analyzer (lowercase plus
//! ASCII folding):
//!
//! - `site_search` holds blogs, jobs and the skills embedded in skill groups,
//!   distinguished by the `kind` keyword field
//! - `blog_search` holds published blogs with their resolved tag and skill
//!   names
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │  SearchService               SyncScheduler      │
//! │  - site_search()             - cron full sync   │
//! │  - blog_search()                                │
//! └─────────────────────────────────────────────────┘
//!          │                            │
//!          │                            ▼
//!          │         ┌─────────────────────────────────────┐
//!          │         │  SearchIndexSynchronizer            │
//!          │         │  - full_sync()  - index_one()       │
//!          │         │  - remove_one()                     │
//!          │         └─────────────────────────────────────┘
//!          │                │ mapper (pure) + resolver
//!          ▼                ▼
//! ┌─────────────────────────────────────────────────┐
//! │           IndexManager (per index)               │
//! │  - upsert / delete / replace_kind               │
//! │  - single writer, reader reloaded on commit     │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! The indexes are a secondary view of the document store. Incremental
//! updates never fail the store write that triggered them; the startup and
//! scheduled full syncs bring the indexes back in line.

pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod mapper;
pub mod query;
pub mod scheduler;
pub mod service;
pub mod sync;

pub use config::SearchConfig;
pub use document::{EntityKind, SearchDocument};
pub use error::{SearchError, SearchResult};
pub use index::{IndexManager, IndexStats, SearchIndexes, BLOG_INDEX, SITE_INDEX};
pub use query::SearchQuery;
pub use scheduler::SyncScheduler;
pub use service::{BlogSearchHit, SearchService, SiteSearchHit, SiteSearchResults};
pub use sync::{SearchIndexSynchronizer, SearchableEntity, SyncReport};
