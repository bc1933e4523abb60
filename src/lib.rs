//! Portfolio Backend
//!
//! Content and search service for a personal portfolio and blog site.
//!
//! - [`content`]: CRUD services for blogs, jobs, skills, tags, the profile,
//!   tour steps and media metadata
//! - [`resolver`]: id-or-name reference resolution between collections
//! - [`search`]: Tantivy indexes kept in sync with the document store
//! - [`api`]: public read endpoints and the token-guarded admin API
//! - [`migration`]: import of legacy JSON backups

pub mod api;
pub mod config;
pub mod content;
pub mod error;
pub mod metrics;
pub mod migration;
pub mod models;
pub mod resolver;
pub mod search;
pub mod state;

pub use error::{AppError, Result};
