//! Query understanding and search-backend access for document-management
//! consoles.
//!
//! - [`query::QueryProcessor`] classifies free text (English or Arabic) into an
//!   intent with extracted entities.
//! - [`search::SearchService`] turns queries and filters into Elasticsearch
//!   requests against the search backend and normalizes the results.

pub mod auth;
pub mod config;
pub mod error;
pub mod query;
pub mod search;
pub mod types;

pub use error::{Error, Result};
pub use query::QueryProcessor;
pub use search::{SearchRequest, SearchService, SearchState};
pub use types::*;
