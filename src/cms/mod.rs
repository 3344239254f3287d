//! Headless CMS access
//!
//! Everything the site knows about the content service goes through the
//! [`ContentClient`] trait. [`HttpClient`] talks to the real REST API,
//! [`MemoryClient`] serves documents from a JSON fixtures file.

mod document;
mod http;
mod memory;
#[cfg(test)]
pub(crate) mod mock;
mod query;

pub use document::{parse_timestamp, Document, SearchResponse};
pub use http::HttpClient;
pub use memory::{Fixtures, MemoryClient};
pub use query::{search_url, Ordering, Predicate, QueryOptions};

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::config::CmsConfig;

/// Cookie carrying the preview ref selected by the CMS editor
pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

/// Errors raised while talking to the content service
#[derive(Error, Debug)]
pub enum CmsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("The API did not advertise a master ref")]
    NoMasterRef,

    #[error("Invalid fixtures: {0}")]
    InvalidFixtures(String),
}

/// Read access to the content repository
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Ref of the currently published content snapshot
    async fn master_ref(&self) -> Result<String, CmsError>;

    /// Run a search query
    async fn query(&self, options: &QueryOptions) -> Result<SearchResponse, CmsError>;

    /// Fetch a page by the opaque `next_page` cursor of an earlier response
    async fn fetch_page(&self, url: &str) -> Result<SearchResponse, CmsError>;

    /// Fetch a single document of `doc_type` by its uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<Option<Document>, CmsError>;

    /// Fetch a single document by its internal id
    async fn get_by_id(
        &self,
        id: &str,
        reference: Option<&str>,
    ) -> Result<Option<Document>, CmsError>;
}

/// Build the client described by the configuration.
///
/// A `fixtures` path wins over the HTTP endpoint.
pub fn connect(config: &CmsConfig, base_dir: &Path) -> anyhow::Result<Arc<dyn ContentClient>> {
    if let Some(fixtures) = &config.fixtures {
        let path = base_dir.join(fixtures);
        tracing::info!("Using CMS fixtures from {:?}", path);
        return Ok(Arc::new(MemoryClient::from_path(&path)?));
    }

    tracing::debug!("Using CMS endpoint {}", config.endpoint);
    Ok(Arc::new(HttpClient::new(config)?))
}
