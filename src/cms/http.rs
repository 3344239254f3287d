//! Content client over the CMS REST API

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use super::query::{search_url, Predicate, QueryOptions};
use super::{CmsError, ContentClient, Document, SearchResponse};
use crate::config::CmsConfig;

/// API entry document, listing the available content refs
#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

/// HTTP content client
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    endpoint: String,
    access_token: Option<String>,
}

impl HttpClient {
    /// Create a client for the configured endpoint
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CmsError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CmsError::Status {
                status: status.as_u16(),
                url: strip_token(url),
            });
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn root_url(&self) -> String {
        match &self.access_token {
            Some(token) => format!("{}?access_token={}", self.endpoint, token),
            None => self.endpoint.clone(),
        }
    }

    async fn first(
        &self,
        predicate: Predicate,
        reference: Option<&str>,
    ) -> Result<Option<Document>, CmsError> {
        let options = QueryOptions::new(predicate).page_size(1).with_ref(reference);
        let response = self.query(&options).await?;
        Ok(response.results.into_iter().next())
    }
}

#[async_trait]
impl ContentClient for HttpClient {
    async fn master_ref(&self) -> Result<String, CmsError> {
        let root: ApiRoot = self.get_json(&self.root_url()).await?;
        root.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(CmsError::NoMasterRef)
    }

    #[instrument(skip(self, options), fields(predicates = options.predicates.len()))]
    async fn query(&self, options: &QueryOptions) -> Result<SearchResponse, CmsError> {
        let reference = match &options.reference {
            Some(r) => r.clone(),
            None => self.master_ref().await?,
        };
        let url = search_url(
            &self.endpoint,
            &reference,
            options,
            self.access_token.as_deref(),
        );
        debug!("Querying {}", strip_token(&url));
        self.get_json(&url).await
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse, CmsError> {
        let url = match &self.access_token {
            Some(token) if !url.contains("access_token=") => {
                let sep = if url.contains('?') { '&' } else { '?' };
                format!("{}{}access_token={}", url, sep, token)
            }
            _ => url.to_string(),
        };
        debug!("Fetching page {}", strip_token(&url));
        self.get_json(&url).await
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<Option<Document>, CmsError> {
        self.first(Predicate::uid(doc_type, uid), reference).await
    }

    async fn get_by_id(
        &self,
        id: &str,
        reference: Option<&str>,
    ) -> Result<Option<Document>, CmsError> {
        self.first(Predicate::id(id), reference).await
    }
}

/// Drop the access token from a URL before it reaches logs or errors
fn strip_token(url: &str) -> String {
    match url.find("access_token=") {
        Some(pos) => {
            let end = url[pos..].find('&').map(|i| pos + i).unwrap_or(url.len());
            format!("{}access_token=***{}", &url[..pos], &url[end..])
        }
        None => url.to_string(),
    }
}
