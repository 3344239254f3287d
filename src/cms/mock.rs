//! A small CMS REST API double for exercising `HttpClient` over the wire

use axum::{
    extract::{OriginalUri, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{Document, SearchResponse};
use crate::config::CmsConfig;

pub const MASTER_REF: &str = "Yfz9master";
/// Searches under this ref answer with a server error
pub const FAILING_REF: &str = "broken";
pub const ACCESS_TOKEN: &str = "s3cret";

pub struct MockCms {
    base: String,
    documents: Vec<Document>,
    pub root_hits: AtomicUsize,
    pub search_hits: AtomicUsize,
    /// Path and query of every request, in arrival order
    pub requests: Mutex<Vec<String>>,
}

impl MockCms {
    /// Bind on an ephemeral port and serve `documents`
    pub async fn serve(documents: Vec<Document>) -> Arc<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let cms = Arc::new(Self {
            base,
            documents,
            root_hits: AtomicUsize::new(0),
            search_hits: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/api/v2", get(root))
            .route("/api/v2/documents/search", get(search))
            .with_state(cms.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        cms
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/v2", self.base)
    }

    /// Client settings pointing at this server
    pub fn config(&self, access_token: Option<&str>) -> CmsConfig {
        CmsConfig {
            endpoint: self.endpoint(),
            access_token: access_token.map(str::to_string),
            access_token_env: "SPACETRAVELING_MOCK_CMS_TOKEN".to_string(),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, uri: &axum::http::Uri) {
        self.requests.lock().unwrap().push(uri.to_string());
    }
}

async fn root(State(cms): State<Arc<MockCms>>, OriginalUri(uri): OriginalUri) -> Response {
    cms.root_hits.fetch_add(1, Ordering::SeqCst);
    cms.record(&uri);
    Json(serde_json::json!({
        "refs": [
            { "id": "preview", "ref": "draft-1", "label": "Draft" },
            { "id": "master", "ref": MASTER_REF, "label": "Master", "isMasterRef": true }
        ]
    }))
    .into_response()
}

async fn search(
    State(cms): State<Arc<MockCms>>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    cms.search_hits.fetch_add(1, Ordering::SeqCst);
    cms.record(&uri);

    let reference = params.get("ref").map(String::as_str).unwrap_or_default();
    if reference == FAILING_REF {
        return (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response();
    }

    // Documents are served in fixture order; `after` ends the listing
    let q = params.get("q").cloned().unwrap_or_default();
    let matching: Vec<Document> = if params.contains_key("after") {
        Vec::new()
    } else {
        cms.documents
            .iter()
            .filter(|doc| {
                if q.contains("document.id") {
                    q.contains(&format!("\"{}\"", doc.id))
                } else if q.contains(".uid") {
                    doc.uid
                        .as_ref()
                        .is_some_and(|uid| q.contains(&format!("\"{}\"", uid)))
                } else {
                    true
                }
            })
            .cloned()
            .collect()
    };

    let page_size: usize = params
        .get("pageSize")
        .and_then(|v| v.parse().ok())
        .unwrap_or(20);
    let page: usize = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);
    let total = matching.len();
    let total_pages = total.div_ceil(page_size);
    let next_page = (page < total_pages).then(|| {
        format!(
            "{}/api/v2/documents/search?ref={}&pageSize={}&page={}",
            cms.base,
            reference,
            page_size,
            page + 1
        )
    });

    Json(SearchResponse {
        page,
        results_per_page: page_size,
        total_results_size: total,
        total_pages,
        next_page,
        prev_page: None,
        results: matching
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .collect(),
    })
    .into_response()
}
