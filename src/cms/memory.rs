//! Fixture-backed content client
//!
//! Serves a fixed set of documents with the same query semantics as the
//! REST API: predicate filtering, orderings, `after` positioning and
//! paging through opaque `next_page` cursors. Used for offline builds
//! (`cms.fixtures` in the site config) and throughout the test suites.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Mutex;

use super::query::{Ordering, Predicate, QueryOptions};
use super::{CmsError, ContentClient, Document, SearchResponse};

const DEFAULT_PAGE_SIZE: usize = 20;
const DEFAULT_MASTER_REF: &str = "master";
const CURSOR_PREFIX: &str = "memory://search/";
/// Cursors kept alive; older ones expire
pub const MAX_CURSORS: usize = 1024;

/// Fixtures file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixtures {
    pub master_ref: Option<String>,
    /// Published documents
    pub documents: Vec<Document>,
    /// Draft documents per preview ref, overlaid on the published set
    pub previews: HashMap<String, Vec<Document>>,
}

/// In-memory content client
pub struct MemoryClient {
    fixtures: Fixtures,
    cursors: Mutex<BTreeMap<usize, QueryOptions>>,
    next_cursor: AtomicUsize,
}

impl MemoryClient {
    pub fn new(documents: Vec<Document>) -> Self {
        Self::from_fixtures(Fixtures {
            documents,
            ..Default::default()
        })
    }

    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        Self {
            fixtures,
            cursors: Mutex::new(BTreeMap::new()),
            next_cursor: AtomicUsize::new(1),
        }
    }

    /// Load fixtures from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, CmsError> {
        let content = fs::read_to_string(path)
            .map_err(|e| CmsError::InvalidFixtures(format!("{}: {}", path.display(), e)))?;
        let fixtures: Fixtures = serde_json::from_str(&content)
            .map_err(|e| CmsError::InvalidFixtures(format!("{}: {}", path.display(), e)))?;
        Ok(Self::from_fixtures(fixtures))
    }

    /// Add draft documents visible under `reference`
    pub fn with_preview(mut self, reference: &str, documents: Vec<Document>) -> Self {
        self.fixtures
            .previews
            .insert(reference.to_string(), documents);
        self
    }

    fn master(&self) -> &str {
        self.fixtures
            .master_ref
            .as_deref()
            .unwrap_or(DEFAULT_MASTER_REF)
    }

    /// Documents visible under a ref
    fn snapshot(&self, reference: Option<&str>) -> Result<Vec<Document>, CmsError> {
        let mut documents = self.fixtures.documents.clone();
        let reference = match reference {
            Some(r) if r != self.master() => r,
            _ => return Ok(documents),
        };

        let drafts = self
            .fixtures
            .previews
            .get(reference)
            .ok_or_else(|| CmsError::Status {
                status: 404,
                url: format!("memory://ref/{}", reference),
            })?;

        for draft in drafts {
            match documents.iter_mut().find(|d| d.id == draft.id) {
                Some(existing) => *existing = draft.clone(),
                None => documents.push(draft.clone()),
            }
        }
        Ok(documents)
    }

    fn register_cursor(&self, options: QueryOptions) -> String {
        let n = self.next_cursor.fetch_add(1, AtomicOrdering::Relaxed);
        if let Ok(mut cursors) = self.cursors.lock() {
            cursors.insert(n, options);
            while cursors.len() > MAX_CURSORS {
                cursors.pop_first();
            }
        }
        format!("{}{}", CURSOR_PREFIX, n)
    }
}

#[async_trait]
impl ContentClient for MemoryClient {
    async fn master_ref(&self) -> Result<String, CmsError> {
        Ok(self.master().to_string())
    }

    async fn query(&self, options: &QueryOptions) -> Result<SearchResponse, CmsError> {
        let mut documents: Vec<Document> = self
            .snapshot(options.reference.as_deref())?
            .into_iter()
            .filter(|doc| options.predicates.iter().all(|p| matches(doc, p)))
            .collect();

        if let Some(primary) = options.orderings.first() {
            // Ties fall back to the id in the primary direction, so a
            // descending query is the exact mirror of the ascending one
            documents.sort_by(|a, b| {
                options
                    .orderings
                    .iter()
                    .map(|ordering| {
                        directed(
                            sort_key(a, ordering).cmp(&sort_key(b, ordering)),
                            ordering.descending,
                        )
                    })
                    .find(|ord| ord.is_ne())
                    .unwrap_or_else(|| directed(a.id.cmp(&b.id), primary.descending))
            });
        }

        if let Some(after) = &options.after {
            documents = match documents.iter().position(|d| &d.id == after) {
                Some(pos) => documents.split_off(pos + 1),
                None => Vec::new(),
            };
        }

        let page_size = options.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let page = options.page.unwrap_or(1).max(1);
        let total = documents.len();
        let total_pages = total.div_ceil(page_size);

        let results: Vec<Document> = documents
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .map(|doc| restrict_fields(doc, &options.fetch))
            .collect();

        let next_page =
            (page < total_pages).then(|| self.register_cursor(options.clone().page(page + 1)));
        let prev_page = (page > 1).then(|| self.register_cursor(options.clone().page(page - 1)));

        Ok(SearchResponse {
            page,
            results_per_page: page_size,
            total_results_size: total,
            total_pages,
            next_page,
            prev_page,
            results,
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<SearchResponse, CmsError> {
        let options = url
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| {
                self.cursors
                    .lock()
                    .ok()
                    .and_then(|cursors| cursors.get(&n).cloned())
            })
            .ok_or_else(|| CmsError::Status {
                status: 404,
                url: url.to_string(),
            })?;
        self.query(&options).await
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        reference: Option<&str>,
    ) -> Result<Option<Document>, CmsError> {
        Ok(self
            .snapshot(reference)?
            .into_iter()
            .find(|d| d.doc_type == doc_type && d.uid.as_deref() == Some(uid)))
    }

    async fn get_by_id(
        &self,
        id: &str,
        reference: Option<&str>,
    ) -> Result<Option<Document>, CmsError> {
        Ok(self.snapshot(reference)?.into_iter().find(|d| d.id == id))
    }
}

/// Resolve a predicate path against a document
fn field_value(doc: &Document, path: &str) -> Option<String> {
    match path {
        "document.type" => Some(doc.doc_type.clone()),
        "document.id" => Some(doc.id.clone()),
        "document.first_publication_date" => doc.first_publication_date.map(|d| d.to_rfc3339()),
        "document.last_publication_date" => doc.last_publication_date.map(|d| d.to_rfc3339()),
        _ => {
            let rest = path.strip_prefix("my.")?;
            let (doc_type, field) = rest.split_once('.')?;
            if doc_type != doc.doc_type {
                return None;
            }
            if field == "uid" {
                return doc.uid.clone();
            }
            match doc.data.get(field)? {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            }
        }
    }
}

fn matches(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::At { path, value } => field_value(doc, path).as_deref() == Some(value),
        Predicate::Any { path, values } => {
            field_value(doc, path).is_some_and(|v| values.iter().any(|x| *x == v))
        }
    }
}

fn directed(ord: std::cmp::Ordering, descending: bool) -> std::cmp::Ordering {
    if descending {
        ord.reverse()
    } else {
        ord
    }
}

fn sort_key(doc: &Document, ordering: &Ordering) -> Option<String> {
    field_value(doc, &ordering.field)
}

/// Apply a `fetch` restriction such as `posts.title` to the data fields
fn restrict_fields(mut doc: Document, fetch: &[String]) -> Document {
    if fetch.is_empty() {
        return doc;
    }
    if let serde_json::Value::Object(data) = &mut doc.data {
        let prefix = format!("{}.", doc.doc_type);
        data.retain(|key, _| fetch.iter().any(|f| f.strip_prefix(&prefix) == Some(key)));
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, date: &str) -> Document {
        Document {
            id: id.to_string(),
            uid: Some(format!("post-{}", id)),
            doc_type: "posts".to_string(),
            first_publication_date: crate::cms::parse_timestamp(date),
            last_publication_date: crate::cms::parse_timestamp(date),
            data: json!({ "title": format!("Post {}", id), "author": "Ana" }),
        }
    }

    fn client() -> MemoryClient {
        MemoryClient::new(vec![
            doc("b", "2021-02-01T00:00:00"),
            doc("a", "2021-01-01T00:00:00"),
            doc("c", "2021-03-01T00:00:00"),
        ])
    }

    fn ids(response: &SearchResponse) -> Vec<&str> {
        response.results.iter().map(|d| d.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_query_orders_and_pages() {
        let client = client();
        let options = QueryOptions::new(Predicate::document_type("posts"))
            .page_size(2)
            .order_by(Ordering::asc("document.first_publication_date"));

        let first = client.query(&options).await.unwrap();
        assert_eq!(ids(&first), vec!["a", "b"]);
        assert_eq!(first.total_pages, 2);

        let cursor = first.next_page.unwrap();
        let second = client.fetch_page(&cursor).await.unwrap();
        assert_eq!(ids(&second), vec!["c"]);
        assert!(second.next_page.is_none());
        assert!(second.prev_page.is_some());
    }

    #[tokio::test]
    async fn test_query_after() {
        let client = client();
        let options = QueryOptions::new(Predicate::document_type("posts"))
            .page_size(1)
            .after("b")
            .order_by(Ordering::desc("document.first_publication_date"));
        let response = client.query(&options).await.unwrap();
        assert_eq!(ids(&response), vec!["a"]);

        let options = options.after("a");
        let response = client.query(&options).await.unwrap();
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_restricts_data() {
        let client = client();
        let options = QueryOptions::new(Predicate::document_type("posts")).fetch(["posts.title"]);
        let response = client.query(&options).await.unwrap();
        let data = &response.results[0].data;
        assert!(data.get("title").is_some());
        assert!(data.get("author").is_none());
    }

    #[tokio::test]
    async fn test_old_cursors_expire() {
        let client = client();
        let options = QueryOptions::new(Predicate::document_type("posts"))
            .page_size(1)
            .order_by(Ordering::asc("document.first_publication_date"));

        let oldest = client.query(&options).await.unwrap().next_page.unwrap();
        let mut latest = String::new();
        for _ in 0..MAX_CURSORS {
            latest = client.query(&options).await.unwrap().next_page.unwrap();
        }

        assert!(client.fetch_page(&oldest).await.is_err());
        assert_eq!(ids(&client.fetch_page(&latest).await.unwrap()), vec!["b"]);
    }

    #[tokio::test]
    async fn test_descending_mirrors_ascending_on_ties() {
        let client = MemoryClient::new(vec![
            doc("y", "2021-01-01T00:00:00"),
            doc("x", "2021-01-01T00:00:00"),
            doc("z", "2021-02-01T00:00:00"),
        ]);
        let query = |ordering| QueryOptions::new(Predicate::document_type("posts")).order_by(ordering);

        let asc = client
            .query(&query(Ordering::asc("document.first_publication_date")))
            .await
            .unwrap();
        let desc = client
            .query(&query(Ordering::desc("document.first_publication_date")))
            .await
            .unwrap();
        assert_eq!(ids(&asc), vec!["x", "y", "z"]);
        assert_eq!(ids(&desc), vec!["z", "y", "x"]);
    }

    #[tokio::test]
    async fn test_unknown_cursor_fails() {
        let client = client();
        let err = client.fetch_page("memory://search/999").await.unwrap_err();
        assert!(matches!(err, CmsError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_preview_overlay() {
        let mut draft = doc("a", "2021-01-01T00:00:00");
        draft.data = json!({ "title": "Draft title", "author": "Ana" });
        let client = client().with_preview("preview-1", vec![draft]);

        let published = client.get_by_uid("posts", "post-a", None).await.unwrap().unwrap();
        assert_eq!(published.data["title"], "Post a");

        let preview = client
            .get_by_uid("posts", "post-a", Some("preview-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(preview.data["title"], "Draft title");

        assert!(client.get_by_id("a", Some("expired")).await.is_err());
    }

    #[test]
    fn test_from_path_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            MemoryClient::from_path(&path),
            Err(CmsError::InvalidFixtures(_))
        ));
    }
}
