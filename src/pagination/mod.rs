//! Post list pagination
//!
//! The list starts from the first search page and grows by following the
//! CMS `next_page` cursor. Items are only ever appended.

use crate::cms::{CmsError, ContentClient, Ordering, Predicate, QueryOptions, SearchResponse};
use crate::content::PostSummary;

/// Data fields a list item needs
const SUMMARY_FIELDS: [&str; 3] = ["title", "subtitle", "author"];

/// `fetch` restriction for documents mapped to a [`PostSummary`]
pub fn summary_fields(doc_type: &str) -> Vec<String> {
    SUMMARY_FIELDS
        .iter()
        .map(|field| format!("{}.{}", doc_type, field))
        .collect()
}

/// Loaded post summaries and the cursor to the next page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostListState {
    pub items: Vec<PostSummary>,
    pub next_page: Option<String>,
}

impl PostListState {
    /// State after the first page
    pub fn from_response(response: SearchResponse) -> Self {
        Self::default().append_page(response)
    }

    /// Query the first page of posts, newest first
    pub async fn fetch_first(
        client: &dyn ContentClient,
        doc_type: &str,
        page_size: usize,
        reference: Option<&str>,
    ) -> Result<Self, CmsError> {
        let options = QueryOptions::new(Predicate::document_type(doc_type))
            .fetch(summary_fields(doc_type))
            .page_size(page_size)
            .order_by(Ordering::desc("document.first_publication_date"))
            .with_ref(reference);
        let response = client.query(&options).await?;
        Ok(Self::from_response(response))
    }

    /// Append a fetched page and take over its cursor
    pub fn append_page(mut self, page: SearchResponse) -> Self {
        self.items
            .extend(page.results.iter().map(PostSummary::from_document));
        self.next_page = page.next_page;
        self
    }

    /// Whether a "load more" control should be offered
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Fetch the page behind the cursor and append it.
    ///
    /// Returns the number of appended items. Without a cursor nothing is
    /// fetched. On error the state is left untouched, so calling again
    /// retries the same page.
    pub async fn load_more(&mut self, client: &dyn ContentClient) -> Result<usize, CmsError> {
        let Some(cursor) = self.next_page.as_deref() else {
            return Ok(0);
        };
        let page = client.fetch_page(cursor).await?;
        let fetched = page.results.len();
        *self = std::mem::take(self).append_page(page);
        tracing::debug!("Loaded {} more posts", fetched);
        Ok(fetched)
    }

    /// Follow the cursor until every page is loaded
    pub async fn collect_all(&mut self, client: &dyn ContentClient) -> Result<(), CmsError> {
        while self.has_more() {
            self.load_more(client).await?;
        }
        Ok(())
    }
}
