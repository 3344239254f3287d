//! Previous/next post navigation and the detail page state

use serde::Serialize;

use crate::cms::{CmsError, ContentClient, Document, Ordering, Predicate, QueryOptions};
use crate::content::PostSummary;
use crate::pagination::summary_fields;

const PUBLICATION_DATE: &str = "document.first_publication_date";

/// Posts adjacent to the current one by first publication date
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Neighbors {
    /// The next older post
    pub previous: Option<PostSummary>,
    /// The next newer post
    pub next: Option<PostSummary>,
}

/// Resolve the neighbors of `post_id` with two concurrent one-record queries
pub async fn resolve_neighbors(
    client: &dyn ContentClient,
    doc_type: &str,
    post_id: &str,
    reference: Option<&str>,
) -> Result<Neighbors, CmsError> {
    let adjacent = |ordering: Ordering| {
        QueryOptions::new(Predicate::document_type(doc_type))
            .fetch(summary_fields(doc_type))
            .page_size(1)
            .after(post_id)
            .order_by(ordering)
            .with_ref(reference)
    };
    let older = adjacent(Ordering::desc(PUBLICATION_DATE));
    let newer = adjacent(Ordering::asc(PUBLICATION_DATE));

    let (older, newer) = tokio::try_join!(client.query(&older), client.query(&newer))?;

    Ok(Neighbors {
        previous: first_summary(&older.results),
        next: first_summary(&newer.results),
    })
}

fn first_summary(results: &[Document]) -> Option<PostSummary> {
    results.first().map(PostSummary::from_document)
}

/// Lifecycle of a post detail page
#[derive(Debug, Clone, PartialEq)]
pub enum PageState<T> {
    /// Not built yet; the placeholder is served meanwhile
    Generating,
    Ready(T),
}

impl<T> PageState<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PageState::Ready(_))
    }

    /// Move to `Ready`. A ready page never changes again.
    pub fn complete(self, view: T) -> Self {
        match self {
            PageState::Generating => PageState::Ready(view),
            ready => ready,
        }
    }
}

impl<T> Default for PageState<T> {
    fn default() -> Self {
        PageState::Generating
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{parse_timestamp, MemoryClient};
    use serde_json::json;

    fn doc(id: &str, day: u32) -> Document {
        let date = format!("2021-03-{:02}T12:00:00+0000", day);
        Document {
            id: id.to_string(),
            uid: Some(id.to_string()),
            doc_type: "posts".to_string(),
            first_publication_date: parse_timestamp(&date),
            last_publication_date: parse_timestamp(&date),
            data: json!({ "title": format!("Title {}", id), "author": "Ana" }),
        }
    }

    fn client() -> MemoryClient {
        MemoryClient::new(vec![doc("first", 1), doc("second", 2), doc("third", 3)])
    }

    #[tokio::test]
    async fn test_middle_post_has_both() {
        let n = resolve_neighbors(&client(), "posts", "second", None)
            .await
            .unwrap();
        assert_eq!(n.previous.unwrap().uid, "first");
        let next = n.next.unwrap();
        assert_eq!(next.uid, "third");
        assert_eq!(next.title, "Title third");
        assert_eq!(next.author, "Ana");
    }

    #[tokio::test]
    async fn test_posts_sharing_a_date_link_to_each_other_once() {
        let client = MemoryClient::new(vec![doc("y", 4), doc("x", 4)]);

        let x = resolve_neighbors(&client, "posts", "x", None).await.unwrap();
        assert!(x.previous.is_none());
        assert_eq!(x.next.unwrap().uid, "y");

        let y = resolve_neighbors(&client, "posts", "y", None).await.unwrap();
        assert_eq!(y.previous.unwrap().uid, "x");
        assert!(y.next.is_none());
    }

    #[tokio::test]
    async fn test_oldest_post_has_no_previous() {
        let n = resolve_neighbors(&client(), "posts", "first", None)
            .await
            .unwrap();
        assert!(n.previous.is_none());
        assert_eq!(n.next.unwrap().uid, "second");
    }

    #[tokio::test]
    async fn test_newest_post_has_no_next() {
        let n = resolve_neighbors(&client(), "posts", "third", None)
            .await
            .unwrap();
        assert_eq!(n.previous.unwrap().uid, "second");
        assert!(n.next.is_none());
    }

    #[tokio::test]
    async fn test_single_post() {
        let client = MemoryClient::new(vec![doc("only", 1)]);
        let n = resolve_neighbors(&client, "posts", "only", None)
            .await
            .unwrap();
        assert_eq!(n, Neighbors::default());
    }

    #[tokio::test]
    async fn test_unknown_ref_fails() {
        let result = resolve_neighbors(&client(), "posts", "second", Some("draft")).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_page_state_transitions_once() {
        let state: PageState<&str> = PageState::default();
        assert!(!state.is_ready());
        let state = state.complete("built");
        assert_eq!(state, PageState::Ready("built"));
        assert_eq!(state.complete("rebuilt"), PageState::Ready("built"));
    }
}
