//! Search query construction

use indexmap::IndexMap;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

/// A search predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `[at(path, value)]`: exact match
    At { path: String, value: String },
    /// `[any(path, [values])]`: match any of the values
    Any { path: String, values: Vec<String> },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Documents of a custom type
    pub fn document_type(doc_type: &str) -> Self {
        Self::at("document.type", doc_type)
    }

    /// A document by internal id
    pub fn id(id: &str) -> Self {
        Self::at("document.id", id)
    }

    /// A document of `doc_type` by uid
    pub fn uid(doc_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{}.uid", doc_type), uid)
    }

    /// Render in the API's predicate syntax
    pub fn to_query(&self) -> String {
        match self {
            Predicate::At { path, value } => format!("[at({},{})]", path, quote(value)),
            Predicate::Any { path, values } => {
                let values: Vec<String> = values.iter().map(|v| quote(v)).collect();
                format!("[any({},[{}])]", path, values.join(","))
            }
        }
    }
}

/// Sort key for a query
#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    fn to_query(&self) -> String {
        if self.descending {
            format!("{} desc", self.field)
        } else {
            self.field.clone()
        }
    }
}

/// Options of a search query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    pub predicates: Vec<Predicate>,
    /// Restrict returned `data` fields, e.g. `posts.title`
    pub fetch: Vec<String>,
    pub page_size: Option<usize>,
    pub page: Option<usize>,
    /// Only return documents positioned after this document id
    pub after: Option<String>,
    pub orderings: Vec<Ordering>,
    /// Content ref; the client's master ref when unset
    pub reference: Option<String>,
}

impl QueryOptions {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicates: vec![predicate],
            ..Default::default()
        }
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }

    pub fn with_ref(mut self, reference: Option<&str>) -> Self {
        self.reference = reference.map(str::to_string);
        self
    }
}

/// Build the `documents/search` URL for a query
pub fn search_url(
    endpoint: &str,
    reference: &str,
    options: &QueryOptions,
    access_token: Option<&str>,
) -> String {
    let mut params: IndexMap<&str, String> = IndexMap::new();
    params.insert("ref", reference.to_string());

    if !options.predicates.is_empty() {
        let q: String = options.predicates.iter().map(Predicate::to_query).collect();
        params.insert("q", format!("[{}]", q));
    }
    if let Some(size) = options.page_size {
        params.insert("pageSize", size.to_string());
    }
    if let Some(page) = options.page {
        params.insert("page", page.to_string());
    }
    if let Some(after) = &options.after {
        params.insert("after", after.clone());
    }
    if !options.orderings.is_empty() {
        let orderings: Vec<String> = options.orderings.iter().map(Ordering::to_query).collect();
        params.insert("orderings", format!("[{}]", orderings.join(",")));
    }
    if !options.fetch.is_empty() {
        params.insert("fetch", options.fetch.join(","));
    }
    if let Some(token) = access_token {
        params.insert("access_token", token.to_string());
    }

    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, utf8_percent_encode(v, NON_ALPHANUMERIC)))
        .collect();

    format!(
        "{}/documents/search?{}",
        endpoint.trim_end_matches('/'),
        query.join("&")
    )
}

fn quote(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_syntax() {
        assert_eq!(
            Predicate::document_type("posts").to_query(),
            r#"[at(document.type,"posts")]"#
        );
        assert_eq!(
            Predicate::uid("posts", "hello").to_query(),
            r#"[at(my.posts.uid,"hello")]"#
        );
        let any = Predicate::Any {
            path: "document.id".to_string(),
            values: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(any.to_query(), r#"[any(document.id,["a","b"])]"#);
    }

    #[test]
    fn test_predicate_escapes_quotes() {
        assert_eq!(
            Predicate::at("my.posts.title", r#"say "hi""#).to_query(),
            r#"[at(my.posts.title,"say \"hi\"")]"#
        );
    }

    #[test]
    fn test_search_url() {
        let options = QueryOptions::new(Predicate::document_type("posts"))
            .fetch(["posts.title", "posts.author"])
            .page_size(1)
            .order_by(Ordering::desc("document.first_publication_date"));

        let url = search_url("https://blog.cdn.prismic.io/api/v2/", "abc", &options, None);

        assert!(url.starts_with("https://blog.cdn.prismic.io/api/v2/documents/search?ref=abc&q="));
        assert!(url.contains("&pageSize=1"));
        assert!(url.contains("&orderings=%5Bdocument%2Efirst%5Fpublication%5Fdate%20desc%5D"));
        assert!(url.contains("&fetch=posts%2Etitle%2Cposts%2Eauthor"));
        assert!(!url.contains("access_token"));
    }

    #[test]
    fn test_search_url_with_after_and_token() {
        let options = QueryOptions::new(Predicate::document_type("posts"))
            .page_size(1)
            .after("YFz9");
        let url = search_url("https://cms.test/api/v2", "master", &options, Some("secret"));
        assert!(url.contains("&after=YFz9"));
        assert!(url.ends_with("&access_token=secret"));
    }
}
