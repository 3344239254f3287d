//! Post models and their mapping from CMS documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cms::Document;
use crate::richtext::RichTextBlock;

/// A post as shown in the post list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// Route identifier
    pub uid: String,

    /// Internal CMS id
    pub id: String,

    /// First publication date (absent on never-published drafts)
    pub first_publication_date: Option<DateTime<Utc>>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

impl PostSummary {
    /// Map a raw document, degrading missing fields to empty strings
    pub fn from_document(doc: &Document) -> Self {
        Self {
            uid: doc.route_id().to_string(),
            id: doc.id.clone(),
            first_publication_date: doc.first_publication_date,
            title: required_text(doc, "title"),
            subtitle: text_field(&doc.data, "subtitle").unwrap_or_default(),
            author: required_text(doc, "author"),
        }
    }
}

/// A section of a post body: a heading followed by rich text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// A full post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub uid: String,
    pub id: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub last_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: Option<String>,
    pub content: Vec<ContentSection>,
}

impl PostDetail {
    /// Map a raw document, degrading missing fields
    pub fn from_document(doc: &Document) -> Self {
        let banner_url = doc
            .data
            .get("banner")
            .and_then(|b| b.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        let content = match doc.data.get("content") {
            Some(Value::Array(sections)) => sections
                .iter()
                .map(|section| parse_section(doc, section))
                .collect(),
            _ => Vec::new(),
        };

        Self {
            uid: doc.route_id().to_string(),
            id: doc.id.clone(),
            first_publication_date: doc.first_publication_date,
            last_publication_date: doc.last_publication_date,
            title: required_text(doc, "title"),
            subtitle: text_field(&doc.data, "subtitle").unwrap_or_default(),
            author: required_text(doc, "author"),
            banner_url,
            content,
        }
    }

    /// The list projection of this post
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            uid: self.uid.clone(),
            id: self.id.clone(),
            first_publication_date: self.first_publication_date,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }

    /// Whether the post changed after it was first published
    pub fn is_edited(&self) -> bool {
        super::is_edited(self)
    }

    /// Estimated reading time in minutes
    pub fn reading_time(&self, words_per_minute: usize) -> usize {
        super::reading_time_with(&self.content, words_per_minute)
    }
}

fn parse_section(doc: &Document, section: &Value) -> ContentSection {
    let heading = text_field(section, "heading").unwrap_or_default();
    let body = match section.get("body") {
        Some(body) => serde_json::from_value(body.clone()).unwrap_or_else(|e| {
            tracing::warn!(
                "Post {}: unreadable body under heading {:?}: {}",
                doc.route_id(),
                heading,
                e
            );
            Vec::new()
        }),
        None => Vec::new(),
    };
    ContentSection { heading, body }
}

fn required_text(doc: &Document, key: &str) -> String {
    text_field(&doc.data, key).unwrap_or_else(|| {
        tracing::warn!("Post {} has no {}", doc.route_id(), key);
        String::new()
    })
}

/// Read a key-text or rich text field as plain text
fn text_field(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.clone()),
        value @ Value::Array(_) => {
            let blocks: Vec<RichTextBlock> = serde_json::from_value(value.clone()).ok()?;
            let text: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
            Some(text.join(" "))
        }
        _ => None,
    }
}
