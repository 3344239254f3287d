//! Rich text blocks and their conversion to HTML

mod highlight;
mod html;

pub use highlight::CodeHighlighter;
pub use html::HtmlSerializer;

use serde::{Deserialize, Serialize};

/// Converts a sequence of rich text blocks to markup
pub trait RichTextRenderer: Send + Sync {
    fn render(&self, blocks: &[RichTextBlock]) -> String;
}

/// Block type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "embed")]
    Embed,
    #[serde(other)]
    Unknown,
}

impl BlockKind {
    /// Heading level, if this is a heading
    pub fn heading_level(self) -> Option<u8> {
        match self {
            BlockKind::Heading1 => Some(1),
            BlockKind::Heading2 => Some(2),
            BlockKind::Heading3 => Some(3),
            BlockKind::Heading4 => Some(4),
            BlockKind::Heading5 => Some(5),
            BlockKind::Heading6 => Some(6),
            _ => None,
        }
    }
}

/// A block of rich text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image source
    #[serde(default)]
    pub url: Option<String>,

    /// Image alternative text
    #[serde(default)]
    pub alt: Option<String>,

    /// Block label; on preformatted blocks, the code language
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub oembed: Option<Embed>,
}

impl RichTextBlock {
    /// A plain paragraph
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::with_kind(BlockKind::Paragraph, text)
    }

    pub fn with_kind(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            spans: Vec::new(),
            url: None,
            alt: None,
            label: None,
            oembed: None,
        }
    }

    pub fn span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }
}

/// Inline markup over a character range of a block's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: Option<SpanData>,
}

impl Span {
    pub fn new(kind: SpanKind, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            kind,
            data: None,
        }
    }

    pub fn link(start: usize, end: usize, url: &str) -> Self {
        Self {
            start,
            end,
            kind: SpanKind::Hyperlink,
            data: Some(SpanData {
                url: Some(url.to_string()),
                target: None,
                label: None,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// oEmbed payload of an embed block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_blocks() {
        let json = r#"[
            {"type": "heading2", "text": "Hooks", "spans": []},
            {"type": "paragraph", "text": "Use state", "spans": [
                {"start": 4, "end": 9, "type": "strong"},
                {"start": 0, "end": 3, "type": "hyperlink", "data": {"link_type": "Web", "url": "https://react.dev"}}
            ]},
            {"type": "image", "url": "https://images.test/a.png", "alt": "diagram", "dimensions": {"width": 10, "height": 10}},
            {"type": "table", "text": ""}
        ]"#;
        let blocks: Vec<RichTextBlock> = serde_json::from_str(json).unwrap();
        assert_eq!(blocks[0].kind.heading_level(), Some(2));
        assert_eq!(blocks[1].spans[0].kind, SpanKind::Strong);
        assert_eq!(
            blocks[1].spans[1].data.as_ref().unwrap().url.as_deref(),
            Some("https://react.dev")
        );
        assert_eq!(blocks[2].kind, BlockKind::Image);
        assert_eq!(blocks[3].kind, BlockKind::Unknown);
    }
}
