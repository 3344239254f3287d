//! Default rich text to HTML serializer

use super::{BlockKind, CodeHighlighter, RichTextBlock, RichTextRenderer, Span, SpanKind};
use crate::helpers::html_escape;

/// Serializes rich text blocks to HTML.
///
/// Consecutive list items are grouped into one `<ul>`/`<ol>`, spans may
/// overlap arbitrarily and always produce well-nested tags, and labelled
/// preformatted blocks are syntax highlighted when a highlighter is set.
#[derive(Default)]
pub struct HtmlSerializer {
    highlighter: Option<CodeHighlighter>,
}

impl HtmlSerializer {
    pub fn new() -> Self {
        Self { highlighter: None }
    }

    /// Highlight preformatted blocks whose label names a language
    pub fn with_highlighter(highlighter: CodeHighlighter) -> Self {
        Self {
            highlighter: Some(highlighter),
        }
    }

    fn render_block(&self, block: &RichTextBlock) -> String {
        if let Some(level) = block.kind.heading_level() {
            return format!(
                "<h{}>{}</h{}>",
                level,
                render_spans(&block.text, &block.spans),
                level
            );
        }

        match block.kind {
            BlockKind::Preformatted => match (&self.highlighter, block.label.as_deref()) {
                (Some(highlighter), Some(lang)) => highlighter.highlight(&block.text, lang),
                _ => format!("<pre>{}</pre>", html_escape(&block.text)),
            },
            BlockKind::ListItem | BlockKind::OrderedListItem => {
                format!("<li>{}</li>", render_spans(&block.text, &block.spans))
            }
            BlockKind::Image => match block.url.as_deref() {
                Some(url) if !url.is_empty() => format!(
                    r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                    html_escape(url),
                    html_escape(block.alt.as_deref().unwrap_or(""))
                ),
                _ => String::new(),
            },
            BlockKind::Embed => match &block.oembed {
                Some(embed) => format!(
                    r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
                    html_escape(embed.embed_url.as_deref().unwrap_or("")),
                    html_escape(embed.kind.as_deref().unwrap_or("")),
                    html_escape(embed.provider_name.as_deref().unwrap_or("")),
                    embed.html.as_deref().unwrap_or("")
                ),
                None => String::new(),
            },
            _ => format!("<p>{}</p>", render_spans(&block.text, &block.spans)),
        }
    }
}

impl RichTextRenderer for HtmlSerializer {
    fn render(&self, blocks: &[RichTextBlock]) -> String {
        let mut html = String::new();
        let mut open_list: Option<BlockKind> = None;

        for block in blocks {
            let list = match block.kind {
                BlockKind::ListItem | BlockKind::OrderedListItem => Some(block.kind),
                _ => None,
            };

            if open_list != list {
                if let Some(kind) = open_list {
                    html.push_str(list_tag(kind, true));
                }
                if let Some(kind) = list {
                    html.push_str(list_tag(kind, false));
                }
                open_list = list;
            }

            html.push_str(&self.render_block(block));
        }

        if let Some(kind) = open_list {
            html.push_str(list_tag(kind, true));
        }

        html
    }
}

fn list_tag(kind: BlockKind, close: bool) -> &'static str {
    match (kind, close) {
        (BlockKind::OrderedListItem, false) => "<ol>",
        (BlockKind::OrderedListItem, true) => "</ol>",
        (_, false) => "<ul>",
        (_, true) => "</ul>",
    }
}

fn open_tag(span: &Span) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => {
            let data = span.data.as_ref();
            let url = data.and_then(|d| d.url.as_deref()).unwrap_or("#");
            match data.and_then(|d| d.target.as_deref()) {
                Some(target) => format!(
                    r#"<a href="{}" target="{}" rel="noopener">"#,
                    html_escape(url),
                    html_escape(target)
                ),
                None => format!(r#"<a href="{}">"#, html_escape(url)),
            }
        }
        SpanKind::Label => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.label.as_deref())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        SpanKind::Unknown => "<span>".to_string(),
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind {
        SpanKind::Strong => "</strong>",
        SpanKind::Em => "</em>",
        SpanKind::Hyperlink => "</a>",
        SpanKind::Label | SpanKind::Unknown => "</span>",
    }
}

fn push_text(html: &mut String, chars: &[char]) {
    let text: String = chars.iter().collect();
    html.push_str(&html_escape(&text).replace('\n', "<br />"));
}

/// Render text with its spans applied. Offsets are character offsets.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let end_of = |span: &Span| span.end.min(len);

    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();
    // Outer spans open first
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut boundaries: Vec<usize> = spans
        .iter()
        .flat_map(|s| [s.start, end_of(*s)])
        .chain([0, len])
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    let mut html = String::new();
    let mut stack: Vec<&Span> = Vec::new();
    let mut pending = spans.into_iter().peekable();

    for (i, &pos) in boundaries.iter().enumerate() {
        // Close everything down to the deepest span ending here, then
        // reopen the ones that continue past this point.
        let closing = stack.iter().position(|s| end_of(*s) <= pos);
        if let Some(depth) = closing {
            let mut reopen = Vec::new();
            while stack.len() > depth {
                if let Some(span) = stack.pop() {
                    html.push_str(close_tag(span));
                    if end_of(span) > pos {
                        reopen.push(span);
                    }
                }
            }
            for span in reopen.into_iter().rev() {
                html.push_str(&open_tag(span));
                stack.push(span);
            }
        }

        while let Some(span) = pending.next_if(|s| s.start == pos) {
            html.push_str(&open_tag(span));
            stack.push(span);
        }

        if let Some(&next) = boundaries.get(i + 1) {
            push_text(&mut html, &chars[pos..next]);
        }
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::SpanData;

    fn render(blocks: &[RichTextBlock]) -> String {
        HtmlSerializer::new().render(blocks)
    }

    #[test]
    fn test_paragraph_and_heading() {
        let html = render(&[
            RichTextBlock::with_kind(BlockKind::Heading2, "Title"),
            RichTextBlock::paragraph("a < b"),
        ]);
        assert_eq!(html, "<h2>Title</h2><p>a &lt; b</p>");
    }

    #[test]
    fn test_line_breaks() {
        let html = render(&[RichTextBlock::paragraph("one\ntwo")]);
        assert_eq!(html, "<p>one<br />two</p>");
    }

    #[test]
    fn test_spans() {
        let block = RichTextBlock::paragraph("Read the docs now")
            .span(Span::new(SpanKind::Strong, 0, 4))
            .span(Span::link(9, 13, "https://docs.test"));
        assert_eq!(
            render(&[block]),
            r#"<p><strong>Read</strong> the <a href="https://docs.test">docs</a> now</p>"#
        );
    }

    #[test]
    fn test_nested_spans() {
        let block = RichTextBlock::paragraph("bold italic")
            .span(Span::new(SpanKind::Strong, 0, 11))
            .span(Span::new(SpanKind::Em, 5, 11));
        assert_eq!(
            render(&[block]),
            "<p><strong>bold <em>italic</em></strong></p>"
        );
    }

    #[test]
    fn test_overlapping_spans_stay_well_nested() {
        let block = RichTextBlock::paragraph("abcdef")
            .span(Span::new(SpanKind::Strong, 0, 4))
            .span(Span::new(SpanKind::Em, 2, 6));
        assert_eq!(
            render(&[block]),
            "<p><strong>ab<em>cd</em></strong><em>ef</em></p>"
        );
    }

    #[test]
    fn test_span_past_end_is_clamped() {
        let block = RichTextBlock::paragraph("café").span(Span::new(SpanKind::Em, 2, 40));
        assert_eq!(render(&[block]), "<p>ca<em>fé</em></p>");
    }

    #[test]
    fn test_label_and_target() {
        let block = RichTextBlock::paragraph("note link")
            .span(Span {
                start: 0,
                end: 4,
                kind: SpanKind::Label,
                data: Some(SpanData {
                    url: None,
                    target: None,
                    label: Some("highlight".to_string()),
                }),
            })
            .span(Span {
                start: 5,
                end: 9,
                kind: SpanKind::Hyperlink,
                data: Some(SpanData {
                    url: Some("https://x.test".to_string()),
                    target: Some("_blank".to_string()),
                    label: None,
                }),
            });
        assert_eq!(
            render(&[block]),
            r#"<p><span class="highlight">note</span> <a href="https://x.test" target="_blank" rel="noopener">link</a></p>"#
        );
    }

    #[test]
    fn test_list_grouping() {
        let html = render(&[
            RichTextBlock::with_kind(BlockKind::ListItem, "a"),
            RichTextBlock::with_kind(BlockKind::ListItem, "b"),
            RichTextBlock::with_kind(BlockKind::OrderedListItem, "c"),
            RichTextBlock::paragraph("d"),
        ]);
        assert_eq!(
            html,
            "<ul><li>a</li><li>b</li></ul><ol><li>c</li></ol><p>d</p>"
        );
    }

    #[test]
    fn test_image_block() {
        let mut block = RichTextBlock::with_kind(BlockKind::Image, "");
        block.url = Some("https://images.test/a.png".to_string());
        block.alt = Some("A \"quoted\" alt".to_string());
        assert_eq!(
            render(&[block]),
            r#"<p class="block-img"><img src="https://images.test/a.png" alt="A &quot;quoted&quot; alt" /></p>"#
        );
    }

    #[test]
    fn test_preformatted_without_highlighter() {
        let mut block = RichTextBlock::with_kind(BlockKind::Preformatted, "let x = 1 < 2;");
        block.label = Some("rust".to_string());
        assert_eq!(render(&[block]), "<pre>let x = 1 &lt; 2;</pre>");
    }

    #[test]
    fn test_unknown_block_renders_as_paragraph() {
        let block = RichTextBlock::with_kind(BlockKind::Unknown, "legacy");
        assert_eq!(render(&[block]), "<p>legacy</p>");
    }
}
