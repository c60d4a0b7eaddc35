//! Rich text to HTML conversion

use serde::Deserialize;

use crate::content::RichTextSpan;
use crate::helpers::html_escape;

/// Converts CMS rich text into markup
pub trait RichTextConverter: Send + Sync {
    fn to_markup(&self, spans: &[RichTextSpan]) -> String;
}

/// Serializer for Prismic structured text.
///
/// Handles paragraphs, headings, preformatted text, list items and images,
/// with `strong`, `em`, `hyperlink` and `label` inline spans. Unknown block
/// types are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlConverter;

#[derive(Debug, Deserialize)]
struct Node {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    spans: Vec<Inline>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    alt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Inline {
    /// UTF-16 offset, inclusive
    start: usize,
    /// UTF-16 offset, exclusive
    end: usize,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl RichTextConverter for HtmlConverter {
    fn to_markup(&self, spans: &[RichTextSpan]) -> String {
        let mut out: Vec<String> = Vec::new();
        let mut open_list: Option<&'static str> = None;

        for span in spans {
            let node = match serde_json::from_value::<Node>(span.raw().clone()) {
                Ok(node) => node,
                Err(e) => {
                    tracing::debug!("Skipping unrecognized rich text element: {}", e);
                    continue;
                }
            };

            let list = match node.kind.as_str() {
                "list-item" => Some("ul"),
                "o-list-item" => Some("ol"),
                _ => None,
            };
            if list != open_list {
                if let Some(tag) = open_list {
                    out.push(format!("</{}>", tag));
                }
                if let Some(tag) = list {
                    out.push(format!("<{}>", tag));
                }
                open_list = list;
            }

            if let Some(html) = render_node(&node) {
                out.push(html);
            }
        }

        if let Some(tag) = open_list {
            out.push(format!("</{}>", tag));
        }

        out.join("\n")
    }
}

fn render_node(node: &Node) -> Option<String> {
    let html = match node.kind.as_str() {
        "paragraph" => format!("<p>{}</p>", render_inline(&node.text, &node.spans)),
        "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
            let level = &node.kind["heading".len()..];
            format!(
                "<h{}>{}</h{}>",
                level,
                render_inline(&node.text, &node.spans),
                level
            )
        }
        "preformatted" => format!("<pre>{}</pre>", html_escape(&node.text)),
        "list-item" | "o-list-item" => {
            format!("<li>{}</li>", render_inline(&node.text, &node.spans))
        }
        "image" => format!(
            r#"<img src="{}" alt="{}">"#,
            html_escape(node.url.as_deref()?),
            html_escape(node.alt.as_deref().unwrap_or(""))
        ),
        other => {
            tracing::debug!("Dropping rich text block of type '{}'", other);
            return None;
        }
    };
    Some(html)
}

/// Apply inline spans to `text`.
///
/// The text is cut at every span boundary and each piece is wrapped in the
/// tags of the spans covering it, outermost first.
fn render_inline(text: &str, spans: &[Inline]) -> String {
    let mut offsets = Vec::new();
    let mut total = 0;
    for c in text.chars() {
        offsets.push((total, c));
        total += c.len_utf16();
    }

    let mut bounds = vec![0, total];
    for span in spans {
        bounds.push(span.start.min(total));
        bounds.push(span.end.min(total));
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut out = String::with_capacity(text.len());
    for window in bounds.windows(2) {
        let (from, to) = (window[0], window[1]);
        let piece: String = offsets
            .iter()
            .filter(|(offset, _)| *offset >= from && *offset < to)
            .map(|(_, c)| *c)
            .collect();
        if piece.is_empty() {
            continue;
        }

        let mut active: Vec<&Inline> = spans
            .iter()
            .filter(|s| s.start < s.end && s.start <= from && s.end >= to)
            .collect();
        active.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        for span in &active {
            out.push_str(&open_tag(span));
        }
        out.push_str(&html_escape(&piece).replace('\n', "<br />"));
        for span in active.iter().rev() {
            out.push_str(close_tag(span));
        }
    }

    out
}

fn open_tag(span: &Inline) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "label" => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.get("label"))
                .and_then(|l| l.as_str())
                .unwrap_or("");
            format!(r#"<span class="{}">"#, html_escape(label))
        }
        "hyperlink" => {
            let data = span.data.as_ref();
            let url = data
                .and_then(|d| d.get("url"))
                .and_then(|u| u.as_str())
                .map(safe_href)
                .unwrap_or("#");
            let blank = data
                .and_then(|d| d.get("target"))
                .and_then(|t| t.as_str())
                == Some("_blank");
            if blank {
                format!(
                    r#"<a href="{}" target="_blank" rel="noopener">"#,
                    html_escape(url)
                )
            } else {
                format!(r#"<a href="{}">"#, html_escape(url))
            }
        }
        _ => String::new(),
    }
}

/// `url` when it is site-relative or uses http, https or mailto, else `#`
fn safe_href(url: &str) -> &str {
    let trimmed = url.trim_start_matches(|c: char| c.is_whitespace() || c.is_control());
    let scheme_end = trimmed.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(at) if trimmed[at..].starts_with(':') => {
            let scheme = trimmed[..at].to_ascii_lowercase();
            if matches!(scheme.as_str(), "http" | "https" | "mailto") {
                url
            } else {
                "#"
            }
        }
        _ => url,
    }
}

fn close_tag(span: &Inline) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "label" => "</span>",
        "hyperlink" => "</a>",
        _ => "",
    }
}
