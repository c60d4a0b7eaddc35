//! Opaque rich-text spans

use serde::{Deserialize, Serialize};

/// One element of a rich-text field.
///
/// The structure belongs to the CMS; only the plain text is read here, for
/// word counting. Converting spans to markup is the job of a
/// [`RichTextConverter`](crate::render::RichTextConverter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichTextSpan(serde_json::Value);

impl RichTextSpan {
    /// Span carrying only plain text
    pub fn text_only(text: &str) -> Self {
        Self(serde_json::json!({ "type": "paragraph", "text": text, "spans": [] }))
    }

    /// Plain text of the span, empty when it has none
    pub fn text(&self) -> &str {
        self.0.get("text").and_then(|t| t.as_str()).unwrap_or("")
    }

    /// Raw CMS representation
    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for RichTextSpan {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
