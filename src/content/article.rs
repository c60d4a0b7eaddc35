//! Article and listing models

use serde::{Deserialize, Serialize};

use super::RichTextSpan;

/// A listing row: an article without its body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    /// Stable identifier, unique within a listing (the document UID)
    pub id: String,

    /// First publication timestamp, `None` when not yet published
    pub published_at: Option<String>,

    /// Post title
    pub title: String,

    /// Post subtitle
    pub subtitle: String,

    /// Author name
    pub author: String,
}

/// One page of a listing as returned by the CMS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleListingPage {
    /// Summaries in backend order
    pub items: Vec<ArticleSummary>,

    /// Cursor of the next page, `None` at the end of the results
    pub next_cursor: Option<String>,

    /// Page ordinal reported by the backend
    pub page: u32,
}

impl ArticleListingPage {
    /// Whether another page exists after this one
    pub fn has_next(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// A titled section of an article body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleContentBlock {
    pub heading: String,
    pub body: Vec<RichTextSpan>,
}

/// A fully resolved article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Document UID, used as the post slug
    pub uid: String,

    /// First publication timestamp, `None` when not yet published
    pub published_at: Option<String>,

    pub title: String,
    pub subtitle: String,
    pub author: String,

    /// Banner image URL
    pub banner_url: String,

    /// Body sections in display order
    pub content: Vec<ArticleContentBlock>,
}

impl Article {
    /// Listing projection of this article
    pub fn summary(&self) -> ArticleSummary {
        ArticleSummary {
            id: self.uid.clone(),
            published_at: self.published_at.clone(),
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }
}
