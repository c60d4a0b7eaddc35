//! Content module - articles, listings and rich text as delivered by the CMS

mod article;
mod rich_text;

pub use article::{Article, ArticleContentBlock, ArticleListingPage, ArticleSummary};
pub use rich_text::RichTextSpan;
