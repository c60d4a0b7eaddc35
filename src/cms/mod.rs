//! Page data provider - fetches listings and articles from the CMS

mod cancel;
mod error;
mod prismic;

use async_trait::async_trait;

use crate::content::{Article, ArticleListingPage};

pub use cancel::CancelToken;
pub use error::CmsError;
pub use prismic::PrismicClient;

/// Source of listing pages and articles
#[async_trait]
pub trait PageDataProvider: Send + Sync {
    /// First page of the listing
    async fn first_page(&self, cancel: &CancelToken) -> Result<ArticleListingPage, CmsError>;

    /// Page identified by a cursor returned with a previous page
    async fn page(&self, cursor: &str, cancel: &CancelToken)
        -> Result<ArticleListingPage, CmsError>;

    /// Full article by its UID
    async fn article(&self, uid: &str, cancel: &CancelToken) -> Result<Article, CmsError>;
}
