//! Listing loader - the visible article list and its "load more" cursor

use serde::Serialize;

use crate::cms::{CancelToken, CmsError, PageDataProvider};
use crate::content::{ArticleListingPage, ArticleSummary};
use crate::helpers::DateFormatter;

/// When `load_more` is allowed to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationPolicy {
    /// Load only while still on the first page, so at most two pages are
    /// ever shown
    FirstPageOnly,
    /// Load whenever a cursor is available
    #[default]
    WhileCursor,
}

/// A summary as displayed in the listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingEntry {
    pub id: String,
    /// Display date ("10 jan 2022") or the unavailable label
    pub published_at: String,
    /// ISO date for `<time datetime>`, when known
    pub published_at_iso: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// Result of a `load_more` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was fetched: no cursor, or the policy forbids another load
    Skipped,
    /// A page was fetched and `added` entries appended
    Loaded { added: usize },
}

/// Owns the entries of one listing view and its pagination state.
///
/// State only changes after a page has been fetched and converted, so a
/// failed or cancelled load leaves the entries, cursor and page number as
/// they were.
#[derive(Debug, Clone)]
pub struct ListingLoader {
    items: Vec<ListingEntry>,
    cursor: Option<String>,
    page_number: u32,
    policy: PaginationPolicy,
    formatter: DateFormatter,
    error: Option<String>,
}

impl ListingLoader {
    /// Start a listing from its first page
    pub fn initialize(
        first_page: ArticleListingPage,
        formatter: DateFormatter,
        policy: PaginationPolicy,
    ) -> Self {
        let items = format_entries(&formatter, &first_page.items);
        tracing::debug!(
            "Listing initialized with {} entries (more: {})",
            items.len(),
            first_page.next_cursor.is_some()
        );

        Self {
            items,
            cursor: first_page.next_cursor,
            page_number: 1,
            policy,
            formatter,
            error: None,
        }
    }

    /// Fetch the page at the cursor and append it.
    ///
    /// A no-op returning [`LoadOutcome::Skipped`] when [`can_load_more`]
    /// is false; no request is issued in that case.
    ///
    /// [`can_load_more`]: ListingLoader::can_load_more
    pub async fn load_more<P>(
        &mut self,
        provider: &P,
        cancel: &CancelToken,
    ) -> Result<LoadOutcome, CmsError>
    where
        P: PageDataProvider + ?Sized,
    {
        if !self.can_load_more() {
            return Ok(LoadOutcome::Skipped);
        }
        let Some(cursor) = self.cursor.as_deref() else {
            return Ok(LoadOutcome::Skipped);
        };

        let page = match provider.page(cursor, cancel).await {
            Ok(page) => page,
            Err(CmsError::Cancelled) => {
                tracing::debug!("Load more cancelled on page {}", self.page_number);
                return Err(CmsError::Cancelled);
            }
            Err(e) => {
                tracing::warn!("Failed to load page after {}: {}", self.page_number, e);
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        let added = format_entries(&self.formatter, &page.items);
        let count = added.len();

        self.items.extend(added);
        self.cursor = page.next_cursor;
        self.page_number = page.page;
        self.error = None;

        tracing::debug!(
            "Loaded page {} with {} entries (more: {})",
            self.page_number,
            count,
            self.cursor.is_some()
        );

        Ok(LoadOutcome::Loaded { added: count })
    }

    /// Entries loaded so far, in load order
    pub fn items(&self) -> &[ListingEntry] {
        &self.items
    }

    /// Whether the backend reported a further page
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// Whether `load_more` would fetch
    pub fn can_load_more(&self) -> bool {
        let allowed = match self.policy {
            PaginationPolicy::FirstPageOnly => self.page_number == 1,
            PaginationPolicy::WhileCursor => true,
        };
        allowed && self.cursor.is_some()
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Message of the last failed load, cleared by the next successful one
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

fn format_entries(formatter: &DateFormatter, summaries: &[ArticleSummary]) -> Vec<ListingEntry> {
    summaries
        .iter()
        .map(|summary| ListingEntry {
            id: summary.id.clone(),
            published_at: formatter.format(summary.published_at.as_deref()),
            published_at_iso: formatter.date_xml(summary.published_at.as_deref()),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
        })
        .collect()
}
