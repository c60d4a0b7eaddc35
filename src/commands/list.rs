//! List the posts the CMS currently publishes

use anyhow::Result;

use crate::cms::{CancelToken, CmsError, PageDataProvider};
use crate::helpers::DateFormatter;
use crate::listing::{ListingLoader, PaginationPolicy};
use crate::SpaceTraveling;

/// Print the listing, following the cursor when `all` is set
pub async fn run(site: &SpaceTraveling, all: bool, cancel: &CancelToken) -> Result<()> {
    let provider = site.provider()?;
    let formatter = DateFormatter::from_config(&site.config)?;
    let policy = site.config.pagination.policy();
    let max_pages = if all {
        site.config.pagination.max_pages
    } else {
        1
    };

    let loader = collect(&provider, formatter, policy, max_pages, cancel).await?;
    for line in format_listing(&loader) {
        println!("{}", line);
    }

    Ok(())
}

/// Build a loader from the first page and load until it stops or holds
/// `max_pages` pages.
///
/// A backend that hands back the cursor it was just asked for ends the walk.
pub async fn collect<P>(
    provider: &P,
    formatter: DateFormatter,
    policy: PaginationPolicy,
    max_pages: usize,
    cancel: &CancelToken,
) -> Result<ListingLoader, CmsError>
where
    P: PageDataProvider + ?Sized,
{
    let first = provider.first_page(cancel).await?;
    let mut loader = ListingLoader::initialize(first, formatter, policy);

    let mut pages = 1;
    while pages < max_pages && loader.can_load_more() {
        let requested = loader.cursor().map(str::to_string);
        loader.load_more(provider, cancel).await?;
        pages += 1;

        if loader.cursor().is_some() && loader.cursor() == requested.as_deref() {
            tracing::warn!("Backend repeated cursor {:?}, stopping", requested);
            break;
        }
    }

    Ok(loader)
}

fn format_listing(loader: &ListingLoader) -> Vec<String> {
    let mut lines = vec![format!("Posts ({}):", loader.items().len())];

    for entry in loader.items() {
        lines.push(format!(
            "  {}  {} [{}] by {}",
            entry.published_at, entry.title, entry.id, entry.author
        ));
    }

    if loader.has_more() {
        if loader.can_load_more() {
            lines.push("  ... more posts available (use --all)".to_string());
        } else {
            lines.push("  ... more posts available, pagination stops here".to_string());
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ArticleListingPage;
    use crate::listing::testing::{summary, FakeProvider};

    fn provider() -> FakeProvider {
        FakeProvider {
            first: Some(ArticleListingPage {
                items: vec![summary("a", Some("2021-03-25T19:25:28+0000"))],
                next_cursor: Some("c2".to_string()),
                page: 1,
            }),
            ..Default::default()
        }
        .with_page(
            "c2",
            ArticleListingPage {
                items: vec![summary("b", None)],
                next_cursor: None,
                page: 2,
            },
        )
    }

    #[tokio::test]
    async fn test_collect_first_page_only() {
        let provider = provider();
        let loader = collect(
            &provider,
            DateFormatter::default(),
            PaginationPolicy::WhileCursor,
            1,
            &CancelToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(loader.items().len(), 1);
        assert_eq!(provider.page_calls(), 0);

        let lines = format_listing(&loader);
        assert_eq!(lines[0], "Posts (1):");
        assert_eq!(lines[1], "  25 mar 2021  Title a [a] by X");
        assert_eq!(lines[2], "  ... more posts available (use --all)");
    }

    #[tokio::test]
    async fn test_collect_all() {
        let provider = provider();
        let loader = collect(
            &provider,
            DateFormatter::default(),
            PaginationPolicy::WhileCursor,
            50,
            &CancelToken::new(),
        )
        .await
        .unwrap();

        let ids: Vec<_> = loader.items().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
        assert_eq!(provider.page_calls(), 1);

        let lines = format_listing(&loader);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "  date unavailable  Title b [b] by X");
    }

    #[tokio::test]
    async fn test_collect_all_respects_first_page_only() {
        let provider = provider();
        let loader = collect(
            &provider,
            DateFormatter::default(),
            PaginationPolicy::FirstPageOnly,
            50,
            &CancelToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(loader.items().len(), 2);
        assert_eq!(provider.page_calls(), 1);
    }

    #[tokio::test]
    async fn test_collect_propagates_failure() {
        let provider = provider();
        provider.fail_next(CmsError::Timeout(std::time::Duration::from_secs(10)));
        let result = collect(
            &provider,
            DateFormatter::default(),
            PaginationPolicy::WhileCursor,
            50,
            &CancelToken::new(),
        )
        .await;

        assert!(matches!(result, Err(CmsError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_collect_stops_on_repeated_cursor() {
        let provider = provider().with_page(
            "c2",
            ArticleListingPage {
                items: vec![summary("b", None)],
                next_cursor: Some("c2".to_string()),
                page: 2,
            },
        );
        let loader = collect(
            &provider,
            DateFormatter::default(),
            PaginationPolicy::WhileCursor,
            50,
            &CancelToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(loader.items().len(), 2);
        assert_eq!(provider.page_calls(), 1);
    }

    #[tokio::test]
    async fn test_collect_respects_max_pages() {
        let provider = provider()
            .with_page(
                "c2",
                ArticleListingPage {
                    items: vec![summary("b", None)],
                    next_cursor: Some("c3".to_string()),
                    page: 2,
                },
            )
            .with_page(
                "c3",
                ArticleListingPage {
                    items: vec![summary("c", None)],
                    next_cursor: Some("c4".to_string()),
                    page: 3,
                },
            );
        let loader = collect(
            &provider,
            DateFormatter::default(),
            PaginationPolicy::WhileCursor,
            2,
            &CancelToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(loader.items().len(), 2);
        assert_eq!(provider.page_calls(), 1);
        assert!(loader.has_more());
    }
}
