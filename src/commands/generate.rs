//! Generate static files

use anyhow::Result;

use crate::cms::CancelToken;
use crate::generator::{GenerationReport, Generator};
use crate::SpaceTraveling;

/// Fetch everything from the CMS and write the site
pub async fn run(site: &SpaceTraveling, cancel: &CancelToken) -> Result<GenerationReport> {
    let start = std::time::Instant::now();

    let provider = site.provider()?;
    let generator = Generator::new(site)?;

    tracing::info!("Fetching content from {}", site.config.cms.endpoint());
    let report = generator.generate(&provider, cancel).await?;

    let duration = start.elapsed();
    tracing::info!(
        "Generated {} listing pages and {} posts in {:.2}s",
        report.listing_pages,
        report.posts,
        duration.as_secs_f64()
    );
    if report.skipped_posts > 0 {
        tracing::warn!("Skipped {} posts", report.skipped_posts);
    }

    Ok(report)
}
