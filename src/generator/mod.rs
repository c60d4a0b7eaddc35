//! Generator module - renders the listing and post pages to static HTML

use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tera::Context;
use walkdir::WalkDir;

use crate::cms::{CancelToken, CmsError, PageDataProvider};
use crate::content::Article;
use crate::helpers::{
    full_url_for, html_escape, image_tag, link_to, listing_path, meta_generator, post_path, url_for,
    DateFormatter,
};
use crate::listing::{ListingLoader, LoadOutcome};
use crate::render::ArticleRenderer;
use crate::templates::{EntryData, ListingData, SiteData, TemplateRenderer};
use crate::SpaceTraveling;

/// What a generation run wrote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationReport {
    pub listing_pages: usize,
    pub posts: usize,
    pub skipped_posts: usize,
}

/// Static site generator using Tera templates
pub struct Generator {
    site: SpaceTraveling,
    renderer: TemplateRenderer,
    articles: ArticleRenderer,
    dates: DateFormatter,
}

impl Generator {
    /// Create a new generator
    pub fn new(site: &SpaceTraveling) -> Result<Self> {
        let dates = DateFormatter::from_config(&site.config)?;
        Ok(Self {
            site: site.clone(),
            renderer: TemplateRenderer::new()?,
            articles: ArticleRenderer::new(dates.clone()),
            dates,
        })
    }

    /// Generate the entire site from `provider`.
    ///
    /// Pages are rendered into a staging directory next to `public_dir`,
    /// which replaces `public_dir` only when the whole run succeeds. A failed
    /// run leaves the previous output in place.
    pub async fn generate<P>(&self, provider: &P, cancel: &CancelToken) -> Result<GenerationReport>
    where
        P: PageDataProvider + ?Sized,
    {
        let parent = self.output_parent();
        fs::create_dir_all(parent)?;
        let staging = tempfile::Builder::new()
            .prefix(".spacetraveling-staging-")
            .tempdir_in(parent)
            .with_context(|| format!("Failed to create staging dir in {:?}", parent))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(staging.path(), fs::Permissions::from_mode(0o755))?;
        }

        let report = self.render_into(staging.path(), provider, cancel).await?;
        self.publish(staging)?;

        Ok(report)
    }

    async fn render_into<P>(
        &self,
        out: &Path,
        provider: &P,
        cancel: &CancelToken,
    ) -> Result<GenerationReport>
    where
        P: PageDataProvider + ?Sized,
    {
        self.copy_static_assets(out)?;

        let site_data = self.build_site_data();
        let mut report = GenerationReport::default();

        let first_page = provider
            .first_page(cancel)
            .await
            .context("Failed to fetch the first listing page")?;
        let mut loader = ListingLoader::initialize(
            first_page,
            self.dates.clone(),
            self.site.config.pagination.policy(),
        );

        let max_pages = self.site.config.pagination.max_pages.max(1);
        let mut step = 1;
        self.write_listing_page(out, &loader, step, step < max_pages, &site_data)?;
        report.listing_pages += 1;

        let mut retried = false;
        while step < max_pages && loader.can_load_more() {
            match loader.load_more(provider, cancel).await {
                Ok(LoadOutcome::Loaded { added }) => {
                    retried = false;
                    step += 1;
                    tracing::debug!("Listing step {} added {} entries", step, added);
                    self.write_listing_page(out, &loader, step, step < max_pages, &site_data)?;
                    report.listing_pages += 1;
                }
                Ok(LoadOutcome::Skipped) => break,
                Err(e) if e.is_retryable() && !retried => {
                    tracing::warn!("Retrying listing page after step {}: {}", step, e);
                    retried = true;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to load listing page after step {}", step)
                    })
                }
            }
        }
        tracing::info!(
            "Generated {} listing pages with {} entries",
            report.listing_pages,
            loader.items().len()
        );

        let mut seen = HashSet::new();
        for entry in loader.items() {
            if !seen.insert(entry.id.as_str()) {
                continue;
            }
            if !is_safe_segment(&entry.id) {
                tracing::warn!("Skipping post with unusable id {:?}", entry.id);
                report.skipped_posts += 1;
                continue;
            }

            let article = match provider.article(&entry.id, cancel).await {
                Ok(article) => article,
                Err(CmsError::NotFound(uid)) => {
                    tracing::warn!("Post {} is listed but could not be found", uid);
                    report.skipped_posts += 1;
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to fetch post {}", entry.id))
                }
            };

            self.write_post_page(out, &article, &entry.id, &site_data)?;
            report.posts += 1;
        }
        tracing::info!("Generated {} post pages", report.posts);

        Ok(report)
    }

    /// Build site data for templates
    fn build_site_data(&self) -> SiteData {
        let config = &self.site.config;
        SiteData {
            title: config.title.clone(),
            description: config.description.clone(),
            language: config.language.clone(),
            root: url_for(config, ""),
            meta_generator: meta_generator(),
            logo: image_tag(config, "images/logo.svg", Some("logo")),
        }
    }

    /// Write the listing as it stands after `step` loads
    fn write_listing_page(
        &self,
        out: &Path,
        loader: &ListingLoader,
        step: usize,
        more_allowed: bool,
        site_data: &SiteData,
    ) -> Result<()> {
        let config = &self.site.config;
        let entries = loader
            .items()
            .iter()
            .map(|entry| EntryData {
                entry: entry.clone(),
                path: post_path(&entry.id),
            })
            .collect();

        let load_more = (more_allowed && loader.can_load_more()).then(|| {
            link_to(
                config,
                &listing_path(step + 1),
                &config.load_more_label,
                Some("load-more"),
            )
        });

        let mut context = Context::new();
        context.insert("site", site_data);
        context.insert(
            "listing",
            &ListingData {
                entries,
                page_number: loader.page_number(),
                load_more,
            },
        );

        context.insert(
            "canonical",
            &html_escape(&full_url_for(config, &listing_path(step))),
        );

        let html = self.renderer.render("index.html", &context)?;
        let output_path = out.join(listing_path(step)).join("index.html");
        write_file(&output_path, &html)?;
        tracing::debug!("Generated: {:?}", output_path);

        Ok(())
    }

    /// Render one post page under `post/{slug}/`
    fn write_post_page(
        &self,
        out: &Path,
        article: &Article,
        slug: &str,
        site_data: &SiteData,
    ) -> Result<()> {
        let rendered = self.articles.render(article);
        let banner = if rendered.banner_url.is_empty() {
            String::new()
        } else {
            image_tag(&self.site.config, &rendered.banner_url, Some("banner"))
        };

        let mut context = Context::new();
        context.insert("site", site_data);
        context.insert("post", &rendered);
        context.insert("banner", &banner);
        context.insert(
            "canonical",
            &html_escape(&full_url_for(&self.site.config, &post_path(slug))),
        );

        let html = self.renderer.render("post.html", &context)?;
        let output_path = out.join("post").join(slug).join("index.html");
        write_file(&output_path, &html)?;
        tracing::debug!("Generated post: {:?}", output_path);

        Ok(())
    }

    /// Directory holding `public_dir`, where staging happens
    fn output_parent(&self) -> &Path {
        self.site
            .public_dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(self.site.base_dir.as_path())
    }

    /// Replace `public_dir` with the finished staging directory
    fn publish(&self, staging: tempfile::TempDir) -> Result<()> {
        let public = &self.site.public_dir;
        let retired = tempfile::Builder::new()
            .prefix(".spacetraveling-retired-")
            .tempdir_in(self.output_parent())?;
        let previous = retired.path().join("public");

        if public.exists() {
            fs::rename(public, &previous)
                .with_context(|| format!("Failed to move {:?} aside", public))?;
        }
        if let Err(e) = fs::rename(staging.path(), public) {
            if previous.exists() {
                fs::rename(&previous, public)?;
            }
            return Err(e).with_context(|| format!("Failed to publish into {:?}", public));
        }
        tracing::debug!("Published {:?}", public);

        // `retired` removes the previous output when dropped
        Ok(())
    }

    /// Copy static assets (logo, stylesheets) to the output directory
    fn copy_static_assets(&self, out: &Path) -> Result<()> {
        let static_dir = &self.site.static_dir;
        if !static_dir.exists() {
            tracing::debug!("No static directory at {:?}", static_dir);
            return Ok(());
        }

        let mut copied = 0;
        for entry in WalkDir::new(static_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(static_dir)?;
            let dest = out.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(path, &dest)?;
            copied += 1;
        }
        tracing::debug!("Copied {} static files", copied);

        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;
    }
    fs::write(path, content).map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", path, e))
}

/// Whether `id` can be used as a single directory name
fn is_safe_segment(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}
