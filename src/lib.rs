//! spacetraveling: a static blog generator backed by a Prismic repository
//!
//! Listing pages and posts are fetched from the CMS, rendered with embedded
//! Tera templates and written to the public directory. The listing grows
//! page by page through [`listing::ListingLoader`], and each post gets a
//! reading-time estimate from [`render::ArticleRenderer`].

pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod listing;
pub mod render;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::Path;

/// A blog site rooted at a directory
#[derive(Debug, Clone)]
pub struct SpaceTraveling {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: std::path::PathBuf,
    /// Public (output) directory
    pub public_dir: std::path::PathBuf,
    /// Static assets copied verbatim into the output
    pub static_dir: std::path::PathBuf,
}

impl SpaceTraveling {
    /// Open a site directory.
    ///
    /// Reads `_config.yml` when present and applies the CMS environment
    /// variables, loading `.env` from the directory first.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path)?;
            tracing::debug!("Loaded environment from {:?}", env_path);
        }

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No _config.yml in {:?}, using defaults", base_dir);
            config::SiteConfig::default()
        };
        config.cms = config.cms.with_env_overrides();

        let public_dir = base_dir.join(&config.public_dir);
        let static_dir = base_dir.join(&config.static_dir);

        Ok(Self {
            config,
            base_dir,
            public_dir,
            static_dir,
        })
    }

    /// CMS client for one generation run
    pub fn provider(&self) -> Result<cms::PrismicClient> {
        Ok(cms::PrismicClient::new(&self.config.cms)?)
    }

    /// Generate the static site
    pub async fn generate(
        &self,
        cancel: &cms::CancelToken,
    ) -> Result<generator::GenerationReport> {
        commands::generate::run(self, cancel).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}
