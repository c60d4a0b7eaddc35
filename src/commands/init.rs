//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: America/Sao_Paulo

# URL
url: http://localhost:4000
root: /

# Directory
public_dir: public
static_dir: static

# Text
date_unavailable: date unavailable
load_more_label: Carregar mais posts

# Prismic
cms:
  repository: blog-projeto-zero
  document_type: custom-post
  page_size: 1
  timeout_secs: 10
  revalidate_secs: 60

# Listing
pagination:
  first_page_only: false
  max_pages: 50
"#;

const ENV_EXAMPLE: &str = r#"# Prismic API endpoint, overrides cms.repository
PRISMIC_ENDPOINT=https://blog-projeto-zero.cdn.prismic.io/api/v2
# Permanent access token for private repositories
PRISMIC_ACCESS_TOKEN=
"#;

const LOGO: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="239" height="27" viewBox="0 0 239 27">
  <text x="0" y="22" font-family="Inter, sans-serif" font-size="24" font-weight="700" fill="#F8F8F8">spacetraveling<tspan fill="#FF57B2">.</tspan></text>
</svg>
"##;

const STYLE: &str = r#"body {
  margin: 0;
  background: #1a1d23;
  color: #f8f8f8;
  font-family: Inter, sans-serif;
}

a {
  color: inherit;
  text-decoration: none;
}

.header, .container, .post {
  max-width: 720px;
  margin: 0 auto;
  padding: 0 1rem;
}

.header {
  padding-top: 4rem;
}

.listing .post {
  display: block;
  margin-top: 3rem;
  padding: 0;
}

.details {
  display: flex;
  gap: 1.5rem;
  color: #bbbbbb;
  font-size: 0.875rem;
}

.load-more {
  display: inline-block;
  margin: 4rem 0;
  color: #ff57b2;
  font-weight: 600;
}

.post-container > img {
  width: 100%;
  max-height: 400px;
  object-fit: cover;
}

.block h2 {
  font-size: 2.25rem;
}
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("static/images"))?;
    fs::create_dir_all(target_dir.join("static/css"))?;

    write_if_missing(&target_dir.join("_config.yml"), CONFIG)?;
    write_if_missing(&target_dir.join(".env.example"), ENV_EXAMPLE)?;
    write_if_missing(&target_dir.join("static/images/logo.svg"), LOGO)?;
    write_if_missing(&target_dir.join("static/css/style.css"), STYLE)?;

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::warn!("{:?} already exists, leaving it untouched", path);
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::debug!("Created {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn test_init_site() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        assert!(dir.path().join(".env.example").exists());
        assert!(dir.path().join("static/images/logo.svg").exists());
        assert!(dir.path().join("static/css/style.css").exists());

        let config = SiteConfig::load(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config.title, "spacetraveling");
        assert_eq!(config.cms.page_size, 1);
        assert_eq!(config.cms.revalidate_secs, 60);
        assert!(!config.pagination.first_page_only);
    }

    #[test]
    fn test_init_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: Mine\n").unwrap();
        init_site(dir.path()).unwrap();

        let config = fs::read_to_string(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config, "title: Mine\n");
    }
}
