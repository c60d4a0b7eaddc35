//! Built-in theme templates using the Tera template engine
//!
//! The templates are embedded in the binary, so a site only needs its
//! `_config.yml` and static assets.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::listing::ListingEntry;

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all theme templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Context values that hold markup are built (and escaped) in Rust;
        // text fields are escaped in the templates with `| escape`.
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("theme/layout.html")),
            ("index.html", include_str!("theme/index.html")),
            ("post.html", include_str!("theme/post.html")),
            (
                "partials/header.html",
                include_str!("theme/partials/header.html"),
            ),
        ])?;

        tera.register_filter("minutes", minutes_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Tera filter: reading time label ("4 min")
fn minutes_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let minutes = tera::try_get_value!("minutes", "value", u64, value);
    Ok(tera::Value::String(format!("{} min", minutes)))
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub root: String,
    pub meta_generator: String,
    /// Logo image tag
    pub logo: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryData {
    #[serde(flatten)]
    pub entry: ListingEntry,
    /// Site-relative path of the post page
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingData {
    pub entries: Vec<EntryData>,
    pub page_number: u32,
    /// "Load more" link, absent on the last reachable page
    pub load_more: Option<String>,
}
