//! HTML helper functions

use super::url::url_for;
use crate::config::SiteConfig;

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//")
}

/// Generate an anchor tag
///
/// # Examples
/// ```ignore
/// link_to(&config, "page/2/", "Carregar mais posts", Some("load-more"))
/// // -> <a href="/page/2/" class="load-more">Carregar mais posts</a>
/// ```
pub fn link_to(config: &SiteConfig, path: &str, text: &str, class: Option<&str>) -> String {
    let href = if is_absolute(path) {
        path.to_string()
    } else {
        url_for(config, path)
    };

    let class_attr = class
        .map(|c| format!(r#" class="{}""#, html_escape(c)))
        .unwrap_or_default();

    if is_absolute(path) {
        format!(
            r#"<a href="{}"{} target="_blank" rel="noopener">{}</a>"#,
            html_escape(&href),
            class_attr,
            html_escape(text)
        )
    } else {
        format!(
            r#"<a href="{}"{}>{}</a>"#,
            html_escape(&href),
            class_attr,
            html_escape(text)
        )
    }
}

/// Generate an image tag
///
/// # Examples
/// ```ignore
/// image_tag(&config, "/images/logo.svg", Some("logo"))
/// ```
pub fn image_tag(config: &SiteConfig, path: &str, alt: Option<&str>) -> String {
    let src = if is_absolute(path) {
        path.to_string()
    } else {
        url_for(config, path)
    };

    format!(
        r#"<img src="{}" alt="{}">"#,
        html_escape(&src),
        html_escape(alt.unwrap_or(""))
    )
}

/// Generate meta generator tag
pub fn meta_generator() -> String {
    format!(
        r#"<meta name="generator" content="spacetraveling {}">"#,
        env!("CARGO_PKG_VERSION")
    )
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
