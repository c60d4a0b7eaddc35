//! Content backend and listing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::listing::PaginationPolicy;

/// Prismic repository settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// Repository name, used to derive the API endpoint
    pub repository: String,
    /// Explicit API endpoint; overrides the one derived from `repository`
    pub endpoint: Option<String>,
    /// Custom type of the blog posts
    pub document_type: String,
    /// Number of summaries per listing page
    pub page_size: u32,
    /// Per-request timeout, 0 disables it
    pub timeout_secs: u64,
    /// Regeneration interval of the dev server
    pub revalidate_secs: u64,
    /// Read from PRISMIC_ACCESS_TOKEN, never written back
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            repository: "blog-projeto-zero".to_string(),
            endpoint: None,
            document_type: "custom-post".to_string(),
            page_size: 1,
            timeout_secs: 10,
            revalidate_secs: 60,
            access_token: None,
        }
    }
}

impl CmsConfig {
    /// API v2 endpoint of the repository
    pub fn endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.cdn.prismic.io/api/v2", self.repository),
        }
    }

    /// Request timeout, `None` when `timeout_secs` is 0
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Apply PRISMIC_ACCESS_TOKEN and PRISMIC_ENDPOINT from the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(token) = std::env::var("PRISMIC_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                self.access_token = Some(token.trim().to_string());
            }
        }
        if let Ok(endpoint) = std::env::var("PRISMIC_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.endpoint = Some(endpoint.trim().to_string());
            }
        }
        self
    }
}

/// Listing pagination settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Only allow loading more from the first page (legacy behavior)
    pub first_page_only: bool,
    /// Upper bound on listing pages written by the generator
    pub max_pages: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            first_page_only: false,
            max_pages: 50,
        }
    }
}

impl PaginationConfig {
    pub fn policy(&self) -> PaginationPolicy {
        if self.first_page_only {
            PaginationPolicy::FirstPageOnly
        } else {
            PaginationPolicy::WhileCursor
        }
    }
}
