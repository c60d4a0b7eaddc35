use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CmsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("repository has no master ref")]
    NoMasterRef,

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,
}

impl CmsError {
    /// Whether the same request may succeed when tried again
    pub fn is_retryable(&self) -> bool {
        match self {
            CmsError::Http(_) | CmsError::Timeout(_) => true,
            CmsError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
