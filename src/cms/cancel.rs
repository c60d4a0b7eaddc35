//! Cooperative cancellation for in-flight CMS requests

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use super::CmsError;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Shared flag that aborts requests waiting on the CMS.
///
/// Clones observe the same state. Once cancelled a token stays cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }

    /// Run `fut` unless the token is cancelled first
    pub async fn run<F, T>(&self, fut: F) -> Result<T, CmsError>
    where
        F: Future<Output = Result<T, CmsError>>,
    {
        if self.is_cancelled() {
            return Err(CmsError::Cancelled);
        }
        tokio::select! {
            _ = self.cancelled() => Err(CmsError::Cancelled),
            result = fut => result,
        }
    }
}
