//! Canned remote listing for testing.

use super::RemoteLister;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Remote lister returning a fixed listing (or a fixed failure), counting how
/// often it was asked.
pub struct MockLister {
    listing: Option<String>,
    calls: AtomicUsize,
}

impl MockLister {
    pub fn new(listing: impl Into<String>) -> Self {
        Self {
            listing: Some(listing.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A lister whose server is unreachable.
    pub fn failing() -> Self {
        Self {
            listing: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times [`list`](RemoteLister::list) has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteLister for MockLister {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list(&self) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.listing {
            Some(listing) => Ok(listing.clone()),
            None => exn::bail!(ErrorKind::Unavailable("mock server unreachable".to_string())),
        }
    }
}
