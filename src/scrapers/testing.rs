//! In-memory [`PageFetcher`] for tests.

use crate::scrapers::fetch::{FetchError, PageFetcher};
use std::collections::HashMap;
use std::sync::Mutex;

/// Serves canned pages by URL; anything else is a 404.
#[derive(Debug, Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or(FetchError::Status(404))
    }
}
