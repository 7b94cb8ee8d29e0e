//! Canned-page fetcher for tests. No network, no browser.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::fetch::{FetchMode, Fetcher};

#[derive(Default)]
pub struct MockFetcher {
    static_pages: HashMap<String, String>,
    rendered_pages: HashMap<String, String>,
    fail_rendered: bool,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_static(mut self, url: &str, body: &str) -> Self {
        self.static_pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn with_rendered(mut self, url: &str, body: &str) -> Self {
        self.rendered_pages.insert(url.to_string(), body.to_string());
        self
    }

    /// Every rendered fetch fails, as when the browser runtime is down.
    /// Static pages still serve, so fallback paths can be exercised.
    pub fn failing_rendered(mut self) -> Self {
        self.fail_rendered = true;
        self
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode, _wait_for: Option<&str>) -> Result<String> {
        let page = match mode {
            FetchMode::Rendered => {
                if self.fail_rendered {
                    anyhow::bail!("Rendered fetch failed for {url}: navigation timeout");
                }
                self.rendered_pages.get(url)
            }
            FetchMode::Static => self.static_pages.get(url),
        };
        page.cloned()
            .ok_or_else(|| anyhow::anyhow!("HTTP 404 Not Found for {url}"))
    }
}
