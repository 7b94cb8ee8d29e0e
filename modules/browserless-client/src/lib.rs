pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

use serde_json::json;

/// Options controlling a single rendered fetch.
///
/// Browserless launches a fresh, scoped browser session per `/content`
/// request and tears it down when the request completes, times out, or
/// errors. The caller never holds a session handle to leak.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// CSS selector that must appear before content is extracted. When the
    /// page has no reliable structural marker, leave unset and rely on the
    /// settle delay.
    pub wait_for: Option<String>,
    /// Navigation timeout for the whole render.
    pub timeout: Duration,
    /// Settle delay applied when no `wait_for` marker is given, so
    /// late-hydrating scripts get a chance to populate the DOM.
    pub settle: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            wait_for: None,
            timeout: Duration::from_secs(30),
            settle: Duration::from_secs(3),
        }
    }
}

impl RenderOptions {
    pub fn wait_for(selector: impl Into<String>) -> Self {
        Self {
            wait_for: Some(selector.into()),
            ..Self::default()
        }
    }
}

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        }
    }

    /// Fetch fully-rendered HTML for a URL via the Browserless /content
    /// endpoint, waiting for the structural marker (or the settle delay)
    /// before extraction.
    pub async fn content(&self, url: &str, opts: &RenderOptions) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let mut body = json!({
            "url": url,
            "gotoOptions": {
                "timeout": opts.timeout.as_millis() as u64,
                "waitUntil": "networkidle2",
            },
        });
        match &opts.wait_for {
            Some(selector) => {
                body["waitForSelector"] = json!({
                    "selector": selector,
                    "timeout": opts.timeout.as_millis() as u64,
                });
            }
            None => {
                body["waitForTimeout"] = json!(opts.settle.as_millis() as u64);
            }
        }

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            // Browserless reports a selector that never appeared as a 408.
            if status.as_u16() == 408 {
                return Err(BrowserlessError::Timeout(message));
            }
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
