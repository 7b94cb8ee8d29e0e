use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;
use tracing::{info, warn};

use browserless_client::{BrowserlessClient, RenderOptions};

/// Max concurrent rendered sessions. Each one ties up a full browser page
/// on the Browserless deployment.
const MAX_CONCURRENT_RENDERED: usize = 2;

/// Max attempts for transient static-fetch failures (429, connection reset).
const STATIC_MAX_ATTEMPTS: u32 = 3;
/// Base backoff for static-fetch retries. Actual delay is base * 2^attempt
/// plus random jitter (0-500ms).
const STATIC_RETRY_BASE: Duration = Duration::from_secs(2);

/// Minimum spacing between requests to the same origin. A per-origin
/// throttle, not a global lock: adapters hitting different sites proceed
/// independently.
const MIN_ORIGIN_DELAY: Duration = Duration::from_secs(2);

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0 Safari/537.36";

/// How a source's pages are retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Direct HTTP GET with browser-like headers.
    Static,
    /// Full browser render (JavaScript executed) before extraction.
    Rendered,
}

/// Content acquisition for adapters. One trait so tests can swap in a
/// canned-page mock: no network, no browser.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch page content. `wait_for` is the structural marker a rendered
    /// fetch should wait on; ignored in static mode.
    async fn fetch(&self, url: &str, mode: FetchMode, wait_for: Option<&str>) -> Result<String>;
}

/// Fetch a JavaScript-dependent page, degrading to a static fetch when the
/// render fails or comes back empty. Adapters for JS-heavy sources call
/// this instead of `fetch` directly; a degraded (possibly empty) result is
/// preferred over failing the source's whole collection.
pub async fn fetch_with_fallback(
    fetcher: &dyn Fetcher,
    url: &str,
    wait_for: Option<&str>,
) -> Result<String> {
    match fetcher.fetch(url, FetchMode::Rendered, wait_for).await {
        Ok(html) if !html.trim().is_empty() => return Ok(html),
        Ok(_) => warn!(url, "Rendered fetch returned empty content, trying static"),
        Err(e) => warn!(url, error = %e, "Rendered fetch failed, trying static"),
    }
    fetcher.fetch(url, FetchMode::Static, None).await
}

/// Production fetcher: reqwest for static retrieval, Browserless for
/// rendered retrieval, per-origin throttling across both.
pub struct PageFetcher {
    client: reqwest::Client,
    browserless: BrowserlessClient,
    render_permits: Semaphore,
    last_hit: Mutex<HashMap<String, Instant>>,
}

impl PageFetcher {
    pub fn new(browserless_url: &str, browserless_token: Option<&str>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            browserless: BrowserlessClient::new(browserless_url, browserless_token),
            render_permits: Semaphore::new(MAX_CONCURRENT_RENDERED),
            last_hit: Mutex::new(HashMap::new()),
        }
    }

    /// Wait out the per-origin minimum delay. Each caller books the next
    /// slot under the lock, so concurrent requests to one origin stay
    /// spaced even when they arrive together.
    async fn throttle(&self, url: &str) {
        let origin = origin_of(url);
        let wait = {
            let mut map = self.last_hit.lock().await;
            let now = Instant::now();
            let fire_at = match map.get(&origin) {
                Some(last) if *last + MIN_ORIGIN_DELAY > now => *last + MIN_ORIGIN_DELAY,
                _ => now,
            };
            map.insert(origin, fire_at);
            fire_at.saturating_duration_since(now)
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    async fn fetch_static(&self, url: &str) -> Result<String> {
        retry_transient(STATIC_MAX_ATTEMPTS, STATIC_RETRY_BASE, || {
            self.static_attempt(url)
        })
        .await
    }

    /// One static GET, classified for the retry loop.
    async fn static_attempt(&self, url: &str) -> std::result::Result<String, FetchFailure> {
        self.throttle(url).await;

        let result = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml,application/json")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await;

        match result {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    return resp
                        .text()
                        .await
                        .context("Failed to read response body")
                        .map_err(FetchFailure::Permanent);
                }
                let err = anyhow::anyhow!("HTTP {status} for {url}");
                if is_transient_status(status.as_u16()) {
                    Err(FetchFailure::Transient(err))
                } else {
                    // 403, 404 and friends: retrying will not help.
                    Err(FetchFailure::Permanent(err))
                }
            }
            Err(e) if e.is_connect() || e.is_timeout() => Err(FetchFailure::Transient(
                anyhow::Error::new(e).context(format!("Failed to fetch {url}")),
            )),
            Err(e) => Err(FetchFailure::Permanent(
                anyhow::Error::new(e).context(format!("Failed to fetch {url}")),
            )),
        }
    }

    async fn fetch_rendered(&self, url: &str, wait_for: Option<&str>) -> Result<String> {
        // Scoped session: the permit bounds concurrent browser pages and is
        // released on every exit path, success or failure.
        let _permit = self
            .render_permits
            .acquire()
            .await
            .map_err(|_| anyhow::anyhow!("Render semaphore closed"))?;

        self.throttle(url).await;

        let opts = match wait_for {
            Some(selector) => RenderOptions::wait_for(selector),
            None => RenderOptions::default(),
        };

        info!(url, wait_for = wait_for.unwrap_or("<settle delay>"), "Rendered fetch");

        let html = self
            .browserless
            .content(url, &opts)
            .await
            .with_context(|| format!("Rendered fetch failed for {url}"))?;

        if html.trim().is_empty() {
            warn!(url, "Rendered fetch returned empty document");
        }
        Ok(html)
    }
}

#[async_trait]
impl Fetcher for PageFetcher {
    async fn fetch(&self, url: &str, mode: FetchMode, wait_for: Option<&str>) -> Result<String> {
        match mode {
            FetchMode::Static => self.fetch_static(url).await,
            FetchMode::Rendered => self.fetch_rendered(url, wait_for).await,
        }
    }
}

/// A classified fetch failure: transient failures are retried with
/// backoff, permanent ones surface immediately.
pub(crate) enum FetchFailure {
    Transient(anyhow::Error),
    Permanent(anyhow::Error),
}

/// Run `attempt` up to `max_attempts` times, backing off exponentially
/// (with jitter) between transient failures. Permanent failures and the
/// last transient one return the underlying error as-is.
pub(crate) async fn retry_transient<F, Fut>(
    max_attempts: u32,
    base: Duration,
    mut attempt: F,
) -> Result<String>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<String, FetchFailure>>,
{
    for n in 0..max_attempts {
        match attempt().await {
            Ok(body) => return Ok(body),
            Err(FetchFailure::Transient(e)) if n + 1 < max_attempts => {
                warn!(attempt = n + 1, error = %e, "Transient fetch failure, retrying after backoff");
                backoff(base, n).await;
            }
            Err(FetchFailure::Transient(e)) | Err(FetchFailure::Permanent(e)) => return Err(e),
        }
    }
    anyhow::bail!("No fetch attempts were made")
}

/// Transient statuses worth retrying: rate limiting and server-side blips.
fn is_transient_status(status: u16) -> bool {
    status == 429 || status == 502 || status == 503 || status == 504
}

async fn backoff(base: Duration, attempt: u32) {
    let delay = base * 2u32.pow(attempt);
    let jitter_ceiling = (base.as_millis() as u64).min(500);
    let jitter = Duration::from_millis(rand::rng().random_range(0..=jitter_ceiling));
    tokio::time::sleep(delay + jitter).await;
}

fn origin_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
        .unwrap_or_else(|| url.to_string())
}
