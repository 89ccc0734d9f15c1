//! Page fetching with User-Agent rotation and request pacing.
//!
//! The scrapers never call `reqwest` directly. They go through the
//! [`PageFetcher`] trait so that the HTTP client can be swapped for an
//! in-memory stub in tests.
//!
//! # Politeness
//!
//! - Every request carries a User-Agent drawn at random from a small pool of
//!   desktop browser strings, which keeps naive bot filters from blocking us.
//! - Requests time out after the configured fetch timeout (15 s by default).
//! - [`pause`] sleeps for a random duration between article fetches.

use rand::{Rng, rng};
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/109.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/109.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36",
];

/// Why a page could not be fetched.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, TLS, timeout, or body decoding failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with something other than 200 OK.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
}

/// Something that can turn a URL into an HTML document.
///
/// Implementors must return `Err` for any response that is not a successful
/// page load; callers treat every error as "no content".
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Pick a User-Agent string for the next request.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS[rng().random_range(0..USER_AGENTS.len())]
}

/// [`PageFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%url, status = status.as_u16(), "Non-200 response");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!(
            %url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}

/// Choose a random delay within `[min, max]`.
///
/// A reversed range is treated as `[max, min]`.
pub fn pacing_delay(min: Duration, max: Duration) -> Duration {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if lo == hi {
        return lo;
    }
    let ms = rng().random_range(lo.as_millis() as u64..=hi.as_millis() as u64);
    Duration::from_millis(ms)
}

/// Sleep for a random pacing delay. Zero-length ranges return immediately.
pub async fn pause(min: Duration, max: Duration) {
    let delay = pacing_delay(min, max);
    if !delay.is_zero() {
        debug!(?delay, "Pacing before next request");
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent_comes_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[test]
    fn test_pacing_delay_within_bounds() {
        let min = Duration::from_millis(1000);
        let max = Duration::from_millis(3000);
        for _ in 0..50 {
            let d = pacing_delay(min, max);
            assert!(d >= min && d <= max, "{d:?} out of range");
        }
    }

    #[test]
    fn test_pacing_delay_reversed_and_degenerate_ranges() {
        let d = pacing_delay(Duration::from_millis(30), Duration::from_millis(10));
        assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(30));
        assert_eq!(
            pacing_delay(Duration::from_millis(5), Duration::from_millis(5)),
            Duration::from_millis(5)
        );
    }

    #[tokio::test]
    async fn test_zero_pause_returns_immediately() {
        let t0 = Instant::now();
        pause(Duration::ZERO, Duration::ZERO).await;
        assert!(t0.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn test_status_error_display() {
        assert_eq!(FetchError::Status(404).to_string(), "unexpected HTTP status 404");
    }
}
