//! Robots.txt handling module
//!
//! Fetches a host's robots.txt and extracts its crawl-delay directive. This
//! crawler does not evaluate allow/disallow rules; the robots policy is
//! consulted solely for request spacing.

mod parser;

pub use parser::CrawlDirectives;

use reqwest::Client;
use std::time::Duration;

/// Fetches robots.txt for a host and resolves its crawl delay
///
/// Any failure along the way (unreachable host, non-success status,
/// unreadable body, missing directive) yields `None`; the caller treats that
/// as a zero delay. An unreachable robots file must never stall or fail the
/// crawl itself.
///
/// # Arguments
///
/// * `client` - Shared HTTP client
/// * `scheme` - URL scheme of the originating request (`http` or `https`)
/// * `host` - The host to resolve
/// * `user_agent` - User agent string matched against robots agent groups
pub async fn fetch_crawl_delay(
    client: &Client,
    scheme: &str,
    host: &str,
    user_agent: &str,
) -> Option<Duration> {
    let robots_url = format!("{}://{}/robots.txt", scheme, host);
    tracing::debug!("Fetching robots policy from {}", robots_url);

    let response = match client.get(&robots_url).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!("Failed to fetch {}: {}", robots_url, e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("Robots fetch for {} returned {}", host, response.status());
        return None;
    }

    let body = match response.text().await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!("Failed to read robots body for {}: {}", host, e);
            return None;
        }
    };

    CrawlDirectives::from_content(&body)
        .crawl_delay(user_agent)
        .filter(|seconds| *seconds >= 0.0)
        .map(Duration::from_secs_f64)
}
