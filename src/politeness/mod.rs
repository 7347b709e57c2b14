//! Per-host politeness governor
//!
//! Tracks each host's crawl-delay (resolved lazily from robots.txt) and the
//! timestamp of the last request to that host, and makes workers wait out the
//! remaining delay before fetching. The governor is constructed by the
//! orchestrator and shared across workers behind an `Arc`; per-host state
//! sits behind its own async lock, which is held across the politeness sleep
//! so that two workers can never interleave inside one host's spacing window.
//!
//! Delays are keyed on hostname alone: different schemes or ports on the
//! same host share one rate budget.

use crate::robots;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

/// A crawl delay resolved from a host's robots policy
#[derive(Debug, Clone)]
struct ResolvedDelay {
    delay: Duration,
    fetched_at: DateTime<Utc>,
}

impl ResolvedDelay {
    /// Robots policies are re-fetched daily so long crawls pick up changes
    fn is_stale(&self) -> bool {
        Utc::now() - self.fetched_at > chrono::Duration::hours(24)
    }
}

/// Mutable politeness state for one host
#[derive(Debug, Default)]
struct HostState {
    delay: Option<ResolvedDelay>,
    last_request: Option<Instant>,
}

/// Shared per-host crawl-delay cache and rate limiter
///
/// Consulted by every request worker before every fetch.
pub struct PolitenessGovernor {
    client: Client,
    user_agent: String,
    hosts: StdMutex<HashMap<String, Arc<Mutex<HostState>>>>,
}

impl PolitenessGovernor {
    /// Creates a governor that resolves robots policies with the given client
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client used for robots.txt fetches
    /// * `user_agent` - Agent name matched against robots agent groups
    pub fn new(client: Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            hosts: StdMutex::new(HashMap::new()),
        }
    }

    /// Resolves the crawl delay for the URL's host, fetching robots.txt on
    /// first use
    ///
    /// A failed or delay-less robots fetch caches a zero delay; resolution
    /// never fails the calling request.
    pub async fn delay_for(&self, url: &Url) -> Duration {
        let Some(host) = url.host_str() else {
            return Duration::ZERO;
        };
        let entry = self.host_entry(host);
        let mut state = entry.lock().await;
        self.resolve_delay(&mut state, url.scheme(), host).await
    }

    /// Waits until the host's crawl delay has elapsed since its last request
    ///
    /// Always records the current instant as the host's new last-request
    /// marker before returning, so request spacing is serialized even when
    /// the delay is zero. The per-host lock is held for the duration, which
    /// orders concurrent workers targeting the same host.
    pub async fn wait_before(&self, url: &Url) {
        let Some(host) = url.host_str() else {
            return;
        };
        let entry = self.host_entry(host);
        let mut state = entry.lock().await;

        let delay = self.resolve_delay(&mut state, url.scheme(), host).await;
        if let Some(last) = state.last_request {
            let elapsed = last.elapsed();
            if elapsed < delay {
                tracing::debug!(
                    "Waiting {:?} before next request to {}",
                    delay - elapsed,
                    host
                );
                tokio::time::sleep(delay - elapsed).await;
            }
        }
        state.last_request = Some(Instant::now());
    }

    /// Returns the cached delay for a host without triggering resolution
    pub fn cached_delay(&self, host: &str) -> Option<Duration> {
        let hosts = self.hosts.lock().unwrap();
        let entry = hosts.get(host)?;
        let state = entry.try_lock().ok()?;
        state.delay.as_ref().map(|resolved| resolved.delay)
    }

    fn host_entry(&self, host: &str) -> Arc<Mutex<HostState>> {
        let mut hosts = self.hosts.lock().unwrap();
        hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(HostState::default())))
            .clone()
    }

    async fn resolve_delay(&self, state: &mut HostState, scheme: &str, host: &str) -> Duration {
        if let Some(resolved) = &state.delay {
            if !resolved.is_stale() {
                return resolved.delay;
            }
        }

        let delay = robots::fetch_crawl_delay(&self.client, scheme, host, &self.user_agent)
            .await
            .unwrap_or(Duration::ZERO);
        tracing::debug!("Resolved crawl delay for {}: {:?}", host, delay);
        state.delay = Some(ResolvedDelay {
            delay,
            fetched_at: Utc::now(),
        });
        delay
    }
}
