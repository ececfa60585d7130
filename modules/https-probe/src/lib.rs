//! Concurrent HTTPS liveness probing with per-request timeouts.
//!
//! A domain that answers an HTTPS HEAD request at all is considered live;
//! connection failures and timeouts both count as "not reachable" and are
//! never surfaced as errors.

use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tokio::sync::Semaphore;

#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub timeout_ms: u64,
    pub pool_size: usize,
    pub user_agent: String,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        ProbeOptions {
            timeout_ms: 5_000,
            pool_size: 16,
            user_agent: format!("corshunter/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Probe a batch of domains over HTTPS and return the subset that answered.
/// An empty batch returns immediately without spawning any workers.
pub async fn probe_https_many(domains: Vec<String>, opts: ProbeOptions) -> Vec<String> {
    if domains.is_empty() {
        return Vec::new();
    }
    let sem = std::sync::Arc::new(Semaphore::new(opts.pool_size.max(1)));
    let client = Client::builder()
        .redirect(Policy::none())
        .timeout(Duration::from_millis(opts.timeout_ms))
        .user_agent(opts.user_agent.clone())
        .build()
        .expect("client");

    let mut handles = Vec::with_capacity(domains.len());
    for domain in domains {
        let permit = sem.clone().acquire_owned().await.unwrap();
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let live = probe_one(&client, &domain).await;
            drop(permit);
            (domain, live)
        }));
    }
    let mut live = Vec::new();
    for h in handles {
        if let Ok((domain, true)) = h.await {
            live.push(domain);
        }
    }
    live
}

async fn probe_one(client: &Client, domain: &str) -> bool {
    let url = format!("https://{domain}/");
    client.head(&url).send().await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_batch_returns_immediately() {
        let live = probe_https_many(Vec::new(), ProbeOptions::default()).await;
        assert!(live.is_empty());
    }

    #[tokio::test]
    async fn unresolvable_domains_fold_into_not_reachable() {
        let opts = ProbeOptions {
            timeout_ms: 250,
            pool_size: 4,
            ..ProbeOptions::default()
        };
        let live = probe_https_many(
            vec!["no-such-host.invalid".to_string(), "also-missing.invalid".to_string()],
            opts,
        )
        .await;
        assert!(live.is_empty());
    }
}
