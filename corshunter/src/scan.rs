//! Scan orchestration: enumerate candidate subdomains, probe them for HTTPS,
//! record the snapshot, and feed the cumulative internal-candidate set into
//! the target's live generation.

use anyhow::Result;
use std::collections::HashSet;
use store_sqlite::{Db, ScanSummary, TargetDomain};
use time::OffsetDateTime;
use tracing::{debug, warn};

/// External subdomain intelligence source.
pub trait SubdomainEnumerator {
    fn enumerate(&self, domain: &str) -> Result<Vec<String>>;
}

/// Bulk HTTPS liveness check. Returns the subset of domains that answered;
/// probe failures and timeouts are folded into "did not answer".
pub trait HttpsProber {
    fn probe_batch(&self, domains: &[String]) -> Vec<String>;
}

pub struct AmassEnumerator {
    pub bin_path: String,
}

impl SubdomainEnumerator for AmassEnumerator {
    fn enumerate(&self, domain: &str) -> Result<Vec<String>> {
        Ok(subenum::enumerate_subdomains(domain, &self.bin_path)?)
    }
}

pub struct BatchProber {
    pub handle: tokio::runtime::Handle,
    pub opts: https_probe::ProbeOptions,
}

impl HttpsProber for BatchProber {
    fn probe_batch(&self, domains: &[String]) -> Vec<String> {
        self.handle
            .block_on(https_probe::probe_https_many(domains.to_vec(), self.opts.clone()))
    }
}

fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Run one enumeration pass over a parent domain and persist its snapshot.
/// Persistence happens exactly once, after both the enumerator and the
/// prober have finished; an enumeration failure leaves nothing behind.
pub fn scan_parent_domain(
    db: &Db,
    enumerator: &dyn SubdomainEnumerator,
    prober: &dyn HttpsProber,
    parent_domain: &str,
) -> Result<ScanSummary> {
    let time_started = now_ms();
    debug!(parent_domain, "starting scan, enumerating subdomains (this may take a while)");
    let candidates = enumerator.enumerate(parent_domain)?;
    debug!(
        parent_domain,
        count = candidates.len(),
        "enumeration finished, testing which candidates answer HTTPS"
    );
    let https: HashSet<String> = prober.probe_batch(&candidates).into_iter().collect();
    let internal = candidates.iter().filter(|c| !https.contains(*c)).count();
    if internal == 0 {
        warn!(
            parent_domain,
            candidates = candidates.len(),
            "no discovered subdomain looks internal, nothing to target"
        );
    } else {
        debug!(parent_domain, internal, "candidates look like potential internal domains");
    }
    let summary = db.record_scan(parent_domain, &candidates, &https, time_started, now_ms())?;
    debug!(summary_id = summary.summary_id, "scan results saved");
    Ok(summary)
}

/// Scan a parent domain, then set its live target generation from the
/// *all-time* internal candidate set. Every domain that has ever failed to
/// answer HTTPS for this parent is carried into the new generation, not just
/// this scan's discoveries.
pub fn add_target_for_parent_domain(
    db: &Db,
    enumerator: &dyn SubdomainEnumerator,
    prober: &dyn HttpsProber,
    parent_domain: &str,
) -> Result<TargetDomain> {
    scan_parent_domain(db, enumerator, prober, parent_domain)?;
    let subdomains = db.internal_candidates_for_parent(parent_domain)?;
    debug!(
        parent_domain,
        count = subdomains.len(),
        "setting live generation from cumulative internal candidates"
    );
    db.set_target_generation(parent_domain, &subdomains)
}
