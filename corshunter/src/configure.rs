//! Configuration pipeline: make the database reflect a hosts document.

use crate::config::HostBlock;
use crate::scan::{add_target_for_parent_domain, HttpsProber, SubdomainEnumerator};
use anyhow::Result;
use store_sqlite::Db;
use tracing::info;

/// Apply a hosts configuration document. Targets referenced by any block are
/// enumerated first if we have no record of them, then each block's mapping
/// is applied with full-replace semantics. The first per-host failure aborts
/// the whole run; blocks already applied stay applied.
pub fn apply_hosts_config(
    db: &Db,
    hosts: &[HostBlock],
    enumerator: &dyn SubdomainEnumerator,
    prober: &dyn HttpsProber,
) -> Result<()> {
    let mut all_targets: Vec<String> = hosts
        .iter()
        .flat_map(|h| h.targets.iter().cloned())
        .collect();
    all_targets.sort();
    all_targets.dedup();
    for target in &all_targets {
        if db.find_target_domain(target)?.is_some() {
            info!(target = %target, "target record found, no need to enumerate again");
        } else {
            info!(target = %target, "no target record found, enumerating now");
            add_target_for_parent_domain(db, enumerator, prober, target)?;
        }
    }
    for block in hosts {
        db.set_host_mapping(&block.host_domain, &block.redirect_domain, &block.targets)?;
        info!(host = %block.host_domain, redirect = %block.redirect_domain, "host configured");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct FixedEnumerator(Vec<String>);

    impl SubdomainEnumerator for FixedEnumerator {
        fn enumerate(&self, domain: &str) -> Result<Vec<String>> {
            Ok(self
                .0
                .iter()
                .map(|label| format!("{label}.{domain}"))
                .collect())
        }
    }

    struct FailingEnumerator;

    impl SubdomainEnumerator for FailingEnumerator {
        fn enumerate(&self, domain: &str) -> Result<Vec<String>> {
            Err(anyhow!("enumeration failed for '{domain}'"))
        }
    }

    struct NoProber;

    impl HttpsProber for NoProber {
        fn probe_batch(&self, _domains: &[String]) -> Vec<String> {
            Vec::new()
        }
    }

    fn block(host: &str, targets: &[&str]) -> HostBlock {
        HostBlock {
            host_domain: host.to_string(),
            redirect_domain: "www.redirect.com".to_string(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn missing_targets_are_enumerated_then_mapped() {
        let db = Db::open_in_memory().unwrap();
        let hosts = vec![
            block("lure-a.example.com", &["corp.io", "intra.net"]),
            block("lure-b.example.com", &["corp.io"]),
        ];
        let enumerator = FixedEnumerator(vec!["internal".into(), "vpn".into()]);
        apply_hosts_config(&db, &hosts, &enumerator, &NoProber).unwrap();

        // One scan per distinct target, even when shared across blocks.
        let scans: i64 = db
            .conn
            .query_row("SELECT COUNT(1) FROM scan_summaries", [], |r| r.get(0))
            .unwrap();
        assert_eq!(scans, 2);
        assert_eq!(
            db.active_subdomains_for_host("lure-a.example.com").unwrap().len(),
            4
        );
        assert_eq!(
            db.active_subdomains_for_host("lure-b.example.com").unwrap().len(),
            2
        );
    }

    #[test]
    fn known_targets_are_not_rescanned() {
        let db = Db::open_in_memory().unwrap();
        db.set_target_generation("corp.io", &["internal.corp.io".to_string()])
            .unwrap();
        let hosts = vec![block("lure.example.com", &["corp.io"])];
        // The enumerator would fail if consulted; a known target must not be.
        apply_hosts_config(&db, &hosts, &FailingEnumerator, &NoProber).unwrap();
        assert_eq!(
            db.active_subdomains_for_host("lure.example.com").unwrap().len(),
            1
        );
    }

    #[test]
    fn first_failure_aborts_the_run() {
        let db = Db::open_in_memory().unwrap();
        let hosts = vec![block("lure.example.com", &["corp.io"])];
        let err = apply_hosts_config(&db, &hosts, &FailingEnumerator, &NoProber).unwrap_err();
        assert!(err.to_string().contains("enumeration failed"));
        let host_rows: i64 = db
            .conn
            .query_row("SELECT COUNT(1) FROM host_domains", [], |r| r.get(0))
            .unwrap();
        assert_eq!(host_rows, 0);
    }
}
