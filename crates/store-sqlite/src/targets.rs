use crate::models::{parse_guid, TargetDomain, TargetId, TargetSubdomain};
use crate::open::now_ms;
use crate::Db;
use anyhow::Result;
use rusqlite::{params, params_from_iter, OptionalExtension};
use uuid::Uuid;

impl Db {
    /// Replace the live generation of subdomains for a parent domain. A fresh
    /// guid is minted per call; prior-generation rows are left in place as
    /// history and simply stop matching the live-generation queries.
    pub fn set_target_generation(
        &self,
        parent_domain: &str,
        subdomains: &[String],
    ) -> Result<TargetDomain> {
        let scan_guid = Uuid::new_v4();
        let set_at = now_ms();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO target_domains(domain,last_scan_guid,scan_set_at_ms) VALUES (?,?,?)
             ON CONFLICT(domain) DO UPDATE SET last_scan_guid=excluded.last_scan_guid, scan_set_at_ms=excluded.scan_set_at_ms",
            params![parent_domain, scan_guid.to_string(), set_at],
        )?;
        let target_id: TargetId = tx.query_row(
            "SELECT target_id FROM target_domains WHERE domain=?",
            params![parent_domain],
            |r| r.get(0),
        )?;
        for subdomain in subdomains {
            tx.execute(
                "INSERT INTO target_subdomains(target_id,domain,scan_guid) VALUES (?,?,?)",
                params![target_id, subdomain, scan_guid.to_string()],
            )?;
        }
        tx.commit()?;
        Ok(TargetDomain {
            target_id,
            domain: parent_domain.to_string(),
            last_scan_guid: scan_guid,
            scan_set_at_ms: set_at,
        })
    }

    pub fn find_target_domain(&self, domain: &str) -> Result<Option<TargetDomain>> {
        let row = self
            .conn
            .query_row(
                "SELECT target_id,domain,last_scan_guid,scan_set_at_ms FROM target_domains WHERE domain=?",
                params![domain],
                |r| {
                    let guid: String = r.get(2)?;
                    Ok(TargetDomain {
                        target_id: r.get(0)?,
                        domain: r.get(1)?,
                        last_scan_guid: parse_guid(2, guid)?,
                        scan_set_at_ms: r.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// All subdomains belonging to the *current* generation of each given
    /// parent domain. Row order is unspecified.
    pub fn live_subdomains_for_parents(
        &self,
        parent_domains: &[String],
    ) -> Result<Vec<TargetSubdomain>> {
        if parent_domains.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; parent_domains.len()].join(",");
        let sql = format!(
            "SELECT td.domain, ts.domain, ts.scan_guid FROM target_subdomains ts
             JOIN target_domains td ON td.target_id = ts.target_id
             WHERE td.domain IN ({placeholders}) AND ts.scan_guid = td.last_scan_guid"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(parent_domains.iter()), |r| {
            let guid: String = r.get(2)?;
            Ok(TargetSubdomain {
                parent_domain: r.get(0)?,
                domain: r.get(1)?,
                scan_guid: parse_guid(2, guid)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Every distinct domain that has ever shown up in scan history for the
    /// parent domain without answering HTTPS. Draws from all scans, not just
    /// the live generation.
    pub fn internal_candidates_for_parent(&self, parent_domain: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT sd.domain FROM scan_domains sd
             JOIN scan_summaries ss ON ss.summary_id = sd.summary_id
             WHERE ss.parent_domain = ? AND sd.has_https = 0",
        )?;
        let rows = stmt.query_map(params![parent_domain], |r| r.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    }
}
