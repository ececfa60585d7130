use crate::error::StoreError;
use crate::models::{parse_guid, HostDomain, HostId, TargetDomain, TargetSubdomain};
use crate::Db;
use anyhow::Result;
use hunter_core::domain::domain_suffixes;
use rusqlite::{params, OptionalExtension};

impl Db {
    /// Full-replace configuration of the targets served for a host domain.
    ///
    /// Every named target must already have a record; a single unknown target
    /// rejects the whole call with `StoreError::UnknownTarget` before any
    /// mutation. On success all pre-existing mappings for the host are marked
    /// inactive, the host row is upserted with the new redirect destination,
    /// and exactly the supplied targets end up active. Mappings dropped from
    /// the list stay in storage, inactive.
    pub fn set_host_mapping(
        &self,
        host_domain: &str,
        redirect_domain: &str,
        target_domains: &[String],
    ) -> Result<HostDomain> {
        let mut target_ids = Vec::with_capacity(target_domains.len());
        for domain in target_domains {
            let target = self
                .find_target_domain(domain)?
                .ok_or_else(|| StoreError::UnknownTarget(domain.clone()))?;
            target_ids.push(target.target_id);
        }
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE host_target_mappings SET active=0
             WHERE host_id IN (SELECT host_id FROM host_domains WHERE domain=?)",
            params![host_domain],
        )?;
        tx.execute(
            "INSERT INTO host_domains(domain,redirect_domain) VALUES (?,?)
             ON CONFLICT(domain) DO UPDATE SET redirect_domain=excluded.redirect_domain",
            params![host_domain, redirect_domain],
        )?;
        let host_id: HostId = tx.query_row(
            "SELECT host_id FROM host_domains WHERE domain=?",
            params![host_domain],
            |r| r.get(0),
        )?;
        for target_id in target_ids {
            tx.execute(
                "INSERT INTO host_target_mappings(host_id,target_id,active) VALUES (?,?,1)
                 ON CONFLICT(host_id,target_id) DO UPDATE SET active=1",
                params![host_id, target_id],
            )?;
        }
        tx.commit()?;
        Ok(HostDomain {
            host_id,
            domain: host_domain.to_string(),
            redirect_domain: redirect_domain.to_string(),
        })
    }

    pub fn find_host_domain(&self, domain: &str) -> Result<Option<HostDomain>> {
        let row = self
            .conn
            .query_row(
                "SELECT host_id,domain,redirect_domain FROM host_domains WHERE domain=?",
                params![domain],
                |r| {
                    Ok(HostDomain {
                        host_id: r.get(0)?,
                        domain: r.get(1)?,
                        redirect_domain: r.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Targets currently mapped active for the host domain.
    pub fn active_targets_for_host(&self, host_domain: &str) -> Result<Vec<TargetDomain>> {
        let mut stmt = self.conn.prepare(
            "SELECT td.target_id, td.domain, td.last_scan_guid, td.scan_set_at_ms
             FROM host_target_mappings m
             JOIN host_domains hd ON hd.host_id = m.host_id
             JOIN target_domains td ON td.target_id = m.target_id
             WHERE hd.domain = ? AND m.active = 1",
        )?;
        let rows = stmt.query_map(params![host_domain], |r| {
            let guid: String = r.get(2)?;
            Ok(TargetDomain {
                target_id: r.get(0)?,
                domain: r.get(1)?,
                last_scan_guid: parse_guid(2, guid)?,
                scan_set_at_ms: r.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The subdomains a payload for this host should carry: live subdomains
    /// of every active target.
    pub fn active_subdomains_for_host(&self, host_domain: &str) -> Result<Vec<TargetSubdomain>> {
        let parents: Vec<String> = self
            .active_targets_for_host(host_domain)?
            .into_iter()
            .map(|t| t.domain)
            .collect();
        self.live_subdomains_for_parents(&parents)
    }

    /// Find the configured host domain best matching an inbound request host.
    /// Suffixes are examined most-specific first, so `foo.bar.example.com`
    /// only falls back to a configured `example.com` when neither
    /// `foo.bar.example.com` nor `bar.example.com` is configured.
    pub fn resolve_host(&self, requested_host: &str) -> Result<Option<HostDomain>> {
        for suffix in domain_suffixes(requested_host).iter().rev() {
            if let Some(host) = self.find_host_domain(suffix)? {
                return Ok(Some(host));
            }
        }
        Ok(None)
    }

    /// Resolution as the serving layer sees it: a host with zero active
    /// subdomains is indistinguishable from no match at all.
    pub fn renderable_host(
        &self,
        requested_host: &str,
    ) -> Result<Option<(HostDomain, Vec<TargetSubdomain>)>> {
        let Some(host) = self.resolve_host(requested_host)? else {
            return Ok(None);
        };
        let subdomains = self.active_subdomains_for_host(&host.domain)?;
        if subdomains.is_empty() {
            return Ok(None);
        }
        Ok(Some((host, subdomains)))
    }
}
