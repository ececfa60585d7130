use crate::models::ScanSummary;
use crate::Db;
use anyhow::Result;
use rusqlite::params;
use std::collections::HashSet;

impl Db {
    /// Persist a point-in-time snapshot of one enumeration pass: the summary
    /// row plus one row per discovered domain flagged with whether it answered
    /// HTTPS. Written once, never mutated.
    pub fn record_scan(
        &self,
        parent_domain: &str,
        candidates: &[String],
        https_responders: &HashSet<String>,
        time_started_ms: i64,
        time_completed_ms: i64,
    ) -> Result<ScanSummary> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO scan_summaries(parent_domain,subdomains_count,https_subdomains_count,time_started_ms,time_completed_ms)
             VALUES (?,?,?,?,?)",
            params![
                parent_domain,
                candidates.len() as i64,
                https_responders.len() as i64,
                time_started_ms,
                time_completed_ms
            ],
        )?;
        let summary_id = tx.last_insert_rowid();
        for domain in candidates {
            let has_https = https_responders.contains(domain);
            tx.execute(
                "INSERT INTO scan_domains(summary_id,domain,has_https) VALUES (?,?,?)",
                params![summary_id, domain, has_https as i64],
            )?;
        }
        tx.commit()?;
        Ok(ScanSummary {
            summary_id,
            parent_domain: parent_domain.to_string(),
            subdomains_count: candidates.len() as i64,
            https_subdomains_count: https_responders.len() as i64,
            time_started_ms,
            time_completed_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_domain_count(db: &Db, https_only: bool) -> i64 {
        let sql = if https_only {
            "SELECT COUNT(1) FROM scan_domains WHERE has_https=1"
        } else {
            "SELECT COUNT(1) FROM scan_domains"
        };
        db.conn.query_row(sql, [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn empty_scan_records_summary_only() {
        let db = Db::open_in_memory().unwrap();
        let summary = db
            .record_scan("example.com", &[], &HashSet::new(), 1, 2)
            .unwrap();
        assert_eq!(summary.subdomains_count, 0);
        assert_eq!(summary.https_subdomains_count, 0);
        assert_eq!(scan_domain_count(&db, false), 0);
    }

    #[test]
    fn scan_rows_flag_https_membership() {
        let db = Db::open_in_memory().unwrap();
        let candidates: Vec<String> = (0..10).map(|i| format!("s{i}.example.com")).collect();
        let https: HashSet<String> = candidates[..5].iter().cloned().collect();
        let summary = db
            .record_scan("example.com", &candidates, &https, 10, 20)
            .unwrap();
        assert_eq!(summary.subdomains_count, 10);
        assert_eq!(summary.https_subdomains_count, 5);
        assert_eq!(scan_domain_count(&db, false), 10);
        assert_eq!(scan_domain_count(&db, true), 5);
        let mut internal = db.internal_candidates_for_parent("example.com").unwrap();
        internal.sort();
        let mut expected: Vec<String> = candidates[5..].to_vec();
        expected.sort();
        assert_eq!(internal, expected);
    }

    #[test]
    fn internal_candidates_accumulate_across_scans_distinct() {
        let db = Db::open_in_memory().unwrap();
        let first = vec!["a.example.com".to_string(), "b.example.com".to_string()];
        let second = vec!["b.example.com".to_string(), "c.example.com".to_string()];
        db.record_scan("example.com", &first, &HashSet::new(), 1, 2)
            .unwrap();
        db.record_scan("example.com", &second, &HashSet::new(), 3, 4)
            .unwrap();
        let mut internal = db.internal_candidates_for_parent("example.com").unwrap();
        internal.sort();
        assert_eq!(internal, vec!["a.example.com", "b.example.com", "c.example.com"]);
    }

    #[test]
    fn internal_candidates_exclude_https_and_other_parents() {
        let db = Db::open_in_memory().unwrap();
        let candidates = vec!["live.example.com".to_string(), "dark.example.com".to_string()];
        let https: HashSet<String> = ["live.example.com".to_string()].into_iter().collect();
        db.record_scan("example.com", &candidates, &https, 1, 2)
            .unwrap();
        db.record_scan(
            "other.org",
            &["hidden.other.org".to_string()],
            &HashSet::new(),
            3,
            4,
        )
        .unwrap();
        assert_eq!(
            db.internal_candidates_for_parent("example.com").unwrap(),
            vec!["dark.example.com"]
        );
    }
}
