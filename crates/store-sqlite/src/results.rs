use crate::error::StoreError;
use crate::models::{RequestResult, ResultId};
use crate::open::now_ms;
use crate::Db;
use anyhow::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rusqlite::params;
use url::Url;

/// A client report of a CORS fetch that succeeded. Content is the
/// base64-encoded body the payload managed to read cross-origin.
#[derive(Debug, Clone)]
pub struct SuccessReport {
    pub host_domain: String,
    pub url: String,
    pub content: String,
    pub status_code: i64,
    pub duration_ms: f64,
    pub client_meta: Option<serde_json::Value>,
}

/// A client report of a CORS fetch that failed, with the error text and the
/// payload location that observed it.
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub host_domain: String,
    pub url: Option<String>,
    pub err_msg: String,
    pub err_location: String,
    pub duration_ms: f64,
    pub client_meta: Option<serde_json::Value>,
}

impl Db {
    pub fn record_success(&self, report: &SuccessReport) -> Result<ResultId> {
        if !can_base64_decode(&report.content) {
            return Err(StoreError::InvalidContent.into());
        }
        let meta = meta_json(report.client_meta.as_ref())?;
        self.conn.execute(
            "INSERT INTO request_results(host_domain,url,url_domain,duration_ms,success,content,status_code,client_meta_json,received_at_ms)
             VALUES (?,?,?,?,1,?,?,?,?)",
            params![
                report.host_domain,
                report.url,
                url_authority(&report.url),
                report.duration_ms,
                report.content,
                report.status_code,
                meta,
                now_ms()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn record_failure(&self, report: &FailureReport) -> Result<ResultId> {
        let meta = meta_json(report.client_meta.as_ref())?;
        let url_domain = report.url.as_deref().map(url_authority).unwrap_or_default();
        self.conn.execute(
            "INSERT INTO request_results(host_domain,url,url_domain,duration_ms,success,err_msg,err_location,client_meta_json,received_at_ms)
             VALUES (?,?,?,?,0,?,?,?,?)",
            params![
                report.host_domain,
                report.url,
                url_domain,
                report.duration_ms,
                report.err_msg,
                report.err_location,
                meta,
                now_ms()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent results first, optionally narrowed to one host domain.
    pub fn list_results(
        &self,
        host_domain: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RequestResult>> {
        let sql = format!(
            "SELECT result_id,host_domain,url,url_domain,duration_ms,success,content,status_code,err_msg,err_location,client_meta_json,received_at_ms
             FROM request_results {} ORDER BY result_id DESC LIMIT ?",
            if host_domain.is_some() { "WHERE host_domain=?" } else { "" }
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let map_row = |r: &rusqlite::Row<'_>| {
            let meta_raw: Option<String> = r.get(10)?;
            Ok(RequestResult {
                result_id: r.get(0)?,
                host_domain: r.get(1)?,
                url: r.get(2)?,
                url_domain: r.get(3)?,
                duration_ms: r.get(4)?,
                success: r.get::<_, i64>(5)? != 0,
                content: r.get(6)?,
                status_code: r.get(7)?,
                err_msg: r.get(8)?,
                err_location: r.get(9)?,
                client_meta: meta_raw.and_then(|s| serde_json::from_str(&s).ok()),
                received_at_ms: r.get(11)?,
            })
        };
        let rows = match host_domain {
            Some(host) => stmt
                .query_map(params![host, limit as i64], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
            None => stmt
                .query_map(params![limit as i64], map_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?,
        };
        Ok(rows)
    }
}

fn meta_json(meta: Option<&serde_json::Value>) -> Result<Option<String>> {
    Ok(match meta {
        Some(v) => Some(serde_json::to_string(v)?),
        None => None,
    })
}

fn can_base64_decode(to_test: &str) -> bool {
    BASE64.decode(to_test).is_ok()
}

/// The authority portion of the URL (`host[:port]`), or empty when the URL
/// does not parse. Mirrors what gets indexed for review queries.
fn url_authority(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            }
        }
        Err(_) => String::new(),
    }
}
