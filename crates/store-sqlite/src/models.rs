use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TargetId = i64;
pub type HostId = i64;
pub type SummaryId = i64;
pub type ResultId = i64;

/// A parent domain whose subdomains are being targeted. The generation guid
/// identifies the batch of subdomains currently considered live for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDomain {
    pub target_id: TargetId,
    pub domain: String,
    pub last_scan_guid: Uuid,
    pub scan_set_at_ms: i64,
}

/// One candidate internal subdomain under a target domain. Rows from prior
/// generations stay in storage as history; only rows whose guid matches the
/// owning target's current guid are live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSubdomain {
    pub parent_domain: String,
    pub domain: String,
    pub scan_guid: Uuid,
}

/// An externally-reachable domain this system serves lure pages for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostDomain {
    pub host_id: HostId,
    pub domain: String,
    pub redirect_domain: String,
}

/// Immutable record of one enumeration pass over a parent domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub summary_id: SummaryId,
    pub parent_domain: String,
    pub subdomains_count: i64,
    pub https_subdomains_count: i64,
    pub time_started_ms: i64,
    pub time_completed_ms: i64,
}

/// One client-reported CORS fetch outcome, persisted verbatim for review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestResult {
    pub result_id: ResultId,
    pub host_domain: String,
    pub url: Option<String>,
    pub url_domain: String,
    pub duration_ms: f64,
    pub success: bool,
    pub content: Option<String>,
    pub status_code: Option<i64>,
    pub err_msg: Option<String>,
    pub err_location: Option<String>,
    pub client_meta: Option<serde_json::Value>,
    pub received_at_ms: i64,
}

pub(crate) fn parse_guid(idx: usize, value: String) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(&value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
