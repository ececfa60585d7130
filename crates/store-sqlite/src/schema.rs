pub const MIG_0001_INIT: &str = r#"
BEGIN;

CREATE TABLE target_domains (
  target_id       INTEGER PRIMARY KEY AUTOINCREMENT,
  domain          TEXT NOT NULL UNIQUE,
  last_scan_guid  TEXT NOT NULL,
  scan_set_at_ms  INTEGER NOT NULL
);

CREATE TABLE target_subdomains (
  subdomain_id    INTEGER PRIMARY KEY AUTOINCREMENT,
  target_id       INTEGER NOT NULL REFERENCES target_domains(target_id) ON DELETE CASCADE,
  domain          TEXT NOT NULL,
  scan_guid       TEXT NOT NULL,
  UNIQUE (domain, scan_guid)
);

CREATE TABLE host_domains (
  host_id         INTEGER PRIMARY KEY AUTOINCREMENT,
  domain          TEXT NOT NULL UNIQUE,
  redirect_domain TEXT NOT NULL
);

CREATE TABLE host_target_mappings (
  mapping_id      INTEGER PRIMARY KEY AUTOINCREMENT,
  host_id         INTEGER REFERENCES host_domains(host_id) ON DELETE SET NULL,
  target_id       INTEGER REFERENCES target_domains(target_id) ON DELETE SET NULL,
  active          INTEGER NOT NULL CHECK (active IN (0,1)) DEFAULT 1,
  UNIQUE (host_id, target_id)
);

CREATE TABLE scan_summaries (
  summary_id            INTEGER PRIMARY KEY AUTOINCREMENT,
  parent_domain         TEXT NOT NULL,
  subdomains_count      INTEGER NOT NULL,
  https_subdomains_count INTEGER NOT NULL,
  time_started_ms       INTEGER NOT NULL,
  time_completed_ms     INTEGER NOT NULL
);

CREATE TABLE scan_domains (
  scan_domain_id  INTEGER PRIMARY KEY AUTOINCREMENT,
  summary_id      INTEGER REFERENCES scan_summaries(summary_id) ON DELETE SET NULL,
  domain          TEXT NOT NULL,
  has_https       INTEGER NOT NULL CHECK (has_https IN (0,1))
);

CREATE TABLE request_results (
  result_id       INTEGER PRIMARY KEY AUTOINCREMENT,
  host_domain     TEXT NOT NULL,
  url             TEXT,
  url_domain      TEXT NOT NULL,
  duration_ms     REAL NOT NULL,
  success         INTEGER NOT NULL CHECK (success IN (0,1)),
  content         TEXT,
  status_code     INTEGER,
  err_msg         TEXT,
  err_location    TEXT,
  client_meta_json TEXT,
  received_at_ms  INTEGER NOT NULL
);

CREATE INDEX idx_target_domains_domain ON target_domains(domain);
CREATE INDEX idx_target_subdomains_target ON target_subdomains(target_id);
CREATE INDEX idx_target_subdomains_guid ON target_subdomains(scan_guid);
CREATE INDEX idx_mappings_host ON host_target_mappings(host_id);
CREATE INDEX idx_scan_summaries_parent ON scan_summaries(parent_domain);
CREATE INDEX idx_scan_domains_summary ON scan_domains(summary_id);
CREATE INDEX idx_scan_domains_domain ON scan_domains(domain);
CREATE INDEX idx_results_host ON request_results(host_domain);
CREATE INDEX idx_results_url_domain ON request_results(url_domain);

COMMIT;
"#;
