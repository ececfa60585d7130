use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use store_sqlite::{Db, FailureReport, SuccessReport};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::info;

mod config;
mod configure;
mod scan;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat { Text, Json }

fn ms_to_rfc3339(ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(String::new)
}

#[derive(Debug, Parser)]
#[command(name = "corshunter", version, about = "CORS misconfiguration reconnaissance toolkit")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./corshunter.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to the sqlite database (default: ./corshunter.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// Enumerate subdomains for a parent domain and record the scan
    Scan {
        /// Parent domain to scan
        domain: String,
        /// Timeout per HTTPS probe in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Max concurrent HTTPS probes
        #[arg(long)]
        pool_size: Option<usize>,
        /// Path to the amass binary
        #[arg(long)]
        amass_bin: Option<String>,
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Scan a parent domain and set its live target generation from the
    /// all-time internal candidates
    AddTarget {
        /// Parent domain to add as a target
        domain: String,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        pool_size: Option<usize>,
        #[arg(long)]
        amass_bin: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Apply a YAML hosts document (enumerates any unknown targets first)
    Configure {
        /// Path to the hosts YAML file
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long)]
        pool_size: Option<usize>,
        #[arg(long)]
        amass_bin: Option<String>,
    },
    /// Map a host domain to target domains (targets must already exist)
    Map {
        /// Host domain that will receive HTTP traffic
        host: String,
        /// Domain the payload redirects visitors to
        #[arg(long)]
        redirect: String,
        /// Target domains whose live subdomains feed the payload
        #[arg(long, required = true, num_args = 1..)]
        targets: Vec<String>,
    },
    /// Resolve a requested host and emit its payload inputs
    Payload {
        /// The inbound Host header value
        host: String,
        /// Full request URL (defaults to https://<host>/)
        #[arg(long)]
        url: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Record a client-reported CORS fetch outcome
    Ingest {
        /// Host domain the report originated from
        #[arg(long)]
        host: String,
        /// URL the payload fetched
        #[arg(long)]
        url: Option<String>,
        /// Base64-encoded body for a successful fetch
        #[arg(long, conflicts_with = "error")]
        content: Option<String>,
        /// HTTP status code for a successful fetch
        #[arg(long)]
        status: Option<i64>,
        /// Error message for a failed fetch
        #[arg(long)]
        error: Option<String>,
        /// Payload location that observed the failure
        #[arg(long)]
        location: Option<String>,
        /// Elapsed time between request start and response or error
        #[arg(long, default_value_t = 0.0)]
        duration_ms: f64,
    },
    /// Review recorded CORS fetch outcomes
    Results {
        /// Only show results reported against this host domain
        #[arg(long)]
        host: Option<String>,
        #[arg(long, default_value_t = 50)]
        limit: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Output file (overwrites)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Write CSV instead of text/json when --out is provided
        #[arg(long, default_value_t = false)]
        csv: bool,
    },
    /// Seed the database with records for a local testing configuration
    SeedLocal {
        /// Comma-separated list of host domains that will receive traffic
        #[arg(long, default_value = "127.0.0.1:8080")]
        host_domains: String,
    },
}

struct ScanSettings {
    timeout_ms: u64,
    pool_size: usize,
    amass_bin: String,
}

fn scan_settings(
    cfg: &Option<config::Config>,
    timeout_ms: Option<u64>,
    pool_size: Option<usize>,
    amass_bin: Option<String>,
) -> ScanSettings {
    let mut timeout = timeout_ms;
    let mut pool = pool_size;
    let mut bin = amass_bin;
    if let Some(cfg) = cfg {
        if let Some(s) = &cfg.scan {
            if timeout.is_none() { timeout = s.timeout_ms; }
            if pool.is_none() { pool = s.pool_size; }
            if bin.is_none() { bin = s.amass_bin.clone(); }
        }
    }
    ScanSettings {
        timeout_ms: timeout.unwrap_or(5_000),
        pool_size: pool.unwrap_or(16),
        amass_bin: bin.unwrap_or_else(|| subenum::DEFAULT_BIN.to_string()),
    }
}

const LOCAL_REDIRECT_DOMAIN: &str = "www.google.com";
const LOCAL_PARENT_DOMAIN: &str = "testing.corshunter.local";
const LOCAL_TARGET_SUBDOMAINS: &[&str] = &[
    "enable-cors.org",
    "www.google.com",
    "www.amazon.com",
    "www.reddit.com",
    "www.woot.com",
    "example.com",
];

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
    let cli = Cli::parse();
    let loaded_cfg = config::load_config(cli.config.as_deref());
    let db_path = cli
        .db
        .clone()
        .or_else(|| loaded_cfg.as_ref().and_then(|c| c.db_path.clone()))
        .unwrap_or_else(|| PathBuf::from("corshunter.db"));
    match cli.command {
        Commands::Version => {
            println!("corshunter {} (core {})", env!("CARGO_PKG_VERSION"), hunter_core::version());
        }
        Commands::Scan { domain, timeout_ms, pool_size, amass_bin, format } => {
            let settings = scan_settings(&loaded_cfg, timeout_ms, pool_size, amass_bin);
            let db = Db::open_or_create(&db_path)?;
            let rt = tokio::runtime::Runtime::new()?;
            let enumerator = scan::AmassEnumerator { bin_path: settings.amass_bin };
            let prober = scan::BatchProber {
                handle: rt.handle().clone(),
                opts: https_probe::ProbeOptions {
                    timeout_ms: settings.timeout_ms,
                    pool_size: settings.pool_size,
                    ..Default::default()
                },
            };
            let summary = scan::scan_parent_domain(&db, &enumerator, &prober, &domain)?;
            match format {
                OutputFormat::Text => println!(
                    "{}: {} subdomains discovered, {} answered HTTPS ({} -> {})",
                    summary.parent_domain,
                    summary.subdomains_count,
                    summary.https_subdomains_count,
                    ms_to_rfc3339(summary.time_started_ms),
                    ms_to_rfc3339(summary.time_completed_ms),
                ),
                OutputFormat::Json => {
                    let obj = serde_json::json!({
                        "parent_domain": summary.parent_domain,
                        "subdomains_count": summary.subdomains_count,
                        "https_subdomains_count": summary.https_subdomains_count,
                        "started_at": ms_to_rfc3339(summary.time_started_ms),
                        "completed_at": ms_to_rfc3339(summary.time_completed_ms),
                    });
                    println!("{}", serde_json::to_string(&obj)?);
                }
            }
        }
        Commands::AddTarget { domain, timeout_ms, pool_size, amass_bin, format } => {
            let settings = scan_settings(&loaded_cfg, timeout_ms, pool_size, amass_bin);
            let db = Db::open_or_create(&db_path)?;
            let rt = tokio::runtime::Runtime::new()?;
            let enumerator = scan::AmassEnumerator { bin_path: settings.amass_bin };
            let prober = scan::BatchProber {
                handle: rt.handle().clone(),
                opts: https_probe::ProbeOptions {
                    timeout_ms: settings.timeout_ms,
                    pool_size: settings.pool_size,
                    ..Default::default()
                },
            };
            let target = scan::add_target_for_parent_domain(&db, &enumerator, &prober, &domain)?;
            let live = db.live_subdomains_for_parents(&[target.domain.clone()])?;
            match format {
                OutputFormat::Text => println!(
                    "{}: {} subdomains set as payload candidates",
                    target.domain,
                    live.len()
                ),
                OutputFormat::Json => {
                    let obj = serde_json::json!({
                        "parent_domain": target.domain,
                        "scan_guid": target.last_scan_guid,
                        "live_subdomains": live.iter().map(|s| s.domain.clone()).collect::<Vec<_>>(),
                    });
                    println!("{}", serde_json::to_string(&obj)?);
                }
            }
        }
        Commands::Configure { file, timeout_ms, pool_size, amass_bin } => {
            let settings = scan_settings(&loaded_cfg, timeout_ms, pool_size, amass_bin);
            let hosts = config::load_hosts_file(&file)?;
            if hosts.hosts.is_empty() {
                return Err(anyhow!("no host blocks found in {}", file.display()));
            }
            let db = Db::open_or_create(&db_path)?;
            let rt = tokio::runtime::Runtime::new()?;
            let enumerator = scan::AmassEnumerator { bin_path: settings.amass_bin };
            let prober = scan::BatchProber {
                handle: rt.handle().clone(),
                opts: https_probe::ProbeOptions {
                    timeout_ms: settings.timeout_ms,
                    pool_size: settings.pool_size,
                    ..Default::default()
                },
            };
            configure::apply_hosts_config(&db, &hosts.hosts, &enumerator, &prober)?;
            println!("{} host(s) configured", hosts.hosts.len());
        }
        Commands::Map { host, redirect, targets } => {
            let db = Db::open_or_create(&db_path)?;
            let host_domain = db.set_host_mapping(&host, &redirect, &targets)?;
            println!(
                "{} now serves payloads for {} target(s), redirecting to {}",
                host_domain.domain,
                targets.len(),
                host_domain.redirect_domain
            );
        }
        Commands::Payload { host, url, format } => {
            let db = Db::open_or_create(&db_path)?;
            let Some((host_domain, subdomains)) = db.renderable_host(&host)? else {
                return Err(anyhow!("no payload available for host '{}'", host));
            };
            let request_url = url.unwrap_or_else(|| format!("https://{host}/"));
            let redirect_url = hunter_core::domain::swap_host(
                &request_url,
                &host_domain.domain,
                &host_domain.redirect_domain,
            );
            match format {
                OutputFormat::Text => {
                    println!("host: {}", host_domain.domain);
                    println!("redirect: {redirect_url}");
                    for s in &subdomains {
                        println!("{}", s.domain);
                    }
                }
                OutputFormat::Json => {
                    let obj = serde_json::json!({
                        "host_domain": host_domain.domain,
                        "redirect_url": redirect_url,
                        "subdomains": subdomains.iter().map(|s| s.domain.clone()).collect::<Vec<_>>(),
                    });
                    println!("{}", serde_json::to_string(&obj)?);
                }
            }
        }
        Commands::Ingest { host, url, content, status, error, location, duration_ms } => {
            let db = Db::open_or_create(&db_path)?;
            let result_id = match error {
                Some(err_msg) => db.record_failure(&FailureReport {
                    host_domain: host,
                    url,
                    err_msg,
                    err_location: location.unwrap_or_else(|| "unknown".to_string()),
                    duration_ms,
                    client_meta: None,
                })?,
                None => {
                    let url = url.ok_or_else(|| anyhow!("--url is required for success reports"))?;
                    db.record_success(&SuccessReport {
                        host_domain: host,
                        url,
                        content: content.unwrap_or_default(),
                        status_code: status.unwrap_or(200),
                        duration_ms,
                        client_meta: None,
                    })?
                }
            };
            println!("recorded result {result_id}");
        }
        Commands::Results { host, limit, format, out, csv } => {
            let db = Db::open_or_create(&db_path)?;
            let results = db.list_results(host.as_deref(), limit)?;
            if csv {
                let Some(path) = out else {
                    return Err(anyhow!("--csv requires --out <file>"));
                };
                let mut wtr = csv::Writer::from_writer(std::fs::File::create(&path)?);
                wtr.write_record([
                    "result_id", "host_domain", "url", "url_domain", "success",
                    "status_code", "err_msg", "err_location", "duration_ms", "received_at",
                ])?;
                for r in results {
                    wtr.write_record([
                        r.result_id.to_string(),
                        r.host_domain,
                        r.url.unwrap_or_default(),
                        r.url_domain,
                        r.success.to_string(),
                        r.status_code.map(|v| v.to_string()).unwrap_or_default(),
                        r.err_msg.unwrap_or_default(),
                        r.err_location.unwrap_or_default(),
                        r.duration_ms.to_string(),
                        ms_to_rfc3339(r.received_at_ms),
                    ])?;
                }
                wtr.flush()?;
                return Ok(());
            }
            for r in results {
                match format {
                    OutputFormat::Text => {
                        let outcome = if r.success {
                            format!("ok ({})", r.status_code.unwrap_or_default())
                        } else {
                            format!("failed: {}", r.err_msg.clone().unwrap_or_default())
                        };
                        println!(
                            "[{}] {} {} {} ({} ms)",
                            ms_to_rfc3339(r.received_at_ms),
                            r.host_domain,
                            r.url.clone().unwrap_or_default(),
                            outcome,
                            r.duration_ms,
                        );
                    }
                    OutputFormat::Json => println!("{}", serde_json::to_string(&r)?),
                }
            }
        }
        Commands::SeedLocal { host_domains } => {
            let db = Db::open_or_create(&db_path)?;
            let subdomains: Vec<String> =
                LOCAL_TARGET_SUBDOMAINS.iter().map(|s| s.to_string()).collect();
            db.set_target_generation(LOCAL_PARENT_DOMAIN, &subdomains)?;
            let hosts: Vec<String> = host_domains
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            for host in &hosts {
                db.set_host_mapping(host, LOCAL_REDIRECT_DOMAIN, &[LOCAL_PARENT_DOMAIN.to_string()])?;
            }
            let mut expected: Vec<String> = subdomains.clone();
            expected.sort();
            for host in &hosts {
                let mut got: Vec<String> = db
                    .active_subdomains_for_host(host)?
                    .into_iter()
                    .map(|s| s.domain)
                    .collect();
                got.sort();
                if got != expected {
                    return Err(anyhow!("mapping was INVALID for host '{host}'"));
                }
                info!(host = %host, "mapping verified");
            }
            println!(
                "local testing configuration ready; payloads will launch for requests to {}",
                hosts.join(", ")
            );
        }
    }
    Ok(())
}
