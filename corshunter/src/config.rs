#![allow(dead_code)]
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, Clone)]
pub struct ScanConfig {
    pub timeout_ms: Option<u64>,
    pub pool_size: Option<usize>,
    pub amass_bin: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub scan: Option<ScanConfig>,
}

/// One host block of a hosts configuration document: the externally-visible
/// domain, where its payload redirects to, and the target domains whose
/// subdomains feed the payload.
#[derive(Debug, Deserialize, Clone)]
pub struct HostBlock {
    pub host_domain: String,
    pub redirect_domain: String,
    #[serde(default)]
    pub targets: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct HostsFile {
    #[serde(default)]
    pub hosts: Vec<HostBlock>,
}

pub fn load_config(path: Option<&Path>) -> Option<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let p = Path::new("corshunter.yaml");
            if p.exists() { p.to_path_buf() } else { return None; }
        }
    };
    let s = fs::read_to_string(path).ok()?;
    serde_yaml::from_str(&s).ok()
}

pub fn load_hosts_file(path: &Path) -> anyhow::Result<HostsFile> {
    let s = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&s)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosts_document_parses() {
        let doc = r#"
hosts:
  - host_domain: lure.example.com
    redirect_domain: www.example.org
    targets:
      - corp.io
      - intra.net
  - host_domain: other.example.com
    redirect_domain: www.example.org
"#;
        let parsed: HostsFile = serde_yaml::from_str(doc).unwrap();
        assert_eq!(parsed.hosts.len(), 2);
        assert_eq!(parsed.hosts[0].host_domain, "lure.example.com");
        assert_eq!(parsed.hosts[0].targets, vec!["corp.io", "intra.net"]);
        assert!(parsed.hosts[1].targets.is_empty());
    }

    #[test]
    fn tool_config_parses_with_partial_fields() {
        let doc = r#"
db_path: /tmp/hunter.db
scan:
  timeout_ms: 2500
"#;
        let parsed: Config = serde_yaml::from_str(doc).unwrap();
        assert_eq!(parsed.db_path.as_deref(), Some(Path::new("/tmp/hunter.db")));
        let scan = parsed.scan.unwrap();
        assert_eq!(scan.timeout_ms, Some(2500));
        assert!(scan.pool_size.is_none());
    }
}
