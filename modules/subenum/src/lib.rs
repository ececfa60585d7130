//! Subdomain enumeration by orchestrating the external amass binary.
//!
//! An `enum` run populates the amass database; a follow-up `db` query reads
//! back every name known for the parent domain.

use regex::Regex;
use std::process::Command;
use thiserror::Error;

pub const DEFAULT_BIN: &str = "amass";

#[derive(Debug, Error)]
pub enum EnumError {
    #[error("'{0}' is not a valid domain")]
    InvalidDomain(String),
    #[error("bad status code from {command} invocation ({status}). STDERR was '{stderr}'")]
    BadExit {
        command: String,
        status: i32,
        stderr: String,
    },
    #[error("failed to spawn enumerator binary: {0}")]
    Spawn(#[from] std::io::Error),
}

pub fn is_valid_domain(domain: &str) -> bool {
    let re = Regex::new(
        r"^(?i)[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)+$",
    )
    .unwrap();
    re.is_match(domain)
}

fn invoke(bin_path: &str, args: &[&str]) -> Result<(String, String, i32), EnumError> {
    let output = Command::new(bin_path).args(args).output()?;
    Ok((
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
        output.status.code().unwrap_or(-1),
    ))
}

/// Query the enumerator's database for every subdomain known under the
/// parent domain.
pub fn query_known_subdomains(domain: &str, bin_path: &str) -> Result<Vec<String>, EnumError> {
    if !is_valid_domain(domain) {
        return Err(EnumError::InvalidDomain(domain.to_string()));
    }
    let (stdout, stderr, status) = invoke(bin_path, &["db", "-d", domain, "-names"])?;
    if status != 0 {
        return Err(EnumError::BadExit {
            command: "db".into(),
            status,
            stderr,
        });
    }
    Ok(stdout
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}

/// Run a full enumeration pass for the parent domain, then read back
/// everything the enumerator now knows about it.
pub fn enumerate_subdomains(domain: &str, bin_path: &str) -> Result<Vec<String>, EnumError> {
    if !is_valid_domain(domain) {
        return Err(EnumError::InvalidDomain(domain.to_string()));
    }
    let (_, stderr, status) = invoke(bin_path, &["enum", "-d", domain])?;
    if status != 0 {
        return Err(EnumError::BadExit {
            command: "enum".into(),
            status,
            stderr,
        });
    }
    query_known_subdomains(domain, bin_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ordinary_domains() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("deep.sub.example.co.uk"));
        assert!(is_valid_domain("xn--bcher-kva.example"));
    }

    #[test]
    fn rejects_malformed_domains() {
        assert!(!is_valid_domain(""));
        assert!(!is_valid_domain("nodots"));
        assert!(!is_valid_domain("-leading.example.com"));
        assert!(!is_valid_domain("spaces in.example.com"));
        assert!(!is_valid_domain("semi;colon.example.com"));
    }

    #[test]
    fn invalid_domain_short_circuits_before_spawning() {
        let err = enumerate_subdomains("not a domain", "/nonexistent/amass").unwrap_err();
        assert!(matches!(err, EnumError::InvalidDomain(_)));
    }

    #[test]
    fn missing_binary_surfaces_spawn_error() {
        let err = query_known_subdomains("example.com", "/nonexistent/amass").unwrap_err();
        assert!(matches!(err, EnumError::Spawn(_)));
    }
}
