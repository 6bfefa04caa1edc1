//! Host and label validation.
//!
//! A scan target is accepted when it is one of:
//! - a DNS name (`example.com`, `localhost`)
//! - an IPv4 address (`192.168.1.10`)
//! - an IPv6 address, with or without brackets (`::1`, `[::1]`)
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    net::{Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

/// The kind of host a scan points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostKind {
    Dns,
    IPv4,
    IPv6,
}

impl Display for HostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostKind::Dns => write!(f, "dns"),
            HostKind::IPv4 => write!(f, "ipv4"),
            HostKind::IPv6 => write!(f, "ipv6"),
        }
    }
}

impl HostKind {
    /// Detects the kind of `host`, trying IP literals before DNS names.
    pub fn detect(host: &str) -> Result<HostKind, ConfigError> {
        if host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }

        HostKind::is_ipv4(host)
            .or_else(|_| HostKind::is_ipv6(host))
            .or_else(|_| HostKind::is_dns(host))
    }

    /// Checks if the provided string is a valid DNS name.
    ///
    /// # Rules
    /// - Maximum length: 253 characters
    /// - Each label ≤ 63 characters
    /// - Cannot start or end with `-`
    /// - Only ASCII alphanumeric characters and `-` allowed
    /// - A single trailing dot (fully qualified form) is accepted
    pub fn is_dns(host: &str) -> Result<HostKind, ConfigError> {
        let name = host.strip_suffix('.').unwrap_or(host);

        if name.is_empty() || name.len() > 253 {
            return Err(ConfigError::InvalidHost(host.to_string()));
        }

        if name.split('.').all(is_valid_dns_label) {
            Ok(HostKind::Dns)
        } else {
            Err(ConfigError::InvalidHost(host.to_string()))
        }
    }

    /// Checks if the provided string is a valid IPv4 address.
    pub fn is_ipv4(host: &str) -> Result<HostKind, ConfigError> {
        match Ipv4Addr::from_str(host) {
            Ok(_) => Ok(HostKind::IPv4),
            Err(_) => Err(ConfigError::InvalidHost(host.to_string())),
        }
    }

    /// Checks if the provided string is a valid IPv6 address.
    pub fn is_ipv6(host: &str) -> Result<HostKind, ConfigError> {
        let clean_ip = host.trim_matches(['[', ']'].as_ref());
        match Ipv6Addr::from_str(clean_ip) {
            Ok(_) => Ok(HostKind::IPv6),
            Err(_) => Err(ConfigError::InvalidHost(host.to_string())),
        }
    }
}

fn is_valid_dns_label(label: &str) -> bool {
    if label.is_empty() || label.len() > 63 {
        return false;
    }

    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }

    label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Validates `host` and returns the form the probes connect to.
///
/// Surrounding whitespace is removed, DNS names are lowercased and IPv6
/// brackets are stripped so the value can be paired with a port directly.
pub fn normalize_host(host: &str) -> Result<String, ConfigError> {
    let host = host.trim();

    match HostKind::detect(host)? {
        HostKind::IPv4 => Ok(host.to_string()),
        HostKind::IPv6 => Ok(host.trim_matches(['[', ']'].as_ref()).to_string()),
        HostKind::Dns => Ok(host.to_ascii_lowercase()),
    }
}

/// Validates a subdomain wordlist entry.
///
/// Entries may span several levels (`dev.api`), each level following the
/// DNS label rules. Underscores are allowed for service labels (`_dmarc`).
pub fn validate_label(label: &str) -> Result<(), ConfigError> {
    let valid = label.split('.').all(|part| {
        !part.is_empty()
            && part.len() <= 63
            && !part.starts_with('-')
            && !part.ends_with('-')
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    });

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidLabel(label.to_string()))
    }
}
