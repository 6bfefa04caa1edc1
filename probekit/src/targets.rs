//! # Target sets
//!
//! A [`TargetSet`] describes every [`Unit`] a scan visits:
//!
//! - an inclusive port range (`1-1024`), never materialised in memory
//! - an explicit port list (`22,80,443`)
//! - a subdomain wordlist joined with a base domain (`www` + `example.com`)
//! - a list of opaque names, used by the HTTP fetch probe
//!
//! Sets are normalised once, when they are built: duplicates collapse to a
//! single unit, labels are lowercased and bounds are checked. After that a
//! set is read-only and can hand out units by position, which is what the
//! scanner's shared work source relies on.
//!
//! ```rust
//! use probekit::targets::{TargetSet, Unit};
//!
//! let set = TargetSet::parse_ports("20-22,80").unwrap();
//! let units: Vec<Unit> = set.units().collect();
//!
//! assert_eq!(units, vec![Unit::Port(20), Unit::Port(21), Unit::Port(22), Unit::Port(80)]);
//! ```
use crate::{
    error::ConfigError,
    services,
    utils::{HostKind, validate_label},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt::Display, iter::FusedIterator};

/// One thing to probe.
///
/// Ports sort numerically, names lexicographically; a port always sorts
/// before a name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Unit {
    Port(u16),
    Name(String),
}

impl Unit {
    pub fn as_port(&self) -> Option<u16> {
        match self {
            Unit::Port(port) => Some(*port),
            Unit::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Unit::Port(_) => None,
            Unit::Name(name) => Some(name),
        }
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::Port(port) => write!(f, "{port}"),
            Unit::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<u16> for Unit {
    fn from(port: u16) -> Self {
        Unit::Port(port)
    }
}

impl From<&str> for Unit {
    fn from(name: &str) -> Self {
        Unit::Name(name.to_string())
    }
}

impl From<String> for Unit {
    fn from(name: String) -> Self {
        Unit::Name(name)
    }
}

/// Built-in subdomain wordlist.
pub static DEFAULT_SUBDOMAINS: &[&str] = &[
    "www", "mail", "ftp", "localhost", "webmail", "smtp", "pop", "ns1", "webdisk", "ns2",
    "cpanel", "whm", "autodiscover", "autoconfig", "m", "imap", "test", "ns", "blog", "pop3",
    "dev", "www2", "admin", "forum", "news", "vpn", "ns3", "mail2", "new", "mysql", "old",
    "lists", "support", "mobile", "mx", "static", "docs", "beta", "shop", "sql", "secure",
    "demo", "cp", "calendar", "wiki", "web", "media", "email", "images", "img", "www1",
    "intranet", "portal", "video", "sip", "dns2", "api", "cdn", "stats", "dns1", "ns4", "www3",
    "dns", "search",
];

/// The enumerable collection of units for one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TargetSet {
    /// Inclusive port bounds.
    PortRange { start: u16, end: u16 },
    /// Explicit ports, probed in the given order.
    PortList { ports: Vec<u16> },
    /// `label.domain` for each label.
    Subdomains { domain: String, labels: Vec<String> },
    /// Opaque names handed to the probe as they are.
    Names { names: Vec<String> },
}

impl TargetSet {
    /// Builds an inclusive port range, rejecting `start > end` and port 0.
    pub fn port_range(start: u16, end: u16) -> Result<Self, ConfigError> {
        TargetSet::PortRange { start, end }.normalized()
    }

    /// Builds an explicit port list. Duplicates keep their first position.
    pub fn ports<I>(ports: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = u16>,
    {
        TargetSet::PortList {
            ports: ports.into_iter().collect(),
        }
        .normalized()
    }

    /// Builds a subdomain set over `domain` from a caller-supplied wordlist.
    pub fn subdomains<I, S>(domain: &str, labels: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        TargetSet::Subdomains {
            domain: domain.to_string(),
            labels: labels.into_iter().map(|l| l.as_ref().to_string()).collect(),
        }
        .normalized()
    }

    /// Builds a subdomain set over `domain` from [`DEFAULT_SUBDOMAINS`].
    pub fn default_subdomains(domain: &str) -> Result<Self, ConfigError> {
        Self::subdomains(domain, DEFAULT_SUBDOMAINS.iter())
    }

    /// Builds a set of opaque names.
    pub fn names<I, S>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        TargetSet::Names {
            names: names.into_iter().map(|n| n.as_ref().to_string()).collect(),
        }
        .normalized()
    }

    /// The well-known ports of [`services::COMMON_PORTS`].
    pub fn common_ports() -> Self {
        TargetSet::PortList {
            ports: services::common_ports().collect(),
        }
    }

    /// Every TCP port, `1..=65535`.
    pub fn full_range() -> Self {
        TargetSet::PortRange {
            start: 1,
            end: u16::MAX,
        }
    }

    /// Parses a port specification such as `1-1000,8080,8443`.
    ///
    /// A specification made of a single range stays a lazy
    /// [`TargetSet::PortRange`]; anything else becomes a port list.
    pub fn parse_ports(spec: &str) -> Result<Self, ConfigError> {
        let parts: Vec<&str> = spec
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            return Err(ConfigError::EmptyTargetSet);
        }

        if let [single] = parts.as_slice() {
            if let Some((start, end)) = single.split_once('-') {
                return Self::port_range(parse_port(start)?, parse_port(end)?);
            }
        }

        let mut ports = Vec::new();
        for part in parts {
            match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (parse_port(start)?, parse_port(end)?);
                    if start > end {
                        return Err(ConfigError::InvertedRange { start, end });
                    }
                    ports.extend(start..=end);
                }
                None => ports.push(parse_port(part)?),
            }
        }

        Self::ports(ports)
    }

    /// Checks bounds, collapses duplicates and normalises labels.
    ///
    /// Sets built through the constructors are already normalised; this is
    /// for sets that were deserialized or written out by hand.
    pub fn normalized(self) -> Result<Self, ConfigError> {
        let set = match self {
            TargetSet::PortRange { start, end } => {
                check_port(start)?;
                check_port(end)?;
                if start > end {
                    return Err(ConfigError::InvertedRange { start, end });
                }
                TargetSet::PortRange { start, end }
            }
            TargetSet::PortList { ports } => {
                let mut seen = HashSet::with_capacity(ports.len());
                let mut unique = Vec::with_capacity(ports.len());
                for port in ports {
                    check_port(port)?;
                    if seen.insert(port) {
                        unique.push(port);
                    }
                }
                TargetSet::PortList { ports: unique }
            }
            TargetSet::Subdomains { domain, labels } => {
                let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
                if domain.is_empty() {
                    return Err(ConfigError::EmptyHost);
                }
                HostKind::is_dns(&domain)?;

                let mut seen = HashSet::with_capacity(labels.len());
                let mut unique = Vec::with_capacity(labels.len());
                for label in labels {
                    let label = label.trim().trim_end_matches('.').to_ascii_lowercase();
                    if label.is_empty() {
                        continue;
                    }
                    validate_label(&label)?;
                    if seen.insert(label.clone()) {
                        unique.push(label);
                    }
                }
                TargetSet::Subdomains {
                    domain,
                    labels: unique,
                }
            }
            TargetSet::Names { names } => {
                let mut seen = HashSet::with_capacity(names.len());
                let mut unique = Vec::with_capacity(names.len());
                for name in names {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    if seen.insert(name.to_string()) {
                        unique.push(name.to_string());
                    }
                }
                TargetSet::Names { names: unique }
            }
        };

        if set.is_empty() {
            return Err(ConfigError::EmptyTargetSet);
        }

        Ok(set)
    }

    /// Number of units, computed without iterating.
    pub fn len(&self) -> usize {
        match self {
            TargetSet::PortRange { start, end } if start <= end => {
                usize::from(*end) - usize::from(*start) + 1
            }
            TargetSet::PortRange { .. } => 0,
            TargetSet::PortList { ports } => ports.len(),
            TargetSet::Subdomains { labels, .. } => labels.len(),
            TargetSet::Names { names } => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` for port ranges and port lists.
    pub fn is_ports(&self) -> bool {
        matches!(
            self,
            TargetSet::PortRange { .. } | TargetSet::PortList { .. }
        )
    }

    /// Computes the unit at position `index`, or `None` past the end.
    pub fn unit_at(&self, index: usize) -> Option<Unit> {
        if index >= self.len() {
            return None;
        }

        match self {
            TargetSet::PortRange { start, .. } => u16::try_from(usize::from(*start) + index)
                .ok()
                .map(Unit::Port),
            TargetSet::PortList { ports } => ports.get(index).copied().map(Unit::Port),
            TargetSet::Subdomains { domain, labels } => labels
                .get(index)
                .map(|label| Unit::Name(format!("{label}.{domain}"))),
            TargetSet::Names { names } => names.get(index).cloned().map(Unit::Name),
        }
    }

    /// A fresh lazy iterator over every unit, in set order.
    pub fn units(&self) -> Units<'_> {
        Units {
            set: self,
            next: 0,
            len: self.len(),
        }
    }
}

impl<'a> IntoIterator for &'a TargetSet {
    type Item = Unit;
    type IntoIter = Units<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.units()
    }
}

/// Lazy iterator returned by [`TargetSet::units`].
#[derive(Debug, Clone)]
pub struct Units<'a> {
    set: &'a TargetSet,
    next: usize,
    len: usize,
}

impl Iterator for Units<'_> {
    type Item = Unit;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.len {
            return None;
        }
        let unit = self.set.unit_at(self.next);
        self.next += 1;
        unit
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Units<'_> {}

impl FusedIterator for Units<'_> {}

fn check_port(port: u16) -> Result<(), ConfigError> {
    if port == 0 {
        return Err(ConfigError::PortOutOfRange(0));
    }
    Ok(())
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    let raw = raw.trim();
    let value: u32 = raw
        .parse()
        .map_err(|_| ConfigError::InvalidPortSpec(raw.to_string()))?;

    if value == 0 || value > u32::from(u16::MAX) {
        return Err(ConfigError::PortOutOfRange(value));
    }

    Ok(value as u16)
}
