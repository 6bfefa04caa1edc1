//! Scan configuration.
//!
//! A [`ScanConfiguration`] is the immutable input of one scan. It is built
//! through [`ScanConfigurationBuilder`], which validates everything up front
//! so a bad host or an empty target set is rejected before any probe runs.
//!
//! ```rust
//! use probekit::config::ScanConfiguration;
//! use probekit::targets::TargetSet;
//! use std::time::Duration;
//!
//! let config = ScanConfiguration::builder("127.0.0.1", TargetSet::port_range(1, 1024).unwrap())
//!     .concurrency(100)
//!     .probe_timeout(Duration::from_millis(500))
//!     .deadline(Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.concurrency(), 100);
//! ```
use crate::{
    error::ConfigError,
    targets::TargetSet,
    utils::{normalize_host, serde_duration},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CONCURRENCY: usize = 50;
pub const DEFAULT_PORT_TIMEOUT: Duration = Duration::from_secs(1);
pub const DEFAULT_NAME_TIMEOUT: Duration = Duration::from_secs(3);

/// Per-probe timeout used when none is set: short for ports, longer for
/// lookups and fetches.
pub fn default_timeout_for(targets: &TargetSet) -> Duration {
    if targets.is_ports() {
        DEFAULT_PORT_TIMEOUT
    } else {
        DEFAULT_NAME_TIMEOUT
    }
}

/// Immutable input of one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfiguration {
    host: String,
    targets: TargetSet,
    concurrency: usize,
    #[serde(with = "serde_duration")]
    probe_timeout: Duration,
    #[serde(with = "serde_duration::option", default)]
    deadline: Option<Duration>,
}

impl ScanConfiguration {
    pub fn builder(host: impl Into<String>, targets: TargetSet) -> ScanConfigurationBuilder {
        ScanConfigurationBuilder {
            host: host.into(),
            targets,
            concurrency: DEFAULT_CONCURRENCY,
            probe_timeout: None,
            deadline: None,
        }
    }

    /// Re-checks every field and normalises host and targets.
    ///
    /// The scanner calls this on every run, so a configuration that was
    /// deserialized instead of built is held to the same rules.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let host = normalize_host(&self.host)?;

        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(ConfigError::ZeroDeadline);
        }

        Ok(Self {
            host,
            targets: self.targets.normalized()?,
            concurrency: self.concurrency,
            probe_timeout: self.probe_timeout,
            deadline: self.deadline,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }
}

/// Builder returned by [`ScanConfiguration::builder`].
#[derive(Debug, Clone)]
pub struct ScanConfigurationBuilder {
    host: String,
    targets: TargetSet,
    concurrency: usize,
    probe_timeout: Option<Duration>,
    deadline: Option<Duration>,
}

impl ScanConfigurationBuilder {
    /// Maximum number of probes in flight at once.
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Bounds the whole scan; no unit is dispatched after it passes.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn maybe_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn build(self) -> Result<ScanConfiguration, ConfigError> {
        let probe_timeout = self
            .probe_timeout
            .unwrap_or_else(|| default_timeout_for(&self.targets));

        ScanConfiguration {
            host: self.host,
            targets: self.targets,
            concurrency: self.concurrency,
            probe_timeout,
            deadline: self.deadline,
        }
        .validated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports() -> TargetSet {
        TargetSet::port_range(1, 100).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = ScanConfiguration::builder("example.com", ports()).build().unwrap();
        assert_eq!(config.concurrency(), DEFAULT_CONCURRENCY);
        assert_eq!(config.probe_timeout(), DEFAULT_PORT_TIMEOUT);
        assert_eq!(config.deadline(), None);

        let names = TargetSet::default_subdomains("example.com").unwrap();
        let config = ScanConfiguration::builder("example.com", names).build().unwrap();
        assert_eq!(config.probe_timeout(), DEFAULT_NAME_TIMEOUT);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        assert_eq!(
            ScanConfiguration::builder("", ports()).build(),
            Err(ConfigError::EmptyHost)
        );
        assert_eq!(
            ScanConfiguration::builder("bad host!", ports()).build(),
            Err(ConfigError::InvalidHost("bad host!".to_string()))
        );
        assert_eq!(
            ScanConfiguration::builder("localhost", ports())
                .concurrency(0)
                .build(),
            Err(ConfigError::ZeroConcurrency)
        );
        assert_eq!(
            ScanConfiguration::builder("localhost", ports())
                .probe_timeout(Duration::ZERO)
                .build(),
            Err(ConfigError::ZeroTimeout)
        );
        assert_eq!(
            ScanConfiguration::builder("localhost", ports())
                .deadline(Duration::ZERO)
                .build(),
            Err(ConfigError::ZeroDeadline)
        );
    }

    #[test]
    fn test_config_normalizes_host() {
        let config = ScanConfiguration::builder(" [::1] ", ports()).build().unwrap();
        assert_eq!(config.host(), "::1");
    }

    #[test]
    fn test_config_deserialized_input_is_revalidated() {
        let json = r#"{
            "host": "LOCALHOST",
            "targets": {"mode": "port_list", "ports": [80, 80, 443]},
            "concurrency": 4,
            "probe_timeout": 250
        }"#;
        let config: ScanConfiguration = serde_json::from_str(json).unwrap();
        assert_eq!(config.deadline(), None);

        let config = config.validated().unwrap();
        assert_eq!(config.host(), "localhost");
        assert_eq!(config.targets().len(), 2);
        assert_eq!(config.probe_timeout(), Duration::from_millis(250));

        let bad = r#"{"host": "localhost", "targets": {"mode": "port_range", "start": 10, "end": 1},
                      "concurrency": 4, "probe_timeout": 250, "deadline": 1000}"#;
        let bad: ScanConfiguration = serde_json::from_str(bad).unwrap();
        assert_eq!(
            bad.validated(),
            Err(ConfigError::InvertedRange { start: 10, end: 1 })
        );
    }
}
