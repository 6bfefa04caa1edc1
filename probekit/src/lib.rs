//! # probekit
//!
//! A bounded-concurrency network probe engine. One scheduler runs many
//! short, failure-prone checks against a single host under a concurrency
//! cap and an optional deadline, and folds the positive results into a
//! sorted, deterministic report.
//!
//! ## Features
//!
//! (always available)
//! - **TCP reachability** - connect probe with optional banner grabbing
//! - **Scheduler** - fixed worker pool, cancellation, overall deadline, live events
//! - **Target sets** - port ranges, port lists, subdomain wordlists, opaque names
//! - **Risk table** - severity annotations for risky exposed ports
//! - **Report formatting** - text and JSON renderings of a finished scan
//!
//! ("dns" feature, default)
//! - **DNS existence probe** - subdomain liveness through `hickory-resolver`
//!
//! ("http" feature, default)
//! - **HTTP fetch probe** - templated URL checks through `reqwest`, for archive and API crawling
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! probekit = { version = "0.1" }
//! probekit = { version = "0.1", default-features = false }
//! ```
//!
//! ### Port scan
//!
//! ```rust,no_run
//! use probekit::{ReportFormatter, ScanConfiguration, Scanner, TargetSet, TcpConnectProbe, TextFormatter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfiguration::builder("192.168.1.10", TargetSet::common_ports())
//!         .concurrency(50)
//!         .build()?;
//!
//!     let report = Scanner::new(TcpConnectProbe::new()).run(config).await?;
//!     print!("{}", TextFormatter.format(&report));
//!     Ok(())
//! }
//! ```
//!
//! ### Subdomain enumeration
//!
//! ```rust,no_run
//! # #[cfg(feature = "dns")]
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use probekit::{DnsResolveProbe, ScanConfiguration, Scanner, TargetSet};
//!
//! let targets = TargetSet::default_subdomains("example.com")?;
//! let config = ScanConfiguration::builder("example.com", targets).build()?;
//! let probe = DnsResolveProbe::new(config.probe_timeout());
//!
//! let report = Scanner::new(probe).run(config).await?;
//! for outcome in &report.reachable {
//!     println!("{} -> {}", outcome.unit, outcome.detail.as_deref().unwrap_or("-"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Negative probe results are never errors. The only error a scan can
//! return is a [`ConfigError`], raised before the first probe runs:
//!
//! ```rust
//! use probekit::{ConfigError, TargetSet};
//!
//! match TargetSet::port_range(1000, 1) {
//!     Err(ConfigError::InvertedRange { start, end }) => eprintln!("{start} > {end}"),
//!     other => panic!("{other:?}"),
//! }
//! ```
//!
//! ## Logging
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod config;
pub mod error;
pub mod probes;
pub mod report;
pub mod risk;
pub mod scanner;
pub mod services;
pub mod targets;
pub mod utils;

pub use config::{ScanConfiguration, ScanConfigurationBuilder};
pub use error::{ConfigError, ProbeError};
pub use probes::{BannerOptions, Probe, ProbeContext, ProbeStatus, TcpConnectProbe, Verdict};
pub use report::{
    JsonFormatter, ProbeOutcome, ReportFormatter, ScanReport, ScanStats, StopReason, TextFormatter,
};
pub use risk::{RiskClassifier, RiskFinding, RiskRule, Severity};
pub use scanner::{ScanEvent, ScanEventStream, Scanner};
pub use targets::{TargetSet, Unit};

cfg_if::cfg_if! {
    if #[cfg(feature = "dns")] {
        pub use probes::DnsResolveProbe;
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "http")] {
        pub use probes::{ContentCheck, HttpFetchProbe};
    }
}
