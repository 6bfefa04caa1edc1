//! # Probes
//!
//! A [`Probe`] is a single-attempt, bounded-time check of one [`Unit`]
//! against the scan host. The scanner owns scheduling, timeouts and fault
//! isolation; a probe only answers "is this unit there?" with a
//! [`Verdict`].
//!
//! | Adapter              | Unit              | Reachable when                         | Feature |
//! |----------------------|-------------------|----------------------------------------|---------|
//! | [`TcpConnectProbe`]  | `Unit::Port`      | the TCP handshake completes            | always  |
//! | `DnsResolveProbe`    | `Unit::Name`      | at least one address record comes back | `dns`   |
//! | `HttpFetchProbe`     | any               | 2xx with acceptable content            | `http`  |
//!
//! Probes are shared by every worker of a scan through an `Arc`, so they
//! must be `Send + Sync` and keep no mutable per-scan state.
//!
//! ## Writing your own probe
//!
//! ```rust
//! use async_trait::async_trait;
//! use probekit::probes::{Probe, ProbeContext, Verdict};
//! use probekit::error::ProbeError;
//! use std::time::Duration;
//!
//! struct EvenPorts;
//!
//! #[async_trait]
//! impl Probe for EvenPorts {
//!     fn name(&self) -> &'static str {
//!         "even-ports"
//!     }
//!
//!     async fn probe(&self, ctx: &ProbeContext<'_>, _timeout: Duration) -> Result<Verdict, ProbeError> {
//!         match ctx.unit.as_port() {
//!             Some(port) if port % 2 == 0 => Ok(Verdict::reachable(None)),
//!             _ => Ok(Verdict::not_found("odd")),
//!         }
//!     }
//! }
//! ```
use crate::{error::ProbeError, targets::Unit};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, time::Duration};

mod buffer_pool;
pub mod tcp;
pub use tcp::{BannerOptions, TcpConnectProbe};

cfg_if::cfg_if! {
    if #[cfg(feature = "dns")] {
        pub mod dns;
        pub use dns::DnsResolveProbe;
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "http")] {
        pub mod http;
        pub use http::{ContentCheck, HttpFetchProbe};
    }
}

/// What a probe is pointed at.
#[derive(Debug, Clone, Copy)]
pub struct ProbeContext<'a> {
    /// Normalised scan host or base domain.
    pub host: &'a str,
    pub unit: &'a Unit,
}

/// Tri-state result of one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// Unambiguous success within the timeout.
    Reachable,
    /// A definite negative: refused, NXDOMAIN, no data, non-2xx.
    NotFound,
    /// No answer could be established: timeouts and faults.
    Inconclusive,
}

impl Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStatus::Reachable => write!(f, "reachable"),
            ProbeStatus::NotFound => write!(f, "not found"),
            ProbeStatus::Inconclusive => write!(f, "inconclusive"),
        }
    }
}

/// A probe's answer for one unit, before the scanner stamps it with the
/// unit and the measured time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: ProbeStatus,
    /// Resolved address, banner, status line or error cause.
    pub detail: Option<String>,
}

impl Verdict {
    pub fn reachable(detail: Option<String>) -> Self {
        Self {
            status: ProbeStatus::Reachable,
            detail,
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::NotFound,
            detail: Some(detail.into()),
        }
    }

    pub fn inconclusive(detail: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Inconclusive,
            detail: Some(detail.into()),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.status == ProbeStatus::Reachable
    }
}

/// A single-attempt reachability check.
///
/// Implementations must honour `timeout` themselves. The scanner also cuts
/// off any probe that overruns it by a small grace period and records the
/// unit as inconclusive.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn probe(&self, ctx: &ProbeContext<'_>, timeout: Duration) -> Result<Verdict, ProbeError>;
}
