//! Scan results.
//!
//! A [`ScanReport`] keeps only the reachable outcomes, sorted by unit, plus
//! counters for everything that was attempted. Rendering is left to a
//! [`ReportFormatter`].
use crate::{
    probes::{ProbeStatus, Verdict},
    risk::RiskFinding,
    services,
    targets::Unit,
    utils::serde_duration,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, time::Duration};

pub mod formatter;
pub use formatter::{JsonFormatter, ReportFormatter, TextFormatter};

/// Result of one probe attempt against one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub unit: Unit,
    pub status: ProbeStatus,
    pub detail: Option<String>,
    /// Well-known service name, for reachable ports only.
    pub service: Option<String>,
    #[serde(with = "serde_duration")]
    pub elapsed: Duration,
}

impl ProbeOutcome {
    pub fn new(unit: Unit, verdict: Verdict, elapsed: Duration) -> Self {
        let service = match (&unit, verdict.status) {
            (Unit::Port(port), ProbeStatus::Reachable) => {
                services::service_name(*port).map(str::to_string)
            }
            _ => None,
        };

        Self {
            unit,
            status: verdict.status,
            detail: verdict.detail,
            service,
            elapsed,
        }
    }

    pub fn reachable(&self) -> bool {
        self.status == ProbeStatus::Reachable
    }
}

/// Why a scan stopped before every unit was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Cancelled,
    DeadlineExceeded,
}

impl Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Cancelled => write!(f, "cancelled"),
            StopReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Per-status counters over every attempted unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    pub reachable: usize,
    pub not_found: usize,
    pub inconclusive: usize,
    /// Highest number of probes seen in flight at once.
    pub peak_in_flight: usize,
}

impl ScanStats {
    pub(crate) fn count(&mut self, status: ProbeStatus) {
        match status {
            ProbeStatus::Reachable => self.reachable += 1,
            ProbeStatus::NotFound => self.not_found += 1,
            ProbeStatus::Inconclusive => self.inconclusive += 1,
        }
    }
}

/// The final aggregate of one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Normalised host or domain the scan ran against.
    pub target: String,
    /// Reachable outcomes, sorted by unit.
    pub reachable: Vec<ProbeOutcome>,
    /// Units that produced an outcome.
    pub attempted: usize,
    /// Size of the target set.
    pub total_units: usize,
    pub stats: ScanStats,
    #[serde(with = "serde_duration")]
    pub elapsed: Duration,
    pub findings: Vec<RiskFinding>,
    /// `true` when the scan stopped before attempting every unit.
    pub incomplete: bool,
    pub stop_reason: Option<StopReason>,
}

impl ScanReport {
    /// Reachable units in report order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.reachable.iter().map(|outcome| &outcome.unit)
    }

    /// Looks up the outcome for `unit` among the reachable ones.
    pub fn outcome(&self, unit: &Unit) -> Option<&ProbeOutcome> {
        self.reachable
            .binary_search_by(|outcome| outcome.unit.cmp(unit))
            .ok()
            .map(|idx| &self.reachable[idx])
    }
}
