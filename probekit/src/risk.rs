//! Post-scan risk annotation.
//!
//! A [`RiskClassifier`] is a read-only rule table matched against the
//! reachable outcomes of a finished scan. It never looks at negatives and
//! never mutates the outcomes it is given.
use crate::{report::ProbeOutcome, targets::Unit};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Display,
    sync::Arc,
};

/// Severity of a finding. Orders `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// One table entry: a unit that is risky to expose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskRule {
    pub unit: Unit,
    pub severity: Severity,
    pub issue: String,
}

impl RiskRule {
    pub fn new(unit: impl Into<Unit>, severity: Severity, issue: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            severity,
            issue: issue.into(),
        }
    }
}

/// A reachable unit that matched a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub unit: Unit,
    pub severity: Severity,
    pub issue: String,
}

struct PortRisk {
    port: u16,
    severity: Severity,
    issue: &'static str,
}

static PORT_RISKS: &[PortRisk] = &[
    PortRisk {
        port: 21,
        severity: Severity::Medium,
        issue: "FTP exposed: credentials and data travel unencrypted",
    },
    PortRisk {
        port: 23,
        severity: Severity::High,
        issue: "Telnet exposed: unencrypted remote access protocol",
    },
    PortRisk {
        port: 445,
        severity: Severity::Medium,
        issue: "SMB exposed: target of EternalBlue-class exploits",
    },
    PortRisk {
        port: 3389,
        severity: Severity::Medium,
        issue: "RDP exposed: target of credential brute-force attacks",
    },
];

static DEFAULT_PORT_CLASSIFIER: Lazy<Arc<RiskClassifier>> =
    Lazy::new(|| Arc::new(RiskClassifier::new(default_port_rules())));

/// The built-in risky-port table as rules.
pub fn default_port_rules() -> Vec<RiskRule> {
    PORT_RISKS
        .iter()
        .map(|risk| RiskRule::new(risk.port, risk.severity, risk.issue))
        .collect()
}

/// Stateless `unit → (severity, issue)` matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiskClassifier {
    rules: BTreeMap<Unit, RiskRule>,
}

impl RiskClassifier {
    /// Builds a classifier from `rules`. A later rule for the same unit
    /// replaces an earlier one.
    pub fn new(rules: impl IntoIterator<Item = RiskRule>) -> Self {
        Self {
            rules: rules
                .into_iter()
                .map(|rule| (rule.unit.clone(), rule))
                .collect(),
        }
    }

    /// Shared instance over [`default_port_rules`], built on first use.
    pub fn default_ports() -> Arc<RiskClassifier> {
        Arc::clone(&DEFAULT_PORT_CLASSIFIER)
    }

    pub fn rule_for(&self, unit: &Unit) -> Option<&RiskRule> {
        self.rules.get(unit)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Emits one finding per reachable unit that has a rule, in unit order.
    pub fn classify(&self, outcomes: &[ProbeOutcome]) -> Vec<RiskFinding> {
        let matched: BTreeSet<&Unit> = outcomes
            .iter()
            .filter(|outcome| outcome.reachable())
            .map(|outcome| &outcome.unit)
            .filter(|unit| self.rules.contains_key(*unit))
            .collect();

        matched
            .into_iter()
            .filter_map(|unit| self.rules.get(unit))
            .map(|rule| RiskFinding {
                unit: rule.unit.clone(),
                severity: rule.severity,
                issue: rule.issue.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::Verdict;
    use std::time::Duration;

    fn open(port: u16) -> ProbeOutcome {
        ProbeOutcome::new(Unit::Port(port), Verdict::reachable(None), Duration::ZERO)
    }

    fn closed(port: u16) -> ProbeOutcome {
        ProbeOutcome::new(
            Unit::Port(port),
            Verdict::not_found("connection refused"),
            Duration::ZERO,
        )
    }

    #[test]
    fn test_risk_telnet_is_one_high_finding() {
        let rule = RiskClassifier::default_ports().rule_for(&Unit::Port(23)).cloned();
        assert_eq!(rule.map(|rule| rule.severity), Some(Severity::High));

        let findings = RiskClassifier::default_ports().classify(&[open(23)]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].unit, Unit::Port(23));
        assert_eq!(findings[0].severity, Severity::High);
    }

    #[test]
    fn test_risk_https_alone_has_no_findings() {
        assert!(RiskClassifier::default_ports().classify(&[open(443)]).is_empty());
        assert!(RiskClassifier::default_ports().classify(&[open(22)]).is_empty());
    }

    #[test]
    fn test_risk_ignores_negatives_and_duplicates() {
        let classifier = RiskClassifier::default_ports();
        assert!(classifier.classify(&[closed(23), closed(445)]).is_empty());

        let findings = classifier.classify(&[open(3389), open(21), open(3389), open(80)]);
        let units: Vec<&Unit> = findings.iter().map(|f| &f.unit).collect();
        assert_eq!(units, vec![&Unit::Port(21), &Unit::Port(3389)]);
        assert!(findings.iter().all(|f| f.severity == Severity::Medium));
    }

    #[test]
    fn test_risk_custom_rules_for_names() {
        let classifier = RiskClassifier::new([RiskRule::new(
            "admin.example.com",
            Severity::Low,
            "admin panel published",
        )]);
        let outcome = ProbeOutcome::new(
            Unit::Name("admin.example.com".to_string()),
            Verdict::reachable(None),
            Duration::ZERO,
        );
        assert_eq!(
            classifier.rule_for(&outcome.unit).map(|rule| rule.issue.as_str()),
            Some("admin panel published")
        );
        assert!(classifier.rule_for(&Unit::Port(23)).is_none());

        let findings = classifier.classify(&[outcome]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Low);
        assert!(RiskClassifier::default_ports().classify(&[]).is_empty());
    }

    #[test]
    fn test_risk_severity_order_and_display() {
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
        assert_eq!(Severity::High.to_string(), "HIGH");
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), r#""MEDIUM""#);
    }
}
