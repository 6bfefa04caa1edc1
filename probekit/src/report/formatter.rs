use super::*;
use std::fmt::{Debug, Write};

/// Trait for rendering a finished scan.
///
/// A `ReportFormatter` turns a [`ScanReport`] into an output value. It does
/// no I/O; writing the result somewhere is up to the caller.
pub trait ReportFormatter: Send + Sync + 'static {
    type Output: Send + Sync + 'static + Clone + Debug;

    fn format(&self, report: &ScanReport) -> Self::Output;
}

/// Formats a report as human-readable summary lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;
/// Formats a report as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl ReportFormatter for TextFormatter {
    type Output = String;

    fn format(&self, report: &ScanReport) -> Self::Output {
        let mut out = String::new();
        let completion = match report.stop_reason {
            Some(reason) => format!("incomplete, {reason}"),
            None if report.incomplete => "incomplete".to_string(),
            None => "complete".to_string(),
        };

        let _ = writeln!(out, "target: {}", report.target);
        let _ = writeln!(
            out,
            "units: {} attempted / {} total ({completion})",
            report.attempted, report.total_units
        );
        let _ = writeln!(
            out,
            "reachable: {}  not found: {}  inconclusive: {}",
            report.stats.reachable, report.stats.not_found, report.stats.inconclusive
        );
        let _ = writeln!(out, "elapsed: {:.2}s", report.elapsed.as_secs_f64());

        for outcome in &report.reachable {
            let _ = write!(out, "[+] {}", outcome.unit);
            if let Some(service) = &outcome.service {
                let _ = write!(out, " ({service})");
            }
            if let Some(detail) = &outcome.detail {
                let _ = write!(out, " {}", first_line(detail));
            }
            out.push('\n');
        }

        for finding in &report.findings {
            let _ = writeln!(
                out,
                "[{}] {}: {}",
                finding.severity, finding.unit, finding.issue
            );
        }

        out
    }
}

impl ReportFormatter for JsonFormatter {
    type Output = Result<String, String>;

    fn format(&self, report: &ScanReport) -> Self::Output {
        serde_json::to_string_pretty(report).map_err(|e| e.to_string())
    }
}

fn first_line(detail: &str) -> &str {
    detail.lines().next().unwrap_or_default().trim()
}
