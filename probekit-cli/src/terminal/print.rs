use colored::*;
use probekit::{ProbeOutcome, ReportFormatter, ScanReport, TextFormatter};

pub fn header(msg: &str) {
    eprintln!("{}", format!("=== {} ===", msg.to_uppercase()).bold().cyan());
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", "[*]".yellow().bold(), msg.yellow());
}

pub fn started(total: usize) {
    eprintln!("{} probing {total} units", "[ ]".dimmed());
}

pub fn hit(outcome: &ProbeOutcome) {
    let service = outcome
        .service
        .as_deref()
        .map(|s| format!(" ({s})"))
        .unwrap_or_default();
    eprintln!("{} {}{}", "[+]".green().bold(), outcome.unit, service.dimmed());
}

pub fn progress(attempted: usize, total: usize) {
    eprintln!("{}", format!("[ ] {attempted}/{total}").dimmed());
}

/// Prints the text report on stdout, coloring hits and findings.
pub fn report(report: &ScanReport) {
    for line in TextFormatter.format(report).lines() {
        let colored = if line.starts_with("[+]") {
            line.green()
        } else if line.starts_with("[HIGH]") {
            line.red().bold()
        } else if line.starts_with("[MEDIUM]") {
            line.yellow()
        } else if line.starts_with("[LOW]") {
            line.blue()
        } else if report.incomplete && line.starts_with("units:") {
            line.yellow().bold()
        } else {
            line.normal()
        };
        println!("{colored}");
    }
}
