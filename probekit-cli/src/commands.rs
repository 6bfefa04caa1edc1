pub mod fetch;
pub mod ports;
pub mod run;
pub mod subdomains;

use clap::{Args, Parser, Subcommand};
use probekit::{ConfigError, ScanConfiguration, TargetSet, config::DEFAULT_CONCURRENCY};
use std::{path::PathBuf, time::Duration};

#[derive(Parser)]
#[command(name = "probekit", version)]
#[command(about = "Bounded-concurrency port, subdomain and HTTP probing.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,
    #[command(flatten)]
    pub scan: ScanArgs,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the TCP ports of a host
    #[command(alias = "p")]
    Ports {
        host: String,
        #[command(flatten)]
        selection: PortSelection,
        /// Read a short banner from every open port
        #[arg(long)]
        banner: bool,
    },
    /// Enumerate the subdomains of a domain
    #[command(alias = "s")]
    Subdomains {
        domain: String,
        /// One label per line; `#` starts a comment
        #[arg(short, long, value_name = "FILE")]
        wordlist: Option<PathBuf>,
    },
    /// Fetch a templated URL for each name
    #[command(alias = "f")]
    Fetch {
        /// Substituted for `{host}` in the template
        host: String,
        /// URL template containing `{unit}`
        template: String,
        #[arg(long, value_delimiter = ',', required = true)]
        names: Vec<String>,
        /// Only count bodies that parse as JSON
        #[arg(long)]
        json_content: bool,
    },
}

/// Which ports to scan. Defaults to the well-known table.
#[derive(Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct PortSelection {
    /// Inclusive range, e.g. 1-1024
    #[arg(long, value_name = "S-E")]
    pub range: Option<String>,
    /// Comma separated ports and ranges, e.g. 22,80,8000-8100
    #[arg(long, value_name = "LIST")]
    pub ports: Option<String>,
    /// The well-known ports table
    #[arg(long)]
    pub common: bool,
    /// Every port, 1-65535
    #[arg(long)]
    pub full: bool,
}

impl PortSelection {
    pub fn targets(&self) -> Result<TargetSet, ConfigError> {
        if self.full {
            return Ok(TargetSet::full_range());
        }
        match (&self.range, &self.ports) {
            (Some(spec), _) | (None, Some(spec)) => TargetSet::parse_ports(spec),
            (None, None) => Ok(TargetSet::common_ports()),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Maximum number of probes in flight
    #[arg(short, long, global = true)]
    pub concurrency: Option<usize>,
    /// Per-probe timeout in milliseconds
    #[arg(long = "timeout-ms", global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,
    /// Stop dispatching new probes after this many seconds
    #[arg(long = "deadline-secs", global = true, value_name = "SECS")]
    pub deadline_secs: Option<u64>,
    /// Print the final report as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

impl ScanArgs {
    /// Builds the scan configuration; `fallback` fills what the flags leave unset.
    pub fn configure(
        &self,
        host: &str,
        targets: TargetSet,
        fallback: Fallback,
    ) -> Result<ScanConfiguration, ConfigError> {
        let mut builder = ScanConfiguration::builder(host, targets)
            .concurrency(self.concurrency.unwrap_or(fallback.concurrency))
            .maybe_deadline(self.deadline_secs.map(Duration::from_secs));

        if let Some(timeout) = self.timeout_ms.map(Duration::from_millis).or(fallback.timeout) {
            builder = builder.probe_timeout(timeout);
        }

        builder.build()
    }
}

/// Per-command defaults for flags the user did not pass.
#[derive(Debug, Clone, Copy)]
pub struct Fallback {
    pub concurrency: usize,
    pub timeout: Option<Duration>,
}

impl Default for Fallback {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: None,
        }
    }
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_port_scan() {
        let cli = CommandLine::try_parse_from([
            "probekit", "ports", "127.0.0.1", "--range", "1-100", "-c", "20", "--json",
        ])
        .unwrap();
        assert_eq!(cli.scan.concurrency, Some(20));
        assert!(cli.scan.json);
        match cli.command {
            Commands::Ports { host, selection, .. } => {
                assert_eq!(host, "127.0.0.1");
                assert_eq!(selection.targets().unwrap().len(), 100);
            }
            _ => panic!("expected ports"),
        }
    }

    #[test]
    fn test_cli_port_selection_is_exclusive() {
        assert!(
            CommandLine::try_parse_from(["probekit", "ports", "h", "--full", "--common"]).is_err()
        );
    }

    #[test]
    fn test_cli_default_selection_is_common_ports() {
        let targets = PortSelection::default().targets().unwrap();
        assert_eq!(targets, TargetSet::common_ports());
    }

    #[test]
    fn test_cli_fetch_requires_names() {
        assert!(CommandLine::try_parse_from(["probekit", "fetch", "archive.org", "http://{host}/{unit}"]).is_err());
        let cli = CommandLine::try_parse_from([
            "probekit",
            "fetch",
            "archive.org",
            "http://{host}/wayback/available?url={unit}",
            "--names",
            "example.com,example.org",
        ])
        .unwrap();
        match cli.command {
            Commands::Fetch { names, .. } => assert_eq!(names, vec!["example.com", "example.org"]),
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn test_cli_configure_applies_fallback() {
        let args = ScanArgs {
            concurrency: None,
            timeout_ms: None,
            deadline_secs: Some(5),
            json: false,
        };
        let config = args
            .configure(
                "localhost",
                TargetSet::full_range(),
                Fallback {
                    concurrency: 100,
                    timeout: Some(Duration::from_millis(500)),
                },
            )
            .unwrap();
        assert_eq!(config.concurrency(), 100);
        assert_eq!(config.probe_timeout(), Duration::from_millis(500));
        assert_eq!(config.deadline(), Some(Duration::from_secs(5)));
    }
}
