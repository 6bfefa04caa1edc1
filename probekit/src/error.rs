use thiserror::Error;

/// Reasons a scan is rejected before any unit is probed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("the target host is empty")]
    EmptyHost,
    #[error("invalid target host `{0}` => expected a DNS name, an IPv4 or an IPv6 address")]
    InvalidHost(String),
    #[error("invalid port {0} => (1 -> 65,535)")]
    PortOutOfRange(u32),
    #[error("invalid port range {start}-{end} => the start port is above the end port")]
    InvertedRange { start: u16, end: u16 },
    #[error("invalid port specification `{0}`")]
    InvalidPortSpec(String),
    #[error("invalid subdomain label `{0}`")]
    InvalidLabel(String),
    #[error("the target set is empty")]
    EmptyTargetSet,
    #[error("the concurrency limit must be at least 1")]
    ZeroConcurrency,
    #[error("the per-probe timeout must be greater than zero")]
    ZeroTimeout,
    #[error("the overall deadline must be greater than zero")]
    ZeroDeadline,
    #[error("invalid url template `{0}` => it must contain the `{{unit}}` placeholder")]
    InvalidTemplate(String),
}

/// An unexpected fault raised inside a probe adapter.
///
/// Normal negatives (refused, NXDOMAIN, timeouts) are not errors; they come
/// back as a [`Verdict`](crate::probes::Verdict). Anything returned as a
/// `ProbeError` is downgraded by the scanner into an inconclusive outcome.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("the probe does not handle unit `{0}`")]
    UnsupportedUnit(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[cfg(feature = "http")]
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}
