//! DNS existence probe built on `hickory-resolver`.
use super::{Probe, ProbeContext, Verdict};
use crate::error::ProbeError;
use async_trait::async_trait;
use hickory_resolver::{
    TokioAsyncResolver,
    config::{ResolverConfig, ResolverOpts},
    error::ResolveErrorKind,
    proto::op::ResponseCode,
    system_conf::read_system_conf,
};
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Reachable when a name resolves to at least one address.
///
/// NXDOMAIN and empty answers are definite negatives; a resolver that does
/// not answer in time leaves the name inconclusive. The resolver makes a
/// single attempt per lookup so the scan's per-probe timeout stays the real
/// bound.
pub struct DnsResolveProbe {
    resolver: TokioAsyncResolver,
}

impl DnsResolveProbe {
    /// Resolver pointed at the public upstreams of [`ResolverConfig::default`].
    pub fn new(lookup_timeout: Duration) -> Self {
        Self::with_config(ResolverConfig::default(), ResolverOpts::default(), lookup_timeout)
    }

    /// Resolver configured from the host's `resolv.conf` (or registry on Windows).
    pub fn system(lookup_timeout: Duration) -> Result<Self, ProbeError> {
        let (config, options) =
            read_system_conf().map_err(|e| ProbeError::Other(format!("system resolver configuration: {e}")))?;
        Ok(Self::with_config(config, options, lookup_timeout))
    }

    pub fn with_config(config: ResolverConfig, mut options: ResolverOpts, lookup_timeout: Duration) -> Self {
        options.timeout = lookup_timeout;
        options.attempts = 1;

        Self {
            resolver: TokioAsyncResolver::tokio(config, options),
        }
    }
}

#[async_trait]
impl Probe for DnsResolveProbe {
    fn name(&self) -> &'static str {
        "dns-resolve"
    }

    async fn probe(&self, ctx: &ProbeContext<'_>, limit: Duration) -> Result<Verdict, ProbeError> {
        let Some(name) = ctx.unit.as_name() else {
            return Err(ProbeError::UnsupportedUnit(ctx.unit.to_string()));
        };

        match timeout(limit, self.resolver.lookup_ip(name)).await {
            Ok(Ok(lookup)) => {
                let addrs: Vec<String> = lookup.iter().map(|ip| ip.to_string()).collect();
                if addrs.is_empty() {
                    Ok(Verdict::not_found("no address records"))
                } else {
                    Ok(Verdict::reachable(Some(addrs.join(", "))))
                }
            }
            Ok(Err(e)) => {
                debug!(name, error = %e, "lookup failed");
                Ok(classify_resolve_error(e.kind()))
            }
            Err(_) => Ok(Verdict::inconclusive("resolver timed out")),
        }
    }
}

/// Keeps "does not exist" apart from "could not find out".
fn classify_resolve_error(kind: &ResolveErrorKind) -> Verdict {
    match kind {
        ResolveErrorKind::NoRecordsFound { response_code, .. } => {
            if *response_code == ResponseCode::NXDomain {
                Verdict::not_found("NXDOMAIN")
            } else {
                Verdict::not_found(format!("no address records ({response_code})"))
            }
        }
        ResolveErrorKind::Timeout => Verdict::inconclusive("resolver timed out"),
        other => Verdict::inconclusive(format!("resolver error: {other}")),
    }
}
