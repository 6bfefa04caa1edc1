use super::{Fallback, PortSelection, ScanArgs, run};
use crate::terminal::print;
use probekit::{BannerOptions, Scanner, TargetSet, TcpConnectProbe};
use std::time::Duration;

/// Full scans get more workers and a shorter timeout unless overridden.
const FULL_SCAN: Fallback = Fallback {
    concurrency: 100,
    timeout: Some(Duration::from_millis(500)),
};

pub async fn ports(
    host: String,
    selection: PortSelection,
    banner: bool,
    args: &ScanArgs,
) -> anyhow::Result<()> {
    let targets = selection.targets()?;

    let fallback = if targets == TargetSet::full_range() {
        print::warning("scanning all 65,535 ports, this can take a long time");
        FULL_SCAN
    } else {
        Fallback::default()
    };

    let config = args.configure(&host, targets, fallback)?;

    let mut probe = TcpConnectProbe::new();
    if banner {
        probe = probe.with_banner(BannerOptions::default());
    }

    run::execute(Scanner::new(probe), config, args.json).await
}
