use crate::terminal::print;
use probekit::{JsonFormatter, ReportFormatter, ScanConfiguration, ScanEvent, Scanner};
use tracing::warn;

/// Runs one scan: streams hits while it runs, cancels on Ctrl-C and prints
/// the final report on stdout.
pub async fn execute(scanner: Scanner, config: ScanConfiguration, json: bool) -> anyhow::Result<()> {
    let token = scanner.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, waiting for in-flight probes");
            token.cancel();
        }
    });

    let mut events = scanner.subscribe();
    let live = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                ScanEvent::Started { total } => print::started(total),
                ScanEvent::Hit(outcome) => print::hit(&outcome),
                ScanEvent::Progress { attempted, total } => print::progress(attempted, total),
                ScanEvent::Finished { .. } => break,
            }
        }
    });

    let report = scanner.run(config).await?;
    interrupt.abort();
    let _ = live.await;

    if json {
        let rendered = JsonFormatter.format(&report).map_err(anyhow::Error::msg)?;
        println!("{rendered}");
    } else {
        print::report(&report);
    }

    Ok(())
}
