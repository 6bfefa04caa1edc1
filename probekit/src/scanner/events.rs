use crate::report::ProbeOutcome;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tracing::debug;

/// Live progress of a running scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Started {
        total: usize,
    },
    /// A reachable outcome, sent as soon as it lands.
    Hit(ProbeOutcome),
    Progress {
        attempted: usize,
        total: usize,
    },
    Finished {
        attempted: usize,
        reachable: usize,
        incomplete: bool,
    },
}

/// Subscriber side of the scanner's event channel.
///
/// Returned by [`Scanner::subscribe`](super::Scanner::subscribe). A slow
/// subscriber skips the events it lagged behind on; workers never wait for
/// it.
pub struct ScanEventStream {
    inner: BroadcastStream<ScanEvent>,
}

impl ScanEventStream {
    pub(crate) fn new(rx: broadcast::Receiver<ScanEvent>) -> Self {
        Self {
            inner: BroadcastStream::new(rx),
        }
    }

    /// Next event, or `None` once the scanner is dropped.
    pub async fn next(&mut self) -> Option<ScanEvent> {
        while let Some(msg) = self.inner.next().await {
            match msg {
                Ok(event) => return Some(event),
                Err(e) => {
                    debug!(error = %e, "event subscriber lagged");
                    continue;
                }
            }
        }
        None
    }
}
