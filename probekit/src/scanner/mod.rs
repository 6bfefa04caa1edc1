//! # Scanner Engine
//!
//! This module implements the **bounded-concurrency probe scheduler**.
//! One [`Scanner`] runs a [`Probe`] against every unit of a
//! [`TargetSet`](crate::targets::TargetSet) and folds the outcomes into a
//! sorted [`ScanReport`].
//!
//! ## Architecture Overview
//!
//! ```text
//! +------------------------------------------------------+
//! |                     User Code                        |
//! |   (builds a ScanConfiguration, awaits Scanner::run)  |
//! +------------------------------+-----------------------+
//!                                |
//!                                v
//! +------------------------------------------------------+
//! |                  WorkSource (cursor)                 |
//! |   hands out each unit exactly once, stops on cancel  |
//! +------------------------------+-----------------------+
//!                                |
//!                                v
//! +------------------------------------------------------+
//! |          worker pool (concurrency workers)           |
//! |   take unit -> spawn probe -> await -> submit        |
//! +------------------------------+-----------------------+
//!                                |
//!                                v
//! +------------------------------------------------------+
//! |      ResultAggregator (mutex)  +  event broadcast    |
//! +------------------------------+-----------------------+
//!                                |
//!                                v
//! +------------------------------------------------------+
//! |   join barrier -> sort -> RiskClassifier -> report   |
//! +------------------------------------------------------+
//! ```
//!
//! The worker count is fixed for the whole scan and never exceeds the
//! configured concurrency, so neither does the number of probes in flight.
//! Workers only talk to each other through the work source and the
//! aggregator; the two locks are never held together.
//!
//! ## Failure handling
//!
//! Each probe runs in its own task that the worker awaits, wrapped in the
//! probe timeout plus [`ENGINE_GRACE`]:
//!
//! - a [`ProbeError`](crate::error::ProbeError) becomes an inconclusive outcome
//! - a probe that overruns becomes an inconclusive outcome
//! - a panicking probe becomes an inconclusive outcome ("probe panicked")
//!
//! None of them stop the worker or the scan.
//!
//! ## Cancellation and deadline
//!
//! [`Scanner::cancellation_token`] returns the token that stops dispatch.
//! The optional overall deadline cancels a child of the same token. In both
//! cases in-flight probes finish, no new unit is handed out, and the report
//! comes back with `incomplete == true` and a [`StopReason`].
//!
//! A cancelled token stays cancelled: a scanner whose token was cancelled
//! returns empty, incomplete reports from then on.
//!
//! ## Live events
//!
//! [`Scanner::subscribe`] returns a [`ScanEventStream`] fed through a
//! `tokio::broadcast` channel: `Started`, one `Hit` per reachable outcome,
//! periodic `Progress`, and `Finished`.
//!
//! # Example
//!
//! ```rust,no_run
//! use probekit::config::ScanConfiguration;
//! use probekit::probes::TcpConnectProbe;
//! use probekit::scanner::{ScanEvent, Scanner};
//! use probekit::targets::TargetSet;
//!
//! #[tokio::main]
//! async fn main() {
//!     let scanner = Scanner::new(TcpConnectProbe::new());
//!     let mut events = scanner.subscribe();
//!
//!     tokio::spawn(async move {
//!         while let Some(event) = events.next().await {
//!             if let ScanEvent::Hit(outcome) = &event {
//!                 println!("open: {}", outcome.unit);
//!             }
//!             if matches!(event, ScanEvent::Finished { .. }) {
//!                 break;
//!             }
//!         }
//!     });
//!
//!     let config = ScanConfiguration::builder("127.0.0.1", TargetSet::port_range(1, 1024).unwrap())
//!         .build()
//!         .unwrap();
//!     let report = scanner.run(config).await.unwrap();
//!     println!("{} open ports", report.reachable.len());
//! }
//! ```
use crate::{
    config::ScanConfiguration,
    error::ConfigError,
    probes::{Probe, ProbeContext, Verdict},
    report::{ProbeOutcome, ScanReport, StopReason},
    risk::RiskClassifier,
    targets::Unit,
};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};
use tokio::{sync::broadcast, task::JoinSet, time::timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

mod aggregator;
pub use aggregator::{Aggregate, ResultAggregator};
mod events;
pub use events::{ScanEvent, ScanEventStream};
mod work_source;
use work_source::WorkSource;

/// Extra time a probe gets past its own timeout before the engine cuts it off.
pub const ENGINE_GRACE: Duration = Duration::from_millis(250);

/// A `Progress` event is sent every this many attempted units.
const PROGRESS_EVERY: usize = 100;

const EVENT_CAPACITY: usize = 1024;

/// Runs one probe kind over target sets.
///
/// A scanner is cheap to keep around and can run several scans one after
/// another; each run gets a fresh work source and aggregator.
pub struct Scanner {
    probe: Arc<dyn Probe>,
    classifier: Option<Arc<RiskClassifier>>,
    events_tx: broadcast::Sender<ScanEvent>,
    cancellation_token: CancellationToken,
}

impl Scanner {
    /// Creates a scanner for `probe` with the built-in risky-port table.
    pub fn new(probe: impl Probe) -> Self {
        Self::from_arc(Arc::new(probe))
    }

    pub fn from_arc(probe: Arc<dyn Probe>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            probe,
            classifier: Some(RiskClassifier::default_ports()),
            events_tx,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Replaces the risk table applied after each scan.
    pub fn with_classifier(mut self, classifier: RiskClassifier) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Disables risk classification; reports carry no findings.
    pub fn without_classifier(mut self) -> Self {
        self.classifier = None;
        self
    }

    pub fn probe_name(&self) -> &'static str {
        self.probe.name()
    }

    /// Subscribes to the live events of the following scans.
    pub fn subscribe(&self) -> ScanEventStream {
        ScanEventStream::new(self.events_tx.subscribe())
    }

    /// Token that stops dispatch when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    /// Probes every unit of `config` and returns the sorted report.
    ///
    /// Returns once every dispatched unit has produced an outcome. The only
    /// error is a rejected configuration, raised before any probing starts.
    pub async fn run(&self, config: ScanConfiguration) -> Result<ScanReport, ConfigError> {
        let config = config.validated()?;
        let started = Instant::now();
        let total = config.targets().len();
        let token = self.cancellation_token.child_token();

        info!(
            host = config.host(),
            probe = self.probe.name(),
            total,
            concurrency = config.concurrency(),
            "scan started"
        );

        let deadline_hit = Arc::new(AtomicBool::new(false));
        let deadline_task = config.deadline().map(|deadline| {
            let token = token.clone();
            let deadline_hit = deadline_hit.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(deadline) => {
                        deadline_hit.store(true, Ordering::SeqCst);
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            })
        });

        self.events_tx.send(ScanEvent::Started { total }).ok();

        let run = Arc::new(ScanRun {
            host: Arc::from(config.host()),
            probe: self.probe.clone(),
            probe_timeout: config.probe_timeout(),
            source: WorkSource::new(config.targets().clone()),
            aggregator: ResultAggregator::new(),
            token: token.clone(),
            events_tx: self.events_tx.clone(),
            total,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        });

        let mut pool = JoinSet::new();
        for worker_id in 0..config.concurrency().min(total) {
            pool.spawn(worker(worker_id, run.clone()));
        }
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "worker task failed");
            }
        }

        if let Some(task) = deadline_task {
            task.abort();
        }
        debug!(dispatched = run.source.dispatched(), "workers joined");

        let aggregate = run.aggregator.finish();
        let mut stats = aggregate.stats;
        stats.peak_in_flight = run.peak_in_flight.load(Ordering::SeqCst);

        let incomplete = aggregate.attempted < total;
        let stop_reason = if !incomplete {
            None
        } else if deadline_hit.load(Ordering::SeqCst) {
            Some(StopReason::DeadlineExceeded)
        } else if token.is_cancelled() {
            Some(StopReason::Cancelled)
        } else {
            None
        };

        let findings = match &self.classifier {
            Some(classifier) => classifier.classify(&aggregate.reachable),
            None => Vec::new(),
        };

        let elapsed = started.elapsed();
        info!(
            attempted = aggregate.attempted,
            reachable = stats.reachable,
            incomplete,
            elapsed_ms = elapsed.as_millis() as u64,
            "scan finished"
        );

        self.events_tx
            .send(ScanEvent::Finished {
                attempted: aggregate.attempted,
                reachable: stats.reachable,
                incomplete,
            })
            .ok();

        Ok(ScanReport {
            target: config.host().to_string(),
            reachable: aggregate.reachable,
            attempted: aggregate.attempted,
            total_units: total,
            stats,
            elapsed,
            findings,
            incomplete,
            stop_reason,
        })
    }
}

/// State shared by the workers of one run.
struct ScanRun {
    host: Arc<str>,
    probe: Arc<dyn Probe>,
    probe_timeout: Duration,
    source: WorkSource,
    aggregator: ResultAggregator,
    token: CancellationToken,
    events_tx: broadcast::Sender<ScanEvent>,
    total: usize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// RAII guard for the in-flight probe counter.
///
/// Decrements on drop, so the count stays right when a probe faults or
/// panics.
struct InFlightGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self { in_flight }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn worker(worker_id: usize, run: Arc<ScanRun>) {
    while let Some(unit) = run.source.next(&run.token) {
        let outcome = run.probe_unit(unit).await;
        run.record(outcome);
    }
    debug!(worker_id, "worker drained");
}

impl ScanRun {
    async fn probe_unit(&self, unit: Unit) -> ProbeOutcome {
        let _in_flight = InFlightGuard::enter(&self.in_flight, &self.peak_in_flight);
        let started = Instant::now();

        let probe = self.probe.clone();
        let host = self.host.clone();
        let target = unit.clone();
        let probe_timeout = self.probe_timeout;

        let attempt = tokio::spawn(async move {
            let ctx = ProbeContext {
                host: &host,
                unit: &target,
            };
            timeout(
                probe_timeout.saturating_add(ENGINE_GRACE),
                probe.probe(&ctx, probe_timeout),
            )
            .await
        });

        let verdict = match attempt.await {
            Ok(Ok(Ok(verdict))) => verdict,
            Ok(Ok(Err(e))) => {
                warn!(unit = %unit, error = %e, "probe faulted");
                Verdict::inconclusive(format!("probe error: {e}"))
            }
            Ok(Err(_)) => {
                warn!(unit = %unit, "probe overran its timeout");
                Verdict::inconclusive("probe exceeded its timeout")
            }
            Err(e) if e.is_panic() => {
                warn!(unit = %unit, "probe panicked");
                Verdict::inconclusive("probe panicked")
            }
            Err(e) => {
                warn!(unit = %unit, error = %e, "probe task failed");
                Verdict::inconclusive(format!("probe task failed: {e}"))
            }
        };

        debug!(unit = %unit, status = %verdict.status, "probe finished");
        ProbeOutcome::new(unit, verdict, started.elapsed())
    }

    fn record(&self, outcome: ProbeOutcome) {
        if outcome.reachable() {
            self.events_tx.send(ScanEvent::Hit(outcome.clone())).ok();
        }

        let attempted = self.aggregator.submit(outcome);
        if attempted % PROGRESS_EVERY == 0 || attempted == self.total {
            self.events_tx
                .send(ScanEvent::Progress {
                    attempted,
                    total: self.total,
                })
                .ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ProbeError, probes::ProbeStatus, targets::TargetSet};
    use async_trait::async_trait;

    struct OpenPorts(Vec<u16>);

    #[async_trait]
    impl Probe for OpenPorts {
        fn name(&self) -> &'static str {
            "open-ports"
        }

        async fn probe(&self, ctx: &ProbeContext<'_>, _: Duration) -> Result<Verdict, ProbeError> {
            match ctx.unit.as_port() {
                Some(port) if self.0.contains(&port) => Ok(Verdict::reachable(None)),
                _ => Ok(Verdict::not_found("closed")),
            }
        }
    }

    struct Faulty;

    #[async_trait]
    impl Probe for Faulty {
        fn name(&self) -> &'static str {
            "faulty"
        }

        async fn probe(&self, _: &ProbeContext<'_>, _: Duration) -> Result<Verdict, ProbeError> {
            Err(ProbeError::Other("socket exploded".to_string()))
        }
    }

    fn config(targets: TargetSet) -> ScanConfiguration {
        ScanConfiguration::builder("127.0.0.1", targets)
            .concurrency(4)
            .build()
            .unwrap()
    }

    #[test]
    fn test_in_flight_guard_tracks_peak() {
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        {
            let _a = InFlightGuard::enter(&in_flight, &peak);
            let _b = InFlightGuard::enter(&in_flight, &peak);
            assert_eq!(in_flight.load(Ordering::SeqCst), 2);
        }
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_scanner_cancelled_before_run_probes_nothing() {
        let scanner = Scanner::new(OpenPorts(vec![22]));
        assert_eq!(scanner.probe_name(), "open-ports");

        scanner.cancel();
        assert!(scanner.cancellation_token().is_cancelled());

        let report = scanner
            .run(config(TargetSet::port_range(1, 100).unwrap()))
            .await
            .unwrap();
        assert_eq!(report.attempted, 0);
        assert_eq!(report.total_units, 100);
        assert!(report.incomplete);
        assert_eq!(report.stop_reason, Some(StopReason::Cancelled));
        assert!(report.reachable.is_empty());
    }

    #[tokio::test]
    async fn test_scanner_collects_sorted_hits_and_findings() {
        let scanner = Scanner::new(OpenPorts(vec![445, 23, 22]));
        let report = scanner
            .run(config(TargetSet::port_range(1, 500).unwrap()))
            .await
            .unwrap();

        let units: Vec<&Unit> = report.units().collect();
        assert_eq!(units, vec![&Unit::Port(22), &Unit::Port(23), &Unit::Port(445)]);
        assert_eq!(report.attempted, 500);
        assert_eq!(report.stats.not_found, 497);
        assert!(!report.incomplete);
        assert_eq!(report.stop_reason, None);
        assert_eq!(report.findings.len(), 2);
        assert!(report.stats.peak_in_flight <= 4);
    }

    #[tokio::test]
    async fn test_scanner_without_classifier_has_no_findings() {
        let scanner = Scanner::new(OpenPorts(vec![23])).without_classifier();
        let report = scanner
            .run(config(TargetSet::ports([23]).unwrap()))
            .await
            .unwrap();
        assert_eq!(report.reachable.len(), 1);
        assert!(report.findings.is_empty());
    }

    #[tokio::test]
    async fn test_scanner_downgrades_probe_errors() {
        let scanner = Scanner::new(Faulty);
        let report = scanner
            .run(config(TargetSet::port_range(1, 10).unwrap()))
            .await
            .unwrap();
        assert!(report.reachable.is_empty());
        assert_eq!(report.attempted, 10);
        assert_eq!(report.stats.inconclusive, 10);
    }

    #[tokio::test]
    async fn test_scanner_rejects_bad_configuration() {
        let scanner = Scanner::new(Faulty);
        let bad: ScanConfiguration = serde_json::from_str(
            r#"{"host": "", "targets": {"mode": "port_list", "ports": [1]},
                "concurrency": 1, "probe_timeout": 100}"#,
        )
        .unwrap();
        assert_eq!(scanner.run(bad).await, Err(ConfigError::EmptyHost));
    }

    #[tokio::test]
    async fn test_scanner_emits_events() {
        let scanner = Scanner::new(OpenPorts(vec![80]));
        let mut events = scanner.subscribe();
        scanner
            .run(config(TargetSet::port_range(1, 150).unwrap()))
            .await
            .unwrap();

        assert_eq!(events.next().await, Some(ScanEvent::Started { total: 150 }));

        let mut hits = Vec::new();
        let mut progress = Vec::new();
        loop {
            match events.next().await {
                Some(ScanEvent::Hit(outcome)) => {
                    assert_eq!(outcome.status, ProbeStatus::Reachable);
                    hits.push(outcome.unit);
                }
                Some(ScanEvent::Progress { attempted, total }) => {
                    assert_eq!(total, 150);
                    progress.push(attempted);
                }
                Some(ScanEvent::Finished {
                    attempted,
                    reachable,
                    incomplete,
                }) => {
                    assert_eq!((attempted, reachable, incomplete), (150, 1, false));
                    break;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        progress.sort_unstable();
        assert_eq!(hits, vec![Unit::Port(80)]);
        assert_eq!(progress, vec![100, 150]);
    }
}
