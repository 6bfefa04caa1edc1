use crate::report::{ProbeOutcome, ScanStats};
use parking_lot::Mutex;

/// Concurrency-safe collector of probe outcomes.
///
/// Every outcome is counted; only reachable ones are kept. The collection
/// is sorted once, in [`finish`](Self::finish), so the arrival order of
/// workers never shows in the result.
#[derive(Default)]
pub struct ResultAggregator {
    state: Mutex<AggregatorState>,
}

#[derive(Default)]
struct AggregatorState {
    reachable: Vec<ProbeOutcome>,
    stats: ScanStats,
    attempted: usize,
}

/// Sorted snapshot returned by [`ResultAggregator::finish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub reachable: Vec<ProbeOutcome>,
    pub stats: ScanStats,
    pub attempted: usize,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one outcome and returns the number attempted so far.
    pub fn submit(&self, outcome: ProbeOutcome) -> usize {
        let mut state = self.state.lock();
        state.stats.count(outcome.status);
        state.attempted += 1;
        if outcome.reachable() {
            state.reachable.push(outcome);
        }
        state.attempted
    }

    pub fn attempted(&self) -> usize {
        self.state.lock().attempted
    }

    /// Takes the collected outcomes, sorted by unit.
    pub fn finish(&self) -> Aggregate {
        let mut state = self.state.lock();
        let mut reachable = std::mem::take(&mut state.reachable);
        reachable.sort_by(|a, b| a.unit.cmp(&b.unit));

        Aggregate {
            reachable,
            stats: state.stats,
            attempted: state.attempted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{probes::Verdict, targets::Unit};
    use std::time::Duration;

    fn outcome(unit: Unit, verdict: Verdict) -> ProbeOutcome {
        ProbeOutcome::new(unit, verdict, Duration::ZERO)
    }

    #[test]
    fn test_aggregator_sorts_and_counts() {
        let aggregator = ResultAggregator::new();
        aggregator.submit(outcome(Unit::Port(443), Verdict::reachable(None)));
        aggregator.submit(outcome(Unit::Port(81), Verdict::not_found("refused")));
        aggregator.submit(outcome(Unit::Port(22), Verdict::reachable(None)));
        assert_eq!(aggregator.attempted(), 3);
        let attempted = aggregator.submit(outcome(Unit::Port(80), Verdict::inconclusive("timeout")));
        assert_eq!(attempted, 4);
        assert_eq!(aggregator.attempted(), 4);

        let aggregate = aggregator.finish();
        let units: Vec<&Unit> = aggregate.reachable.iter().map(|o| &o.unit).collect();
        assert_eq!(units, vec![&Unit::Port(22), &Unit::Port(443)]);
        assert_eq!(aggregate.attempted, 4);
        assert_eq!(aggregate.stats.reachable, 2);
        assert_eq!(aggregate.stats.not_found, 1);
        assert_eq!(aggregate.stats.inconclusive, 1);
    }

    #[test]
    fn test_aggregator_names_sort_lexicographically() {
        let aggregator = ResultAggregator::new();
        for name in ["www.example.com", "api.example.com", "mail.example.com"] {
            aggregator.submit(outcome(Unit::Name(name.to_string()), Verdict::reachable(None)));
        }
        let units: Vec<String> = aggregator
            .finish()
            .reachable
            .into_iter()
            .map(|o| o.unit.to_string())
            .collect();
        assert_eq!(
            units,
            vec!["api.example.com", "mail.example.com", "www.example.com"]
        );
    }
}
