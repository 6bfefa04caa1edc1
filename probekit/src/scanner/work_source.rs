use crate::targets::{TargetSet, Unit};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Shared unit supply for the worker pool.
///
/// Hands out each position of the target set exactly once. The lock only
/// covers the cursor bump; the unit itself is computed outside of it.
pub(crate) struct WorkSource {
    targets: TargetSet,
    cursor: Mutex<usize>,
    len: usize,
}

impl WorkSource {
    pub(crate) fn new(targets: TargetSet) -> Self {
        let len = targets.len();
        Self {
            targets,
            cursor: Mutex::new(0),
            len,
        }
    }

    /// Next undispatched unit, or `None` once drained or cancelled.
    pub(crate) fn next(&self, token: &CancellationToken) -> Option<Unit> {
        let index = {
            let mut cursor = self.cursor.lock();
            if token.is_cancelled() || *cursor >= self.len {
                return None;
            }
            let index = *cursor;
            *cursor += 1;
            index
        };

        self.targets.unit_at(index)
    }

    pub(crate) fn dispatched(&self) -> usize {
        *self.cursor.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashSet, sync::Arc};

    #[test]
    fn test_work_source_hands_out_each_unit_once() {
        let source = Arc::new(WorkSource::new(TargetSet::port_range(1, 1000).unwrap()));
        let token = CancellationToken::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let source = source.clone();
                let token = token.clone();
                std::thread::spawn(move || {
                    let mut taken = Vec::new();
                    while let Some(unit) = source.next(&token) {
                        taken.push(unit);
                    }
                    taken
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for unit in handle.join().unwrap() {
                assert!(seen.insert(unit), "unit handed out twice");
            }
        }
        assert_eq!(seen.len(), 1000);
        assert_eq!(source.dispatched(), 1000);
    }

    #[test]
    fn test_work_source_stops_when_cancelled() {
        let source = WorkSource::new(TargetSet::port_range(1, 10).unwrap());
        let token = CancellationToken::new();
        assert_eq!(source.next(&token), Some(Unit::Port(1)));
        token.cancel();
        assert_eq!(source.next(&token), None);
        assert_eq!(source.dispatched(), 1);
    }
}
