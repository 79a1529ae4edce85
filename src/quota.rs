//! Skip/emit quota accounting per counting-key.
//!
//! Tracks how many records have been skipped and emitted for each
//! counting-key (source id or group id) across all the source directories
//! that share the key. Budgets are computed once per directory and stay
//! fixed while that directory is processed; counters are committed when the
//! directory is done and never decremented.

use std::collections::HashMap;

/// Decision for a single record inside a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Record counts against the skip budget and is not emitted.
    Skip,
    /// Record is emitted.
    Emit,
    /// Both budgets are exhausted; ignore the rest of the directory.
    Stop,
}

/// Fixed skip/emit budget for one directory.
#[derive(Debug)]
pub struct Budget {
    max_skip: u64,
    /// `None` means unlimited emission.
    max_emit: Option<u64>,
    skipped: u64,
    emitted: u64,
}

impl Budget {
    /// Decide the fate of the next record and count it.
    pub fn admit(&mut self) -> Admission {
        if self.skipped < self.max_skip {
            self.skipped += 1;
            Admission::Skip
        } else if self.max_emit.is_none_or(|max| self.emitted < max) {
            self.emitted += 1;
            Admission::Emit
        } else {
            Admission::Stop
        }
    }

    /// Records consumed so far (skipped + emitted).
    pub fn consumed(&self) -> u64 {
        self.skipped + self.emitted
    }

    /// Records skipped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Records emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

/// A counting-key that ended the run under its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaShortfall {
    pub key: i64,
    pub kind: ShortfallKind,
    pub actual: u64,
    pub target: u64,
}

/// Which budget fell short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortfallKind {
    Skipped,
    Emitted,
}

/// Per counting-key running counters for one run.
///
/// Constructed fresh per run and threaded explicitly through the driver;
/// there is no global state.
#[derive(Debug, Default)]
pub struct QuotaTracker {
    target_skip: u64,
    target_emit: Option<u64>,
    skipped: HashMap<i64, u64>,
    emitted: HashMap<i64, u64>,
}

impl QuotaTracker {
    /// Create a tracker with the given per-key targets.
    pub fn new(target_skip: u64, target_emit: Option<u64>) -> Self {
        Self {
            target_skip,
            target_emit,
            skipped: HashMap::new(),
            emitted: HashMap::new(),
        }
    }

    /// Compute the remaining budget for a key at directory entry.
    pub fn begin(&self, key: i64) -> Budget {
        let skipped = self.skipped.get(&key).copied().unwrap_or(0);
        let emitted = self.emitted.get(&key).copied().unwrap_or(0);
        Budget {
            max_skip: self.target_skip.saturating_sub(skipped),
            max_emit: self.target_emit.map(|t| t.saturating_sub(emitted)),
            skipped: 0,
            emitted: 0,
        }
    }

    /// Fold a directory's consumption back into the per-key counters.
    pub fn commit(&mut self, key: i64, budget: &Budget) {
        *self.skipped.entry(key).or_default() += budget.skipped;
        *self.emitted.entry(key).or_default() += budget.emitted;
    }

    /// Keys that never reached their targets, sorted by key.
    ///
    /// Observational only; the run result does not depend on this.
    pub fn shortfalls(&self) -> Vec<QuotaShortfall> {
        let mut shortfalls = Vec::new();
        for (&key, &skipped) in &self.skipped {
            if skipped < self.target_skip {
                shortfalls.push(QuotaShortfall {
                    key,
                    kind: ShortfallKind::Skipped,
                    actual: skipped,
                    target: self.target_skip,
                });
            }
        }
        if let Some(target) = self.target_emit {
            for (&key, &emitted) in &self.emitted {
                if emitted < target {
                    shortfalls.push(QuotaShortfall {
                        key,
                        kind: ShortfallKind::Emitted,
                        actual: emitted,
                        target,
                    });
                }
            }
        }
        shortfalls.sort_by_key(|s| (s.key, s.kind as u8));
        shortfalls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run one directory of `records` through the tracker.
    fn run_directory(tracker: &mut QuotaTracker, key: i64, records: u64) -> (u64, u64) {
        let mut budget = tracker.begin(key);
        let mut consumed = 0;
        for _ in 0..records {
            match budget.admit() {
                Admission::Stop => break,
                _ => consumed += 1,
            }
        }
        let emitted = budget.emitted();
        tracker.commit(key, &budget);
        (consumed, emitted)
    }

    #[test]
    fn test_skip_then_emit_then_ignore() {
        // 10 records, skip 4, emit 3: consume exactly 7.
        let mut tracker = QuotaTracker::new(4, Some(3));
        let (consumed, emitted) = run_directory(&mut tracker, 1, 10);
        assert_eq!(consumed, 7);
        assert_eq!(emitted, 3);
    }

    #[test]
    fn test_budget_spans_directories() {
        let mut tracker = QuotaTracker::new(4, Some(3));
        // First directory only covers part of the skip budget.
        let (consumed, emitted) = run_directory(&mut tracker, 1, 3);
        assert_eq!((consumed, emitted), (3, 0));
        // Second directory finishes the skips, then emits.
        let (consumed, emitted) = run_directory(&mut tracker, 1, 10);
        assert_eq!((consumed, emitted), (4, 3));
        // Third directory has no budget left.
        let (consumed, emitted) = run_directory(&mut tracker, 1, 10);
        assert_eq!((consumed, emitted), (0, 0));
    }

    #[test]
    fn test_consumption_never_exceeds_targets() {
        let mut tracker = QuotaTracker::new(5, Some(7));
        let mut total = 0;
        for records in [3, 9, 1, 20, 4] {
            let (consumed, _) = run_directory(&mut tracker, 42, records);
            total += consumed;
        }
        assert!(total <= 5 + 7);
        assert_eq!(total, 12);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut tracker = QuotaTracker::new(1, Some(2));
        let (consumed_a, emitted_a) = run_directory(&mut tracker, 1, 10);
        let (consumed_b, emitted_b) = run_directory(&mut tracker, 2, 10);
        assert_eq!((consumed_a, emitted_a), (3, 2));
        assert_eq!((consumed_b, emitted_b), (3, 2));
    }

    #[test]
    fn test_unlimited_emission() {
        let mut tracker = QuotaTracker::new(0, None);
        let (consumed, emitted) = run_directory(&mut tracker, 1, 1000);
        assert_eq!(consumed, 1000);
        assert_eq!(emitted, 1000);
        assert!(tracker.shortfalls().is_empty());
    }

    #[test]
    fn test_zero_emit_target_emits_nothing() {
        let mut tracker = QuotaTracker::new(0, Some(0));
        let (consumed, emitted) = run_directory(&mut tracker, 1, 10);
        assert_eq!((consumed, emitted), (0, 0));
    }

    #[test]
    fn test_shortfall_report() {
        let mut tracker = QuotaTracker::new(4, Some(3));
        run_directory(&mut tracker, 1, 2);
        run_directory(&mut tracker, 2, 5);
        let shortfalls = tracker.shortfalls();
        assert_eq!(
            shortfalls,
            vec![
                QuotaShortfall {
                    key: 1,
                    kind: ShortfallKind::Skipped,
                    actual: 2,
                    target: 4,
                },
                QuotaShortfall {
                    key: 1,
                    kind: ShortfallKind::Emitted,
                    actual: 0,
                    target: 3,
                },
                QuotaShortfall {
                    key: 2,
                    kind: ShortfallKind::Emitted,
                    actual: 1,
                    target: 3,
                },
            ]
        );
    }
}
