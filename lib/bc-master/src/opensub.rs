//! `OpenSub`: the queue of subproblems waiting to be processed (§4.8).
//!
//! The queue itself is metadata only — `id`, `level`, `dual_bound`, and the
//! tie-break hint — not the `Sub` objects, which the `Master`'s arena owns.
//! Dormancy is likewise owned by the `Sub`; callers pass the current
//! `(dormant, dormant_rounds)` pair for each id into [`OpenSub::select`].

use bc_model::{OptSense, SubId};

use crate::params::EnumerationStrategy;

#[derive(Debug, Clone, Copy)]
pub struct OpenEntry {
    pub id: SubId,
    pub level: u32,
    pub dual_bound: f64,
    /// Tie-break hint: this entry's branch rule tightened its variable
    /// toward the upper bound. The default tie-break prefers `true`
    /// (§4.8 "prefer the son whose branch set its variable to the upper
    /// bound").
    pub prefers_upper: bool,
}

pub struct OpenSub {
    entries: Vec<OpenEntry>,
    strategy: EnumerationStrategy,
    sense: OptSense,
    min_dormant_rounds: u32,
    dual_bound: f64,
    feasible_found: bool,
}

/// `true` iff `a` is the worse of the two individual dual bounds by sense
/// (§4.8: BestFirst picks the worst one, matching the aggregate's own
/// "worst-by-sense" definition one step up).
fn is_worse(sense: OptSense, a: f64, b: f64) -> bool {
    match sense {
        OptSense::Minimize => a > b,
        OptSense::Maximize => a < b,
    }
}

impl OpenSub {
    pub fn new(strategy: EnumerationStrategy, sense: OptSense, min_dormant_rounds: u32) -> Self {
        OpenSub {
            entries: Vec::new(),
            strategy,
            sense,
            min_dormant_rounds,
            dual_bound: sense.worst_dual_bound(),
            feasible_found: false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn aggregate_dual_bound(&self) -> f64 {
        self.dual_bound
    }

    /// Switches `DiveAndBest` from `DepthFirst` to `BestFirst` once a
    /// feasible solution is known (§4.8).
    pub fn notify_feasible(&mut self) {
        self.feasible_found = true;
    }

    pub fn insert(&mut self, entry: OpenEntry) {
        self.dual_bound = if self.entries.is_empty() {
            entry.dual_bound
        } else if is_worse(self.sense, entry.dual_bound, self.dual_bound) {
            entry.dual_bound
        } else {
            self.dual_bound
        };
        self.entries.push(entry);
    }

    fn effective_strategy(&self) -> EnumerationStrategy {
        match self.strategy {
            EnumerationStrategy::DiveAndBest if !self.feasible_found => {
                EnumerationStrategy::DepthFirst
            }
            EnumerationStrategy::DiveAndBest => EnumerationStrategy::BestFirst,
            other => other,
        }
    }

    /// `true` iff `candidate` has priority over `current` under `strategy`.
    fn has_priority(
        strategy: EnumerationStrategy,
        sense: OptSense,
        candidate: &OpenEntry,
        current: &OpenEntry,
    ) -> bool {
        let primary = match strategy {
            EnumerationStrategy::BestFirst | EnumerationStrategy::DiveAndBest => {
                is_worse(sense, candidate.dual_bound, current.dual_bound)
            }
            EnumerationStrategy::BreadthFirst => candidate.level < current.level,
            EnumerationStrategy::DepthFirst => candidate.level > current.level,
        };
        if primary {
            return true;
        }
        let tied = match strategy {
            EnumerationStrategy::BestFirst | EnumerationStrategy::DiveAndBest => {
                candidate.dual_bound == current.dual_bound
            }
            EnumerationStrategy::BreadthFirst | EnumerationStrategy::DepthFirst => {
                candidate.level == current.level
            }
        };
        tied && candidate.prefers_upper && !current.prefers_upper
    }

    /// Removes and returns the highest-priority eligible entry, recomputing
    /// the aggregate dual bound over what remains in O(n) (§4.8). `status`
    /// reports `(dormant, dormant_rounds)` for a given id; dormant entries
    /// below `min_dormant_rounds` are skipped.
    pub fn select(&mut self, status: impl Fn(SubId) -> (bool, u32)) -> Option<SubId> {
        let strategy = self.effective_strategy();
        let mut best_idx: Option<usize> = None;
        for (i, entry) in self.entries.iter().enumerate() {
            let (dormant, dormant_rounds) = status(entry.id);
            if dormant && dormant_rounds < self.min_dormant_rounds {
                continue;
            }
            best_idx = match best_idx {
                None => Some(i),
                Some(b) if Self::has_priority(strategy, self.sense, entry, &self.entries[b]) => {
                    Some(i)
                }
                Some(b) => Some(b),
            };
        }
        let idx = best_idx?;
        let chosen = self.entries.swap_remove(idx);
        self.recompute_aggregate();
        Some(chosen.id)
    }

    /// Explicit removal, used when a Sub is fathomed without going through
    /// `select` (e.g. a dormant node that went void while queued).
    pub fn remove(&mut self, id: SubId) {
        if let Some(idx) = self.entries.iter().position(|e| e.id == id) {
            self.entries.swap_remove(idx);
            self.recompute_aggregate();
        }
    }

    fn recompute_aggregate(&mut self) {
        self.dual_bound = self
            .entries
            .iter()
            .fold(None, |acc: Option<f64>, e| match acc {
                None => Some(e.dual_bound),
                Some(b) if is_worse(self.sense, e.dual_bound, b) => Some(e.dual_bound),
                Some(b) => Some(b),
            })
            .unwrap_or_else(|| self.sense.worst_dual_bound());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, level: u32, bound: f64, upper: bool) -> OpenEntry {
        OpenEntry {
            id: SubId(id),
            level,
            dual_bound: bound,
            prefers_upper: upper,
        }
    }

    #[test]
    fn best_first_picks_worst_individual_bound_for_minimize() {
        let mut q = OpenSub::new(EnumerationStrategy::BestFirst, OptSense::Minimize, 1);
        q.insert(entry(1, 0, 10.0, false));
        q.insert(entry(2, 0, 50.0, false));
        let picked = q.select(|_| (false, 0)).unwrap();
        assert_eq!(picked, SubId(2));
    }

    #[test]
    fn breadth_first_picks_smallest_level() {
        let mut q = OpenSub::new(EnumerationStrategy::BreadthFirst, OptSense::Minimize, 1);
        q.insert(entry(1, 3, 0.0, false));
        q.insert(entry(2, 1, 0.0, false));
        assert_eq!(q.select(|_| (false, 0)).unwrap(), SubId(2));
    }

    #[test]
    fn depth_first_picks_largest_level() {
        let mut q = OpenSub::new(EnumerationStrategy::DepthFirst, OptSense::Minimize, 1);
        q.insert(entry(1, 3, 0.0, false));
        q.insert(entry(2, 1, 0.0, false));
        assert_eq!(q.select(|_| (false, 0)).unwrap(), SubId(1));
    }

    #[test]
    fn dormant_below_threshold_is_skipped() {
        let mut q = OpenSub::new(EnumerationStrategy::BestFirst, OptSense::Minimize, 3);
        q.insert(entry(1, 0, 5.0, false));
        q.insert(entry(2, 0, 5.0, false));
        let dormant_rounds = |id: SubId| if id == SubId(1) { (true, 1) } else { (false, 0) };
        assert_eq!(q.select(dormant_rounds).unwrap(), SubId(2));
    }

    #[test]
    fn dive_and_best_switches_strategy_after_feasible() {
        let mut q = OpenSub::new(EnumerationStrategy::DiveAndBest, OptSense::Minimize, 1);
        q.insert(entry(1, 1, 10.0, false));
        q.insert(entry(2, 5, 20.0, false));
        // before a feasible solution: depth-first, picks the deepest node
        assert_eq!(q.select(|_| (false, 0)).unwrap(), SubId(2));
        q.insert(entry(2, 5, 20.0, false));
        q.notify_feasible();
        // after: best-first, picks the worst individual bound
        assert_eq!(q.select(|_| (false, 0)).unwrap(), SubId(2));
    }

    #[test]
    fn tie_break_prefers_upper() {
        let mut q = OpenSub::new(EnumerationStrategy::BreadthFirst, OptSense::Minimize, 1);
        q.insert(entry(1, 0, 0.0, false));
        q.insert(entry(2, 0, 0.0, true));
        assert_eq!(q.select(|_| (false, 0)).unwrap(), SubId(2));
    }

    #[test]
    fn aggregate_recomputed_after_select() {
        let mut q = OpenSub::new(EnumerationStrategy::BestFirst, OptSense::Minimize, 1);
        q.insert(entry(1, 0, 10.0, false));
        q.insert(entry(2, 0, 50.0, false));
        assert_eq!(q.aggregate_dual_bound(), 50.0);
        q.select(|_| (false, 0));
        assert_eq!(q.aggregate_dual_bound(), 10.0);
    }
}
