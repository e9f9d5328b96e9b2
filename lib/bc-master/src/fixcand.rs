//! `FixCand`: reduced-cost fixing candidates snapshotted at the
//! remaining-tree root (§4.7.7, §4.9).
//!
//! At the root, every non-basic-at-bound discrete variable gets a
//! "price": the dual bound the search would have to beat to ever prefer
//! activating that variable's mirror value. Once the primal bound improves
//! past a candidate's price, the variable is permanently fixed to the
//! bound it was sitting at.

use bc_model::{FsVarStat, LpVarStat, OptSense};

#[derive(Debug, Clone, Copy)]
struct Entry {
    var: usize,
    /// The status the variable would be fixed to if this candidate fires.
    target: FsVarStat,
    /// `lp_value + |reco|`: the dual bound this fixing would cost (§4.7.7).
    price: f64,
}

pub struct FixCand {
    entries: Vec<Entry>,
    sense: OptSense,
}

impl FixCand {
    pub fn new(sense: OptSense) -> Self {
        FixCand {
            entries: Vec::new(),
            sense,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Replaces the snapshot from the root LP's non-basic-at-bound discrete
    /// variables. `candidates` yields `(var, lp_var_stat, reduced_cost)` for
    /// every variable worth tracking; non-basic-lower/-upper entries are
    /// kept, everything else is ignored.
    pub fn snapshot(&mut self, lp_value: f64, candidates: impl Iterator<Item = (usize, LpVarStat, f64)>) {
        self.entries.clear();
        for (var, stat, reco) in candidates {
            let target = match stat {
                LpVarStat::NonBasicLower => FsVarStat::FixedToLower,
                LpVarStat::NonBasicUpper => FsVarStat::FixedToUpper,
                _ => continue,
            };
            self.entries.push(Entry {
                var,
                target,
                price: lp_value + reco.abs(),
            });
        }
    }

    /// Rebuilds the snapshot for a newly promoted remaining-tree root
    /// (ABACUS `FixCand::newRoot`, SPEC_FULL.md supplemented features):
    /// distinct from [`Self::snapshot`] only in intent — the old snapshot
    /// is unconditionally discarded rather than merged.
    pub fn new_root(&mut self, lp_value: f64, candidates: impl Iterator<Item = (usize, LpVarStat, f64)>) {
        self.snapshot(lp_value, candidates);
    }

    /// Variables whose snapshot price now makes them provably unable to
    /// improve on `primal_bound`; each should be fixed to its `target`
    /// status immediately (§4.7.7, §4.9).
    pub fn rescan(&self, primal_bound: f64) -> Vec<(usize, FsVarStat)> {
        self.entries
            .iter()
            .filter(|e| !self.sense.is_better(e.price, primal_bound))
            .map(|e| (e.var, e.target))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_ignores_basic_variables() {
        let mut fc = FixCand::new(OptSense::Minimize);
        fc.snapshot(
            90.0,
            vec![(0, LpVarStat::Basic, 0.0), (1, LpVarStat::NonBasicLower, -4.0)].into_iter(),
        );
        assert_eq!(fc.len(), 1);
    }

    #[test]
    fn rescan_fires_once_primal_bound_passes_price() {
        let mut fc = FixCand::new(OptSense::Minimize);
        fc.snapshot(90.0, vec![(5, LpVarStat::NonBasicLower, -4.0)].into_iter());
        // price = 90 + 4 = 94; primal bound 95 does not yet violate it
        assert!(fc.rescan(95.0).is_empty());
        // primal bound improves to 93 < 94: fire
        let fired = fc.rescan(93.0);
        assert_eq!(fired, vec![(5, FsVarStat::FixedToLower)]);
    }

    #[test]
    fn new_root_discards_stale_snapshot() {
        let mut fc = FixCand::new(OptSense::Minimize);
        fc.snapshot(90.0, vec![(1, LpVarStat::NonBasicLower, -1.0)].into_iter());
        fc.new_root(50.0, std::iter::empty());
        assert!(fc.is_empty());
    }
}
