//! Optimization sense and the comparisons whose direction it flips.

/// Whether the master problem maximizes or minimizes its objective.
///
/// Nearly every bound comparison in the engine (dual bound vs. primal bound,
/// reduced-cost violation, `BestFirst` ordering in the open-subproblem
/// queue) is sense-aware; this type centralizes the handful of primitive
/// comparisons so the rest of the crate never has to branch on it directly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OptSense {
    #[default]
    Minimize,
    Maximize,
}

impl OptSense {
    /// `true` iff `a` is a strict improvement over `b` for this sense.
    pub fn is_better(self, a: f64, b: f64) -> bool {
        match self {
            OptSense::Minimize => a < b,
            OptSense::Maximize => a > b,
        }
    }

    /// `true` iff `a` is at least as good as `b` for this sense.
    pub fn is_better_or_equal(self, a: f64, b: f64) -> bool {
        match self {
            OptSense::Minimize => a <= b,
            OptSense::Maximize => a >= b,
        }
    }

    /// The bound a dual bound starts at before any LP has been solved:
    /// `+inf` for minimization (nothing ruled out yet), `-inf` for
    /// maximization.
    pub fn worst_dual_bound(self) -> f64 {
        match self {
            OptSense::Minimize => f64::INFINITY,
            OptSense::Maximize => f64::NEG_INFINITY,
        }
    }

    /// The bound a primal bound starts at before any feasible solution is
    /// known.
    pub fn worst_primal_bound(self) -> f64 {
        match self {
            OptSense::Minimize => f64::INFINITY,
            OptSense::Maximize => f64::NEG_INFINITY,
        }
    }

    /// Picks whichever of `a`, `b` is the better (tighter-for-optimum) dual
    /// bound, i.e. the one further from `worst_dual_bound`.
    pub fn best_dual_bound(self, a: f64, b: f64) -> f64 {
        match self {
            OptSense::Minimize => a.min(b),
            OptSense::Maximize => a.max(b),
        }
    }

    /// Picks whichever of `a`, `b` is the worse (most conservative) dual
    /// bound. Used by [`crate`]-external `OpenSub` aggregation.
    pub fn worst_of(self, a: f64, b: f64) -> f64 {
        match self {
            OptSense::Minimize => a.max(b),
            OptSense::Maximize => a.min(b),
        }
    }

    /// Flips the reduced-cost violation test: for maximization a variable is
    /// attractive to activate when `rc > eps`; for minimization when
    /// `rc < -eps`.
    pub fn reduced_cost_violated(self, rc: f64, eps: f64) -> bool {
        match self {
            OptSense::Maximize => rc > eps,
            OptSense::Minimize => rc < -eps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn better_flips_with_sense() {
        assert!(OptSense::Maximize.is_better(2.0, 1.0));
        assert!(!OptSense::Minimize.is_better(2.0, 1.0));
        assert!(OptSense::Minimize.is_better(1.0, 2.0));
    }

    #[test]
    fn worst_dual_bound_is_opposite_infinity() {
        assert_eq!(OptSense::Minimize.worst_dual_bound(), f64::INFINITY);
        assert_eq!(OptSense::Maximize.worst_dual_bound(), f64::NEG_INFINITY);
    }

    #[test]
    fn reduced_cost_violation_is_sense_aware() {
        assert!(OptSense::Maximize.reduced_cost_violated(1.0, 1e-6));
        assert!(!OptSense::Minimize.reduced_cost_violated(1.0, 1e-6));
        assert!(OptSense::Minimize.reduced_cost_violated(-1.0, 1e-6));
    }
}
