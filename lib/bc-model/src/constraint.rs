//! Constraint: sense + right-hand side plus row generation against an
//! active variable set (§3 "Constraint", §4.3).

use crate::{
    conclass::ConClass,
    convar::{ConVarCore, HasConVarCore},
    vartype::{Sense, VarType},
};

/// The outcome of testing an implicit zero-valued left-hand side (every
/// active variable was eliminated) against a constraint's right-hand side
/// (§3 `voidLhsViolated`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoidLhsResult {
    Feasible,
    TooLarge,
    TooSmall,
}

/// Generates the row form of a constraint: the nonzero coefficients against
/// currently active variables. Implemented per problem by the user's
/// constraint subclass; this is the "expanded, problem-specific lazy form"
/// referenced by `ConVar::expand`/`compress` (§3, §4.3).
pub trait RowGenerator {
    /// The coefficient of this constraint for variable `j`, or `0.0` if
    /// absent. Must be callable only while the owning `Constraint` is
    /// expanded.
    fn coefficient(&self, j: usize) -> f64;
}

/// A linear constraint: `sense` relates the row's value to `rhs`.
///
/// Generic over `G`, the problem-specific row generator (the "expanded"
/// form); `G = ()` is usable for constraints whose coefficients are carried
/// directly and never need problem-specific generation (e.g. dense
/// constraints built by the LP layer itself).
#[derive(Debug, Clone)]
pub struct Constraint<G> {
    pub core: ConVarCore,
    pub sense: Sense,
    pub rhs: f64,
    /// Whether coefficients for variables activated after this constraint
    /// was generated can still be computed (§3).
    pub liftable: bool,
    pub class: Option<ConClass>,
    generator: G,
}

impl<G> Constraint<G> {
    pub fn new(core: ConVarCore, sense: Sense, rhs: f64, liftable: bool, generator: G) -> Self {
        Constraint {
            core,
            sense,
            rhs,
            liftable,
            class: None,
            generator,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Classifies `self` from a precomputed `row` (§3 "classify", user
    /// hook default: derive straight from the row rather than requiring a
    /// problem-specific override). Caches and returns the result.
    pub fn classify(&mut self, row: &[(usize, f64)], var_types: &[VarType]) -> ConClass {
        let class = ConClass {
            all_binary: !row.is_empty() && row.iter().all(|&(j, _)| var_types.get(j) == Some(&VarType::Binary)),
            trivial: row.is_empty(),
            variable_bound: row.len() == 1,
        };
        self.class = Some(class);
        class
    }
}

impl<G> HasConVarCore for Constraint<G> {
    fn core(&self) -> &ConVarCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ConVarCore {
        &mut self.core
    }
}

impl<G: RowGenerator> Constraint<G> {
    /// Coefficient for variable `j`. Expands, reads, compresses — matching
    /// the expand/read/compress discipline of §4.3's row generation
    /// algorithm, so the generator never observes a half-expanded
    /// constraint.
    pub fn coefficient(&mut self, j: usize) -> f64 {
        self.core.expand();
        let v = self.generator.coefficient(j);
        self.core.compress();
        v
    }

    /// Row generation: `expand; for each active variable j with
    /// |coeff(j)| > eps, emit (j, coeff); compress` (§4.3).
    pub fn row(&mut self, active_vars: &[usize], eps: f64) -> Vec<(usize, f64)> {
        self.core.expand();
        let row = active_vars
            .iter()
            .copied()
            .filter_map(|j| {
                let c = self.generator.coefficient(j);
                (c.abs() > eps).then_some((j, c))
            })
            .collect();
        self.core.compress();
        row
    }

    /// `slack = rhs - lhs(x)` for sense `<=`/`>=`, with the sign convention
    /// such that [`Sense::violated`] applies directly.
    pub fn slack(&mut self, active_vars: &[usize], x: &[f64], eps: f64) -> f64 {
        let lhs: f64 = self
            .row(active_vars, eps)
            .into_iter()
            .map(|(j, c)| c * x[j])
            .sum();
        self.rhs - lhs
    }

    pub fn violated(&mut self, active_vars: &[usize], x: &[f64], eps: f64) -> bool {
        let slack = self.slack(active_vars, x, eps);
        self.sense.violated(slack, eps)
    }

    /// Euclidean distance of `x` from the hyperplane induced by this row,
    /// used for ranking cuts by violation-per-unit-norm.
    pub fn distance(&mut self, active_vars: &[usize], x: &[f64], eps: f64) -> f64 {
        let row = self.row(active_vars, eps);
        let norm: f64 = row.iter().map(|(_, c)| c * c).sum::<f64>().sqrt();
        if norm <= eps {
            return 0.0;
        }
        let lhs: f64 = row.iter().map(|(j, c)| c * x[*j]).sum();
        (lhs - self.rhs).abs() / norm
    }

    /// Classifies infeasibility of an implicit zero left-hand side against
    /// `rhs` (all active variables eliminated), applying the same
    /// sense-and-epsilon rule as [`Sense::violated`] (§4.3).
    pub fn void_lhs_violated(&self, eps: f64) -> VoidLhsResult {
        void_lhs_violated(self.sense, self.rhs, eps)
    }
}

/// Free-standing form of [`Constraint::void_lhs_violated`] for callers
/// (e.g. the LP elimination view) that only have `sense`/`rhs` on hand and
/// no live `Constraint`.
pub fn void_lhs_violated(sense: Sense, rhs: f64, eps: f64) -> VoidLhsResult {
    let slack = rhs; // lhs == 0
    match sense {
        Sense::Less => {
            if slack < -eps {
                VoidLhsResult::TooSmall
            } else {
                VoidLhsResult::Feasible
            }
        }
        Sense::Greater => {
            if slack > eps {
                VoidLhsResult::TooLarge
            } else {
                VoidLhsResult::Feasible
            }
        }
        Sense::Equal => {
            if slack.abs() > eps {
                if slack > 0.0 {
                    VoidLhsResult::TooLarge
                } else {
                    VoidLhsResult::TooSmall
                }
            } else {
                VoidLhsResult::Feasible
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dense(Vec<f64>);
    impl RowGenerator for Dense {
        fn coefficient(&self, j: usize) -> f64 {
            self.0.get(j).copied().unwrap_or(0.0)
        }
    }

    fn con(sense: Sense, rhs: f64, coeffs: Vec<f64>) -> Constraint<Dense> {
        Constraint::new(
            ConVarCore::new(None, true, false),
            sense,
            rhs,
            true,
            Dense(coeffs),
        )
    }

    #[test]
    fn row_skips_near_zero_coefficients() {
        let mut c = con(Sense::Less, 1.0, vec![1.0, 1e-12, 2.0]);
        let row = c.row(&[0, 1, 2], 1e-6);
        assert_eq!(row, vec![(0, 1.0), (2, 2.0)]);
    }

    #[test]
    fn violation_matches_sense() {
        // x1 + x2 <= 1.5, x = (1, 1) -> slack = -0.5, violated.
        let mut c = con(Sense::Less, 1.5, vec![1.0, 1.0]);
        assert!(c.violated(&[0, 1], &[1.0, 1.0], 1e-6));
        assert!(!c.violated(&[0, 1], &[0.5, 0.5], 1e-6));
    }

    #[test]
    fn void_lhs_violated_classifies_both_directions() {
        let c = con(Sense::Greater, 3.0, vec![]);
        assert_eq!(c.void_lhs_violated(1e-6), VoidLhsResult::TooLarge);
        let c = con(Sense::Less, -3.0, vec![]);
        assert_eq!(c.void_lhs_violated(1e-6), VoidLhsResult::TooSmall);
        let c = con(Sense::Equal, 0.0, vec![]);
        assert_eq!(c.void_lhs_violated(1e-6), VoidLhsResult::Feasible);
    }
}
