//! `ProblemHooks`: the capability set a problem-specific subclass provides
//! (§6 "User hooks"). The core never downcasts a hook; it only calls
//! through this trait (§9 "Dynamic dispatch on user hooks").
//!
//! Hooks exchange rows/columns as [`bc_lp::RowSpec`]/[`bc_lp::ColSpec`] —
//! the same generator-agnostic sparse form the LP backend consumes — so a
//! hook implementation never needs to know how the Sub stores its pool
//! items.

use bc_lp::{ColSpec, Infeasibility, RowSpec};
use bc_model::{FsVarStat, VarType};

/// A read-only snapshot of the current LP solution handed to every hook.
pub struct LpView {
    pub x: Vec<f64>,
    pub reduced_cost: Vec<f64>,
    pub dual: Vec<f64>,
    pub lp_value: f64,
}

/// Problem-specific behavior plugged into the generic Subproblem engine.
/// Every method has a default that "does nothing", matching the ABACUS
/// convention the design is modeled on (§4.7.6, §6).
pub trait ProblemHooks {
    /// Tests the current LP solution for problem feasibility, returning
    /// its primal objective value if so.
    fn feasible(&mut self, _view: &LpView) -> Option<f64> {
        None
    }

    /// Separation: rows violated by `view.x`, each optionally ranked.
    fn separate(&mut self, _view: &LpView) -> Vec<(RowSpec, Option<f64>)> {
        Vec::new()
    }

    /// Pricing: columns with attractive reduced cost, each tagged with its
    /// variable type, an optional rank, and whether it should be
    /// eliminated immediately (fixed/set at generation time).
    fn pricing(&mut self, _view: &LpView) -> Vec<(ColSpec, VarType, Option<f64>, Option<f64>)> {
        Vec::new()
    }

    /// A primal heuristic given the current LP solution; returns an
    /// improved primal value if found.
    fn improve(&mut self, _view: &LpView) -> Option<f64> {
        None
    }

    /// Columns to try for the very first LP of a node when infeasible.
    fn init_make_feas(&mut self) -> Vec<ColSpec> {
        Vec::new()
    }

    /// Columns to try mid-loop when the LP is infeasible (§4.7.6).
    fn make_feasible(&mut self, _infeas: &Infeasibility) -> Vec<ColSpec> {
        Vec::new()
    }

    /// Logical-implication tightenings triggered by the current LP state.
    fn fix_by_log_imp(&mut self, _view: &LpView) -> Vec<(usize, FsVarStat)> {
        Vec::new()
    }

    fn exception_fathom(&mut self) -> bool {
        false
    }

    fn exception_branch(&mut self) -> bool {
        false
    }

    /// Whether a detected tailing-off should actually force a final
    /// pricing attempt and branch. Defaults to `true` (§4.7.5).
    fn tailing_off(&mut self) -> bool {
        true
    }

    fn pausing(&mut self) -> bool {
        false
    }
}
