//! `LpSolver`: the external LP backend interface consumed by [`crate::lpsub::LpSub`]
//! (§6 "LP backend interface").

use bc_model::{LpVarStat, OptSense, Sense, SlackStat};

use crate::error::Result;

/// A sparse row, ready to hand to the backend: nonzero `(column, coeff)`
/// pairs, plus sense and right-hand side.
#[derive(Debug, Clone)]
pub struct RowSpec {
    pub sense: Sense,
    pub rhs: f64,
    pub row: Vec<(usize, f64)>,
}

/// A sparse column, ready to hand to the backend.
#[derive(Debug, Clone)]
pub struct ColSpec {
    pub obj: f64,
    pub lb: f64,
    pub ub: f64,
    pub col: Vec<(usize, f64)>,
}

/// The LP solution method requested of [`LpSolver::optimize`] (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpMethod {
    Primal,
    Dual,
    BarrierAndCrossover,
    Approximate,
}

/// The infeasible basic row reported by [`LpSolver::get_infeas`], used by
/// the Subproblem's feasibility-restoration pricing (§4.7.6).
#[derive(Debug, Clone, Default)]
pub struct Infeasibility {
    /// Set iff the infeasible basic variable is a row slack.
    pub infeas_con: Option<usize>,
    /// Set iff the infeasible basic variable is a structural column.
    pub infeas_var: Option<usize>,
    /// Row of `B^-1` corresponding to the infeasible basic variable.
    pub b_inv_row: Vec<f64>,
}

/// The external LP backend interface (§6). `bc-lp`'s own [`crate::lpsub::LpSub`]
/// is the only consumer in this crate; the trait exists so the elimination
/// view is agnostic to which simplex/barrier engine sits underneath.
pub trait LpSolver {
    fn initialize(
        &mut self,
        sense: OptSense,
        rows: Vec<RowSpec>,
        cols: Vec<ColSpec>,
        var_status: Option<Vec<LpVarStat>>,
        slack_status: Option<Vec<SlackStat>>,
    ) -> Result<()>;

    fn add_cons(&mut self, rows: Vec<RowSpec>) -> Result<()>;
    fn remove_cons(&mut self, sorted_idx: &[usize]) -> Result<()>;
    fn add_vars(&mut self, cols: Vec<ColSpec>) -> Result<()>;
    fn remove_vars(&mut self, sorted_idx: &[usize]) -> Result<()>;
    fn change_lbound(&mut self, col: usize, lb: f64) -> Result<()>;
    fn change_ubound(&mut self, col: usize, ub: f64) -> Result<()>;
    fn change_rhs(&mut self, row: usize, rhs: f64) -> Result<()>;
    fn load_basis(&mut self, var_status: Vec<LpVarStat>, slack_status: Vec<SlackStat>) -> Result<()>;

    fn optimize(&mut self, method: LpMethod) -> Result<()>;

    fn value(&self) -> f64;
    fn x_val(&self, col: usize) -> f64;
    fn bar_x_val(&self, col: usize) -> f64;
    fn reco(&self, col: usize) -> f64;
    fn y_val(&self, row: usize) -> f64;
    fn slack(&self, row: usize) -> f64;
    fn lp_var_stat(&self, col: usize) -> LpVarStat;
    fn slack_stat(&self, row: usize) -> SlackStat;

    fn get_infeas(&self) -> Infeasibility;
    fn infeasible(&self) -> bool;

    fn n_row(&self) -> usize;
    fn n_col(&self) -> usize;
    fn nnz(&self) -> usize;

    fn pivot_slack_variable_in(&mut self, row: usize) -> Result<()>;
}
