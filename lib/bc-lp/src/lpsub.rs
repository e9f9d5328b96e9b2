//! `LpSub`: the elimination/index-mapping view the Subproblem drives
//! instead of talking to an [`crate::solver::LpSolver`] directly (§4.6).
//!
//! A variable is eliminated when it is fixed-or-set and not worth keeping
//! as a degenerate LP column; eliminated variables contribute to a running
//! `valueAdd` and are subtracted out of every row they touch. `orig2lp`/
//! `lp2orig` translate between the Sub's original (active-set) indices and
//! the backend's compact column indices; an analogous pair of row maps
//! does the same for constraints whose left-hand side became entirely
//! eliminated ("void").
//!
//! Any structural edit (elimination changes, `add_cons`, `remove_cons`,
//! `add_vars`, `remove_vars`) rebuilds the whole backend model from the
//! retained orig-indexed matrix rather than patching it incrementally.
//! That costs the warm-started basis on every edit, but it means the
//! elimination/void bookkeeping has exactly one code path to get right.

use std::collections::HashSet;

use bc_model::{void_lhs_violated, LpVarStat, OptSense, Sense, SlackStat, VoidLhsResult};

use crate::{
    error::{Error, Result},
    solver::{ColSpec, Infeasibility, LpMethod, LpSolver, RowSpec},
};

pub struct LpSub<S: LpSolver> {
    solver: S,
    sense: OptSense,
    eps: f64,

    var_obj: Vec<f64>,
    var_lb: Vec<f64>,
    var_ub: Vec<f64>,
    eliminated: Vec<Option<f64>>,
    orig2lp: Vec<Option<usize>>,
    lp2orig: Vec<usize>,

    row_sense: Vec<Sense>,
    row_rhs: Vec<f64>,
    row_cols: Vec<Vec<(usize, f64)>>,
    row_orig2lp: Vec<Option<usize>>,
    row_lp2orig: Vec<usize>,

    value_add: f64,
    infeas_cons: Vec<usize>,
}

impl<S: LpSolver> LpSub<S> {
    /// Builds the initial LP view from the active set's rows/columns
    /// (orig-indexed throughout) and the elimination choice for each
    /// variable. A void-and-infeasible row at construction time is
    /// recorded, not rejected: the Sub simply starts out infeasible.
    pub fn new(
        solver: S,
        sense: OptSense,
        rows: Vec<RowSpec>,
        cols: Vec<(ColSpec, Option<f64>)>,
        eps: f64,
    ) -> Result<Self> {
        let mut sub = LpSub {
            solver,
            sense,
            eps,
            var_obj: Vec::new(),
            var_lb: Vec::new(),
            var_ub: Vec::new(),
            eliminated: Vec::new(),
            orig2lp: Vec::new(),
            lp2orig: Vec::new(),
            row_sense: Vec::new(),
            row_rhs: Vec::new(),
            row_cols: Vec::new(),
            row_orig2lp: Vec::new(),
            row_lp2orig: Vec::new(),
            value_add: 0.0,
            infeas_cons: Vec::new(),
        };
        for (col, elim) in cols {
            sub.var_obj.push(col.obj);
            sub.var_lb.push(col.lb);
            sub.var_ub.push(col.ub);
            sub.eliminated.push(elim);
        }
        for row in rows {
            sub.row_sense.push(row.sense);
            sub.row_rhs.push(row.rhs);
            sub.row_cols.push(row.row);
        }
        sub.rebuild()?;
        Ok(sub)
    }

    pub fn value_add(&self) -> f64 {
        self.value_add
    }

    pub fn infeas_cons(&self) -> &[usize] {
        &self.infeas_cons
    }

    pub fn n_row(&self) -> usize {
        self.row_sense.len()
    }

    pub fn n_col(&self) -> usize {
        self.var_obj.len()
    }

    pub fn nnz(&self) -> usize {
        self.row_cols.iter().map(Vec::len).sum()
    }

    pub fn is_eliminated(&self, orig_col: usize) -> bool {
        self.eliminated[orig_col].is_some()
    }

    pub fn value(&self) -> f64 {
        self.solver.value() + self.value_add
    }

    pub fn infeasible(&self) -> bool {
        self.solver.infeasible() || !self.infeas_cons.is_empty()
    }

    pub fn x_val(&self, orig_col: usize) -> f64 {
        match self.eliminated[orig_col] {
            Some(v) => v,
            None => self.solver.x_val(self.orig2lp[orig_col].expect("active column must be mapped")),
        }
    }

    pub fn bar_x_val(&self, orig_col: usize) -> f64 {
        match self.eliminated[orig_col] {
            Some(v) => v,
            None => self
                .solver
                .bar_x_val(self.orig2lp[orig_col].expect("active column must be mapped")),
        }
    }

    pub fn reco(&self, orig_col: usize) -> f64 {
        match self.eliminated[orig_col] {
            Some(_) => 0.0,
            None => self.solver.reco(self.orig2lp[orig_col].expect("active column must be mapped")),
        }
    }

    pub fn lp_var_stat(&self, orig_col: usize) -> LpVarStat {
        match self.eliminated[orig_col] {
            Some(_) => LpVarStat::Eliminated,
            None => self
                .solver
                .lp_var_stat(self.orig2lp[orig_col].expect("active column must be mapped")),
        }
    }

    pub fn l_bound(&self, orig_col: usize) -> f64 {
        match self.eliminated[orig_col] {
            Some(v) => v,
            None => self.var_lb[orig_col],
        }
    }

    pub fn u_bound(&self, orig_col: usize) -> f64 {
        match self.eliminated[orig_col] {
            Some(v) => v,
            None => self.var_ub[orig_col],
        }
    }

    pub fn y_val(&self, orig_row: usize) -> f64 {
        match self.row_orig2lp[orig_row] {
            Some(lp) => self.solver.y_val(lp),
            None => 0.0,
        }
    }

    pub fn slack(&self, orig_row: usize) -> f64 {
        match self.row_orig2lp[orig_row] {
            Some(lp) => self.solver.slack(lp),
            None => self.adjusted_rhs(orig_row),
        }
    }

    pub fn slack_stat(&self, orig_row: usize) -> SlackStat {
        match self.row_orig2lp[orig_row] {
            Some(lp) => self.solver.slack_stat(lp),
            None => SlackStat::Unknown,
        }
    }

    pub fn get_infeas(&self) -> Infeasibility {
        self.solver.get_infeas()
    }

    pub fn pivot_slack_variable_in(&mut self, orig_row: usize) -> Result<()> {
        match self.row_orig2lp[orig_row] {
            Some(lp) => self.solver.pivot_slack_variable_in(lp),
            None => Ok(()),
        }
    }

    pub fn load_basis(&mut self, var_status: Vec<LpVarStat>, slack_status: Vec<SlackStat>) -> Result<()> {
        self.solver.load_basis(var_status, slack_status)
    }

    /// Delegates to the backend; if the result is infeasible and `method`
    /// wasn't already dual, re-solves dual to recover a dual-feasible
    /// basis for pricing-based feasibility restoration (§4.6).
    pub fn optimize(&mut self, method: LpMethod) -> Result<()> {
        self.solver.optimize(method)?;
        if self.solver.infeasible() && method != LpMethod::Dual {
            self.solver.optimize(LpMethod::Dual)?;
        }
        Ok(())
    }

    pub fn change_lbound(&mut self, orig_col: usize, lb: f64) -> Result<()> {
        if self.eliminated[orig_col].is_some() {
            return Err(Error::BoundChangeOnEliminated(orig_col));
        }
        self.var_lb[orig_col] = lb;
        self.solver
            .change_lbound(self.orig2lp[orig_col].expect("active column must be mapped"), lb)
    }

    pub fn change_ubound(&mut self, orig_col: usize, ub: f64) -> Result<()> {
        if self.eliminated[orig_col].is_some() {
            return Err(Error::BoundChangeOnEliminated(orig_col));
        }
        self.var_ub[orig_col] = ub;
        self.solver
            .change_ubound(self.orig2lp[orig_col].expect("active column must be mapped"), ub)
    }

    pub fn change_rhs(&mut self, orig_row: usize, rhs: f64) -> Result<()> {
        self.row_rhs[orig_row] = rhs;
        let adjusted = self.adjusted_rhs(orig_row);
        match self.row_orig2lp[orig_row] {
            Some(lp) => self.solver.change_rhs(lp, adjusted)?,
            None => {
                self.infeas_cons.retain(|&r| r != orig_row);
                if void_lhs_violated(self.row_sense[orig_row], adjusted, self.eps) != VoidLhsResult::Feasible
                {
                    self.infeas_cons.push(orig_row);
                }
            }
        }
        Ok(())
    }

    /// Appends new rows (orig-indexed columns in `rows[i].row`). Returns
    /// the orig row indices assigned. A newly void-and-infeasible row is a
    /// fatal error at this point, since initialization has already
    /// happened (§4.6 "a fatal error if they occur post-initialization").
    pub fn add_cons(&mut self, rows: Vec<RowSpec>) -> Result<Vec<usize>> {
        let start = self.row_sense.len();
        for row in rows {
            self.row_sense.push(row.sense);
            self.row_rhs.push(row.rhs);
            self.row_cols.push(row.row);
        }
        let was_infeasible: HashSet<usize> = self.infeas_cons.iter().copied().collect();
        self.rebuild()?;
        let mut assigned = Vec::new();
        for idx in start..self.row_sense.len() {
            if self.infeas_cons.contains(&idx) && !was_infeasible.contains(&idx) {
                return Err(Error::VoidLhsInfeasible(idx));
            }
            assigned.push(idx);
        }
        Ok(assigned)
    }

    /// Removes rows at `sorted_orig_idx` (forwarded to the backend for
    /// non-void rows); all later orig row indices shift down to close the
    /// gap, exactly as [`bc_pool::Active::remove`] does for the active set
    /// it mirrors.
    pub fn remove_cons(&mut self, sorted_orig_idx: &[usize]) -> Result<()> {
        if !sorted_orig_idx.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::Backend("remove_cons indices must be strictly increasing".into()));
        }
        let drop: HashSet<usize> = sorted_orig_idx.iter().copied().collect();
        self.row_sense = keep_unless(self.row_sense.drain(..), &drop);
        self.row_rhs = keep_unless(self.row_rhs.drain(..), &drop);
        self.row_cols = keep_unless(self.row_cols.drain(..), &drop);
        self.rebuild()
    }

    /// Appends new variables. `cols[i].1` is `Some(value)` to eliminate
    /// the variable immediately at `value`, `None` to keep it active and
    /// generate its column against the current rows (§4.6 "classifies
    /// each addition as eliminable or not"). Returns the orig indices
    /// assigned.
    pub fn add_vars(&mut self, cols: Vec<(ColSpec, Option<f64>)>) -> Result<Vec<usize>> {
        let start = self.var_obj.len();
        for (offset, (col, elim)) in cols.into_iter().enumerate() {
            let idx = start + offset;
            self.var_obj.push(col.obj);
            self.var_lb.push(col.lb);
            self.var_ub.push(col.ub);
            self.eliminated.push(elim);
            for (row, coeff) in col.col {
                if row < self.row_cols.len() {
                    self.row_cols[row].push((idx, coeff));
                }
            }
        }
        self.rebuild()?;
        Ok((start..self.var_obj.len()).collect())
    }

    /// Removes variables at `sorted_orig_idx`; eliminated removals simply
    /// drop out of the bookkeeping (their `valueAdd`/rhs contribution is
    /// recomputed from scratch on rebuild), non-eliminated removals are
    /// forwarded to the backend. All later orig column indices shift down.
    pub fn remove_vars(&mut self, sorted_orig_idx: &[usize]) -> Result<()> {
        if !sorted_orig_idx.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::Backend("remove_vars indices must be strictly increasing".into()));
        }
        let drop: Vec<usize> = sorted_orig_idx.to_vec();
        let drop_set: HashSet<usize> = drop.iter().copied().collect();
        for row in &mut self.row_cols {
            *row = row
                .iter()
                .filter_map(|&(c, coeff)| reindex(c, &drop).map(|nc| (nc, coeff)))
                .collect();
        }
        self.var_obj = keep_unless(self.var_obj.drain(..), &drop_set);
        self.var_lb = keep_unless(self.var_lb.drain(..), &drop_set);
        self.var_ub = keep_unless(self.var_ub.drain(..), &drop_set);
        self.eliminated = keep_unless(self.eliminated.drain(..), &drop_set);
        self.rebuild()
    }

    fn adjusted_rhs(&self, orig_row: usize) -> f64 {
        let mut rhs = self.row_rhs[orig_row];
        for &(col, coeff) in &self.row_cols[orig_row] {
            if let Some(value) = self.eliminated[col] {
                rhs -= coeff * value;
            }
        }
        rhs
    }

    /// Recomputes `orig2lp`/`lp2orig`, the row void/feasibility
    /// classification, `valueAdd`, and re-initializes the backend model
    /// from the retained orig-indexed matrix.
    fn rebuild(&mut self) -> Result<()> {
        self.orig2lp = vec![None; self.var_obj.len()];
        self.lp2orig = Vec::new();
        for i in 0..self.var_obj.len() {
            if self.eliminated[i].is_none() {
                self.orig2lp[i] = Some(self.lp2orig.len());
                self.lp2orig.push(i);
            }
        }

        self.value_add = (0..self.var_obj.len())
            .filter_map(|i| self.eliminated[i].map(|v| self.var_obj[i] * v))
            .sum();

        let mut backend_rows = Vec::new();
        self.row_orig2lp = vec![None; self.row_sense.len()];
        self.row_lp2orig = Vec::new();
        self.infeas_cons.clear();
        for r in 0..self.row_sense.len() {
            let adjusted = self.adjusted_rhs(r);
            let filtered: Vec<(usize, f64)> = self.row_cols[r]
                .iter()
                .filter_map(|&(c, coeff)| self.orig2lp[c].map(|lp| (lp, coeff)))
                .collect();
            if filtered.is_empty() {
                if void_lhs_violated(self.row_sense[r], adjusted, self.eps) != VoidLhsResult::Feasible {
                    self.infeas_cons.push(r);
                }
            } else {
                self.row_orig2lp[r] = Some(backend_rows.len());
                self.row_lp2orig.push(r);
                backend_rows.push(RowSpec {
                    sense: self.row_sense[r],
                    rhs: adjusted,
                    row: filtered,
                });
            }
        }

        let backend_cols: Vec<ColSpec> = self
            .lp2orig
            .iter()
            .map(|&i| ColSpec {
                obj: self.var_obj[i],
                lb: self.var_lb[i],
                ub: self.var_ub[i],
                col: Vec::new(),
            })
            .collect();

        self.solver
            .initialize(self.sense, backend_rows, backend_cols, None, None)
    }
}

fn keep_unless<T>(items: impl Iterator<Item = T>, drop: &HashSet<usize>) -> Vec<T> {
    items
        .enumerate()
        .filter_map(|(i, v)| (!drop.contains(&i)).then_some(v))
        .collect()
}

fn reindex(old: usize, drop_sorted: &[usize]) -> Option<usize> {
    if drop_sorted.binary_search(&old).is_ok() {
        return None;
    }
    Some(old - drop_sorted.partition_point(|&d| d < old))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use bc_model::Sense;

    use super::*;

    #[derive(Default)]
    struct FakeSolver {
        rows: usize,
        cols: usize,
        x: Vec<f64>,
        infeasible: RefCell<bool>,
    }

    impl LpSolver for FakeSolver {
        fn initialize(
            &mut self,
            _sense: OptSense,
            rows: Vec<RowSpec>,
            cols: Vec<ColSpec>,
            _var_status: Option<Vec<LpVarStat>>,
            _slack_status: Option<Vec<SlackStat>>,
        ) -> Result<()> {
            self.rows = rows.len();
            self.cols = cols.len();
            self.x = vec![0.0; self.cols];
            *self.infeasible.borrow_mut() = false;
            Ok(())
        }

        fn add_cons(&mut self, rows: Vec<RowSpec>) -> Result<()> {
            self.rows += rows.len();
            Ok(())
        }

        fn remove_cons(&mut self, idx: &[usize]) -> Result<()> {
            self.rows -= idx.len();
            Ok(())
        }

        fn add_vars(&mut self, cols: Vec<ColSpec>) -> Result<()> {
            self.cols += cols.len();
            Ok(())
        }

        fn remove_vars(&mut self, idx: &[usize]) -> Result<()> {
            self.cols -= idx.len();
            Ok(())
        }

        fn change_lbound(&mut self, _col: usize, _lb: f64) -> Result<()> {
            Ok(())
        }

        fn change_ubound(&mut self, _col: usize, _ub: f64) -> Result<()> {
            Ok(())
        }

        fn change_rhs(&mut self, _row: usize, _rhs: f64) -> Result<()> {
            Ok(())
        }

        fn load_basis(&mut self, _v: Vec<LpVarStat>, _s: Vec<SlackStat>) -> Result<()> {
            Ok(())
        }

        fn optimize(&mut self, _method: LpMethod) -> Result<()> {
            Ok(())
        }

        fn value(&self) -> f64 {
            0.0
        }

        fn x_val(&self, col: usize) -> f64 {
            self.x.get(col).copied().unwrap_or(0.0)
        }

        fn bar_x_val(&self, col: usize) -> f64 {
            self.x_val(col)
        }

        fn reco(&self, _col: usize) -> f64 {
            0.0
        }

        fn y_val(&self, _row: usize) -> f64 {
            0.0
        }

        fn slack(&self, _row: usize) -> f64 {
            0.0
        }

        fn lp_var_stat(&self, _col: usize) -> LpVarStat {
            LpVarStat::Basic
        }

        fn slack_stat(&self, _row: usize) -> SlackStat {
            SlackStat::Basic
        }

        fn get_infeas(&self) -> Infeasibility {
            Infeasibility::default()
        }

        fn infeasible(&self) -> bool {
            *self.infeasible.borrow()
        }

        fn n_row(&self) -> usize {
            self.rows
        }

        fn n_col(&self) -> usize {
            self.cols
        }

        fn nnz(&self) -> usize {
            0
        }

        fn pivot_slack_variable_in(&mut self, _row: usize) -> Result<()> {
            Ok(())
        }
    }

    fn row(sense: Sense, rhs: f64, coeffs: &[(usize, f64)]) -> RowSpec {
        RowSpec {
            sense,
            rhs,
            row: coeffs.to_vec(),
        }
    }

    fn col(obj: f64) -> ColSpec {
        ColSpec {
            obj,
            lb: 0.0,
            ub: 1.0,
            col: Vec::new(),
        }
    }

    #[test]
    fn eliminated_variable_removes_row_and_shifts_rhs() {
        // x0 + x1 <= 3, x0 fixed to 2 -> adjusted row is just x1 <= 1.
        let rows = vec![row(Sense::Less, 3.0, &[(0, 1.0), (1, 1.0)])];
        let cols = vec![(col(1.0), Some(2.0)), (col(1.0), None)];
        let sub = LpSub::new(FakeSolver::default(), OptSense::Minimize, rows, cols, 1e-6).unwrap();
        assert_eq!(sub.n_row(), 1);
        assert_eq!(sub.value_add(), 2.0);
        assert_eq!(sub.l_bound(0), 2.0);
        assert_eq!(sub.x_val(0), 2.0);
    }

    #[test]
    fn fully_eliminated_row_is_void_and_classified() {
        // x0 <= 1, x0 fixed to 2: void lhs, infeasible (0 <= 1 - 2 = -1).
        let rows = vec![row(Sense::Less, 1.0, &[(0, 1.0)])];
        let cols = vec![(col(1.0), Some(2.0))];
        let sub = LpSub::new(FakeSolver::default(), OptSense::Minimize, rows, cols, 1e-6).unwrap();
        assert_eq!(sub.n_row(), 1);
        assert_eq!(sub.infeas_cons(), &[0]);
        assert!(sub.infeasible());
    }

    #[test]
    fn add_cons_post_init_fatal_on_infeasible_void_row() {
        let cols = vec![(col(1.0), Some(2.0))];
        let mut sub = LpSub::new(FakeSolver::default(), OptSense::Minimize, vec![], cols, 1e-6).unwrap();
        let bad_row = row(Sense::Less, 1.0, &[(0, 1.0)]);
        assert!(sub.add_cons(vec![bad_row]).is_err());
    }

    #[test]
    fn change_lbound_on_eliminated_variable_errors() {
        let cols = vec![(col(1.0), Some(2.0))];
        let mut sub = LpSub::new(FakeSolver::default(), OptSense::Minimize, vec![], cols, 1e-6).unwrap();
        assert!(sub.change_lbound(0, 0.0).is_err());
    }

    #[test]
    fn remove_vars_reindexes_remaining_columns() {
        let rows = vec![row(Sense::Less, 5.0, &[(0, 1.0), (1, 1.0), (2, 1.0)])];
        let cols = vec![(col(1.0), None), (col(1.0), None), (col(1.0), None)];
        let mut sub = LpSub::new(FakeSolver::default(), OptSense::Minimize, rows, cols, 1e-6).unwrap();
        sub.remove_vars(&[1]).unwrap();
        assert_eq!(sub.n_col(), 2);
        // Remaining orig var 2 shifted to orig index 1 after removal.
        assert!(sub.orig2lp.get(1).copied().flatten().is_some());
    }
}
