//! A small dense, Big-M, standard-form simplex: the bundled reference
//! implementation of [`crate::solver::LpSolver`] used when nothing faster
//! (CPLEX, a revised-simplex crate) is wired in.
//!
//! No example in the retrieval pack ships a simplex method, so this is
//! built from the textbook algorithm rather than grounded in a specific
//! file. It deliberately avoids bounded-variable pivoting: every column
//! bound is instead encoded as an extra `<=` row after shifting the
//! column's own lower bound to zero, which keeps the pivot loop to the
//! ordinary nonnegative-variable case and lets Bland's rule guarantee
//! termination without a cycling edge case to get subtly wrong. It is
//! meant for the demo binary and small instances, not performance.

use bc_model::{LpVarStat, OptSense, Sense, SlackStat};

use crate::{
    error::Result,
    solver::{ColSpec, Infeasibility, LpMethod, LpSolver, RowSpec},
};

const BIG_M: f64 = 1.0e7;
const TOL: f64 = 1.0e-7;

#[derive(Default)]
pub struct DenseSimplex {
    sense: OptSense,
    rows: Vec<RowSpec>,
    cols: Vec<ColSpec>,
    solved: bool,
    infeasible: bool,
    unbounded: bool,
    x: Vec<f64>,
    reduced_cost: Vec<f64>,
    dual: Vec<f64>,
    obj_value: f64,
}

/// One normalized row of the extended system: `coeffs . x' = rhs`, `rhs >= 0`,
/// plus which auxiliary column (if any) serves as that row's dual reference.
struct NormalizedRow {
    coeffs: Vec<f64>,
    rhs: f64,
    ref_col: usize,
    flipped: bool,
}

impl LpSolver for DenseSimplex {
    fn initialize(
        &mut self,
        sense: OptSense,
        rows: Vec<RowSpec>,
        cols: Vec<ColSpec>,
        _var_status: Option<Vec<LpVarStat>>,
        _slack_status: Option<Vec<SlackStat>>,
    ) -> Result<()> {
        self.sense = sense;
        self.rows = rows;
        self.cols = cols;
        self.solved = false;
        self.infeasible = false;
        self.unbounded = false;
        self.x = vec![0.0; self.cols.len()];
        self.reduced_cost = vec![0.0; self.cols.len()];
        self.dual = vec![0.0; self.rows.len()];
        self.obj_value = 0.0;
        Ok(())
    }

    fn add_cons(&mut self, rows: Vec<RowSpec>) -> Result<()> {
        self.rows.extend(rows);
        self.solved = false;
        Ok(())
    }

    fn remove_cons(&mut self, sorted_idx: &[usize]) -> Result<()> {
        remove_sorted(&mut self.rows, sorted_idx);
        self.solved = false;
        Ok(())
    }

    fn add_vars(&mut self, cols: Vec<ColSpec>) -> Result<()> {
        self.cols.extend(cols);
        self.solved = false;
        Ok(())
    }

    fn remove_vars(&mut self, sorted_idx: &[usize]) -> Result<()> {
        remove_sorted(&mut self.cols, sorted_idx);
        self.solved = false;
        Ok(())
    }

    fn change_lbound(&mut self, col: usize, lb: f64) -> Result<()> {
        self.cols[col].lb = lb;
        self.solved = false;
        Ok(())
    }

    fn change_ubound(&mut self, col: usize, ub: f64) -> Result<()> {
        self.cols[col].ub = ub;
        self.solved = false;
        Ok(())
    }

    fn change_rhs(&mut self, row: usize, rhs: f64) -> Result<()> {
        self.rows[row].rhs = rhs;
        self.solved = false;
        Ok(())
    }

    fn load_basis(&mut self, _var_status: Vec<LpVarStat>, _slack_status: Vec<SlackStat>) -> Result<()> {
        Ok(())
    }

    fn optimize(&mut self, _method: LpMethod) -> Result<()> {
        self.solve();
        Ok(())
    }

    fn value(&self) -> f64 {
        if self.unbounded {
            return match self.sense {
                OptSense::Minimize => f64::NEG_INFINITY,
                OptSense::Maximize => f64::INFINITY,
            };
        }
        self.obj_value
    }

    fn x_val(&self, col: usize) -> f64 {
        self.x.get(col).copied().unwrap_or(0.0)
    }

    fn bar_x_val(&self, col: usize) -> f64 {
        self.x_val(col)
    }

    fn reco(&self, col: usize) -> f64 {
        self.reduced_cost.get(col).copied().unwrap_or(0.0)
    }

    fn y_val(&self, row: usize) -> f64 {
        self.dual.get(row).copied().unwrap_or(0.0)
    }

    fn slack(&self, row: usize) -> f64 {
        let r = &self.rows[row];
        let lhs: f64 = r.row.iter().map(|&(j, c)| c * self.x_val(j)).sum();
        r.rhs - lhs
    }

    fn lp_var_stat(&self, col: usize) -> LpVarStat {
        if self.reduced_cost.get(col).map(|rc| rc.abs() > TOL).unwrap_or(false) {
            LpVarStat::NonBasicLower
        } else {
            LpVarStat::Basic
        }
    }

    fn slack_stat(&self, row: usize) -> SlackStat {
        if self.slack(row).abs() <= TOL {
            SlackStat::NonBasicZero
        } else {
            SlackStat::Basic
        }
    }

    fn get_infeas(&self) -> Infeasibility {
        Infeasibility::default()
    }

    fn infeasible(&self) -> bool {
        self.infeasible
    }

    fn n_row(&self) -> usize {
        self.rows.len()
    }

    fn n_col(&self) -> usize {
        self.cols.len()
    }

    fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.row.len()).sum()
    }

    fn pivot_slack_variable_in(&mut self, _row: usize) -> Result<()> {
        Ok(())
    }
}

fn remove_sorted<T>(v: &mut Vec<T>, sorted_idx: &[usize]) {
    let drop: std::collections::HashSet<usize> = sorted_idx.iter().copied().collect();
    let mut i = 0;
    v.retain(|_| {
        let keep = !drop.contains(&i);
        i += 1;
        keep
    });
}

impl DenseSimplex {
    fn solve(&mut self) {
        let n = self.cols.len();
        let m_orig = self.rows.len();

        if n == 0 {
            self.solved = true;
            self.infeasible = false;
            self.unbounded = false;
            self.obj_value = 0.0;
            return;
        }

        let shift: Vec<f64> = self.cols.iter().map(|c| if c.lb.is_finite() { c.lb } else { 0.0 }).collect();

        let mut a_dense = vec![vec![0.0; n]; m_orig];
        for (i, row) in self.rows.iter().enumerate() {
            for &(j, coeff) in &row.row {
                a_dense[i][j] += coeff;
            }
        }

        let mut ext_coeffs: Vec<Vec<f64>> = Vec::new();
        let mut ext_rhs: Vec<f64> = Vec::new();
        let mut ext_sense: Vec<Sense> = Vec::new();
        let mut is_orig_row: Vec<bool> = Vec::new();

        for (i, row) in self.rows.iter().enumerate() {
            let adjustment: f64 = a_dense[i].iter().zip(&shift).map(|(a, s)| a * s).sum();
            ext_coeffs.push(a_dense[i].clone());
            ext_rhs.push(row.rhs - adjustment);
            ext_sense.push(row.sense);
            is_orig_row.push(true);
        }
        for (j, col) in self.cols.iter().enumerate() {
            if col.ub.is_finite() {
                let mut coeffs = vec![0.0; n];
                coeffs[j] = 1.0;
                ext_coeffs.push(coeffs);
                ext_rhs.push((col.ub - shift[j]).max(0.0));
                ext_sense.push(Sense::Less);
                is_orig_row.push(false);
            }
        }

        let ext_m = ext_coeffs.len();
        let mut normalized: Vec<NormalizedRow> = Vec::with_capacity(ext_m);
        let mut n_slack = 0usize;
        let mut n_surplus = 0usize;
        let mut n_artificial = 0usize;
        let mut row_kind: Vec<(bool, bool, bool)> = Vec::with_capacity(ext_m); // (slack, surplus, artificial)

        for i in 0..ext_m {
            let mut coeffs = ext_coeffs[i].clone();
            let mut rhs = ext_rhs[i];
            let mut sense = ext_sense[i];
            let mut flipped = false;
            if rhs < 0.0 {
                coeffs.iter_mut().for_each(|c| *c = -*c);
                rhs = -rhs;
                sense = match sense {
                    Sense::Less => Sense::Greater,
                    Sense::Greater => Sense::Less,
                    Sense::Equal => Sense::Equal,
                };
                flipped = true;
            }
            let kind = match sense {
                Sense::Less => (true, false, false),
                Sense::Greater => (false, true, true),
                Sense::Equal => (false, false, true),
            };
            if kind.0 {
                n_slack += 1;
            }
            if kind.1 {
                n_surplus += 1;
            }
            if kind.2 {
                n_artificial += 1;
            }
            row_kind.push(kind);
            normalized.push(NormalizedRow {
                coeffs,
                rhs,
                ref_col: 0, // filled below once column layout is known
                flipped,
            });
        }

        let slack_base = n;
        let surplus_base = slack_base + n_slack;
        let artificial_base = surplus_base + n_surplus;
        let total_vars = artificial_base + n_artificial;

        let mut slack_idx = slack_base;
        let mut surplus_idx = surplus_base;
        let mut artificial_idx = artificial_base;
        let mut basis = vec![0usize; ext_m];

        let mut tableau = vec![vec![0.0; total_vars]; ext_m];
        let mut rhs_col = vec![0.0; ext_m];

        for i in 0..ext_m {
            for j in 0..n {
                tableau[i][j] = normalized[i].coeffs[j];
            }
            rhs_col[i] = normalized[i].rhs;
            let (slack, surplus, artificial) = row_kind[i];
            if slack {
                tableau[i][slack_idx] = 1.0;
                normalized[i].ref_col = slack_idx;
                basis[i] = slack_idx;
                slack_idx += 1;
            }
            if surplus {
                tableau[i][surplus_idx] = -1.0;
                surplus_idx += 1;
            }
            if artificial {
                tableau[i][artificial_idx] = 1.0;
                normalized[i].ref_col = artificial_idx;
                basis[i] = artificial_idx;
                artificial_idx += 1;
            }
        }

        let internal_min = matches!(self.sense, OptSense::Maximize);
        let mut cost = vec![0.0; total_vars];
        for j in 0..n {
            cost[j] = if internal_min { -self.cols[j].obj } else { self.cols[j].obj };
        }
        for j in artificial_base..total_vars {
            cost[j] = BIG_M;
        }

        let max_iters = (total_vars + ext_m + 1) * 50 + 100;
        let mut iters = 0usize;
        loop {
            iters += 1;
            if iters > max_iters {
                break;
            }

            let mut z = vec![0.0; total_vars];
            for j in 0..total_vars {
                let mut s = 0.0;
                for i in 0..ext_m {
                    s += cost[basis[i]] * tableau[i][j];
                }
                z[j] = s;
            }

            let mut entering: Option<usize> = None;
            for j in 0..total_vars {
                if basis.contains(&j) {
                    continue;
                }
                if cost[j] - z[j] < -TOL {
                    entering = Some(j);
                    break;
                }
            }
            let entering = match entering {
                Some(j) => j,
                None => break,
            };

            let mut leaving: Option<usize> = None;
            let mut best_ratio = f64::INFINITY;
            for i in 0..ext_m {
                let coeff = tableau[i][entering];
                if coeff > TOL {
                    let ratio = rhs_col[i] / coeff;
                    if ratio < best_ratio - TOL
                        || (ratio < best_ratio + TOL && leaving.map(|l| basis[l] > basis[i]).unwrap_or(false))
                    {
                        best_ratio = ratio;
                        leaving = Some(i);
                    }
                }
            }
            let leaving = match leaving {
                Some(i) => i,
                None => {
                    self.unbounded = true;
                    break;
                }
            };

            let pivot = tableau[leaving][entering];
            for j in 0..total_vars {
                tableau[leaving][j] /= pivot;
            }
            rhs_col[leaving] /= pivot;
            for i in 0..ext_m {
                if i == leaving {
                    continue;
                }
                let factor = tableau[i][entering];
                if factor.abs() > TOL {
                    for j in 0..total_vars {
                        tableau[i][j] -= factor * tableau[leaving][j];
                    }
                    rhs_col[i] -= factor * rhs_col[leaving];
                }
            }
            basis[leaving] = entering;
        }

        let mut col_value = vec![0.0; total_vars];
        for i in 0..ext_m {
            col_value[basis[i]] = rhs_col[i];
        }

        let artificial_total: f64 = (artificial_base..total_vars).map(|j| col_value[j]).sum();
        self.infeasible = artificial_total > 1e-5;
        self.solved = true;

        let mut z = vec![0.0; total_vars];
        for j in 0..total_vars {
            let mut s = 0.0;
            for i in 0..ext_m {
                s += cost[basis[i]] * tableau[i][j];
            }
            z[j] = s;
        }

        self.x = (0..n).map(|j| col_value[j] + shift[j]).collect();
        self.reduced_cost = (0..n)
            .map(|j| {
                let rc = cost[j] - z[j];
                if internal_min {
                    -rc
                } else {
                    rc
                }
            })
            .collect();

        let internal_obj: f64 = (0..n).map(|j| cost[j] * col_value[j]).sum();
        let shift_contrib: f64 = (0..n).map(|j| self.cols[j].obj * shift[j]).sum();
        self.obj_value = if internal_min {
            -internal_obj + shift_contrib
        } else {
            internal_obj + shift_contrib
        };

        self.dual = vec![0.0; m_orig];
        for i in 0..m_orig {
            if !is_orig_row[i] {
                continue;
            }
            let local_y = -(cost[normalized[i].ref_col] - z[normalized[i].ref_col]);
            self.dual[i] = if normalized[i].flipped { -local_y } else { local_y };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(obj: f64, lb: f64, ub: f64) -> ColSpec {
        ColSpec { obj, lb, ub, col: Vec::new() }
    }

    fn row(sense: Sense, rhs: f64, coeffs: &[(usize, f64)]) -> RowSpec {
        RowSpec { sense, rhs, row: coeffs.to_vec() }
    }

    #[test]
    fn solves_small_knapsack_relaxation() {
        // max 5x0 + 4x1 s.t. 2x0 + 3x1 <= 5, 0<=x<=1
        let mut s = DenseSimplex::default();
        s.initialize(
            OptSense::Maximize,
            vec![row(Sense::Less, 5.0, &[(0, 2.0), (1, 3.0)])],
            vec![col(5.0, 0.0, 1.0), col(4.0, 0.0, 1.0)],
            None,
            None,
        )
        .unwrap();
        s.optimize(LpMethod::Primal).unwrap();
        assert!(!s.infeasible());
        assert!((s.value() - 7.666666).abs() < 1e-3);
    }

    #[test]
    fn detects_infeasible_system() {
        // x0 <= 1 and x0 >= 2, both with 0<=x0<=5.
        let mut s = DenseSimplex::default();
        s.initialize(
            OptSense::Minimize,
            vec![row(Sense::Less, 1.0, &[(0, 1.0)]), row(Sense::Greater, 2.0, &[(0, 1.0)])],
            vec![col(1.0, 0.0, 5.0)],
            None,
            None,
        )
        .unwrap();
        s.optimize(LpMethod::Primal).unwrap();
        assert!(s.infeasible());
    }

    #[test]
    fn respects_upper_bound_via_extra_row() {
        let mut s = DenseSimplex::default();
        s.initialize(
            OptSense::Maximize,
            vec![row(Sense::Less, 100.0, &[(0, 1.0)])],
            vec![col(1.0, 0.0, 3.0)],
            None,
            None,
        )
        .unwrap();
        s.optimize(LpMethod::Primal).unwrap();
        assert!((s.x_val(0) - 3.0).abs() < 1e-6);
    }
}
