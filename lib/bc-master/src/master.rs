//! `Master`: owns the enumeration tree's arena, the initial pools, the
//! open-subproblem queue and the top-level optimization loop (§4.8, §4.9,
//! §4.10).
//!
//! Grounded on the teacher's `Experiment` runner (`lib/execution/src/runner.rs`)
//! for the shape of "own the resources, drive a loop, map to an exit
//! status" even though nothing here is async: `bc-node`'s `Sub` plays the
//! role of a single simulation step, this loop the experiment driver.

use std::collections::HashMap;

use bc_lp::LpSolver;
use bc_log::{VbcColor, VbcLog};
use bc_model::{FsVarStat, OptSense, SubId};
use bc_node::{
    BranchRule, FathomReason, IterationOutcome, NodeConstraint, NodeVariable, ProblemHooks, Sub, SubStatus,
};
use bc_pool::{PoolSlotRef, StandardPool};

use crate::{
    fixcand::FixCand,
    opensub::{OpenEntry, OpenSub},
    params::Parameters,
    termination::Status,
    timers::Timers,
};

/// Running counters surfaced for reporting (§6 "statistics").
#[derive(Debug, Clone, Copy, Default)]
pub struct Statistics {
    pub n_subs_processed: u64,
    pub n_lp_iterations: u64,
    pub n_subs_fathomed: u64,
}

pub struct Master<S: LpSolver + Default, H: ProblemHooks> {
    params: Parameters,
    sense: OptSense,
    con_pool: StandardPool<NodeConstraint>,
    var_pool: StandardPool<NodeVariable>,
    subs: HashMap<SubId, Sub<S>>,
    /// Father -> sons, populated as `branch` spawns them; consulted to find
    /// the remaining-tree root once a branching's siblings all fathom
    /// (§4.7.3, §4.7.7).
    family: HashMap<SubId, Vec<SubId>>,
    open: OpenSub,
    fix_cand: FixCand,
    primal_bound: Option<f64>,
    global_status: Vec<FsVarStat>,
    timers: Timers,
    next_id: u64,
    stats: Statistics,
    vbc: VbcLog,
    hooks: H,
}

impl<S: LpSolver + Default, H: ProblemHooks> Master<S, H> {
    /// Seeds the master problem's pools and root Subproblem from the
    /// initial constraint/variable set (§4.7.1 "root activation").
    pub fn new(
        params: Parameters,
        sense: OptSense,
        hooks: H,
        cons: Vec<NodeConstraint>,
        vars: Vec<NodeVariable>,
    ) -> Self {
        let mut con_pool = StandardPool::new(cons.len());
        let mut var_pool = StandardPool::new(vars.len());
        let n_vars = vars.len();

        let con_refs: Vec<PoolSlotRef<NodeConstraint>> = cons
            .into_iter()
            .map(|c| PoolSlotRef::new(con_pool.try_insert(c).expect("pool sized to initial constraint count")))
            .collect();
        let var_refs: Vec<PoolSlotRef<NodeVariable>> = vars
            .into_iter()
            .map(|v| PoolSlotRef::new(var_pool.try_insert(v).expect("pool sized to initial variable count")))
            .collect();

        let mut root = Sub::new_root(
            SubId(0),
            sense,
            params.tail_off_n_lp.max(1),
            params.max_con_buffered,
            params.max_var_buffered,
        );
        root.seed_root(con_refs, var_refs);
        // The root is its own remaining-tree root from the start: its first
        // solved LP seeds `fix_cand` (§4.7.7 "S6").
        root.mark_remaining_root(false);

        let mut subs = HashMap::new();
        subs.insert(SubId(0), root);

        let mut open = OpenSub::new(params.enumeration_strategy, sense, params.min_dormant_rounds);
        open.insert(OpenEntry {
            id: SubId(0),
            level: 0,
            dual_bound: sense.worst_dual_bound(),
            prefers_upper: false,
        });

        Master {
            params,
            sense,
            con_pool,
            var_pool,
            subs,
            family: HashMap::new(),
            open,
            fix_cand: FixCand::new(sense),
            primal_bound: None,
            global_status: vec![FsVarStat::Free; n_vars],
            timers: Timers::start(),
            next_id: 1,
            stats: Statistics::default(),
            vbc: VbcLog::disabled(),
            hooks,
        }
    }

    pub fn set_vbc_log(&mut self, log: VbcLog) {
        self.vbc = log;
    }

    pub fn primal_bound(&self) -> Option<f64> {
        self.primal_bound
    }

    pub fn dual_bound(&self) -> f64 {
        self.open.aggregate_dual_bound()
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    /// Relative gap between the incumbent and the remaining tree's dual
    /// bound, expressed as a percentage (§4.9 "guarantee").
    pub fn guarantee(&self) -> Option<f64> {
        let pb = self.primal_bound?;
        let db = self.dual_bound();
        if pb.abs() <= self.params.eps {
            return Some((pb - db).abs() * 100.0);
        }
        Some(((pb - db) / pb).abs() * 100.0)
    }

    /// Drives the enumeration to termination (§4.9 "Master optimize loop").
    pub fn optimize(&mut self) -> Status {
        loop {
            if self.timers.cpu_elapsed().as_secs_f64() > self.params.max_cpu_time {
                return Status::MaxCpuTime;
            }
            if self.timers.cow_elapsed().as_secs_f64() > self.params.max_cow_time {
                return Status::MaxCowTime;
            }
            if let Some(g) = self.guarantee() {
                if g <= self.params.required_guarantee {
                    return if self.open.is_empty() {
                        Status::Optimal
                    } else {
                        Status::Guaranteed
                    };
                }
            }

            let subs = &self.subs;
            let id = match self.open.select(|id| {
                subs.get(&id)
                    .map(|s| (matches!(s.status, SubStatus::Dormant), s.dormant_rounds()))
                    .unwrap_or((false, 0))
            }) {
                Some(id) => id,
                None => break,
            };
            self.process(id);
        }

        if self.primal_bound.is_some() {
            Status::Optimal
        } else {
            Status::Error
        }
    }

    fn process(&mut self, id: SubId) {
        let level = self.subs.get(&id).expect("queued id must be in the arena").level;
        if level > self.params.max_level {
            self.fathom(id, FathomReason::MaxLevel);
            return;
        }

        let status = self.subs.get(&id).expect("queued id must be in the arena").status;
        match status {
            SubStatus::Unprocessed => {
                let solver = S::default();
                let sub = self.subs.get_mut(&id).expect("just checked");
                if let Err(error) = sub.activate(solver, self.params.eliminate_fixed_set, self.params.eps) {
                    tracing::warn!(?id, %error, "activation failed, fathoming");
                    self.fathom(id, FathomReason::ProblemSpecific);
                    return;
                }
            }
            SubStatus::Dormant => {
                let ok = self
                    .subs
                    .get_mut(&id)
                    .expect("just checked")
                    .reconcile_global_fixings(&self.global_status, self.params.eps);
                if !ok {
                    self.fathom(id, FathomReason::Contradiction);
                    return;
                }
            }
            _ => {}
        }
        self.log_tree(id, VbcColor::Yellow);

        loop {
            self.stats.n_lp_iterations += 1;
            let outcome = {
                let node_params = self.params.node_params();
                let sub = self.subs.get_mut(&id).expect("still in the arena");
                sub.run_iteration(
                    &mut self.hooks,
                    &node_params,
                    self.primal_bound,
                    &mut self.con_pool,
                    &mut self.var_pool,
                )
            };

            if let Some(sub) = self.subs.get_mut(&id) {
                if let Some((lp_value, candidates)) = sub.take_fix_cand_snapshot() {
                    self.fix_cand.new_root(lp_value, candidates.into_iter());
                }
                for (var, target) in sub.take_pending_log_imp() {
                    if var < self.global_status.len() {
                        self.global_status[var] = target;
                    }
                }
            }

            match outcome {
                Ok(IterationOutcome::Continue) => continue,
                Ok(IterationOutcome::Feasible(value)) => {
                    // The LP relaxation's own optimum was already feasible
                    // for the original problem: nothing left in this
                    // subtree can beat it, so it fathoms rather than
                    // looping for another (pointless) iteration.
                    self.accept_primal(value);
                    self.fathom(id, FathomReason::Solved);
                    return;
                }
                Ok(IterationOutcome::Branch) => {
                    self.branch(id);
                    return;
                }
                Ok(IterationOutcome::Fathom(reason)) => {
                    self.fathom(id, reason);
                    return;
                }
                Ok(IterationOutcome::Pause) => {
                    // §4.7.2 step 8: pausing pushes the node back as
                    // dormant rather than fathoming or continuing it.
                    if let Some(sub) = self.subs.get_mut(&id) {
                        sub.bump_dormant();
                        self.open.insert(OpenEntry {
                            id,
                            level: sub.level,
                            dual_bound: sub.dual_bound,
                            prefers_upper: false,
                        });
                    }
                    self.log_tree(id, VbcColor::Yellow);
                    return;
                }
                Err(error) => {
                    tracing::error!(?id, %error, "node iteration failed, fathoming");
                    self.fathom(id, FathomReason::ProblemSpecific);
                    return;
                }
            }
        }
    }

    fn accept_primal(&mut self, value: f64) {
        let improved = self
            .primal_bound
            .map(|pb| self.sense.is_better(value, pb))
            .unwrap_or(true);
        if improved {
            tracing::info!(value, "new incumbent");
            self.primal_bound = Some(value);
            self.open.notify_feasible();
            if self.params.fix_set_by_red_cost {
                for (var, target) in self.fix_cand.rescan(value) {
                    if var < self.global_status.len() {
                        self.global_status[var] = target;
                    }
                }
            }
        }
    }

    fn branch(&mut self, id: SubId) {
        let rules: Vec<BranchRule> = {
            let node_params = self.params.node_params();
            self.subs.get(&id).expect("still in the arena").generate_branch_rules(&node_params)
        };
        if rules.is_empty() {
            // Nothing left to branch on: the LP optimum is the best this
            // subtree can offer and it didn't test feasible, so there is
            // no better integral point reachable from here.
            self.fathom(id, FathomReason::BoundLimit);
            return;
        }

        let father_level = self.subs.get(&id).expect("still in the arena").level;
        let mut sons = Vec::new();
        let mut fathomed_sons = Vec::new();
        for (i, rule) in rules.into_iter().enumerate() {
            let son_id = SubId(self.next_id);
            self.next_id += 1;
            let son = {
                let father = self.subs.get(&id).expect("still in the arena");
                Sub::new_son(father, son_id, rule)
            };
            let son_status = son.status;
            let son_dual_bound = son.dual_bound;
            self.subs.insert(son_id, son);
            sons.push(son_id);
            if let SubStatus::Fathomed(reason) = son_status {
                self.stats.n_subs_fathomed += 1;
                self.log_tree(son_id, fathom_color(reason));
                fathomed_sons.push(son_id);
                continue;
            }
            self.open.insert(OpenEntry {
                id: son_id,
                level: father_level + 1,
                dual_bound: son_dual_bound,
                prefers_upper: i == 1,
            });
            self.log_tree(son_id, VbcColor::White);
        }
        self.family.insert(id, sons);

        if let Some(sub) = self.subs.get_mut(&id) {
            sub.fathom(FathomReason::ProblemSpecific);
            sub.status = SubStatus::Processed;
        }
        self.stats.n_subs_processed += 1;
        self.log_tree(id, VbcColor::Blue);
        for son_id in fathomed_sons {
            self.try_promote_remaining_root(son_id);
        }
        self.try_promote_remaining_root(id);
    }

    fn fathom(&mut self, id: SubId, reason: FathomReason) {
        self.open.remove(id);
        if let Some(sub) = self.subs.get_mut(&id) {
            sub.fathom(reason);
        }
        self.stats.n_subs_processed += 1;
        self.stats.n_subs_fathomed += 1;
        self.log_tree(id, fathom_color(reason));
        self.try_promote_remaining_root(id);
    }

    /// Walks upward from a just-closed node (fathomed, or branched-and-thus
    /// internal) to find whether its siblings have all fathomed too. A lone
    /// surviving sibling is promoted as the new remaining-tree root; if
    /// every sibling (including this one) has fathomed, the search
    /// continues one level further up (§4.7.3, §4.7.7).
    fn try_promote_remaining_root(&mut self, id: SubId) {
        let mut current = id;
        loop {
            let Some(father_id) = self.subs.get(&current).and_then(|s| s.father) else {
                return;
            };
            let Some(siblings) = self.family.get(&father_id).cloned() else {
                return;
            };
            let alive: Vec<SubId> = siblings
                .iter()
                .copied()
                .filter(|sid| !matches!(self.subs.get(sid).map(|s| s.status), Some(SubStatus::Fathomed(_))))
                .collect();
            match alive.len() {
                0 => {
                    current = father_id;
                }
                1 => {
                    self.promote_remaining_root(alive[0]);
                    return;
                }
                _ => return,
            }
        }
    }

    fn promote_remaining_root(&mut self, id: SubId) {
        if let Some(sub) = self.subs.get_mut(&id) {
            sub.mark_remaining_root(self.params.new_root_reoptimize);
        }
    }

    /// Emits one VBC tree-log record for `id`'s current bounds (§6
    /// "Tree-log format"). Silently drops write failures: a stalled tree
    /// log must never abort the search.
    fn log_tree(&mut self, id: SubId, color: VbcColor) {
        let Some(sub) = self.subs.get(&id) else { return };
        let father = sub.father.map(|f| f.0).unwrap_or(id.0);
        let lb = sub.dual_bound;
        let ub = self.primal_bound.unwrap_or_else(|| self.sense.worst_primal_bound());
        let timestamp = Some(self.timers.cow_elapsed().as_secs_f64());
        let _ = self.vbc.record(timestamp, id.0, father, color, lb, ub);
    }
}

fn fathom_color(reason: FathomReason) -> VbcColor {
    match reason {
        FathomReason::Infeasible | FathomReason::Contradiction => VbcColor::Red,
        FathomReason::BoundLimit
        | FathomReason::ProblemSpecific
        | FathomReason::ResourceExhausted
        | FathomReason::MaxLevel
        | FathomReason::Solved => VbcColor::Blue,
    }
}

#[cfg(test)]
mod tests {
    use bc_lp::DenseSimplex;
    use bc_model::{ConVarCore, Sense, VarType};
    use bc_node::{LpView, SparseCol, SparseRow};

    use super::*;

    /// Declares every LP-feasible point integral, the way a binary-only
    /// instance with no separation or pricing would: branching alone
    /// drives the search to an integral optimum.
    struct AcceptAnyBinary {
        eps: f64,
    }

    impl ProblemHooks for AcceptAnyBinary {
        fn feasible(&mut self, view: &LpView) -> Option<f64> {
            let integral = view.x.iter().all(|&x| x < self.eps || x > 1.0 - self.eps);
            integral.then_some(view.lp_value)
        }
    }

    fn binary_var(obj: f64, row: usize, coeff: f64) -> NodeVariable {
        bc_model::Variable::new(
            ConVarCore::new(None, false, false),
            VarType::Binary,
            obj,
            0.0,
            1.0,
            SparseCol(vec![(row, coeff)]),
        )
    }

    fn row_con(sense: Sense, rhs: f64, coeffs: Vec<(usize, f64)>) -> NodeConstraint {
        bc_model::Constraint::new(ConVarCore::new(None, false, false), sense, rhs, true, SparseRow(coeffs))
    }

    /// S1: two binary variables constrained to sum to at least 3 can never
    /// be satisfied, so the root LP itself is infeasible and no incumbent
    /// is ever found.
    #[test]
    fn trivial_bound_contradiction_yields_no_incumbent() {
        let cons = vec![row_con(Sense::Greater, 3.0, vec![(0, 1.0), (1, 1.0)])];
        let vars = vec![binary_var(1.0, 0, 1.0), binary_var(1.0, 0, 1.0)];

        let hooks = AcceptAnyBinary { eps: 1e-6 };
        let mut master: Master<DenseSimplex, AcceptAnyBinary> =
            Master::new(Parameters::default(), OptSense::Maximize, hooks, cons, vars);

        let status = master.optimize();

        assert!(master.primal_bound().is_none());
        assert_eq!(status, Status::Error);
    }

    /// S2: `max x1+x2 s.t. x1+x2<=1.5`, both binary. The LP relaxation sits
    /// at 1.5 with a fractional point; branching on either variable forces
    /// the optimum down to the integral value 1.
    #[test]
    fn pure_lp_node_branches_to_integral_optimum() {
        let cons = vec![row_con(Sense::Less, 1.5, vec![(0, 1.0), (1, 1.0)])];
        let vars = vec![binary_var(1.0, 0, 1.0), binary_var(1.0, 0, 1.0)];

        let hooks = AcceptAnyBinary { eps: 1e-6 };
        let mut master: Master<DenseSimplex, AcceptAnyBinary> =
            Master::new(Parameters::default(), OptSense::Maximize, hooks, cons, vars);

        let status = master.optimize();

        assert_eq!(status, Status::Optimal);
        assert!((master.primal_bound().expect("a feasible point exists") - 1.0).abs() < 1e-6);
    }

    /// S3-shaped: a variable fixed to 0 by its own tight bounds is never
    /// part of a feasible incumbent above its forced value.
    #[test]
    fn fixed_variable_is_excluded_from_the_incumbent() {
        let cons = vec![row_con(Sense::Less, 10.0, vec![(0, 1.0), (1, 1.0)])];
        let mut vars = vec![binary_var(5.0, 0, 1.0), binary_var(1.0, 0, 1.0)];
        vars[0].ub = 0.0; // fixed to 0 by its own bounds

        let hooks = AcceptAnyBinary { eps: 1e-6 };
        let mut master: Master<DenseSimplex, AcceptAnyBinary> =
            Master::new(Parameters::default(), OptSense::Maximize, hooks, cons, vars);

        let status = master.optimize();

        assert_eq!(status, Status::Optimal);
        assert!((master.primal_bound().expect("a feasible point exists") - 1.0).abs() < 1e-6);
    }
}
