//! `Sub`: one node of the enumeration tree (§4.7).

use bc_lp::{ColSpec, LpMethod, LpSolver, LpSub, RowSpec};
use bc_model::{
    ColGenerator, ConVarCore, FsVarStat, HasConVarCore, LpVarStat, OptSense, RowGenerator,
    SlackStat, SubId, VarType,
};
use bc_pool::{Active, CutBuffer, PoolSlotRef, StandardPool};

use crate::{
    branch::{rule_pair, select_candidates, BranchCandidateInfo, BranchRule, BranchingStrategy},
    dense::{SparseCol, SparseRow},
    error::{Error, Result},
    hooks::{LpView, ProblemHooks},
    status::{FathomReason, SubStatus},
    tailing_off::TailingOff,
};

pub type NodeConstraint = bc_model::Constraint<SparseRow>;
pub type NodeVariable = bc_model::Variable<SparseCol>;

/// Cutting/pricing skip schedule (§4.7.2 step 9, §6 "Parameters").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkippingMode {
    SkipByNode,
    SkipByLevel,
}

/// Constraint elimination criterion (§4.7.2 step 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConElimMode {
    None,
    NonBinding,
    Basic,
}

/// Variable elimination criterion (§4.7.2 step 9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarElimMode {
    None,
    ReducedCost,
}

/// The subset of Master parameters a single Sub's iteration needs (§6
/// "Parameters").
#[derive(Debug, Clone)]
pub struct NodeParams {
    pub max_con_add: usize,
    pub max_var_add: usize,
    pub max_con_buffered: usize,
    pub max_var_buffered: usize,
    pub tail_off_n_lp: usize,
    pub tail_off_percent: f64,
    pub branching_strategy: BranchingStrategy,
    pub n_branching_candidates: usize,
    pub max_level: u32,
    pub max_iterations: u64,
    pub skipping_mode: SkippingMode,
    pub skip_factor: u32,
    pub pricing_freq: u32,
    pub db_threshold: f64,
    pub con_elim_mode: ConElimMode,
    pub var_elim_mode: VarElimMode,
    pub con_elim_age: u32,
    pub var_elim_age: u32,
    pub con_elim_eps: f64,
    pub var_elim_eps: f64,
    pub eps: f64,
}

impl Default for NodeParams {
    fn default() -> Self {
        NodeParams {
            max_con_add: 20,
            max_var_add: 20,
            max_con_buffered: 100,
            max_var_buffered: 100,
            tail_off_n_lp: 5,
            tail_off_percent: 0.01,
            branching_strategy: BranchingStrategy::CloseHalf,
            n_branching_candidates: 1,
            max_level: 1_000,
            max_iterations: 0,
            skipping_mode: SkippingMode::SkipByNode,
            skip_factor: 1,
            pricing_freq: 1,
            db_threshold: 1e30,
            con_elim_mode: ConElimMode::None,
            var_elim_mode: VarElimMode::None,
            con_elim_age: 1,
            var_elim_age: 1,
            con_elim_eps: 1e-6,
            var_elim_eps: 1e-6,
            eps: 1e-6,
        }
    }
}

/// Outcome of one call to [`Sub::run_iteration`] (§4.7.2).
pub enum IterationOutcome {
    /// Keep iterating this node.
    Continue,
    /// No more cuts or columns this round; branch.
    Branch,
    Fathom(FathomReason),
    /// A new incumbent primal value was found by the feasibility test or a
    /// primal heuristic.
    Feasible(f64),
    /// `hooks.pausing()` fired: push this node back as dormant rather than
    /// continuing to iterate (§4.7.2 step 8).
    Pause,
}

pub struct Sub<S: LpSolver> {
    pub id: SubId,
    pub father: Option<SubId>,
    pub level: u32,
    pub status: SubStatus,
    pub dual_bound: f64,
    sense: OptSense,
    active_cons: Active<NodeConstraint>,
    active_vars: Active<NodeVariable>,
    local_status: Vec<FsVarStat>,
    local_lb: Vec<f64>,
    local_ub: Vec<f64>,
    branch_rule: Option<BranchRule>,
    lp: Option<LpSub<S>>,
    tailing_off: TailingOff,
    solved_once: bool,
    n_dormant_rounds: u32,
    n_iterations: u64,
    con_buffer: CutBuffer<NodeConstraint>,
    var_buffer: CutBuffer<NodeVariable>,
    con_buffer_capacity: usize,
    var_buffer_capacity: usize,
    /// Set when this Sub is promoted to remaining-tree root (§4.7.3,
    /// §4.7.7); consumed once by [`Self::take_fix_cand_snapshot`].
    remaining_root_pending: bool,
    /// Whether the promotion also asked for immediate re-optimization
    /// (`newRootReoptimize`); forces a primal re-solve on the next call.
    reoptimize_pending: bool,
    /// Logical-implication fixings accumulated this round, drained by the
    /// Master into the global fix/set table (§4.7.7).
    pending_log_imp: Vec<(usize, FsVarStat)>,
}

impl<S: LpSolver> Sub<S> {
    pub fn new_root(id: SubId, sense: OptSense, tail_off_n_lp: usize, con_buffer_capacity: usize, var_buffer_capacity: usize) -> Self {
        Sub {
            id,
            father: None,
            level: 0,
            status: SubStatus::Unprocessed,
            dual_bound: sense.worst_dual_bound(),
            sense,
            active_cons: Active::new(),
            active_vars: Active::new(),
            local_status: Vec::new(),
            local_lb: Vec::new(),
            local_ub: Vec::new(),
            branch_rule: None,
            lp: None,
            tailing_off: TailingOff::new(tail_off_n_lp.max(1)),
            solved_once: false,
            n_dormant_rounds: 0,
            n_iterations: 0,
            con_buffer: CutBuffer::new(con_buffer_capacity.max(1)),
            var_buffer: CutBuffer::new(var_buffer_capacity.max(1)),
            con_buffer_capacity: con_buffer_capacity.max(1),
            var_buffer_capacity: var_buffer_capacity.max(1),
            remaining_root_pending: false,
            reoptimize_pending: false,
            pending_log_imp: Vec::new(),
        }
    }

    /// Seeds the root's active sets from the initial constraint and
    /// variable pools (§4.7.1 "Root activation allocates initial active
    /// sets from the configured initial pools").
    pub fn seed_root(
        &mut self,
        cons: impl IntoIterator<Item = PoolSlotRef<NodeConstraint>>,
        vars: impl IntoIterator<Item = PoolSlotRef<NodeVariable>>,
    ) {
        self.active_cons.append_many(cons);
        self.active_vars.append_many(vars);
        self.local_status = vec![FsVarStat::Free; self.active_vars.len()];
        self.local_lb = (0..self.active_vars.len())
            .map(|i| self.active_vars.get(i).unwrap().with(|v| v.lb).unwrap_or(0.0))
            .collect();
        self.local_ub = (0..self.active_vars.len())
            .map(|i| self.active_vars.get(i).unwrap().with(|v| v.ub).unwrap_or(0.0))
            .collect();
    }

    /// Builds a son by copying the father's active sets and local
    /// bookkeeping and applying `rule`. A rule that contradicts an
    /// already-fixed/set variable, or crosses the variable's own bounds,
    /// fathoms the son immediately instead of activating it (§4.7.1).
    pub fn new_son(father: &Sub<S>, id: SubId, rule: BranchRule) -> Self {
        let mut active_cons = Active::new();
        active_cons.append_many(father.active_cons.iter().cloned());
        let mut active_vars = Active::new();
        active_vars.append_many(father.active_vars.iter().cloned());

        let mut son = Sub {
            id,
            father: Some(father.id),
            level: father.level + 1,
            status: SubStatus::Unprocessed,
            dual_bound: father.dual_bound,
            sense: father.sense,
            active_cons,
            active_vars,
            local_status: father.local_status.clone(),
            local_lb: father.local_lb.clone(),
            local_ub: father.local_ub.clone(),
            branch_rule: Some(rule),
            lp: None,
            tailing_off: TailingOff::new(father.tailing_off.capacity()),
            solved_once: false,
            n_dormant_rounds: 0,
            n_iterations: 0,
            con_buffer: CutBuffer::new(father.con_buffer_capacity),
            var_buffer: CutBuffer::new(father.var_buffer_capacity),
            con_buffer_capacity: father.con_buffer_capacity,
            var_buffer_capacity: father.var_buffer_capacity,
            remaining_root_pending: false,
            reoptimize_pending: false,
            pending_log_imp: Vec::new(),
        };

        let var = rule.variable();
        if var >= son.local_status.len() || rule.contradicts(son.local_status[var]) {
            son.fathom(FathomReason::Contradiction);
            return son;
        }
        son.apply_rule(rule);
        if son.local_lb[var] > son.local_ub[var] + 1e-9 {
            son.fathom(FathomReason::Contradiction);
        }
        son
    }

    fn apply_rule(&mut self, rule: BranchRule) {
        match rule {
            BranchRule::SetToLower(v) => self.local_status[v] = FsVarStat::SetToLower,
            BranchRule::SetToUpper(v) => self.local_status[v] = FsVarStat::SetToUpper,
            BranchRule::TightenUpper { var, new_ub } => {
                self.local_ub[var] = self.local_ub[var].min(new_ub);
            }
            BranchRule::TightenLower { var, new_lb } => {
                self.local_lb[var] = self.local_lb[var].max(new_lb);
            }
        }
    }

    /// Removes pool slots that went void while this Sub was dormant.
    /// Missing fixed/set variables are a fatal invariant violation; any
    /// other missing item is simply dropped from the active set (§4.7.1).
    fn prune_void(&mut self) -> Result<()> {
        let void_cons: Vec<usize> = (0..self.active_cons.len())
            .filter(|&i| self.active_cons.get(i).unwrap().with(|_| ()).is_none())
            .collect();
        if !void_cons.is_empty() {
            self.active_cons.remove(&void_cons)?;
        }

        let void_vars: Vec<usize> = (0..self.active_vars.len())
            .filter(|&i| self.active_vars.get(i).unwrap().with(|_| ()).is_none())
            .collect();
        if let Some(&first_fixed) = void_vars.iter().find(|&&i| self.local_status[i].fixed_or_set()) {
            return Err(Error::MissingFixedOrSetItem(first_fixed));
        }
        if !void_vars.is_empty() {
            self.active_vars.remove(&void_vars)?;
            retain_except(&mut self.local_status, &void_vars);
            retain_except(&mut self.local_lb, &void_vars);
            retain_except(&mut self.local_ub, &void_vars);
        }
        Ok(())
    }

    /// Reconciles global fixings that happened while this Sub was
    /// dormant: a global `Fixed` status that disagrees with the local one
    /// makes the Sub infeasible; agreement tightens the local status
    /// in-place (§4.7.1).
    pub fn reconcile_global_fixings(&mut self, global: &[FsVarStat], eps: f64) -> bool {
        for i in 0..self.active_vars.len() {
            if i >= global.len() {
                continue;
            }
            if !global[i].fixed() {
                continue;
            }
            if self.local_status[i].contradiction(&global[i], self.local_lb[i], self.local_ub[i], eps) {
                return false;
            }
            self.local_status[i] = global[i];
        }
        true
    }

    /// Builds the LP view from the current active sets and local statuses
    /// (§4.7.1, §4.6). `eliminate_fixed_set` mirrors the `EliminateFixedSet`
    /// parameter.
    pub fn activate(&mut self, solver: S, eliminate_fixed_set: bool, eps: f64) -> Result<()> {
        self.prune_void()?;

        let n_vars = self.active_vars.len();
        let all_vars: Vec<usize> = (0..n_vars).collect();
        let var_types: Vec<VarType> = (0..n_vars)
            .map(|i| self.active_vars.get(i).unwrap().with(|v| v.var_type).unwrap_or(VarType::Continuous))
            .collect();

        let mut rows = Vec::with_capacity(self.active_cons.len());
        for i in 0..self.active_cons.len() {
            let con = self.active_cons.get(i).unwrap();
            let (sense, rhs, row) = con
                .with_mut(|c| {
                    let row = c.row(&all_vars, eps);
                    c.classify(&row, &var_types);
                    (c.sense, c.rhs, row)
                })
                .expect("pruned void constraints above");
            rows.push(RowSpec { sense, rhs, row });
        }

        let mut cols = Vec::with_capacity(n_vars);
        for i in 0..n_vars {
            let var = self.active_vars.get(i).unwrap();
            let (obj,) = var.with(|v| (v.obj,)).expect("pruned void variables above");
            let lb = self.local_lb[i];
            let ub = self.local_ub[i];
            let elim = if eliminate_fixed_set {
                self.local_status[i].resolve(lb, ub)
            } else {
                None
            };
            cols.push((ColSpec { obj, lb, ub, col: Vec::new() }, elim));
        }

        self.lp = Some(LpSub::new(solver, self.sense, rows, cols, eps)?);
        self.status = SubStatus::Active;
        Ok(())
    }

    pub fn lp(&self) -> Option<&LpSub<S>> {
        self.lp.as_ref()
    }

    fn update_dual_bound(&mut self, lp_value: f64) {
        self.dual_bound = self.sense.best_dual_bound(self.dual_bound, lp_value);
    }

    /// One iteration of the cutting/pricing loop (§4.7.2): apply anything
    /// staged in the cut/column buffers last round, solve, handle
    /// infeasibility, test the bound against the incumbent, test problem
    /// feasibility, separate or price (staging results rather than
    /// applying them immediately), and detect tailing-off.
    #[allow(clippy::too_many_arguments)]
    pub fn run_iteration(
        &mut self,
        hooks: &mut impl ProblemHooks,
        params: &NodeParams,
        primal_bound: Option<f64>,
        con_pool: &mut StandardPool<NodeConstraint>,
        var_pool: &mut StandardPool<NodeVariable>,
    ) -> Result<IterationOutcome> {
        self.apply_buffered_cons(con_pool, params.max_con_add, params.eps)?;
        self.apply_buffered_vars(var_pool, params.max_var_add, params.eps)?;

        self.n_iterations += 1;
        if params.max_iterations > 0 && self.n_iterations > params.max_iterations {
            return Ok(IterationOutcome::Branch);
        }

        let first_solve = !self.solved_once;
        let method = if first_solve && self.level == 0 || self.reoptimize_pending {
            LpMethod::Primal
        } else {
            LpMethod::Dual
        };
        self.reoptimize_pending = false;
        {
            let lp = self.lp.as_mut().ok_or(Error::BadActivation)?;
            lp.optimize(method)?;
        }
        self.solved_once = true;

        if self.lp.as_ref().unwrap().infeasible() {
            let cols = if first_solve {
                hooks.init_make_feas()
            } else {
                let infeas = self.lp.as_ref().unwrap().get_infeas();
                hooks.make_feasible(&infeas)
            };
            if cols.is_empty() {
                return Ok(IterationOutcome::Fathom(FathomReason::Infeasible));
            }
            let added = self.add_vars_from_hooks(cols, var_pool, params.eps)?;
            return Ok(if added > 0 {
                IterationOutcome::Continue
            } else {
                IterationOutcome::Fathom(FathomReason::Infeasible)
            });
        }

        let lp_value = self.lp.as_ref().unwrap().value();
        self.tailing_off.push(lp_value);
        self.update_dual_bound(lp_value);

        if hooks.pausing() {
            return Ok(IterationOutcome::Pause);
        }

        if !self.sense.is_better(params.db_threshold, self.dual_bound) {
            // The dual bound has already reached the caller's target
            // threshold for this node: stop spending cuts/columns on it
            // and branch immediately (`dbThreshold`, §6).
            return Ok(IterationOutcome::Branch);
        }

        if let Some(pb) = primal_bound {
            if !self.sense.is_better(self.dual_bound, pb) {
                let view = self.view();
                self.rescan_var_pool(var_pool, &view.dual, params.eps);
                let priced = hooks.pricing(&view);
                self.stage_priced_columns(priced, var_pool, params.eps);
                if self.var_buffer.is_empty() {
                    return Ok(IterationOutcome::Fathom(FathomReason::BoundLimit));
                }
                self.apply_buffered_vars(var_pool, params.max_var_add, params.eps)?;
                return Ok(IterationOutcome::Continue);
            }
        }

        let view = self.view();
        if let Some(value) = hooks.feasible(&view) {
            return Ok(IterationOutcome::Feasible(value));
        }

        if hooks.exception_fathom() {
            return Ok(IterationOutcome::Fathom(FathomReason::ProblemSpecific));
        }
        if hooks.exception_branch() {
            return Ok(IterationOutcome::Branch);
        }

        self.update_ages_and_eliminate(params)?;

        if self.tailing_off.is_tailing_off(self.sense, params.tail_off_percent) && hooks.tailing_off() {
            self.rescan_var_pool(var_pool, &view.dual, params.eps);
            let priced = hooks.pricing(&view);
            self.stage_priced_columns(priced, var_pool, params.eps);
            if self.var_buffer.is_empty() {
                self.dual_feasible_fixings(hooks, &view);
                return Ok(IterationOutcome::Branch);
            }
            self.apply_buffered_vars(var_pool, params.max_var_add, params.eps)?;
            return Ok(IterationOutcome::Continue);
        }

        if self.should_separate(params) {
            self.rescan_con_pool(con_pool, &view.x, params.eps);
            let found_cuts = hooks.separate(&view);
            self.stage_separated_rows(found_cuts, con_pool);
            if !self.con_buffer.is_empty() {
                self.apply_buffered_cons(con_pool, params.max_con_add, params.eps)?;
                return Ok(IterationOutcome::Continue);
            }
        }

        if self.should_price(params) {
            self.rescan_var_pool(var_pool, &view.dual, params.eps);
            let priced = hooks.pricing(&view);
            self.stage_priced_columns(priced, var_pool, params.eps);
            if !self.var_buffer.is_empty() {
                self.apply_buffered_vars(var_pool, params.max_var_add, params.eps)?;
                return Ok(IterationOutcome::Continue);
            }
        }

        self.dual_feasible_fixings(hooks, &view);
        Ok(IterationOutcome::Branch)
    }

    /// Skip-schedule for separation (§4.7.2 step 9, `skippingMode`/
    /// `skipFactor`): every `skip_factor`-th round (by iteration count or
    /// tree level, per `skipping_mode`) actually calls into `separate`.
    fn should_separate(&self, params: &NodeParams) -> bool {
        let counter = match params.skipping_mode {
            SkippingMode::SkipByNode => self.n_iterations,
            SkippingMode::SkipByLevel => u64::from(self.level),
        };
        params.skip_factor <= 1 || counter % u64::from(params.skip_factor) == 0
    }

    /// Forced pricing frequency (§4.7.2 step 9, `pricingFreq`): pricing is
    /// attempted at most once every `pricing_freq` iterations outside the
    /// dedicated bound-limit/tailing-off pricing rounds.
    fn should_price(&self, params: &NodeParams) -> bool {
        params.pricing_freq <= 1 || self.n_iterations % u64::from(params.pricing_freq) == 0
    }

    fn dual_feasible_fixings(&mut self, hooks: &mut impl ProblemHooks, view: &LpView) {
        for (var, target) in hooks.fix_by_log_imp(view) {
            if var < self.local_status.len() {
                self.local_status[var] = target;
            }
            self.pending_log_imp.push((var, target));
        }
    }

    /// Drains the logical-implication fixings accumulated since the last
    /// call, for the Master to propagate into the global fix/set table
    /// (§4.7.7).
    pub fn take_pending_log_imp(&mut self) -> Vec<(usize, FsVarStat)> {
        std::mem::take(&mut self.pending_log_imp)
    }

    /// Marks this Sub as the new remaining-tree root (§4.7.3, §4.9):
    /// arranges for its next-completed LP solve to be snapshotted into
    /// `FixCand`, and optionally forces an immediate primal re-optimize.
    pub fn mark_remaining_root(&mut self, reoptimize: bool) {
        self.remaining_root_pending = true;
        self.reoptimize_pending = reoptimize;
    }

    /// If this Sub was marked remaining-tree root and has a solved LP,
    /// returns the `(lp_value, candidates)` snapshot for `FixCand::new_root`
    /// and clears the pending flag. `None` otherwise (§4.7.7).
    pub fn take_fix_cand_snapshot(&mut self) -> Option<(f64, Vec<(usize, LpVarStat, f64)>)> {
        if !self.remaining_root_pending {
            return None;
        }
        let lp = self.lp.as_ref()?;
        self.remaining_root_pending = false;
        let candidates = (0..self.active_vars.len())
            .map(|i| (i, lp.lp_var_stat(i), lp.reco(i)))
            .collect();
        Some((lp.value(), candidates))
    }

    fn view(&self) -> LpView {
        let lp = self.lp.as_ref().expect("LP must be active to build a view");
        let n = lp.n_col();
        let m = lp.n_row();
        LpView {
            x: (0..n).map(|i| lp.x_val(i)).collect(),
            reduced_cost: (0..n).map(|i| lp.reco(i)).collect(),
            dual: (0..m).map(|i| lp.y_val(i)).collect(),
            lp_value: lp.value(),
        }
    }

    fn add_vars_from_hooks(
        &mut self,
        cols: Vec<ColSpec>,
        var_pool: &mut StandardPool<NodeVariable>,
        eps: f64,
    ) -> Result<usize> {
        let n = cols.len();
        let entries = cols.into_iter().map(|c| (c, VarType::Continuous, FsVarStat::Free));
        self.append_new_vars(entries, var_pool, eps)?;
        Ok(n)
    }

    /// Stages freshly separated rows into the real constraint pool and the
    /// round's `CutBuffer`, rather than activating them immediately: the
    /// next [`Self::run_iteration`] call decides which survive via
    /// [`CutBuffer::extract`]'s rank-sort-and-cap (§4.4, §4.7.2).
    fn stage_separated_rows(&mut self, found: Vec<(RowSpec, Option<f64>)>, pool: &mut StandardPool<NodeConstraint>) {
        for (row, rank) in found {
            let core = ConVarCore::new(Some(self.id), true, true);
            let generator = SparseRow(row.row);
            let con = bc_model::Constraint::new(core, row.sense, row.rhs, true, generator);
            let Some(handle) = pool.insert(con) else {
                continue; // pool full this round; drop the candidate.
            };
            let slot_ref = PoolSlotRef::new(handle);
            let _ = self.con_buffer.insert(slot_ref, false, rank);
        }
    }

    /// Stages freshly priced columns into the real variable pool and the
    /// round's `CutBuffer`, the column counterpart of
    /// [`Self::stage_separated_rows`].
    fn stage_priced_columns(
        &mut self,
        priced: Vec<(ColSpec, VarType, Option<f64>, Option<f64>)>,
        pool: &mut StandardPool<NodeVariable>,
        _eps: f64,
    ) {
        for (col, var_type, rank, elim) in priced {
            let core = ConVarCore::new(Some(self.id), true, true);
            let generator = SparseCol(col.col);
            let mut var = bc_model::Variable::new(core, var_type, col.obj, col.lb, col.ub, generator);
            var.global_status = elim.map_or(FsVarStat::Free, FsVarStat::Set);
            let Some(handle) = pool.insert(var) else {
                continue;
            };
            let slot_ref = PoolSlotRef::new(handle);
            let _ = self.var_buffer.insert(slot_ref, false, rank);
        }
    }

    /// Pulls the top-ranked winners out of the constraint buffer (an
    /// implicit no-op if it's empty) and activates them against the LP
    /// (§4.4 "extract", §4.7.2).
    fn apply_buffered_cons(&mut self, pool: &mut StandardPool<NodeConstraint>, max_add: usize, eps: f64) -> Result<()> {
        if self.con_buffer.is_empty() {
            return Ok(());
        }
        let winners = self.con_buffer.extract(max_add.max(1), pool);
        if winners.is_empty() {
            return Ok(());
        }
        let all_vars: Vec<usize> = (0..self.active_vars.len()).collect();
        let rows: Vec<RowSpec> = winners
            .iter()
            .map(|r| {
                r.with_mut(|c| {
                    let row = c.row(&all_vars, eps);
                    RowSpec { sense: c.sense, rhs: c.rhs, row }
                })
                .expect("buffered winner must still be valid: extract only returns live refs")
            })
            .collect();
        self.lp.as_mut().ok_or(Error::BadActivation)?.add_cons(rows)?;
        self.active_cons.append_many(winners);
        Ok(())
    }

    /// Pulls the top-ranked winners out of the variable buffer and
    /// activates them against the LP, the column counterpart of
    /// [`Self::apply_buffered_cons`].
    fn apply_buffered_vars(&mut self, pool: &mut StandardPool<NodeVariable>, max_add: usize, eps: f64) -> Result<()> {
        if self.var_buffer.is_empty() {
            return Ok(());
        }
        let winners = self.var_buffer.extract(max_add.max(1), pool);
        if winners.is_empty() {
            return Ok(());
        }
        let all_cons: Vec<usize> = (0..self.active_cons.len()).collect();
        let mut prepared = Vec::with_capacity(winners.len());
        for r in &winners {
            let (col_spec, elim, target) = r
                .with_mut(|v| {
                    let col = v.column(&all_cons, eps);
                    let elim = v.global_status.resolve(v.lb, v.ub);
                    (ColSpec { obj: v.obj, lb: v.lb, ub: v.ub, col }, elim, v.global_status)
                })
                .expect("buffered winner must still be valid: extract only returns live refs");
            prepared.push((col_spec, elim, target));
        }
        let lp_cols: Vec<(ColSpec, Option<f64>)> = prepared.iter().map(|(c, elim, _)| (c.clone(), *elim)).collect();
        self.lp.as_mut().ok_or(Error::BadActivation)?.add_vars(lp_cols)?;
        self.active_vars.append_many(winners);
        for (_, _, target) in prepared {
            self.local_status.push(target);
        }
        let start = self.local_lb.len();
        for i in start..self.active_vars.len() {
            let (lb, ub) = self.active_vars.get(i).unwrap().with(|v| (v.lb, v.ub)).unwrap();
            self.local_lb.push(lb);
            self.local_ub.push(ub);
        }
        Ok(())
    }

    /// Feasibility-restoration columns from `hooks.init_make_feas`/
    /// `make_feasible` are inserted into the real `var_pool` like any other
    /// dynamically generated column (§4.4), falling back to a standalone
    /// slot only if the pool is already at capacity.
    fn append_new_vars(
        &mut self,
        entries: impl IntoIterator<Item = (ColSpec, VarType, FsVarStat)>,
        var_pool: &mut StandardPool<NodeVariable>,
        eps: f64,
    ) -> Result<()> {
        let entries: Vec<(ColSpec, VarType, FsVarStat)> = entries.into_iter().collect();
        if entries.is_empty() {
            return Ok(());
        }
        let lp_cols: Vec<(ColSpec, Option<f64>)> = entries
            .iter()
            .map(|(c, _, target)| (c.clone(), target.resolve(c.lb, c.ub)))
            .collect();
        let assigned = self.lp.as_mut().ok_or(Error::BadActivation)?.add_vars(lp_cols)?;

        for ((col, var_type, target), _orig_idx) in entries.into_iter().zip(assigned) {
            let core = ConVarCore::new(Some(self.id), true, true);
            let mut var = bc_model::Variable::new(core, var_type, col.obj, col.lb, col.ub, SparseCol(col.col.clone()));
            var.global_status = target;
            let handle = match var_pool.insert(var) {
                Some(handle) => handle,
                None => {
                    let core = ConVarCore::new(Some(self.id), true, true);
                    let mut var = bc_model::Variable::new(core, var_type, col.obj, col.lb, col.ub, SparseCol(col.col));
                    var.global_status = target;
                    let standalone = bc_pool::PoolSlot::standalone();
                    standalone.borrow_mut().insert(var);
                    standalone
                }
            };
            let slot_ref = PoolSlotRef::new(handle);
            self.active_vars.append_one(slot_ref);
            self.local_status.push(target);
            self.local_lb.push(col.lb);
            self.local_ub.push(col.ub);
        }
        let _ = eps;
        Ok(())
    }

    /// Bulk-rescans the real constraint pool for violated, currently
    /// inactive rows and stages matches into the constraint buffer (§4.4
    /// "separate" over the pool, as opposed to a problem hook).
    fn rescan_con_pool(&mut self, pool: &StandardPool<NodeConstraint>, x: &[f64], eps: f64) {
        let n = x.len();
        bc_pool::separate(pool, &mut self.con_buffer, |con| {
            if con.core().active() {
                return None;
            }
            let lhs: f64 = (0..n).map(|j| con.generator().coefficient(j) * x[j]).sum();
            let slack = con.rhs - lhs;
            con.sense.violated(slack, eps).then_some(Some(slack.abs()))
        });
    }

    /// Bulk-rescans the real variable pool for attractively-priced,
    /// currently inactive columns, the column counterpart of
    /// [`Self::rescan_con_pool`].
    fn rescan_var_pool(&mut self, pool: &StandardPool<NodeVariable>, y: &[f64], eps: f64) {
        let sense = self.sense;
        let m = y.len();
        bc_pool::separate(pool, &mut self.var_buffer, |var| {
            if var.core().active() {
                return None;
            }
            let rc = var.obj - (0..m).map(|i| y[i] * var.generator().coefficient(i)).sum::<f64>();
            sense.reduced_cost_violated(rc, eps).then_some(Some(rc.abs()))
        });
    }

    /// Ages every active row/column by whether it looked redundant this
    /// round, and removes (from both the active set and the live LP) any
    /// item whose age has crossed the configured elimination threshold
    /// (§4.7.2 step 9, `conElimMode`/`varElimMode`).
    fn update_ages_and_eliminate(&mut self, params: &NodeParams) -> Result<()> {
        let n_cons = self.active_cons.len();
        let mut con_elim = Vec::new();
        for i in 0..n_cons {
            let lp = self.lp.as_ref().ok_or(Error::BadActivation)?;
            let redundant = match params.con_elim_mode {
                ConElimMode::None => false,
                ConElimMode::NonBinding => lp.slack(i).abs() > params.con_elim_eps,
                ConElimMode::Basic => matches!(lp.slack_stat(i), SlackStat::Basic),
            };
            if redundant {
                self.active_cons.bump_age(i);
            } else {
                self.active_cons.reset_age(i);
            }
            if params.con_elim_mode != ConElimMode::None && self.active_cons.redundant_age(i) > params.con_elim_age {
                con_elim.push(i);
            }
        }

        let n_vars = self.active_vars.len();
        let mut var_elim = Vec::new();
        for i in 0..n_vars {
            let lp = self.lp.as_ref().ok_or(Error::BadActivation)?;
            if lp.is_eliminated(i) {
                self.active_vars.reset_age(i);
                continue;
            }
            let unattractive = match params.var_elim_mode {
                VarElimMode::None => false,
                VarElimMode::ReducedCost => {
                    let stat = lp.lp_var_stat(i);
                    matches!(stat, LpVarStat::NonBasicLower | LpVarStat::NonBasicUpper)
                        && !self.sense.reduced_cost_violated(lp.reco(i), params.var_elim_eps)
                }
            };
            if unattractive {
                self.active_vars.bump_age(i);
            } else {
                self.active_vars.reset_age(i);
            }
            if params.var_elim_mode != VarElimMode::None && self.active_vars.redundant_age(i) > params.var_elim_age {
                var_elim.push(i);
            }
        }

        if !con_elim.is_empty() {
            self.active_cons.remove(&con_elim)?;
            self.lp.as_mut().unwrap().remove_cons(&con_elim)?;
        }
        if !var_elim.is_empty() {
            self.active_vars.remove(&var_elim)?;
            self.lp.as_mut().unwrap().remove_vars(&var_elim)?;
            retain_except(&mut self.local_status, &var_elim);
            retain_except(&mut self.local_lb, &var_elim);
            retain_except(&mut self.local_ub, &var_elim);
        }
        Ok(())
    }

    /// Deactivates every active item (decrementing `nActive`) and marks
    /// the node fathomed, freeing the per-iteration LP state (§4.7.3).
    pub fn fathom(&mut self, reason: FathomReason) {
        for i in 0..self.active_vars.len() {
            self.active_vars.get(i).unwrap().with_mut(|v| v.core_mut().dec_active());
        }
        for i in 0..self.active_cons.len() {
            self.active_cons.get(i).unwrap().with_mut(|c| c.core_mut().dec_active());
        }
        self.lp = None;
        self.status = SubStatus::Fathomed(reason);
    }

    /// Picks the best branching candidate and returns the pair of rules
    /// it induces, ranked close-to-half (optionally objective-weighted);
    /// empty if nothing in the active set can still be branched on
    /// (§4.7.4).
    pub fn generate_branch_rules(&self, params: &NodeParams) -> Vec<BranchRule> {
        let lp = match &self.lp {
            Some(lp) => lp,
            None => return Vec::new(),
        };
        let infos: Vec<BranchCandidateInfo> = (0..self.active_vars.len())
            .map(|i| {
                let var = self.active_vars.get(i).unwrap();
                let (var_type, obj) = var.with(|v| (v.var_type, v.obj)).unwrap_or((VarType::Continuous, 0.0));
                BranchCandidateInfo {
                    var_type,
                    status: self.local_status[i],
                    x: lp.x_val(i),
                    obj,
                }
            })
            .collect();

        let candidates = select_candidates(&infos, params.branching_strategy, params.n_branching_candidates, params.eps);
        let best = match candidates.first() {
            Some(&i) => i,
            None => return Vec::new(),
        };
        let (lo, hi) = rule_pair(best, infos[best].var_type, infos[best].x, params.eps);
        vec![lo, hi]
    }

    pub fn bump_dormant(&mut self) {
        self.n_dormant_rounds += 1;
        self.status = SubStatus::Dormant;
    }

    pub fn dormant_rounds(&self) -> u32 {
        self.n_dormant_rounds
    }
}

fn retain_except<T>(v: &mut Vec<T>, drop_sorted: &[usize]) {
    let drop: std::collections::HashSet<usize> = drop_sorted.iter().copied().collect();
    let mut i = 0;
    v.retain(|_| {
        let keep = !drop.contains(&i);
        i += 1;
        keep
    });
}
