//! Recognized parameters (§6 "Parameters"), collected into one flat
//! struct the way `ExperimentConfig` collects `hash_engine`'s CLI/config
//! surface. Behind the `clap` feature every field also derives a CLI flag
//! so `bc-cli` can expose the whole struct without redeclaring it; behind
//! `serde` the same struct reads back from a `.par`-style TOML file.

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ArgEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumerationStrategy {
    BestFirst,
    BreadthFirst,
    DepthFirst,
    DiveAndBest,
}

impl Default for EnumerationStrategy {
    fn default() -> Self {
        EnumerationStrategy::BestFirst
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ArgEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PbMode {
    NoPrimalBound,
    Optimum,
    OptimumOne,
}

impl Default for PbMode {
    fn default() -> Self {
        PbMode::NoPrimalBound
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ArgEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkippingMode {
    SkipByNode,
    SkipByLevel,
}

impl Default for SkippingMode {
    fn default() -> Self {
        SkippingMode::SkipByNode
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ArgEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConElimMode {
    None,
    NonBinding,
    Basic,
}

impl Default for ConElimMode {
    fn default() -> Self {
        ConElimMode::None
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ArgEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarElimMode {
    None,
    ReducedCost,
}

impl Default for VarElimMode {
    fn default() -> Self {
        VarElimMode::None
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "clap", derive(clap::ArgEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbcLogMode {
    None,
    File,
    Pipe,
}

impl Default for VbcLogMode {
    fn default() -> Self {
        VbcLogMode::None
    }
}

/// The full recognized parameter surface (§6). Grouped in field-declaration
/// order by the same headings the spec uses.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[cfg_attr(feature = "clap", derive(clap::Args))]
#[derive(Debug, Clone)]
pub struct Parameters {
    // Enumeration
    #[cfg_attr(feature = "clap", clap(long, default_value = "best-first", arg_enum))]
    pub enumeration_strategy: EnumerationStrategy,

    // Branching
    #[cfg_attr(feature = "clap", clap(long, default_value = "close-half", arg_enum))]
    pub branching_strategy: bc_node::BranchingStrategy,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1"))]
    pub n_branching_variable_candidates: usize,
    #[cfg_attr(feature = "clap", clap(long, default_value = "0"))]
    pub n_strong_branching_iterations: u32,

    // Primal bound init
    #[cfg_attr(feature = "clap", clap(long, default_value = "no-primal-bound", arg_enum))]
    pub pb_mode: PbMode,
    #[cfg_attr(feature = "clap", clap(long))]
    pub optimum_file_name: Option<String>,

    // Cutting/pricing schedule
    #[cfg_attr(feature = "clap", clap(long, default_value = "skip-by-node", arg_enum))]
    pub skipping_mode: SkippingMode,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1"))]
    pub skip_factor: u32,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1"))]
    pub pricing_freq: u32,

    // Elimination
    #[cfg_attr(feature = "clap", clap(long, default_value = "none", arg_enum))]
    pub con_elim_mode: ConElimMode,
    #[cfg_attr(feature = "clap", clap(long, default_value = "none", arg_enum))]
    pub var_elim_mode: VarElimMode,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1e-6"))]
    pub con_elim_eps: f64,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1e-6"))]
    pub var_elim_eps: f64,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1"))]
    pub con_elim_age: u32,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1"))]
    pub var_elim_age: u32,

    // Tailing off
    #[cfg_attr(feature = "clap", clap(long, default_value = "5"))]
    pub tail_off_n_lp: usize,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1.0"))]
    pub tail_off_percent: f64,

    // Other
    #[cfg_attr(feature = "clap", clap(long, default_value = "1000"))]
    pub max_level: u32,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1e30"))]
    pub max_cpu_time: f64,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1e30"))]
    pub max_cow_time: f64,
    #[cfg_attr(feature = "clap", clap(long, default_value = "0"))]
    pub max_iterations: u64,
    #[cfg_attr(feature = "clap", clap(long, default_value = "20"))]
    pub max_con_add: usize,
    #[cfg_attr(feature = "clap", clap(long, default_value = "100"))]
    pub max_con_buffered: usize,
    #[cfg_attr(feature = "clap", clap(long, default_value = "20"))]
    pub max_var_add: usize,
    #[cfg_attr(feature = "clap", clap(long, default_value = "100"))]
    pub max_var_buffered: usize,
    #[cfg_attr(feature = "clap", clap(long, default_value = "0.0"))]
    pub required_guarantee: f64,
    #[cfg_attr(feature = "clap", clap(long))]
    pub obj_integer: bool,
    #[cfg_attr(feature = "clap", clap(long))]
    pub eliminate_fixed_set: bool,
    #[cfg_attr(feature = "clap", clap(long))]
    pub new_root_reoptimize: bool,
    #[cfg_attr(feature = "clap", clap(long))]
    pub fix_set_by_red_cost: bool,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1e30"))]
    pub db_threshold: f64,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1"))]
    pub min_dormant_rounds: u32,
    #[cfg_attr(feature = "clap", clap(long))]
    pub show_average_cut_distance: bool,
    #[cfg_attr(feature = "clap", clap(long, default_value = "1e-6"))]
    pub eps: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            enumeration_strategy: EnumerationStrategy::default(),
            branching_strategy: bc_node::BranchingStrategy::CloseHalf,
            n_branching_variable_candidates: 1,
            n_strong_branching_iterations: 0,
            pb_mode: PbMode::default(),
            optimum_file_name: None,
            skipping_mode: SkippingMode::default(),
            skip_factor: 1,
            pricing_freq: 1,
            con_elim_mode: ConElimMode::default(),
            var_elim_mode: VarElimMode::default(),
            con_elim_eps: 1e-6,
            var_elim_eps: 1e-6,
            con_elim_age: 1,
            var_elim_age: 1,
            tail_off_n_lp: 5,
            tail_off_percent: 1.0,
            max_level: 1_000,
            max_cpu_time: 1e30,
            max_cow_time: 1e30,
            max_iterations: 0,
            max_con_add: 20,
            max_con_buffered: 100,
            max_var_add: 20,
            max_var_buffered: 100,
            required_guarantee: 0.0,
            obj_integer: false,
            eliminate_fixed_set: false,
            new_root_reoptimize: false,
            fix_set_by_red_cost: false,
            db_threshold: 1e30,
            min_dormant_rounds: 1,
            show_average_cut_distance: false,
            eps: 1e-6,
        }
    }
}

impl Parameters {
    pub fn node_params(&self) -> bc_node::NodeParams {
        bc_node::NodeParams {
            max_con_add: self.max_con_add,
            max_var_add: self.max_var_add,
            max_con_buffered: self.max_con_buffered,
            max_var_buffered: self.max_var_buffered,
            tail_off_n_lp: self.tail_off_n_lp,
            tail_off_percent: self.tail_off_percent,
            branching_strategy: self.branching_strategy,
            n_branching_candidates: self.n_branching_variable_candidates,
            max_level: self.max_level,
            max_iterations: self.max_iterations,
            skipping_mode: self.skipping_mode.into(),
            skip_factor: self.skip_factor,
            pricing_freq: self.pricing_freq,
            db_threshold: self.db_threshold,
            con_elim_mode: self.con_elim_mode.into(),
            var_elim_mode: self.var_elim_mode.into(),
            con_elim_age: self.con_elim_age,
            var_elim_age: self.var_elim_age,
            con_elim_eps: self.con_elim_eps,
            var_elim_eps: self.var_elim_eps,
            eps: self.eps,
        }
    }
}

impl From<SkippingMode> for bc_node::SkippingMode {
    fn from(mode: SkippingMode) -> Self {
        match mode {
            SkippingMode::SkipByNode => bc_node::SkippingMode::SkipByNode,
            SkippingMode::SkipByLevel => bc_node::SkippingMode::SkipByLevel,
        }
    }
}

impl From<ConElimMode> for bc_node::ConElimMode {
    fn from(mode: ConElimMode) -> Self {
        match mode {
            ConElimMode::None => bc_node::ConElimMode::None,
            ConElimMode::NonBinding => bc_node::ConElimMode::NonBinding,
            ConElimMode::Basic => bc_node::ConElimMode::Basic,
        }
    }
}

impl From<VarElimMode> for bc_node::VarElimMode {
    fn from(mode: VarElimMode) -> Self {
        match mode {
            VarElimMode::None => bc_node::VarElimMode::None,
            VarElimMode::ReducedCost => bc_node::VarElimMode::ReducedCost,
        }
    }
}
