//! Demo driver for the branch-and-cut engine (SPEC_FULL.md §8 scenarios
//! S1-S6): solves a bundled 0/1 knapsack instance end to end, wiring
//! `bc_master::Master` against `bc_lp::DenseSimplex` and a minimal
//! `ProblemHooks` implementation.
//!
//! CLI surface grounded on `lib/orchestrator`'s `ExperimentConfig`: one
//! flattened `clap::Args` struct per concern (solver parameters, logging),
//! `error_stack::Report` at the command boundary.

use std::{fmt, path::PathBuf};

use bc_log::{LogFormat, LogLevel, OutputLocation};
use bc_lp::DenseSimplex;
use bc_master::{Master, Parameters};
use bc_model::{ConVarCore, OptSense, Sense, VarType};
use bc_node::{LpView, NodeConstraint, NodeVariable, ProblemHooks, SparseCol, SparseRow};
use clap::Parser;
use error_stack::{IntoReport, ResultExt};

#[derive(Debug)]
enum CliError {
    LoggerInit,
    VbcLog,
    BadItem(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggerInit => f.write_str("could not install the tracing subscriber"),
            CliError::VbcLog => f.write_str("could not open the VBC tree-log file"),
            CliError::BadItem(raw) => write!(f, "malformed --item \"{raw}\", expected WEIGHT:VALUE"),
        }
    }
}

impl std::error::Error for CliError {}

#[derive(clap::Args, Debug)]
struct LoggingArgs {
    #[clap(long, default_value = "pretty", arg_enum)]
    log_format: LogFormat,
    #[clap(long, arg_enum)]
    log_level: Option<LogLevel>,
    #[clap(long, default_value = "stderr")]
    output_location: OutputLocation,
}

/// 0/1 knapsack demo instance and the branch-and-cut parameters to solve it
/// with.
#[derive(clap::Parser, Debug)]
#[clap(about = "Branch-and-cut demo: solves a bundled 0/1 knapsack instance")]
struct Cli {
    #[clap(flatten)]
    logging: LoggingArgs,

    #[clap(flatten)]
    params: Parameters,

    /// Knapsack capacity.
    #[clap(long, default_value = "15")]
    capacity: f64,

    /// One knapsack item as "weight:value"; repeatable. Defaults to a
    /// small bundled instance when omitted.
    #[clap(long = "item", multiple_occurrences = true)]
    items: Vec<String>,

    /// Write a VBC-format tree log to this path.
    #[clap(long)]
    vbc_log: Option<PathBuf>,
}

fn default_items() -> Vec<(f64, f64)> {
    vec![(2.0, 3.0), (3.0, 4.0), (4.0, 5.0), (5.0, 6.0), (9.0, 10.0)]
}

fn parse_items(raw: &[String]) -> error_stack::Result<Vec<(f64, f64)>, CliError> {
    if raw.is_empty() {
        return Ok(default_items());
    }
    raw.iter()
        .map(|entry| {
            let (w, v) = entry
                .split_once(':')
                .ok_or_else(|| CliError::BadItem(entry.clone()))
                .into_report()?;
            let weight: f64 = w
                .trim()
                .parse()
                .map_err(|_| CliError::BadItem(entry.clone()))
                .into_report()?;
            let value: f64 = v
                .trim()
                .parse()
                .map_err(|_| CliError::BadItem(entry.clone()))
                .into_report()?;
            Ok((weight, value))
        })
        .collect()
}

/// Tests the LP relaxation's own solution for integrality: a knapsack
/// instance has no separation or pricing, so branching alone drives every
/// variable to 0/1 and this is the only hook the demo needs (§4.7.6).
struct KnapsackHooks {
    eps: f64,
}

impl ProblemHooks for KnapsackHooks {
    fn feasible(&mut self, view: &LpView) -> Option<f64> {
        let integral = view
            .x
            .iter()
            .all(|&x| x < self.eps || x > 1.0 - self.eps);
        integral.then_some(view.lp_value)
    }
}

fn build_model(items: &[(f64, f64)], capacity: f64) -> (Vec<NodeConstraint>, Vec<NodeVariable>) {
    let row_generator = SparseRow(items.iter().enumerate().map(|(j, &(w, _))| (j, w)).collect());
    let capacity_row = bc_model::Constraint::new(
        ConVarCore::new(None, false, false),
        Sense::Less,
        capacity,
        true,
        row_generator,
    );

    let vars = items
        .iter()
        .map(|&(w, v)| {
            let col_generator = SparseCol(vec![(0, w)]);
            bc_model::Variable::new(ConVarCore::new(None, false, false), VarType::Binary, v, 0.0, 1.0, col_generator)
        })
        .collect();

    (vec![capacity_row], vars)
}

fn run(cli: Cli) -> error_stack::Result<i32, CliError> {
    let _guard = bc_log::init_logger(cli.logging.log_format, &cli.logging.output_location, cli.logging.log_level)
        .into_report()
        .change_context(CliError::LoggerInit)?;

    let items = parse_items(&cli.items)?;
    tracing::info!(n_items = items.len(), capacity = cli.capacity, "solving knapsack instance");

    let (cons, vars) = build_model(&items, cli.capacity);
    let hooks = KnapsackHooks { eps: cli.params.eps };

    let mut master: Master<DenseSimplex, KnapsackHooks> =
        Master::new(cli.params, OptSense::Maximize, hooks, cons, vars);

    if let Some(path) = &cli.vbc_log {
        let sink = bc_log::VbcSink::file(path).into_report().change_context(CliError::VbcLog)?;
        master.set_vbc_log(bc_log::VbcLog::new(sink));
    }

    let status = master.optimize();
    let stats = master.statistics();

    tracing::info!(
        ?status,
        primal_bound = ?master.primal_bound(),
        dual_bound = master.dual_bound(),
        guarantee = ?master.guarantee(),
        n_subs_processed = stats.n_subs_processed,
        n_subs_fathomed = stats.n_subs_fathomed,
        n_lp_iterations = stats.n_lp_iterations,
        "search finished"
    );

    match master.primal_bound() {
        Some(value) => println!("best value: {value}"),
        None => println!("no feasible solution found"),
    }

    Ok(status.exit_code())
}

fn main() -> error_stack::Result<(), CliError> {
    let cli = Cli::parse();
    let exit_code = run(cli)?;
    std::process::exit(exit_code);
}
