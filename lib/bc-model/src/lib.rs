//! Shared data model for the branch-and-cut core: the `ConVar` lifecycle
//! base, `Constraint`/`Variable`, fix/set and basis status types, and the
//! optimization-sense comparisons that thread through the whole engine.
//!
//! This crate has no notion of pools, active sets, or subproblems — those
//! live in `bc-pool` and `bc-node`, which depend on this crate rather than
//! the other way around.

pub mod conclass;
pub mod constraint;
pub mod convar;
mod error;
pub mod fsvarstat;
pub mod lpstatus;
pub mod sense;
pub mod variable;
pub mod vartype;

pub use conclass::ConClass;
pub use constraint::{void_lhs_violated, Constraint, RowGenerator, VoidLhsResult};
pub use convar::{ConVarCore, HasConVarCore, SubId};
pub use error::{Error, Result};
pub use fsvarstat::FsVarStat;
pub use lpstatus::{LpVarStat, SlackStat};
pub use sense::OptSense;
pub use variable::{ColGenerator, Variable};
pub use vartype::{Sense, VarType};
