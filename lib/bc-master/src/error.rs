//! Error type for the Master's coordination layer (§7 "algorithmic
//! failures" and "user errors"). Lower crates propagate `thiserror` enums
//! through `?`; at this boundary we switch to `error_stack::Report`,
//! matching how `lib/orchestrator` wraps `execution`/`stateful` errors.

use std::fmt;

pub type Result<T, E = MasterError> = error_stack::Result<T, E>;

#[derive(Debug)]
pub enum MasterError {
    /// A Sub the Master expected to still be tracked is missing from the
    /// arena (an invariant violation, not a user error).
    MissingSub(bc_model::SubId),
    /// Root activation or a son's `activate` failed.
    Activation,
    /// The configured LP backend rejected a structural edit.
    Lp,
    Unique(&'static str),
    UniqueOwned(Box<str>),
}

impl fmt::Display for MasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MasterError::MissingSub(id) => write!(f, "subproblem {id:?} is not in the arena"),
            MasterError::Activation => f.write_str("subproblem activation failed"),
            MasterError::Lp => f.write_str("LP backend rejected a structural edit"),
            MasterError::Unique(s) => f.write_str(s),
            MasterError::UniqueOwned(s) => f.write_str(s),
        }
    }
}

impl std::error::Error for MasterError {}

impl From<&'static str> for MasterError {
    fn from(s: &'static str) -> Self {
        MasterError::Unique(s)
    }
}

impl From<String> for MasterError {
    fn from(s: String) -> Self {
        MasterError::UniqueOwned(s.into_boxed_str())
    }
}
