//! LP backend interface and the `LPSub` elimination/mapping view over it
//! (§4.6, §6).

mod error;
pub mod lpsub;
pub mod refsolver;
pub mod solver;

pub use error::{Error, Result};
pub use lpsub::LpSub;
pub use refsolver::DenseSimplex;
pub use solver::{ColSpec, Infeasibility, LpMethod, LpSolver, RowSpec};
