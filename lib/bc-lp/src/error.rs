use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("LP backend reported it is not optimal; call optimize() first")]
    NotOptimal,

    #[error("bound change on eliminated variable {0}")]
    BoundChangeOnEliminated(usize),

    #[error("void-lhs row {0} is infeasible against its own rhs")]
    VoidLhsInfeasible(usize),

    #[error("LP backend error: {0}")]
    Backend(String),
}
