use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("branch rule refers to an eliminated or already-set variable: {0}")]
    Contradiction(usize),

    #[error(transparent)]
    Pool(#[from] bc_pool::Error),

    #[error(transparent)]
    Lp(#[from] bc_lp::Error),

    #[error(transparent)]
    Model(#[from] bc_model::Error),

    #[error("activation of a node that is not Dormant or Unprocessed")]
    BadActivation,

    #[error("missing fixed-or-set pool item went void: local index {0}")]
    MissingFixedOrSetItem(usize),
}
