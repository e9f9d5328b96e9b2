use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("cut buffer is full")]
    BufferFull,

    #[error("pool has no free slot available")]
    PoolFull,

    #[error("remove indices must be strictly increasing")]
    IndicesNotIncreasing,

    #[error("Active::realloc: shrinking is never silent (requested {requested}, have {current})")]
    ShrinkNotAllowed { requested: usize, current: usize },

    #[error("missing active item was fixed or set: local index {0}")]
    MissingFixedOrSetItem(usize),
}
