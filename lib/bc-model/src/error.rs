use thiserror::Error as ThisError;

/// Convenient alias, which defaults to [`Error`] as the [`Err`]-variant.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error variants returned by this crate.
///
/// These are the model-level invariant violations from the framework's error
/// taxonomy (fatal): they indicate a caller broke a documented contract
/// rather than an ordinary optimization outcome.
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("unknown sense encountered: {0}")]
    UnknownSense(String),

    #[error("changing bounds of eliminated variable {0}")]
    EliminatedVariableBoundChange(usize),

    #[error("double {0} is a no-op on an item that is already {0}")]
    DoubleToggle(&'static str),

    #[error("coefficient lookup for variable not in the active set")]
    VariableNotActive,

    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
