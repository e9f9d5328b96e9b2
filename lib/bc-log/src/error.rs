#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not open VBC log file: {0}")]
    OpenFile(#[from] std::io::Error),
    #[error("tracing subscriber already installed for this process")]
    AlreadyInitialized,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
