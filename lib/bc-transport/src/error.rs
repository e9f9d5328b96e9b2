//! Error type for the transport layer, in the same shape as the teacher's
//! `nano` crate: an `ErrorKind` enum plus an `error_stack::Result` alias so
//! call sites can `.attach_printable(...)`/`.change_context(...)`.

use core::fmt;

pub type Result<T, E = ErrorKind> = error_stack::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    WorkerCreation,
    CoordinatorCreation,
    Send,
    Receive,
    Serialize,
    Deserialize,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::WorkerCreation => "could not create subproblem worker",
            ErrorKind::CoordinatorCreation => "could not create coordinator",
            ErrorKind::Send => "could not send message",
            ErrorKind::Receive => "could not receive message",
            ErrorKind::Serialize => "could not serialize message",
            ErrorKind::Deserialize => "could not deserialize message",
        };
        f.write_str(s)
    }
}

impl std::error::Error for ErrorKind {}
