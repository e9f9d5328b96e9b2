//! Optional parallel-mode transport for the branch-and-cut core (spec.md
//! §5): a subproblem server/worker pair over `nng` req/rep sockets, a
//! coordinator-side dispatcher, and a two-phase termination detector. Not
//! wired into the default sequential `bc-master::Master` loop; this crate
//! is a feature-gated scaffold a parallel `Master` variant would build on.

#[cfg(feature = "nng-transport")]
pub mod coordinator;
mod error;
pub mod protocol;
pub mod termination;
pub mod worker;

#[cfg(feature = "nng-transport")]
pub use coordinator::Coordinator;
pub use error::{ErrorKind, Result};
pub use protocol::{PrimalBoundUpdate, SubProblemPayload, SubProblemResult};
pub use termination::TerminationDetector;
#[cfg(feature = "nng-transport")]
pub use worker::NngWorker;
pub use worker::SubproblemChannel;
