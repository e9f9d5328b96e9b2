//! Master-program layer of the branch-and-cut core: parameters, the
//! open-subproblem queue, reduced-cost fixing candidates, timers,
//! termination status and the `Master` optimization loop itself (§4.8,
//! §4.9, §4.10, §6).

mod error;
pub mod fixcand;
pub mod master;
pub mod opensub;
pub mod params;
pub mod termination;
pub mod timers;

pub use error::{MasterError, Result};
pub use fixcand::FixCand;
pub use master::{Master, Statistics};
pub use opensub::{OpenEntry, OpenSub};
pub use params::{
    ConElimMode, EnumerationStrategy, Parameters, PbMode, SkippingMode, VarElimMode, VbcLogMode,
};
pub use termination::Status;
pub use timers::Timers;
