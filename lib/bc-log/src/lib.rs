//! Logging and tree-visualization support for the branch-and-cut engine:
//! a `tracing`/`tracing-subscriber` setup ([`logging`]) and a VBC-format
//! tree-log writer ([`vbc`]).

mod error;
pub mod logging;
pub mod vbc;

pub use error::{Error, Result};
pub use logging::{init_logger, LogFormat, LogGuard, LogLevel, OutputLocation};
pub use vbc::{VbcColor, VbcLog, VbcSink};
