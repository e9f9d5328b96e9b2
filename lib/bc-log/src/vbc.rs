//! VBC tree-log writer (§6 "Tree-log format"): a line-based stream of
//! `(timestamp?, node-id, father-id, color, lb, ub)` records consumed by
//! the VBCTOOL branch-and-bound visualizer ABACUS itself targets.

use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VbcColor {
    /// Unprocessed.
    White,
    /// Active.
    Yellow,
    /// Processed (fathomed by bound, integral, or otherwise closed cleanly).
    Blue,
    /// Fathomed (infeasible or contradiction).
    Red,
}

impl VbcColor {
    fn code(self) -> &'static str {
        match self {
            VbcColor::White => "white",
            VbcColor::Yellow => "yellow",
            VbcColor::Blue => "blue",
            VbcColor::Red => "red",
        }
    }
}

/// Where tree-log lines are written. `Pipe` prefixes every line with `$`
/// and writes to stdout, matching ABACUS's `VbcLog = Pipe` mode for piping
/// live into a running VBCTOOL instance; `File` buffers lines to disk.
pub enum VbcSink {
    None,
    File(BufWriter<File>),
    Pipe,
}

impl VbcSink {
    pub fn file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(VbcSink::File(BufWriter::new(File::create(path)?)))
    }
}

pub struct VbcLog {
    sink: VbcSink,
}

impl VbcLog {
    pub fn new(sink: VbcSink) -> Self {
        VbcLog { sink }
    }

    pub fn disabled() -> Self {
        VbcLog { sink: VbcSink::None }
    }

    /// Records one node transition. `timestamp` is seconds since the
    /// search started; `None` omits the field, matching the format's
    /// optional leading component.
    pub fn record(
        &mut self,
        timestamp: Option<f64>,
        node: u64,
        father: u64,
        color: VbcColor,
        lb: f64,
        ub: f64,
    ) -> io::Result<()> {
        let line = match timestamp {
            Some(t) => format!("{t:.3} {node} {father} {} {lb} {ub}", color.code()),
            None => format!("{node} {father} {} {lb} {ub}", color.code()),
        };
        match &mut self.sink {
            VbcSink::None => Ok(()),
            VbcSink::File(w) => writeln!(w, "{line}"),
            VbcSink::Pipe => {
                println!("${line}");
                Ok(())
            }
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            VbcSink::File(w) => w.flush(),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_sink_drops_records_silently() {
        let mut log = VbcLog::disabled();
        assert!(log.record(None, 1, 0, VbcColor::White, 0.0, 10.0).is_ok());
    }
}
