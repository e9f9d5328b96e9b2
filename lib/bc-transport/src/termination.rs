//! Two-phase termination detection from host 0 (spec.md §5 "optional
//! parallel mode"): phase I asks every host to record whether it is idle
//! (no dispatched Subproblem outstanding and nothing left to dispatch
//! itself); phase II re-asks the same question, and termination is
//! declared only if every host answered idle in both phases with no work
//! received in between. A host that goes busy between phases restarts the
//! detector rather than poisoning the result, mirroring the protocol's own
//! "confirms no host received new work in between" wording.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    One,
    Two,
}

/// Runs on host 0. `n_hosts` includes host 0 itself.
pub struct TerminationDetector {
    n_hosts: usize,
    phase: Phase,
    idle: Vec<bool>,
    /// Set whenever a host reports work arrived since the detector's
    /// current round started; forces a restart at phase I.
    work_seen_this_round: bool,
}

impl TerminationDetector {
    pub fn new(n_hosts: usize) -> Self {
        TerminationDetector {
            n_hosts,
            phase: Phase::One,
            idle: vec![false; n_hosts],
            work_seen_this_round: false,
        }
    }

    /// Host `host` reports its current idle state for this round.
    pub fn report_idle(&mut self, host: usize, idle: bool) {
        if host < self.idle.len() {
            self.idle[host] = idle;
        }
    }

    /// A host received new work after reporting idle in the current round:
    /// invalidates the round in progress.
    pub fn report_work_arrived(&mut self) {
        self.work_seen_this_round = true;
    }

    fn all_idle(&self) -> bool {
        self.idle.iter().all(|&idle| idle)
    }

    /// Advances the detector after every host has reported for the current
    /// phase. Returns `true` once phase II confirms termination; otherwise
    /// resets to phase I (restarting the protocol) and returns `false`.
    pub fn advance(&mut self) -> bool {
        if self.work_seen_this_round || !self.all_idle() {
            self.reset();
            return false;
        }

        match self.phase {
            Phase::One => {
                self.phase = Phase::Two;
                self.idle = vec![false; self.n_hosts];
                self.work_seen_this_round = false;
                false
            }
            Phase::Two => true,
        }
    }

    fn reset(&mut self) {
        self.phase = Phase::One;
        self.idle = vec![false; self.n_hosts];
        self.work_seen_this_round = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminates_only_after_two_consecutive_idle_rounds() {
        let mut d = TerminationDetector::new(3);
        for h in 0..3 {
            d.report_idle(h, true);
        }
        assert!(!d.advance(), "phase I alone must not declare termination");
        for h in 0..3 {
            d.report_idle(h, true);
        }
        assert!(d.advance(), "two consecutive idle rounds must terminate");
    }

    #[test]
    fn one_busy_host_blocks_termination() {
        let mut d = TerminationDetector::new(2);
        d.report_idle(0, true);
        d.report_idle(1, false);
        assert!(!d.advance());
    }

    #[test]
    fn work_arriving_mid_round_restarts_the_protocol() {
        let mut d = TerminationDetector::new(2);
        d.report_idle(0, true);
        d.report_idle(1, true);
        assert!(!d.advance());
        d.report_work_arrived();
        d.report_idle(0, true);
        d.report_idle(1, true);
        assert!(!d.advance(), "work seen mid-round must restart at phase I");
    }
}
