//! Tailing-off detection: a ring buffer of recent LP objective values
//! (§4.7.5).

use std::collections::VecDeque;

use bc_model::OptSense;

pub struct TailingOff {
    window: VecDeque<f64>,
    capacity: usize,
    skip_next: bool,
}

impl TailingOff {
    pub fn new(capacity: usize) -> Self {
        TailingOff {
            window: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            skip_next: false,
        }
    }

    /// Skips the next [`Self::push`] sample — used when a round only
    /// added mandatory integrality constraints and would otherwise read
    /// as a suspiciously flat objective (§4.7.5).
    pub fn ignore_in_tailing_off(&mut self) {
        self.skip_next = true;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&mut self, value: f64) {
        if std::mem::take(&mut self.skip_next) {
            return;
        }
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(value);
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.skip_next = false;
    }

    /// `true` iff the window is full and the relative improvement across
    /// it is below `percent` (§4.7.5).
    pub fn is_tailing_off(&self, sense: OptSense, percent: f64) -> bool {
        if self.window.len() < self.capacity {
            return false;
        }
        let first = *self.window.front().unwrap();
        let last = *self.window.back().unwrap();
        let improvement = match sense {
            OptSense::Minimize => first - last,
            OptSense::Maximize => last - first,
        };
        let scale = first.abs().max(1.0);
        (improvement / scale * 100.0) < percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_tailing_off_until_window_fills() {
        let mut t = TailingOff::new(3);
        t.push(10.0);
        t.push(10.0);
        assert!(!t.is_tailing_off(OptSense::Minimize, 1.0));
    }

    #[test]
    fn detects_flat_objective_as_tailing_off() {
        let mut t = TailingOff::new(3);
        t.push(10.0);
        t.push(10.0);
        t.push(10.0);
        assert!(t.is_tailing_off(OptSense::Minimize, 1.0));
    }

    #[test]
    fn large_improvement_is_not_tailing_off() {
        let mut t = TailingOff::new(3);
        t.push(100.0);
        t.push(50.0);
        t.push(10.0);
        assert!(!t.is_tailing_off(OptSense::Minimize, 1.0));
    }

    #[test]
    fn ignore_next_skips_one_sample() {
        let mut t = TailingOff::new(2);
        t.push(10.0);
        t.ignore_in_tailing_off();
        t.push(999.0);
        t.push(10.0);
        assert!(t.is_tailing_off(OptSense::Minimize, 1.0));
    }
}
