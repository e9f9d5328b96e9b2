//! Fix/set status of a variable (§3 "FSVarStat" in the design).

/// Tagged fix/set status of a variable.
///
/// `Fixed*` is permanent (globally valid for the remainder of the search);
/// `Set*` is valid only in the subtree rooted at the subproblem that applied
/// it. Equality between statuses is semantic, not structural: two statuses
/// that resolve to the same numeric value at a given `(lb, ub)` pair agree,
/// regardless of whether one is `Set` and the other `Fixed`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FsVarStat {
    Free,
    SetToLower,
    SetToUpper,
    Set(f64),
    FixedToLower,
    FixedToUpper,
    Fixed(f64),
}

impl Default for FsVarStat {
    fn default() -> Self {
        FsVarStat::Free
    }
}

impl FsVarStat {
    pub fn fixed(&self) -> bool {
        matches!(
            self,
            FsVarStat::FixedToLower | FsVarStat::FixedToUpper | FsVarStat::Fixed(_)
        )
    }

    pub fn set(&self) -> bool {
        matches!(
            self,
            FsVarStat::SetToLower | FsVarStat::SetToUpper | FsVarStat::Set(_)
        )
    }

    pub fn fixed_or_set(&self) -> bool {
        !matches!(self, FsVarStat::Free)
    }

    /// The numeric value this status pins the variable to, given its
    /// current bounds. `None` for `Free`.
    pub fn resolve(&self, lb: f64, ub: f64) -> Option<f64> {
        match self {
            FsVarStat::Free => None,
            FsVarStat::SetToLower | FsVarStat::FixedToLower => Some(lb),
            FsVarStat::SetToUpper | FsVarStat::FixedToUpper => Some(ub),
            FsVarStat::Set(v) | FsVarStat::Fixed(v) => Some(*v),
        }
    }

    /// `true` iff `self` and `other`, resolved against the same bounds,
    /// pin the variable to different values. Two `Free` statuses, or one
    /// `Free` and one fixed/set, never contradict — a `Free` status simply
    /// carries no claim to compare against.
    pub fn contradiction(&self, other: &FsVarStat, lb: f64, ub: f64, eps: f64) -> bool {
        match (self.resolve(lb, ub), other.resolve(lb, ub)) {
            (Some(a), Some(b)) => (a - b).abs() > eps,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_to_lower_and_fixed_to_lower_agree() {
        let a = FsVarStat::SetToLower;
        let b = FsVarStat::FixedToLower;
        assert!(!a.contradiction(&b, 0.0, 1.0, 1e-6));
    }

    #[test]
    fn two_fixed_values_agree_within_eps() {
        let a = FsVarStat::Fixed(3.0);
        let b = FsVarStat::Fixed(3.0 + 1e-9);
        assert!(!a.contradiction(&b, 0.0, 10.0, 1e-6));
    }

    #[test]
    fn different_bounds_contradict() {
        let a = FsVarStat::SetToLower;
        let b = FsVarStat::SetToUpper;
        assert!(a.contradiction(&b, 0.0, 1.0, 1e-6));
    }

    #[test]
    fn free_never_contradicts() {
        let a = FsVarStat::Free;
        let b = FsVarStat::Fixed(5.0);
        assert!(!a.contradiction(&b, 0.0, 10.0, 1e-6));
    }
}
