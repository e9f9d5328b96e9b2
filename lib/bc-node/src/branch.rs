//! Default branching-variable selection and rule generation (§4.7.4).

use bc_model::{FsVarStat, VarType};

/// A single branch: the bound change(s) applied to the child Sub before it
/// inherits the father's active sets. Binary variables branch by setting;
/// general integers branch by splitting at `floor(x + eps)` (§4.7.4).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BranchRule {
    SetToLower(usize),
    SetToUpper(usize),
    TightenUpper { var: usize, new_ub: f64 },
    TightenLower { var: usize, new_lb: f64 },
}

impl BranchRule {
    pub fn variable(&self) -> usize {
        match *self {
            BranchRule::SetToLower(v)
            | BranchRule::SetToUpper(v)
            | BranchRule::TightenUpper { var: v, .. }
            | BranchRule::TightenLower { var: v, .. } => v,
        }
    }

    /// `true` iff applying this rule to `status` (the variable's current
    /// fix/set status) contradicts it outright, e.g. setting to upper a
    /// variable already fixed to lower (§4.7.1, §7 "branch rule refers to
    /// an eliminated variable").
    pub fn contradicts(&self, status: FsVarStat) -> bool {
        match (*self, status) {
            (BranchRule::SetToLower(_), FsVarStat::FixedToUpper | FsVarStat::SetToUpper) => true,
            (BranchRule::SetToUpper(_), FsVarStat::FixedToLower | FsVarStat::SetToLower) => true,
            (BranchRule::SetToLower(_) | BranchRule::SetToUpper(_), FsVarStat::Fixed(_)) => true,
            _ => false,
        }
    }
}

/// Selection heuristic for fractional branching candidates (§6 parameters
/// "BranchingStrategy").
#[cfg_attr(feature = "clap", derive(clap::ArgEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchingStrategy {
    /// Prefer the value closest to 0.5.
    CloseHalf,
    /// Prefer close-to-0.5 weighted toward large `|objective|` coefficients.
    CloseHalfExpensive,
}

/// Per-variable information the candidate search needs: its local active
/// index is implicit in the slice position.
#[derive(Debug, Clone, Copy)]
pub struct BranchCandidateInfo {
    pub var_type: VarType,
    pub status: FsVarStat,
    pub x: f64,
    pub obj: f64,
}

fn fractional(x: f64, eps: f64) -> bool {
    let frac = x - x.floor();
    frac > eps && frac < 1.0 - eps
}

fn score(x: f64, obj: f64, strategy: BranchingStrategy) -> f64 {
    let frac = x - x.floor();
    let closeness = (frac - 0.5).abs();
    match strategy {
        BranchingStrategy::CloseHalf => closeness,
        BranchingStrategy::CloseHalfExpensive => closeness / (1.0 + obj.abs()),
    }
}

/// Picks up to `n_candidates` local variable indices to branch on,
/// restricted first to fractional binaries, then fractional integers,
/// then (if none are fractional) any not-yet-fixed-or-set variable of
/// those types in the same order (§4.7.4).
pub fn select_candidates(
    infos: &[BranchCandidateInfo],
    strategy: BranchingStrategy,
    n_candidates: usize,
    eps: f64,
) -> Vec<usize> {
    let pick = |var_type: VarType, require_fractional: bool| -> Vec<usize> {
        let mut candidates: Vec<(usize, f64)> = infos
            .iter()
            .enumerate()
            .filter(|(_, info)| info.var_type == var_type && !info.status.fixed_or_set())
            .filter(|(_, info)| !require_fractional || fractional(info.x, eps))
            .map(|(i, info)| (i, score(info.x, info.obj, strategy)))
            .collect();
        candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.into_iter().map(|(i, _)| i).collect()
    };

    for var_type in [VarType::Binary, VarType::Integer] {
        let fractional_first = pick(var_type, true);
        if !fractional_first.is_empty() {
            return fractional_first.into_iter().take(n_candidates).collect();
        }
    }
    for var_type in [VarType::Binary, VarType::Integer] {
        let any = pick(var_type, false);
        if !any.is_empty() {
            return any.into_iter().take(n_candidates).collect();
        }
    }
    Vec::new()
}

/// Builds the pair of branch rules induced by branching on `var` (§4.7.4):
/// binary variables set to each bound, general integers split at
/// `floor(x + eps)`.
pub fn rule_pair(var: usize, var_type: VarType, x: f64, eps: f64) -> (BranchRule, BranchRule) {
    match var_type {
        VarType::Binary => (BranchRule::SetToLower(var), BranchRule::SetToUpper(var)),
        _ => {
            let floor_val = (x + eps).floor();
            (
                BranchRule::TightenUpper { var, new_ub: floor_val },
                BranchRule::TightenLower {
                    var,
                    new_lb: floor_val + 1.0,
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(var_type: VarType, x: f64, obj: f64) -> BranchCandidateInfo {
        BranchCandidateInfo {
            var_type,
            status: FsVarStat::Free,
            x,
            obj,
        }
    }

    #[test]
    fn prefers_binary_over_integer_when_both_fractional() {
        let infos = vec![info(VarType::Integer, 2.5, 1.0), info(VarType::Binary, 0.3, 1.0)];
        let picked = select_candidates(&infos, BranchingStrategy::CloseHalf, 1, 1e-6);
        assert_eq!(picked, vec![1]);
    }

    #[test]
    fn close_half_ranks_by_distance_from_half() {
        let infos = vec![info(VarType::Binary, 0.9, 1.0), info(VarType::Binary, 0.5, 1.0)];
        let picked = select_candidates(&infos, BranchingStrategy::CloseHalf, 2, 1e-6);
        assert_eq!(picked, vec![1, 0]);
    }

    #[test]
    fn falls_back_to_any_unfixed_variable_when_nothing_fractional() {
        let infos = vec![info(VarType::Binary, 0.0, 1.0), info(VarType::Binary, 1.0, 1.0)];
        let picked = select_candidates(&infos, BranchingStrategy::CloseHalf, 1, 1e-6);
        assert_eq!(picked.len(), 1);
    }

    #[test]
    fn rule_pair_splits_integer_at_floor_plus_eps() {
        let (lo, hi) = rule_pair(3, VarType::Integer, 2.7, 1e-6);
        assert_eq!(lo, BranchRule::TightenUpper { var: 3, new_ub: 2.0 });
        assert_eq!(hi, BranchRule::TightenLower { var: 3, new_lb: 3.0 });
    }

    #[test]
    fn set_to_lower_contradicts_fixed_to_upper() {
        assert!(BranchRule::SetToLower(0).contradicts(FsVarStat::FixedToUpper));
        assert!(!BranchRule::SetToLower(0).contradicts(FsVarStat::FixedToLower));
    }
}
