//! Variable: type + bounds + objective plus column generation against an
//! active constraint set (§3 "Variable", §4.3).

use crate::{
    convar::{ConVarCore, HasConVarCore},
    fsvarstat::FsVarStat,
    sense::OptSense,
    vartype::VarType,
};

/// Generates the column form of a variable: the nonzero coefficients
/// against currently active constraints. The counterpart of
/// [`crate::constraint::RowGenerator`] for the column role.
pub trait ColGenerator {
    fn coefficient(&self, i: usize) -> f64;
}

/// A decision variable: type, objective coefficient, global bounds and
/// fix/set status.
#[derive(Debug, Clone)]
pub struct Variable<G> {
    pub core: ConVarCore,
    pub var_type: VarType,
    pub obj: f64,
    pub lb: f64,
    pub ub: f64,
    pub global_status: FsVarStat,
    generator: G,
}

impl<G> Variable<G> {
    pub fn new(
        core: ConVarCore,
        var_type: VarType,
        obj: f64,
        lb: f64,
        ub: f64,
        generator: G,
    ) -> Self {
        Variable {
            core,
            var_type,
            obj,
            lb,
            ub,
            global_status: FsVarStat::Free,
            generator,
        }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }
}

impl<G> HasConVarCore for Variable<G> {
    fn core(&self) -> &ConVarCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ConVarCore {
        &mut self.core
    }
}

impl<G: ColGenerator> Variable<G> {
    pub fn coefficient(&mut self, i: usize) -> f64 {
        self.core.expand();
        let v = self.generator.coefficient(i);
        self.core.compress();
        v
    }

    /// Column generation: `expand; for each active constraint i with
    /// |coeff(i)| > eps, emit (i, coeff); compress` (§4.3, symmetric to row
    /// generation).
    pub fn column(&mut self, active_cons: &[usize], eps: f64) -> Vec<(usize, f64)> {
        self.core.expand();
        let col = active_cons
            .iter()
            .copied()
            .filter_map(|i| {
                let c = self.generator.coefficient(i);
                (c.abs() > eps).then_some((i, c))
            })
            .collect();
        self.core.compress();
        col
    }

    /// Reduced cost against dual vector `y`: `obj - sum_i y[i] * coeff(i)`.
    pub fn reduced_cost(&mut self, active_cons: &[usize], y: &[f64], eps: f64) -> f64 {
        let col = self.column(active_cons, eps);
        self.obj - col.into_iter().map(|(i, c)| y[i] * c).sum::<f64>()
    }

    /// Whether activating this (currently inactive) variable could improve
    /// the LP value beyond the incumbent primal bound, given the reduced
    /// cost it would enter with (§3 "useful" test).
    pub fn useful(&mut self, active_cons: &[usize], y: &[f64], sense: OptSense, eps: f64) -> bool {
        let rc = self.reduced_cost(active_cons, y, eps);
        sense.reduced_cost_violated(rc, eps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dense(Vec<f64>);
    impl ColGenerator for Dense {
        fn coefficient(&self, i: usize) -> f64 {
            self.0.get(i).copied().unwrap_or(0.0)
        }
    }

    fn var(obj: f64, coeffs: Vec<f64>) -> Variable<Dense> {
        Variable::new(
            ConVarCore::new(None, true, false),
            VarType::Continuous,
            obj,
            0.0,
            1.0,
            Dense(coeffs),
        )
    }

    #[test]
    fn reduced_cost_matches_hand_computation() {
        let mut v = var(5.0, vec![1.0, 2.0]);
        // rc = 5 - (y0*1 + y1*2) = 5 - (1 + 4) = 0
        let rc = v.reduced_cost(&[0, 1], &[1.0, 2.0], 1e-6);
        assert!((rc - 0.0).abs() < 1e-9);
    }

    #[test]
    fn useful_is_sense_aware() {
        let mut v = var(5.0, vec![1.0]);
        // rc = 5 - 1*1 = 4, attractive to enter when maximizing.
        assert!(v.useful(&[0], &[1.0], OptSense::Maximize, 1e-6));
        assert!(!v.useful(&[0], &[1.0], OptSense::Minimize, 1e-6));
    }
}
