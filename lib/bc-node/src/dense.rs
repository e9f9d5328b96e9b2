//! Row/column generators backed by an explicit sparse vector, used for
//! constraints and variables the Sub builds itself (from separation,
//! pricing, or branching) rather than ones a problem subclass generates
//! lazily (§4.3 "G = () ... dense constraints built by the LP layer
//! itself" — here carrying real coefficients instead of none).

use bc_model::{ColGenerator, RowGenerator};

#[derive(Debug, Clone, Default)]
pub struct SparseRow(pub Vec<(usize, f64)>);

impl RowGenerator for SparseRow {
    fn coefficient(&self, j: usize) -> f64 {
        self.0
            .iter()
            .find(|&&(c, _)| c == j)
            .map_or(0.0, |&(_, v)| v)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SparseCol(pub Vec<(usize, f64)>);

impl ColGenerator for SparseCol {
    fn coefficient(&self, i: usize) -> f64 {
        self.0
            .iter()
            .find(|&&(r, _)| r == i)
            .map_or(0.0, |&(_, v)| v)
    }
}
