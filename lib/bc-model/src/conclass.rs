//! Cached classification of a constraint's shape (ABACUS `ABA_CONCLASS`,
//! `Include/abacus/conclass.h` — dropped from the distilled spec, carried
//! here per SPEC_FULL.md's supplemented-features section).

/// A cheap, cacheable classification of a constraint, filled in by the
/// user's `classify` hook (§6). Used by the LP view to recognize
/// variable-bound rows without re-deriving them from coefficients every
/// iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConClass {
    /// Every nonzero coefficient belongs to a binary variable.
    pub all_binary: bool,
    /// The constraint is a tautology over the current bounds (e.g. a
    /// single-variable bound restated as a row) and contributes nothing to
    /// cutting.
    pub trivial: bool,
    /// The constraint has exactly one nonzero coefficient and is better
    /// expressed as a variable bound than as a row.
    pub variable_bound: bool,
}
