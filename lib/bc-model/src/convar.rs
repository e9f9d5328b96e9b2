//! `ConVar`: the lifecycle state shared by constraints and variables
//! (§3 "ConVar (shared base of Constraint and Variable)").

/// Opaque identity of the subproblem that created a `ConVar`. Only equality
/// matters to this crate; the framework's node arena (`bc-node`) owns the
/// actual `Sub` objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubId(pub u64);

/// Lifecycle state shared by every constraint and variable: back-reference
/// to the creating subproblem (if locally valid), the dynamic/local flags,
/// the expanded/compressed toggle, and the three nonnegative counters that
/// govern deletability.
///
/// Invariant: `local` implies `creating_sub.is_some()`.
/// Invariant: deletable iff `n_references == 0 && n_locks == 0`.
#[derive(Debug, Clone)]
pub struct ConVarCore {
    creating_sub: Option<SubId>,
    dynamic: bool,
    local: bool,
    expanded: bool,
    n_active: u32,
    n_references: u32,
    n_locks: u32,
}

impl ConVarCore {
    /// Builds the lifecycle state for an item created by `creating_sub`
    /// (`None` for items seeded at the master before any subproblem
    /// exists). Items start in expanded form, inactive, unreferenced.
    pub fn new(creating_sub: Option<SubId>, dynamic: bool, local: bool) -> Self {
        assert!(
            !local || creating_sub.is_some(),
            "a locally valid item must have a non-null creating Sub"
        );
        ConVarCore {
            creating_sub,
            dynamic,
            local,
            expanded: true,
            n_active: 0,
            n_references: 0,
            n_locks: 0,
        }
    }

    pub fn creating_sub(&self) -> Option<SubId> {
        self.creating_sub
    }

    pub fn dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn expanded(&self) -> bool {
        self.expanded
    }

    pub fn active(&self) -> bool {
        self.n_active > 0
    }

    pub fn n_active(&self) -> u32 {
        self.n_active
    }

    pub fn n_references(&self) -> u32 {
        self.n_references
    }

    pub fn n_locks(&self) -> u32 {
        self.n_locks
    }

    /// Deletable iff nothing references the pool slot and nothing has
    /// locked it against eviction (§3, §5 "Resource policy").
    pub fn deletable(&self) -> bool {
        self.n_references == 0 && self.n_locks == 0
    }

    pub fn inc_active(&mut self) {
        self.n_active = self
            .n_active
            .checked_add(1)
            .expect("nActive overflow: widen the counter before hitting u32::MAX active subs");
    }

    pub fn dec_active(&mut self) {
        self.n_active = self
            .n_active
            .checked_sub(1)
            .expect("decrement of a zero nActive");
    }

    pub fn inc_references(&mut self) {
        self.n_references = self
            .n_references
            .checked_add(1)
            .expect("nReferences overflow");
    }

    pub fn dec_references(&mut self) {
        self.n_references = self
            .n_references
            .checked_sub(1)
            .expect("nReferences < 0 on decrement");
    }

    pub fn lock(&mut self) {
        self.n_locks = self.n_locks.checked_add(1).expect("nLocks overflow");
    }

    pub fn unlock(&mut self) {
        self.n_locks = self
            .n_locks
            .checked_sub(1)
            .expect("decrement of a zero nLocks");
    }

    /// Toggles to the problem-specific dense ("expanded") form. Idempotent:
    /// expanding an already-expanded item logs a warning and is a no-op
    /// (§4.3).
    pub fn expand(&mut self) {
        if self.expanded {
            tracing::warn!("expand() called on an already-expanded ConVar");
            return;
        }
        self.expanded = true;
    }

    /// Toggles back to the compact ("compressed") form. Idempotent, same
    /// as [`Self::expand`].
    pub fn compress(&mut self) {
        if !self.expanded {
            tracing::warn!("compress() called on an already-compressed ConVar");
            return;
        }
        self.expanded = false;
    }

    /// A local item may only be used in subproblems descending from its
    /// creating Sub. `is_ancestor` should answer "is `ancestor` an ancestor
    /// of (or equal to) `node`" in the caller's tree.
    pub fn usable_in(&self, node: SubId, is_ancestor: impl FnOnce(SubId, SubId) -> bool) -> bool {
        match self.creating_sub {
            None => true,
            Some(creator) => is_ancestor(creator, node),
        }
    }
}

/// Common accessor implemented by every concrete `ConVar` role
/// (`Constraint<G>`, `Variable<G>`) so pool/active-set code in `bc-pool`
/// can manage lifecycle state without knowing which role it holds (design
/// notes: "a small trait carrying the shared lifecycle").
pub trait HasConVarCore {
    fn core(&self) -> &ConVarCore;
    fn core_mut(&mut self) -> &mut ConVarCore;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_without_creating_sub_panics() {
        let result = std::panic::catch_unwind(|| ConVarCore::new(None, false, true));
        assert!(result.is_err());
    }

    #[test]
    fn deletable_iff_no_refs_and_no_locks() {
        let mut c = ConVarCore::new(None, true, false);
        assert!(c.deletable());
        c.inc_references();
        assert!(!c.deletable());
        c.dec_references();
        assert!(c.deletable());
        c.lock();
        assert!(!c.deletable());
        c.unlock();
        assert!(c.deletable());
    }

    #[test]
    #[should_panic(expected = "decrement of a zero nActive")]
    fn dec_active_below_zero_panics() {
        let mut c = ConVarCore::new(None, true, false);
        c.dec_active();
    }

    #[test]
    fn expand_compress_round_trips_idempotently() {
        let mut c = ConVarCore::new(None, true, false);
        assert!(c.expanded());
        c.expand(); // no-op, warns
        assert!(c.expanded());
        c.compress();
        assert!(!c.expanded());
        c.expand();
        assert!(c.expanded());
    }
}
