//! `PoolSlot` / `PoolSlotRef`: versioned container for a `ConVar` and the
//! weak reference that detects stale targets (§4.1).

use std::{cell::RefCell, rc::Rc};

use bc_model::HasConVarCore;

/// A slot that owns at most one item of base type `T`. The `version`
/// counter is bumped on every insertion; a [`PoolSlotRef`] captures the
/// version at acquisition time and treats a mismatch as "void" — the item
/// it pointed to was garbage-collected from the pool.
///
/// Slots never move once created; [`SlotHandle`] is the shared handle a
/// [`crate::pool::Pool`] and any number of [`PoolSlotRef`]s hold into the
/// same slot, which is how we get arena-style storage without unsafe
/// back-pointers (design notes, "pool-indexed handles").
pub struct PoolSlot<T> {
    index: usize,
    item: Option<T>,
    version: u64,
}

/// Shared handle to a [`PoolSlot`]. A slot must outlive every
/// [`PoolSlotRef`] into it; sharing it behind `Rc<RefCell<_>>` makes that
/// true by construction instead of by convention.
pub type SlotHandle<T> = Rc<RefCell<PoolSlot<T>>>;

impl<T> PoolSlot<T> {
    pub(crate) fn new_handle(index: usize) -> SlotHandle<T> {
        Rc::new(RefCell::new(PoolSlot {
            index,
            item: None,
            version: 0,
        }))
    }

    /// A slot that isn't registered in any [`crate::pool::PoolStore`] —
    /// for `ConVar`s a Subproblem generates itself (separation, pricing)
    /// and never places in a shared pool. `index` has no pool-freelist
    /// meaning here; it only appears in error messages.
    pub fn standalone() -> SlotHandle<T> {
        Self::new_handle(0)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn item(&self) -> Option<&T> {
        self.item.as_ref()
    }

    pub fn item_mut(&mut self) -> Option<&mut T> {
        self.item.as_mut()
    }

    /// `insert(cv)` fails loudly if the slot already holds an item;
    /// otherwise stores `cv` and bumps the version to `max(1, version+1)`,
    /// warning and wrapping to `1` on overflow (§4.1).
    pub fn insert(&mut self, cv: T) {
        assert!(
            self.item.is_none(),
            "insertion into an occupied pool slot (index {})",
            self.index
        );
        self.item = Some(cv);
        self.version = match self.version.checked_add(1) {
            Some(v) if v != 0 => v,
            _ => {
                tracing::warn!(slot = self.index, "pool slot version counter wrapped");
                1
            }
        };
    }
}

impl<T: HasConVarCore> PoolSlot<T> {
    /// Succeeds iff the held item is [`bc_model::ConVarCore::deletable`];
    /// on success returns the released item.
    pub fn soft_delete(&mut self) -> Option<T> {
        if self.item.as_ref()?.core().deletable() {
            self.item.take()
        } else {
            None
        }
    }

    /// Unconditionally releases the item. The caller must be able to prove
    /// no valid [`PoolSlotRef`] remains (§4.1).
    pub fn hard_delete(&mut self) -> Option<T> {
        self.item.take()
    }
}

/// A versioned reference into a [`PoolSlot`]. Dereferencing (via
/// [`PoolSlotRef::get`]/[`PoolSlotRef::get_mut`]) yields the item only if
/// the slot's current version still matches the version captured at
/// construction time; otherwise the slot was recycled for something else
/// and the reference is "void".
pub struct PoolSlotRef<T: HasConVarCore> {
    slot: SlotHandle<T>,
    version: u64,
}

impl<T: HasConVarCore> PoolSlotRef<T> {
    /// Constructs a reference to `slot`, capturing its current version and
    /// incrementing the held item's `nReferences` if the slot is occupied.
    pub fn new(slot: SlotHandle<T>) -> Self {
        let version = slot.borrow().version();
        if let Some(item) = slot.borrow_mut().item_mut() {
            item.core_mut().inc_references();
        }
        PoolSlotRef { slot, version }
    }

    pub fn slot(&self) -> &SlotHandle<T> {
        &self.slot
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn slot_index(&self) -> usize {
        self.slot.borrow().index()
    }

    /// `true` iff the slot's current version still matches the captured
    /// one (invariant 3 of §8).
    pub fn is_valid(&self) -> bool {
        self.slot.borrow().version() == self.version
    }

    /// Reads the referenced item, or `None` if the slot is void.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let slot = self.slot.borrow();
        if slot.version() == self.version {
            slot.item().map(f)
        } else {
            None
        }
    }

    /// Mutates the referenced item, or `None` if the slot is void.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut slot = self.slot.borrow_mut();
        if slot.version() == self.version {
            slot.item_mut().map(f)
        } else {
            None
        }
    }

    /// Re-points this reference at `new_slot`, decrementing the old
    /// item's `nReferences` (only if the old reference was still valid)
    /// and incrementing the new item's.
    pub fn reassign(&mut self, new_slot: SlotHandle<T>) {
        self.release();
        let version = new_slot.borrow().version();
        if let Some(item) = new_slot.borrow_mut().item_mut() {
            item.core_mut().inc_references();
        }
        self.slot = new_slot;
        self.version = version;
    }

    fn release(&mut self) {
        let mut slot = self.slot.borrow_mut();
        if slot.version() == self.version {
            if let Some(item) = slot.item_mut() {
                item.core_mut().dec_references();
            }
        }
    }
}

impl<T: HasConVarCore> Clone for PoolSlotRef<T> {
    fn clone(&self) -> Self {
        if self.is_valid() {
            self.with_mut(|item| item.core_mut().inc_references());
        }
        PoolSlotRef {
            slot: self.slot.clone(),
            version: self.version,
        }
    }
}

impl<T: HasConVarCore> Drop for PoolSlotRef<T> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use bc_model::{ConVarCore, HasConVarCore};

    use super::*;

    struct Item(ConVarCore);
    impl HasConVarCore for Item {
        fn core(&self) -> &ConVarCore {
            &self.0
        }

        fn core_mut(&mut self) -> &mut ConVarCore {
            &mut self.0
        }
    }

    fn item() -> Item {
        Item(ConVarCore::new(None, true, false))
    }

    #[test]
    fn soft_delete_fails_while_referenced() {
        let slot = PoolSlot::new_handle(0);
        slot.borrow_mut().insert(item());
        let r1 = PoolSlotRef::new(slot.clone());
        assert_eq!(slot.borrow_mut().soft_delete().is_none(), true);
        drop(r1);
        assert!(slot.borrow_mut().soft_delete().is_some());
    }

    #[test]
    fn stale_ref_reads_as_void_after_hard_delete_and_reinsert() {
        let slot = PoolSlot::new_handle(0);
        slot.borrow_mut().insert(item());
        let r1 = PoolSlotRef::new(slot.clone());
        assert_eq!(slot.borrow().version(), 1);

        slot.borrow_mut().hard_delete();
        slot.borrow_mut().insert(item());
        assert_eq!(slot.borrow().version(), 2);

        assert!(r1.with(|_| ()).is_none());
        // The stale ref must not have touched the new item's reference count.
        assert_eq!(
            slot.borrow().item().unwrap().core().n_references(),
            0
        );
    }

    #[test]
    fn reference_count_tracks_live_refs() {
        let slot = PoolSlot::new_handle(0);
        slot.borrow_mut().insert(item());
        let r1 = PoolSlotRef::new(slot.clone());
        let r2 = r1.clone();
        assert_eq!(
            slot.borrow().item().unwrap().core().n_references(),
            2
        );
        drop(r1);
        assert_eq!(
            slot.borrow().item().unwrap().core().n_references(),
            1
        );
        drop(r2);
        assert_eq!(
            slot.borrow().item().unwrap().core().n_references(),
            0
        );
    }
}
