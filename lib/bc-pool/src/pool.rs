//! `PoolStore`: fixed-capacity storage for `ConVar`s, with slot reuse on
//! deletion and an optional duplicate-rejecting variant (§4.1, §4.2).

use std::{cell::RefCell, collections::HashMap, hash::Hash, rc::Rc};

use bc_model::HasConVarCore;

use crate::{
    error::{Error, Result},
    slot::{PoolSlot, SlotHandle},
};

/// Shared storage for `ConVar`s behind versioned slots. A pool never grows
/// past `capacity`; once full, insertion fails until a soft- or
/// hard-deleted slot frees up (§4.1 "StandardPool").
pub trait PoolStore<T: HasConVarCore> {
    /// Snapshot of every slot handle, occupied or not. Safe to hold across
    /// later mutations of the pool: the handles keep the slots alive.
    fn slots(&self) -> Vec<SlotHandle<T>>;

    fn capacity(&self) -> usize;

    /// Number of currently occupied slots.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attempts [`PoolSlot::soft_delete`] on `slot`; `true` on success.
    fn soft_delete(&mut self, slot: &SlotHandle<T>) -> bool;

    /// Unconditional [`PoolSlot::hard_delete`].
    fn hard_delete(&mut self, slot: &SlotHandle<T>);
}

/// Result of an insertion attempt into a duplicate-aware pool.
pub enum Inserted<T: HasConVarCore> {
    New(SlotHandle<T>),
    Duplicate(SlotHandle<T>),
}

/// A plain fixed-capacity pool: first-fit reuse of freed slot indices, grows
/// lazily up to `capacity`.
pub struct StandardPool<T: HasConVarCore> {
    slots: Vec<SlotHandle<T>>,
    free: Vec<usize>,
    occupied: usize,
    capacity: usize,
}

impl<T: HasConVarCore> StandardPool<T> {
    pub fn new(capacity: usize) -> Self {
        StandardPool {
            slots: Vec::new(),
            free: Vec::new(),
            occupied: 0,
            capacity,
        }
    }

    /// Inserts `cv`, reusing a freed slot if one exists and otherwise
    /// growing the backing store. Returns `None` if the pool is already at
    /// capacity and holds no freed slot (§4.1 "pool is full").
    pub fn insert(&mut self, cv: T) -> Option<SlotHandle<T>> {
        let handle = if let Some(i) = self.free.pop() {
            self.slots[i].clone()
        } else if self.slots.len() < self.capacity {
            let h = PoolSlot::new_handle(self.slots.len());
            self.slots.push(h.clone());
            h
        } else {
            return None;
        };
        handle.borrow_mut().insert(cv);
        self.occupied += 1;
        Some(handle)
    }

    pub fn try_insert(&mut self, cv: T) -> Result<SlotHandle<T>> {
        self.insert(cv).ok_or(Error::PoolFull)
    }
}

impl<T: HasConVarCore> PoolStore<T> for StandardPool<T> {
    fn slots(&self) -> Vec<SlotHandle<T>> {
        self.slots.clone()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn len(&self) -> usize {
        self.occupied
    }

    fn soft_delete(&mut self, slot: &SlotHandle<T>) -> bool {
        let index = slot.borrow().index();
        let removed = slot.borrow_mut().soft_delete().is_some();
        if removed {
            self.occupied -= 1;
            self.free.push(index);
        }
        removed
    }

    fn hard_delete(&mut self, slot: &SlotHandle<T>) {
        let index = slot.borrow().index();
        if slot.borrow_mut().hard_delete().is_some() {
            self.occupied -= 1;
        }
        self.free.push(index);
    }
}

/// Associates a `ConVar` with a stable key used to detect duplicates on
/// insertion (§4.2 "NonDuplPool"). Typical key: a hash of the constraint's
/// row, or a variable's column.
pub trait DuplicateKey {
    type Key: Hash + Eq + Clone;

    fn dup_key(&self) -> Self::Key;
}

/// A [`StandardPool`] that rejects would-be duplicates by returning the
/// existing slot instead of inserting a second copy.
pub struct NonDuplPool<T: HasConVarCore + DuplicateKey> {
    inner: StandardPool<T>,
    by_key: HashMap<T::Key, usize>,
}

impl<T: HasConVarCore + DuplicateKey> NonDuplPool<T> {
    pub fn new(capacity: usize) -> Self {
        NonDuplPool {
            inner: StandardPool::new(capacity),
            by_key: HashMap::new(),
        }
    }

    /// Inserts `cv` unless its [`DuplicateKey::dup_key`] already maps to a
    /// live slot, in which case that slot is returned as
    /// [`Inserted::Duplicate`] and `cv` is dropped.
    pub fn insert(&mut self, cv: T) -> Option<Inserted<T>> {
        let key = cv.dup_key();
        if let Some(&index) = self.by_key.get(&key) {
            let handle = self.inner.slots[index].clone();
            if !handle.borrow().is_empty() {
                return Some(Inserted::Duplicate(handle));
            }
            self.by_key.remove(&key);
        }
        let handle = self.inner.insert(cv)?;
        self.by_key.insert(key, handle.borrow().index());
        Some(Inserted::New(handle))
    }
}

impl<T: HasConVarCore + DuplicateKey> PoolStore<T> for NonDuplPool<T> {
    fn slots(&self) -> Vec<SlotHandle<T>> {
        self.inner.slots()
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn soft_delete(&mut self, slot: &SlotHandle<T>) -> bool {
        self.inner.soft_delete(slot)
    }

    fn hard_delete(&mut self, slot: &SlotHandle<T>) {
        self.inner.hard_delete(slot)
    }
}

/// Scans `pool` for occupied slots whose item is "violated" under
/// `evaluate` (returns `Some(rank)`, where rank may be absent) and feeds
/// them into `buffer`. Returns the number of items added to `buffer`
/// (§4.4 "separate").
///
/// The slot snapshot is taken up front, so concurrent insertions made by
/// `evaluate` itself (e.g. lazy constraint generation) are simply not
/// seen this round rather than corrupting the scan.
pub fn separate<T, F>(
    pool: &impl PoolStore<T>,
    buffer: &mut crate::cutbuffer::CutBuffer<T>,
    mut evaluate: F,
) -> usize
where
    T: HasConVarCore,
    F: FnMut(&T) -> Option<Option<f64>>,
{
    let mut added = 0;
    for handle in pool.slots() {
        let rank = {
            let slot = handle.borrow();
            match slot.item() {
                Some(item) => evaluate(item),
                None => None,
            }
        };
        if let Some(rank) = rank {
            let slot_ref = crate::slot::PoolSlotRef::new(handle);
            if buffer.insert(slot_ref, true, rank).is_ok() {
                added += 1;
            }
        }
    }
    added
}

#[allow(dead_code)]
fn _assert_rc_eq<T>(_: &Rc<RefCell<T>>) {}

#[cfg(test)]
mod tests {
    use bc_model::ConVarCore;

    use super::*;

    struct Item(ConVarCore, u32);
    impl HasConVarCore for Item {
        fn core(&self) -> &ConVarCore {
            &self.0
        }

        fn core_mut(&mut self) -> &mut ConVarCore {
            &mut self.0
        }
    }
    impl DuplicateKey for Item {
        type Key = u32;

        fn dup_key(&self) -> u32 {
            self.1
        }
    }

    fn item(k: u32) -> Item {
        Item(ConVarCore::new(None, true, false), k)
    }

    #[test]
    fn standard_pool_reuses_freed_slots() {
        let mut pool: StandardPool<Item> = StandardPool::new(1);
        let h1 = pool.insert(item(1)).unwrap();
        assert!(pool.insert(item(2)).is_none());
        pool.soft_delete(&h1);
        let h2 = pool.insert(item(3)).unwrap();
        assert_eq!(h2.borrow().index(), 0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn nondupl_pool_returns_existing_slot() {
        let mut pool: NonDuplPool<Item> = NonDuplPool::new(4);
        let first = match pool.insert(item(7)).unwrap() {
            Inserted::New(h) => h,
            Inserted::Duplicate(_) => panic!("expected New"),
        };
        match pool.insert(item(7)).unwrap() {
            Inserted::Duplicate(h) => assert_eq!(h.borrow().index(), first.borrow().index()),
            Inserted::New(_) => panic!("expected Duplicate"),
        }
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn nondupl_pool_allows_reinsertion_after_deletion() {
        let mut pool: NonDuplPool<Item> = NonDuplPool::new(4);
        let h = match pool.insert(item(1)).unwrap() {
            Inserted::New(h) => h,
            _ => unreachable!(),
        };
        pool.soft_delete(&h);
        match pool.insert(item(1)).unwrap() {
            Inserted::New(_) => {}
            Inserted::Duplicate(_) => panic!("stale key should not match a freed slot"),
        }
    }
}
