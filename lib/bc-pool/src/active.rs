//! `Active<T>`: the ordered, locally-indexed view of pool items currently
//! in the LP (§4.1 "Active", §4.7.2).

use std::collections::HashSet;

use bc_model::HasConVarCore;

use crate::{
    error::{Error, Result},
    slot::PoolSlotRef,
};

/// The active set for one role (constraints or variables) inside a single
/// subproblem's LP relaxation. Local index `i` here is the LP row/column
/// index; `items[i]` is the pool reference that backs it.
pub struct Active<T: HasConVarCore> {
    items: Vec<PoolSlotRef<T>>,
    redundant_age: Vec<u32>,
}

impl<T: HasConVarCore> Active<T> {
    pub fn new() -> Self {
        Active {
            items: Vec::new(),
            redundant_age: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&PoolSlotRef<T>> {
        self.items.get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoolSlotRef<T>> {
        self.items.iter()
    }

    pub fn redundant_age(&self, i: usize) -> u32 {
        self.redundant_age[i]
    }

    pub fn bump_age(&mut self, i: usize) {
        self.redundant_age[i] = self.redundant_age[i].saturating_add(1);
    }

    pub fn reset_age(&mut self, i: usize) {
        self.redundant_age[i] = 0;
    }

    /// Appends one reference, bumping the item's `nActive` counter, and
    /// returns its new local index.
    pub fn append_one(&mut self, r: PoolSlotRef<T>) -> usize {
        r.with_mut(|item| item.core_mut().inc_active());
        self.items.push(r);
        self.redundant_age.push(0);
        self.items.len() - 1
    }

    /// Appends several references in order. A void reference (its backing
    /// slot was recycled before activation) still occupies a local index
    /// with age `0`; it simply contributes nothing to `nActive`. Returns
    /// the range of local indices assigned.
    pub fn append_many(&mut self, refs: impl IntoIterator<Item = PoolSlotRef<T>>) -> (usize, usize) {
        let start = self.items.len();
        for r in refs {
            r.with_mut(|item| item.core_mut().inc_active());
            self.items.push(r);
            self.redundant_age.push(0);
        }
        (start, self.items.len())
    }

    /// Removes the items at `indices` (must be strictly increasing),
    /// decrementing each removed item's `nActive` counter and left-shifting
    /// the remaining items to close the gaps (§4.7.2 "removeCons"/
    /// "removeVars").
    pub fn remove(&mut self, indices: &[usize]) -> Result<()> {
        if !indices.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::IndicesNotIncreasing);
        }
        let drop: HashSet<usize> = indices.iter().copied().collect();
        for &i in indices {
            self.items[i].with_mut(|item| item.core_mut().dec_active());
        }
        let mut kept_items = Vec::with_capacity(self.items.len() - drop.len());
        let mut kept_ages = Vec::with_capacity(self.redundant_age.len() - drop.len());
        for (i, (item, age)) in self
            .items
            .drain(..)
            .zip(self.redundant_age.drain(..))
            .enumerate()
        {
            if !drop.contains(&i) {
                kept_items.push(item);
                kept_ages.push(age);
            }
        }
        self.items = kept_items;
        self.redundant_age = kept_ages;
        Ok(())
    }

    /// Asserts the active set can hold at least `new_max` items. Unlike a
    /// pool, an active set is never silently shrunk: callers must go
    /// through [`Self::remove`] to drop items (§4.1).
    pub fn realloc(&mut self, new_max: usize) -> Result<()> {
        if new_max < self.items.len() {
            return Err(Error::ShrinkNotAllowed {
                requested: new_max,
                current: self.items.len(),
            });
        }
        self.items.reserve(new_max - self.items.len());
        self.redundant_age.reserve(new_max - self.redundant_age.len());
        Ok(())
    }
}

impl<T: HasConVarCore> Default for Active<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use bc_model::ConVarCore;

    use super::*;
    use crate::slot::PoolSlot;

    struct Item(ConVarCore);
    impl HasConVarCore for Item {
        fn core(&self) -> &ConVarCore {
            &self.0
        }

        fn core_mut(&mut self) -> &mut ConVarCore {
            &mut self.0
        }
    }

    fn make_ref() -> PoolSlotRef<Item> {
        let slot = PoolSlot::new_handle(0);
        slot.borrow_mut().insert(Item(ConVarCore::new(None, true, false)));
        PoolSlotRef::new(slot)
    }

    #[test]
    fn append_increments_active_and_assigns_index() {
        let mut active: Active<Item> = Active::new();
        let r = make_ref();
        let i = active.append_one(r);
        assert_eq!(i, 0);
        assert!(active.get(0).unwrap().with(|it| it.core().active()).unwrap());
    }

    #[test]
    fn remove_rejects_unsorted_indices() {
        let mut active: Active<Item> = Active::new();
        active.append_one(make_ref());
        active.append_one(make_ref());
        assert!(active.remove(&[1, 0]).is_err());
    }

    #[test]
    fn remove_closes_gaps_and_decrements_active() {
        let mut active: Active<Item> = Active::new();
        let r0 = active.append_one(make_ref());
        let r1 = active.append_one(make_ref());
        let _r2 = active.append_one(make_ref());
        let kept_ref = active.get(r1).unwrap().clone();
        active.remove(&[r0]).unwrap();
        assert_eq!(active.len(), 2);
        assert!(kept_ref.with(|it| it.core().active()).unwrap());
    }

    #[test]
    fn realloc_rejects_shrink_below_current_len() {
        let mut active: Active<Item> = Active::new();
        active.append_one(make_ref());
        assert!(active.realloc(0).is_err());
        assert!(active.realloc(10).is_ok());
    }
}
