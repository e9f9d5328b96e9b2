//! `CutBuffer`: staging area between `separate()` and `Active::append_many`
//! that ranks and caps how many violated constraints/columns enter the LP
//! in one round (§4.4 "CutBuffer").

use bc_model::HasConVarCore;

use crate::{
    error::{Error, Result},
    slot::PoolSlotRef,
};

struct Entry<T: HasConVarCore> {
    slot_ref: PoolSlotRef<T>,
    keep_in_pool: bool,
    rank: Option<f64>,
}

/// Holds candidates found by separation until the node decides how many to
/// pull into the active LP. Entries are locked against eviction
/// ([`bc_model::ConVarCore::lock`]) for as long as they sit in the buffer.
pub struct CutBuffer<T: HasConVarCore> {
    entries: Vec<Entry<T>>,
    capacity: usize,
    ranking_capable: bool,
}

impl<T: HasConVarCore> CutBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        CutBuffer {
            entries: Vec::new(),
            capacity,
            ranking_capable: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Adds a candidate. `keep_in_pool` marks items that should survive in
    /// the pool even if not selected this round (e.g. pool-resident
    /// constraints, as opposed to freshly separated cuts). Once any
    /// rank-less candidate is inserted, the buffer permanently degrades to
    /// insertion order for [`Self::sort`] (§4.4).
    pub fn insert(&mut self, slot_ref: PoolSlotRef<T>, keep_in_pool: bool, rank: Option<f64>) -> Result<()> {
        if self.entries.len() >= self.capacity {
            return Err(Error::BufferFull);
        }
        if rank.is_none() {
            self.ranking_capable = false;
        }
        slot_ref.with_mut(|item| item.core_mut().lock());
        self.entries.push(Entry {
            slot_ref,
            keep_in_pool,
            rank,
        });
        Ok(())
    }

    /// Sorts by descending rank if every entry carries one and the buffer
    /// is past `threshold` in size; below threshold, sorting is skipped as
    /// not worth the cost (§4.4 "sort only if it pays off").
    pub fn sort(&mut self, threshold: usize) {
        if self.entries.len() <= threshold || !self.ranking_capable {
            return;
        }
        self.entries.sort_by(|a, b| {
            b.rank
                .partial_cmp(&a.rank)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Unlocks and returns the top `max` entries (after an implicit
    /// [`Self::sort`]). Losers that aren't marked `keep_in_pool` and are
    /// [`bc_model::ConVarCore::deletable`] once unlocked are soft-deleted
    /// from `pool` (§4.4 "discard the rest").
    pub fn extract(
        &mut self,
        max: usize,
        pool: &mut impl crate::pool::PoolStore<T>,
    ) -> Vec<PoolSlotRef<T>> {
        self.sort(0);
        let take = max.min(self.entries.len());
        let losers = self.entries.split_off(take);
        let winners = std::mem::take(&mut self.entries);

        let mut kept = Vec::with_capacity(winners.len());
        for entry in winners {
            entry.slot_ref.with_mut(|item| item.core_mut().unlock());
            kept.push(entry.slot_ref);
        }
        for entry in losers {
            entry.slot_ref.with_mut(|item| item.core_mut().unlock());
            if !entry.keep_in_pool {
                let deletable = entry
                    .slot_ref
                    .with(|item| item.core().deletable())
                    .unwrap_or(false);
                if deletable {
                    pool.soft_delete(entry.slot_ref.slot());
                }
            }
        }
        kept
    }
}

impl<T: HasConVarCore> Drop for CutBuffer<T> {
    fn drop(&mut self) {
        for entry in &self.entries {
            entry.slot_ref.with_mut(|item| item.core_mut().unlock());
        }
    }
}

#[cfg(test)]
mod tests {
    use bc_model::ConVarCore;

    use super::*;
    use crate::{pool::StandardPool, slot::PoolSlot};

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
    fn insert_locks_and_errors_past_capacity() {
        let mut buf: CutBuffer<Item> = CutBuffer::new(1);
        let r = make_ref();
        assert!(r.with(|it| it.core().n_locks()).unwrap() == 0);
        buf.insert(r.clone(), false, Some(1.0)).unwrap();
        assert_eq!(r.with(|it| it.core().n_locks()).unwrap(), 1);
        assert!(buf.insert(make_ref(), false, Some(2.0)).is_err());
    }

    #[test]
    fn extract_orders_by_rank_and_unlocks_winners() {
        let mut pool: StandardPool<Item> = StandardPool::new(4);
        let mut buf: CutBuffer<Item> = CutBuffer::new(4);
        let r_low = make_ref();
        let r_high = make_ref();
        buf.insert(r_low.clone(), true, Some(1.0)).unwrap();
        buf.insert(r_high.clone(), true, Some(5.0)).unwrap();
        let winners = buf.extract(1, &mut pool);
        assert_eq!(winners.len(), 1);
        assert_eq!(
            winners[0].slot_index(),
            r_high.slot_index()
        );
        assert_eq!(r_high.with(|it| it.core().n_locks()).unwrap(), 0);
    }

    #[test]
    fn extract_soft_deletes_discarded_non_pool_items() {
        let mut pool: StandardPool<Item> = StandardPool::new(4);
        let handle = pool.insert(Item(ConVarCore::new(None, true, false))).unwrap();
        let r = PoolSlotRef::new(handle.clone());
        let mut buf: CutBuffer<Item> = CutBuffer::new(4);
        buf.insert(r.clone(), false, Some(1.0)).unwrap();
        drop(r);
        buf.extract(0, &mut pool);
        assert!(handle.borrow().is_empty());
    }
}
