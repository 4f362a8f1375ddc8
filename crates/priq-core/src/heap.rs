//! PriorityHeap - array-backed binary max-heap over a slot table.
//!
//! Items live in a slot table; the heap array only stores slot ids. Each
//! occupied slot records its current position in the heap array, which is
//! what makes `fix`, `update` and `remove` O(log n) without back-pointers.
//!
//! # Ordering Rules
//!
//! 1. Higher priority comes first
//! 2. For equal priority, earlier pushes come first (FIFO within priority)
//!
//! No synchronization here; `BlockingPriorityQueue` serializes access.

use crate::item::{Item, ItemKey};

#[derive(Debug)]
struct Entry<T> {
    item: Item<T>,
    /// Insertion order, consulted only when priorities tie.
    seq: u64,
    /// Position of this entry's slot id inside `PriorityHeap::order`.
    heap_index: usize,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    entry: Option<Entry<T>>,
}

/// Binary max-heap of `Item`s keyed by priority.
///
/// # Example
///
/// ```
/// use priq_core::{Item, PriorityHeap};
///
/// let mut heap = PriorityHeap::new();
/// heap.push(Item::new("low", 1));
/// let key = heap.push(Item::new("mid", 3));
/// heap.push(Item::new("high", 5));
///
/// // Bump "mid" above everything else.
/// heap.update(key, 10);
///
/// assert_eq!(heap.pop().unwrap().value, "mid");
/// assert_eq!(heap.pop().unwrap().value, "high");
/// assert_eq!(heap.pop().unwrap().value, "low");
/// assert!(heap.pop().is_none());
/// ```
#[derive(Debug)]
pub struct PriorityHeap<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    order: Vec<usize>,
    next_seq: u64,
}

impl<T> Default for PriorityHeap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PriorityHeap<T> {
    /// Creates an empty heap.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty heap with room for `capacity` items.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            order: Vec::with_capacity(capacity),
            next_seq: 0,
        }
    }

    /// Number of items in the heap.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the heap holds no items.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Adds an item, returning a key that addresses it while it stays queued.
    pub fn push(&mut self, item: Item<T>) -> ItemKey {
        let seq = self.next_seq;
        self.next_seq += 1;

        let heap_index = self.order.len();
        let entry = Entry {
            item,
            seq,
            heap_index,
        };

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot].entry = Some(entry);
                slot
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                self.slots.len() - 1
            }
        };

        self.order.push(slot);
        self.sift_up(heap_index);

        ItemKey {
            slot,
            generation: self.slots[slot].generation,
        }
    }

    /// Removes and returns the highest-priority item.
    ///
    /// Returns `None` on an empty heap.
    pub fn pop(&mut self) -> Option<Item<T>> {
        self.remove_at(0)
    }

    /// Returns the highest-priority item without removing it.
    pub fn peek(&self) -> Option<&Item<T>> {
        self.entry_at(0).map(|entry| &entry.item)
    }

    /// Returns the item addressed by `key`, if it is still queued.
    pub fn get(&self, key: ItemKey) -> Option<&Item<T>> {
        self.entry(key).map(|entry| &entry.item)
    }

    /// Mutable access to a queued item.
    ///
    /// Changing `priority` through this reference breaks heap order until
    /// `fix(key)` is called.
    pub fn get_mut(&mut self, key: ItemKey) -> Option<&mut Item<T>> {
        self.entry_mut(key).map(|entry| &mut entry.item)
    }

    /// Returns true if `key` still addresses a queued item.
    pub fn contains(&self, key: ItemKey) -> bool {
        self.entry(key).is_some()
    }

    /// Re-establishes heap order after the item's priority was changed.
    ///
    /// Returns false for a stale key.
    pub fn fix(&mut self, key: ItemKey) -> bool {
        let Some(index) = self.entry(key).map(|entry| entry.heap_index) else {
            return false;
        };
        self.restore(index);
        true
    }

    /// Sets a new priority for a queued item and restores heap order.
    ///
    /// Returns the previous priority, or `None` for a stale key.
    pub fn update(&mut self, key: ItemKey, priority: i64) -> Option<i64> {
        let entry = self.entry_mut(key)?;
        let previous = std::mem::replace(&mut entry.item.priority, priority);
        let index = entry.heap_index;
        self.restore(index);
        Some(previous)
    }

    /// Removes an arbitrary queued item.
    pub fn remove(&mut self, key: ItemKey) -> Option<Item<T>> {
        let index = self.entry(key)?.heap_index;
        self.remove_at(index)
    }

    /// Removes every item. Outstanding keys go stale.
    pub fn clear(&mut self) {
        while let Some(slot) = self.order.pop() {
            self.release(slot);
        }
    }

    fn entry(&self, key: ItemKey) -> Option<&Entry<T>> {
        let slot = self.slots.get(key.slot)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, key: ItemKey) -> Option<&mut Entry<T>> {
        let slot = self.slots.get_mut(key.slot)?;
        if slot.generation != key.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    fn entry_at(&self, index: usize) -> Option<&Entry<T>> {
        let slot = *self.order.get(index)?;
        self.slots.get(slot)?.entry.as_ref()
    }

    fn remove_at(&mut self, index: usize) -> Option<Item<T>> {
        if index >= self.order.len() {
            return None;
        }
        let last = self.order.len() - 1;
        self.swap(index, last);
        let slot = self.order.pop()?;
        let entry = self.release(slot)?;

        if index < self.order.len() {
            self.restore(index);
        }
        Some(entry.item)
    }

    /// Empties a slot and bumps its generation so old keys go stale.
    fn release(&mut self, slot: usize) -> Option<Entry<T>> {
        let cell = self.slots.get_mut(slot)?;
        let entry = cell.entry.take()?;
        cell.generation = cell.generation.wrapping_add(1);
        self.free.push(slot);
        Some(entry)
    }

    /// Moves the entry at `index` up or down until order holds.
    fn restore(&mut self, index: usize) {
        if !self.sift_up(index) {
            self.sift_down(index);
        }
    }

    /// True if the entry at heap position `a` must sit above the one at `b`.
    fn outranks(&self, a: usize, b: usize) -> bool {
        match (self.entry_at(a), self.entry_at(b)) {
            (Some(a), Some(b)) => {
                a.item.priority > b.item.priority
                    || (a.item.priority == b.item.priority && a.seq < b.seq)
            }
            _ => false,
        }
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.order.swap(i, j);
        self.sync_index(i);
        self.sync_index(j);
    }

    fn sync_index(&mut self, index: usize) {
        let slot = self.order[index];
        if let Some(entry) = self.slots[slot].entry.as_mut() {
            entry.heap_index = index;
        }
    }

    /// Returns true if the entry moved.
    fn sift_up(&mut self, mut index: usize) -> bool {
        let start = index;
        while index > 0 {
            let parent = (index - 1) / 2;
            if !self.outranks(index, parent) {
                break;
            }
            self.swap(index, parent);
            index = parent;
        }
        index != start
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.order.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let best = if right < len && self.outranks(right, left) {
                right
            } else {
                left
            };
            if !self.outranks(best, index) {
                break;
            }
            self.swap(index, best);
            index = best;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_heap_invariants<T>(heap: &PriorityHeap<T>) {
        for (index, &slot) in heap.order.iter().enumerate() {
            let entry = heap.slots[slot].entry.as_ref().unwrap();
            assert_eq!(entry.heap_index, index, "heap_index out of sync");
            if index > 0 {
                let parent = heap.entry_at((index - 1) / 2).unwrap();
                assert!(parent.item.priority >= entry.item.priority);
            }
        }
        let occupied = heap.slots.iter().filter(|s| s.entry.is_some()).count();
        assert_eq!(occupied, heap.len());
    }

    fn drain_priorities<T>(heap: &mut PriorityHeap<T>) -> Vec<i64> {
        let mut out = Vec::new();
        while let Some(item) = heap.pop() {
            assert_heap_invariants(heap);
            out.push(item.priority);
        }
        out
    }

    fn push_all(heap: &mut PriorityHeap<String>, priorities: &[i64]) {
        for &p in priorities {
            heap.push(Item::new(format!("Item{}", p), p));
            assert_heap_invariants(heap);
        }
    }

    #[test]
    fn test_pop_descending_for_any_input_order() {
        let expected: Vec<i64> = (1..=10).rev().collect();
        let inputs: [&[i64]; 3] = [
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            &[10, 9, 8, 7, 6, 5, 4, 3, 2, 1],
            &[3, 7, 1, 10, 5, 6, 2, 9, 8, 4],
        ];

        for input in inputs {
            let mut heap = PriorityHeap::new();
            push_all(&mut heap, input);
            assert_eq!(heap.len(), 10);

            let values: Vec<String> = std::iter::from_fn(|| heap.pop())
                .map(|item| item.value)
                .collect();
            let expected_values: Vec<String> =
                expected.iter().map(|p| format!("Item{}", p)).collect();
            assert_eq!(values, expected_values);
        }
    }

    #[test]
    fn test_interleaved_push_pop_independent_of_first_batch_order() {
        let first_batches: [&[i64]; 3] = [&[5, 3, 8, 1, 7], &[1, 3, 5, 7, 8], &[8, 7, 5, 3, 1]];

        for batch in first_batches {
            let mut heap = PriorityHeap::new();
            push_all(&mut heap, batch);

            let first: Vec<i64> = (0..3).map(|_| heap.pop().unwrap().priority).collect();
            assert_eq!(first, vec![8, 7, 5]);

            push_all(&mut heap, &[4, 9, 2]);
            assert_eq!(drain_priorities(&mut heap), vec![9, 4, 3, 2, 1]);
        }
    }

    #[test]
    fn test_pop_empty() {
        let mut heap: PriorityHeap<()> = PriorityHeap::new();
        assert!(heap.pop().is_none());
        assert!(heap.peek().is_none());
        assert!(heap.is_empty());
    }

    #[test]
    fn test_fifo_within_priority() {
        let mut heap = PriorityHeap::new();
        heap.push(Item::new("first", 2));
        heap.push(Item::new("other", 1));
        heap.push(Item::new("second", 2));
        heap.push(Item::new("third", 2));

        assert_eq!(heap.pop().unwrap().value, "first");
        assert_eq!(heap.pop().unwrap().value, "second");
        assert_eq!(heap.pop().unwrap().value, "third");
        assert_eq!(heap.pop().unwrap().value, "other");
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut heap = PriorityHeap::new();
        heap.push(Item::new("low", 1));
        heap.push(Item::new("high", 5));

        assert_eq!(heap.peek().unwrap().value, "high");
        assert_eq!(heap.peek().unwrap().value, "high");
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn test_update_raises_and_lowers() {
        let mut heap = PriorityHeap::new();
        let a = heap.push(Item::new("a", 1));
        heap.push(Item::new("b", 5));
        let c = heap.push(Item::new("c", 9));

        assert_eq!(heap.update(a, 20), Some(1));
        assert_heap_invariants(&heap);
        assert_eq!(heap.peek().unwrap().value, "a");

        assert_eq!(heap.update(c, 0), Some(9));
        assert_heap_invariants(&heap);

        let order: Vec<&str> = std::iter::from_fn(|| heap.pop()).map(|i| i.value).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fix_after_external_mutation() {
        let mut heap = PriorityHeap::new();
        heap.push(Item::new("a", 4));
        let b = heap.push(Item::new("b", 2));
        heap.push(Item::new("c", 3));

        heap.get_mut(b).unwrap().priority = 7;
        assert!(heap.fix(b));
        assert_heap_invariants(&heap);
        assert_eq!(heap.pop().unwrap().value, "b");
    }

    #[test]
    fn test_remove_arbitrary_item() {
        let mut heap = PriorityHeap::new();
        let keys: Vec<ItemKey> = (1..=8).map(|p| heap.push(Item::new(p, p))).collect();

        let removed = heap.remove(keys[4]).unwrap();
        assert_eq!(removed.value, 5);
        assert_heap_invariants(&heap);
        assert!(!heap.contains(keys[4]));
        assert_eq!(drain_priorities(&mut heap), vec![8, 7, 6, 4, 3, 2, 1]);
    }

    #[test]
    fn test_stale_key_after_pop() {
        let mut heap = PriorityHeap::new();
        let key = heap.push(Item::new("gone", 1));
        heap.pop().unwrap();

        assert!(heap.get(key).is_none());
        assert!(!heap.fix(key));
        assert_eq!(heap.update(key, 3), None);
        assert!(heap.remove(key).is_none());
    }

    #[test]
    fn test_stale_key_does_not_alias_reused_slot() {
        let mut heap = PriorityHeap::new();
        let old = heap.push(Item::new("old", 1));
        heap.pop().unwrap();

        let new = heap.push(Item::new("new", 2));
        assert_eq!(old.slot, new.slot);
        assert_ne!(old, new);

        assert!(heap.get(old).is_none());
        assert_eq!(heap.update(old, 100), None);
        assert_eq!(heap.get(new).unwrap().priority, 2);
    }

    #[test]
    fn test_clear_invalidates_keys() {
        let mut heap = PriorityHeap::new();
        let key = heap.push(Item::new("x", 1));
        heap.push(Item::new("y", 2));

        heap.clear();
        assert!(heap.is_empty());
        assert!(!heap.contains(key));

        heap.push(Item::new("z", 3));
        assert_heap_invariants(&heap);
        assert_eq!(heap.pop().unwrap().value, "z");
    }

    #[test]
    fn test_negative_priorities() {
        let mut heap = PriorityHeap::new();
        push_all(&mut heap, &[-5, 0, -1, 3, i64::MIN, i64::MAX]);
        assert_eq!(
            drain_priorities(&mut heap),
            vec![i64::MAX, 3, 0, -1, -5, i64::MIN]
        );
    }

    #[test]
    fn test_many_random_operations_keep_invariants() {
        // Deterministic pseudo-random sequence (LCG).
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            (state >> 33) as i64
        };

        let mut heap = PriorityHeap::new();
        let mut keys = Vec::new();
        for round in 0..500 {
            match next() % 4 {
                0 | 1 => keys.push(heap.push(Item::new(round, next() % 50))),
                2 => {
                    heap.pop();
                }
                _ => {
                    if let Some(&key) = keys.get((next() as usize) % keys.len().max(1)) {
                        heap.update(key, next() % 50);
                    }
                }
            }
            assert_heap_invariants(&heap);
        }

        let drained = drain_priorities(&mut heap);
        assert!(drained.windows(2).all(|w| w[0] >= w[1]));
    }
}
