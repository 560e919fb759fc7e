//! Index-addressed node storage for channel trees
//!
//! Nodes live in one `Vec` and refer to each other by `NodeId`, so a tree
//! rotation only rewrites indices. Released slots go onto a LIFO free stack
//! and are handed out again by the next allocation.
//!
//! Allocation is fallible (`try_reserve`) and checked up front: a failed
//! `allocate` leaves the arena exactly as it was. Release never allocates,
//! since the free stack always has room for every slot.

use core::mem;
use core::ops::{Index, IndexMut};

use crate::constants::UNLIMITED_ENTRIES;
use crate::error::{SlotError, SlotResult};
use crate::id::NodeId;

enum Slot<T> {
    Occupied(T),
    Vacant,
}

/// Fixed-identity storage with slot reuse
pub struct Arena<T> {
    slots: Vec<Slot<T>>,

    /// LIFO stack of vacant slots; capacity never drops below `slots.len()`
    free_stack: Vec<NodeId>,

    /// Number of occupied slots
    live: usize,

    /// Upper bound on `live`
    max_live: usize,
}

impl<T> Arena<T> {
    /// Create an arena with no entry limit
    pub fn new() -> Self {
        Self::with_limit(UNLIMITED_ENTRIES)
    }

    /// Create an arena that refuses to hold more than `max_live` values
    pub fn with_limit(max_live: usize) -> Self {
        Self {
            slots: Vec::new(),
            free_stack: Vec::new(),
            live: 0,
            max_live,
        }
    }

    /// Store a value, returning its id
    ///
    /// Prefers recently released slots. On failure `value` is dropped and
    /// the arena is unchanged.
    pub fn allocate(&mut self, value: T) -> SlotResult<NodeId> {
        if self.live >= self.max_live {
            return Err(SlotError::AllocationFailure);
        }

        if let Some(id) = self.free_stack.pop() {
            self.slots[id.as_usize()] = Slot::Occupied(value);
            self.live += 1;
            return Ok(id);
        }

        let index = u32::try_from(self.slots.len()).map_err(|_| SlotError::AllocationFailure)?;
        self.slots.try_reserve(1)?;
        let needed = self.slots.len() + 1;
        if self.free_stack.capacity() < needed {
            self.free_stack.try_reserve_exact(needed - self.free_stack.len())?;
        }

        self.slots.push(Slot::Occupied(value));
        self.live += 1;
        Ok(NodeId::new(index))
    }

    /// Take a value out, making its slot reusable
    pub fn release(&mut self, id: NodeId) -> Option<T> {
        let slot = self.slots.get_mut(id.as_usize())?;
        match mem::replace(slot, Slot::Vacant) {
            Slot::Occupied(value) => {
                // capacity reserved in allocate()
                self.free_stack.push(id);
                self.live -= 1;
                Some(value)
            }
            Slot::Vacant => None,
        }
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&T> {
        match self.slots.get(id.as_usize()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut T> {
        match self.slots.get_mut(id.as_usize()) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    /// Borrow two distinct live values mutably
    pub fn pair_mut(&mut self, a: NodeId, b: NodeId) -> Option<(&mut T, &mut T)> {
        let (i, j) = (a.as_usize(), b.as_usize());
        if i == j || i >= self.slots.len() || j >= self.slots.len() {
            return None;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let (head, tail) = self.slots.split_at_mut(hi);
        match (&mut head[lo], &mut tail[0]) {
            (Slot::Occupied(x), Slot::Occupied(y)) => {
                if i < j {
                    Some((x, y))
                } else {
                    Some((y, x))
                }
            }
            _ => None,
        }
    }

    /// Number of live values
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Maximum number of live values
    #[inline]
    pub fn limit(&self) -> usize {
        self.max_live
    }

    /// Number of slots in the free stack
    pub fn free_stack_size(&self) -> usize {
        self.free_stack.len()
    }

    /// Drop every value and return the backing memory
    pub fn clear(&mut self) {
        self.slots = Vec::new();
        self.free_stack = Vec::new();
        self.live = 0;
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, id: NodeId) -> &T {
        match self.get(id) {
            Some(value) => value,
            None => panic!("dangling {:?}", id),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut T {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("dangling {:?}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_sequential() {
        let mut arena = Arena::new();

        let a = arena.allocate("a").unwrap();
        let b = arena.allocate("b").unwrap();
        let c = arena.allocate("c").unwrap();

        assert_eq!(a.as_usize(), 0);
        assert_eq!(b.as_usize(), 1);
        assert_eq!(c.as_usize(), 2);
        assert_eq!(arena.len(), 3);
        assert_eq!(arena[b], "b");
    }

    #[test]
    fn test_release_reuse_lifo() {
        let mut arena = Arena::new();

        let a = arena.allocate(1u32).unwrap();
        let b = arena.allocate(2u32).unwrap();
        assert_eq!(arena.release(a), Some(1));
        assert_eq!(arena.release(b), Some(2));
        assert_eq!(arena.len(), 0);
        assert_eq!(arena.free_stack_size(), 2);

        // Most recently released first
        assert_eq!(arena.allocate(3).unwrap(), b);
        assert_eq!(arena.allocate(4).unwrap(), a);
        assert_eq!(arena[a], 4);
    }

    #[test]
    fn test_double_release() {
        let mut arena = Arena::new();
        let a = arena.allocate(1u8).unwrap();
        assert!(arena.release(a).is_some());
        assert!(arena.release(a).is_none());
        assert!(arena.get(a).is_none());
        assert_eq!(arena.free_stack_size(), 1);
    }

    #[test]
    fn test_limit_exhaustion() {
        let mut arena = Arena::with_limit(2);
        let a = arena.allocate(1u8).unwrap();
        let _b = arena.allocate(2u8).unwrap();

        assert_eq!(arena.allocate(3), Err(SlotError::AllocationFailure));
        assert_eq!(arena.len(), 2);

        arena.release(a);
        assert!(arena.allocate(3).is_ok());
    }

    #[test]
    fn test_pair_mut() {
        let mut arena = Arena::new();
        let a = arena.allocate(10).unwrap();
        let b = arena.allocate(20).unwrap();

        {
            let (x, y) = arena.pair_mut(b, a).unwrap();
            mem::swap(x, y);
        }
        assert_eq!(arena[a], 20);
        assert_eq!(arena[b], 10);

        assert!(arena.pair_mut(a, a).is_none());
        arena.release(b);
        assert!(arena.pair_mut(a, b).is_none());
    }

    #[test]
    fn test_clear() {
        let mut arena = Arena::new();
        for i in 0..16 {
            arena.allocate(i).unwrap();
        }
        arena.clear();
        assert!(arena.is_empty());
        assert_eq!(arena.free_stack_size(), 0);
    }
}
