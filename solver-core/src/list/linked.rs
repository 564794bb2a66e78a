//! Linked list over a slot arena.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use slab::Slab;
use thiserror::Error;

/// Unique identifier for a list instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(u64);

impl ListId {
    /// Generate a new unique list ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListId {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque position of one element inside a [`LinkedList`].
///
/// Handles are cheap to copy. They stay valid until the element they point
/// at is removed; after that every operation using them fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    list: ListId,
    slot: usize,
    generation: u64,
}

impl Handle {
    /// The list that issued this handle.
    pub fn list_id(&self) -> ListId {
        self.list
    }
}

/// Errors raised by handle-based list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ListError {
    /// The handle was issued by a different list.
    #[error("handle belongs to list {handle:?}, not {list:?}")]
    ForeignHandle {
        /// List that issued the handle.
        handle: ListId,
        /// List the operation was attempted on.
        list: ListId,
    },

    /// The element behind the handle was already removed.
    #[error("handle refers to an element that is no longer in the list")]
    StaleHandle,
}

struct Slot<T> {
    value: T,
    prev: Option<usize>,
    next: Option<usize>,
    generation: u64,
}

/// Doubly linked list with O(1) insertion at either end, O(1) insertion next
/// to an existing element, and O(1) removal by [`Handle`].
pub struct LinkedList<T> {
    id: ListId,
    slots: Slab<Slot<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    /// Bumped on every insertion so reused slots never match old handles.
    generation: u64,
}

impl<T> LinkedList<T> {
    /// Create a new empty list.
    pub fn new() -> Self {
        Self {
            id: ListId::new(),
            slots: Slab::new(),
            head: None,
            tail: None,
            generation: 0,
        }
    }

    /// Get the list's ID.
    pub fn id(&self) -> ListId {
        self.id
    }

    /// Number of elements in the list.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the list holds no elements.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Insert a value at the front.
    pub fn push_front(&mut self, value: T) -> Handle {
        let slot = self.allocate(value);
        self.link_between(slot, None, self.head);
        self.handle(slot)
    }

    /// Insert a value at the back.
    pub fn push_back(&mut self, value: T) -> Handle {
        let slot = self.allocate(value);
        self.link_between(slot, self.tail, None);
        self.handle(slot)
    }

    /// Insert a value immediately before the element behind `at`.
    pub fn insert_before(&mut self, at: Handle, value: T) -> Result<Handle, ListError> {
        let anchor = self.resolve(at)?;
        let prev = self.slots[anchor].prev;
        let slot = self.allocate(value);
        self.link_between(slot, prev, Some(anchor));
        Ok(self.handle(slot))
    }

    /// Insert a value immediately after the element behind `at`.
    pub fn insert_after(&mut self, at: Handle, value: T) -> Result<Handle, ListError> {
        let anchor = self.resolve(at)?;
        let next = self.slots[anchor].next;
        let slot = self.allocate(value);
        self.link_between(slot, Some(anchor), next);
        Ok(self.handle(slot))
    }

    /// Detach the element behind `handle` and return its value.
    pub fn remove(&mut self, handle: Handle) -> Result<T, ListError> {
        let slot = self.resolve(handle)?;
        let removed = self.slots.remove(slot);

        match removed.prev {
            Some(prev) => self.slots[prev].next = removed.next,
            None => self.head = removed.next,
        }
        match removed.next {
            Some(next) => self.slots[next].prev = removed.prev,
            None => self.tail = removed.prev,
        }

        Ok(removed.value)
    }

    /// Check if `handle` still points at an element of this list.
    pub fn contains(&self, handle: Handle) -> bool {
        self.resolve(handle).is_ok()
    }

    /// Borrow the element behind `handle`.
    pub fn get(&self, handle: Handle) -> Result<&T, ListError> {
        let slot = self.resolve(handle)?;
        Ok(&self.slots[slot].value)
    }

    /// First element, if any.
    pub fn front(&self) -> Option<&T> {
        self.head.map(|slot| &self.slots[slot].value)
    }

    /// Last element, if any.
    pub fn back(&self) -> Option<&T> {
        self.tail.map(|slot| &self.slots[slot].value)
    }

    /// Remove and return the first element.
    pub fn pop_front(&mut self) -> Option<T> {
        let slot = self.head?;
        let handle = self.handle(slot);
        self.remove(handle).ok()
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    /// Iterate over the values in list order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
            remaining: self.len(),
        }
    }

    fn allocate(&mut self, value: T) -> usize {
        self.generation += 1;
        self.slots.insert(Slot {
            value,
            prev: None,
            next: None,
            generation: self.generation,
        })
    }

    fn link_between(&mut self, slot: usize, prev: Option<usize>, next: Option<usize>) {
        self.slots[slot].prev = prev;
        self.slots[slot].next = next;

        match prev {
            Some(prev) => self.slots[prev].next = Some(slot),
            None => self.head = Some(slot),
        }
        match next {
            Some(next) => self.slots[next].prev = Some(slot),
            None => self.tail = Some(slot),
        }
    }

    fn handle(&self, slot: usize) -> Handle {
        Handle {
            list: self.id,
            slot,
            generation: self.slots[slot].generation,
        }
    }

    fn resolve(&self, handle: Handle) -> Result<usize, ListError> {
        if handle.list != self.id {
            return Err(ListError::ForeignHandle {
                handle: handle.list,
                list: self.id,
            });
        }

        match self.slots.get(handle.slot) {
            Some(slot) if slot.generation == handle.generation => Ok(handle.slot),
            _ => Err(ListError::StaleHandle),
        }
    }
}

impl<T> Default for LinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for LinkedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over the values of a [`LinkedList`], front to back.
pub struct Iter<'a, T> {
    list: &'a LinkedList<T>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor?;
        let entry = &self.list.slots[slot];
        self.cursor = entry.next;
        self.remaining -= 1;
        Some(&entry.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a LinkedList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
