//! Handle-Addressed Linked List
//!
//! This module implements the ordered container used for the solver's
//! waiting set.
//!
//! # Overview
//!
//! The solver must evict an arbitrary waiting node the moment its last
//! dependency resolves. A `VecDeque` would need an O(n) scan to find it, so
//! instead every insertion hands back a [`Handle`] that later removes the
//! element in O(1).
//!
//! # Design Decisions
//!
//! 1. Elements live in a slot arena (`slab::Slab`) rather than behind raw
//!    pointers. Links are slot indices, and vacated slots are reused through
//!    the slab's free list.
//!
//! 2. A handle carries the id of the list that issued it and a generation
//!    number. Removing with a handle from another list, or with a handle whose
//!    element was already removed (even if the slot was since reused), is
//!    reported as an error instead of corrupting the list.
//!
//! 3. There is no random access. Iteration follows the links, so it yields
//!    insertion order unless elements were placed with `insert_before` or
//!    `insert_after`.

mod linked;

pub use linked::{Handle, Iter, LinkedList, ListError, ListId};
