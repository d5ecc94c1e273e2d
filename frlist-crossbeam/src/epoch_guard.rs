//! Epoch-based guard implementation using crossbeam-epoch.
//!
//! # Design
//!
//! `EpochGuard` is a zero-sized type that schedules destruction using the global
//! epoch collector. Every list operation pins the calling thread through
//! [`Guard::pin`], so a node retired by `remove` stays allocated while any thread
//! that could still be standing on it, or following a backlink into it, is pinned:
//!
//! ```text
//! ConcurrentOrderedList<i32, EpochGuard>
//!     │
//!     ├── add / remove / contains pin for their whole traversal
//!     └── remove retires the node through defer_destroy
//! ```
//!
//! # Example
//!
//! ```rust
//! use frlist_core::ConcurrentOrderedList;
//! use frlist_crossbeam::EpochGuard;
//!
//! let list: ConcurrentOrderedList<i32, EpochGuard> = ConcurrentOrderedList::new();
//!
//! list.insert(42).unwrap();
//! list.insert(17).unwrap();
//!
//! // The returned node stays valid for as long as the reference is held
//! let removed = list.remove(&42).unwrap();
//! assert_eq!(*removed.key(), 42);
//!
//! assert_eq!(list.to_vec(), vec![17]);
//! ```

use crossbeam_epoch::{self as epoch, Guard as CrossbeamGuard};
use frlist_core::guard::Guard;
use std::ops::Deref;

/// Epoch-based memory reclamation guard.
///
/// Unlike `DeferredGuard`, which keeps every retired node until it is dropped,
/// `EpochGuard` hands nodes to the global collector. Memory stays bounded for
/// long-running lists, and the guard itself carries no state.
///
/// When `defer_destroy` is called, it:
/// 1. Pins the current thread to the current epoch
/// 2. Schedules the deallocation to run after all pinned threads have advanced
/// 3. Unpins immediately
///
#[derive(Clone, Copy, Default)]
pub struct EpochGuard {
    // Zero-sized - all state is in the global epoch collector
}

impl EpochGuard {
    pub fn new() -> Self {
        EpochGuard {}
    }
}

/// A node reference kept alive by its own epoch pin.
///
/// The pin is taken before the node is retired, so the node cannot be freed
/// until the `EpochRef` is dropped.
///
pub struct EpochRef<'a, T> {
    _guard: CrossbeamGuard,
    reference: &'a T,
}

impl<'a, T> EpochRef<'a, T> {
    /// # Safety
    ///
    /// `reference` must stay allocated while `guard` is pinned.
    pub(crate) unsafe fn new(guard: CrossbeamGuard, reference: &'a T) -> Self {
        EpochRef {
            _guard: guard,
            reference,
        }
    }

    pub fn get(&self) -> &T {
        self.reference
    }
}

impl<T> Deref for EpochRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.reference
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for EpochRef<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EpochRef({:?})", self.reference)
    }
}

impl Guard for EpochGuard {
    type GuardedRef<'a, T: 'a> = EpochRef<'a, T>;

    /// A pinned crossbeam guard, held for the length of one list operation.
    type ReadGuard = CrossbeamGuard;

    fn pin() -> Self::ReadGuard {
        epoch::pin()
    }

    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N)) {
        let guard = epoch::pin();
        unsafe {
            guard.defer_unchecked(move || {
                dealloc(node);
            });
        }
    }

    unsafe fn make_ref<'a, T: 'a>(ptr: *const T) -> Self::GuardedRef<'a, T> {
        let new_guard = epoch::pin();
        unsafe { EpochRef::new(new_guard, &*ptr) }
    }
}
