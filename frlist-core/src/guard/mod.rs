//! Guard trait for memory reclamation strategies.
//!
//! Removed nodes stay reachable for a while: other threads may still be standing on
//! them, or following their backlinks. The list therefore never frees a node it
//! unlinked. It retires the node to a [`Guard`], which frees it once no reader can
//! observe it.
//!
//! # Design
//!
//! ```text
//! ConcurrentOrderedList<K, G: Guard>
//!     │
//!     ├── ConcurrentOrderedList<K, EpochGuard>      (production, frlist-crossbeam)
//!     └── ConcurrentOrderedList<K, DeferredGuard>   (testing, frees on drop)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use frlist_core::{ConcurrentOrderedList, DeferredGuard};
//!
//! let list: ConcurrentOrderedList<i32, DeferredGuard> = ConcurrentOrderedList::new();
//! list.insert(42).unwrap();
//! let removed = list.remove(&42).unwrap();
//! assert_eq!(*removed.key(), 42);
//! ```

mod deferred_guard;

use std::ops::Deref;

pub use deferred_guard::{DeferredGuard, DeferredRef};

/// A memory reclamation guard that protects concurrent access to nodes.
///
/// # Safety Contract
///
/// Implementations must ensure:
/// 1. Nodes passed to `defer_destroy` are not freed while a `ReadGuard` pinned
///    before the call is alive
/// 2. `GuardedRef` keeps the referenced data valid for its lifetime
///
/// Guards are stored in lists shared across threads and must be `Send + Sync + 'static`. The stored guard only
/// schedules destruction; pinning happens per operation through [`Guard::pin`].
///
pub trait Guard: Sized + Default + Send + Sync + 'static {
    /// A reference protected by a guard of this type.
    type GuardedRef<'a, T: 'a>: Deref<Target = T>;

    /// An active guard that protects reads for its lifetime.
    ///
    /// For epoch-based guards this is a pinned `crossbeam_epoch::Guard`; for
    /// deferred guards it is `()`.
    type ReadGuard: Sized;

    /// Pin an active read guard for the duration of one list operation.
    fn pin() -> Self::ReadGuard;

    /// Schedule a node for deferred destruction.
    ///
    /// # Safety
    ///
    /// - `node` must be a valid pointer previously allocated for the list
    /// - `node` must be unlinked (not reachable from the head sentinel)
    /// - `node` must not be retired twice
    /// - `dealloc` must be the correct deallocation function for `node`
    unsafe fn defer_destroy<N>(&self, node: *mut N, dealloc: unsafe fn(*mut N));

    /// Create a guarded reference from a raw pointer.
    ///
    /// # Safety
    ///
    /// - `ptr` must point to valid data protected by some guard
    /// - The data must remain valid for lifetime `'a`
    unsafe fn make_ref<'a, T: 'a>(ptr: *const T) -> Self::GuardedRef<'a, T>;
}
