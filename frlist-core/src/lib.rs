//! Lock-free ordered list after Fomitchev and Ruppert, with pluggable memory
//! reclamation.
//!
//! ```rust
//! use frlist_core::{ConcurrentOrderedList, DeferredGuard, ListNode};
//!
//! let list: ConcurrentOrderedList<i32, DeferredGuard> = ConcurrentOrderedList::new();
//!
//! assert_eq!(list.add(ListNode::boxed(7)), Ok(true));
//! assert_eq!(list.add(ListNode::boxed(7)), Ok(false));
//! assert!(list.contains(&7));
//!
//! let removed = list.remove(&7).unwrap();
//! assert_eq!(*removed.key(), 7);
//! assert!(!list.contains(&7));
//! ```

pub mod common_tests;
pub mod data_structures;
pub mod error;
pub mod guard;

pub use data_structures::{ConcurrentOrderedList, Iter, KeyBounds, ListNode};
pub use error::ListError;
// Re-export guard types for convenience
pub use guard::{DeferredGuard, DeferredRef, Guard};

/*

cargo llvm-cov --html

sudo CARGO_PROFILE_RELEASE_DEBUG=true cargo flamegraph --bench ordered_list_benchmark --root --

*/
