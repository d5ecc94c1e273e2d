//! Lock-free ordered list after Fomitchev and Ruppert.
//!
//! The list is parameterized by a guard type `G: Guard` that determines the
//! memory reclamation strategy for removed nodes:
//!
//! - `DeferredGuard`: Testing - frees removed nodes when the list drops
//! - `EpochGuard`: Production - epoch-based reclamation (frlist-crossbeam)

pub mod backlink_protocol;
pub mod key_bounds;
pub mod list_node;
pub mod ordered_list;
pub(crate) mod search_window;

pub use key_bounds::KeyBounds;
pub use list_node::ListNode;
pub use ordered_list::{ConcurrentOrderedList, Iter};
