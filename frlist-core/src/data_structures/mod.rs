//! Data structures for concurrent collections.
//!
//! # Organization
//!
//! - [`list`] - Lock-free ordered list (ConcurrentOrderedList) and its node types
//! - [`internal`] - Internal implementation details (pub(crate))

pub(crate) mod internal;
pub mod list;

pub use list::{ConcurrentOrderedList, Iter, KeyBounds, ListNode};
