//! Epoch-based reclamation for `frlist-core` lists.
//!
//! This crate provides `EpochGuard`, an implementation of the `Guard` trait
//! on top of crossbeam-epoch. It is the guard to use outside of tests: removed
//! nodes are freed once every thread pinned at removal time has moved on.
//!
//! # Usage
//!
//! ```
//! use frlist_core::ConcurrentOrderedList;
//! use frlist_crossbeam::EpochGuard;
//!
//! let list: ConcurrentOrderedList<i32, EpochGuard> = ConcurrentOrderedList::new();
//! assert_eq!(list.insert(42), Ok(true));
//! assert!(list.contains(&42));
//! ```

pub mod epoch_guard;

pub use epoch_guard::{EpochGuard, EpochRef};
