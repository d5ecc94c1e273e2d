//! Test suites shared by every [`Guard`](crate::Guard) implementation.
//!
//! Each suite is generic over the guard, so `frlist-core` runs them with
//! `DeferredGuard` and `frlist-crossbeam` runs the same code with `EpochGuard`.

pub mod ordered_list_stress_tests;
