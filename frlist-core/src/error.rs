use thiserror::Error;

/// Errors reported to callers of a [`ConcurrentOrderedList`](crate::ConcurrentOrderedList).
///
/// Contention is never reported: lost CAS races are retried internally, a duplicate
/// key on add is `Ok(false)` and a missing key on remove is `None`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListError {
    /// The key does not lie strictly between the list's MIN and MAX bounds.
    #[error("key lies outside the list bounds")]
    KeyOutOfBounds,
    /// MIN was not strictly below MAX when building [`KeyBounds`](crate::KeyBounds).
    #[error("list bounds are empty: MIN must be strictly below MAX")]
    InvalidBounds,
}
