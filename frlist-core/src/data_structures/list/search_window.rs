use std::cmp::Ordering;

use super::list_node::NodePtr;

/// Whether a search may stop on a node equal to the key, or must stop before it.
///
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum SearchBound {
    /// Advance while `next.key <= key`: the window satisfies `pred.key <= key < curr.key`.
    Inclusive,
    /// Advance while `next.key < key`: the window satisfies `pred.key < key <= curr.key`.
    Exclusive,
}

impl SearchBound {
    /// Should the traversal step onto a node comparing to the key as `ordering`?
    #[inline]
    pub(crate) fn admits(self, ordering: Ordering) -> bool {
        match self {
            SearchBound::Inclusive => ordering != Ordering::Greater,
            SearchBound::Exclusive => ordering == Ordering::Less,
        }
    }
}

/// Two adjacent nodes bracketing a key, as observed by one traversal.
///
#[derive(Debug)]
pub(crate) struct SearchWindow<K> {
    pub pred: NodePtr<K>,
    pub curr: NodePtr<K>,
}

// Manual impls to avoid requiring K: Clone/Copy
impl<K> Copy for SearchWindow<K> {}

impl<K> Clone for SearchWindow<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> SearchWindow<K> {
    pub(crate) fn new(pred: NodePtr<K>, curr: NodePtr<K>) -> Self {
        SearchWindow { pred, curr }
    }
}
