use std::cmp::Ordering as KeyOrdering;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

use crate::data_structures::internal::{Link, TaggedLink};

pub(crate) type NodePtr<K> = *mut ListNode<K>;

/// Key slot of a node. Sentinels sort strictly outside every real key.
///
enum NodeKey<K> {
    Head,
    Key(K),
    Tail,
}

/// A node of a [`ConcurrentOrderedList`](super::ConcurrentOrderedList).
///
/// Nodes are created by the caller and handed to the list with
/// [`add`](super::ConcurrentOrderedList::add). After that only two fields ever change:
/// `next`, through CAS, and `backlink`, written by deletion helpers.
///
pub struct ListNode<K> {
    key: NodeKey<K>,
    /// Predecessor hint for threads that lose a race against this node's removal.
    /// Only meaningful once `next` carries the deletion mark.
    backlink: AtomicPtr<ListNode<K>>,
    next: TaggedLink<ListNode<K>>,
}

impl<K> ListNode<K> {
    pub fn new(key: K) -> Self {
        Self::with_key(NodeKey::Key(key))
    }

    /// Allocate a node ready to be passed to `add`.
    pub fn boxed(key: K) -> Box<Self> {
        Box::new(Self::new(key))
    }

    pub(crate) fn new_head() -> Self {
        Self::with_key(NodeKey::Head)
    }

    pub(crate) fn new_tail() -> Self {
        Self::with_key(NodeKey::Tail)
    }

    fn with_key(key: NodeKey<K>) -> Self {
        ListNode {
            key,
            backlink: AtomicPtr::new(ptr::null_mut()),
            next: TaggedLink::new(Link::clean(ptr::null_mut())),
        }
    }

    pub fn key(&self) -> &K {
        match &self.key {
            NodeKey::Key(key) => key,
            // Sentinels stay private to the list
            NodeKey::Head | NodeKey::Tail => unreachable!("sentinel nodes have no key"),
        }
    }

    pub(crate) fn is_sentinel(&self) -> bool {
        !matches!(self.key, NodeKey::Key(_))
    }

    /// Deallocate a node created with `Box`.
    ///
    /// # Safety
    /// - `ptr` must come from `Box::into_raw`
    /// - Must only be called once, with no thread still able to read the node
    pub(crate) unsafe fn dealloc_ptr(ptr: NodePtr<K>) {
        unsafe { drop(Box::from_raw(ptr)) };
    }

    // =========================================================================
    // Link accessors
    // =========================================================================

    #[inline]
    pub(crate) fn next(&self) -> &TaggedLink<ListNode<K>> {
        &self.next
    }

    /// Load backlink (Acquire ordering)
    #[inline]
    pub(crate) fn backlink(&self) -> NodePtr<K> {
        self.backlink.load(Ordering::Acquire)
    }

    /// Store backlink (Release ordering), published by the deletion mark CAS that follows.
    #[inline]
    pub(crate) fn set_backlink(&self, prev: NodePtr<K>) {
        self.backlink.store(prev, Ordering::Release)
    }
}

impl<K: Ord> ListNode<K> {
    /// Compare this node's key against `key`, with sentinels at the extremes.
    #[inline]
    pub(crate) fn cmp_key(&self, key: &K) -> KeyOrdering {
        match &self.key {
            NodeKey::Head => KeyOrdering::Less,
            NodeKey::Key(own) => own.cmp(key),
            NodeKey::Tail => KeyOrdering::Greater,
        }
    }

    #[inline]
    pub(crate) fn has_key(&self, key: &K) -> bool {
        self.cmp_key(key) == KeyOrdering::Equal
    }
}

impl<K: std::fmt::Debug> std::fmt::Debug for ListNode<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let link = self.next.load();
        let mut node = f.debug_struct("ListNode");
        match &self.key {
            NodeKey::Head => node.field("key", &"-inf"),
            NodeKey::Key(key) => node.field("key", key),
            NodeKey::Tail => node.field("key", &"+inf"),
        };
        node.field("successor_flag", &link.is_successor_flagged())
            .field("deletion_mark", &link.is_deletion_marked())
            .finish()
    }
}
