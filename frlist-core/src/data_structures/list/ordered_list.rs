use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use tracing::Level as LogLevel;

use crate::data_structures::internal::Link;
use crate::error::ListError;
use crate::guard::Guard;

use super::key_bounds::KeyBounds;
use super::list_node::{ListNode, NodePtr};
use super::search_window::{SearchBound, SearchWindow};

///
/// Concurrent ordered list based on Fomitchev and Ruppert's paper
/// 'Lock-Free Linked Lists and Skip Lists' (PODC 2004).
///
/// See [`backlink_protocol`](super::backlink_protocol) for the flag/mark/backlink
/// protocol and the helping rules every operation follows.
///
// MEMORY RECLAMATION
// ==================
// Unlinked nodes are never freed here. The thread whose `remove` wins the successor
// flag retires the node to the list's guard after the unlink is complete, which
// happens exactly once per node. Nodes still linked at drop time are freed by Drop.
//
// =============================================================================
// LIST STRUCTURE
// =============================================================================
//
// ┌──────┐    ┌──────┐    ┌──────┐    ┌──────┐
// │ HEAD │───►│  10  │───►│  20  │───►│ TAIL │───► null
// │ -inf │    │      │    │      │    │ +inf │
// └──────┘    └──────┘    └──────┘    └──────┘
//
// INVARIANTS:
// 1. Keys strictly ascend from HEAD to TAIL (marked nodes aside)
// 2. HEAD and TAIL are never flagged for removal, marked or unlinked
// 3. A flagged link only changes through the unlink CAS
// 4. A marked link never changes
// 5. backlink is stored before the node's mark, so a marked node has a backlink
//
pub struct ConcurrentOrderedList<K, G: Guard> {
    head: NonNull<ListNode<K>>,
    tail: NonNull<ListNode<K>>,
    bounds: Option<KeyBounds<K>>,
    /// Shared guard instance for deferred destruction of removed nodes.
    guard: G,
    _owns: PhantomData<Box<ListNode<K>>>,
}

// Safety: nodes are only shared through atomics; keys are read from many threads
// and moved between threads together with their nodes
unsafe impl<K: Send + Sync, G: Guard> Send for ConcurrentOrderedList<K, G> {}
unsafe impl<K: Send + Sync, G: Guard> Sync for ConcurrentOrderedList<K, G> {}

impl<K, G> ConcurrentOrderedList<K, G>
where
    K: Ord,
    G: Guard,
{
    /// Create an empty list accepting any key.
    pub fn new() -> Self {
        Self::with_optional_bounds(None)
    }

    /// Create an empty list accepting only keys strictly inside `bounds`.
    pub fn with_bounds(bounds: KeyBounds<K>) -> Self {
        Self::with_optional_bounds(Some(bounds))
    }

    fn with_optional_bounds(bounds: Option<KeyBounds<K>>) -> Self {
        let tail = Box::into_raw(Box::new(ListNode::new_tail()));
        let head = Box::new(ListNode::new_head());
        head.next().set(tail, false, false);
        let head = Box::into_raw(head);

        // Safety: both come from Box::into_raw
        unsafe {
            ConcurrentOrderedList {
                head: NonNull::new_unchecked(head),
                tail: NonNull::new_unchecked(tail),
                bounds,
                guard: G::default(),
                _owns: PhantomData,
            }
        }
    }

    pub fn bounds(&self) -> Option<&KeyBounds<K>> {
        self.bounds.as_ref()
    }

    /// Get the shared guard instance for this list.
    pub fn guard(&self) -> &G {
        &self.guard
    }

    #[inline]
    fn head_ptr(&self) -> NodePtr<K> {
        self.head.as_ptr()
    }

    // =========================================================================
    // Public operations
    // =========================================================================

    /// Link a caller-supplied node into the list.
    ///
    /// Returns `Ok(true)` if the node was linked and `Ok(false)` if its key was already
    /// present, in which case the node is dropped.
    pub fn add(&self, node: Box<ListNode<K>>) -> Result<bool, ListError> {
        if let Some(bounds) = &self.bounds {
            if !bounds.contains(node.key()) {
                tracing::event!(LogLevel::DEBUG, "rejected key outside list bounds");
                return Err(ListError::KeyOutOfBounds);
            }
        }

        let _guard = G::pin();
        Ok(unsafe { self.add_internal(Box::into_raw(node), self.head_ptr()) })
    }

    /// Allocate a node for `key` and [`add`](Self::add) it.
    pub fn insert(&self, key: K) -> Result<bool, ListError> {
        self.add(ListNode::boxed(key))
    }

    /// Remove the node holding `key`.
    ///
    /// Returns the removed node, protected by the list's guard, or `None` if the key
    /// was absent or another thread removed it first.
    pub fn remove(&self, key: &K) -> Option<G::GuardedRef<'_, ListNode<K>>> {
        let _guard = G::pin();
        let node = unsafe { self.remove_internal(key) }?;

        // Take the reference before retiring, so the node outlives the retirement
        unsafe {
            let removed = G::make_ref(node as *const ListNode<K>);
            self.guard.defer_destroy(node, ListNode::dealloc_ptr);
            Some(removed)
        }
    }

    /// Remove the node holding `key`, returning `true` if this call removed it.
    pub fn delete(&self, key: &K) -> bool {
        let _guard = G::pin();
        match unsafe { self.remove_internal(key) } {
            Some(node) => {
                unsafe { self.guard.defer_destroy(node, ListNode::dealloc_ptr) };
                true
            }
            None => false,
        }
    }

    /// Check whether `key` is in the list.
    ///
    /// May physically unlink marked nodes on the way; never changes the logical set.
    pub fn contains(&self, key: &K) -> bool {
        let _guard = G::pin();
        unsafe {
            let window = self.search_from(key, SearchBound::Inclusive, self.head_ptr());
            (*window.pred).has_key(key)
        }
    }

    // =========================================================================
    // Traversal helpers
    // =========================================================================

    /// First live node after `node`, or `None` at the tail.
    ///
    /// # Safety
    /// `node` must be a node of this list protected by a pinned guard.
    unsafe fn next_live(&self, node: NodePtr<K>) -> Option<NodePtr<K>> {
        unsafe {
            let mut curr = (*node).next().reference();
            while curr != self.tail.as_ptr() {
                if !(*curr).next().is_deletion_marked() {
                    return Some(curr);
                }
                curr = (*curr).next().reference();
            }
            None
        }
    }

    /// Check if the list has no live keys.
    pub fn is_empty(&self) -> bool {
        let _guard = G::pin();
        unsafe { self.next_live(self.head_ptr()).is_none() }
    }

    /// Returns the number of live keys. Linear in the length of the list.
    pub fn len(&self) -> usize {
        let _guard = G::pin();
        let mut count = 0;
        let mut current = unsafe { self.next_live(self.head_ptr()) };
        while let Some(node) = current {
            count += 1;
            current = unsafe { self.next_live(node) };
        }
        count
    }

    /// Collects all live keys in ascending order.
    pub fn to_vec(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.iter().collect()
    }

    /// Iterate over a weakly consistent snapshot of the keys, in ascending order.
    pub fn iter(&self) -> Iter<'_, K, G> {
        let guard = G::pin();
        let next = unsafe { self.next_live(self.head_ptr()) };
        Iter {
            _guard: guard,
            list: self,
            next,
        }
    }

    // =========================================================================
    // Fomitchev–Ruppert core
    // =========================================================================

    /// Find two adjacent nodes bracketing `key`, starting at `start`.
    ///
    /// Marked nodes met on the way are unlinked when their predecessor is flagged
    /// for them. With [`SearchBound::Exclusive`] the window lands on the node holding
    /// `key`, which replaces searching for `key - 1`.
    ///
    /// # Safety
    /// `start` must be a non-tail node of this list, protected by a pinned guard.
    unsafe fn search_from(&self, key: &K, bound: SearchBound, start: NodePtr<K>) -> SearchWindow<K> {
        unsafe {
            let mut curr = start;
            let mut next = (*curr).next().reference();

            while bound.admits((*next).cmp_key(key)) {
                // Help any marked successor out of the way, unless curr is itself
                // marked and still points at it (then both are leaving and we step over)
                while (*next).next().is_deletion_marked() {
                    let curr_link = (*curr).next().load();
                    if curr_link.is_deletion_marked() && curr_link.reference() == next {
                        break;
                    }
                    if curr_link.reference() == next {
                        self.help_marked_for_deletion(curr, next);
                    }
                    next = (*curr).next().reference();
                }

                if bound.admits((*next).cmp_key(key)) {
                    curr = next;
                    next = (*curr).next().reference();
                }
            }

            SearchWindow::new(curr, next)
        }
    }

    /// Set the deletion mark on `node`, helping a flagged successor first if needed.
    ///
    /// # Safety
    /// `node` must be a non-sentinel node of this list whose predecessor is flagged for it.
    unsafe fn try_mark_for_deletion(&self, node: NodePtr<K>) {
        unsafe {
            loop {
                let next = (*node).next().reference();
                let result = (*node)
                    .next()
                    .compare_and_set(Link::clean(next), Link::new(next, false, true));

                if let Err(actual) = result {
                    if actual.is_successor_flagged() {
                        tracing::event!(LogLevel::TRACE, "mark blocked by flagged successor, helping");
                        self.help_successor_flagged(node, actual.reference());
                    }
                }

                if (*node).next().is_deletion_marked() {
                    return;
                }
            }
        }
    }

    /// Flag `prev` as responsible for removing `target`.
    ///
    /// Returns the predecessor the flag now sits on, or should be helped from, and
    /// whether this call set the flag. `(None, false)` means `target` left the list.
    ///
    /// # Safety
    /// `prev` and `target` must be nodes of this list protected by a pinned guard,
    /// and `target` must not be a sentinel.
    unsafe fn try_flag_successor(
        &self,
        prev: NodePtr<K>,
        target: NodePtr<K>,
    ) -> (Option<NodePtr<K>>, bool) {
        unsafe {
            let target_key = (*target).key();
            let mut prev = prev;

            loop {
                // Another thread is already responsible for target
                if (*prev).next().load() == Link::flagged(target) {
                    return (Some(prev), false);
                }

                match (*prev)
                    .next()
                    .compare_and_set(Link::clean(target), Link::flagged(target))
                {
                    Ok(_) => return (Some(prev), true),
                    Err(actual) if actual == Link::flagged(target) => return (Some(prev), false),
                    Err(_) => {}
                }

                // prev may be marked for deletion: walk back to a live node
                while (*prev).next().is_deletion_marked() {
                    prev = (*prev).backlink();
                }

                tracing::event!(LogLevel::TRACE, "successor flag lost, searching again");
                let window = self.search_from(target_key, SearchBound::Exclusive, prev);
                if window.curr != target {
                    return (None, false);
                }
                prev = window.pred;
            }
        }
    }

    /// Drive a flagged deletion to completion. Safe to run from many threads at once.
    ///
    /// # Safety
    /// `prev` must be a node of this list, `del` a non-sentinel node, both protected by
    /// a pinned guard.
    unsafe fn help_successor_flagged(&self, prev: NodePtr<K>, del: NodePtr<K>) {
        unsafe {
            (*del).set_backlink(prev);
            if !(*del).next().is_deletion_marked() {
                self.try_mark_for_deletion(del);
            }
            self.help_marked_for_deletion(prev, del);
        }
    }

    /// Unlink marked `del` and clear `prev`'s flag in one CAS.
    ///
    /// # Safety
    /// `prev` and `del` must be nodes of this list protected by a pinned guard.
    unsafe fn help_marked_for_deletion(&self, prev: NodePtr<K>, del: NodePtr<K>) {
        unsafe {
            // Marked links never change, so this successor is final
            let next = (*del).next().reference();
            if (*prev)
                .next()
                .compare_and_set(Link::flagged(del), Link::clean(next))
                .is_ok()
            {
                tracing::event!(LogLevel::TRACE, "unlinked marked node");
            }
        }
    }

    /// Link `new_node`, or free it if its key is already present.
    ///
    /// The first search starts at `start`; later ones start at the last predecessor
    /// tried, or the first live node on its backlink chain.
    ///
    /// # Safety
    /// `new_node` must come from `Box::into_raw`, be unshared, and hold a real key.
    /// `start` must be a non-tail node of this list ordered before the key, and a
    /// guard must be pinned.
    unsafe fn add_internal(&self, new_node: NodePtr<K>, start: NodePtr<K>) -> bool {
        unsafe {
            debug_assert!(!(*new_node).is_sentinel());
            let key = (*new_node).key();
            let mut window = self.search_from(key, SearchBound::Inclusive, start);

            loop {
                if (*window.pred).has_key(key) {
                    tracing::event!(LogLevel::DEBUG, "duplicate key, node dropped");
                    ListNode::dealloc_ptr(new_node);
                    return false;
                }

                let mut prev = window.pred;
                let prev_link = (*prev).next().load();

                if prev_link.is_successor_flagged() {
                    self.help_successor_flagged(prev, prev_link.reference());
                } else {
                    (*new_node).next().set(window.curr, false, false);

                    match (*prev)
                        .next()
                        .compare_and_set(Link::clean(window.curr), Link::clean(new_node))
                    {
                        Ok(_) => return true,
                        Err(actual) => {
                            tracing::event!(LogLevel::TRACE, "insert CAS lost, retrying");
                            if actual.is_successor_flagged() {
                                self.help_successor_flagged(prev, actual.reference());
                            }
                            while (*prev).next().is_deletion_marked() {
                                prev = (*prev).backlink();
                            }
                        }
                    }
                }

                window = self.search_from(key, SearchBound::Inclusive, prev);
            }
        }
    }

    /// Remove the node holding `key`, returning it if this call won the removal.
    ///
    /// The returned node is unlinked but not yet retired.
    ///
    /// # Safety
    /// A guard must be pinned.
    unsafe fn remove_internal(&self, key: &K) -> Option<NodePtr<K>> {
        unsafe {
            let window = self.search_from(key, SearchBound::Exclusive, self.head_ptr());
            if !(*window.curr).has_key(key) {
                return None;
            }

            let (prev, flagged) = self.try_flag_successor(window.pred, window.curr);
            if let Some(prev) = prev {
                self.help_successor_flagged(prev, window.curr);
            }

            if !flagged {
                tracing::event!(LogLevel::TRACE, "lost removal race");
                return None;
            }
            Some(window.curr)
        }
    }
}

impl<K, G> Default for ConcurrentOrderedList<K, G>
where
    K: Ord,
    G: Guard,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, G: Guard> Drop for ConcurrentOrderedList<K, G> {
    fn drop(&mut self) {
        // Clean up all linked nodes including both sentinels.
        //
        let mut curr = self.head.as_ptr();

        while !curr.is_null() {
            unsafe {
                let link = (*curr).next().load();

                debug_assert!(
                    !link.is_deletion_marked() && !link.is_successor_flagged(),
                    "removal left incomplete at drop time"
                );

                let next = link.reference();
                ListNode::dealloc_ptr(curr);
                curr = next;
            }
        }
    }
}

impl<K, G> fmt::Debug for ConcurrentOrderedList<K, G>
where
    K: Ord + fmt::Debug,
    G: Guard,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let _guard = G::pin();
        let mut keys = f.debug_list();
        let mut current = unsafe { self.next_live(self.head_ptr()) };
        while let Some(node) = current {
            unsafe {
                keys.entry((*node).key());
                current = self.next_live(node);
            }
        }
        keys.finish()
    }
}

/// Iterator over the keys of a [`ConcurrentOrderedList`], holding a read guard.
///
/// Keys added or removed during iteration may or may not be observed, but the
/// keys that are yielded are always in ascending order.
///
pub struct Iter<'a, K, G: Guard> {
    _guard: G::ReadGuard,
    list: &'a ConcurrentOrderedList<K, G>,
    next: Option<NodePtr<K>>,
}

impl<K, G> Iterator for Iter<'_, K, G>
where
    K: Ord + Clone,
    G: Guard,
{
    // Cloned values: a reference could not outlive the guard moved into the iterator
    type Item = K;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        unsafe {
            self.next = self.list.next_live(node);
            Some((*node).key().clone())
        }
    }
}
