//! # Flag, Mark and Backlink Protocol
//!
//! Design notes for [`ConcurrentOrderedList`](super::ConcurrentOrderedList).
//!
//! ## Problem
//!
//! With a single mark bit (Harris), a thread whose predecessor is deleted under it
//! has to restart from the head. Under contention this makes long lists slow, and a
//! stalled remover can leave marked nodes that every other thread trips over.
//!
//! ## Solution: two bits and a backlink
//!
//! ```text
//! Bit 0: MARK - this node is logically deleted, its next never changes again
//! Bit 1: FLAG - this node is removing its successor
//! ```
//!
//! A flagged link can only change through the unlink CAS, so a flagged node
//! cannot be marked and nothing can be inserted after it. That pins the
//! predecessor in place for the duration of the removal, and makes the
//! predecessor a safe target for the removed node's backlink.
//!
//! ## REMOVE Protocol (3 Steps)
//!
//! To remove `del` with predecessor `prev`:
//!
//! ```text
//! Initial: prev → del → next
//!
//! Step 1: Flag (claims the removal, blocks inserts after prev)
//!     CAS prev.next: (del,0,0) → (del,FLAG,0)
//!
//! Step 2: Backlink, then mark (logical delete)
//!     Store del.backlink = prev
//!     CAS del.next: (next,0,0) → (next,0,MARK)
//!
//! Step 3: Unlink and unflag in one step
//!     CAS prev.next: (del,FLAG,0) → (next,0,0)
//! ```
//!
//! Only one thread wins step 1 for a given node; that thread's `remove` reports
//! success and retires the node. Steps 2 and 3 are run by anyone who needs them.
//!
//! ## Helping Protocol
//!
//! ```text
//! help_flagged(prev, del):
//!     del.backlink = prev
//!     if del.next has no MARK: try_mark(del)
//!     help_marked(prev, del)
//!
//! try_mark(del):
//!     repeat
//!         next = del.next.reference
//!         if CAS del.next: (next,0,0) → (next,0,MARK) fails with FLAG set:
//!             help_flagged(del, del.next.reference)   // del's own successor first
//!     until del.next has MARK
//!
//! help_marked(prev, del):
//!     CAS prev.next: (del,FLAG,0) → (del.next.reference,0,0)
//! ```
//!
//! Every helper is idempotent: once the node is marked the mark CAS fails
//! harmlessly, and once it is unlinked the unlink CAS fails harmlessly.
//!
//! ## Search with Helping
//!
//! ```text
//! search_from(key, curr):
//!     next = curr.next.reference
//!     while next.key <= key:                   // < key for an exact-match search
//!         while next is MARKED and not (curr is MARKED and curr.next == next):
//!             if curr.next == next: help_marked(curr, next)
//!             next = curr.next.reference
//!         if next.key <= key:
//!             curr = next
//!             next = curr.next.reference
//!     return (curr, next)
//! ```
//!
//! Removal uses the exact-match form, which yields `pred.key < key <= curr.key`
//! and lands on the target without assuming `key - 1` exists.
//!
//! ## Insert Protocol
//!
//! ```text
//! add(node):
//!     (prev, next) = search_from(node.key, head)
//!     loop:
//!         if prev.key == node.key: return DUPLICATE
//!         if prev.next has FLAG:
//!             help_flagged(prev, prev.next.reference)
//!         else:
//!             node.next = (next,0,0)
//!             if CAS prev.next: (next,0,0) → (node,0,0): return LINKED
//!             if the failure showed FLAG: help_flagged(prev, prev.next.reference)
//!             while prev is MARKED: prev = prev.backlink
//!         (prev, next) = search_from(node.key, prev)
//! ```
//!
//! ## Backlink Recovery
//!
//! ```text
//! Initial: A → B → C → D
//! T1 removes C (prev = B), T2 removes B (prev = A)
//!
//! T2: CAS A.next: (B,0,0) → (B,FLAG,0)        ✓
//! T2: B.backlink = A, mark B
//! T1: CAS B.next: (C,0,0) → (C,FLAG,0)        ✗ (B is MARKED)
//! T2: unlink B: A → C
//! T1: B is MARKED, follow B.backlink = A
//! T1: search_from(C.key, A) finds (A, C)
//! T1: CAS A.next: (C,0,0) → (C,FLAG,0)        ✓
//! T1: mark C, unlink C: A → D
//! ```
//!
//! ## Concurrent Scenario: Adjacent Removals
//!
//! ```text
//! Initial: A → B → C → D
//! T1 removes B, T2 removes C
//!
//! T1: CAS A.next: (B,0,0) → (B,FLAG,0)        ✓
//! T2: CAS B.next: (C,0,0) → (C,FLAG,0)        ✓
//! T1: try_mark(B) fails, B.next has FLAG
//! T1: help_flagged(B, C): mark C, unlink C: B → D
//! T1: mark B, unlink B: A → D
//! ```
//!
//! ## Invariants
//!
//! 1. FLAG ownership: at most one flag CAS succeeds per node
//! 2. Backlink validity: MARK on a node implies its backlink is set
//! 3. Flag before mark: a node is marked only after its predecessor is flagged
//! 4. Progress: a failed CAS means some other thread completed a step
//! 5. Linearizable: insert at the link CAS, remove at the mark CAS
