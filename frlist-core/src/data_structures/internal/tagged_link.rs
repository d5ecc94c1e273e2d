// Tagged link: a node pointer with two status bits packed into its low bits.
//
// Bit layout:
//   Bit 0: DELETION_MARK  - the node owning this link is logically deleted
//   Bit 1: SUCCESSOR_FLAG - the node owning this link is removing its successor
//
// Mark combinations:
//   0b00 (0): Normal
//   0b01 (1): Deletion-marked, terminal for the owning node
//   0b10 (2): Successor-flagged, cleared by the unlink CAS
//   0b11 (3): Never stored (a flagged link cannot be marked)
//
use std::sync::atomic::{AtomicPtr, Ordering};

const DELETION_MARK: usize = 0b01;
const SUCCESSOR_FLAG: usize = 0b10;
const ALL_BITS: usize = 0b11;

// Nodes embed atomic pointers, so their alignment always leaves two free low bits.
const _: () = assert!(align_of::<AtomicPtr<u8>>() > ALL_BITS);

/// Snapshot of a `(reference, successor_flag, deletion_mark)` triple.
///
pub(crate) struct Link<T> {
    raw: *mut T,
}

// Manual impls to avoid requiring T: Clone/Copy/PartialEq
impl<T> Copy for Link<T> {}

impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Link<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Link<T> {}

impl<T> std::fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("reference", &self.reference())
            .field("successor_flag", &self.is_successor_flagged())
            .field("deletion_mark", &self.is_deletion_marked())
            .finish()
    }
}

impl<T> Link<T> {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Pack a clean pointer with the given status bits.
    #[inline]
    pub(crate) fn new(reference: *mut T, successor_flag: bool, deletion_mark: bool) -> Self {
        debug_assert_eq!(reference as usize & ALL_BITS, 0, "pointer is not aligned");

        let mut bits = reference as usize;
        if successor_flag {
            bits |= SUCCESSOR_FLAG;
        }
        if deletion_mark {
            bits |= DELETION_MARK;
        }
        Link {
            raw: bits as *mut T,
        }
    }

    /// Unflagged, unmarked link to `reference`.
    #[inline]
    pub(crate) fn clean(reference: *mut T) -> Self {
        Self::new(reference, false, false)
    }

    /// Link to `reference` carrying only the successor flag.
    #[inline]
    pub(crate) fn flagged(reference: *mut T) -> Self {
        Self::new(reference, true, false)
    }

    #[inline]
    fn from_raw(raw: *mut T) -> Self {
        Link { raw }
    }

    // =========================================================================
    // Extraction
    // =========================================================================

    /// The pointer without status bits (the one you dereference).
    #[inline]
    pub(crate) fn reference(&self) -> *mut T {
        (self.raw as usize & !ALL_BITS) as *mut T
    }

    #[inline]
    pub(crate) fn is_deletion_marked(&self) -> bool {
        (self.raw as usize & DELETION_MARK) != 0
    }

    #[inline]
    pub(crate) fn is_successor_flagged(&self) -> bool {
        (self.raw as usize & SUCCESSOR_FLAG) != 0
    }
}

/// An atomically updatable [`Link`].
///
/// Every read observes pointer and both bits together, and every update is a single
/// CAS over the whole word, so a flag can never be seen out of step with the pointer
/// it guards.
///
pub(crate) struct TaggedLink<T> {
    word: AtomicPtr<T>,
}

impl<T> TaggedLink<T> {
    pub(crate) fn new(link: Link<T>) -> Self {
        TaggedLink {
            word: AtomicPtr::new(link.raw),
        }
    }

    /// Load the whole triple (Acquire ordering).
    #[inline]
    pub(crate) fn load(&self) -> Link<T> {
        Link::from_raw(self.word.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn reference(&self) -> *mut T {
        self.load().reference()
    }

    #[inline]
    pub(crate) fn is_deletion_marked(&self) -> bool {
        self.load().is_deletion_marked()
    }

    /// Plain store (Release ordering).
    ///
    /// Only valid while the owning node is not yet reachable by other threads.
    #[inline]
    pub(crate) fn set(&self, reference: *mut T, successor_flag: bool, deletion_mark: bool) {
        self.word.store(
            Link::new(reference, successor_flag, deletion_mark).raw,
            Ordering::Release,
        )
    }

    /// CAS the full triple (AcqRel/Acquire ordering).
    ///
    /// Returns the previous link on success and the observed link on failure.
    #[inline]
    pub(crate) fn compare_and_set(&self, expected: Link<T>, new: Link<T>) -> Result<Link<T>, Link<T>> {
        self.word
            .compare_exchange(expected.raw, new.raw, Ordering::AcqRel, Ordering::Acquire)
            .map(Link::from_raw)
            .map_err(Link::from_raw)
    }
}
