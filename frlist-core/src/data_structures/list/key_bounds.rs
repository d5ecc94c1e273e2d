use crate::error::ListError;

/// Caller supplied MIN/MAX sentinel keys.
///
/// Real keys must lie strictly between the two, so a list built with
/// [`with_bounds`](super::ConcurrentOrderedList::with_bounds) rejects
/// anything else on insertion instead of breaking the head to tail ordering.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBounds<K> {
    min: K,
    max: K,
}

impl<K: Ord> KeyBounds<K> {
    pub fn new(min: K, max: K) -> Result<Self, ListError> {
        if min >= max {
            return Err(ListError::InvalidBounds);
        }
        Ok(KeyBounds { min, max })
    }

    pub fn min(&self) -> &K {
        &self.min
    }

    pub fn max(&self) -> &K {
        &self.max
    }

    /// `true` when `min < key < max`.
    pub fn contains(&self, key: &K) -> bool {
        &self.min < key && key < &self.max
    }
}

macro_rules! impl_full_range {
    ($($int:ty),*) => {
        $(
            impl KeyBounds<$int> {
                /// Bounds at the extremes of the integer type, like `INT_MIN`/`INT_MAX`
                /// sentinels. The extremes themselves are not valid keys.
                pub fn full_range() -> Self {
                    KeyBounds { min: <$int>::MIN, max: <$int>::MAX }
                }
            }
        )*
    };
}

impl_full_range!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
