use super::RbTreeMap;
use crate::error::Result;
use crate::raw::RawRbTree;

impl<K, V> RbTreeMap<K, V> {
    /// Creates an empty map with column space reserved for at least `capacity`
    /// nodes.
    ///
    /// Reserving does not create slots, so [`capacity`](RbTreeMap::capacity)
    /// still starts at zero; the first `capacity` insertions just won't grow
    /// the columns.
    ///
    /// # Panics
    ///
    /// Requests above the index space are clamped to it, but like
    /// `Vec::with_capacity` this aborts or panics if the clamped reservation
    /// cannot be allocated. Use [`reserve`](RbTreeMap::reserve) to get an
    /// [`Error::OutOfMemory`](crate::Error::OutOfMemory) instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let map: RbTreeMap<i32, i32> = RbTreeMap::with_capacity(32);
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 0);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity) for memory allocation.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        RbTreeMap {
            raw: RawRbTree::with_capacity(capacity),
        }
    }

    /// Returns the number of node slots in the arena, live or free.
    ///
    /// Slots are never released, so this only grows. It always equals
    /// [`len`](RbTreeMap::len) plus [`free_slots`](RbTreeMap::free_slots).
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// map.insert(2, "b").unwrap();
    /// map.remove(&1).removed().unwrap();
    /// assert_eq!(map.capacity(), 2);
    /// assert_eq!(map.free_slots(), 1);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.raw.store().capacity()
    }

    /// Returns the number of recycled slots waiting on the freelist.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[must_use]
    pub const fn free_slots(&self) -> usize {
        self.raw.store().free_len()
    }

    /// Reserves column space so that `additional` more insertions will not
    /// need to grow the arena. Free slots count towards `additional`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`](crate::Error::OutOfMemory) if the
    /// allocation fails or the slot count would exceed the index space. The
    /// map is unchanged either way.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map: RbTreeMap<u64, u64> = RbTreeMap::new();
    /// map.reserve(1_000).unwrap();
    /// assert_eq!(map.capacity(), 0);
    /// ```
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        self.raw.reserve(additional)
    }
}
