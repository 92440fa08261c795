use core::borrow::Borrow;
use core::fmt;
use core::iter::FusedIterator;
use core::ops::Index as IndexOp;

use crate::error::{Error, Result};
use crate::raw::{Index, RawRbTree};

mod capacity;
mod serialize;

/// Outcome of [`RbTreeMap::insert`].
///
/// A duplicate key is not an error at this level: the map is simply left
/// unchanged. Use [`into_result`](InsertResult::into_result) to treat it as
/// [`Error::KeyAlreadyExists`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum InsertResult {
    /// The key was not present and a new node now holds it.
    Inserted,
    /// The key was already present; the existing value was kept.
    AlreadyPresent,
}

impl InsertResult {
    /// Maps `AlreadyPresent` to [`Error::KeyAlreadyExists`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyAlreadyExists`] if the key was already present.
    pub const fn into_result(self) -> Result<()> {
        match self {
            InsertResult::Inserted => Ok(()),
            InsertResult::AlreadyPresent => Err(Error::KeyAlreadyExists),
        }
    }
}

/// Outcome of [`RbTreeMap::remove`].
#[must_use = "the removed value is returned inside `Removed`"]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RemoveResult<V> {
    /// The key was present; its value is handed back.
    Removed(V),
    /// The key was not present and nothing changed.
    NotFound,
}

impl<V> RemoveResult<V> {
    /// Maps `NotFound` to [`Error::KeyNotFound`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] if the key was not present.
    pub fn into_result(self) -> Result<V> {
        match self {
            RemoveResult::Removed(value) => Ok(value),
            RemoveResult::NotFound => Err(Error::KeyNotFound),
        }
    }

    /// Returns the removed value, if any.
    #[must_use]
    pub fn removed(self) -> Option<V> {
        match self {
            RemoveResult::Removed(value) => Some(value),
            RemoveResult::NotFound => None,
        }
    }

    #[must_use]
    pub const fn is_removed(&self) -> bool {
        matches!(self, RemoveResult::Removed(_))
    }
}

impl<V> From<Option<V>> for RemoveResult<V> {
    fn from(value: Option<V>) -> Self {
        value.map_or(RemoveResult::NotFound, RemoveResult::Removed)
    }
}

/// An ordered map based on a [red-black tree] whose nodes live in a columnar
/// arena and refer to each other by index instead of by pointer.
///
/// Keys must implement [`Ord`]. Each node's fields are stored in parallel
/// columns (key, value, color, parent, left, right). Removed nodes go on a
/// freelist threaded through the parent column and are reused by later
/// insertions, so the arena only ever grows.
///
/// Unlike [`BTreeMap`], inserting a key that is already present does not
/// overwrite the stored value: [`insert`](RbTreeMap::insert) reports
/// [`InsertResult::AlreadyPresent`] and leaves the map alone. Use
/// [`get_mut`](RbTreeMap::get_mut) to update a value in place.
///
/// It is a logic error for a key to be modified in such a way that the key's
/// ordering relative to any other key changes while it is in the map. The
/// behavior resulting from such a logic error is not specified, but will not
/// result in undefined behavior.
///
/// # Examples
///
/// ```
/// use rbtree_arena::{InsertResult, RbTreeMap};
///
/// let mut scores = RbTreeMap::new();
/// scores.insert("Alice", 100).unwrap();
/// scores.insert("Bob", 85).unwrap();
/// scores.insert("Carol", 92).unwrap();
///
/// assert_eq!(scores.get(&"Bob"), Some(&85));
/// assert_eq!(scores.insert("Bob", 0), Ok(InsertResult::AlreadyPresent));
/// assert_eq!(scores["Bob"], 85);
///
/// let names: Vec<_> = scores.keys().copied().collect();
/// assert_eq!(names, ["Alice", "Bob", "Carol"]);
/// ```
///
/// [red-black tree]: https://en.wikipedia.org/wiki/Red%E2%80%93black_tree
/// [`BTreeMap`]: alloc::collections::BTreeMap
pub struct RbTreeMap<K, V> {
    raw: RawRbTree<K, V>,
}

/// An iterator over the entries of a `RbTreeMap`, in key order.
///
/// This `struct` is created by the [`iter`] method on [`RbTreeMap`].
///
/// # Examples
///
/// ```
/// use rbtree_arena::RbTreeMap;
///
/// let mut map = RbTreeMap::new();
/// map.insert(2, "b").unwrap();
/// map.insert(1, "a").unwrap();
/// let mut iter = map.iter();
/// assert_eq!(iter.next(), Some((&1, &"a")));
/// assert_eq!(iter.next_back(), Some((&2, &"b")));
/// assert_eq!(iter.next(), None);
/// ```
///
/// [`iter`]: RbTreeMap::iter
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, K, V> {
    tree: &'a RawRbTree<K, V>,
    front: Index,
    back: Index,
    remaining: usize,
}

/// An iterator over the keys of a `RbTreeMap`.
///
/// This `struct` is created by the [`keys`] method on [`RbTreeMap`].
///
/// [`keys`]: RbTreeMap::keys
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over the values of a `RbTreeMap`.
///
/// This `struct` is created by the [`values`] method on [`RbTreeMap`].
///
/// [`values`]: RbTreeMap::values
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> RbTreeMap<K, V> {
    /// Makes a new, empty `RbTreeMap`.
    ///
    /// Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// ```
    #[must_use]
    pub const fn new() -> RbTreeMap<K, V> {
        RbTreeMap { raw: RawRbTree::new() }
    }

    /// Clears the map, removing all elements.
    ///
    /// Every slot goes back on the freelist; the arena keeps its size, so
    /// [`capacity`](RbTreeMap::capacity) is unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut a = RbTreeMap::new();
    /// a.insert(1, "a").unwrap();
    /// a.clear();
    /// assert!(a.is_empty());
    /// assert_eq!(a.capacity(), 1);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity)
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Returns the first key-value pair in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// assert_eq!(map.first_key_value(), None);
    /// map.insert(1, "b").unwrap();
    /// map.insert(2, "a").unwrap();
    /// assert_eq!(map.first_key_value(), Some((&1, &"b")));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let first = self.raw.first().non_nil()?;
        Some(self.raw.key_value(first))
    }

    /// Returns the last key-value pair in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "b").unwrap();
    /// map.insert(2, "a").unwrap();
    /// assert_eq!(map.last_key_value(), Some((&2, &"a")));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let last = self.raw.last().non_nil()?;
        Some(self.raw.key_value(last))
    }

    /// Removes and returns the first element in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// map.insert(2, "b").unwrap();
    /// assert_eq!(map.pop_first(), Some((1, "a")));
    /// assert_eq!(map.pop_first(), Some((2, "b")));
    /// assert_eq!(map.pop_first(), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let first = self.raw.first().non_nil()?;
        Some(self.raw.remove_at(first))
    }

    /// Removes and returns the last element in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// map.insert(2, "b").unwrap();
    /// assert_eq!(map.pop_last(), Some((2, "b")));
    /// assert_eq!(map.pop_last(), Some((1, "a")));
    /// assert_eq!(map.pop_last(), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let last = self.raw.last().non_nil()?;
        Some(self.raw.remove_at(last))
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    ///
    /// Each call starts an independent traversal. The iterator walks parent
    /// links, so it needs no auxiliary stack.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(3, "c").unwrap();
    /// map.insert(2, "b").unwrap();
    /// map.insert(1, "a").unwrap();
    ///
    /// for (key, value) in map.iter() {
    ///     println!("{key}: {value}");
    /// }
    ///
    /// let (first_key, first_value) = map.iter().next().unwrap();
    /// assert_eq!((*first_key, *first_value), (1, "a"));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n) to create the iterator; amortized O(1) per step.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: &self.raw,
            front: self.raw.first(),
            back: self.raw.last(),
            remaining: self.raw.len(),
        }
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut a = RbTreeMap::new();
    /// a.insert(2, "b").unwrap();
    /// a.insert(1, "a").unwrap();
    ///
    /// let keys: Vec<_> = a.keys().cloned().collect();
    /// assert_eq!(keys, [1, 2]);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the map, in order by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut a = RbTreeMap::new();
    /// a.insert(1, "hello").unwrap();
    /// a.insert(2, "goodbye").unwrap();
    ///
    /// let values: Vec<&str> = a.values().cloned().collect();
    /// assert_eq!(values, ["hello", "goodbye"]);
    /// ```
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns the number of elements in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut a = RbTreeMap::new();
    /// assert_eq!(a.len(), 0);
    /// a.insert(1, "a").unwrap();
    /// assert_eq!(a.len(), 1);
    /// ```
    #[must_use]
    pub const fn len(&self) -> usize {
        self.raw.len()
    }

    /// Returns `true` if the map contains no elements.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut a = RbTreeMap::new();
    /// assert!(a.is_empty());
    /// a.insert(1, "a").unwrap();
    /// assert!(!a.is_empty());
    /// ```
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl<K: Ord, V> RbTreeMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get(key)
    }

    /// Returns the key-value pair corresponding to the supplied key.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.get_key_value(&1), Some((&1, &"a")));
    /// assert_eq!(map.get_key_value(&2), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_key_value(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map[&1], "b");
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.get_mut(key)
    }

    /// Returns `true` if the map contains a value for the specified key.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.search(key).is_some()
    }

    /// Inserts a key-value pair into the map unless the key is already present.
    ///
    /// A duplicate key is rejected, not overwritten: the map is unchanged and
    /// the new key and value are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the node arena cannot grow. The map is
    /// unchanged in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::{Error, InsertResult, RbTreeMap};
    ///
    /// let mut map = RbTreeMap::new();
    /// assert_eq!(map.insert(37, "a"), Ok(InsertResult::Inserted));
    /// assert_eq!(map.insert(37, "b"), Ok(InsertResult::AlreadyPresent));
    /// assert_eq!(map.insert(37, "c").and_then(InsertResult::into_result), Err(Error::KeyAlreadyExists));
    /// assert_eq!(map[&37], "a");
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, key: K, value: V) -> Result<InsertResult> {
        self.raw.insert(key, value)
    }

    /// Removes a key from the map, returning the value at the key if the key
    /// was previously in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::{RemoveResult, RbTreeMap};
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.remove(&1), RemoveResult::Removed("a"));
    /// assert_eq!(map.remove(&1), RemoveResult::NotFound);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove<Q>(&mut self, key: &Q) -> RemoveResult<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key).map(|(_, value)| value).into()
    }

    /// Removes a key from the map, returning the stored key and value if the
    /// key was previously in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.remove_entry(&1), Some((1, "a")));
    /// assert_eq!(map.remove_entry(&1), None);
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.raw.remove(key)
    }

    /// Checks every structural invariant of the map.
    ///
    /// [`load`](RbTreeMap::load) only checks sizes and bounds, so a blob that
    /// is well-formed but semantically broken is accepted. This walk catches
    /// it: key order, no red node with a red child, uniform black-height, a
    /// black root, consistent parent links, and a freelist that covers exactly
    /// the slots the tree does not. It is bounded by
    /// [`capacity`](RbTreeMap::capacity) and terminates on cyclic links.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvariantViolation`] describing the first broken
    /// invariant found.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map = RbTreeMap::new();
    /// for k in 0..100 {
    ///     map.insert(k, ()).unwrap();
    /// }
    /// assert_eq!(map.validate(), Ok(()));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity)
    pub fn validate(&self) -> Result<()> {
        Ok(self.raw.validate()?)
    }
}

impl<K: Clone, V: Clone> Clone for RbTreeMap<K, V> {
    fn clone(&self) -> Self {
        RbTreeMap { raw: self.raw.clone() }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for RbTreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<K: Eq, V: Eq> Eq for RbTreeMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for RbTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for RbTreeMap<K, V> {
    fn default() -> Self {
        RbTreeMap::new()
    }
}

impl<'a, K, V> IntoIterator for &'a RbTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, Q, V> IndexOp<&Q> for RbTreeMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: ?Sized + Ord,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<'a, K: 'a, V: 'a> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.front.non_nil()?;
        self.remaining -= 1;
        self.front = self.tree.successor(idx);
        Some(self.tree.key_value(idx))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K: 'a, V: 'a> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.back.non_nil()?;
        self.remaining -= 1;
        self.back = self.tree.predecessor(idx);
        Some(self.tree.key_value(idx))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}
