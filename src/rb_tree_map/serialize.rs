use alloc::vec::Vec;

use bytemuck::Pod;

use super::RbTreeMap;
use crate::error::Result;
use crate::raw;

impl<K: Pod, V: Pod> RbTreeMap<K, V> {
    /// Dumps the map's arena into a flat byte blob.
    ///
    /// The blob is a 32-byte header (`count`, `capacity`, `root`,
    /// `free_list_head`, each a little-endian `u64`) followed by the key,
    /// value, color, parent, left and right columns, each covering every slot
    /// in slot order. Free slots are included, so the freelist survives a
    /// round trip. `u64::MAX` marks an absent link.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map: RbTreeMap<u32, u32> = RbTreeMap::new();
    /// map.insert(1, 10).unwrap();
    /// let bytes = map.dump();
    /// assert_eq!(bytes.len(), 32 + (4 + 4 + 1 + 24));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity)
    #[must_use]
    pub fn dump(&self) -> Vec<u8> {
        raw::encode(&self.raw)
    }

    /// Rebuilds a map from a blob produced by [`dump`](RbTreeMap::dump).
    ///
    /// Sizes and bounds are checked: the header must be present, the length
    /// must match the declared capacity, every link must be the sentinel or a
    /// valid slot, color bytes must be 0 or 1, and the freelist must hold
    /// exactly the slots the live count leaves over. Red-black properties and
    /// key order are not re-verified; call [`validate`](RbTreeMap::validate)
    /// for blobs from untrusted sources.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptSerializedData`](crate::Error::CorruptSerializedData)
    /// describing the first failed check.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map: RbTreeMap<u32, u32> = RbTreeMap::new();
    /// for k in [5, 3, 8] {
    ///     map.insert(k, k * 2).unwrap();
    /// }
    /// let copy = RbTreeMap::<u32, u32>::load(&map.dump()).unwrap();
    /// assert_eq!(copy, map);
    /// assert!(RbTreeMap::<u32, u32>::load(&[1, 2, 3]).is_err());
    /// ```
    ///
    /// # Complexity
    ///
    /// O(capacity)
    pub fn load(bytes: &[u8]) -> Result<Self> {
        Ok(RbTreeMap {
            raw: raw::decode(bytes)?,
        })
    }

    /// Replaces the contents of this map with a decoded blob.
    ///
    /// The blob is fully decoded before anything is replaced, so on error the
    /// map keeps its previous contents.
    ///
    /// # Errors
    ///
    /// Same as [`load`](RbTreeMap::load).
    ///
    /// # Examples
    ///
    /// ```
    /// use rbtree_arena::RbTreeMap;
    ///
    /// let mut map: RbTreeMap<u8, u8> = RbTreeMap::new();
    /// map.insert(1, 1).unwrap();
    /// assert!(map.restore(&[0; 7]).is_err());
    /// assert_eq!(map.get(&1), Some(&1));
    /// ```
    pub fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        self.raw = raw::decode(bytes)?;
        Ok(())
    }
}
