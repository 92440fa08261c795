use alloc::vec::Vec;

use super::index::Index;
use crate::error::{Error, Result};
use crate::tracing_helpers::debug_log;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub(crate) enum Color {
    Red = 0,
    Black = 1,
}

impl Color {
    pub(crate) const fn to_byte(self) -> u8 {
        self as u8
    }

    pub(crate) const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Color::Red),
            1 => Some(Color::Black),
            _ => None,
        }
    }
}

/// Columnar node storage.
///
/// Each node field lives in its own column, all indexed by the same slot.
/// Free slots form a singly linked list threaded through the `parent` column;
/// their key and value cells are `None`.
#[derive(Clone)]
pub(crate) struct NodeStore<K, V> {
    keys: Vec<Option<K>>,
    values: Vec<Option<V>>,
    colors: Vec<Color>,
    parents: Vec<Index>,
    lefts: Vec<Index>,
    rights: Vec<Index>,
    free_head: Index,
    free_len: usize,
}

impl<K, V> NodeStore<K, V> {
    pub(crate) const fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            colors: Vec::new(),
            parents: Vec::new(),
            lefts: Vec::new(),
            rights: Vec::new(),
            free_head: Index::NIL,
            free_len: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(Index::MAX_SLOTS);
        Self {
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
            parents: Vec::with_capacity(capacity),
            lefts: Vec::with_capacity(capacity),
            rights: Vec::with_capacity(capacity),
            free_head: Index::NIL,
            free_len: 0,
        }
    }

    /// Number of slots, live or free.
    pub(crate) fn capacity(&self) -> usize {
        self.colors.len()
    }

    pub(crate) const fn free_len(&self) -> usize {
        self.free_len
    }

    pub(crate) const fn free_head(&self) -> Index {
        self.free_head
    }

    /// Reserves column space for `additional` more slots beyond those on the freelist.
    pub(crate) fn reserve(&mut self, additional: usize) -> Result<()> {
        let needed = additional.saturating_sub(self.free_len);
        if needed == 0 {
            return Ok(());
        }
        if self.capacity().saturating_add(needed) > Index::MAX_SLOTS {
            return Err(Error::OutOfMemory);
        }
        self.reserve_rows(needed)
    }

    fn reserve_rows(&mut self, rows: usize) -> Result<()> {
        self.keys.try_reserve(rows).map_err(|_| Error::OutOfMemory)?;
        self.values.try_reserve(rows).map_err(|_| Error::OutOfMemory)?;
        self.colors.try_reserve(rows).map_err(|_| Error::OutOfMemory)?;
        self.parents.try_reserve(rows).map_err(|_| Error::OutOfMemory)?;
        self.lefts.try_reserve(rows).map_err(|_| Error::OutOfMemory)?;
        self.rights.try_reserve(rows).map_err(|_| Error::OutOfMemory)?;
        Ok(())
    }

    /// Stores a new red node with no links and returns its slot.
    ///
    /// Reuses the freelist head when there is one. Otherwise every column grows
    /// by one row; all columns are reserved before any is written, so an
    /// `OutOfMemory` leaves the store untouched.
    pub(crate) fn allocate(&mut self, key: K, value: V) -> Result<Index> {
        if let Some(idx) = self.free_head.non_nil() {
            // Pop the freelist head.
            let slot = idx.slot();
            self.free_head = self.parents[slot];
            self.free_len -= 1;
            self.keys[slot] = Some(key);
            self.values[slot] = Some(value);
            self.colors[slot] = Color::Red;
            self.parents[slot] = Index::NIL;
            self.lefts[slot] = Index::NIL;
            self.rights[slot] = Index::NIL;
            return Ok(idx);
        }

        let slot = self.capacity();
        if slot >= Index::MAX_SLOTS {
            return Err(Error::OutOfMemory);
        }
        let full = self.colors.len() == self.colors.capacity();
        self.reserve_rows(1)?;
        if full {
            debug_log!(slots = slot, reserved = self.colors.capacity(), "node store grew");
        }

        self.keys.push(Some(key));
        self.values.push(Some(value));
        self.colors.push(Color::Red);
        self.parents.push(Index::NIL);
        self.lefts.push(Index::NIL);
        self.rights.push(Index::NIL);
        Ok(Index::from_slot(slot))
    }

    /// Puts a live, already detached slot at the head of the freelist and
    /// hands back its payload.
    pub(crate) fn recycle(&mut self, idx: Index) -> (K, V) {
        let slot = idx.slot();
        let key = self.keys[slot].take().expect("`NodeStore::recycle()` - slot is already free!");
        let value = self.values[slot].take().expect("`NodeStore::recycle()` - slot is already free!");
        self.parents[slot] = self.free_head;
        self.lefts[slot] = Index::NIL;
        self.rights[slot] = Index::NIL;
        self.free_head = idx;
        self.free_len += 1;
        (key, value)
    }

    /// Drops every payload and chains all slots onto the freelist in ascending
    /// order. Column storage is kept.
    pub(crate) fn reset(&mut self) {
        let capacity = self.capacity();
        for slot in 0..capacity {
            self.keys[slot] = None;
            self.values[slot] = None;
            self.colors[slot] = Color::Black;
            self.parents[slot] = if slot + 1 < capacity {
                Index::from_slot(slot + 1)
            } else {
                Index::NIL
            };
            self.lefts[slot] = Index::NIL;
            self.rights[slot] = Index::NIL;
        }
        self.free_head = if capacity > 0 { Index::from_slot(0) } else { Index::NIL };
        self.free_len = capacity;
    }

    #[inline]
    pub(crate) fn is_live(&self, idx: Index) -> bool {
        self.keys[idx.slot()].is_some()
    }

    #[inline]
    pub(crate) fn key(&self, idx: Index) -> &K {
        self.keys[idx.slot()].as_ref().expect("`NodeStore::key()` - slot is free!")
    }

    #[inline]
    pub(crate) fn value(&self, idx: Index) -> &V {
        self.values[idx.slot()].as_ref().expect("`NodeStore::value()` - slot is free!")
    }

    #[inline]
    pub(crate) fn value_mut(&mut self, idx: Index) -> &mut V {
        self.values[idx.slot()].as_mut().expect("`NodeStore::value_mut()` - slot is free!")
    }

    /// Exchanges the key and value of two live slots, leaving links and colors in place.
    pub(crate) fn swap_payload(&mut self, a: Index, b: Index) {
        self.keys.swap(a.slot(), b.slot());
        self.values.swap(a.slot(), b.slot());
    }

    #[inline]
    pub(crate) fn color(&self, idx: Index) -> Color {
        self.colors[idx.slot()]
    }

    #[inline]
    pub(crate) fn set_color(&mut self, idx: Index, color: Color) {
        self.colors[idx.slot()] = color;
    }

    #[inline]
    pub(crate) fn parent(&self, idx: Index) -> Index {
        self.parents[idx.slot()]
    }

    #[inline]
    pub(crate) fn set_parent(&mut self, idx: Index, parent: Index) {
        self.parents[idx.slot()] = parent;
    }

    #[inline]
    pub(crate) fn left(&self, idx: Index) -> Index {
        self.lefts[idx.slot()]
    }

    #[inline]
    pub(crate) fn set_left(&mut self, idx: Index, left: Index) {
        self.lefts[idx.slot()] = left;
    }

    #[inline]
    pub(crate) fn right(&self, idx: Index) -> Index {
        self.rights[idx.slot()]
    }

    #[inline]
    pub(crate) fn set_right(&mut self, idx: Index, right: Index) {
        self.rights[idx.slot()] = right;
    }

    // Raw column access for the codec.

    pub(crate) fn key_column(&self) -> &[Option<K>] {
        &self.keys
    }

    pub(crate) fn value_column(&self) -> &[Option<V>] {
        &self.values
    }

    pub(crate) fn color_column(&self) -> &[Color] {
        &self.colors
    }

    pub(crate) fn parent_column(&self) -> &[Index] {
        &self.parents
    }

    pub(crate) fn left_column(&self) -> &[Index] {
        &self.lefts
    }

    pub(crate) fn right_column(&self) -> &[Index] {
        &self.rights
    }

    /// Assembles a store from decoded columns. The caller has already checked
    /// that all columns have the same length and that `free_head` starts a
    /// chain of exactly `free_len` slots.
    pub(crate) fn from_columns(
        keys: Vec<Option<K>>,
        values: Vec<Option<V>>,
        colors: Vec<Color>,
        links: [Vec<Index>; 3],
        free_head: Index,
        free_len: usize,
    ) -> Self {
        let [parents, lefts, rights] = links;
        debug_assert!(
            [values.len(), colors.len(), parents.len(), lefts.len(), rights.len()]
                .iter()
                .all(|&len| len == keys.len())
        );
        Self {
            keys,
            values,
            colors,
            parents,
            lefts,
            rights,
            free_head,
            free_len,
        }
    }
}
