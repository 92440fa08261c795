#[cfg(test)]
type RawIndex = u16;
#[cfg(not(test))]
type RawIndex = u32;

/// Slot handle into the node store.
///
/// The maximum raw value is reserved as the sentinel, so a store addresses at
/// most [`Index::MAX_SLOTS`] slots.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub(crate) struct Index(RawIndex);

impl Index {
    /// The sentinel: no parent, no child, empty root, end of the freelist.
    pub(crate) const NIL: Self = Self(RawIndex::MAX);

    pub(crate) const MAX_SLOTS: usize = RawIndex::MAX as usize;

    /// Wire encoding of [`Index::NIL`].
    pub(crate) const WIRE_NIL: u64 = u64::MAX;

    #[inline]
    pub(crate) const fn from_slot(slot: usize) -> Self {
        assert!(slot < Self::MAX_SLOTS, "`Index::from_slot()` - `slot` >= `Index::MAX_SLOTS`!");
        #[allow(clippy::cast_possible_truncation)]
        Self(slot as RawIndex)
    }

    #[inline]
    pub(crate) const fn slot(self) -> usize {
        debug_assert!(!self.is_nil(), "`Index::slot()` - called on `Index::NIL`!");
        self.0 as usize
    }

    #[inline]
    pub(crate) const fn is_nil(self) -> bool {
        self.0 == RawIndex::MAX
    }

    /// `None` for the sentinel.
    #[inline]
    pub(crate) const fn non_nil(self) -> Option<Self> {
        if self.is_nil() { None } else { Some(self) }
    }

    #[inline]
    pub(crate) const fn to_wire(self) -> u64 {
        if self.is_nil() { Self::WIRE_NIL } else { self.0 as u64 }
    }

    /// Decodes a wire index, rejecting anything that is neither the sentinel
    /// nor a slot below `capacity`.
    #[inline]
    pub(crate) fn from_wire(raw: u64, capacity: usize) -> Option<Self> {
        if raw == Self::WIRE_NIL {
            return Some(Self::NIL);
        }
        let slot = usize::try_from(raw).ok()?;
        (slot < capacity && slot < Self::MAX_SLOTS).then(|| Self::from_slot(slot))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use static_assertions::assert_eq_size;

    assert_eq_size!(Index, RawIndex);

    #[test]
    #[should_panic(expected = "`Index::from_slot()` - `slot` >= `Index::MAX_SLOTS`!")]
    fn invalid_index() {
        let _ = Index::from_slot(Index::MAX_SLOTS);
    }

    #[test]
    fn nil_is_distinct() {
        assert!(Index::NIL.is_nil());
        assert_eq!(Index::NIL.non_nil(), None);
        assert_eq!(Index::NIL.to_wire(), u64::MAX);
        assert!(!Index::from_slot(0).is_nil());
        assert_ne!(Index::from_slot(Index::MAX_SLOTS - 1), Index::NIL);
    }

    #[test]
    fn wire_bounds() {
        assert_eq!(Index::from_wire(u64::MAX, 0), Some(Index::NIL));
        assert_eq!(Index::from_wire(0, 0), None);
        assert_eq!(Index::from_wire(3, 4), Some(Index::from_slot(3)));
        assert_eq!(Index::from_wire(4, 4), None);
        assert_eq!(Index::from_wire(u64::MAX - 1, usize::MAX), None);
    }

    proptest! {
        #[test]
        fn index_round_trip(slot in 0..Index::MAX_SLOTS) {
            let index = Index::from_slot(slot);
            prop_assert_eq!(index.slot(), slot);
            prop_assert_eq!(index.non_nil(), Some(index));
            prop_assert_eq!(Index::from_wire(index.to_wire(), Index::MAX_SLOTS), Some(index));
        }
    }
}
