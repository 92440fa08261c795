//! Flat byte layout of a tree.
//!
//! ```text
//! [count: u64][capacity: u64][root: u64][free_list_head: u64]
//! [key column:    capacity × size_of::<K>()]
//! [value column:  capacity × size_of::<V>()]
//! [color column:  capacity × 1 byte, 0 = red, 1 = black]
//! [parent column: capacity × u64]
//! [left column:   capacity × u64]
//! [right column:  capacity × u64]
//! ```
//!
//! Header and link entries are little-endian with `u64::MAX` as the sentinel.
//! Key and value entries are the plain bytes of the `Pod` type; free slots are
//! written as zeroes.

use alloc::vec;
use alloc::vec::Vec;
use core::mem::size_of;

use bytemuck::{Pod, Zeroable};

use super::index::Index;
use super::node_store::{Color, NodeStore};
use super::raw_rb_tree::RawRbTree;
use crate::error::{Corruption, Error, Result};
use crate::tracing_helpers::{debug_log, warn_log};

const WORD: usize = size_of::<u64>();
pub(crate) const HEADER_LEN: usize = 4 * WORD;

/// Bytes per slot across all six columns.
const fn row_len<K, V>() -> usize {
    size_of::<K>() + size_of::<V>() + 1 + 3 * WORD
}

pub(crate) fn encode<K: Pod, V: Pod>(tree: &RawRbTree<K, V>) -> Vec<u8> {
    let store = tree.store();
    let capacity = store.capacity();
    let mut out = Vec::with_capacity(HEADER_LEN + capacity * row_len::<K, V>());

    // usize fits in u64 on every supported target.
    #[allow(clippy::cast_possible_truncation)]
    let header = [
        tree.len() as u64,
        capacity as u64,
        tree.root().to_wire(),
        store.free_head().to_wire(),
    ];
    for word in header {
        out.extend_from_slice(&word.to_le_bytes());
    }

    let zero_key = K::zeroed();
    for key in store.key_column() {
        out.extend_from_slice(bytemuck::bytes_of(key.as_ref().unwrap_or(&zero_key)));
    }
    let zero_value = V::zeroed();
    for value in store.value_column() {
        out.extend_from_slice(bytemuck::bytes_of(value.as_ref().unwrap_or(&zero_value)));
    }
    out.extend(store.color_column().iter().map(|color| color.to_byte()));
    for column in [store.parent_column(), store.left_column(), store.right_column()] {
        for idx in column {
            out.extend_from_slice(&idx.to_wire().to_le_bytes());
        }
    }

    debug_log!(bytes = out.len(), slots = capacity, len = tree.len(), "tree encoded");
    out
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut word = [0; WORD];
    word.copy_from_slice(&bytes[offset..offset + WORD]);
    u64::from_le_bytes(word)
}

fn reject(corruption: Corruption) -> Error {
    warn_log!(reason = %corruption, "rejecting serialized tree");
    Error::CorruptSerializedData(corruption)
}

/// Decodes a blob produced by [`encode`].
///
/// Only sizes, bounds, color bytes and freelist shape are checked; red-black
/// properties and key order are taken on trust.
pub(crate) fn decode<K: Pod, V: Pod>(bytes: &[u8]) -> Result<RawRbTree<K, V>> {
    if bytes.len() < HEADER_LEN {
        return Err(reject(Corruption::TruncatedHeader {
            len: bytes.len(),
            header: HEADER_LEN,
        }));
    }
    let count_raw = read_u64(bytes, 0);
    let capacity_raw = read_u64(bytes, WORD);
    let root_raw = read_u64(bytes, 2 * WORD);
    let free_raw = read_u64(bytes, 3 * WORD);

    let capacity = usize::try_from(capacity_raw)
        .ok()
        .filter(|&capacity| capacity <= Index::MAX_SLOTS)
        .ok_or_else(|| reject(Corruption::CapacityTooLarge { capacity: capacity_raw }))?;
    let expected = capacity
        .checked_mul(row_len::<K, V>())
        .and_then(|rows| rows.checked_add(HEADER_LEN))
        .ok_or_else(|| reject(Corruption::CapacityTooLarge { capacity: capacity_raw }))?;
    if bytes.len() != expected {
        return Err(reject(Corruption::LengthMismatch {
            expected,
            actual: bytes.len(),
        }));
    }
    if count_raw > capacity_raw {
        return Err(reject(Corruption::CountExceedsCapacity {
            count: count_raw,
            capacity: capacity_raw,
        }));
    }
    // count <= capacity <= Index::MAX_SLOTS, so this fits.
    let count = usize::try_from(count_raw).unwrap_or(capacity);

    let index = |field: &'static str, raw: u64| {
        Index::from_wire(raw, capacity).ok_or_else(|| {
            reject(Corruption::IndexOutOfBounds {
                field,
                index: raw,
                capacity,
            })
        })
    };
    let root = index("root", root_raw)?;
    let free_head = index("free_list_head", free_raw)?;

    let key_offset = HEADER_LEN;
    let value_offset = key_offset + capacity * size_of::<K>();
    let color_offset = value_offset + capacity * size_of::<V>();
    let links_offset = color_offset + capacity;

    let mut colors = Vec::with_capacity(capacity);
    for (slot, &byte) in bytes[color_offset..links_offset].iter().enumerate() {
        let color = Color::from_byte(byte).ok_or_else(|| reject(Corruption::InvalidColor { slot, byte }))?;
        colors.push(color);
    }

    let mut links: [Vec<Index>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for (column, (field, out)) in ["parent", "left", "right"].into_iter().zip(links.iter_mut()).enumerate() {
        let base = links_offset + column * capacity * WORD;
        out.reserve_exact(capacity);
        for slot in 0..capacity {
            out.push(index(field, read_u64(bytes, base + slot * WORD))?);
        }
    }

    // Follow the freelist through the parent column, marking each slot once.
    let expected_free = capacity - count;
    let mut free = vec![false; capacity];
    let mut free_len = 0;
    let mut cursor = free_head;
    while let Some(idx) = cursor.non_nil() {
        if free[idx.slot()] || free_len == expected_free {
            return Err(reject(Corruption::FreeListMismatch {
                free: free_len + 1,
                expected: expected_free,
            }));
        }
        free[idx.slot()] = true;
        free_len += 1;
        cursor = links[0][idx.slot()];
    }
    if free_len != expected_free {
        return Err(reject(Corruption::FreeListMismatch {
            free: free_len,
            expected: expected_free,
        }));
    }
    let root_ok = match root.non_nil() {
        Some(root) => count > 0 && !free[root.slot()],
        None => count == 0,
    };
    if !root_ok {
        return Err(reject(Corruption::RootMismatch));
    }

    let keys = read_column::<K>(&bytes[key_offset..value_offset], &free);
    let values = read_column::<V>(&bytes[value_offset..color_offset], &free);

    let store = NodeStore::from_columns(keys, values, colors, links, free_head, free_len);
    debug_log!(bytes = bytes.len(), slots = capacity, len = count, "tree decoded");
    Ok(RawRbTree::from_parts(store, root, count))
}

fn read_column<T: Pod>(bytes: &[u8], free: &[bool]) -> Vec<Option<T>> {
    let width = size_of::<T>();
    free.iter()
        .enumerate()
        .map(|(slot, &is_free)| {
            (!is_free).then(|| bytemuck::pod_read_unaligned(&bytes[slot * width..(slot + 1) * width]))
        })
        .collect()
}
