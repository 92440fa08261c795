//! A pointer-free red-black tree map for Rust.
//!
//! This crate provides [`RbTreeMap`], an ordered map whose nodes never hold
//! pointers. Every node lives in a row of a columnar arena (one `Vec` per
//! field: key, value, color, parent, left, right) and links to other nodes by
//! index. One reserved index plays the role of the classic nil leaf.
//!
//! # Example
//!
//! ```
//! use rbtree_arena::{Error, InsertResult, RbTreeMap};
//!
//! let mut map = RbTreeMap::new();
//! for key in [1, 5, 3, 8, 2] {
//!     map.insert(key, key * 100).unwrap();
//! }
//! let keys: Vec<_> = map.keys().copied().collect();
//! assert_eq!(keys, [1, 2, 3, 5, 8]);
//!
//! // Duplicate keys are rejected, not overwritten.
//! assert_eq!(map.insert(5, 0), Ok(InsertResult::AlreadyPresent));
//! assert_eq!(map.get(&5), Some(&500));
//!
//! // Removed slots are recycled by later insertions.
//! assert_eq!(map.remove(&3).into_result(), Ok(300));
//! assert_eq!(map.remove(&3).into_result(), Err(Error::KeyNotFound));
//! map.insert(4, 400).unwrap();
//! assert_eq!(map.capacity(), 5);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`
//! - **No pointers, no `unsafe`** - Nodes refer to each other by index into a growable arena
//! - **Slot recycling** - Removed nodes are reused through a freelist threaded through the parent column
//! - **Flat dump/load** - With `bytemuck::Pod` keys and values, the arena round-trips through a byte blob
//! - **`tracing`** (optional feature) - Debug and trace events for growth, clears, dumps and rejected loads
//!
//! # Implementation
//!
//! Insertion and removal follow the textbook red-black algorithms with one
//! twist: the nil leaf is never stored, so the removal fixup carries the
//! parent of the replacement node explicitly. A node with two children trades
//! its key and value with its in-order successor, and the successor's slot is
//! the one unlinked and recycled.

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod raw;
mod tracing_helpers;

pub mod rb_tree_map;

pub use error::{Corruption, Error, Result, Violation};
pub use rb_tree_map::{InsertResult, RbTreeMap, RemoveResult};
