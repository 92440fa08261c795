mod codec;
mod index;
mod node_store;
mod raw_rb_tree;
mod validate;

pub(crate) use codec::{decode, encode};
pub(crate) use index::Index;
pub(crate) use raw_rb_tree::RawRbTree;
