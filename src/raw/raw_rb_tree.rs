use core::borrow::Borrow;
use core::cmp::Ordering;

use super::index::Index;
use super::node_store::{Color, NodeStore};
use crate::error::Result;
use crate::rb_tree_map::InsertResult;
use crate::tracing_helpers::{debug_log, trace_log};

/// The core red-black tree backing `RbTreeMap`.
///
/// All links are [`Index`] values into the node store; [`Index::NIL`] stands in
/// for every absent node and is treated as black.
#[derive(Clone)]
pub(crate) struct RawRbTree<K, V> {
    /// Columnar storage for every slot, live or free.
    store: NodeStore<K, V>,
    /// Root slot, or `NIL` when the tree is empty.
    root: Index,
    /// Number of live nodes.
    len: usize,
}

impl<K, V> RawRbTree<K, V> {
    /// Creates a new, empty tree.
    pub(crate) const fn new() -> Self {
        Self {
            store: NodeStore::new(),
            root: Index::NIL,
            len: 0,
        }
    }

    /// Creates a new tree with column space reserved for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            store: NodeStore::with_capacity(capacity),
            root: Index::NIL,
            len: 0,
        }
    }

    /// Reassembles a tree from decoded parts. Only the codec calls this, after
    /// its bounds checks.
    pub(crate) fn from_parts(store: NodeStore<K, V>, root: Index, len: usize) -> Self {
        Self { store, root, len }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) const fn root(&self) -> Index {
        self.root
    }

    pub(crate) const fn store(&self) -> &NodeStore<K, V> {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn store_mut(&mut self) -> &mut NodeStore<K, V> {
        &mut self.store
    }

    #[cfg(test)]
    pub(crate) fn set_len(&mut self, len: usize) {
        self.len = len;
    }

    pub(crate) fn reserve(&mut self, additional: usize) -> Result<()> {
        self.store.reserve(additional)
    }

    /// Removes every node. All slots go back on the freelist; nothing is shrunk.
    pub(crate) fn clear(&mut self) {
        debug_log!(len = self.len, slots = self.store.capacity(), "clearing tree");
        self.store.reset();
        self.root = Index::NIL;
        self.len = 0;
    }

    #[inline]
    fn color_of(&self, idx: Index) -> Color {
        if idx.is_nil() { Color::Black } else { self.store.color(idx) }
    }

    #[inline]
    fn is_red(&self, idx: Index) -> bool {
        self.color_of(idx) == Color::Red
    }

    /// Leftmost node of the subtree rooted at `idx`.
    pub(crate) fn minimum(&self, mut idx: Index) -> Index {
        if idx.is_nil() {
            return idx;
        }
        while let Some(left) = self.store.left(idx).non_nil() {
            idx = left;
        }
        idx
    }

    /// Rightmost node of the subtree rooted at `idx`.
    pub(crate) fn maximum(&self, mut idx: Index) -> Index {
        if idx.is_nil() {
            return idx;
        }
        while let Some(right) = self.store.right(idx).non_nil() {
            idx = right;
        }
        idx
    }

    pub(crate) fn first(&self) -> Index {
        self.minimum(self.root)
    }

    pub(crate) fn last(&self) -> Index {
        self.maximum(self.root)
    }

    /// In-order successor of a live node, or `NIL` after the last one.
    pub(crate) fn successor(&self, idx: Index) -> Index {
        let right = self.store.right(idx);
        if !right.is_nil() {
            return self.minimum(right);
        }
        let mut child = idx;
        let mut parent = self.store.parent(idx);
        while !parent.is_nil() && self.store.right(parent) == child {
            child = parent;
            parent = self.store.parent(parent);
        }
        parent
    }

    /// In-order predecessor of a live node, or `NIL` before the first one.
    pub(crate) fn predecessor(&self, idx: Index) -> Index {
        let left = self.store.left(idx);
        if !left.is_nil() {
            return self.maximum(left);
        }
        let mut child = idx;
        let mut parent = self.store.parent(idx);
        while !parent.is_nil() && self.store.left(parent) == child {
            child = parent;
            parent = self.store.parent(parent);
        }
        parent
    }

    pub(crate) fn key_value(&self, idx: Index) -> (&K, &V) {
        (self.store.key(idx), self.store.value(idx))
    }

    /// Points `parent`'s link that held `old` at `new` instead, or moves the
    /// root when `parent` is `NIL`. Does not touch `new`'s parent link.
    fn replace_child(&mut self, parent: Index, old: Index, new: Index) {
        if parent.is_nil() {
            self.root = new;
        } else if self.store.left(parent) == old {
            self.store.set_left(parent, new);
        } else {
            self.store.set_right(parent, new);
        }
    }

    //     x              y
    //    / \            / \
    //   a   y    =>    x   c
    //      / \        / \
    //     b   c      a   b
    fn rotate_left(&mut self, x: Index) {
        let y = self.store.right(x);
        let b = self.store.left(y);

        self.store.set_right(x, b);
        if !b.is_nil() {
            self.store.set_parent(b, x);
        }

        let parent = self.store.parent(x);
        self.store.set_parent(y, parent);
        self.replace_child(parent, x, y);

        self.store.set_left(y, x);
        self.store.set_parent(x, y);
    }

    //       y          x
    //      / \        / \
    //     x   c  =>  a   y
    //    / \            / \
    //   a   b          b   c
    fn rotate_right(&mut self, y: Index) {
        let x = self.store.left(y);
        let b = self.store.right(x);

        self.store.set_left(y, b);
        if !b.is_nil() {
            self.store.set_parent(b, y);
        }

        let parent = self.store.parent(y);
        self.store.set_parent(x, parent);
        self.replace_child(parent, y, x);

        self.store.set_right(x, y);
        self.store.set_parent(y, x);
    }

    /// Restores the red-black properties after `z` was linked in as a red leaf.
    fn insert_fixup(&mut self, mut z: Index) {
        loop {
            let mut parent = self.store.parent(z);
            if !self.is_red(parent) {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let grandparent = self.store.parent(parent);

            if parent == self.store.left(grandparent) {
                let uncle = self.store.right(grandparent);
                if self.is_red(uncle) {
                    self.store.set_color(parent, Color::Black);
                    self.store.set_color(uncle, Color::Black);
                    self.store.set_color(grandparent, Color::Red);
                    z = grandparent;
                    continue;
                }
                if z == self.store.right(parent) {
                    // Left-right: turn it into left-left.
                    z = parent;
                    self.rotate_left(z);
                    parent = self.store.parent(z);
                }
                self.store.set_color(parent, Color::Black);
                self.store.set_color(grandparent, Color::Red);
                self.rotate_right(grandparent);
            } else {
                let uncle = self.store.left(grandparent);
                if self.is_red(uncle) {
                    self.store.set_color(parent, Color::Black);
                    self.store.set_color(uncle, Color::Black);
                    self.store.set_color(grandparent, Color::Red);
                    z = grandparent;
                    continue;
                }
                if z == self.store.left(parent) {
                    // Right-left: turn it into right-right.
                    z = parent;
                    self.rotate_right(z);
                    parent = self.store.parent(z);
                }
                self.store.set_color(parent, Color::Black);
                self.store.set_color(grandparent, Color::Red);
                self.rotate_left(grandparent);
            }
        }

        let root = self.root;
        self.store.set_color(root, Color::Black);
    }

    /// Restores the black-height after a black node was spliced out.
    ///
    /// `x` is the node that took the removed node's place and may be `NIL`,
    /// which has no stored parent; `parent` carries it instead.
    fn remove_fixup(&mut self, mut x: Index, mut parent: Index) {
        while x != self.root && !self.is_red(x) {
            if x == self.store.left(parent) {
                let mut sibling = self.store.right(parent);
                if self.is_red(sibling) {
                    self.store.set_color(sibling, Color::Black);
                    self.store.set_color(parent, Color::Red);
                    self.rotate_left(parent);
                    sibling = self.store.right(parent);
                }
                if !self.is_red(self.store.left(sibling)) && !self.is_red(self.store.right(sibling)) {
                    self.store.set_color(sibling, Color::Red);
                    x = parent;
                    parent = self.store.parent(x);
                } else {
                    if !self.is_red(self.store.right(sibling)) {
                        let near = self.store.left(sibling);
                        self.store.set_color(near, Color::Black);
                        self.store.set_color(sibling, Color::Red);
                        self.rotate_right(sibling);
                        sibling = self.store.right(parent);
                    }
                    self.store.set_color(sibling, self.store.color(parent));
                    self.store.set_color(parent, Color::Black);
                    let far = self.store.right(sibling);
                    self.store.set_color(far, Color::Black);
                    self.rotate_left(parent);
                    x = self.root;
                    parent = Index::NIL;
                }
            } else {
                let mut sibling = self.store.left(parent);
                if self.is_red(sibling) {
                    self.store.set_color(sibling, Color::Black);
                    self.store.set_color(parent, Color::Red);
                    self.rotate_right(parent);
                    sibling = self.store.left(parent);
                }
                if !self.is_red(self.store.right(sibling)) && !self.is_red(self.store.left(sibling)) {
                    self.store.set_color(sibling, Color::Red);
                    x = parent;
                    parent = self.store.parent(x);
                } else {
                    if !self.is_red(self.store.left(sibling)) {
                        let near = self.store.right(sibling);
                        self.store.set_color(near, Color::Black);
                        self.store.set_color(sibling, Color::Red);
                        self.rotate_left(sibling);
                        sibling = self.store.left(parent);
                    }
                    self.store.set_color(sibling, self.store.color(parent));
                    self.store.set_color(parent, Color::Black);
                    let far = self.store.left(sibling);
                    self.store.set_color(far, Color::Black);
                    self.rotate_right(parent);
                    x = self.root;
                    parent = Index::NIL;
                }
            }
        }

        if !x.is_nil() {
            self.store.set_color(x, Color::Black);
        }
    }

    /// Unlinks a live node, rebalances and recycles its slot.
    ///
    /// A node with two children trades payload with its in-order successor,
    /// and the successor's slot is the one that leaves the tree.
    pub(crate) fn remove_at(&mut self, z: Index) -> (K, V) {
        let mut target = z;
        let z_left = self.store.left(z);
        let z_right = self.store.right(z);
        if !z_left.is_nil() && !z_right.is_nil() {
            let successor = self.minimum(z_right);
            self.store.swap_payload(z, successor);
            target = successor;
        }

        // `target` has at most one child.
        let left = self.store.left(target);
        let child = if left.is_nil() { self.store.right(target) } else { left };
        let parent = self.store.parent(target);
        if !child.is_nil() {
            self.store.set_parent(child, parent);
        }
        self.replace_child(parent, target, child);

        if self.store.color(target) == Color::Black {
            self.remove_fixup(child, parent);
        }

        self.len -= 1;
        trace_log!(slot = target.slot(), len = self.len, "node recycled");
        self.store.recycle(target)
    }
}

impl<K: Ord, V> RawRbTree<K, V> {
    /// Finds the node holding `key`.
    pub(crate) fn search<Q>(&self, key: &Q) -> Option<Index>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let mut current = self.root;
        while let Some(idx) = current.non_nil() {
            current = match key.cmp(self.store.key(idx).borrow()) {
                Ordering::Less => self.store.left(idx),
                Ordering::Greater => self.store.right(idx),
                Ordering::Equal => return Some(idx),
            };
        }
        None
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).map(|idx| self.store.value(idx))
    }

    pub(crate) fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let idx = self.search(key)?;
        Some(self.store.value_mut(idx))
    }

    pub(crate) fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.search(key).map(|idx| self.key_value(idx))
    }

    /// Inserts a key-value pair unless the key is already present.
    ///
    /// The slot is allocated after the search and before any link changes, so
    /// an allocation failure leaves the tree as it was.
    pub(crate) fn insert(&mut self, key: K, value: V) -> Result<InsertResult> {
        let mut parent = Index::NIL;
        let mut went_left = false;
        let mut current = self.root;

        while let Some(idx) = current.non_nil() {
            parent = idx;
            match key.cmp(self.store.key(idx)) {
                Ordering::Less => {
                    went_left = true;
                    current = self.store.left(idx);
                }
                Ordering::Greater => {
                    went_left = false;
                    current = self.store.right(idx);
                }
                Ordering::Equal => {
                    trace_log!(slot = idx.slot(), "duplicate key rejected");
                    return Ok(InsertResult::AlreadyPresent);
                }
            }
        }

        let z = self.store.allocate(key, value)?;
        self.store.set_parent(z, parent);
        if parent.is_nil() {
            self.root = z;
        } else if went_left {
            self.store.set_left(parent, z);
        } else {
            self.store.set_right(parent, z);
        }
        self.len += 1;

        self.insert_fixup(z);
        Ok(InsertResult::Inserted)
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let idx = self.search(key)?;
        Some(self.remove_at(idx))
    }
}
