use alloc::vec;

use smallvec::SmallVec;

use super::index::Index;
use super::node_store::Color;
use super::raw_rb_tree::RawRbTree;
use crate::error::Violation;

impl<K: Ord, V> RawRbTree<K, V> {
    /// Walks the freelist, then the tree, then the in-order sequence.
    ///
    /// Every slot is marked on first visit, so corrupt links that form a cycle
    /// or share a subtree are reported instead of looping.
    pub(crate) fn validate(&self) -> Result<(), Violation> {
        let store = self.store();
        let capacity = store.capacity();
        let mut seen = vec![false; capacity];

        let mut free = 0;
        let mut cursor = store.free_head();
        while let Some(idx) = cursor.non_nil() {
            let slot = idx.slot();
            if seen[slot] || store.is_live(idx) {
                return Err(Violation::SharedSlot { slot });
            }
            seen[slot] = true;
            free += 1;
            cursor = store.parent(idx);
        }

        let root = self.root();
        let mut reachable = 0;
        if let Some(root) = root.non_nil() {
            if store.color(root) == Color::Red {
                return Err(Violation::RedRoot { slot: root.slot() });
            }
            if !store.parent(root).is_nil() {
                return Err(Violation::ParentLink { slot: root.slot() });
            }

            // (node, black nodes strictly above it)
            let mut stack: SmallVec<[(Index, usize); 64]> = SmallVec::new();
            stack.push((root, 0));
            let mut black_height = None;

            while let Some((idx, above)) = stack.pop() {
                let slot = idx.slot();
                if seen[slot] || !store.is_live(idx) {
                    return Err(Violation::SharedSlot { slot });
                }
                seen[slot] = true;
                reachable += 1;

                let red = store.color(idx) == Color::Red;
                let depth = above + usize::from(!red);
                for child in [store.left(idx), store.right(idx)] {
                    match child.non_nil() {
                        Some(child) => {
                            if store.parent(child) != idx {
                                return Err(Violation::ParentLink { slot: child.slot() });
                            }
                            if red && store.color(child) == Color::Red {
                                return Err(Violation::RedRed { slot });
                            }
                            stack.push((child, depth));
                        }
                        None => {
                            // Paths end at the sentinel, which counts as black.
                            let height = depth + 1;
                            if *black_height.get_or_insert(height) != height {
                                return Err(Violation::BlackHeight { slot });
                            }
                        }
                    }
                }
            }
        }

        if reachable != self.len() {
            return Err(Violation::Count {
                reachable,
                count: self.len(),
            });
        }
        if reachable + free != capacity {
            return Err(Violation::Capacity {
                live: reachable,
                free,
                capacity,
            });
        }

        // The links now form a proper tree, so successor walks terminate.
        let mut prev = self.first().non_nil();
        while let Some(a) = prev {
            let next = self.successor(a).non_nil();
            if let Some(b) = next {
                if store.key(a) >= store.key(b) {
                    return Err(Violation::Order { slot: b.slot() });
                }
            }
            prev = next;
        }

        Ok(())
    }
}
