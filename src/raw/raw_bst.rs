use core::cmp::Ordering;
use core::marker::PhantomData;

use compare::Compare;

use super::arena::{AllocError, Arena};
use super::handle::Handle;
use super::node::Node;

/// The sentinel-anchored search tree backing `BstSet`.
///
/// One header node lives in the arena for the whole life of the tree. Its
/// parent link holds the root, its left link the minimum node, and its right
/// link the maximum node. The maximum node's own right link stores the
/// header handle — the back-link that lets a forward walk run off the last
/// key straight onto the end position without consulting the container. An
/// empty tree keeps the header's left and right links looped onto the header
/// itself, so begin and end coincide.
///
/// All traversal is done over child and parent links; no operation recurses
/// or keeps an auxiliary stack.
pub(crate) struct RawBst<K, C, A> {
    arena: A,
    header: Handle,
    len: usize,
    cmp: C,
    marker: PhantomData<Node<K>>,
}

impl<K, C: Clone, A: Clone> Clone for RawBst<K, C, A> {
    fn clone(&self) -> Self {
        // Handles are arena indices, so a cloned arena reproduces the whole
        // node graph and every stored link stays meaningful.
        Self {
            arena: self.arena.clone(),
            header: self.header,
            len: self.len,
            cmp: self.cmp.clone(),
            marker: PhantomData,
        }
    }
}

impl<K, C, A: Arena<Node<K>>> RawBst<K, C, A> {
    /// Creates an empty tree, allocating the header through `arena`.
    ///
    /// # Panics
    ///
    /// Panics if `arena` cannot provide the header slot.
    pub(crate) fn new(cmp: C, mut arena: A) -> Self {
        let header = arena.alloc(Node::header()).expect("`RawBst::new()` - arena cannot hold the header node!");
        let mut raw = Self {
            arena,
            header,
            len: 0,
            cmp,
            marker: PhantomData,
        };
        raw.reset_header();
        raw
    }

    /// Restores the header's empty-tree links: no root, minimum and maximum
    /// looped back onto the header.
    fn reset_header(&mut self) {
        let header = self.header;
        let node = self.arena.get_mut(header);
        node.set_parent(None);
        node.set_left(Some(header));
        node.set_right(Some(header));
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    pub(crate) const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) const fn cmp(&self) -> &C {
        &self.cmp
    }

    /// The end position: the header handle.
    pub(crate) const fn end(&self) -> Handle {
        self.header
    }

    /// The first in-order position; equals [`end`](Self::end) when empty.
    pub(crate) fn begin(&self) -> Handle {
        self.node(self.header).left().expect("`RawBst` - the header lost its minimum link!")
    }

    pub(crate) fn is_end(&self, handle: Handle) -> bool {
        handle == self.header
    }

    fn node(&self, handle: Handle) -> &Node<K> {
        self.arena.get(handle)
    }

    fn node_mut(&mut self, handle: Handle) -> &mut Node<K> {
        self.arena.get_mut(handle)
    }

    /// Returns the key behind `handle`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is the end position.
    pub(crate) fn key(&self, handle: Handle) -> &K {
        self.node(handle).key()
    }

    fn root(&self) -> Option<Handle> {
        self.node(self.header).parent()
    }

    fn parent_of(&self, handle: Handle) -> Handle {
        self.node(handle).parent().expect("`RawBst` - a linked node lost its parent link!")
    }

    /// Left child of `handle`. Left links never alias the header.
    fn left_child(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).left()
    }

    /// Right child of `handle`, masking the maximum's back-link.
    fn right_child(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).right().filter(|&right| right != self.header)
    }

    /// Leftmost node of the subtree rooted at `handle`.
    fn leftmost(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self.left_child(handle) {
            handle = left;
        }
        handle
    }

    /// Rightmost node of the subtree rooted at `handle`.
    fn rightmost(&self, mut handle: Handle) -> Handle {
        while let Some(right) = self.right_child(handle) {
            handle = right;
        }
        handle
    }

    /// Handle of the minimum node, if any.
    pub(crate) fn first(&self) -> Option<Handle> {
        let begin = self.begin();
        (begin != self.header).then_some(begin)
    }

    /// Handle of the maximum node, if any.
    pub(crate) fn last(&self) -> Option<Handle> {
        let last = self.node(self.header).right().expect("`RawBst` - the header lost its maximum link!");
        (last != self.header).then_some(last)
    }

    /// In-order successor: the leftmost node of a real right subtree, the
    /// end position if the right link is the header back-link, and otherwise
    /// the first ancestor reached from a left child.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is already the end position.
    pub(crate) fn successor(&self, handle: Handle) -> Handle {
        assert!(handle != self.header, "`RawBst::successor()` - cannot step past the end position!");
        if let Some(right) = self.node(handle).right() {
            if right == self.header {
                return self.header;
            }
            return self.leftmost(right);
        }
        let mut current = handle;
        loop {
            let parent = self.parent_of(current);
            if self.node(parent).left() == Some(current) {
                return parent;
            }
            current = parent;
        }
    }

    /// In-order predecessor, the mirror of [`successor`](Self::successor).
    /// Stepping back from the end position yields the maximum via the
    /// header's cache.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is the first position (or the tree is empty).
    pub(crate) fn predecessor(&self, handle: Handle) -> Handle {
        assert!(handle != self.begin(), "`RawBst::predecessor()` - cannot step before the first position!");
        if handle == self.header {
            return self.node(self.header).right().expect("`RawBst` - the header lost its maximum link!");
        }
        if let Some(left) = self.left_child(handle) {
            return self.rightmost(left);
        }
        let mut current = handle;
        loop {
            let parent = self.parent_of(current);
            if self.node(parent).right() == Some(current) {
                return parent;
            }
            current = parent;
        }
    }

    /// Locates `key`, returning the end position when it is absent.
    pub(crate) fn find<Q: ?Sized>(&self, key: &Q) -> Handle
    where
        C: Compare<Q, K>,
    {
        let mut current = self.root();
        while let Some(handle) = current {
            match self.cmp.compare(key, self.node(handle).key()) {
                Ordering::Less => current = self.left_child(handle),
                Ordering::Greater => current = self.right_child(handle),
                Ordering::Equal => return handle,
            }
        }
        self.header
    }

    /// Inserts `key`, keeping keys unique: an equivalent key already in the
    /// tree is returned as `(existing, false)` with nothing mutated.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] when node storage cannot be obtained. The
    /// attachment point is located before allocating and links are written
    /// only afterwards, so a failed insertion leaves the tree unchanged.
    pub(crate) fn insert(&mut self, key: K) -> Result<(Handle, bool), AllocError>
    where
        C: Compare<K>,
    {
        let header = self.header;

        let Some(root) = self.root() else {
            let handle = self.arena.alloc(Node::new(key))?;
            let node = self.arena.get_mut(handle);
            node.set_parent(Some(header));
            // The sole node is the maximum; it carries the back-link.
            node.set_right(Some(header));
            let head = self.arena.get_mut(header);
            head.set_parent(Some(handle));
            head.set_left(Some(handle));
            head.set_right(Some(handle));
            self.len = 1;
            return Ok((handle, true));
        };

        let mut current = root;
        let went_left = loop {
            match self.cmp.compare(&key, self.node(current).key()) {
                Ordering::Less => match self.left_child(current) {
                    Some(left) => current = left,
                    None => break true,
                },
                Ordering::Greater => match self.right_child(current) {
                    Some(right) => current = right,
                    None => break false,
                },
                Ordering::Equal => return Ok((current, false)),
            }
        };

        let handle = self.arena.alloc(Node::new(key))?;
        self.node_mut(handle).set_parent(Some(current));
        if went_left {
            // A left attachment under the old minimum is the new minimum.
            let new_min = self.node(header).left() == Some(current);
            self.node_mut(current).set_left(Some(handle));
            if new_min {
                self.node_mut(header).set_left(Some(handle));
            }
        } else {
            // A right attachment under the old maximum is the new maximum;
            // it takes over the back-link.
            let new_max = self.node(current).right() == Some(header);
            self.node_mut(current).set_right(Some(handle));
            if new_max {
                self.node_mut(handle).set_right(Some(header));
                self.node_mut(header).set_right(Some(handle));
            }
        }
        self.len += 1;
        Ok((handle, true))
    }

    /// Removes the node holding a key equivalent to `key`, returning the
    /// stored key.
    pub(crate) fn remove<Q: ?Sized>(&mut self, key: &Q) -> Option<K>
    where
        C: Compare<Q, K>,
    {
        let handle = self.find(key);
        (handle != self.header).then(|| self.detach(handle))
    }

    /// Replaces the subtree rooted at `out` with the subtree rooted at
    /// `with` in the eyes of `out`'s parent. `out`'s own links are left
    /// untouched.
    fn transplant(&mut self, out: Handle, with: Option<Handle>) {
        let parent = self.parent_of(out);
        if parent == self.header {
            // `out` is the root; the header's parent link is the root slot.
            self.node_mut(parent).set_parent(with);
        } else if self.node(parent).left() == Some(out) {
            self.node_mut(parent).set_left(with);
        } else {
            self.node_mut(parent).set_right(with);
        }
        if let Some(with) = with {
            self.node_mut(with).set_parent(Some(parent));
        }
    }

    /// Unlinks the node behind `handle`, releases its storage, and returns
    /// its key. Handles to all other nodes stay valid: the two-children case
    /// splices the in-order successor into the vacated structural position
    /// instead of moving keys between nodes.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is the end position.
    pub(crate) fn detach(&mut self, handle: Handle) -> K {
        assert!(!self.node(handle).is_header(), "`RawBst::detach()` - cannot detach the end position!");
        let header = self.header;
        let was_min = self.node(header).left() == Some(handle);
        let was_max = self.node(header).right() == Some(handle);

        // Strip the back-link for the duration of the splice; the
        // restructure below then works on plain child links only.
        if was_max {
            self.node_mut(handle).set_right(None);
        }

        match (self.node(handle).left(), self.node(handle).right()) {
            (None, other) | (other, None) => {
                // At most one child: splice it (or nothing) into place.
                self.transplant(handle, other);
            }
            (Some(left), Some(right)) => {
                // Two children: the in-order successor — the leftmost node
                // of the right subtree, which has no left child — takes over
                // the vacated position.
                let succ = self.leftmost(right);
                if self.node(succ).parent() != Some(handle) {
                    let succ_right = self.node(succ).right();
                    self.transplant(succ, succ_right);
                    self.node_mut(succ).set_right(Some(right));
                    self.node_mut(right).set_parent(Some(succ));
                }
                self.transplant(handle, Some(succ));
                self.node_mut(succ).set_left(Some(left));
                self.node_mut(left).set_parent(Some(succ));
            }
        }

        // Re-derive the header caches that named the detached node.
        if let Some(root) = self.root() {
            if was_min {
                let min = self.leftmost(root);
                self.node_mut(header).set_left(Some(min));
            }
            if was_max {
                let max = self.rightmost(root);
                self.node_mut(max).set_right(Some(header));
                self.node_mut(header).set_right(Some(max));
            }
        } else {
            self.reset_header();
        }

        self.len -= 1;
        self.arena.take(handle).into_key()
    }

    /// Keeps only the keys for which `pred` returns true, releasing the
    /// rest in one ordered pass.
    pub(crate) fn retain<F>(&mut self, mut pred: F)
    where
        F: FnMut(&K) -> bool,
    {
        let mut current = self.begin();
        while current != self.header {
            // The successor survives a detach of `current` (a two-children
            // splice relinks it in place), so it can be taken first.
            let next = self.successor(current);
            if !pred(self.key(current)) {
                self.detach(current);
            }
            current = next;
        }
    }

    /// Releases every real node and restores the empty-tree header links.
    ///
    /// The walk is iterative post-order: dive to a leaf, release it, resume
    /// from its parent. Children are unhooked from their parent before
    /// release so the dive never revisits a freed slot.
    pub(crate) fn clear(&mut self) {
        if let Some(root) = self.root() {
            let mut current = root;
            loop {
                loop {
                    if let Some(left) = self.left_child(current) {
                        current = left;
                    } else if let Some(right) = self.right_child(current) {
                        current = right;
                    } else {
                        break;
                    }
                }
                let parent = self.parent_of(current);
                if parent != self.header {
                    if self.node(parent).left() == Some(current) {
                        self.node_mut(parent).set_left(None);
                    } else {
                        self.node_mut(parent).set_right(None);
                    }
                }
                self.arena.release(current);
                if parent == self.header {
                    break;
                }
                current = parent;
            }
        }
        self.reset_header();
        self.len = 0;
    }

    /// Takes every key out of the tree in ascending order, leaving the tree
    /// empty. The handles are collected first so that releasing slots never
    /// races the walk that orders them.
    pub(crate) fn drain_in_order(&mut self) -> Vec<K> {
        let mut handles = Vec::with_capacity(self.len);
        let mut current = self.begin();
        while current != self.header {
            handles.push(current);
            current = self.successor(current);
        }
        let keys = handles.into_iter().map(|handle| self.arena.take(handle).into_key()).collect();
        self.reset_header();
        self.len = 0;
        keys
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::raw::arena::SlotArena;
    use compare::{Compare, Natural, natural};
    use proptest::prelude::*;

    type IntBst = RawBst<i32, Natural<i32>, SlotArena<Node<i32>>>;

    fn bst() -> IntBst {
        RawBst::new(natural(), SlotArena::new())
    }

    impl IntBst {
        /// Walks the whole tree and panics if any structural invariant is
        /// violated: parent/child coherence, ordering, the header caches,
        /// the back-link, and the length.
        fn validate_invariants(&self) {
            let header = self.node(self.header);
            assert!(header.is_header(), "header handle must address the keyless node");

            let Some(root) = self.root() else {
                assert_eq!(self.len, 0, "empty tree must have len 0");
                assert_eq!(header.left(), Some(self.header), "empty tree: min cache must self-loop");
                assert_eq!(header.right(), Some(self.header), "empty tree: max cache must self-loop");
                return;
            };

            assert_eq!(self.node(root).parent(), Some(self.header), "root must point back at the header");

            // In-order walk from begin checks ordering, count, and link
            // coherence in one pass.
            let mut count = 0;
            let mut previous: Option<i32> = None;
            let mut current = self.begin();
            while current != self.header {
                let node = self.node(current);
                if let Some(left) = node.left() {
                    assert_eq!(self.node(left).parent(), Some(current), "left child must point back at its parent");
                }
                if let Some(right) = node.right()
                    && right != self.header
                {
                    assert_eq!(self.node(right).parent(), Some(current), "right child must point back at its parent");
                }
                let key = *node.key();
                if let Some(previous) = previous {
                    assert!(self.cmp.compares_lt(&previous, &key), "in-order walk must be strictly increasing");
                }
                previous = Some(key);
                count += 1;
                current = self.successor(current);
            }
            assert_eq!(count, self.len, "len must match the traversal count");

            let min = self.leftmost(root);
            let max = self.rightmost(root);
            assert_eq!(self.node(self.header).left(), Some(min), "min cache mismatch");
            assert_eq!(self.node(self.header).right(), Some(max), "max cache mismatch");
            assert_eq!(self.node(max).right(), Some(self.header), "maximum must carry the header back-link");
        }
    }

    #[test]
    fn empty_tree_invariants() {
        let tree = bst();
        assert_eq!(tree.len(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.begin(), tree.end());
        tree.validate_invariants();
    }

    #[test]
    fn single_node_is_root_min_and_max() {
        let mut tree = bst();
        let (handle, inserted) = tree.insert(42).unwrap();
        assert!(inserted);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.begin(), handle);
        assert_eq!(tree.first(), Some(handle));
        assert_eq!(tree.last(), Some(handle));
        assert_eq!(tree.successor(handle), tree.end());
        tree.validate_invariants();
    }

    #[test]
    fn duplicate_insert_reports_existing_node() {
        let mut tree = bst();
        let (first, _) = tree.insert(7).unwrap();
        let (second, inserted) = tree.insert(7).unwrap();
        assert!(!inserted);
        assert_eq!(first, second);
        assert_eq!(tree.len(), 1);
        tree.validate_invariants();
    }

    #[test]
    fn back_link_moves_with_the_maximum() {
        let mut tree = bst();
        for key in [10, 20, 30, 25] {
            tree.insert(key).unwrap();
            tree.validate_invariants();
        }
        // Detaching the maximum hands the back-link to its predecessor.
        assert_eq!(tree.remove(&30), Some(30));
        tree.validate_invariants();
        let last = tree.last().unwrap();
        assert_eq!(*tree.key(last), 25);
    }

    #[test]
    fn detach_two_children_splices_the_successor() {
        let mut tree = bst();
        for key in [50, 30, 70, 20, 40, 60, 80] {
            tree.insert(key).unwrap();
        }
        // The root has two children; its successor (60) must take its place
        // without disturbing any other node.
        assert_eq!(tree.remove(&50), Some(50));
        tree.validate_invariants();
        assert_eq!(tree.len(), 6);
        assert!(tree.is_end(tree.find(&50)));
        for key in [20, 30, 40, 60, 70, 80] {
            assert!(!tree.is_end(tree.find(&key)));
        }
    }

    #[test]
    fn clear_releases_everything_and_resets_the_header() {
        let mut tree = bst();
        for key in 0..100 {
            tree.insert(key).unwrap();
        }
        tree.clear();
        assert!(tree.is_empty());
        tree.validate_invariants();
        // The tree stays usable after a clear.
        tree.insert(5).unwrap();
        tree.validate_invariants();
    }

    #[test]
    fn drain_yields_sorted_keys() {
        let mut tree = bst();
        for key in [3, 1, 4, 1, 5, 9, 2, 6] {
            tree.insert(key).unwrap();
        }
        assert_eq!(tree.drain_in_order(), vec![1, 2, 3, 4, 5, 6, 9]);
        assert!(tree.is_empty());
        tree.validate_invariants();
    }

    proptest! {
        #[test]
        fn random_ops_preserve_invariants(ops in prop::collection::vec((any::<bool>(), -50i32..50), 1..200)) {
            let mut tree = bst();
            for (insert, key) in ops {
                if insert {
                    tree.insert(key).unwrap();
                } else {
                    tree.remove(&key);
                }
                tree.validate_invariants();
            }
        }
    }
}
