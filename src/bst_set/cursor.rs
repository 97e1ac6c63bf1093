use core::fmt;
use core::ptr;

use compare::Natural;

use crate::raw::{Arena, Handle, Node, RawBst, SlotArena};

/// A copyable position within a [`BstSet`]: either one element or the
/// end position one past the maximum.
///
/// Cursors are produced by [`insert`], [`find`], [`cursor_front`], and
/// [`cursor_end`], and step through the set in comparator order by walking
/// the tree's child and parent links. Stepping is O(1) amortized and
/// O(height) worst case; a full sweep over the set is O(n).
///
/// Out-of-range use — reading or advancing at the end position, or stepping
/// back from the first position — is a contract violation and panics rather
/// than returning a sentinel value.
///
/// # Examples
///
/// ```
/// use sentree::BstSet;
///
/// let mut set = BstSet::new();
/// for key in [20, 10, 30] {
///     set.insert(key).unwrap();
/// }
///
/// let mut cursor = set.cursor_front();
/// assert_eq!(*cursor.key(), 10);
/// cursor.move_next();
/// cursor.move_next();
/// assert_eq!(*cursor.key(), 30);
/// cursor.move_next();
/// assert!(cursor.is_end());
/// ```
///
/// [`BstSet`]: crate::BstSet
/// [`insert`]: crate::BstSet::insert
/// [`find`]: crate::BstSet::find
/// [`cursor_front`]: crate::BstSet::cursor_front
/// [`cursor_end`]: crate::BstSet::cursor_end
pub struct Cursor<'a, T, C = Natural<T>, A = SlotArena<Node<T>>> {
    pub(super) raw: &'a RawBst<T, C, A>,
    pub(super) node: Handle,
}

impl<'a, T, C, A: Arena<Node<T>>> Cursor<'a, T, C, A> {
    /// Returns the element this cursor is positioned on.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is at the end position.
    #[must_use]
    pub fn key(&self) -> &'a T {
        self.raw.key(self.node)
    }

    /// Returns true if the cursor is at the end position.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.raw.is_end(self.node)
    }

    /// Steps to the in-order successor; stepping off the maximum lands on
    /// the end position.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is already at the end position.
    pub fn move_next(&mut self) {
        self.node = self.raw.successor(self.node);
    }

    /// Steps to the in-order predecessor; stepping back from the end
    /// position lands on the maximum.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is at the first position (or the set is empty).
    pub fn move_prev(&mut self) {
        self.node = self.raw.predecessor(self.node);
    }
}

impl<T, C, A> Clone for Cursor<'_, T, C, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, C, A> Copy for Cursor<'_, T, C, A> {}

/// Two cursors are equal iff they reference the same node of the same set —
/// position identity, not key equality.
impl<T, C, A> PartialEq for Cursor<'_, T, C, A> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.raw, other.raw) && self.node == other.node
    }
}

impl<T, C, A> Eq for Cursor<'_, T, C, A> {}

impl<T: fmt::Debug, C, A: Arena<Node<T>>> fmt::Debug for Cursor<'_, T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_end() {
            f.write_str("Cursor(end)")
        } else {
            f.debug_tuple("Cursor").field(self.key()).finish()
        }
    }
}
