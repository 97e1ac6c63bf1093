use core::fmt;

use super::handle::Handle;

/// Error returned when an arena cannot provide storage for another element.
///
/// The arena that reports this error is unchanged; so is any tree built on
/// top of it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("arena cannot provide storage for another element")
    }
}

impl std::error::Error for AllocError {}

/// Storage policy for tree nodes.
///
/// The tree manufactures and releases nodes exclusively through this trait,
/// so an alternative strategy (a fixed pool, an instrumented store) can be
/// injected at construction without touching the tree algorithms.
///
/// A handle returned by [`alloc`] must stay valid, and keep addressing the
/// same element, until that element is removed with [`take`] or [`release`].
///
/// [`alloc`]: Arena::alloc
/// [`take`]: Arena::take
/// [`release`]: Arena::release
pub trait Arena<T> {
    /// Stores `element` and returns a stable handle to it.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError`] if storage cannot be obtained; the arena is
    /// left unchanged.
    fn alloc(&mut self, element: T) -> Result<Handle, AllocError>;

    /// Removes the element behind `handle` and returns it, recycling the
    /// slot.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not address a live element.
    fn take(&mut self, handle: Handle) -> T;

    /// Returns a reference to the element behind `handle`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not address a live element.
    fn get(&self, handle: Handle) -> &T;

    /// Returns a mutable reference to the element behind `handle`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not address a live element.
    fn get_mut(&mut self, handle: Handle) -> &mut T;

    /// Drops the element behind `handle` and recycles the slot.
    fn release(&mut self, handle: Handle) {
        drop(self.take(handle));
    }
}

/// The default [`Arena`]: a growable slot vector with a free list.
///
/// Slots freed by [`take`] are recycled before the vector grows again. An
/// arena built with [`bounded`] additionally refuses to hold more than a
/// fixed number of live elements at a time, which makes [`AllocError`]
/// reachable for callers that want to exercise or rely on that path.
///
/// [`take`]: Arena::take
/// [`bounded`]: SlotArena::bounded
#[derive(Clone)]
pub struct SlotArena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
    limit: usize,
}

impl<T> SlotArena<T> {
    /// Creates an empty arena bounded only by the handle space.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            limit: Handle::MAX,
        }
    }

    /// Creates an empty arena with room for `capacity` elements before the
    /// slot vector reallocates.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            limit: Handle::MAX,
        }
    }

    /// Creates an empty arena that refuses to hold more than `limit` live
    /// elements at a time.
    #[must_use]
    pub fn bounded(limit: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            limit: limit.min(Handle::MAX),
        }
    }

    /// Returns the number of elements the slot vector can hold without
    /// reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns the number of live elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    /// Returns true if the arena holds no live elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> for SlotArena<T> {
    fn alloc(&mut self, element: T) -> Result<Handle, AllocError> {
        if self.len() >= self.limit {
            return Err(AllocError);
        }
        if let Some(handle) = self.free.pop() {
            // Reuse a free slot/handle.
            self.slots[handle.to_index()] = Some(element);
            Ok(handle)
        } else {
            // The free list is empty, so every slot is live and the limit
            // check above already enforced `slots.len() < Handle::MAX`.
            self.slots.push(Some(element));
            Ok(Handle::from_index(self.slots.len() - 1))
        }
    }

    #[inline]
    fn get(&self, handle: Handle) -> &T {
        self.slots[handle.to_index()].as_ref().expect("`SlotArena::get()` - `handle` is invalid!")
    }

    #[inline]
    fn get_mut(&mut self, handle: Handle) -> &mut T {
        self.slots[handle.to_index()].as_mut().expect("`SlotArena::get_mut()` - `handle` is invalid!")
    }

    fn take(&mut self, handle: Handle) -> T {
        let element = self.slots[handle.to_index()].take().expect("`SlotArena::take()` - `handle` is invalid!");
        self.free.push(handle);
        element
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn arena_capacity() {
        let arena: SlotArena<u32> = SlotArena::with_capacity(10);
        assert_eq!(arena.capacity(), 10);
    }

    #[test]
    fn bounded_arena_refuses_past_limit() {
        let mut arena: SlotArena<u32> = SlotArena::bounded(2);
        let a = arena.alloc(1).unwrap();
        let _b = arena.alloc(2).unwrap();
        assert_eq!(arena.alloc(3), Err(AllocError));
        assert_eq!(arena.len(), 2);

        // Freeing a slot makes room again, and the slot is recycled.
        arena.release(a);
        let c = arena.alloc(4).unwrap();
        assert_eq!(c, a);
        assert_eq!(*arena.get(c), 4);
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(Handle, u32)> = Vec::new();
            let mut arena: SlotArena<u32> = SlotArena::new();

            for operation in operations {
                match operation {
                    Operation::Alloc(value) => {
                        let handle = arena.alloc(value).unwrap();
                        model.push((handle, value));
                    }
                    Operation::Get(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        prop_assert_eq!(*arena.get(handle), model[index].1);
                    }
                    Operation::GetMut(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        *arena.get_mut(handle) = value;
                        model[index].1 = value;
                    }
                    Operation::Take(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        let value1 = arena.take(handle);
                        let (_, value2) = model.swap_remove(index);
                        prop_assert_eq!(value1, value2);
                    }
                    Operation::Release(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        arena.release(handle);
                        model.swap_remove(index);
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                prop_assert_eq!(arena.is_empty(), model.is_empty());

                for &(handle, value) in &model {
                    prop_assert_eq!(*arena.get(handle), value);
                }
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Alloc(u32),
        Get(usize),
        GetMut(usize, u32),
        Take(usize),
        Release(usize),
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => any::<u32>().prop_map(Operation::Alloc),
            5 => any::<usize>().prop_map(Operation::Get),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::GetMut(which, value)),
            5 => any::<usize>().prop_map(Operation::Take),
            5 => any::<usize>().prop_map(Operation::Release),
        ]
    }
}
