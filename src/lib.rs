//! A sentinel-anchored binary search tree ordered set.
//!
//! This crate provides [`BstSet`], an ordered set of unique keys built on a
//! plain (unbalanced) binary search tree in which every node carries a
//! parent link. A keyless header node anchors the tree: it holds the root,
//! caches the minimum and maximum positions for O(1) access to both ends,
//! and doubles as the stable end position that cursors and iterators step
//! onto when they run off the last key. Because successor and predecessor
//! are computed from the parent links alone, iteration needs no recursion
//! and no auxiliary stack — a property that holds even for fully degenerate
//! trees.
//!
//! # Example
//!
//! ```
//! use sentree::BstSet;
//!
//! let mut set = BstSet::new();
//!
//! set.insert(20).unwrap();
//! set.insert(10).unwrap();
//! set.insert(30).unwrap();
//!
//! // Walk the set in order with a cursor.
//! let mut cursor = set.cursor_front();
//! assert_eq!(*cursor.key(), 10);
//! cursor.move_next();
//! assert_eq!(*cursor.key(), 20);
//! cursor.move_next();
//! assert_eq!(*cursor.key(), 30);
//! cursor.move_next();
//! assert!(cursor.is_end());
//!
//! // Or with an ordinary iterator.
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), [10, 20, 30]);
//! ```
//!
//! # Features
//!
//! - **Pluggable comparator** — the sort order is a value, not just a trait
//!   bound: `BstSet::new()` uses the natural [`Ord`] order via
//!   [`compare::natural`], and [`BstSet::with_cmp`] accepts any
//!   [`compare::Compare`] implementation.
//! - **Pluggable node storage** — nodes live in an [`Arena`]; the default
//!   [`SlotArena`] recycles slots through a free list, and a bounded arena
//!   turns exhaustion into a typed [`AllocError`] that `insert` propagates
//!   with the set untouched.
//! - **Cursors** — [`insert`](BstSet::insert) and [`find`](BstSet::find)
//!   return a [`Cursor`] that dereferences to the key and steps in either
//!   direction.
//!
//! # Implementation
//!
//! The tree performs no rebalancing; its shape is dictated entirely by the
//! insertion sequence. Operations are O(height): logarithmic on shuffled
//! input, linear in the adversarial case. Deletion splices the in-order
//! successor into the vacated position instead of moving keys between
//! nodes, so cursors to surviving elements stay valid across removals.

// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod raw;

pub mod bst_set;

pub use bst_set::{BstSet, Cursor, IntoIter, Iter};
pub use raw::{AllocError, Arena, Handle, Node, SlotArena};
