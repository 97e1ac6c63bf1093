mod arena;
mod handle;
mod node;
mod raw_bst;

pub use arena::{AllocError, Arena, SlotArena};
pub use handle::Handle;
pub use node::Node;
pub(crate) use raw_bst::RawBst;
