//! Self-balancing binary search tree that uses a color bit to ensure that the tree remains
//! approximately balanced during insertions and deletions.
//!
//! Nodes keep a link to their parent, so both insertion and deletion rebalance bottom-up with
//! `O(1)` rotations, touching `O(log n)` nodes in the worst case.

mod error;
mod map;
mod node;
mod tree;

pub use self::error::InvariantError;
pub use self::map::{RedBlackMap, RedBlackMapIntoIter, RedBlackMapIter};
