//! An ordered map implemented as a red black tree.
//!
//! # Examples
//!
//! ```
//! use red_black_map::RedBlackMap;
//!
//! let mut map = RedBlackMap::new();
//! map.insert(2, "b");
//! map.insert(1, "a");
//!
//! assert_eq!(map.get(&1), Some(&"a"));
//! assert_eq!(map.traverse(), vec![&1, &2]);
//! assert_eq!(map.remove(&3), None);
//! ```

mod arena;
mod entry;
pub mod red_black_tree;

pub use crate::red_black_tree::{InvariantError, RedBlackMap};
