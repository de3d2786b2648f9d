use thiserror::Error;

/// A red black invariant that `RedBlackMap::validate` found broken.
///
/// Positions are in-order indices of the offending node, so `0` is the node holding the smallest
/// key.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantError {
    /// The root node is colored red.
    #[error("root node is red")]
    RedRoot,

    /// A red node has a red child.
    #[error("red node at position {position} has a red child")]
    RedChild { position: usize },

    /// The two subtrees of a node have different black heights.
    #[error("subtrees of node at position {position} have black heights {left} and {right}")]
    BlackHeightMismatch {
        position: usize,
        left: usize,
        right: usize,
    },

    /// A key is not strictly greater than the key before it.
    #[error("key at position {position} is not greater than its predecessor")]
    OutOfOrder { position: usize },

    /// A parent link does not point back at the node that links to it.
    #[error("parent link of node at position {position} is inconsistent")]
    BrokenParentLink { position: usize },

    /// The number of nodes reachable from the root disagrees with the number stored.
    #[error("expected {expected} nodes, but {actual} are reachable from the root")]
    LengthMismatch { expected: usize, actual: usize },
}
