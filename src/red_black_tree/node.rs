use crate::arena::Handle;
use crate::entry::Entry;

/// A possibly absent reference to a node. Absent links are treated as black leaves.
pub type Link = Option<Handle>;

/// An enum representing the color of a node in a red black tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Color {
    Red,
    Black,
}

/// Which child slot of a node a link occupies.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// A struct representing an internal node of a red black tree.
///
/// `parent` is a back-reference and must always mirror the `left`/`right` link of the parent
/// that points at this node.
pub struct Node<K, V> {
    pub entry: Entry<K, V>,
    pub color: Color,
    pub parent: Link,
    pub left: Link,
    pub right: Link,
}

impl<K, V> Node<K, V> {
    pub fn new(key: K, value: V, parent: Link) -> Self {
        Node {
            entry: Entry { key, value },
            color: Color::Red,
            parent,
            left: None,
            right: None,
        }
    }

    pub fn child(&self, side: Side) -> Link {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn child_mut(&mut self, side: Side) -> &mut Link {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}
