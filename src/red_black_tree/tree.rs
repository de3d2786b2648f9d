use crate::arena::{Arena, Handle};
use crate::entry::Entry;
use crate::red_black_tree::error::InvariantError;
use crate::red_black_tree::node::{Color, Link, Node, Side};
use log::{debug, trace};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;
use std::ops::{Index, IndexMut};

/// Outcome of descending the tree looking for a key.
pub enum Search {
    Found(Handle),
    // the parent the key would hang from and on which side, `None` if the tree is empty
    Vacant(Option<(Handle, Side)>),
}

/// A red black tree whose nodes live in an arena and link to each other, and to their parents,
/// through arena handles.
pub struct Tree<K, V> {
    arena: Arena<Node<K, V>>,
    root: Link,
}

impl<K, V> Index<Handle> for Tree<K, V> {
    type Output = Node<K, V>;

    fn index(&self, handle: Handle) -> &Self::Output {
        &self.arena[handle]
    }
}

impl<K, V> IndexMut<Handle> for Tree<K, V> {
    fn index_mut(&mut self, handle: Handle) -> &mut Self::Output {
        &mut self.arena[handle]
    }
}

impl<K, V> Tree<K, V> {
    pub fn new(chunk_size: usize) -> Self {
        Tree {
            arena: Arena::new(chunk_size),
            root: None,
        }
    }

    pub fn root(&self) -> Link {
        self.root
    }

    pub fn chunk_size(&self) -> usize {
        self.arena.chunk_size()
    }

    /// Reports the color of a link, treating absent links as black.
    pub fn color(&self, link: Link) -> Color {
        match link {
            None => Color::Black,
            Some(handle) => self[handle].color,
        }
    }

    pub fn is_red(&self, link: Link) -> bool {
        self.color(link) == Color::Red
    }

    // precondition: `child` is a child of `parent`
    fn side_of(&self, child: Handle, parent: Handle) -> Side {
        if self[parent].left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn set_child(&mut self, parent: Handle, side: Side, child: Link) {
        *self[parent].child_mut(side) = child;
        if let Some(child) = child {
            self[child].parent = Some(parent);
        }
    }

    // points whatever linked to `old` (its parent or the root) at `new`
    fn replace_in_parent(&mut self, old: Handle, new: Handle) {
        let parent = self[old].parent;
        self[new].parent = parent;
        match parent {
            None => self.root = Some(new),
            Some(parent) => {
                let side = self.side_of(old, parent);
                *self[parent].child_mut(side) = Some(new);
            },
        }
    }

    /// Rotates `x` towards `side`, so that its child on the opposite side takes its position.
    pub fn rotate(&mut self, x: Handle, side: Side) {
        match side {
            Side::Left => self.rotate_left(x),
            Side::Right => self.rotate_right(x),
        }
    }

    /// Lifts the right child of `x` into its position. Preserves the in-order sequence of keys.
    ///
    /// # Panics
    ///
    /// Panics if `x` has no right child.
    pub fn rotate_left(&mut self, x: Handle) {
        let y = self[x].right.expect("Expected Right child node to be `Some`.");
        let beta = self[y].left;

        self[x].right = beta;
        if let Some(beta) = beta {
            self[beta].parent = Some(x);
        }
        self.replace_in_parent(x, y);
        self[y].left = Some(x);
        self[x].parent = Some(y);
    }

    /// Lifts the left child of `y` into its position. Preserves the in-order sequence of keys.
    ///
    /// # Panics
    ///
    /// Panics if `y` has no left child.
    pub fn rotate_right(&mut self, y: Handle) {
        let x = self[y].left.expect("Expected Left child node to be `Some`.");
        let beta = self[x].right;

        self[y].left = beta;
        if let Some(beta) = beta {
            self[beta].parent = Some(y);
        }
        self.replace_in_parent(y, x);
        self[x].right = Some(y);
        self[y].parent = Some(x);
    }

    pub fn search<Q>(&self, key: &Q) -> Search
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut parent = None;
        let mut curr = self.root;
        while let Some(handle) = curr {
            let node = &self[handle];
            let side = match key.cmp(node.entry.key.borrow()) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return Search::Found(handle),
            };
            parent = Some((handle, side));
            curr = node.child(side);
        }
        Search::Vacant(parent)
    }

    /// Inserts a key-value pair, returning the replaced entry if the key already existed.
    pub fn insert(&mut self, key: K, value: V) -> Option<Entry<K, V>>
    where
        K: Ord,
    {
        match self.search(&key) {
            Search::Found(handle) => {
                Some(mem::replace(&mut self[handle].entry, Entry { key, value }))
            },
            Search::Vacant(position) => {
                let parent = position.map(|(parent, _)| parent);
                let handle = self.arena.allocate(Node::new(key, value, parent));
                match position {
                    None => self.root = Some(handle),
                    Some((parent, side)) => self.set_child(parent, side, Some(handle)),
                }
                self.insert_fixup(handle);
                None
            },
        }
    }

    fn insert_fixup(&mut self, mut curr: Handle) {
        while let Some(parent) = self[curr].parent {
            if self[parent].color == Color::Black {
                break;
            }
            let grandparent = self[parent]
                .parent
                .expect("Expected a red node to have a parent.");
            let side = self.side_of(parent, grandparent);
            let uncle = self[grandparent].child(side.opposite());

            match uncle {
                Some(uncle) if self[uncle].color == Color::Red => {
                    trace!("insert fixup: recoloring around red uncle");
                    self[parent].color = Color::Black;
                    self[uncle].color = Color::Black;
                    self[grandparent].color = Color::Red;
                    curr = grandparent;
                },
                _ => {
                    let mut parent = parent;
                    if self[parent].child(side.opposite()) == Some(curr) {
                        trace!("insert fixup: rotating inner grandchild outwards");
                        self.rotate(parent, side);
                        curr = parent;
                        parent = self[curr]
                            .parent
                            .expect("Expected rotated node to have a parent.");
                    }
                    trace!("insert fixup: rotating grandparent towards black uncle");
                    self[parent].color = Color::Black;
                    self[grandparent].color = Color::Red;
                    self.rotate(grandparent, side.opposite());
                    break;
                },
            }
        }

        if let Some(root) = self.root {
            self[root].color = Color::Black;
        }
    }

    // replaces the subtree rooted at `target` with the subtree rooted at `replacement`
    fn transplant(&mut self, target: Handle, replacement: Link) {
        let parent = self[target].parent;
        match parent {
            None => self.root = replacement,
            Some(parent) => {
                let side = self.side_of(target, parent);
                *self[parent].child_mut(side) = replacement;
            },
        }
        if let Some(replacement) = replacement {
            self[replacement].parent = parent;
        }
    }

    fn minimum(&self, mut curr: Handle) -> Handle {
        while let Some(left) = self[curr].left {
            curr = left;
        }
        curr
    }

    /// Removes a key from the tree, returning its entry. Returns `None` and leaves the tree
    /// untouched if the key does not exist.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let target = match self.search(key) {
            Search::Found(handle) => handle,
            Search::Vacant(_) => {
                debug!("remove: key not present, nothing to do");
                return None;
            },
        };

        // `spliced` is the node physically unlinked, `x` the link that moved into its place and
        // `x_parent` the node `x` now hangs from
        let (spliced, x, x_parent) = match (self[target].left, self[target].right) {
            (None, child) | (child, None) => {
                let x_parent = self[target].parent;
                self.transplant(target, child);
                (target, child, x_parent)
            },
            (Some(_), Some(right)) => {
                let successor = self.minimum(right);
                let x = self[successor].right;
                let x_parent = self[successor].parent;
                self.transplant(successor, x);
                (successor, x, x_parent)
            },
        };

        let spliced_color = self[spliced].color;
        let mut node = self.arena.free(spliced);
        if spliced != target {
            mem::swap(&mut node.entry, &mut self[target].entry);
        }

        if spliced_color == Color::Black {
            self.remove_fixup(x, x_parent);
        }

        Some(node.entry)
    }

    fn remove_fixup(&mut self, mut x: Link, mut parent: Link) {
        while x != self.root && self.color(x) == Color::Black {
            let p = match parent {
                Some(p) => p,
                None => break,
            };
            let side = if self[p].left == x { Side::Left } else { Side::Right };
            let mut sibling = self[p]
                .child(side.opposite())
                .expect("Expected sibling of a doubly black link to be `Some`.");

            if self[sibling].color == Color::Red {
                trace!("remove fixup: rotating red sibling into parent position");
                self[sibling].color = Color::Black;
                self[p].color = Color::Red;
                self.rotate(p, side);
                sibling = self[p]
                    .child(side.opposite())
                    .expect("Expected sibling of a doubly black link to be `Some`.");
            }

            let near = self[sibling].child(side);
            let far = self[sibling].child(side.opposite());
            if !self.is_red(near) && !self.is_red(far) {
                trace!("remove fixup: recoloring sibling and moving deficiency up");
                self[sibling].color = Color::Red;
                x = Some(p);
                parent = self[p].parent;
            } else {
                if !self.is_red(far) {
                    trace!("remove fixup: rotating red near nephew outwards");
                    if let Some(near) = near {
                        self[near].color = Color::Black;
                    }
                    self[sibling].color = Color::Red;
                    self.rotate(sibling, side.opposite());
                    sibling = self[p]
                        .child(side.opposite())
                        .expect("Expected sibling of a doubly black link to be `Some`.");
                }
                trace!("remove fixup: rotating parent towards doubly black link");
                self[sibling].color = self[p].color;
                self[p].color = Color::Black;
                if let Some(far) = self[sibling].child(side.opposite()) {
                    self[far].color = Color::Black;
                }
                self.rotate(p, side);
                x = self.root;
                parent = None;
            }
        }

        if let Some(x) = x {
            self[x].color = Color::Black;
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(handle) => Some(&self[handle].entry),
            Search::Vacant(_) => None,
        }
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self.search(key) {
            Search::Found(handle) => Some(&mut self[handle].entry),
            Search::Vacant(_) => None,
        }
    }

    pub fn ceil<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut ret = None;
        let mut curr = self.root;
        while let Some(handle) = curr {
            let node = &self[handle];
            match key.cmp(node.entry.key.borrow()) {
                Ordering::Greater => curr = node.right,
                Ordering::Less => {
                    ret = Some(&node.entry);
                    curr = node.left;
                },
                Ordering::Equal => return Some(&node.entry),
            }
        }
        ret
    }

    pub fn floor<Q>(&self, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut ret = None;
        let mut curr = self.root;
        while let Some(handle) = curr {
            let node = &self[handle];
            match key.cmp(node.entry.key.borrow()) {
                Ordering::Less => curr = node.left,
                Ordering::Greater => {
                    ret = Some(&node.entry);
                    curr = node.right;
                },
                Ordering::Equal => return Some(&node.entry),
            }
        }
        ret
    }

    pub fn min(&self) -> Option<&Entry<K, V>> {
        self.root.map(|root| &self[self.minimum(root)].entry)
    }

    pub fn max(&self) -> Option<&Entry<K, V>> {
        self.root.map(|root| {
            let mut curr = root;
            while let Some(right) = self[curr].right {
                curr = right;
            }
            &self[curr].entry
        })
    }

    /// Releases a node's storage without unlinking it. Only used while tearing the tree down in
    /// order, when links into freed nodes are never followed again.
    pub fn take(&mut self, handle: Handle) -> Node<K, V> {
        self.arena.free(handle)
    }

    /// Checks every red black invariant, the parent links and the key order. Returns the black
    /// height and the number of nodes reached from the root.
    pub fn validate(&self) -> Result<(usize, usize), InvariantError>
    where
        K: Ord,
    {
        if self.is_red(self.root) {
            return Err(InvariantError::RedRoot);
        }
        let mut position = 0;
        let mut prev = None;
        let black_height = self.validate_subtree(self.root, None, &mut position, &mut prev)?;
        if position != self.arena.len() {
            return Err(InvariantError::LengthMismatch {
                expected: self.arena.len(),
                actual: position,
            });
        }
        Ok((black_height, position))
    }

    fn validate_subtree(
        &self,
        link: Link,
        parent: Link,
        position: &mut usize,
        prev: &mut Option<Handle>,
    ) -> Result<usize, InvariantError>
    where
        K: Ord,
    {
        let handle = match link {
            None => return Ok(0),
            Some(handle) => handle,
        };
        let node = &self[handle];

        let left_height = self.validate_subtree(node.left, link, position, prev)?;

        let here = *position;
        *position += 1;
        if node.parent != parent {
            return Err(InvariantError::BrokenParentLink { position: here });
        }
        if let Some(prev) = *prev {
            if self[prev].entry.key >= node.entry.key {
                return Err(InvariantError::OutOfOrder { position: here });
            }
        }
        *prev = Some(handle);
        if node.color == Color::Red && (self.is_red(node.left) || self.is_red(node.right)) {
            return Err(InvariantError::RedChild { position: here });
        }

        let right_height = self.validate_subtree(node.right, link, position, prev)?;
        if left_height != right_height {
            return Err(InvariantError::BlackHeightMismatch {
                position: here,
                left: left_height,
                right: right_height,
            });
        }

        match node.color {
            Color::Black => Ok(left_height + 1),
            Color::Red => Ok(left_height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Search, Tree};
    use crate::red_black_tree::error::InvariantError;
    use crate::red_black_tree::node::{Color, Link, Side};

    type Shape = Vec<(u32, Option<u32>, Option<u32>, Option<u32>, Color)>;

    fn key_of(tree: &Tree<u32, u32>, link: Link) -> Option<u32> {
        link.map(|handle| tree[handle].entry.key)
    }

    fn keys(tree: &Tree<u32, u32>) -> Vec<u32> {
        shape(tree).into_iter().map(|(key, ..)| key).collect()
    }

    // in-order snapshot of every node's key, links and color
    fn shape(tree: &Tree<u32, u32>) -> Shape {
        fn walk(tree: &Tree<u32, u32>, link: Link, ret: &mut Shape) {
            if let Some(handle) = link {
                let node = &tree[handle];
                walk(tree, node.left, ret);
                ret.push((
                    node.entry.key,
                    key_of(tree, node.parent),
                    key_of(tree, node.left),
                    key_of(tree, node.right),
                    node.color,
                ));
                walk(tree, node.right, ret);
            }
        }
        let mut ret = Vec::new();
        walk(tree, tree.root(), &mut ret);
        ret
    }

    fn find(tree: &Tree<u32, u32>, key: u32) -> super::Handle {
        match tree.search(&key) {
            Search::Found(handle) => handle,
            Search::Vacant(_) => panic!("Expected key {} to be present.", key),
        }
    }

    fn balanced_tree() -> Tree<u32, u32> {
        let mut tree = Tree::new(16);
        for key in &[8, 4, 12, 2, 6, 10, 14, 1, 3, 5, 7, 9, 11, 13, 15] {
            tree.insert(*key, key * 10);
        }
        tree
    }

    #[test]
    fn test_color_of_absent_link_is_black() {
        let tree: Tree<u32, u32> = Tree::new(16);
        assert_eq!(tree.color(None), Color::Black);
        assert!(!tree.is_red(tree.root()));
    }

    #[test]
    fn test_search_reports_insertion_parent() {
        let tree = balanced_tree();
        match tree.search(&16) {
            Search::Vacant(Some((parent, side))) => {
                assert_eq!(tree[parent].entry.key, 15);
                assert_eq!(side, Side::Right);
            },
            _ => panic!("Expected 16 to be vacant under 15."),
        }
        match Tree::<u32, u32>::new(16).search(&1) {
            Search::Vacant(None) => {},
            _ => panic!("Expected empty tree to have no insertion parent."),
        }
    }

    #[test]
    fn test_ascending_insertions_stay_balanced() {
        let mut tree = Tree::new(16);
        for key in 1..=15 {
            tree.insert(key, key);
            assert!(tree.validate().is_ok(), "invalid after inserting {}", key);
        }
        assert_eq!(keys(&tree), (1..=15).collect::<Vec<u32>>());
    }

    #[test]
    fn test_level_order_insertions_build_perfect_tree() {
        let tree = balanced_tree();
        assert_eq!(key_of(&tree, tree.root()), Some(8));
        assert_eq!(tree.validate(), Ok((2, 15)));
    }

    #[test]
    fn test_remove_root_of_balanced_tree() {
        let mut tree = balanced_tree();
        let entry = tree.remove(&8).expect("Expected 8 to be removed.");
        assert_eq!((entry.key, entry.value), (8, 80));

        assert!(tree.validate().is_ok());
        let expected: Vec<u32> = (1..=7).chain(9..=15).collect();
        assert_eq!(keys(&tree), expected);
        assert_eq!(tree.get(&9).map(|entry| entry.value), Some(90));
    }

    #[test]
    fn test_remove_missing_key_leaves_tree_untouched() {
        let mut tree = balanced_tree();
        let before = shape(&tree);
        assert!(tree.remove(&42).is_none());
        assert_eq!(shape(&tree), before);
    }

    #[test]
    fn test_remove_everything() {
        let mut tree = balanced_tree();
        for key in &[1, 15, 8, 4, 12, 3, 9, 7, 2, 14, 6, 10, 11, 5, 13] {
            assert!(tree.remove(key).is_some());
            assert!(tree.validate().is_ok(), "invalid after removing {}", key);
        }
        assert_eq!(tree.root(), None);
        assert_eq!(tree.validate(), Ok((0, 0)));
    }

    #[test]
    fn test_overwrite_does_not_change_shape() {
        let mut tree = balanced_tree();
        let before = shape(&tree);
        let old = tree.insert(6, 600).expect("Expected 6 to be replaced.");
        assert_eq!(old.value, 60);
        assert_eq!(shape(&tree), before);
        assert_eq!(tree.get(&6).map(|entry| entry.value), Some(600));
    }

    #[test]
    fn test_rotations_are_inverses() {
        let mut tree = balanced_tree();
        for key in 1..=15 {
            let x = find(&tree, key);
            if tree[x].right.is_none() {
                continue;
            }
            let before = shape(&tree);
            tree.rotate_left(x);
            let y = tree[x].parent.expect("Expected rotated node to have a parent.");
            assert_eq!(tree[y].left, Some(x));
            tree.rotate_right(y);
            assert_eq!(shape(&tree), before);
        }
    }

    #[test]
    fn test_rotation_preserves_order() {
        let mut tree = balanced_tree();
        let expected: Vec<u32> = (1..=15).collect();

        let root = tree.root().expect("Expected a root.");
        tree.rotate_left(root);
        assert_eq!(key_of(&tree, tree.root()), Some(12));
        assert_eq!(keys(&tree), expected);

        let four = find(&tree, 4);
        tree.rotate_right(four);
        assert_eq!(keys(&tree), expected);

        // parent links stay exact even though the colors are no longer valid
        match tree.validate() {
            Err(InvariantError::BrokenParentLink { .. }) | Err(InvariantError::OutOfOrder { .. }) => {
                panic!("Expected rotations to keep links and order intact.")
            },
            _ => {},
        }
    }

    #[test]
    #[should_panic(expected = "Right child")]
    fn test_rotate_left_without_right_child() {
        let mut tree = balanced_tree();
        let leaf = find(&tree, 1);
        tree.rotate_left(leaf);
    }

    #[test]
    #[should_panic(expected = "Left child")]
    fn test_rotate_right_without_left_child() {
        let mut tree = balanced_tree();
        let leaf = find(&tree, 15);
        tree.rotate_right(leaf);
    }

    #[test]
    fn test_validate_detects_broken_invariants() {
        let mut tree = balanced_tree();
        let root = tree.root().expect("Expected a root.");
        tree[root].color = Color::Red;
        assert_eq!(tree.validate(), Err(InvariantError::RedRoot));
        tree[root].color = Color::Black;

        let four = find(&tree, 4);
        let two = find(&tree, 2);
        let one = find(&tree, 1);
        tree[two].color = Color::Red;
        assert_eq!(tree.validate(), Err(InvariantError::RedChild { position: 1 }));
        tree[two].color = Color::Black;

        tree[one].color = Color::Black;
        assert_eq!(
            tree.validate(),
            Err(InvariantError::BlackHeightMismatch {
                position: 1,
                left: 1,
                right: 0,
            }),
        );
        tree[one].color = Color::Red;

        tree[two].parent = None;
        assert_eq!(tree.validate(), Err(InvariantError::BrokenParentLink { position: 1 }));
        tree[two].parent = Some(four);

        tree[two].entry.key = 5;
        assert_eq!(tree.validate(), Err(InvariantError::OutOfOrder { position: 2 }));
    }
}
