//! Plain binary search tree over an index arena.
//!
//! Nodes keep parent, left and right links as arena indices. Nothing in here
//! rebalances; the AVL layer in [`crate::map`] drives all height bookkeeping.

use std::cmp::{self, Ordering};
use std::mem;

pub(crate) type NodeIdx = usize;
pub(crate) type Link = Option<NodeIdx>;

#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) parent: Link,
    pub(crate) left: Link,
    pub(crate) right: Link,
    pub(crate) height: usize,
}

#[derive(Clone)]
enum Slot<K, V> {
    Occupied(Node<K, V>),
    // Next free slot
    Vacant(Link),
}

#[derive(Clone)]
pub(crate) struct BinarySearchTree<K, V> {
    slots: Vec<Slot<K, V>>,
    free_head: Link,
    root: Link,
    num_nodes: usize,
}

#[cfg(any(test, feature = "consistency_check"))]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K, V> BinarySearchTree<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            root: None,
            num_nodes: 0,
        }
    }

    pub(crate) fn root(&self) -> Link {
        self.root
    }

    pub(crate) fn len(&self) -> usize {
        self.num_nodes
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.root = None;
        self.num_nodes = 0;
    }

    pub(crate) fn node(&self, idx: NodeIdx) -> &Node<K, V> {
        match &self.slots[idx] {
            Slot::Occupied(node) => node,
            Slot::Vacant(_) => unreachable!("link to vacant slot {idx}"),
        }
    }

    pub(crate) fn node_mut(&mut self, idx: NodeIdx) -> &mut Node<K, V> {
        match &mut self.slots[idx] {
            Slot::Occupied(node) => node,
            Slot::Vacant(_) => unreachable!("link to vacant slot {idx}"),
        }
    }

    /// Smallest node, found by leftmost descent from the root.
    pub(crate) fn first(&self) -> Link {
        self.root.map(|root| self.leftmost(root))
    }

    /// Largest node, found by rightmost descent from the root.
    pub(crate) fn last(&self) -> Link {
        self.root.map(|root| self.rightmost(root))
    }

    /// In-order predecessor, or `None` if `idx` holds the smallest key.
    pub(crate) fn predecessor(&self, idx: NodeIdx) -> Link {
        if let Some(left) = self.node(idx).left {
            return Some(self.rightmost(left));
        }
        let mut current = idx;
        while let Some(parent) = self.node(current).parent {
            if self.node(parent).right == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// In-order successor, or `None` if `idx` holds the largest key.
    pub(crate) fn successor(&self, idx: NodeIdx) -> Link {
        if let Some(right) = self.node(idx).right {
            return Some(self.leftmost(right));
        }
        let mut current = idx;
        while let Some(parent) = self.node(current).parent {
            if self.node(parent).left == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }

    /// Points the child slot of `parent` that holds `old` at `new` instead.
    /// A `None` parent means `old` is the root.
    pub(crate) fn replace_child(&mut self, parent: Link, old: NodeIdx, new: Link) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let parent_node = self.node_mut(parent);
                if parent_node.left == Some(old) {
                    parent_node.left = new;
                } else {
                    debug_assert_eq!(parent_node.right, Some(old));
                    parent_node.right = new;
                }
            }
        }
    }

    /// Exchanges the tree positions of two nodes.
    /// Keys, values and heights stay with their nodes; only links move.
    pub(crate) fn swap_nodes(&mut self, a: NodeIdx, b: NodeIdx) {
        if a == b {
            return;
        }
        let exchange = |link: Link| match link {
            Some(idx) if idx == a => Some(b),
            Some(idx) if idx == b => Some(a),
            other => other,
        };

        let (a_parent, a_left, a_right) = {
            let node = self.node(a);
            (node.parent, node.left, node.right)
        };
        let (b_parent, b_left, b_right) = {
            let node = self.node(b);
            (node.parent, node.left, node.right)
        };

        // Up to two distinct outside parents; siblings share one
        let mut parents = [a_parent, b_parent];
        if a_parent == b_parent {
            parents[1] = None;
        }
        for parent in parents.into_iter().flatten() {
            if parent != a && parent != b {
                let node = self.node_mut(parent);
                node.left = exchange(node.left);
                node.right = exchange(node.right);
            }
        }
        for child in [a_left, a_right, b_left, b_right].into_iter().flatten() {
            if child != a && child != b {
                let node = self.node_mut(child);
                node.parent = exchange(node.parent);
            }
        }

        {
            let node = self.node_mut(a);
            node.parent = exchange(b_parent);
            node.left = exchange(b_left);
            node.right = exchange(b_right);
        }
        {
            let node = self.node_mut(b);
            node.parent = exchange(a_parent);
            node.left = exchange(a_left);
            node.right = exchange(a_right);
        }
        self.root = exchange(self.root);
    }

    /// Splices out a node with at most one child and releases its slot.
    pub(crate) fn unlink(&mut self, idx: NodeIdx) -> (K, V) {
        let (parent, child) = {
            let node = self.node(idx);
            debug_assert!(node.left.is_none() || node.right.is_none());
            (node.parent, node.left.or(node.right))
        };
        if let Some(child) = child {
            self.node_mut(child).parent = parent;
        }
        self.replace_child(parent, idx, child);
        let node = self.release(idx);
        (node.key, node.value)
    }

    /// Height of the subtree at `link` by recursive descent.
    /// An empty subtree has height -1, a leaf 0.
    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn subtree_height(&self, link: Link) -> isize {
        match link {
            None => -1,
            Some(idx) => {
                let node = self.node(idx);
                1 + cmp::max(self.subtree_height(node.left), self.subtree_height(node.right))
            }
        }
    }

    /// Whether every node satisfies the AVL condition, with heights
    /// recomputed from scratch rather than read from the cache.
    pub(crate) fn is_balanced(&self) -> bool {
        // Height of a balanced subtree, or None below an unbalanced node
        fn checked_height<K, V>(tree: &BinarySearchTree<K, V>, link: Link) -> Option<isize> {
            match link {
                None => Some(-1),
                Some(idx) => {
                    let node = tree.node(idx);
                    let left = checked_height(tree, node.left)?;
                    let right = checked_height(tree, node.right)?;
                    if (right - left).abs() > 1 {
                        return None;
                    }
                    Some(1 + cmp::max(left, right))
                }
            }
        }
        checked_height(self, self.root).is_some()
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn preorder<F: FnMut(NodeIdx)>(&self, f: F) {
        self.traverse(f, |_| {});
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn inorder<F: FnMut(NodeIdx)>(&self, f: F) {
        self.traverse(|_| {}, f);
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn traverse<Pre, In>(&self, mut preorder: Pre, mut inorder: In)
    where
        Pre: FnMut(NodeIdx),
        In: FnMut(NodeIdx),
    {
        if let Some(mut idx) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(idx);
                        if let Some(left) = self.node(idx).left {
                            idx = left;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(idx);
                        if let Some(right) = self.node(idx).right {
                            idx = right;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => match self.node(idx).parent {
                        Some(parent) => {
                            if self.node(parent).left == Some(idx) {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            idx = parent;
                        }
                        None => break,
                    },
                }
            }
        }
    }

    fn leftmost(&self, mut idx: NodeIdx) -> NodeIdx {
        while let Some(left) = self.node(idx).left {
            idx = left;
        }
        idx
    }

    fn rightmost(&self, mut idx: NodeIdx) -> NodeIdx {
        while let Some(right) = self.node(idx).right {
            idx = right;
        }
        idx
    }

    fn allocate(&mut self, node: Node<K, V>) -> NodeIdx {
        self.num_nodes += 1;
        match self.free_head {
            Some(idx) => {
                let next_free = match &self.slots[idx] {
                    Slot::Vacant(next_free) => *next_free,
                    Slot::Occupied(_) => unreachable!("free list points at occupied slot {idx}"),
                };
                tracing::trace!(slot = idx, "reusing vacant slot");
                self.free_head = next_free;
                self.slots[idx] = Slot::Occupied(node);
                idx
            }
            None => {
                self.slots.push(Slot::Occupied(node));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, idx: NodeIdx) -> Node<K, V> {
        debug_assert!(self.num_nodes >= 1);
        self.num_nodes -= 1;
        match mem::replace(&mut self.slots[idx], Slot::Vacant(self.free_head)) {
            Slot::Occupied(node) => {
                self.free_head = Some(idx);
                node
            }
            Slot::Vacant(_) => unreachable!("releasing vacant slot {idx}"),
        }
    }
}

impl<K: Ord, V> BinarySearchTree<K, V> {
    pub(crate) fn find(&self, key: &K) -> Link {
        let mut current = self.root;
        while let Some(idx) = current {
            let node = self.node(idx);
            current = match key.cmp(&node.key) {
                Ordering::Equal => break,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            }
        }
        current
    }

    /// Places a new leaf by BST ordering, or overwrites the value stored at
    /// an existing key. Returns the node and the replaced value, if any.
    pub(crate) fn insert(&mut self, key: K, value: V) -> (NodeIdx, Option<V>) {
        let mut parent: Link = None;
        let mut go_left = false;
        let mut current = self.root;
        while let Some(idx) = current {
            let node = self.node_mut(idx);
            match key.cmp(&node.key) {
                Ordering::Equal => {
                    let old_value = mem::replace(&mut node.value, value);
                    return (idx, Some(old_value));
                }
                Ordering::Less => {
                    parent = Some(idx);
                    go_left = true;
                    current = node.left;
                }
                Ordering::Greater => {
                    parent = Some(idx);
                    go_left = false;
                    current = node.right;
                }
            }
        }

        let idx = self.allocate(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            height: 0,
        });
        match parent {
            None => self.root = Some(idx),
            Some(parent) if go_left => self.node_mut(parent).left = Some(idx),
            Some(parent) => self.node_mut(parent).right = Some(idx),
        }
        (idx, None)
    }
}
