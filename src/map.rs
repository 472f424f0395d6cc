use std::cmp;
use std::fmt;
use std::iter::FromIterator;
use std::ops::Index;

use crate::bst::{BinarySearchTree, Link, NodeIdx};
use crate::error::KeyError;

/// An ordered map implemented with an AVL tree.
///
/// ```
/// use avl_balancer::AvlTreeMap;
/// let mut map = AvlTreeMap::new();
/// map.insert(0, "zero");
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(map.get(&1), Some(&"one"));
/// map.remove(&1);
/// assert!(map.get(&1).is_none());
/// ```
#[derive(Clone)]
pub struct AvlTreeMap<K, V> {
    tree: BinarySearchTree<K, V>,
}

/// An iterator over the entries of a map, in key order.
pub struct Iter<'a, K, V> {
    tree: &'a BinarySearchTree<K, V>,
    next: Link,
    remaining: usize,
}

/// An iterator over the keys of a map.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

/// An iterator over the values of a map.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<K, V> AvlTreeMap<K, V> {
    /// Creates an empty map.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self {
            tree: BinarySearchTree::new(),
        }
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.root().is_none()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the height of the tree.
    /// Both an empty map and a map with a single entry have height 0.
    pub fn height(&self) -> usize {
        match self.tree.root() {
            None => 0,
            Some(root) => self.tree.node(root).height,
        }
    }

    /// Returns whether every node satisfies the AVL condition.
    /// Subtree heights are recomputed by recursive descent.
    pub fn is_balanced(&self) -> bool {
        self.tree.is_balanced()
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Returns the entry with the smallest key.
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first().map(|idx| self.entry(idx))
    }

    /// Returns the entry with the largest key.
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last().map(|idx| self.entry(idx))
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: &self.tree,
            next: self.tree.first(),
            remaining: self.tree.len(),
        }
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    fn entry(&self, idx: NodeIdx) -> (&K, &V) {
        let node = self.tree.node(idx);
        (&node.key, &node.value)
    }

    fn left_height(&self, idx: NodeIdx) -> usize {
        match self.tree.node(idx).left {
            None => 0,
            Some(left) => self.tree.node(left).height + 1,
        }
    }

    fn right_height(&self, idx: NodeIdx) -> usize {
        match self.tree.node(idx).right {
            None => 0,
            Some(right) => self.tree.node(right).height + 1,
        }
    }

    /// Height of the right subtree minus height of the left subtree.
    fn balance(&self, idx: NodeIdx) -> isize {
        self.right_height(idx) as isize - self.left_height(idx) as isize
    }

    fn adjust_height(&mut self, idx: NodeIdx) {
        let height = cmp::max(self.left_height(idx), self.right_height(idx));
        self.tree.node_mut(idx).height = height;
    }

    /// Exchanges the positions of two nodes together with their cached
    /// heights, so each position keeps the balance state it had.
    fn node_swap(&mut self, n1: NodeIdx, n2: NodeIdx) {
        self.tree.swap_nodes(n1, n2);
        let h1 = self.tree.node(n1).height;
        let h2 = self.tree.node(n2).height;
        self.tree.node_mut(n1).height = h2;
        self.tree.node_mut(n2).height = h1;
    }

    /// Promotes the right child of `pivot` into its place.
    /// Returns the new root of the subtree.
    fn rotate_left(&mut self, pivot: NodeIdx) -> NodeIdx {
        let Some(right) = self.tree.node(pivot).right else {
            return pivot;
        };
        tracing::trace!(pivot, promoted = right, "rotate left");

        let right_left = self.tree.node(right).left;
        self.tree.node_mut(pivot).right = right_left;
        if let Some(right_left) = right_left {
            self.tree.node_mut(right_left).parent = Some(pivot);
        }

        let parent = self.tree.node(pivot).parent;
        self.tree.node_mut(right).parent = parent;
        self.tree.replace_child(parent, pivot, Some(right));

        self.tree.node_mut(right).left = Some(pivot);
        self.tree.node_mut(pivot).parent = Some(right);

        self.adjust_height(pivot);
        self.adjust_height(right);
        right
    }

    /// Promotes the left child of `pivot` into its place.
    /// Returns the new root of the subtree.
    fn rotate_right(&mut self, pivot: NodeIdx) -> NodeIdx {
        let Some(left) = self.tree.node(pivot).left else {
            return pivot;
        };
        tracing::trace!(pivot, promoted = left, "rotate right");

        let left_right = self.tree.node(left).right;
        self.tree.node_mut(pivot).left = left_right;
        if let Some(left_right) = left_right {
            self.tree.node_mut(left_right).parent = Some(pivot);
        }

        let parent = self.tree.node(pivot).parent;
        self.tree.node_mut(left).parent = parent;
        self.tree.replace_child(parent, pivot, Some(left));

        self.tree.node_mut(left).right = Some(pivot);
        self.tree.node_mut(pivot).parent = Some(left);

        self.adjust_height(pivot);
        self.adjust_height(left);
        left
    }

    fn rotate_left_then_right(&mut self, idx: NodeIdx) -> NodeIdx {
        if let Some(left) = self.tree.node(idx).left {
            let new_left = self.rotate_left(left);
            debug_assert_eq!(self.tree.node(idx).left, Some(new_left));
        }
        self.rotate_right(idx)
    }

    fn rotate_right_then_left(&mut self, idx: NodeIdx) -> NodeIdx {
        if let Some(right) = self.tree.node(idx).right {
            let new_right = self.rotate_right(right);
            debug_assert_eq!(self.tree.node(idx).right, Some(new_right));
        }
        self.rotate_left(idx)
    }

    /// Rebalances nodes starting from given position up to the root node.
    fn rebalance(&mut self, start_from: Link) {
        let mut current = start_from;
        while let Some(idx) = current {
            let subtree_root = self.rebalance_node(idx);
            current = self.tree.node(subtree_root).parent;
        }
    }

    /// Restores the AVL condition at given node if necessary and adjusts its
    /// height. Returns the node now rooting the subtree.
    fn rebalance_node(&mut self, idx: NodeIdx) -> NodeIdx {
        let balance = self.balance(idx);
        debug_assert!((-2..=2).contains(&balance));
        if balance > 1 {
            match self.tree.node(idx).right {
                Some(right) if self.balance(right) < 0 => self.rotate_right_then_left(idx),
                _ => self.rotate_left(idx),
            }
        } else if balance < -1 {
            match self.tree.node(idx).left {
                Some(left) if self.balance(left) > 0 => self.rotate_left_then_right(idx),
                _ => self.rotate_right(idx),
            }
        } else {
            self.adjust_height(idx);
            idx
        }
    }
}

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.find(key).map(|idx| &self.tree.node(idx).value)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.tree.find(key)?;
        Some(&mut self.tree.node_mut(idx).value)
    }

    /// Returns references to the key-value pair corresponding to the key.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.tree.find(key).map(|idx| self.entry(idx))
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.find(key).is_some()
    }

    /// Returns a reference to the value corresponding to the key,
    /// or a [`KeyError`] if the key is absent.
    pub fn at(&self, key: &K) -> Result<&V, KeyError> {
        self.get(key).ok_or(KeyError)
    }

    /// Returns a mutable reference to the value corresponding to the key,
    /// or a [`KeyError`] if the key is absent.
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V, KeyError> {
        self.get_mut(key).ok_or(KeyError)
    }

    /// Inserts a key-value pair into the map.
    /// If the key was already present its value is overwritten in place and
    /// the old value is returned; the shape of the tree does not change.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (idx, old_value) = self.tree.insert(key, value);
        self.rebalance(Some(idx));
        old_value
    }

    /// Removes a key from the map.
    /// Returns the value at the key if the key was previously in the map.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.tree.find(key)?;

        // Move a node with two children down to its predecessor's position,
        // which has no right child.
        let node = self.tree.node(idx);
        if node.left.is_some() && node.right.is_some() {
            if let Some(pred) = self.tree.predecessor(idx) {
                tracing::trace!(node = idx, predecessor = pred, "swap with predecessor");
                self.node_swap(idx, pred);
            }
        }

        // The node may sit out of key order after the swap, so unlink it by
        // index rather than by key.
        let parent = self.tree.node(idx).parent;
        let (_, value) = self.tree.unlink(idx);
        // Parent of the vacated position might be out of balance now
        self.rebalance(parent);
        debug_assert!(self.tree.find(key).is_none());
        Some(value)
    }

    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        let tree = &self.tree;

        // Check root link
        if let Some(root) = tree.root() {
            assert!(tree.node(root).parent.is_none());
        }

        // Check tree nodes
        let mut num_nodes = 0;
        tree.preorder(|idx| {
            let node = tree.node(idx);
            let mut height = 0;
            let mut left_height = 0;
            let mut right_height = 0;

            // Check link for left child node
            if let Some(left) = node.left {
                assert!(tree.node(left).parent == Some(idx));
                assert!(tree.node(left).key < node.key);
                left_height = tree.node(left).height + 1;
                height = cmp::max(height, left_height);
            }

            // Check link for right child node
            if let Some(right) = node.right {
                assert!(tree.node(right).parent == Some(idx));
                assert!(tree.node(right).key > node.key);
                right_height = tree.node(right).height + 1;
                height = cmp::max(height, right_height);
            }

            // Check cached height against recomputed height
            assert_eq!(node.height, height);
            assert_eq!(tree.subtree_height(Some(idx)), height as isize);

            // Check AVL condition (nearly balance)
            assert!(left_height <= right_height + 1);
            assert!(right_height <= left_height + 1);

            num_nodes += 1;
        });

        // Check in-order sequence is strictly increasing
        let mut prev: Link = None;
        tree.inorder(|idx| {
            if let Some(prev) = prev {
                assert!(tree.node(prev).key < tree.node(idx).key);
            }
            prev = Some(idx);
        });

        // Check number of nodes
        assert_eq!(num_nodes, tree.len());
    }

    /// Shape of the tree as nested `(key, left, right)` triples, for tests.
    #[cfg(test)]
    pub(crate) fn shape(&self) -> Option<Shape<K>>
    where
        K: Clone,
    {
        fn build<K: Clone, V>(tree: &BinarySearchTree<K, V>, link: Link) -> Option<Shape<K>> {
            link.map(|idx| {
                let node = tree.node(idx);
                Shape(Box::new((
                    node.key.clone(),
                    build(tree, node.left),
                    build(tree, node.right),
                )))
            })
        }
        build(&self.tree, self.tree.root())
    }
}

#[cfg(test)]
#[derive(Debug, PartialEq)]
pub(crate) struct Shape<K>(pub(crate) Box<(K, Option<Shape<K>>, Option<Shape<K>>)>);

impl<K, V> Default for AvlTreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for AvlTreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq> Eq for AvlTreeMap<K, V> {}

impl<K: Ord, V> Index<&K> for AvlTreeMap<K, V> {
    type Output = V;

    /// Returns a reference to the value corresponding to the supplied key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &K) -> &V {
        match self.at(key) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a AvlTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        self.next = self.tree.successor(idx);
        self.remaining -= 1;
        let node = self.tree.node(idx);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            next: self.next,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}
