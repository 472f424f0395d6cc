//! Equal-depth check for the leaves of a binary tree.

/// A node of a plain owned binary tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode<T> {
    pub key: T,
    pub left: Option<Box<TreeNode<T>>>,
    pub right: Option<Box<TreeNode<T>>>,
}

impl<T> TreeNode<T> {
    /// Creates a node without children.
    pub fn leaf(key: T) -> Self {
        Self {
            key,
            left: None,
            right: None,
        }
    }

    /// Creates a node with the given subtrees.
    pub fn with_children(key: T, left: Option<TreeNode<T>>, right: Option<TreeNode<T>>) -> Self {
        Self {
            key,
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Returns true if every leaf of the tree sits at the same depth.
/// An empty tree trivially satisfies this.
///
/// Only nodes without children count as leaves; a node with a single child
/// is an inner node and its missing side is ignored.
///
/// ```
/// use avl_balancer::{equal_paths, TreeNode};
/// let tree = TreeNode::with_children(2, Some(TreeNode::leaf(1)), Some(TreeNode::leaf(3)));
/// assert!(equal_paths(Some(&tree)));
/// ```
pub fn equal_paths<T>(root: Option<&TreeNode<T>>) -> bool {
    let mut leaf_depth = None;
    check_depths(root, 0, &mut leaf_depth)
}

fn check_depths<T>(node: Option<&TreeNode<T>>, depth: usize, leaf_depth: &mut Option<usize>) -> bool {
    let Some(node) = node else {
        return true;
    };
    if node.is_leaf() {
        // The first leaf reached fixes the depth every other leaf must match
        return *leaf_depth.get_or_insert(depth) == depth;
    }
    check_depths(node.left.as_deref(), depth + 1, leaf_depth)
        && check_depths(node.right.as_deref(), depth + 1, leaf_depth)
}
