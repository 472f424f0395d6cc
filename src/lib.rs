//! An ordered map implemented with an AVL tree.
//!
//! [`AvlTreeMap`] layers height balancing over a plain binary search tree
//! whose nodes live in an index arena. Every insertion and removal first
//! changes the tree structurally, then walks from the mutation point up to
//! the root, rotating wherever the heights of two sibling subtrees differ by
//! more than one.
//!
//! The crate also ships [`equal_paths`], which checks whether all leaves of a
//! plain binary tree sit at the same depth.

mod bst;
mod equal_paths;
mod error;
mod map;

pub use equal_paths::{equal_paths, TreeNode};
pub use error::KeyError;
pub use map::{AvlTreeMap, Iter, Keys, Values};
