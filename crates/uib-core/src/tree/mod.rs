//! Hierarchy reconstruction from ownership pointers.

mod index;
mod materialize;

pub use index::TreeIndex;
pub use materialize::{Diagnostic, Materialize, NodeEntity, TreeNode, materialize};
