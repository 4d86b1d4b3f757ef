//! Tree materialization, binding resolution and the write boundary for the
//! UI builder data core.
//!
//! All reads borrow an [`EntityStore`](uib_model::EntityStore) snapshot
//! immutably. [`Resolver`] bundles the indexes a snapshot needs; [`apply`]
//! turns a batch of [`Edit`]s into a new snapshot or rejects it whole.

pub mod check;
pub mod edit;
pub mod error;
pub mod ownership;
pub mod references;
pub mod resolve;
pub mod tree;

pub use check::{CheckReport, Issue, IssueCode, Severity, check};
pub use edit::{Edit, EditReport, PrunedOverride, apply};
pub use error::{EditError, ResolutionStatus, ResolveError};
pub use references::DanglingRef;
pub use resolve::{
    ActiveModes, ModeAssignment, ModeValueIndex, NodeContext, NodeResolution, PropertyState,
    Resolved, ResolvedValue, Resolver, ValueSource, resolve_preset, resolve_prop,
    resolve_prop_default, resolve_token,
};
pub use tree::{Diagnostic, Materialize, NodeEntity, TreeIndex, TreeNode, materialize};
