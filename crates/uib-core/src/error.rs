#![deny(unsafe_code)]

use serde::Serialize;
use thiserror::Error;

use uib_model::{EntityRef, InstanceId, ModeId, NodeRef, Owner, PropId, PropValueId};

/// Why a single property, prop or token failed to resolve.
///
/// These are contained outcomes: a failure for one property never aborts
/// resolution of its siblings or of the rest of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "error", rename_all = "camelCase")]
pub enum ResolveError {
    #[error("{target} does not exist")]
    DanglingReference { target: EntityRef },

    #[error("{target} is not visible from {context}")]
    OutOfScope { target: EntityRef, context: String },

    #[error("{target} has no value for mode {mode} nor for default mode {default_mode}")]
    UnresolvedToken {
        target: EntityRef,
        mode: ModeId,
        default_mode: ModeId,
    },

    #[error("prop {prop} is not defined on component {component}")]
    UnknownProp { component: String, prop: PropId },

    #[error("ownership of {node} loops back on itself")]
    CyclicOwnership { node: NodeRef },
}

impl ResolveError {
    pub fn dangling(target: EntityRef) -> Self {
        Self::DanglingReference { target }
    }

    pub fn status(&self) -> ResolutionStatus {
        match self {
            ResolveError::DanglingReference { .. } => ResolutionStatus::DanglingReference,
            ResolveError::OutOfScope { .. } => ResolutionStatus::OutOfScope,
            ResolveError::UnresolvedToken { .. } => ResolutionStatus::UnresolvedToken,
            ResolveError::UnknownProp { .. } => ResolutionStatus::UnknownProp,
            ResolveError::CyclicOwnership { .. } => ResolutionStatus::CyclicOwnership,
        }
    }
}

/// Terminal state of one property after a resolution pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionStatus {
    /// No binding; the inline literal (or nothing) applies.
    Unbound,
    Resolved,
    DanglingReference,
    OutOfScope,
    UnresolvedToken,
    UnknownProp,
    CyclicOwnership,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Unbound => "unbound",
            ResolutionStatus::Resolved => "resolved",
            ResolutionStatus::DanglingReference => "dangling reference",
            ResolutionStatus::OutOfScope => "out of scope",
            ResolutionStatus::UnresolvedToken => "unresolved token",
            ResolutionStatus::UnknownProp => "unknown prop",
            ResolutionStatus::CyclicOwnership => "cyclic ownership",
        }
    }

    /// True for the states an editor shows as a broken binding.
    pub fn is_broken(&self) -> bool {
        !matches!(self, ResolutionStatus::Unbound | ResolutionStatus::Resolved)
    }
}

impl std::fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected write. The store the batch was applied to is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("moving {node} under {owner} would make it own itself")]
    CyclicOwnership { node: NodeRef, owner: Owner },

    #[error("instance {instance} would expand component {component} inside itself")]
    RecursiveInstance {
        instance: InstanceId,
        component: String,
    },

    #[error("{owner} does not exist")]
    UnknownOwner { owner: Owner },

    #[error("{target} does not exist")]
    NotFound { target: EntityRef },

    #[error("{owner} already has default {existing}")]
    DuplicateDefault {
        owner: EntityRef,
        existing: EntityRef,
    },

    #[error("mode group {group} needs exactly one default mode matching defaultModeId")]
    DefaultModeRequired { group: String },

    #[error("{target} is keyed to mode {mode}, which is not in collection {collection}")]
    ModeOutsideCollection {
        target: EntityRef,
        mode: ModeId,
        collection: String,
    },

    #[error("instance {instance} overrides prop {prop}, which component {component} does not define")]
    UnknownPropOverride {
        instance: InstanceId,
        prop: PropId,
        component: String,
    },

    #[error("prop value {value} does not belong to prop {prop}")]
    PropValueMismatch { prop: PropId, value: PropValueId },

    #[error("prop {prop} belongs to component {actual}, not {expected}")]
    PropComponentMismatch {
        prop: PropId,
        expected: String,
        actual: String,
    },

    #[error("edit #{index} failed: {source}")]
    InBatch {
        index: usize,
        #[source]
        source: Box<EditError>,
    },
}

impl EditError {
    pub fn not_found(target: EntityRef) -> Self {
        Self::NotFound { target }
    }

    /// The underlying error, without batch position.
    pub fn root_cause(&self) -> &EditError {
        match self {
            EditError::InBatch { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
