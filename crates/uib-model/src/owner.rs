//! Parent pointers and node references.
//!
//! Hierarchy is never stored as embedded children: each Element and Instance
//! carries an [`Owner`], and trees are rebuilt on demand from those pointers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::{ComponentId, ElementId, InstanceId, ScreenId};
use crate::error::ModelError;
use crate::kind::{EntityKind, EntityRef};

/// The `{ownerKind, ownerId}` pointer stored on an owned entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "ownerKind", content = "ownerId", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Owner {
    Screen(ScreenId),
    Component(ComponentId),
    Element(ElementId),
}

impl Owner {
    pub fn kind(&self) -> OwnerKind {
        match self {
            Owner::Screen(_) => OwnerKind::Screen,
            Owner::Component(_) => OwnerKind::Component,
            Owner::Element(_) => OwnerKind::Element,
        }
    }

    pub fn id_str(&self) -> &str {
        match self {
            Owner::Screen(id) => id.as_str(),
            Owner::Component(id) => id.as_str(),
            Owner::Element(id) => id.as_str(),
        }
    }

    pub fn entity(&self) -> EntityRef {
        match self {
            Owner::Screen(id) => EntityRef::new(EntityKind::Screen, id),
            Owner::Component(id) => EntityRef::new(EntityKind::Component, id),
            Owner::Element(id) => EntityRef::new(EntityKind::Element, id),
        }
    }

    /// Returns the root this owner denotes, if it is one.
    pub fn as_root(&self) -> Option<Root> {
        match self {
            Owner::Screen(id) => Some(Root::Screen(id.clone())),
            Owner::Component(id) => Some(Root::Component(id.clone())),
            Owner::Element(_) => None,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerKind {
    Screen,
    Component,
    Element,
}

impl OwnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OwnerKind::Screen => "screen",
            OwnerKind::Component => "component",
            OwnerKind::Element => "element",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tree root: the thing an editor canvas shows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "rootKind", content = "rootId", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Root {
    Screen(ScreenId),
    Component(ComponentId),
}

impl Root {
    pub fn as_owner(&self) -> Owner {
        match self {
            Root::Screen(id) => Owner::Screen(id.clone()),
            Root::Component(id) => Owner::Component(id.clone()),
        }
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Root::Screen(id) => write!(f, "screen:{id}"),
            Root::Component(id) => write!(f, "component:{id}"),
        }
    }
}

impl FromStr for Root {
    type Err = ModelError;

    /// Parses `screen:<id>` or `component:<id>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidReference {
            expected: "screen:<id> or component:<id>",
            value: s.to_string(),
        };
        let (kind, id) = s.split_once(':').ok_or_else(invalid)?;
        match kind.trim().to_ascii_lowercase().as_str() {
            "screen" => Ok(Root::Screen(ScreenId::new(id)?)),
            "component" => Ok(Root::Component(ComponentId::new(id)?)),
            _ => Err(invalid()),
        }
    }
}

/// Ownership scope of a DataVariable. Variables are never global and never
/// owned by an element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "ownerKind", content = "ownerId", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    Screen(ScreenId),
    Component(ComponentId),
}

impl Scope {
    pub fn as_root(&self) -> Root {
        match self {
            Scope::Screen(id) => Root::Screen(id.clone()),
            Scope::Component(id) => Root::Component(id.clone()),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_root().fmt(f)
    }
}

/// A heterogeneous reference to an entity that can appear in a tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeRef {
    Element(ElementId),
    Instance(InstanceId),
}

impl NodeRef {
    pub fn entity(&self) -> EntityRef {
        match self {
            NodeRef::Element(id) => EntityRef::new(EntityKind::Element, id),
            NodeRef::Instance(id) => EntityRef::new(EntityKind::Instance, id),
        }
    }

    pub fn id_str(&self) -> &str {
        match self {
            NodeRef::Element(id) => id.as_str(),
            NodeRef::Instance(id) => id.as_str(),
        }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Element(id) => write!(f, "element:{id}"),
            NodeRef::Instance(id) => write!(f, "instance:{id}"),
        }
    }
}

impl FromStr for NodeRef {
    type Err = ModelError;

    /// Parses `element:<id>` or `instance:<id>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ModelError::InvalidReference {
            expected: "element:<id> or instance:<id>",
            value: s.to_string(),
        };
        let (kind, id) = s.split_once(':').ok_or_else(invalid)?;
        match kind.trim().to_ascii_lowercase().as_str() {
            "element" => Ok(NodeRef::Element(ElementId::new(id)?)),
            "instance" => Ok(NodeRef::Instance(InstanceId::new(id)?)),
            _ => Err(invalid()),
        }
    }
}
