//! Effective-value resolution.
//!
//! A property's value comes from, in order: the enclosing instance's style
//! override, the node's binding, then the node's inline literal.
//! Bindings dispatch by kind to data variables, component props, design
//! tokens, presets or data-model fields. Every failure is contained to the
//! property it occurred on.

mod binding;
mod modes;
mod overrides;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use uib_model::{
    DataModelId, EntityStore, FieldId, InstanceId, ModeId, NodeRef, PresetId, PropId,
    PropValueId, Root, Section, TokenId, Value, VariableId,
};

use crate::error::{ResolutionStatus, ResolveError};
use crate::ownership::{RootWalk, root_of};
use crate::tree::{Materialize, TreeIndex, materialize};

use self::binding::{Slot, property_names, read_slot, resolve_binding, resolve_slot};
pub(crate) use self::binding::visible_scopes;
pub use self::modes::{ActiveModes, ModeAssignment, ModeValueIndex, resolve_preset, resolve_token};
pub use self::overrides::{resolve_prop, resolve_prop_default};

/// An effective value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Resolved {
    Value(Value),
    /// A prop pointed at a data model; records are fetched elsewhere.
    DataModel(DataModelId),
    /// Placeholder for a field of the current data-model record.
    #[serde(rename_all = "camelCase")]
    DataModelField {
        model_id: DataModelId,
        field_id: FieldId,
    },
    /// Nothing bound and no literal set.
    Unset,
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Value(value) => write!(f, "{value}"),
            Resolved::DataModel(id) => write!(f, "<data model {id}>"),
            Resolved::DataModelField { model_id, field_id } => {
                write!(f, "<field {model_id}.{field_id}>")
            }
            Resolved::Unset => f.write_str("<unset>"),
        }
    }
}

/// Where an effective value came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum ValueSource {
    Inline {
        section: Section,
    },
    InstanceStyle {
        instance: InstanceId,
    },
    OverrideLiteral {
        instance: InstanceId,
    },
    #[serde(rename_all = "camelCase")]
    OverridePropValue {
        instance: InstanceId,
        prop_value: PropValueId,
    },
    OverrideDataModel {
        instance: InstanceId,
    },
    #[serde(rename_all = "camelCase")]
    DefaultPropValue {
        prop_value: PropValueId,
    },
    PropDefault {
        prop: PropId,
    },
    DataVariable {
        variable: VariableId,
    },
    Token {
        token: TokenId,
        mode: ModeId,
        /// True when the active mode had no value and the default mode's
        /// value was used.
        fallback: bool,
    },
    Preset {
        preset: PresetId,
        mode: ModeId,
        fallback: bool,
    },
    DataModelField,
    Unset,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Inline { section } => write!(f, "inline {section}"),
            ValueSource::InstanceStyle { instance } => write!(f, "style override on {instance}"),
            ValueSource::OverrideLiteral { instance } => write!(f, "override on {instance}"),
            ValueSource::OverridePropValue {
                instance,
                prop_value,
            } => write!(f, "override on {instance} -> prop value {prop_value}"),
            ValueSource::OverrideDataModel { instance } => {
                write!(f, "data model override on {instance}")
            }
            ValueSource::DefaultPropValue { prop_value } => {
                write!(f, "default prop value {prop_value}")
            }
            ValueSource::PropDefault { prop } => write!(f, "default of prop {prop}"),
            ValueSource::DataVariable { variable } => write!(f, "variable {variable}"),
            ValueSource::Token {
                token,
                mode,
                fallback,
            } => {
                write!(f, "token {token} @ {mode}")?;
                if *fallback {
                    f.write_str(" (default mode)")?;
                }
                Ok(())
            }
            ValueSource::Preset {
                preset,
                mode,
                fallback,
            } => {
                write!(f, "preset {preset} @ {mode}")?;
                if *fallback {
                    f.write_str(" (default mode)")?;
                }
                Ok(())
            }
            ValueSource::DataModelField => f.write_str("data model field"),
            ValueSource::Unset => f.write_str("-"),
        }
    }
}

/// An effective value together with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedValue {
    pub value: Resolved,
    pub source: ValueSource,
}

impl ResolvedValue {
    pub fn unset() -> Self {
        Self {
            value: Resolved::Unset,
            source: ValueSource::Unset,
        }
    }

    /// The literal value, when there is one.
    pub fn as_value(&self) -> Option<&Value> {
        match &self.value {
            Resolved::Value(value) => Some(value),
            _ => None,
        }
    }
}

/// Where a node sits for the purpose of resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeContext {
    pub node: NodeRef,
    /// Innermost Instance whose component subtree contains the node.
    pub instance_context: Option<InstanceId>,
    pub root: Root,
}

impl NodeContext {
    pub fn new(node: NodeRef, root: Root) -> Self {
        Self {
            node,
            instance_context: None,
            root,
        }
    }

    #[must_use]
    pub fn within(mut self, instance: InstanceId) -> Self {
        self.instance_context = Some(instance);
        self
    }

    pub(crate) fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for NodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} under {}", self.node, self.root)?;
        if let Some(instance) = &self.instance_context {
            write!(f, " in instance {instance}")?;
        }
        Ok(())
    }
}

/// Outcome for one property of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "camelCase")]
pub enum PropertyState {
    /// No binding; the literal (or nothing) applies.
    Unbound(ResolvedValue),
    /// A binding resolved.
    Resolved(ResolvedValue),
    /// A binding failed; the editor shows it as broken.
    Broken(ResolveError),
}

impl PropertyState {
    pub fn status(&self) -> ResolutionStatus {
        match self {
            PropertyState::Unbound(_) => ResolutionStatus::Unbound,
            PropertyState::Resolved(_) => ResolutionStatus::Resolved,
            PropertyState::Broken(error) => error.status(),
        }
    }

    pub fn value(&self) -> Option<&ResolvedValue> {
        match self {
            PropertyState::Unbound(value) | PropertyState::Resolved(value) => Some(value),
            PropertyState::Broken(_) => None,
        }
    }
}

/// Every property of one node, resolved independently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeResolution {
    pub context: NodeContext,
    pub properties: BTreeMap<String, PropertyState>,
}

impl NodeResolution {
    pub fn get(&self, property: &str) -> Option<&PropertyState> {
        self.properties.get(property)
    }

    pub fn broken_count(&self) -> usize {
        self.properties
            .values()
            .filter(|state| state.status().is_broken())
            .count()
    }
}

/// Read-only resolution over one store snapshot.
///
/// Builds the tree index and the mode value indexes once. A changed store
/// needs a new resolver.
#[derive(Debug, Clone)]
pub struct Resolver<'a> {
    store: &'a EntityStore,
    index: TreeIndex,
    mode_values: ModeValueIndex<'a>,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a EntityStore) -> Self {
        Self {
            store,
            index: TreeIndex::build(store),
            mode_values: ModeValueIndex::build(store),
        }
    }

    pub fn store(&self) -> &'a EntityStore {
        self.store
    }

    pub fn index(&self) -> &TreeIndex {
        &self.index
    }

    /// Lazily walks `root`'s tree. See [`materialize`].
    pub fn materialize<'r>(&'r self, root: &'r Root) -> Materialize<'r> {
        materialize(self.store, &self.index, root)
    }

    /// Definition-site context of `node`: the root its own ownership chain
    /// ends at, with no instance context.
    pub fn context_for(&self, node: &NodeRef) -> Result<NodeContext, ResolveError> {
        match root_of(self.store, node) {
            None => Err(ResolveError::dangling(node.entity())),
            Some(RootWalk::Root(root)) => Ok(NodeContext::new(node.clone(), root)),
            Some(RootWalk::Missing(owner)) => Err(ResolveError::dangling(owner.entity())),
            Some(RootWalk::Cycle(_)) => Err(ResolveError::CyclicOwnership { node: node.clone() }),
        }
    }

    /// Context of `node` as it appears inside `instance`'s expansion, taken
    /// from the walk of the root the instance is placed under.
    ///
    /// Fails with [`ResolveError::OutOfScope`] when the walk never shows
    /// `node` with `instance` as its innermost instance context.
    pub fn context_within(
        &self,
        node: &NodeRef,
        instance: &InstanceId,
    ) -> Result<NodeContext, ResolveError> {
        let placement = self.context_for(&NodeRef::Instance(instance.clone()))?;
        self.materialize(&placement.root)
            .find(|tree_node| {
                tree_node.instance_context == Some(instance) && tree_node.entity.node_ref() == *node
            })
            .map(|tree_node| tree_node.context())
            .ok_or_else(|| ResolveError::OutOfScope {
                target: node.entity(),
                context: format!("instance {instance}"),
            })
    }

    pub fn resolve_prop(
        &self,
        instance: &InstanceId,
        prop: &PropId,
    ) -> Result<ResolvedValue, ResolveError> {
        resolve_prop(self.store, instance, prop)
    }

    pub fn resolve_token(
        &self,
        token: &TokenId,
        modes: &ActiveModes,
    ) -> Result<ResolvedValue, ResolveError> {
        resolve_token(self.store, &self.mode_values, token, modes)
    }

    pub fn resolve_preset(
        &self,
        preset: &PresetId,
        modes: &ActiveModes,
    ) -> Result<ResolvedValue, ResolveError> {
        resolve_preset(self.store, &self.mode_values, preset, modes)
    }

    /// Effective value of one property of a node.
    pub fn resolve_property(
        &self,
        context: &NodeContext,
        property: &str,
        modes: &ActiveModes,
    ) -> Result<ResolvedValue, ResolveError> {
        let slot = read_slot(self.store, context, property)?;
        resolve_slot(self.store, &self.mode_values, context, slot, modes)
    }

    /// Resolves every property the node binds or sets. A failing property
    /// is recorded as [`PropertyState::Broken`] and does not affect the
    /// others.
    pub fn resolve_node(
        &self,
        context: &NodeContext,
        modes: &ActiveModes,
    ) -> Result<NodeResolution, ResolveError> {
        let names = property_names(self.store, context)?;
        let properties = names
            .into_iter()
            .map(|name| {
                let state = self.property_state(context, &name, modes);
                (name, state)
            })
            .collect::<BTreeMap<_, _>>();
        let resolution = NodeResolution {
            context: context.clone(),
            properties,
        };
        debug!(
            node = %context.node,
            properties = resolution.properties.len(),
            broken = resolution.broken_count(),
            "resolved node"
        );
        Ok(resolution)
    }

    fn property_state(
        &self,
        context: &NodeContext,
        property: &str,
        modes: &ActiveModes,
    ) -> PropertyState {
        match read_slot(self.store, context, property) {
            Ok(Slot::Bound(binding)) => {
                match resolve_binding(self.store, &self.mode_values, context, binding, modes) {
                    Ok(value) => PropertyState::Resolved(value),
                    Err(error) => PropertyState::Broken(error),
                }
            }
            Ok(Slot::Literal(value)) => PropertyState::Unbound(value),
            Ok(Slot::Empty) => PropertyState::Unbound(ResolvedValue::unset()),
            Err(error) => PropertyState::Broken(error),
        }
    }
}
