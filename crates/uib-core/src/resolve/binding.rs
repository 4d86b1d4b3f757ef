use std::collections::BTreeSet;

use tracing::debug;

use uib_model::{Binding, Element, EntityKind, EntityRef, EntityStore, Instance, NodeRef, Owner, Root};

use crate::error::ResolveError;
use crate::resolve::modes::{ActiveModes, ModeValueIndex, resolve_preset, resolve_token};
use crate::resolve::overrides::{resolve_prop, resolve_prop_default};
use crate::resolve::{NodeContext, Resolved, ResolvedValue, ValueSource};

/// What a property slot holds before resolution.
pub(crate) enum Slot<'s> {
    Bound(&'s Binding),
    Literal(ResolvedValue),
    Empty,
}

fn element_for<'s>(
    store: &'s EntityStore,
    node: &NodeRef,
) -> Result<Option<&'s Element>, ResolveError> {
    match node {
        NodeRef::Element(id) => store
            .elements
            .get(id)
            .map(Some)
            .ok_or_else(|| ResolveError::dangling(node.entity())),
        NodeRef::Instance(_) => Ok(None),
    }
}

/// The instance whose `override.style` applies to this node: the node itself
/// when it is an Instance, or the enclosing instance when the node is a
/// top-level element of that instance's component.
fn style_override_instance<'s>(
    store: &'s EntityStore,
    context: &NodeContext,
) -> Result<Option<&'s Instance>, ResolveError> {
    match &context.node {
        NodeRef::Instance(id) => store
            .instances
            .get(id)
            .map(Some)
            .ok_or_else(|| ResolveError::dangling(context.node.entity())),
        NodeRef::Element(id) => {
            let Some(instance_id) = &context.instance_context else {
                return Ok(None);
            };
            let Some(instance) = store.instances.get(instance_id) else {
                return Ok(None);
            };
            let top_level = store.elements.get(id).is_some_and(|element| {
                element.ownership == Owner::Component(instance.component_id.clone())
            });
            Ok(top_level.then_some(instance))
        }
    }
}

/// Reads the binding or literal sitting in `property`.
pub(crate) fn read_slot<'s>(
    store: &'s EntityStore,
    context: &NodeContext,
    property: &str,
) -> Result<Slot<'s>, ResolveError> {
    let element = element_for(store, &context.node)?;
    let style_instance = style_override_instance(store, context)?;

    let bindings = match (&context.node, element) {
        (NodeRef::Element(_), Some(element)) => &element.bindings,
        _ => match style_instance {
            Some(instance) => &instance.bindings,
            None => return Err(ResolveError::dangling(context.node.entity())),
        },
    };

    // The instance's style override sits above whatever the component
    // definition binds or sets for the same property.
    if let Some(instance) = style_instance
        && let Some(value) = instance.overrides.style.get(property)
    {
        return Ok(Slot::Literal(ResolvedValue {
            value: Resolved::Value(value.clone()),
            source: ValueSource::InstanceStyle {
                instance: instance.id.clone(),
            },
        }));
    }
    if let Some(binding) = bindings.get(property) {
        return Ok(Slot::Bound(binding));
    }
    if let Some(element) = element
        && let Some((section, value)) = element.properties.lookup(property)
    {
        return Ok(Slot::Literal(ResolvedValue {
            value: Resolved::Value(value.clone()),
            source: ValueSource::Inline { section },
        }));
    }
    Ok(Slot::Empty)
}

/// Every property name a node binds or sets, sorted.
pub(crate) fn property_names(
    store: &EntityStore,
    context: &NodeContext,
) -> Result<BTreeSet<String>, ResolveError> {
    let mut names = BTreeSet::new();
    if let Some(element) = element_for(store, &context.node)? {
        names.extend(element.bindings.keys().cloned());
        names.extend(element.properties.names().map(str::to_string));
    }
    if let Some(instance) = style_override_instance(store, context)? {
        if matches!(context.node, NodeRef::Instance(_)) {
            names.extend(instance.bindings.keys().cloned());
        }
        names.extend(instance.overrides.style.keys().cloned());
    }
    Ok(names)
}

/// Dispatches a binding to the source its kind names.
pub(crate) fn resolve_binding(
    store: &EntityStore,
    modes_index: &ModeValueIndex<'_>,
    context: &NodeContext,
    binding: &Binding,
    active: &ActiveModes,
) -> Result<ResolvedValue, ResolveError> {
    debug!(node = %context.node, kind = %binding.kind(), target = binding.target_id(), "resolving binding");
    match binding {
        Binding::DataVariable { id } => {
            let target = EntityRef::new(EntityKind::Variable, id);
            let variable = store
                .variables
                .get(id)
                .ok_or_else(|| ResolveError::dangling(target.clone()))?;
            let scope = variable.ownership.as_root();
            if !visible_scopes(store, context).contains(&scope) {
                return Err(ResolveError::OutOfScope {
                    target,
                    context: context.describe(),
                });
            }
            Ok(ResolvedValue {
                value: Resolved::Value(variable.value.clone()),
                source: ValueSource::DataVariable {
                    variable: id.clone(),
                },
            })
        }
        Binding::Prop { id } => {
            let target = EntityRef::new(EntityKind::Prop, id);
            let prop = store
                .props
                .get(id)
                .ok_or_else(|| ResolveError::dangling(target.clone()))?;
            let out_of_scope = || ResolveError::OutOfScope {
                target: target.clone(),
                context: context.describe(),
            };
            match &context.instance_context {
                Some(instance_id) => {
                    let instance = store.instances.get(instance_id).ok_or_else(|| {
                        ResolveError::dangling(EntityRef::new(EntityKind::Instance, instance_id))
                    })?;
                    if instance.component_id != prop.component_id {
                        return Err(out_of_scope());
                    }
                    resolve_prop(store, instance_id, id)
                }
                None => match &context.root {
                    Root::Component(component) if *component == prop.component_id => {
                        resolve_prop_default(store, component, id)
                    }
                    _ => Err(out_of_scope()),
                },
            }
        }
        Binding::Token { id } => resolve_token(store, modes_index, id, active),
        Binding::Preset { id } => resolve_preset(store, modes_index, id, active),
        Binding::DataModelField { model_id, field_id } => {
            let model = store.data_models.get(model_id).ok_or_else(|| {
                ResolveError::dangling(EntityRef::new(EntityKind::DataModel, model_id))
            })?;
            if model.field(field_id).is_none() {
                return Err(ResolveError::dangling(EntityRef::new(
                    EntityKind::DataModelField,
                    format!("{model_id}.{field_id}"),
                )));
            }
            Ok(ResolvedValue {
                value: Resolved::DataModelField {
                    model_id: model_id.clone(),
                    field_id: field_id.clone(),
                },
                source: ValueSource::DataModelField,
            })
        }
    }
}

/// Scopes whose variables a node may read: the root it is materialized
/// under, and the component of its innermost enclosing instance.
pub(crate) fn visible_scopes(store: &EntityStore, context: &NodeContext) -> Vec<Root> {
    let mut scopes = vec![context.root.clone()];
    if let Some(instance) = context
        .instance_context
        .as_ref()
        .and_then(|id| store.instances.get(id))
    {
        scopes.push(Root::Component(instance.component_id.clone()));
    }
    scopes
}

/// Turns a slot into its effective value.
pub(crate) fn resolve_slot(
    store: &EntityStore,
    modes_index: &ModeValueIndex<'_>,
    context: &NodeContext,
    slot: Slot<'_>,
    active: &ActiveModes,
) -> Result<ResolvedValue, ResolveError> {
    match slot {
        Slot::Bound(binding) => resolve_binding(store, modes_index, context, binding, active),
        Slot::Literal(value) => Ok(value),
        Slot::Empty => Ok(ResolvedValue::unset()),
    }
}
