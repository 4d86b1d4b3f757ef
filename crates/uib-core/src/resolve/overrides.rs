//! Effective prop values of an Instance.
//!
//! The chain is an ordered list of layers tried in turn: the instance's own
//! override, then the prop's default PropValue. When no layer answers the
//! prop's declared default applies.

use tracing::debug;

use uib_model::{
    Component, ComponentId, EntityKind, EntityRef, EntityStore, Instance, InstanceId,
    OverrideRef, OverrideValue, Prop, PropId,
};

use crate::error::ResolveError;
use crate::resolve::{Resolved, ResolvedValue, ValueSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropLayer {
    InstanceOverride,
    DefaultPropValue,
}

const PROP_CHAIN: [PropLayer; 2] = [PropLayer::InstanceOverride, PropLayer::DefaultPropValue];

impl PropLayer {
    /// `None` passes to the next layer.
    fn resolve(
        self,
        store: &EntityStore,
        instance: Option<&Instance>,
        prop: &Prop,
    ) -> Option<Result<ResolvedValue, ResolveError>> {
        match self {
            PropLayer::InstanceOverride => {
                let instance = instance?;
                let value = instance.overrides.props.get(&prop.id)?;
                Some(resolve_override(store, instance, prop, value))
            }
            PropLayer::DefaultPropValue => default_prop_value(store, prop).map(Ok),
        }
    }
}

fn prop_default(prop: &Prop) -> ResolvedValue {
    ResolvedValue {
        value: Resolved::Value(prop.default_value.clone()),
        source: ValueSource::PropDefault {
            prop: prop.id.clone(),
        },
    }
}

fn resolve_override(
    store: &EntityStore,
    instance: &Instance,
    prop: &Prop,
    value: &OverrideValue,
) -> Result<ResolvedValue, ResolveError> {
    match value {
        OverrideValue::Literal(value) => Ok(ResolvedValue {
            value: Resolved::Value(value.clone()),
            source: ValueSource::OverrideLiteral {
                instance: instance.id.clone(),
            },
        }),
        OverrideValue::Reference(OverrideRef::PropValue { id }) => {
            let target = EntityRef::new(EntityKind::PropValue, id);
            let prop_value = store
                .prop_values
                .get(id)
                .ok_or_else(|| ResolveError::dangling(target.clone()))?;
            if prop_value.prop_id != prop.id {
                return Err(ResolveError::OutOfScope {
                    target,
                    context: format!("prop {}", prop.id),
                });
            }
            Ok(ResolvedValue {
                value: Resolved::Value(prop_value.value.clone()),
                source: ValueSource::OverridePropValue {
                    instance: instance.id.clone(),
                    prop_value: id.clone(),
                },
            })
        }
        OverrideValue::Reference(OverrideRef::DataModel { id }) => {
            if !store.data_models.contains(id) {
                return Err(ResolveError::dangling(EntityRef::new(
                    EntityKind::DataModel,
                    id,
                )));
            }
            Ok(ResolvedValue {
                value: Resolved::DataModel(id.clone()),
                source: ValueSource::OverrideDataModel {
                    instance: instance.id.clone(),
                },
            })
        }
    }
}

fn default_prop_value(store: &EntityStore, prop: &Prop) -> Option<ResolvedValue> {
    prop.values
        .iter()
        .filter_map(|id| store.prop_values.get(id))
        .find(|value| value.is_default && value.prop_id == prop.id)
        .map(|value| ResolvedValue {
            value: Resolved::Value(value.value.clone()),
            source: ValueSource::DefaultPropValue {
                prop_value: value.id.clone(),
            },
        })
}

fn prop_on_component<'s>(
    store: &'s EntityStore,
    component: &Component,
    prop_id: &PropId,
) -> Result<&'s Prop, ResolveError> {
    store
        .props
        .get(prop_id)
        .filter(|prop| prop.component_id == component.id && component.props.contains(prop_id))
        .ok_or_else(|| ResolveError::UnknownProp {
            component: component.id.to_string(),
            prop: prop_id.clone(),
        })
}

fn run_chain(
    store: &EntityStore,
    instance: Option<&Instance>,
    prop: &Prop,
) -> Result<ResolvedValue, ResolveError> {
    let resolved = PROP_CHAIN
        .iter()
        .find_map(|layer| layer.resolve(store, instance, prop))
        .unwrap_or_else(|| Ok(prop_default(prop)));
    if let Ok(value) = &resolved {
        debug!(prop = %prop.id, source = ?value.source, "resolved prop");
    }
    resolved
}

/// Effective value of `prop_id` on `instance_id`.
///
/// Overrides for props the component no longer defines are never read.
pub fn resolve_prop(
    store: &EntityStore,
    instance_id: &InstanceId,
    prop_id: &PropId,
) -> Result<ResolvedValue, ResolveError> {
    let instance = store
        .instances
        .get(instance_id)
        .ok_or_else(|| ResolveError::dangling(EntityRef::new(EntityKind::Instance, instance_id)))?;
    let component = store.components.get(&instance.component_id).ok_or_else(|| {
        ResolveError::dangling(EntityRef::new(
            EntityKind::Component,
            &instance.component_id,
        ))
    })?;
    let prop = prop_on_component(store, component, prop_id)?;
    run_chain(store, Some(instance), prop)
}

/// Effective value of a prop when editing its component directly, with no
/// instance to supply overrides.
pub fn resolve_prop_default(
    store: &EntityStore,
    component_id: &ComponentId,
    prop_id: &PropId,
) -> Result<ResolvedValue, ResolveError> {
    let component = store.components.get(component_id).ok_or_else(|| {
        ResolveError::dangling(EntityRef::new(EntityKind::Component, component_id))
    })?;
    let prop = prop_on_component(store, component, prop_id)?;
    run_chain(store, None, prop)
}
