//! Outgoing references held by bindings, overrides and instances, and which
//! of them point at nothing.

use serde::Serialize;

use uib_model::{
    Binding, EntityKind, EntityRef, EntityStore, Instance, OverrideRef, OverrideValue,
};

/// A reference whose target is absent from the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DanglingRef {
    /// The element or instance holding the reference.
    pub holder: EntityRef,
    /// Property name, `override.<prop>` or `componentId`.
    pub slot: String,
    pub target: EntityRef,
}

/// The entity `binding` points at, if it does not exist.
pub fn missing_binding_target(store: &EntityStore, binding: &Binding) -> Option<EntityRef> {
    match binding {
        Binding::DataVariable { id } => (!store.variables.contains(id))
            .then(|| EntityRef::new(EntityKind::Variable, id)),
        Binding::Prop { id } => {
            (!store.props.contains(id)).then(|| EntityRef::new(EntityKind::Prop, id))
        }
        Binding::Token { id } => {
            (!store.tokens.contains(id)).then(|| EntityRef::new(EntityKind::Token, id))
        }
        Binding::Preset { id } => {
            (!store.presets.contains(id)).then(|| EntityRef::new(EntityKind::Preset, id))
        }
        Binding::DataModelField { model_id, field_id } => match store.data_models.get(model_id) {
            None => Some(EntityRef::new(EntityKind::DataModel, model_id)),
            Some(model) => model.field(field_id).is_none().then(|| {
                EntityRef::new(EntityKind::DataModelField, format!("{model_id}.{field_id}"))
            }),
        },
    }
}

/// The entity an override references, if it does not exist. Literals never
/// dangle.
pub fn missing_override_target(store: &EntityStore, value: &OverrideValue) -> Option<EntityRef> {
    match value {
        OverrideValue::Literal(_) => None,
        OverrideValue::Reference(OverrideRef::PropValue { id }) => (!store.prop_values.contains(id))
            .then(|| EntityRef::new(EntityKind::PropValue, id)),
        OverrideValue::Reference(OverrideRef::DataModel { id }) => (!store.data_models.contains(id))
            .then(|| EntityRef::new(EntityKind::DataModel, id)),
    }
}

fn instance_refs(store: &EntityStore, instance: &Instance, out: &mut Vec<DanglingRef>) {
    let holder = EntityRef::new(EntityKind::Instance, &instance.id);
    if !store.components.contains(&instance.component_id) {
        out.push(DanglingRef {
            holder: holder.clone(),
            slot: "componentId".to_string(),
            target: EntityRef::new(EntityKind::Component, &instance.component_id),
        });
    }
    for (property, binding) in &instance.bindings {
        if let Some(target) = missing_binding_target(store, binding) {
            out.push(DanglingRef {
                holder: holder.clone(),
                slot: property.clone(),
                target,
            });
        }
    }
    for (prop, value) in &instance.overrides.props {
        if let Some(target) = missing_override_target(store, value) {
            out.push(DanglingRef {
                holder: holder.clone(),
                slot: format!("override.{prop}"),
                target,
            });
        }
    }
}

/// Every dangling reference in the store, sorted.
pub fn dangling_references(store: &EntityStore) -> Vec<DanglingRef> {
    let mut out = Vec::new();
    for element in store.elements.iter() {
        let holder = EntityRef::new(EntityKind::Element, &element.id);
        for (property, binding) in &element.bindings {
            if let Some(target) = missing_binding_target(store, binding) {
                out.push(DanglingRef {
                    holder: holder.clone(),
                    slot: property.clone(),
                    target,
                });
            }
        }
    }
    for instance in store.instances.iter() {
        instance_refs(store, instance, &mut out);
    }
    out.sort();
    out
}
