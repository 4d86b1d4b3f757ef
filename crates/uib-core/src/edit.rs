//! The write boundary.
//!
//! Edits are applied as an ordered batch to a copy of the store. Each edit
//! checks what it can see on its own; whole-batch invariants (ownership
//! cycles, recursive expansion, default uniqueness, mode membership) are
//! checked once at the end over everything the batch touched. Any failure
//! rejects the whole batch and the caller keeps the original snapshot.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use uib_model::{
    Binding, CollectionId, Component, ComponentId, DataModel, DataModelId, Element, ElementId,
    EntityKind, EntityRef, EntityStore, Instance, InstanceId, Mode, ModeGroup, ModeId, NodeRef,
    OverrideRef, OverrideValue, Owner, Preset, PresetId, PresetModeValue, PresetModeValueId, Prop,
    PropId, PropValue, PropValueId, Scope, Screen, ScreenId, Section, Token, TokenId,
    TokenValue, TokenValueId, Value, Variable, VariableId,
};

use crate::error::EditError;
use crate::ownership::{expansion_edges, instance_recurses, owns_itself};
use crate::references::{DanglingRef, dangling_references, missing_binding_target};
use crate::tree::TreeIndex;

/// One write operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Edit {
    PutScreen(Screen),
    PutElement(Element),
    PutComponent(Component),
    PutInstance(Instance),
    PutProp(Prop),
    PutPropValue(PropValue),
    PutVariable(Variable),
    PutToken(Token),
    PutModeGroup(ModeGroup),
    PutMode(Mode),
    PutTokenValue(TokenValue),
    PutPreset(Preset),
    PutPresetModeValue(PresetModeValue),
    PutDataModel(DataModel),

    /// Re-parents an Element or Instance.
    Move { node: NodeRef, owner: Owner },

    SetOverride {
        instance: InstanceId,
        prop: PropId,
        value: OverrideValue,
    },
    ClearOverride {
        instance: InstanceId,
        prop: PropId,
    },
    /// `None` clears the style override.
    SetInstanceStyle {
        instance: InstanceId,
        name: String,
        value: Option<Value>,
    },
    /// `None` clears the literal.
    SetProperty {
        element: ElementId,
        section: Section,
        name: String,
        value: Option<Value>,
    },
    Bind {
        node: NodeRef,
        property: String,
        binding: Binding,
    },
    Unbind {
        node: NodeRef,
        property: String,
    },
    /// Flags one PropValue as the prop's default, or clears the flag.
    SetDefaultPropValue {
        prop: PropId,
        value: Option<PropValueId>,
    },

    RemoveScreen { id: ScreenId },
    RemoveElement { id: ElementId },
    RemoveInstance { id: InstanceId },
    RemoveComponent { id: ComponentId },
    RemoveProp { id: PropId },
    RemovePropValue { id: PropValueId },
    RemoveVariable { id: VariableId },
    RemoveToken { id: TokenId },
    RemoveMode { id: ModeId },
    RemovePreset { id: PresetId },
    RemoveDataModel { id: DataModelId },
}

/// An instance override dropped because its prop was removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrunedOverride {
    pub instance: InstanceId,
    pub prop: PropId,
}

/// What an accepted batch did besides the edits themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditReport {
    pub applied: usize,
    /// Every entity removed, cascades included.
    pub removed: Vec<EntityRef>,
    pub pruned_overrides: Vec<PrunedOverride>,
    /// References the batch left pointing at nothing. They stay in the store
    /// and resolve as broken.
    pub dangling: Vec<DanglingRef>,
}

impl EditReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty()
    }
}

/// Applies `edits` in order to a copy of `store`.
///
/// On success returns the new snapshot. On failure `store` is untouched and
/// the error names the failing edit's position when a single edit caused it.
pub fn apply(
    store: &EntityStore,
    edits: &[Edit],
) -> Result<(EntityStore, EditReport), EditError> {
    let dangling_before: BTreeSet<DanglingRef> = dangling_references(store).into_iter().collect();
    let mut batch = Batch::new(store.clone());

    for (index, edit) in edits.iter().enumerate() {
        if let Err(source) = batch.apply_one(edit) {
            let error = EditError::InBatch {
                index,
                source: Box::new(source),
            };
            warn!(%error, edits = edits.len(), "rejected edit batch");
            return Err(error);
        }
    }
    if let Err(error) = batch.validate() {
        warn!(%error, edits = edits.len(), "rejected edit batch");
        return Err(error);
    }

    let Batch {
        store, mut report, ..
    } = batch;
    report.applied = edits.len();
    report.dangling = dangling_references(&store)
        .into_iter()
        .filter(|reference| !dangling_before.contains(reference))
        .collect();
    debug!(
        applied = report.applied,
        removed = report.removed.len(),
        pruned = report.pruned_overrides.len(),
        dangling = report.dangling.len(),
        "applied edit batch"
    );
    Ok((store, report))
}

/// Entities whose batch-level invariants need re-checking.
#[derive(Debug, Default)]
struct Touched {
    elements: BTreeSet<ElementId>,
    instances: BTreeSet<InstanceId>,
    components: BTreeSet<ComponentId>,
    props: BTreeSet<PropId>,
    groups: BTreeSet<CollectionId>,
    token_values: BTreeSet<TokenValueId>,
    preset_values: BTreeSet<PresetModeValueId>,
    bindings: BTreeSet<(NodeRef, String)>,
    ownership_changed: bool,
}

struct Batch {
    store: EntityStore,
    index: TreeIndex,
    touched: Touched,
    report: EditReport,
}

impl Batch {
    fn new(store: EntityStore) -> Self {
        let index = TreeIndex::build(&store);
        Self {
            store,
            index,
            touched: Touched::default(),
            report: EditReport::default(),
        }
    }

    fn apply_one(&mut self, edit: &Edit) -> Result<(), EditError> {
        match edit {
            Edit::PutScreen(screen) => {
                self.store.screens.insert(screen.clone());
            }
            Edit::PutElement(element) => self.put_element(element),
            Edit::PutComponent(component) => {
                self.touched.components.insert(component.id.clone());
                self.store.components.insert(component.clone());
            }
            Edit::PutInstance(instance) => self.put_instance(instance)?,
            Edit::PutProp(prop) => self.put_prop(prop)?,
            Edit::PutPropValue(value) => self.put_prop_value(value)?,
            Edit::PutVariable(variable) => self.put_variable(variable)?,
            Edit::PutToken(token) => self.put_token(token)?,
            Edit::PutModeGroup(group) => {
                self.touched.groups.insert(group.id.clone());
                self.store.mode_groups.insert(group.clone());
            }
            Edit::PutMode(mode) => self.put_mode(mode)?,
            Edit::PutTokenValue(value) => {
                require(
                    self.store.tokens.contains(&value.token_id),
                    EntityKind::Token,
                    &value.token_id,
                )?;
                self.touched.token_values.insert(value.id.clone());
                self.store.token_values.insert(value.clone());
            }
            Edit::PutPreset(preset) => {
                require(
                    self.store.mode_groups.contains(&preset.collection_id),
                    EntityKind::ModeGroup,
                    &preset.collection_id,
                )?;
                self.store.presets.insert(preset.clone());
            }
            Edit::PutPresetModeValue(value) => {
                require(
                    self.store.presets.contains(&value.preset_id),
                    EntityKind::Preset,
                    &value.preset_id,
                )?;
                self.touched.preset_values.insert(value.id.clone());
                self.store.preset_mode_values.insert(value.clone());
            }
            Edit::PutDataModel(model) => {
                self.store.data_models.insert(model.clone());
            }

            Edit::Move { node, owner } => self.move_node(node, owner)?,
            Edit::SetOverride {
                instance,
                prop,
                value,
            } => self.set_override(instance, prop, value)?,
            Edit::ClearOverride { instance, prop } => {
                self.instance_mut(instance)?.overrides.props.remove(prop);
            }
            Edit::SetInstanceStyle {
                instance,
                name,
                value,
            } => {
                let style = &mut self.instance_mut(instance)?.overrides.style;
                match value {
                    Some(value) => style.insert(name.clone(), value.clone()),
                    None => style.remove(name),
                };
            }
            Edit::SetProperty {
                element,
                section,
                name,
                value,
            } => {
                let element = self
                    .store
                    .elements
                    .get_mut(element)
                    .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::Element, element)))?;
                let literals = element.properties.section_mut(*section);
                match value {
                    Some(value) => literals.insert(name.clone(), value.clone()),
                    None => literals.remove(name),
                };
            }
            Edit::Bind {
                node,
                property,
                binding,
            } => {
                self.bindings_mut(node)?
                    .insert(property.clone(), binding.clone());
                self.touched.bindings.insert((node.clone(), property.clone()));
            }
            Edit::Unbind { node, property } => {
                self.bindings_mut(node)?.remove(property);
                self.touched.bindings.remove(&(node.clone(), property.clone()));
            }
            Edit::SetDefaultPropValue { prop, value } => self.set_default_prop_value(prop, value.as_ref())?,

            Edit::RemoveScreen { id } => self.remove_screen(id)?,
            Edit::RemoveElement { id } => {
                require(self.store.elements.contains(id), EntityKind::Element, id)?;
                self.remove_subtree(&NodeRef::Element(id.clone()));
            }
            Edit::RemoveInstance { id } => {
                require(self.store.instances.contains(id), EntityKind::Instance, id)?;
                self.remove_subtree(&NodeRef::Instance(id.clone()));
            }
            Edit::RemoveComponent { id } => self.remove_component(id)?,
            Edit::RemoveProp { id } => self.remove_prop(id)?,
            Edit::RemovePropValue { id } => self.remove_prop_value(id)?,
            Edit::RemoveVariable { id } => {
                self.store
                    .variables
                    .remove(id)
                    .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::Variable, id)))?;
                self.removed(EntityKind::Variable, id);
            }
            Edit::RemoveToken { id } => {
                self.store
                    .tokens
                    .remove(id)
                    .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::Token, id)))?;
                self.removed(EntityKind::Token, id);
                for value in self.store.token_values.drain_where(|value| value.token_id != *id) {
                    self.removed(EntityKind::TokenValue, &value.id);
                }
            }
            Edit::RemoveMode { id } => self.remove_mode(id)?,
            Edit::RemovePreset { id } => {
                self.store
                    .presets
                    .remove(id)
                    .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::Preset, id)))?;
                self.removed(EntityKind::Preset, id);
                for value in self
                    .store
                    .preset_mode_values
                    .drain_where(|value| value.preset_id != *id)
                {
                    self.removed(EntityKind::PresetModeValue, &value.id);
                }
            }
            Edit::RemoveDataModel { id } => {
                self.store
                    .data_models
                    .remove(id)
                    .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::DataModel, id)))?;
                self.removed(EntityKind::DataModel, id);
            }
        }
        Ok(())
    }

    fn removed(&mut self, kind: EntityKind, id: impl fmt::Display) {
        self.report.removed.push(EntityRef::new(kind, id));
    }

    fn instance_mut(&mut self, id: &InstanceId) -> Result<&mut Instance, EditError> {
        self.touched.instances.insert(id.clone());
        self.store
            .instances
            .get_mut(id)
            .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::Instance, id)))
    }

    fn bindings_mut(
        &mut self,
        node: &NodeRef,
    ) -> Result<&mut BTreeMap<String, Binding>, EditError> {
        let bindings = match node {
            NodeRef::Element(id) => self.store.elements.get_mut(id).map(|element| &mut element.bindings),
            NodeRef::Instance(id) => self
                .store
                .instances
                .get_mut(id)
                .map(|instance| &mut instance.bindings),
        };
        bindings.ok_or_else(|| EditError::not_found(node.entity()))
    }

    fn put_element(&mut self, element: &Element) {
        let node = NodeRef::Element(element.id.clone());
        self.store.elements.insert(element.clone());
        self.index.rebuild_one(&self.store, &node);
        self.touched.elements.insert(element.id.clone());
        self.touched.ownership_changed = true;
        for property in element.bindings.keys() {
            self.touched.bindings.insert((node.clone(), property.clone()));
        }
    }

    fn put_instance(&mut self, instance: &Instance) -> Result<(), EditError> {
        require(
            self.store.components.contains(&instance.component_id),
            EntityKind::Component,
            &instance.component_id,
        )?;
        let node = NodeRef::Instance(instance.id.clone());
        self.store.instances.insert(instance.clone());
        self.index.rebuild_one(&self.store, &node);
        self.touched.instances.insert(instance.id.clone());
        self.touched.ownership_changed = true;
        for property in instance.bindings.keys() {
            self.touched.bindings.insert((node.clone(), property.clone()));
        }
        Ok(())
    }

    fn put_prop(&mut self, prop: &Prop) -> Result<(), EditError> {
        if let Some(existing) = self.store.props.get(&prop.id)
            && existing.component_id != prop.component_id
        {
            return Err(EditError::PropComponentMismatch {
                prop: prop.id.clone(),
                expected: existing.component_id.to_string(),
                actual: prop.component_id.to_string(),
            });
        }
        let component = self
            .store
            .components
            .get_mut(&prop.component_id)
            .ok_or_else(|| {
                EditError::not_found(EntityRef::new(EntityKind::Component, &prop.component_id))
            })?;
        if !component.props.contains(&prop.id) {
            component.props.push(prop.id.clone());
        }
        self.touched.props.insert(prop.id.clone());
        self.touched.components.insert(prop.component_id.clone());
        self.store.props.insert(prop.clone());
        Ok(())
    }

    fn put_prop_value(&mut self, value: &PropValue) -> Result<(), EditError> {
        require(
            self.store.props.contains(&value.prop_id),
            EntityKind::Prop,
            &value.prop_id,
        )?;
        if let Some(previous) = self.store.prop_values.get(&value.id)
            && previous.prop_id != value.prop_id
        {
            let previous_prop = previous.prop_id.clone();
            if let Some(prop) = self.store.props.get_mut(&previous_prop) {
                prop.values.retain(|id| *id != value.id);
            }
            self.touched.props.insert(previous_prop);
        }
        if let Some(prop) = self.store.props.get_mut(&value.prop_id)
            && !prop.values.contains(&value.id)
        {
            prop.values.push(value.id.clone());
        }
        self.touched.props.insert(value.prop_id.clone());
        self.store.prop_values.insert(value.clone());
        Ok(())
    }

    fn put_variable(&mut self, variable: &Variable) -> Result<(), EditError> {
        let owner = variable.ownership.as_root().as_owner();
        if !self.store.contains_owner(&owner) {
            return Err(EditError::UnknownOwner { owner });
        }
        self.store.variables.insert(variable.clone());
        Ok(())
    }

    fn put_token(&mut self, token: &Token) -> Result<(), EditError> {
        require(
            self.store.mode_groups.contains(&token.collection_id),
            EntityKind::ModeGroup,
            &token.collection_id,
        )?;
        let moved_collection = self
            .store
            .tokens
            .get(&token.id)
            .is_some_and(|previous| previous.collection_id != token.collection_id);
        if moved_collection {
            let values = self
                .store
                .token_values
                .iter()
                .filter(|value| value.token_id == token.id)
                .map(|value| value.id.clone())
                .collect::<Vec<_>>();
            self.touched.token_values.extend(values);
        }
        self.store.tokens.insert(token.clone());
        Ok(())
    }

    fn put_mode(&mut self, mode: &Mode) -> Result<(), EditError> {
        require(
            self.store.mode_groups.contains(&mode.mode_group_id),
            EntityKind::ModeGroup,
            &mode.mode_group_id,
        )?;
        if let Some(previous) = self.store.modes.get(&mode.id)
            && previous.mode_group_id != mode.mode_group_id
        {
            let previous_group = previous.mode_group_id.clone();
            if let Some(group) = self.store.mode_groups.get_mut(&previous_group) {
                group.mode_ids.retain(|id| *id != mode.id);
            }
            self.touched.groups.insert(previous_group);
        }
        if let Some(group) = self.store.mode_groups.get_mut(&mode.mode_group_id)
            && !group.mode_ids.contains(&mode.id)
        {
            group.mode_ids.push(mode.id.clone());
        }
        self.touched.groups.insert(mode.mode_group_id.clone());
        self.store.modes.insert(mode.clone());
        Ok(())
    }

    fn move_node(&mut self, node: &NodeRef, owner: &Owner) -> Result<(), EditError> {
        if !self.store.contains_owner(owner) {
            return Err(EditError::UnknownOwner {
                owner: owner.clone(),
            });
        }
        match node {
            NodeRef::Element(id) => {
                let element = self
                    .store
                    .elements
                    .get_mut(id)
                    .ok_or_else(|| EditError::not_found(node.entity()))?;
                element.ownership = owner.clone();
                if owns_itself(&self.store, id) {
                    return Err(EditError::CyclicOwnership {
                        node: node.clone(),
                        owner: owner.clone(),
                    });
                }
                self.touched.elements.insert(id.clone());
            }
            NodeRef::Instance(id) => {
                self.instance_mut(id)?.ownership = owner.clone();
            }
        }
        self.index.rebuild_one(&self.store, node);
        self.touched.ownership_changed = true;
        Ok(())
    }

    fn set_override(
        &mut self,
        instance_id: &InstanceId,
        prop_id: &PropId,
        value: &OverrideValue,
    ) -> Result<(), EditError> {
        let instance = self.store.instances.get(instance_id).ok_or_else(|| {
            EditError::not_found(EntityRef::new(EntityKind::Instance, instance_id))
        })?;
        if !prop_defined_on(&self.store, &instance.component_id, prop_id) {
            return Err(EditError::UnknownPropOverride {
                instance: instance_id.clone(),
                prop: prop_id.clone(),
                component: instance.component_id.to_string(),
            });
        }
        match value {
            OverrideValue::Literal(_) => {}
            OverrideValue::Reference(OverrideRef::PropValue { id }) => {
                let prop_value = self.store.prop_values.get(id).ok_or_else(|| {
                    EditError::not_found(EntityRef::new(EntityKind::PropValue, id))
                })?;
                if prop_value.prop_id != *prop_id {
                    return Err(EditError::PropValueMismatch {
                        prop: prop_id.clone(),
                        value: id.clone(),
                    });
                }
            }
            OverrideValue::Reference(OverrideRef::DataModel { id }) => {
                require(self.store.data_models.contains(id), EntityKind::DataModel, id)?;
            }
        }
        self.instance_mut(instance_id)?
            .overrides
            .props
            .insert(prop_id.clone(), value.clone());
        Ok(())
    }

    fn set_default_prop_value(
        &mut self,
        prop_id: &PropId,
        value: Option<&PropValueId>,
    ) -> Result<(), EditError> {
        require(self.store.props.contains(prop_id), EntityKind::Prop, prop_id)?;
        if let Some(id) = value {
            let prop_value = self
                .store
                .prop_values
                .get(id)
                .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::PropValue, id)))?;
            if prop_value.prop_id != *prop_id {
                return Err(EditError::PropValueMismatch {
                    prop: prop_id.clone(),
                    value: id.clone(),
                });
            }
        }
        for prop_value in self.store.prop_values.values_mut() {
            if prop_value.prop_id == *prop_id {
                prop_value.is_default = Some(&prop_value.id) == value;
            }
        }
        self.touched.props.insert(prop_id.clone());
        Ok(())
    }

    /// Every node owned, directly or through elements, by `owner`.
    fn owned_subtree(&self, owner: &Owner) -> Vec<NodeRef> {
        let mut nodes = Vec::new();
        let mut stack = vec![owner.clone()];
        while let Some(owner) = stack.pop() {
            for child in self.index.children(&owner) {
                if let NodeRef::Element(id) = child {
                    stack.push(Owner::Element(id.clone()));
                }
                nodes.push(child.clone());
            }
        }
        nodes
    }

    fn remove_node(&mut self, node: &NodeRef) {
        let removed = match node {
            NodeRef::Element(id) => self.store.elements.remove(id).is_some(),
            NodeRef::Instance(id) => self.store.instances.remove(id).is_some(),
        };
        if removed {
            self.index.rebuild_one(&self.store, node);
            self.report.removed.push(node.entity());
        }
    }

    /// Removes `node` and everything it owns.
    fn remove_subtree(&mut self, node: &NodeRef) {
        let descendants = match node {
            NodeRef::Element(id) => self.owned_subtree(&Owner::Element(id.clone())),
            NodeRef::Instance(_) => Vec::new(),
        };
        self.remove_node(node);
        for descendant in &descendants {
            self.remove_node(descendant);
        }
    }

    fn remove_owned(&mut self, owner: &Owner) {
        for node in self.owned_subtree(owner) {
            self.remove_node(&node);
        }
    }

    fn remove_scoped_variables(&mut self, scope: &Scope) {
        for variable in self
            .store
            .variables
            .drain_where(|variable| variable.ownership != *scope)
        {
            self.removed(EntityKind::Variable, &variable.id);
        }
    }

    fn remove_screen(&mut self, id: &ScreenId) -> Result<(), EditError> {
        self.store
            .screens
            .remove(id)
            .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::Screen, id)))?;
        self.removed(EntityKind::Screen, id);
        self.remove_owned(&Owner::Screen(id.clone()));
        self.remove_scoped_variables(&Scope::Screen(id.clone()));
        Ok(())
    }

    /// Instances of the component stay; they materialize as diagnostics.
    fn remove_component(&mut self, id: &ComponentId) -> Result<(), EditError> {
        let component = self
            .store
            .components
            .remove(id)
            .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::Component, id)))?;
        self.removed(EntityKind::Component, id);
        self.remove_owned(&Owner::Component(id.clone()));
        for prop in &component.props {
            if self.store.props.contains(prop) {
                self.remove_prop(prop)?;
            }
        }
        self.remove_scoped_variables(&Scope::Component(id.clone()));
        Ok(())
    }

    fn remove_prop(&mut self, id: &PropId) -> Result<(), EditError> {
        let prop = self
            .store
            .props
            .remove(id)
            .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::Prop, id)))?;
        self.removed(EntityKind::Prop, id);
        for value in self.store.prop_values.drain_where(|value| value.prop_id != *id) {
            self.removed(EntityKind::PropValue, &value.id);
        }
        if let Some(component) = self.store.components.get_mut(&prop.component_id) {
            component.props.retain(|existing| existing != id);
        }
        let mut pruned = Vec::new();
        for instance in self.store.instances.values_mut() {
            if instance.overrides.props.remove(id).is_some() {
                pruned.push(PrunedOverride {
                    instance: instance.id.clone(),
                    prop: id.clone(),
                });
            }
        }
        pruned.sort_by(|a, b| a.instance.cmp(&b.instance));
        self.report.pruned_overrides.extend(pruned);
        Ok(())
    }

    fn remove_prop_value(&mut self, id: &PropValueId) -> Result<(), EditError> {
        let value = self
            .store
            .prop_values
            .remove(id)
            .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::PropValue, id)))?;
        self.removed(EntityKind::PropValue, id);
        if let Some(prop) = self.store.props.get_mut(&value.prop_id) {
            prop.values.retain(|existing| existing != id);
        }
        Ok(())
    }

    fn remove_mode(&mut self, id: &ModeId) -> Result<(), EditError> {
        let mode = self
            .store
            .modes
            .get(id)
            .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::Mode, id)))?;
        let group_id = mode.mode_group_id.clone();
        if self
            .store
            .mode_groups
            .get(&group_id)
            .is_some_and(|group| group.default_mode_id == *id)
        {
            return Err(EditError::DefaultModeRequired {
                group: group_id.to_string(),
            });
        }
        self.store.modes.remove(id);
        self.removed(EntityKind::Mode, id);
        if let Some(group) = self.store.mode_groups.get_mut(&group_id) {
            group.mode_ids.retain(|existing| existing != id);
        }
        for value in self
            .store
            .token_values
            .drain_where(|value| value.variable_mode_id != *id)
        {
            self.removed(EntityKind::TokenValue, &value.id);
        }
        for value in self
            .store
            .preset_mode_values
            .drain_where(|value| value.variable_mode_id != *id)
        {
            self.removed(EntityKind::PresetModeValue, &value.id);
        }
        self.touched.groups.insert(group_id);
        Ok(())
    }

    fn validate(&self) -> Result<(), EditError> {
        self.validate_ownership()?;
        self.validate_components()?;
        self.validate_overrides()?;
        self.validate_prop_defaults()?;
        self.validate_mode_groups()?;
        self.validate_mode_values()?;
        self.validate_bindings()
    }

    fn validate_ownership(&self) -> Result<(), EditError> {
        let store = &self.store;
        for id in &self.touched.elements {
            let Some(element) = store.elements.get(id) else {
                continue;
            };
            if !store.contains_owner(&element.ownership) {
                return Err(EditError::UnknownOwner {
                    owner: element.ownership.clone(),
                });
            }
            if owns_itself(store, id) {
                return Err(EditError::CyclicOwnership {
                    node: NodeRef::Element(id.clone()),
                    owner: element.ownership.clone(),
                });
            }
        }
        for id in &self.touched.instances {
            let Some(instance) = store.instances.get(id) else {
                continue;
            };
            if !store.contains_owner(&instance.ownership) {
                return Err(EditError::UnknownOwner {
                    owner: instance.ownership.clone(),
                });
            }
        }
        if self.touched.ownership_changed {
            let edges = expansion_edges(store);
            for instance in store.instances.iter() {
                if instance_recurses(store, &edges, &instance.id) {
                    return Err(EditError::RecursiveInstance {
                        instance: instance.id.clone(),
                        component: instance.component_id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_components(&self) -> Result<(), EditError> {
        for id in &self.touched.components {
            let Some(component) = self.store.components.get(id) else {
                continue;
            };
            for prop_id in &component.props {
                let prop = self
                    .store
                    .props
                    .get(prop_id)
                    .ok_or_else(|| EditError::not_found(EntityRef::new(EntityKind::Prop, prop_id)))?;
                if prop.component_id != *id {
                    return Err(EditError::PropComponentMismatch {
                        prop: prop_id.clone(),
                        expected: id.to_string(),
                        actual: prop.component_id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_overrides(&self) -> Result<(), EditError> {
        for id in &self.touched.instances {
            let Some(instance) = self.store.instances.get(id) else {
                continue;
            };
            for (prop_id, value) in &instance.overrides.props {
                if !prop_defined_on(&self.store, &instance.component_id, prop_id) {
                    return Err(EditError::UnknownPropOverride {
                        instance: id.clone(),
                        prop: prop_id.clone(),
                        component: instance.component_id.to_string(),
                    });
                }
                if let OverrideValue::Reference(OverrideRef::PropValue { id: value_id }) = value
                    && let Some(prop_value) = self.store.prop_values.get(value_id)
                    && prop_value.prop_id != *prop_id
                {
                    return Err(EditError::PropValueMismatch {
                        prop: prop_id.clone(),
                        value: value_id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// At most one PropValue per prop is flagged default.
    fn validate_prop_defaults(&self) -> Result<(), EditError> {
        for id in &self.touched.props {
            let mut defaults = self
                .store
                .prop_values
                .iter()
                .filter(|value| value.prop_id == *id && value.is_default);
            if let (Some(existing), Some(_)) = (defaults.next(), defaults.next()) {
                return Err(EditError::DuplicateDefault {
                    owner: EntityRef::new(EntityKind::Prop, id),
                    existing: EntityRef::new(EntityKind::PropValue, &existing.id),
                });
            }
        }
        Ok(())
    }

    /// Exactly one Mode per group is flagged default, and it is the one the
    /// group names.
    fn validate_mode_groups(&self) -> Result<(), EditError> {
        for id in &self.touched.groups {
            let Some(group) = self.store.mode_groups.get(id) else {
                continue;
            };
            check_mode_group(&self.store, group)?;
        }
        Ok(())
    }

    fn validate_mode_values(&self) -> Result<(), EditError> {
        for id in &self.touched.token_values {
            let Some(value) = self.store.token_values.get(id) else {
                continue;
            };
            let Some(token) = self.store.tokens.get(&value.token_id) else {
                continue;
            };
            check_mode_in_collection(
                &self.store,
                EntityRef::new(EntityKind::TokenValue, id),
                &value.variable_mode_id,
                &token.collection_id,
            )?;
        }
        for id in &self.touched.preset_values {
            let Some(value) = self.store.preset_mode_values.get(id) else {
                continue;
            };
            let Some(preset) = self.store.presets.get(&value.preset_id) else {
                continue;
            };
            check_mode_in_collection(
                &self.store,
                EntityRef::new(EntityKind::PresetModeValue, id),
                &value.variable_mode_id,
                &preset.collection_id,
            )?;
        }
        Ok(())
    }

    /// Newly written bindings must point at something. Bindings broken by a
    /// removal are reported instead.
    fn validate_bindings(&self) -> Result<(), EditError> {
        for (node, property) in &self.touched.bindings {
            let binding = match node {
                NodeRef::Element(id) => self
                    .store
                    .elements
                    .get(id)
                    .and_then(|element| element.bindings.get(property)),
                NodeRef::Instance(id) => self
                    .store
                    .instances
                    .get(id)
                    .and_then(|instance| instance.bindings.get(property)),
            };
            if let Some(target) = binding.and_then(|binding| missing_binding_target(&self.store, binding)) {
                return Err(EditError::not_found(target));
            }
        }
        Ok(())
    }
}

fn require(present: bool, kind: EntityKind, id: impl fmt::Display) -> Result<(), EditError> {
    if present {
        Ok(())
    } else {
        Err(EditError::not_found(EntityRef::new(kind, id)))
    }
}

fn prop_defined_on(store: &EntityStore, component: &ComponentId, prop: &PropId) -> bool {
    store
        .components
        .get(component)
        .is_some_and(|component| component.props.contains(prop))
        && store
            .props
            .get(prop)
            .is_some_and(|prop| prop.component_id == *component)
}

pub(crate) fn check_mode_group(store: &EntityStore, group: &ModeGroup) -> Result<(), EditError> {
    let mut defaults = store
        .modes
        .iter()
        .filter(|mode| mode.mode_group_id == group.id && mode.is_default);
    let first = defaults.next();
    if let (Some(_), Some(second)) = (first, defaults.next()) {
        return Err(EditError::DuplicateDefault {
            owner: EntityRef::new(EntityKind::ModeGroup, &group.id),
            existing: EntityRef::new(EntityKind::Mode, &second.id),
        });
    }
    let consistent = first.is_some_and(|mode| mode.id == group.default_mode_id)
        && group.mode_ids.contains(&group.default_mode_id);
    if !consistent {
        return Err(EditError::DefaultModeRequired {
            group: group.id.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn check_mode_in_collection(
    store: &EntityStore,
    target: EntityRef,
    mode: &ModeId,
    collection: &CollectionId,
) -> Result<(), EditError> {
    if store
        .modes
        .get(mode)
        .is_some_and(|record| record.mode_group_id == *collection)
    {
        return Ok(());
    }
    Err(EditError::ModeOutsideCollection {
        target,
        mode: mode.clone(),
        collection: collection.to_string(),
    })
}
