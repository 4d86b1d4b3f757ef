//! Whole-store consistency report.
//!
//! Documents can arrive from outside the write boundary, so a loaded store
//! may break invariants the edit path would have rejected. `check` lists
//! every such problem without stopping at the first.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use uib_model::{Binding, EntityKind, EntityRef, EntityStore, NodeRef, Root, VariableId};

use crate::edit::{check_mode_group, check_mode_in_collection};
use crate::error::EditError;
use crate::ownership::{RootWalk, expansion_edges, instance_recurses, root_of};
use crate::references::dangling_references;
use crate::resolve::{Resolver, visible_scopes};
use crate::tree::NodeEntity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCode {
    OwnershipCycle,
    RecursiveInstance,
    MissingOwner,
    MissingComponent,
    DuplicateDefault,
    DefaultMode,
    ForeignMode,
    StaleOverride,
    DanglingReference,
    OutOfScope,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::OwnershipCycle => "ownership-cycle",
            IssueCode::RecursiveInstance => "recursive-instance",
            IssueCode::MissingOwner => "missing-owner",
            IssueCode::MissingComponent => "missing-component",
            IssueCode::DuplicateDefault => "duplicate-default",
            IssueCode::DefaultMode => "default-mode",
            IssueCode::ForeignMode => "foreign-mode",
            IssueCode::StaleOverride => "stale-override",
            IssueCode::DanglingReference => "dangling-reference",
            IssueCode::OutOfScope => "out-of-scope",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            IssueCode::OwnershipCycle
            | IssueCode::RecursiveInstance
            | IssueCode::MissingOwner
            | IssueCode::DuplicateDefault
            | IssueCode::DefaultMode
            | IssueCode::ForeignMode => Severity::Error,
            IssueCode::MissingComponent
            | IssueCode::StaleOverride
            | IssueCode::DanglingReference
            | IssueCode::OutOfScope => Severity::Warning,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub code: IssueCode,
    pub severity: Severity,
    pub entity: EntityRef,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub issues: Vec<Issue>,
}

impl CheckReport {
    fn push(&mut self, code: IssueCode, entity: EntityRef, message: impl Into<String>) {
        self.issues.push(Issue {
            code,
            severity: code.severity(),
            entity,
            message: message.into(),
        });
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn with_code(&self, code: IssueCode) -> impl Iterator<Item = &Issue> + '_ {
        self.issues.iter().filter(move |issue| issue.code == code)
    }
}

/// Scans `store` for broken invariants and references.
pub fn check(store: &EntityStore) -> CheckReport {
    let mut report = CheckReport::default();
    check_ownership(store, &mut report);
    check_expansion(store, &mut report);
    check_props(store, &mut report);
    check_modes(store, &mut report);
    check_references(store, &mut report);
    check_variable_scopes(store, &mut report);
    report.issues.sort_by(|a, b| {
        (a.severity, a.code, &a.entity).cmp(&(b.severity, b.code, &b.entity))
    });
    debug!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "checked store"
    );
    report
}

fn nodes(store: &EntityStore) -> impl Iterator<Item = NodeRef> + '_ {
    store
        .elements
        .ids()
        .iter()
        .cloned()
        .map(NodeRef::Element)
        .chain(store.instances.ids().iter().cloned().map(NodeRef::Instance))
}

fn check_ownership(store: &EntityStore, report: &mut CheckReport) {
    for node in nodes(store) {
        match root_of(store, &node) {
            Some(RootWalk::Cycle(element)) => report.push(
                IssueCode::OwnershipCycle,
                node.entity(),
                format!("ownership chain loops through element {element}"),
            ),
            Some(RootWalk::Missing(owner)) => report.push(
                IssueCode::MissingOwner,
                node.entity(),
                format!("ownership chain reaches missing {owner}"),
            ),
            Some(RootWalk::Root(_)) | None => {}
        }
    }
    for variable in store.variables.iter() {
        let owner = variable.ownership.as_root().as_owner();
        if !store.contains_owner(&owner) {
            report.push(
                IssueCode::MissingOwner,
                EntityRef::new(EntityKind::Variable, &variable.id),
                format!("scoped to missing {owner}"),
            );
        }
    }
}

fn check_expansion(store: &EntityStore, report: &mut CheckReport) {
    let edges = expansion_edges(store);
    for instance in store.instances.iter() {
        if instance_recurses(store, &edges, &instance.id) {
            report.push(
                IssueCode::RecursiveInstance,
                EntityRef::new(EntityKind::Instance, &instance.id),
                format!("expands component {} inside itself", instance.component_id),
            );
        }
    }
}

fn check_props(store: &EntityStore, report: &mut CheckReport) {
    for prop in store.props.iter() {
        let defaults = store
            .prop_values
            .iter()
            .filter(|value| value.prop_id == prop.id && value.is_default)
            .count();
        if defaults > 1 {
            report.push(
                IssueCode::DuplicateDefault,
                EntityRef::new(EntityKind::Prop, &prop.id),
                format!("{defaults} prop values are flagged default"),
            );
        }
    }
    for instance in store.instances.iter() {
        let Some(component) = store.components.get(&instance.component_id) else {
            continue;
        };
        for prop in instance.overrides.props.keys() {
            let defined = component.props.contains(prop)
                && store
                    .props
                    .get(prop)
                    .is_some_and(|record| record.component_id == component.id);
            if !defined {
                report.push(
                    IssueCode::StaleOverride,
                    EntityRef::new(EntityKind::Instance, &instance.id),
                    format!("overrides prop {prop}, which component {} does not define", component.id),
                );
            }
        }
    }
}

fn check_modes(store: &EntityStore, report: &mut CheckReport) {
    for group in store.mode_groups.iter() {
        if let Err(error) = check_mode_group(store, group) {
            let code = match &error {
                EditError::DuplicateDefault { .. } => IssueCode::DuplicateDefault,
                _ => IssueCode::DefaultMode,
            };
            report.push(
                code,
                EntityRef::new(EntityKind::ModeGroup, &group.id),
                error.to_string(),
            );
        }
    }
    for value in store.token_values.iter() {
        let Some(token) = store.tokens.get(&value.token_id) else {
            continue;
        };
        let target = EntityRef::new(EntityKind::TokenValue, &value.id);
        if let Err(error) = check_mode_in_collection(
            store,
            target.clone(),
            &value.variable_mode_id,
            &token.collection_id,
        ) {
            report.push(IssueCode::ForeignMode, target, error.to_string());
        }
    }
    for value in store.preset_mode_values.iter() {
        let Some(preset) = store.presets.get(&value.preset_id) else {
            continue;
        };
        let target = EntityRef::new(EntityKind::PresetModeValue, &value.id);
        if let Err(error) = check_mode_in_collection(
            store,
            target.clone(),
            &value.variable_mode_id,
            &preset.collection_id,
        ) {
            report.push(IssueCode::ForeignMode, target, error.to_string());
        }
    }
}

fn check_references(store: &EntityStore, report: &mut CheckReport) {
    for reference in dangling_references(store) {
        let code = if reference.target.kind == EntityKind::Component {
            IssueCode::MissingComponent
        } else {
            IssueCode::DanglingReference
        };
        report.push(
            code,
            reference.holder,
            format!("{} points at missing {}", reference.slot, reference.target),
        );
    }
    for value in store.token_values.iter() {
        if !store.tokens.contains(&value.token_id) {
            report.push(
                IssueCode::DanglingReference,
                EntityRef::new(EntityKind::TokenValue, &value.id),
                format!("belongs to missing token {}", value.token_id),
            );
        }
    }
    for value in store.preset_mode_values.iter() {
        if !store.presets.contains(&value.preset_id) {
            report.push(
                IssueCode::DanglingReference,
                EntityRef::new(EntityKind::PresetModeValue, &value.id),
                format!("belongs to missing preset {}", value.preset_id),
            );
        }
    }
}

/// DATA_VARIABLE bindings that no materialized tree can read.
///
/// Every screen and component is walked, and a binding counts as readable
/// when at least one placement of its node sees the variable's scope. A
/// component element reading a screen variable is fine as long as some
/// instance of that component sits on the screen.
fn check_variable_scopes(store: &EntityStore, report: &mut CheckReport) {
    let resolver = Resolver::new(store);
    let roots: Vec<Root> = store
        .screens
        .iter()
        .map(|screen| Root::Screen(screen.id.clone()))
        .chain(
            store
                .components
                .iter()
                .map(|component| Root::Component(component.id.clone())),
        )
        .collect();

    // (node, property) -> (variable, its scope, readable somewhere)
    let mut reads: BTreeMap<(NodeRef, &str), (&VariableId, Root, bool)> = BTreeMap::new();
    for root in &roots {
        for tree_node in resolver.materialize(root) {
            let bindings = match tree_node.entity {
                NodeEntity::Element(element) => &element.bindings,
                NodeEntity::Instance(instance) => &instance.bindings,
            };
            let context = tree_node.context();
            let visible = visible_scopes(store, &context);
            for (property, binding) in bindings {
                let Binding::DataVariable { id } = binding else {
                    continue;
                };
                let Some(variable) = store.variables.get(id) else {
                    continue;
                };
                let scope = variable.ownership.as_root();
                let readable = visible.contains(&scope);
                reads
                    .entry((context.node.clone(), property.as_str()))
                    .and_modify(|entry| entry.2 |= readable)
                    .or_insert((id, scope, readable));
            }
        }
    }

    for ((node, property), (id, scope, readable)) in reads {
        if !readable {
            report.push(
                IssueCode::OutOfScope,
                node.entity(),
                format!(
                    "{property} reads variable {id} of {scope}, which no tree placing it can see"
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uib_model::{
        CollectionId, Component, ComponentId, Element, ElementId, Instance, InstanceId, Mode,
        ModeGroup, ModeId, Owner, PresetId, PresetModeValue, PresetModeValueId, Scope, Screen,
        ScreenId, ValueType, Variable, VariableId,
    };

    use super::*;

    fn screen(store: &mut EntityStore, id: &str) -> ScreenId {
        let id = ScreenId::new(id).unwrap();
        store.screens.insert(Screen {
            id: id.clone(),
            name: String::new(),
        });
        id
    }

    #[test]
    fn clean_store_has_no_issues() {
        let mut store = EntityStore::new();
        let home = screen(&mut store, "home");
        store.elements.insert(Element::new(
            ElementId::new("title").unwrap(),
            Owner::Screen(home),
            "text",
        ));
        let report = check(&store);
        assert!(report.issues.is_empty(), "{:?}", report.issues);
    }

    #[test]
    fn reports_cross_screen_variable_and_bad_mode_group() {
        let mut store = EntityStore::new();
        let home = screen(&mut store, "home");
        let settings = screen(&mut store, "settings");
        let var = VariableId::new("v_user").unwrap();
        store.variables.insert(Variable {
            id: var.clone(),
            name: "user".to_string(),
            value_type: ValueType::String,
            value: json!("Ada"),
            ownership: Scope::Screen(settings),
        });
        store.elements.insert(
            Element::new(ElementId::new("greeting").unwrap(), Owner::Screen(home), "text")
                .with_binding("text", Binding::DataVariable { id: var }),
        );

        let theme = CollectionId::new("theme").unwrap();
        store.mode_groups.insert(ModeGroup {
            id: theme.clone(),
            name: "Theme".to_string(),
            group_type: String::new(),
            mode_ids: vec![ModeId::new("light").unwrap()],
            default_mode_id: ModeId::new("light").unwrap(),
        });
        store.modes.insert(Mode {
            id: ModeId::new("light").unwrap(),
            mode_group_id: theme,
            name: "Light".to_string(),
            is_default: false,
        });

        let report = check(&store);
        assert_eq!(report.with_code(IssueCode::OutOfScope).count(), 1);
        assert_eq!(report.with_code(IssueCode::DefaultMode).count(), 1);
        assert!(report.has_errors());
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn component_reading_a_screen_variable_is_fine_once_placed_there() {
        let mut store = EntityStore::new();
        let home = screen(&mut store, "home");
        let settings = screen(&mut store, "settings");
        let card = ComponentId::new("card").unwrap();
        store.components.insert(Component {
            id: card.clone(),
            name: "Card".to_string(),
            props: Vec::new(),
        });
        let var = VariableId::new("v_user").unwrap();
        store.variables.insert(Variable {
            id: var.clone(),
            name: "user".to_string(),
            value_type: ValueType::String,
            value: json!("Ada"),
            ownership: Scope::Screen(home.clone()),
        });
        store.elements.insert(
            Element::new(
                ElementId::new("card_root").unwrap(),
                Owner::Component(card.clone()),
                "text",
            )
            .with_binding("text", Binding::DataVariable { id: var }),
        );

        // Not placed anywhere yet: only the component's own tree shows it.
        assert_eq!(check(&store).with_code(IssueCode::OutOfScope).count(), 1);

        store.instances.insert(Instance::new(
            InstanceId::new("card_on_settings").unwrap(),
            card.clone(),
            Owner::Screen(settings),
        ));
        assert_eq!(check(&store).with_code(IssueCode::OutOfScope).count(), 1);

        store.instances.insert(Instance::new(
            InstanceId::new("card_on_home").unwrap(),
            card,
            Owner::Screen(home),
        ));
        let report = check(&store);
        assert_eq!(report.with_code(IssueCode::OutOfScope).count(), 0);
    }

    #[test]
    fn preset_mode_value_of_a_missing_preset_is_dangling() {
        let mut store = EntityStore::new();
        store.preset_mode_values.insert(PresetModeValue {
            id: PresetModeValueId::new("sh_gone@light").unwrap(),
            preset_id: PresetId::new("sh_gone").unwrap(),
            variable_mode_id: ModeId::new("light").unwrap(),
            value: json!("0 1px 2px"),
        });
        let report = check(&store);
        let issues: Vec<_> = report.with_code(IssueCode::DanglingReference).collect();
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].entity,
            EntityRef::new(EntityKind::PresetModeValue, "sh_gone@light")
        );
        assert!(issues[0].message.contains("missing preset sh_gone"));
    }
}
