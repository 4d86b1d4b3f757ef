//! Tests for prop, token and property resolution.

mod common;

use common::{
    component, element, group, instance, mode, prop, sample, screen, token, variable,
    with_nested_badge,
};
use serde_json::json;
use uib_core::{
    ActiveModes, NodeContext, PropertyState, ResolutionStatus, ResolveError, Resolved, Resolver,
    ValueSource,
};
use uib_model::{
    Binding, DataModelId, EntityKind, EntityRef, FieldId, InstanceId, NodeRef, OverrideValue, PresetId, Root,
    Section,
};

fn dark() -> ActiveModes {
    ActiveModes::new().with(group("theme"), mode("dark"))
}

fn value_of(state: Option<&PropertyState>) -> Option<serde_json::Value> {
    state
        .and_then(PropertyState::value)
        .and_then(|resolved| resolved.as_value().cloned())
}

// ============================================================================
// Tokens and presets
// ============================================================================

#[test]
fn token_falls_back_to_default_mode_value() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let resolved = resolver.resolve_token(&token("t_bg"), &dark()).unwrap();
    assert_eq!(resolved.value, Resolved::Value(json!("#fff")));
    assert_eq!(
        resolved.source,
        ValueSource::Token {
            token: token("t_bg"),
            mode: mode("light"),
            fallback: true,
        }
    );
}

#[test]
fn token_uses_default_mode_when_group_is_not_active() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let none = ActiveModes::new();
    assert_eq!(
        resolver.resolve_token(&token("t_text"), &none).unwrap().value,
        Resolved::Value(json!("#000"))
    );
    assert_eq!(
        resolver.resolve_token(&token("t_text"), &dark()).unwrap().value,
        Resolved::Value(json!("#eee"))
    );
}

#[test]
fn foreign_active_mode_is_ignored() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let modes = ActiveModes::new().with(group("theme"), mode("comfy"));
    let resolved = resolver.resolve_token(&token("t_text"), &modes).unwrap();
    assert_eq!(resolved.value, Resolved::Value(json!("#000")));
}

#[test]
fn missing_default_value_is_an_unresolved_token() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let error = resolver
        .resolve_token(&token("t_gap"), &ActiveModes::new())
        .unwrap_err();
    assert_eq!(
        error,
        ResolveError::UnresolvedToken {
            target: EntityRef::new(EntityKind::Token, "t_gap"),
            mode: mode("compact"),
            default_mode: mode("compact"),
        }
    );
    assert_eq!(error.status(), ResolutionStatus::UnresolvedToken);

    let comfy = ActiveModes::new().with(group("density"), mode("comfy"));
    assert_eq!(
        resolver.resolve_token(&token("t_gap"), &comfy).unwrap().value,
        Resolved::Value(json!("12px"))
    );
}

#[test]
fn presets_follow_the_same_mode_rules() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let shadow = PresetId::new("sh_card").unwrap();
    assert_eq!(
        resolver.resolve_preset(&shadow, &dark()).unwrap().value,
        Resolved::Value(json!("0 2px 4px"))
    );
    assert_eq!(
        resolver
            .resolve_preset(&shadow, &ActiveModes::new())
            .unwrap()
            .value,
        Resolved::Value(json!("0 1px 2px"))
    );
}

// ============================================================================
// Props
// ============================================================================

#[test]
fn prop_without_override_or_default_value_uses_prop_default() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let resolved = resolver
        .resolve_prop(&instance("card_2"), &prop("p_color"))
        .unwrap();
    assert_eq!(resolved.value, Resolved::Value(json!("red")));
    assert_eq!(
        resolved.source,
        ValueSource::PropDefault {
            prop: prop("p_color")
        }
    );
}

#[test]
fn literal_override_wins() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let resolved = resolver
        .resolve_prop(&instance("card_1"), &prop("p_color"))
        .unwrap();
    assert_eq!(resolved.value, Resolved::Value(json!("blue")));
}

#[test]
fn default_prop_value_beats_prop_default() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let resolved = resolver
        .resolve_prop(&instance("card_1"), &prop("p_size"))
        .unwrap();
    assert_eq!(resolved.value, Resolved::Value(json!("lg")));
}

#[test]
fn prop_not_on_component_is_unknown() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let error = resolver
        .resolve_prop(&instance("card_1"), &prop("p_missing"))
        .unwrap_err();
    assert_eq!(error.status(), ResolutionStatus::UnknownProp);
}

#[test]
fn data_model_override_returns_a_handle() {
    let mut store = sample();
    let users = DataModelId::new("m_users").unwrap();
    if let Some(card) = store.instances.get_mut(&instance("card_2")) {
        card.overrides
            .props
            .insert(prop("p_color"), OverrideValue::data_model(users.clone()));
    }
    let resolver = Resolver::new(&store);
    let resolved = resolver
        .resolve_prop(&instance("card_2"), &prop("p_color"))
        .unwrap();
    assert_eq!(resolved.value, Resolved::DataModel(users));
}

#[test]
fn dangling_prop_value_override_is_reported() {
    let mut store = sample();
    if let Some(card) = store.instances.get_mut(&instance("card_2")) {
        card.overrides.props.insert(
            prop("p_size"),
            OverrideValue::prop_value(common::prop_value("pv_gone")),
        );
    }
    let resolver = Resolver::new(&store);
    let error = resolver
        .resolve_prop(&instance("card_2"), &prop("p_size"))
        .unwrap_err();
    assert_eq!(
        error,
        ResolveError::DanglingReference {
            target: EntityRef::new(EntityKind::PropValue, "pv_gone")
        }
    );
}

// ============================================================================
// Properties and bindings
// ============================================================================

#[test]
fn broken_binding_does_not_block_sibling_properties() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let context = resolver
        .context_for(&NodeRef::Element(element("header")))
        .unwrap();
    let node = resolver.resolve_node(&context, &ActiveModes::new()).unwrap();

    assert_eq!(
        node.get("color"),
        Some(&PropertyState::Broken(ResolveError::DanglingReference {
            target: EntityRef::new(EntityKind::Token, "missing-token"),
        }))
    );
    let width = node.get("width").and_then(PropertyState::value).unwrap();
    assert_eq!(width.value, Resolved::Value(json!(320)));
    assert_eq!(
        width.source,
        ValueSource::Inline {
            section: Section::Style
        }
    );
    assert_eq!(node.broken_count(), 1);
}

#[test]
fn unresolved_token_surfaces_on_the_property() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let context = resolver
        .context_for(&NodeRef::Element(element("title")))
        .unwrap();
    let node = resolver.resolve_node(&context, &dark()).unwrap();

    assert_eq!(value_of(node.get("color")), Some(json!("#eee")));
    assert_eq!(
        node.get("gap").map(PropertyState::status),
        Some(ResolutionStatus::UnresolvedToken)
    );
    assert_eq!(
        node.get("text").map(PropertyState::status),
        Some(ResolutionStatus::Unbound)
    );
}

#[test]
fn variable_from_another_screen_is_out_of_scope() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let greeting = resolver
        .context_for(&NodeRef::Element(element("greeting")))
        .unwrap();
    let error = resolver
        .resolve_property(&greeting, "text", &ActiveModes::new())
        .unwrap_err();
    assert_eq!(error.status(), ResolutionStatus::OutOfScope);

    let subtitle = resolver
        .context_for(&NodeRef::Element(element("subtitle")))
        .unwrap();
    let resolved = resolver
        .resolve_property(&subtitle, "text", &ActiveModes::new())
        .unwrap();
    assert_eq!(resolved.value, Resolved::Value(json!("Settings")));
    assert_eq!(
        resolved.source,
        ValueSource::DataVariable {
            variable: variable("v_title")
        }
    );
}

#[test]
fn unset_property_is_not_an_error() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let context = resolver
        .context_for(&NodeRef::Element(element("header")))
        .unwrap();
    let resolved = resolver
        .resolve_property(&context, "opacity", &ActiveModes::new())
        .unwrap();
    assert_eq!(resolved.value, Resolved::Unset);
}

#[test]
fn component_elements_resolve_against_their_instance() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let root = Root::Screen(screen("home"));
    let none = ActiveModes::new();

    let card_roots: Vec<_> = resolver
        .materialize(&root)
        .filter(|node| node.entity.node_ref() == NodeRef::Element(element("card_root")))
        .map(|node| node.context())
        .collect();
    assert_eq!(card_roots.len(), 2);

    for context in &card_roots {
        let node = resolver.resolve_node(context, &dark()).unwrap();
        let (background, padding) = match context.instance_context.as_ref().map(InstanceId::as_str) {
            Some("card_1") => (json!("blue"), json!(8)),
            Some("card_2") => (json!("red"), json!(16)),
            other => panic!("unexpected instance context {other:?}"),
        };
        assert_eq!(value_of(node.get("background")), Some(background));
        assert_eq!(value_of(node.get("padding")), Some(padding));
        assert_eq!(value_of(node.get("shadow")), Some(json!("0 2px 4px")));
    }

    let label = resolver
        .materialize(&root)
        .find(|node| {
            node.entity.node_ref() == NodeRef::Element(element("card_label"))
                && node.instance_context == Some(&instance("card_1"))
        })
        .map(|node| node.context())
        .unwrap();
    let node = resolver.resolve_node(&label, &none).unwrap();
    assert_eq!(value_of(node.get("size")), Some(json!("lg")));
    assert_eq!(value_of(node.get("count")), Some(json!("3")));
}

#[test]
fn instance_style_override_applies_to_the_instance_node() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let context = resolver
        .context_for(&NodeRef::Instance(instance("card_2")))
        .unwrap();
    let resolved = resolver
        .resolve_property(&context, "padding", &ActiveModes::new())
        .unwrap();
    assert_eq!(resolved.value, Resolved::Value(json!(16)));
    assert_eq!(
        resolved.source,
        ValueSource::InstanceStyle {
            instance: instance("card_2")
        }
    );
}

#[test]
fn instance_style_override_wins_over_the_definition_binding() {
    let mut store = sample();
    if let Some(card_1) = store.instances.get_mut(&instance("card_1")) {
        card_1
            .overrides
            .style
            .insert("background".to_string(), json!("green"));
    }
    let resolver = Resolver::new(&store);
    let context = resolver
        .context_within(&NodeRef::Element(element("card_root")), &instance("card_1"))
        .unwrap();
    let resolved = resolver
        .resolve_property(&context, "background", &ActiveModes::new())
        .unwrap();
    assert_eq!(resolved.value, Resolved::Value(json!("green")));
    assert_eq!(
        resolved.source,
        ValueSource::InstanceStyle {
            instance: instance("card_1")
        }
    );

    // card_2 has no override for background; the prop binding still applies.
    let context = resolver
        .context_within(&NodeRef::Element(element("card_root")), &instance("card_2"))
        .unwrap();
    let resolved = resolver
        .resolve_property(&context, "background", &ActiveModes::new())
        .unwrap();
    assert_eq!(resolved.value, Resolved::Value(json!("red")));
}

#[test]
fn nested_instance_props_resolve_against_the_inner_instance() {
    let mut store = sample();
    with_nested_badge(&mut store);
    let resolver = Resolver::new(&store);
    let root = Root::Screen(screen("home"));

    let badges: Vec<_> = resolver
        .materialize(&root)
        .filter(|node| node.entity.node_ref() == NodeRef::Element(element("badge_root")))
        .map(|node| node.context())
        .collect();
    assert_eq!(badges.len(), 2);
    for context in &badges {
        assert_eq!(context.instance_context, Some(instance("badge_1")));
        assert_eq!(context.root, root);
        let resolved = resolver
            .resolve_property(context, "tone", &ActiveModes::new())
            .unwrap();
        assert_eq!(resolved.value, Resolved::Value(json!("gold")));
        assert_eq!(
            resolved.source,
            ValueSource::OverrideLiteral {
                instance: instance("badge_1")
            }
        );
    }

    // A card prop is not visible from inside the badge.
    if let Some(badge_root) = store.elements.get_mut(&element("badge_root")) {
        badge_root
            .bindings
            .insert("fill".to_string(), Binding::Prop { id: prop("p_color") });
    }
    let resolver = Resolver::new(&store);
    let context = resolver
        .context_within(&NodeRef::Element(element("badge_root")), &instance("badge_1"))
        .unwrap();
    assert_eq!(context.root, Root::Component(component("card")));
    let error = resolver
        .resolve_property(&context, "fill", &ActiveModes::new())
        .unwrap_err();
    assert_eq!(error.status(), ResolutionStatus::OutOfScope);
}

#[test]
fn context_within_uses_the_placement_root() {
    let mut store = sample();
    if let Some(label) = store.elements.get_mut(&element("card_label")) {
        label
            .bindings
            .insert("user".to_string(), Binding::DataVariable { id: variable("v_user") });
    }
    let resolver = Resolver::new(&store);

    let context = resolver
        .context_within(&NodeRef::Element(element("card_label")), &instance("card_1"))
        .unwrap();
    assert_eq!(context.root, Root::Screen(screen("home")));
    assert_eq!(context.instance_context, Some(instance("card_1")));
    let resolved = resolver
        .resolve_property(&context, "user", &ActiveModes::new())
        .unwrap();
    assert_eq!(resolved.value, Resolved::Value(json!("Ada")));

    // Editing the component directly cannot see the screen's variables.
    let definition = resolver
        .context_for(&NodeRef::Element(element("card_label")))
        .unwrap();
    let error = resolver
        .resolve_property(&definition, "user", &ActiveModes::new())
        .unwrap_err();
    assert_eq!(error.status(), ResolutionStatus::OutOfScope);
}

#[test]
fn context_within_rejects_nodes_outside_the_instance() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let error = resolver
        .context_within(&NodeRef::Element(element("header")), &instance("card_1"))
        .unwrap_err();
    assert_eq!(error.status(), ResolutionStatus::OutOfScope);

    let error = resolver
        .context_within(&NodeRef::Element(element("card_root")), &instance("card_9"))
        .unwrap_err();
    assert_eq!(error.status(), ResolutionStatus::DanglingReference);
}

#[test]
fn editing_a_component_uses_its_prop_defaults() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let context = resolver
        .context_for(&NodeRef::Element(element("card_root")))
        .unwrap();
    assert_eq!(context.root, Root::Component(component("card")));
    assert!(context.instance_context.is_none());

    let resolved = resolver
        .resolve_property(&context, "background", &ActiveModes::new())
        .unwrap();
    assert_eq!(resolved.value, Resolved::Value(json!("red")));
}

#[test]
fn prop_binding_outside_its_component_is_out_of_scope() {
    let mut store = sample();
    if let Some(header) = store.elements.get_mut(&element("header")) {
        header
            .bindings
            .insert("fill".to_string(), Binding::Prop { id: prop("p_color") });
    }
    let resolver = Resolver::new(&store);
    let context = NodeContext::new(
        NodeRef::Element(element("header")),
        Root::Screen(screen("home")),
    );
    let error = resolver
        .resolve_property(&context, "fill", &ActiveModes::new())
        .unwrap_err();
    assert_eq!(error.status(), ResolutionStatus::OutOfScope);
}

#[test]
fn data_model_field_binding_is_a_placeholder() {
    let mut store = sample();
    let users = DataModelId::new("m_users").unwrap();
    if let Some(title) = store.elements.get_mut(&element("title")) {
        title.bindings.insert(
            "text".to_string(),
            Binding::DataModelField {
                model_id: users.clone(),
                field_id: FieldId::new("f_name").unwrap(),
            },
        );
        title.bindings.insert(
            "alt".to_string(),
            Binding::DataModelField {
                model_id: users.clone(),
                field_id: FieldId::new("f_gone").unwrap(),
            },
        );
    }
    let resolver = Resolver::new(&store);
    let context = resolver
        .context_for(&NodeRef::Element(element("title")))
        .unwrap();
    let node = resolver.resolve_node(&context, &ActiveModes::new()).unwrap();

    assert_eq!(
        node.get("text").and_then(PropertyState::value).map(|v| &v.value),
        Some(&Resolved::DataModelField {
            model_id: users,
            field_id: FieldId::new("f_name").unwrap(),
        })
    );
    assert_eq!(
        node.get("alt").map(PropertyState::status),
        Some(ResolutionStatus::DanglingReference)
    );
}

#[test]
fn context_for_unknown_node_is_dangling() {
    let store = sample();
    let resolver = Resolver::new(&store);
    let error = resolver
        .context_for(&NodeRef::Element(element("nope")))
        .unwrap_err();
    assert_eq!(error.status(), ResolutionStatus::DanglingReference);
}
