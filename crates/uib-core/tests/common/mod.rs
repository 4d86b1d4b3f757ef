//! Shared fixture: two screens, a `card` component with props, a themed
//! token set and a few deliberately broken references.

#![allow(dead_code)]

use serde_json::json;
use uib_model::{
    Binding, CollectionId, Component, ComponentId, DataModel, DataModelField, DataModelId,
    Element, ElementId, EntityStore, FieldId, Instance, InstanceId, Mode, ModeGroup, ModeId,
    OverrideValue, Owner, Preset, PresetId, PresetModeValue, PresetModeValueId, Prop, PropId,
    PropValue, PropValueId, Scope, Screen, ScreenId, Token, TokenId, TokenValue, TokenValueId,
    ValueType, Variable, VariableId,
};

pub fn screen(id: &str) -> ScreenId {
    ScreenId::new(id).unwrap()
}

pub fn element(id: &str) -> ElementId {
    ElementId::new(id).unwrap()
}

pub fn instance(id: &str) -> InstanceId {
    InstanceId::new(id).unwrap()
}

pub fn component(id: &str) -> ComponentId {
    ComponentId::new(id).unwrap()
}

pub fn prop(id: &str) -> PropId {
    PropId::new(id).unwrap()
}

pub fn prop_value(id: &str) -> PropValueId {
    PropValueId::new(id).unwrap()
}

pub fn token(id: &str) -> TokenId {
    TokenId::new(id).unwrap()
}

pub fn mode(id: &str) -> ModeId {
    ModeId::new(id).unwrap()
}

pub fn group(id: &str) -> CollectionId {
    CollectionId::new(id).unwrap()
}

pub fn variable(id: &str) -> VariableId {
    VariableId::new(id).unwrap()
}

fn add_group(store: &mut EntityStore, id: &str, modes: &[&str]) {
    store.mode_groups.insert(ModeGroup {
        id: group(id),
        name: id.to_string(),
        group_type: String::new(),
        mode_ids: modes.iter().map(|m| mode(m)).collect(),
        default_mode_id: mode(modes[0]),
    });
    for (position, id_str) in modes.iter().enumerate() {
        store.modes.insert(Mode {
            id: mode(id_str),
            mode_group_id: group(id),
            name: id_str.to_string(),
            is_default: position == 0,
        });
    }
}

fn add_token(store: &mut EntityStore, id: &str, group_id: &str, values: &[(&str, &str)]) {
    store.tokens.insert(Token {
        id: token(id),
        collection_id: group(group_id),
        name: id.to_string(),
        value_type: ValueType::Color,
    });
    for (mode_id, value) in values {
        store.token_values.insert(TokenValue {
            id: TokenValueId::new(format!("{id}@{mode_id}")).unwrap(),
            token_id: token(id),
            variable_mode_id: mode(mode_id),
            value: json!(value),
        });
    }
}

fn add_variable(store: &mut EntityStore, id: &str, scope: Scope, value: &str) {
    store.variables.insert(Variable {
        id: variable(id),
        name: id.to_string(),
        value_type: ValueType::String,
        value: json!(value),
        ownership: scope,
    });
}

/// The fixture described in the module docs.
pub fn sample() -> EntityStore {
    let mut store = EntityStore::new();
    for id in ["home", "settings"] {
        store.screens.insert(Screen {
            id: screen(id),
            name: id.to_string(),
        });
    }

    add_group(&mut store, "theme", &["light", "dark"]);
    add_group(&mut store, "density", &["compact", "comfy"]);
    add_token(&mut store, "t_bg", "theme", &[("light", "#fff")]);
    add_token(&mut store, "t_text", "theme", &[("light", "#000"), ("dark", "#eee")]);
    add_token(&mut store, "t_gap", "density", &[("comfy", "12px")]);

    store.presets.insert(Preset {
        id: PresetId::new("sh_card").unwrap(),
        collection_id: group("theme"),
        name: "Card shadow".to_string(),
    });
    for (mode_id, value) in [("light", "0 1px 2px"), ("dark", "0 2px 4px")] {
        store.preset_mode_values.insert(PresetModeValue {
            id: PresetModeValueId::new(format!("sh_card@{mode_id}")).unwrap(),
            preset_id: PresetId::new("sh_card").unwrap(),
            variable_mode_id: mode(mode_id),
            value: json!(value),
        });
    }

    // card component: root box with a label inside.
    store.components.insert(Component {
        id: component("card"),
        name: "Card".to_string(),
        props: vec![prop("p_color"), prop("p_size")],
    });
    store.props.insert(Prop::new(
        prop("p_color"),
        component("card"),
        ValueType::Color,
        "red",
    ));
    let mut size = Prop::new(prop("p_size"), component("card"), ValueType::Enum, "md");
    size.values = vec![prop_value("pv_sm"), prop_value("pv_lg")];
    store.props.insert(size);
    for (id, value, is_default) in [("pv_sm", "sm", false), ("pv_lg", "lg", true)] {
        store.prop_values.insert(PropValue {
            id: prop_value(id),
            prop_id: prop("p_size"),
            name: value.to_string(),
            value: json!(value),
            is_default,
        });
    }
    store.elements.insert(
        Element::new(element("card_root"), Owner::Component(component("card")), "box")
            .with_style("padding", 8)
            .with_binding("background", Binding::Prop { id: prop("p_color") })
            .with_binding(
                "shadow",
                Binding::Preset {
                    id: PresetId::new("sh_card").unwrap(),
                },
            ),
    );
    store.elements.insert(
        Element::new(element("card_label"), Owner::Element(element("card_root")), "text")
            .with_content("text", "Label")
            .with_binding("size", Binding::Prop { id: prop("p_size") })
            .with_binding("count", Binding::DataVariable { id: variable("v_count") }),
    );
    add_variable(&mut store, "v_count", Scope::Component(component("card")), "3");

    // home screen
    store.elements.insert(
        Element::new(element("header"), Owner::Screen(screen("home")), "box")
            .with_style("width", 320)
            .with_binding("color", Binding::Token { id: token("missing-token") }),
    );
    store.elements.insert(
        Element::new(element("title"), Owner::Element(element("header")), "text")
            .with_content("text", "Hi")
            .with_binding("color", Binding::Token { id: token("t_text") })
            .with_binding("gap", Binding::Token { id: token("t_gap") }),
    );
    store.instances.insert(
        Instance::new(instance("card_1"), component("card"), Owner::Screen(screen("home")))
            .with_override(prop("p_color"), OverrideValue::literal("blue")),
    );
    let mut card_2 = Instance::new(
        instance("card_2"),
        component("card"),
        Owner::Element(element("header")),
    );
    card_2.overrides.style.insert("padding".to_string(), json!(16));
    store.instances.insert(card_2);
    add_variable(&mut store, "v_user", Scope::Screen(screen("home")), "Ada");

    // settings screen
    store.elements.insert(
        Element::new(element("greeting"), Owner::Screen(screen("settings")), "text")
            .with_binding("text", Binding::DataVariable { id: variable("v_user") }),
    );
    store.elements.insert(
        Element::new(element("subtitle"), Owner::Screen(screen("settings")), "text")
            .with_binding("text", Binding::DataVariable { id: variable("v_title") }),
    );
    add_variable(&mut store, "v_title", Scope::Screen(screen("settings")), "Settings");

    store.data_models.insert(DataModel {
        id: DataModelId::new("m_users").unwrap(),
        name: "Users".to_string(),
        fields: vec![DataModelField {
            id: FieldId::new("f_name").unwrap(),
            name: "name".to_string(),
        }],
    });

    store
}

/// Adds a `badge` component and places `badge_1` inside the card's label,
/// so every card instance carries a nested instance of another component.
pub fn with_nested_badge(store: &mut EntityStore) {
    store.components.insert(Component {
        id: component("badge"),
        name: "Badge".to_string(),
        props: vec![prop("p_tone")],
    });
    store.props.insert(Prop::new(
        prop("p_tone"),
        component("badge"),
        ValueType::String,
        "grey",
    ));
    store.elements.insert(
        Element::new(element("badge_root"), Owner::Component(component("badge")), "text")
            .with_binding("tone", Binding::Prop { id: prop("p_tone") }),
    );
    store.instances.insert(
        Instance::new(
            instance("badge_1"),
            component("badge"),
            Owner::Element(element("card_label")),
        )
        .with_override(prop("p_tone"), OverrideValue::literal("gold")),
    );
}
