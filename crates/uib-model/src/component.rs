use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::binding::{Binding, OverrideValue, Value};
use crate::ids::{ComponentId, InstanceId, PropId, PropValueId};
use crate::owner::Owner;
use crate::table::Record;

/// Root of a reusable subtree. Its definition elements are owned by
/// `Owner::Component(id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: ComponentId,
    #[serde(default)]
    pub name: String,
    /// Ordered prop ids.
    #[serde(default)]
    pub props: Vec<PropId>,
}

impl Record for Component {
    type Id = ComponentId;
    const TABLE: &'static str = "components";

    fn id(&self) -> &ComponentId {
        &self.id
    }
}

/// A placed, overridable copy of a Component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub id: InstanceId,
    pub component_id: ComponentId,
    pub ownership: Owner,
    #[serde(rename = "override", default)]
    pub overrides: InstanceOverride,
    #[serde(default)]
    pub bindings: BTreeMap<String, Binding>,
}

impl Instance {
    pub fn new(id: InstanceId, component_id: ComponentId, ownership: Owner) -> Self {
        Self {
            id,
            component_id,
            ownership,
            overrides: InstanceOverride::default(),
            bindings: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_override(mut self, prop: PropId, value: OverrideValue) -> Self {
        self.overrides.props.insert(prop, value);
        self
    }
}

impl Record for Instance {
    type Id = InstanceId;
    const TABLE: &'static str = "instances";

    fn id(&self) -> &InstanceId {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceOverride {
    #[serde(default)]
    pub props: BTreeMap<PropId, OverrideValue>,
    #[serde(default)]
    pub style: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prop {
    pub id: PropId,
    pub component_id: ComponentId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Used verbatim when no PropValue is flagged default. May be structured,
    /// e.g. `{"modelId": ..}` for data-typed props.
    #[serde(default)]
    pub default_value: Value,
    /// Ordered PropValue ids.
    #[serde(default)]
    pub values: Vec<PropValueId>,
}

impl Prop {
    pub fn new(
        id: PropId,
        component_id: ComponentId,
        value_type: ValueType,
        default_value: impl Into<Value>,
    ) -> Self {
        Self {
            id,
            component_id,
            name: String::new(),
            value_type,
            default_value: default_value.into(),
            values: Vec::new(),
        }
    }
}

impl Record for Prop {
    type Id = PropId;
    const TABLE: &'static str = "props";

    fn id(&self) -> &PropId {
        &self.id
    }
}

/// One enumerated choice of a Prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropValue {
    pub id: PropValueId,
    pub prop_id: PropId,
    #[serde(default)]
    pub name: String,
    pub value: Value,
    #[serde(default)]
    pub is_default: bool,
}

impl Record for PropValue {
    type Id = PropValueId;
    const TABLE: &'static str = "propValues";

    fn id(&self) -> &PropValueId {
        &self.id
    }
}

/// Declared value type of a prop, variable or token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Color,
    Size,
    Shadow,
    Enum,
    Image,
    DataModel,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "STRING",
            ValueType::Number => "NUMBER",
            ValueType::Boolean => "BOOLEAN",
            ValueType::Color => "COLOR",
            ValueType::Size => "SIZE",
            ValueType::Shadow => "SHADOW",
            ValueType::Enum => "ENUM",
            ValueType::Image => "IMAGE",
            ValueType::DataModel => "DATA_MODEL",
        }
    }
}
