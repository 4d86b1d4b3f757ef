//! Bindings and instance overrides.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{DataModelId, FieldId, PresetId, PropId, PropValueId, TokenId, VariableId};

/// A literal scalar or structured value as it appears in a document.
pub type Value = serde_json::Value;

/// Declares that a property's effective value comes from somewhere other
/// than its inline literal. Stored on an Element or Instance under the
/// property name it binds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Binding {
    DataVariable {
        id: VariableId,
    },
    Prop {
        id: PropId,
    },
    Token {
        id: TokenId,
    },
    Preset {
        id: PresetId,
    },
    #[serde(rename_all = "camelCase")]
    DataModelField {
        model_id: DataModelId,
        field_id: FieldId,
    },
}

impl Binding {
    pub fn kind(&self) -> BindingKind {
        match self {
            Binding::DataVariable { .. } => BindingKind::DataVariable,
            Binding::Prop { .. } => BindingKind::Prop,
            Binding::Token { .. } => BindingKind::Token,
            Binding::Preset { .. } => BindingKind::Preset,
            Binding::DataModelField { .. } => BindingKind::DataModelField,
        }
    }

    /// The id the binding points at (the field id for data-model fields).
    pub fn target_id(&self) -> &str {
        match self {
            Binding::DataVariable { id } => id.as_str(),
            Binding::Prop { id } => id.as_str(),
            Binding::Token { id } => id.as_str(),
            Binding::Preset { id } => id.as_str(),
            Binding::DataModelField { field_id, .. } => field_id.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BindingKind {
    DataVariable,
    Prop,
    Token,
    Preset,
    DataModelField,
}

impl BindingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingKind::DataVariable => "DATA_VARIABLE",
            BindingKind::Prop => "PROP",
            BindingKind::Token => "TOKEN",
            BindingKind::Preset => "PRESET",
            BindingKind::DataModelField => "DATA_MODEL_FIELD",
        }
    }
}

impl fmt::Display for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-state override on an Instance prop.
///
/// A JSON object carrying a recognised `refKind` is a reference; anything
/// else is kept as a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideValue {
    Reference(OverrideRef),
    Literal(Value),
}

impl OverrideValue {
    pub fn literal(value: impl Into<Value>) -> Self {
        OverrideValue::Literal(value.into())
    }

    pub fn prop_value(id: PropValueId) -> Self {
        OverrideValue::Reference(OverrideRef::PropValue { id })
    }

    pub fn data_model(id: DataModelId) -> Self {
        OverrideValue::Reference(OverrideRef::DataModel { id })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "refKind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideRef {
    PropValue { id: PropValueId },
    DataModel { id: DataModelId },
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn binding_wire_shape() {
        let binding: Binding = serde_json::from_value(json!({
            "kind": "DATA_MODEL_FIELD",
            "modelId": "m1",
            "fieldId": "f1"
        }))
        .unwrap();
        assert_eq!(binding.kind(), BindingKind::DataModelField);
        assert_eq!(binding.target_id(), "f1");

        let token: Binding = serde_json::from_value(json!({ "kind": "TOKEN", "id": "t1" })).unwrap();
        assert_eq!(
            token,
            Binding::Token {
                id: TokenId::new("t1").unwrap()
            }
        );
    }

    #[test]
    fn override_distinguishes_references_from_literals() {
        let reference: OverrideValue =
            serde_json::from_value(json!({ "refKind": "PROP_VALUE", "id": "pv1" })).unwrap();
        assert_eq!(
            reference,
            OverrideValue::prop_value(PropValueId::new("pv1").unwrap())
        );

        let literal: OverrideValue = serde_json::from_value(json!("blue")).unwrap();
        assert_eq!(literal, OverrideValue::literal("blue"));

        let structured: OverrideValue =
            serde_json::from_value(json!({ "modelId": "m1" })).unwrap();
        assert!(matches!(structured, OverrideValue::Literal(_)));
    }
}
