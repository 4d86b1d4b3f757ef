use std::fmt;

use serde::{Deserialize, Serialize};

/// Every entity kind the store holds, used to name references in errors and
/// reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Screen,
    Element,
    Component,
    Instance,
    Prop,
    PropValue,
    Variable,
    Token,
    ModeGroup,
    Mode,
    TokenValue,
    Preset,
    PresetModeValue,
    DataModel,
    DataModelField,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Screen => "screen",
            EntityKind::Element => "element",
            EntityKind::Component => "component",
            EntityKind::Instance => "instance",
            EntityKind::Prop => "prop",
            EntityKind::PropValue => "prop value",
            EntityKind::Variable => "variable",
            EntityKind::Token => "token",
            EntityKind::ModeGroup => "mode group",
            EntityKind::Mode => "mode",
            EntityKind::TokenValue => "token value",
            EntityKind::Preset => "preset",
            EntityKind::PresetModeValue => "preset mode value",
            EntityKind::DataModel => "data model",
            EntityKind::DataModelField => "data model field",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed pointer to any entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self {
            kind,
            id: id.to_string(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}
