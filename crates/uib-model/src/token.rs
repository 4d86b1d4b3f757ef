//! Design tokens, presets and the multi-axis mode system.

use serde::{Deserialize, Serialize};

use crate::binding::Value;
use crate::component::ValueType;
use crate::ids::{CollectionId, ModeId, PresetId, PresetModeValueId, TokenId, TokenValueId};
use crate::table::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: TokenId,
    pub collection_id: CollectionId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

impl Record for Token {
    type Id = TokenId;
    const TABLE: &'static str = "tokens";

    fn id(&self) -> &TokenId {
        &self.id
    }
}

/// One axis of variation, e.g. "Theme" or "Density". Also the collection
/// tokens and presets belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeGroup {
    pub id: CollectionId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub group_type: String,
    #[serde(default)]
    pub mode_ids: Vec<ModeId>,
    pub default_mode_id: ModeId,
}

impl Record for ModeGroup {
    type Id = CollectionId;
    const TABLE: &'static str = "modeGroups";

    fn id(&self) -> &CollectionId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mode {
    pub id: ModeId,
    pub mode_group_id: CollectionId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Record for Mode {
    type Id = ModeId;
    const TABLE: &'static str = "modes";

    fn id(&self) -> &ModeId {
        &self.id
    }
}

/// The (token, mode) -> value pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenValue {
    pub id: TokenValueId,
    pub token_id: TokenId,
    pub variable_mode_id: ModeId,
    pub value: Value,
}

impl Record for TokenValue {
    type Id = TokenValueId;
    const TABLE: &'static str = "tokenValues";

    fn id(&self) -> &TokenValueId {
        &self.id
    }
}

/// An enumerated preset (e.g. a shadow preset) varying over a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: PresetId,
    pub collection_id: CollectionId,
    #[serde(default)]
    pub name: String,
}

impl Record for Preset {
    type Id = PresetId;
    const TABLE: &'static str = "presets";

    fn id(&self) -> &PresetId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetModeValue {
    pub id: PresetModeValueId,
    pub preset_id: PresetId,
    pub variable_mode_id: ModeId,
    pub value: Value,
}

impl Record for PresetModeValue {
    type Id = PresetModeValueId;
    const TABLE: &'static str = "presetModeValues";

    fn id(&self) -> &PresetModeValueId {
        &self.id
    }
}
