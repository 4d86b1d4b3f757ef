//! The normalized entity snapshot.
//!
//! An [`EntityStore`] is plain data: one [`Table`] per entity kind and no
//! resolution logic. Resolvers borrow it immutably; writes go through the
//! edit boundary in `uib-core`, which produces a new snapshot.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::component::{Component, Instance, Prop, PropValue};
use crate::data::{DataModel, Variable};
use crate::element::{Element, Screen};
use crate::error::{ModelError, Result};
use crate::owner::{NodeRef, Owner};
use crate::table::Table;
use crate::token::{Mode, ModeGroup, Preset, PresetModeValue, Token, TokenValue};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStore {
    #[serde(default)]
    pub screens: Table<Screen>,
    #[serde(default)]
    pub elements: Table<Element>,
    #[serde(default)]
    pub components: Table<Component>,
    #[serde(default)]
    pub instances: Table<Instance>,
    #[serde(default)]
    pub props: Table<Prop>,
    #[serde(default)]
    pub prop_values: Table<PropValue>,
    #[serde(default)]
    pub variables: Table<Variable>,
    #[serde(default)]
    pub tokens: Table<Token>,
    #[serde(default)]
    pub mode_groups: Table<ModeGroup>,
    #[serde(default)]
    pub modes: Table<Mode>,
    #[serde(default)]
    pub token_values: Table<TokenValue>,
    #[serde(default)]
    pub presets: Table<Preset>,
    #[serde(default)]
    pub preset_mode_values: Table<PresetModeValue>,
    #[serde(default)]
    pub data_models: Table<DataModel>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a JSON document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| ModelError::io(path, source))?;
        Self::from_json_str(&text)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.to_json_string_pretty()?;
        fs::write(path, text).map_err(|source| ModelError::io(path, source))
    }

    /// The ownership pointer of a tree node, if the node exists.
    pub fn owner_of(&self, node: &NodeRef) -> Option<&Owner> {
        match node {
            NodeRef::Element(id) => self.elements.get(id).map(|element| &element.ownership),
            NodeRef::Instance(id) => self.instances.get(id).map(|instance| &instance.ownership),
        }
    }

    pub fn contains_node(&self, node: &NodeRef) -> bool {
        match node {
            NodeRef::Element(id) => self.elements.contains(id),
            NodeRef::Instance(id) => self.instances.contains(id),
        }
    }

    /// Whether the owner a pointer names is present.
    pub fn contains_owner(&self, owner: &Owner) -> bool {
        match owner {
            Owner::Screen(id) => self.screens.contains(id),
            Owner::Component(id) => self.components.contains(id),
            Owner::Element(id) => self.elements.contains(id),
        }
    }

    /// Total count of entities that carry an ownership pointer.
    pub fn owned_len(&self) -> usize {
        self.elements.len() + self.instances.len()
    }
}
