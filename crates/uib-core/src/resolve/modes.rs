//! Token and preset resolution across mode groups.
//!
//! A token (or preset) belongs to one collection, which is a mode group.
//! Its value is the one keyed to the group's active mode, falling back to
//! the value keyed to the group's default mode.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use uib_model::{
    CollectionId, EntityKind, EntityRef, EntityStore, ModeGroup, ModeId, PresetId, TokenId, Value,
};

use crate::error::ResolveError;
use crate::resolve::{Resolved, ResolvedValue, ValueSource};

/// The active mode per mode group. Groups left out use their default mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveModes(BTreeMap<CollectionId, ModeId>);

impl ActiveModes {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, group: CollectionId, mode: ModeId) -> Self {
        self.0.insert(group, mode);
        self
    }

    pub fn insert(&mut self, group: CollectionId, mode: ModeId) -> Option<ModeId> {
        self.0.insert(group, mode)
    }

    pub fn get(&self, group: &CollectionId) -> Option<&ModeId> {
        self.0.get(group)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CollectionId, &ModeId)> + '_ {
        self.0.iter()
    }

    /// Entries from `other` win.
    pub fn merge(&mut self, other: &ActiveModes) {
        for (group, mode) in &other.0 {
            self.0.insert(group.clone(), mode.clone());
        }
    }
}

impl FromIterator<(CollectionId, ModeId)> for ActiveModes {
    fn from_iter<I: IntoIterator<Item = (CollectionId, ModeId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One `group=mode` assignment, as written on a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeAssignment {
    pub group: CollectionId,
    pub mode: ModeId,
}

impl FromStr for ModeAssignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (group, mode) = s
            .split_once('=')
            .ok_or_else(|| format!("expected GROUP=MODE, got {s:?}"))?;
        Ok(Self {
            group: CollectionId::new(group).map_err(|error| error.to_string())?,
            mode: ModeId::new(mode).map_err(|error| error.to_string())?,
        })
    }
}

impl fmt::Display for ModeAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.group, self.mode)
    }
}

type ByMode<'a> = HashMap<&'a ModeId, &'a Value>;

/// `(owner, mode) -> value` lookups for token values and preset mode values.
#[derive(Debug, Clone, Default)]
pub struct ModeValueIndex<'a> {
    tokens: HashMap<&'a TokenId, ByMode<'a>>,
    presets: HashMap<&'a PresetId, ByMode<'a>>,
}

impl<'a> ModeValueIndex<'a> {
    pub fn build(store: &'a EntityStore) -> Self {
        let mut tokens: HashMap<&TokenId, ByMode<'a>> = HashMap::new();
        for value in store.token_values.iter() {
            tokens
                .entry(&value.token_id)
                .or_default()
                .entry(&value.variable_mode_id)
                .or_insert(&value.value);
        }
        let mut presets: HashMap<&PresetId, ByMode<'a>> = HashMap::new();
        for value in store.preset_mode_values.iter() {
            presets
                .entry(&value.preset_id)
                .or_default()
                .entry(&value.variable_mode_id)
                .or_insert(&value.value);
        }
        Self { tokens, presets }
    }
}

struct ModeHit<'v> {
    value: &'v Value,
    mode: ModeId,
    fallback: bool,
}

/// Mode match, then default-mode fallback. Shared by tokens and presets.
fn pick_mode_value<'v>(
    store: &EntityStore,
    group: &ModeGroup,
    active: &ActiveModes,
    values: Option<&ByMode<'v>>,
    target: &EntityRef,
) -> Result<ModeHit<'v>, ResolveError> {
    let requested = active
        .get(&group.id)
        .filter(|mode| {
            let in_group = store
                .modes
                .get(mode)
                .is_some_and(|record| record.mode_group_id == group.id);
            if !in_group {
                debug!(group = %group.id, mode = %mode, "active mode is not in group; using default");
            }
            in_group
        })
        .unwrap_or(&group.default_mode_id);

    let lookup = |mode: &ModeId| values.and_then(|by_mode| by_mode.get(mode).copied());

    if let Some(value) = lookup(requested) {
        return Ok(ModeHit {
            value,
            mode: requested.clone(),
            fallback: false,
        });
    }
    if let Some(value) = lookup(&group.default_mode_id) {
        debug!(%target, mode = %requested, "falling back to default mode");
        return Ok(ModeHit {
            value,
            mode: group.default_mode_id.clone(),
            fallback: true,
        });
    }
    Err(ResolveError::UnresolvedToken {
        target: target.clone(),
        mode: requested.clone(),
        default_mode: group.default_mode_id.clone(),
    })
}

fn group_of<'s>(
    store: &'s EntityStore,
    collection: &CollectionId,
) -> Result<&'s ModeGroup, ResolveError> {
    store
        .mode_groups
        .get(collection)
        .ok_or_else(|| ResolveError::dangling(EntityRef::new(EntityKind::ModeGroup, collection)))
}

/// Effective value of a token under `active` modes.
pub fn resolve_token(
    store: &EntityStore,
    index: &ModeValueIndex<'_>,
    token_id: &TokenId,
    active: &ActiveModes,
) -> Result<ResolvedValue, ResolveError> {
    let target = EntityRef::new(EntityKind::Token, token_id);
    let token = store
        .tokens
        .get(token_id)
        .ok_or_else(|| ResolveError::dangling(target.clone()))?;
    let group = group_of(store, &token.collection_id)?;
    let hit = pick_mode_value(store, group, active, index.tokens.get(token_id), &target)?;
    Ok(ResolvedValue {
        value: Resolved::Value(hit.value.clone()),
        source: ValueSource::Token {
            token: token_id.clone(),
            mode: hit.mode,
            fallback: hit.fallback,
        },
    })
}

/// Effective value of a preset under `active` modes.
pub fn resolve_preset(
    store: &EntityStore,
    index: &ModeValueIndex<'_>,
    preset_id: &PresetId,
    active: &ActiveModes,
) -> Result<ResolvedValue, ResolveError> {
    let target = EntityRef::new(EntityKind::Preset, preset_id);
    let preset = store
        .presets
        .get(preset_id)
        .ok_or_else(|| ResolveError::dangling(target.clone()))?;
    let group = group_of(store, &preset.collection_id)?;
    let hit = pick_mode_value(store, group, active, index.presets.get(preset_id), &target)?;
    Ok(ResolvedValue {
        value: Resolved::Value(hit.value.clone()),
        source: ValueSource::Preset {
            preset: preset_id.clone(),
            mode: hit.mode,
            fallback: hit.fallback,
        },
    })
}
