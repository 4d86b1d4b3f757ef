//! Entity records for the UI builder data core.
//!
//! Everything here is data: screens, elements, components and their
//! instances, props, data variables, design tokens and modes. Hierarchy is
//! expressed through ownership pointers, and every record is addressed by an
//! opaque string id.

pub mod binding;
pub mod component;
pub mod data;
pub mod element;
pub mod error;
pub mod ids;
pub mod kind;
pub mod owner;
pub mod store;
pub mod table;
pub mod token;

pub use binding::{Binding, BindingKind, OverrideRef, OverrideValue, Value};
pub use component::{Component, Instance, InstanceOverride, Prop, PropValue, ValueType};
pub use data::{DataModel, DataModelField, Variable};
pub use element::{Element, Properties, Screen, Section};
pub use error::{ModelError, Result};
pub use ids::{
    CollectionId, ComponentId, DataModelId, ElementId, FieldId, InstanceId, ModeId, PresetId,
    PresetModeValueId, PropId, PropValueId, ScreenId, TokenId, TokenValueId, VariableId,
};
pub use kind::{EntityKind, EntityRef};
pub use owner::{NodeRef, Owner, OwnerKind, Root, Scope};
pub use store::EntityStore;
pub use table::{Record, Table};
pub use token::{Mode, ModeGroup, Preset, PresetModeValue, Token, TokenValue};
