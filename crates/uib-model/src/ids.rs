#![deny(unsafe_code)]

//! Opaque string identifiers, one newtype per entity kind.
//!
//! Ids are never interpreted; the newtypes only keep a `PropId` from being
//! passed where a `TokenId` is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ModelError::InvalidId {
                        kind: $kind,
                        value,
                    });
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ModelError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(ScreenId, "screen");
string_id!(ElementId, "element");
string_id!(ComponentId, "component");
string_id!(InstanceId, "instance");
string_id!(PropId, "prop");
string_id!(PropValueId, "prop value");
string_id!(VariableId, "variable");
string_id!(TokenId, "token");
string_id!(
    /// A VariableModeGroup id. Tokens and presets name their group as their
    /// collection.
    CollectionId,
    "collection"
);
string_id!(ModeId, "mode");
string_id!(TokenValueId, "token value");
string_id!(PresetId, "preset");
string_id!(PresetModeValueId, "preset mode value");
string_id!(DataModelId, "data model");
string_id!(FieldId, "field");
