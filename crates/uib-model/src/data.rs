use serde::{Deserialize, Serialize};

use crate::binding::Value;
use crate::component::ValueType;
use crate::ids::{DataModelId, FieldId, VariableId};
use crate::owner::Scope;
use crate::table::Record;

/// A DataVariable, scoped to a screen or a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    pub id: VariableId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub value: Value,
    pub ownership: Scope,
}

impl Record for Variable {
    type Id = VariableId;
    const TABLE: &'static str = "variables";

    fn id(&self) -> &VariableId {
        &self.id
    }
}

/// Schema of an external record source. Only ids are checked here; field
/// values live with the data-model collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataModel {
    pub id: DataModelId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<DataModelField>,
}

impl DataModel {
    pub fn field(&self, id: &FieldId) -> Option<&DataModelField> {
        self.fields.iter().find(|field| &field.id == id)
    }
}

impl Record for DataModel {
    type Id = DataModelId;
    const TABLE: &'static str = "dataModels";

    fn id(&self) -> &DataModelId {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataModelField {
    pub id: FieldId,
    #[serde(default)]
    pub name: String,
}
