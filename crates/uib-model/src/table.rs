use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ModelError;

/// A record addressed by an opaque id.
pub trait Record: Clone {
    type Id: Clone + Eq + Hash + Ord + fmt::Debug + fmt::Display + Serialize + DeserializeOwned;

    /// Table name used in diagnostics and in the document format.
    const TABLE: &'static str;

    fn id(&self) -> &Self::Id;
}

/// A normalized table: records by id plus their ordering.
#[derive(Debug, Clone)]
pub struct Table<T: Record> {
    by_id: HashMap<T::Id, T>,
    all_ids: Vec<T::Id>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self {
            by_id: HashMap::new(),
            all_ids: Vec::new(),
        }
    }
}

impl<T: Record> Table<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a record. A replaced record keeps its position.
    pub fn insert(&mut self, record: T) -> Option<T> {
        let id = record.id().clone();
        let previous = self.by_id.insert(id.clone(), record);
        if previous.is_none() {
            self.all_ids.push(id);
        }
        previous
    }

    pub fn remove(&mut self, id: &T::Id) -> Option<T> {
        let removed = self.by_id.remove(id)?;
        self.all_ids.retain(|existing| existing != id);
        Some(removed)
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.by_id.get(id)
    }

    pub fn get_mut(&mut self, id: &T::Id) -> Option<&mut T> {
        self.by_id.get_mut(id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.all_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_ids.is_empty()
    }

    pub fn ids(&self) -> &[T::Id] {
        &self.all_ids
    }

    /// Iterates records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.all_ids.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Mutable access to every record, in no particular order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        self.by_id.values_mut()
    }

    /// Keeps only records matching `keep`, returning the removed ones in id order.
    pub fn drain_where(&mut self, mut keep: impl FnMut(&T) -> bool) -> Vec<T> {
        let mut removed = Vec::new();
        let by_id = &mut self.by_id;
        self.all_ids.retain(|id| {
            let Some(record) = by_id.get(id) else {
                return false;
            };
            if keep(record) {
                return true;
            }
            if let Some(record) = by_id.remove(id) {
                removed.push(record);
            }
            false
        });
        removed
    }

    fn from_parts(by_id: HashMap<T::Id, T>, all_ids: Vec<T::Id>) -> Result<Self, ModelError> {
        let mut seen = HashSet::with_capacity(all_ids.len());
        for id in &all_ids {
            if !seen.insert(id) {
                return Err(ModelError::DuplicateId {
                    table: T::TABLE,
                    id: id.to_string(),
                });
            }
            if !by_id.contains_key(id) {
                return Err(ModelError::MissingRecord {
                    table: T::TABLE,
                    id: id.to_string(),
                });
            }
        }
        for (key, record) in &by_id {
            if record.id() != key {
                return Err(ModelError::KeyMismatch {
                    table: T::TABLE,
                    key: key.to_string(),
                    id: record.id().to_string(),
                });
            }
            if !seen.contains(key) {
                return Err(ModelError::UnlistedRecord {
                    table: T::TABLE,
                    id: key.to_string(),
                });
            }
        }
        Ok(Self { by_id, all_ids })
    }
}

impl<T: Record> FromIterator<T> for Table<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Table::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TableRef<'a, T: Record> {
    by_id: BTreeMap<&'a T::Id, &'a T>,
    all_ids: &'a [T::Id],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct TableRepr<T: Record> {
    #[serde(default)]
    by_id: HashMap<T::Id, T>,
    #[serde(default)]
    all_ids: Vec<T::Id>,
}

impl<T: Record + Serialize> Serialize for Table<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TableRef::<T> {
            by_id: self.by_id.iter().collect(),
            all_ids: &self.all_ids,
        }
        .serialize(serializer)
    }
}

impl<'de, T: Record + DeserializeOwned> Deserialize<'de> for Table<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = TableRepr::<T>::deserialize(deserializer)?;
        Table::from_parts(repr.by_id, repr.all_ids).map_err(serde::de::Error::custom)
    }
}
