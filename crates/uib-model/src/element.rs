use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::binding::{Binding, Value};
use crate::ids::{ElementId, ScreenId};
use crate::owner::Owner;
use crate::table::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    pub id: ScreenId,
    #[serde(default)]
    pub name: String,
}

impl Record for Screen {
    type Id = ScreenId;
    const TABLE: &'static str = "screens";

    fn id(&self) -> &ScreenId {
        &self.id
    }
}

/// A concrete UI node (box, text, image...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    pub ownership: Owner,
    pub tag: String,
    #[serde(default)]
    pub properties: Properties,
    /// Property name -> binding.
    #[serde(default)]
    pub bindings: BTreeMap<String, Binding>,
}

impl Element {
    pub fn new(id: ElementId, ownership: Owner, tag: impl Into<String>) -> Self {
        Self {
            id,
            ownership,
            tag: tag.into(),
            properties: Properties::default(),
            bindings: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_style(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.style.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_content(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.content.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_binding(mut self, property: impl Into<String>, binding: Binding) -> Self {
        self.bindings.insert(property.into(), binding);
        self
    }
}

impl Record for Element {
    type Id = ElementId;
    const TABLE: &'static str = "elements";

    fn id(&self) -> &ElementId {
        &self.id
    }
}

/// Inline literal values, grouped by section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default)]
    pub style: BTreeMap<String, Value>,
    #[serde(default)]
    pub content: BTreeMap<String, Value>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Properties {
    pub fn section(&self, section: Section) -> &BTreeMap<String, Value> {
        match section {
            Section::Style => &self.style,
            Section::Content => &self.content,
            Section::Attributes => &self.attributes,
        }
    }

    pub fn section_mut(&mut self, section: Section) -> &mut BTreeMap<String, Value> {
        match section {
            Section::Style => &mut self.style,
            Section::Content => &mut self.content,
            Section::Attributes => &mut self.attributes,
        }
    }

    /// Finds the literal for `name`, searching style, then content, then
    /// attributes.
    pub fn lookup(&self, name: &str) -> Option<(Section, &Value)> {
        Section::ALL
            .iter()
            .find_map(|section| self.section(*section).get(name).map(|value| (*section, value)))
    }

    /// Every property name with a literal, deduplicated and sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        let mut names: Vec<&str> = Section::ALL
            .iter()
            .flat_map(|section| self.section(*section).keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Style,
    Content,
    Attributes,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Style, Section::Content, Section::Attributes];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Style => "style",
            Section::Content => "content",
            Section::Attributes => "attributes",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "style" => Ok(Section::Style),
            "content" => Ok(Section::Content),
            "attributes" | "attribute" => Ok(Section::Attributes),
            _ => Err(format!("Unknown property section: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn lookup_prefers_style() {
        let element = Element::new(
            ElementId::new("e1").unwrap(),
            Owner::Screen(ScreenId::new("s1").unwrap()),
            "text",
        )
        .with_style("color", "red")
        .with_content("color", "ignored")
        .with_content("text", "hello");

        let (section, value) = element.properties.lookup("color").unwrap();
        assert_eq!(section, Section::Style);
        assert_eq!(value, &json!("red"));
        assert_eq!(
            element.properties.names().collect::<Vec<_>>(),
            vec!["color", "text"]
        );
    }
}
