//! Optional TOML settings file.
//!
//! ```toml
//! [modes]
//! theme = "dark"
//! density = "comfy"
//! ```
//!
//! `--mode GROUP=MODE` flags are applied on top of the file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use uib_core::{ActiveModes, ModeAssignment};
use uib_model::{CollectionId, ModeId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Mode group id -> active mode id.
    pub modes: BTreeMap<String, String>,
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("parse settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read settings file {}", path.display()))?;
        let settings = Self::from_toml_str(&contents)
            .with_context(|| format!("load settings file {}", path.display()))?;
        debug!(path = %path.display(), modes = settings.modes.len(), "loaded settings");
        Ok(settings)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    /// File modes first, then each `--mode` flag in order.
    pub fn active_modes(&self, overrides: &[ModeAssignment]) -> Result<ActiveModes> {
        let mut modes = ActiveModes::new();
        for (group, mode) in &self.modes {
            let group = CollectionId::new(group.as_str())
                .with_context(|| format!("mode group {group:?} in settings"))?;
            let mode = ModeId::new(mode.as_str())
                .with_context(|| format!("mode {mode:?} in settings"))?;
            modes.insert(group, mode);
        }
        for assignment in overrides {
            modes.insert(assignment.group.clone(), assignment.mode.clone());
        }
        Ok(modes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(value: &str) -> ModeAssignment {
        value.parse().unwrap()
    }

    #[test]
    fn flags_override_file_modes() {
        let settings = Settings::from_toml_str(
            r#"
            [modes]
            theme = "dark"
            density = "comfy"
            "#,
        )
        .unwrap();
        let modes = settings
            .active_modes(&[assignment("theme=light")])
            .unwrap();
        let pairs: Vec<_> = modes
            .iter()
            .map(|(group, mode)| format!("{group}={mode}"))
            .collect();
        assert_eq!(pairs, vec!["density=comfy", "theme=light"]);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Settings::from_toml_str("").unwrap(), Settings::default());
        assert!(Settings::load_optional(None).unwrap().modes.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_toml_str("[theme]\nmode = \"dark\"").is_err());
    }

    #[test]
    fn blank_mode_is_rejected() {
        let settings = Settings::from_toml_str("[modes]\ntheme = \" \"").unwrap();
        assert!(settings.active_modes(&[]).is_err());
    }
}
