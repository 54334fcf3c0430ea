use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "PanelConfig::default_acts_folder_label")]
    pub acts_folder_label: String,
    #[serde(default = "PanelConfig::default_entities_folder_label")]
    pub entities_folder_label: String,
    #[serde(default = "PanelConfig::default_invalid_entity_label")]
    pub invalid_entity_label: String,
    #[serde(default = "PanelConfig::default_invalid_stage_label")]
    pub invalid_stage_label: String,
    /// State given to an entity dropped onto an Act it is not yet part of.
    #[serde(default)]
    pub default_drop_state: i32,
    #[serde(default = "PanelConfig::default_expand_roots")]
    pub expand_roots_on_first_load: bool,
    /// Emit user notices for registrations, Act creation and drop assignments.
    #[serde(default = "PanelConfig::default_show_notices")]
    pub show_notices: bool,
    #[serde(default = "PanelConfig::default_drop_highlight_rgba")]
    pub drop_highlight_rgba: [u8; 4],
}

#[derive(Debug, Clone, Default)]
pub struct PanelConfigOverrides {
    pub acts_folder_label: Option<String>,
    pub entities_folder_label: Option<String>,
    pub default_drop_state: Option<i32>,
    pub expand_roots_on_first_load: Option<bool>,
}

impl PanelConfig {
    fn default_acts_folder_label() -> String {
        "Acts".to_string()
    }

    fn default_entities_folder_label() -> String {
        "Registered Entities".to_string()
    }

    fn default_invalid_entity_label() -> String {
        "Invalid Entity".to_string()
    }

    fn default_invalid_stage_label() -> String {
        "Invalid Stage".to_string()
    }

    const fn default_expand_roots() -> bool {
        true
    }

    const fn default_show_notices() -> bool {
        true
    }

    const fn default_drop_highlight_rgba() -> [u8; 4] {
        [0, 128, 255, 153]
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("[config] load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &PanelConfigOverrides) {
        if let Some(label) = &overrides.acts_folder_label {
            self.acts_folder_label = label.clone();
        }
        if let Some(label) = &overrides.entities_folder_label {
            self.entities_folder_label = label.clone();
        }
        if let Some(state) = overrides.default_drop_state {
            self.default_drop_state = state;
        }
        if let Some(expand) = overrides.expand_roots_on_first_load {
            self.expand_roots_on_first_load = expand;
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            acts_folder_label: Self::default_acts_folder_label(),
            entities_folder_label: Self::default_entities_folder_label(),
            invalid_entity_label: Self::default_invalid_entity_label(),
            invalid_stage_label: Self::default_invalid_stage_label(),
            default_drop_state: 0,
            expand_roots_on_first_load: Self::default_expand_roots(),
            show_notices: Self::default_show_notices(),
            drop_highlight_rgba: Self::default_drop_highlight_rgba(),
        }
    }
}

impl PanelConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.acts_folder_label.is_none()
            && self.entities_folder_label.is_none()
            && self.default_drop_state.is_none()
            && self.expand_roots_on_first_load.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.acts_folder_label.is_some() {
            fields.push("acts_folder_label");
        }
        if self.entities_folder_label.is_some() {
            fields.push("entities_folder_label");
        }
        if self.default_drop_state.is_some() {
            fields.push("default_drop_state");
        }
        if self.expand_roots_on_first_load.is_some() {
            fields.push("expand_roots_on_first_load");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("panel.json");
        fs::write(&path, r#"{ "acts_folder_label": "Scenes", "default_drop_state": 2 }"#).expect("write config");

        let cfg = PanelConfig::load(&path).expect("load config");
        assert_eq!(cfg.acts_folder_label, "Scenes");
        assert_eq!(cfg.default_drop_state, 2);
        assert_eq!(cfg.entities_folder_label, "Registered Entities");
        assert!(cfg.expand_roots_on_first_load);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = PanelConfig::load_or_default(dir.path().join("absent.json"));
        assert_eq!(cfg.invalid_entity_label, "Invalid Entity");
        assert_eq!(cfg.drop_highlight_rgba, [0, 128, 255, 153]);
    }

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut cfg = PanelConfig::default();
        let overrides =
            PanelConfigOverrides { default_drop_state: Some(5), expand_roots_on_first_load: Some(false), ..Default::default() };
        cfg.apply_overrides(&overrides);
        assert_eq!(cfg.default_drop_state, 5);
        assert!(!cfg.expand_roots_on_first_load);
        assert_eq!(cfg.acts_folder_label, "Acts");
        assert_eq!(overrides.applied_fields(), vec!["default_drop_state", "expand_roots_on_first_load"]);
    }
}
