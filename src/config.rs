//! Highlighter configuration persistence
//!
//! Stores user preferences in `~/.config/hilite/config.yaml`

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::syntax::{LanguageId, DEFAULT_CLASS_PREFIX};

/// Highlighter configuration that persists across sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightConfig {
    /// Prefix for decoration class names (e.g., "ts-" gives "ts-keyword")
    #[serde(default = "default_class_prefix")]
    pub class_prefix: String,

    /// Languages that never get a highlight session
    #[serde(default)]
    pub disabled_languages: Vec<LanguageId>,

    /// Grammar artifact locators replacing the bundled ones
    #[serde(default)]
    pub grammar_overrides: BTreeMap<LanguageId, String>,

    /// Extra extension mappings, checked before the built-in table
    /// (e.g., `jsonc: json`)
    #[serde(default)]
    pub file_associations: BTreeMap<String, LanguageId>,
}

fn default_class_prefix() -> String {
    DEFAULT_CLASS_PREFIX.to_string()
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            class_prefix: default_class_prefix(),
            disabled_languages: Vec::new(),
            grammar_overrides: BTreeMap::new(),
            file_associations: BTreeMap::new(),
        }
    }
}

impl HighlightConfig {
    /// Load config from disk, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = crate::config_paths::config_file() else {
            tracing::debug!("No config directory available, using defaults");
            return Self::default();
        };
        Self::load_from(&path)
    }

    /// Load config from `path`, falling back to defaults on any error
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                path.display()
            );
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match Self::parse(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse config from YAML text
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        // An empty file deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<(), String> {
        let path = crate::config_paths::config_file()
            .ok_or_else(|| "No config directory available".to_string())?;
        self.save_to(&path)
    }

    /// Save config to `path`
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config to {}: {}", path.display(), e))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn is_disabled(&self, language: LanguageId) -> bool {
        self.disabled_languages.contains(&language)
    }

    /// Language to highlight `path` with, or `None` to leave it plain
    pub fn language_for_path(&self, path: &Path) -> Option<LanguageId> {
        let ext = path.extension().and_then(|ext| ext.to_str())?;
        let language = self
            .file_associations
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(ext))
            .map(|(_, language)| *language)
            .or_else(|| LanguageId::from_extension(ext))?;

        if self.is_disabled(language) {
            tracing::debug!("Highlighting disabled for {} by config", language);
            return None;
        }
        Some(language)
    }
}
