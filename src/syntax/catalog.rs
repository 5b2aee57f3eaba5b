//! Grammar catalog
//!
//! Maps each language to the locator of its grammar artifact. The bundled
//! catalog points every language at a grammar linked into the binary; the
//! config file may override individual locators.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::error::HighlightError;
use super::languages::LanguageId;

/// Scheme prefix for grammars statically linked into the binary
pub const BUNDLED_SCHEME: &str = "bundled:";

/// Opaque locator for a grammar artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GrammarArtifact(String);

impl GrammarArtifact {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// Locator of the grammar bundled for `language`
    pub fn bundled(language: LanguageId) -> Self {
        Self(format!("{BUNDLED_SCHEME}{}", language.name()))
    }

    pub fn locator(&self) -> &str {
        &self.0
    }

    /// Name after the `bundled:` scheme, if this is a bundled locator
    pub fn bundled_name(&self) -> Option<&str> {
        self.0.strip_prefix(BUNDLED_SCHEME)
    }
}

impl fmt::Display for GrammarArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Language → grammar artifact table, read-only after construction
#[derive(Debug, Clone, Default)]
pub struct GrammarCatalog {
    entries: HashMap<LanguageId, GrammarArtifact>,
}

impl GrammarCatalog {
    /// Catalog with every supported language pointing at its bundled grammar
    pub fn bundled() -> Self {
        Self::from_entries(
            LanguageId::ALL
                .iter()
                .map(|&lang| (lang, GrammarArtifact::bundled(lang))),
        )
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (LanguageId, GrammarArtifact)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Replace locators for the given languages
    pub fn with_overrides(mut self, overrides: &BTreeMap<LanguageId, String>) -> Self {
        for (lang, locator) in overrides {
            tracing::debug!("Grammar override for {}: {}", lang, locator);
            self.entries
                .insert(*lang, GrammarArtifact::new(locator.clone()));
        }
        self
    }

    /// Look up the artifact for a language
    pub fn locate(&self, language: LanguageId) -> Result<&GrammarArtifact, HighlightError> {
        self.entries
            .get(&language)
            .ok_or_else(|| HighlightError::unsupported(language))
    }

    /// Check that every declared language has an entry
    pub fn validate(&self) -> Result<(), HighlightError> {
        match LanguageId::ALL
            .iter()
            .find(|lang| !self.entries.contains_key(lang))
        {
            Some(missing) => {
                tracing::error!("Grammar catalog has no entry for {}", missing);
                Err(HighlightError::unsupported(*missing))
            }
            None => Ok(()),
        }
    }

    /// Languages with a catalog entry, in declaration order
    pub fn languages(&self) -> Vec<LanguageId> {
        LanguageId::ALL
            .iter()
            .copied()
            .filter(|lang| self.entries.contains_key(lang))
            .collect()
    }
}
