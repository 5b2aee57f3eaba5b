//! Error taxonomy for the highlighting engine
//!
//! Runtime conditions (a grammar that fails to load, a parse that yields no
//! tree) degrade a document to plain text. Programming errors (an unknown
//! language, a tree handed to the wrong language) propagate to the caller.

use thiserror::Error;

use super::languages::LanguageId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    /// Requested language has no catalog entry
    #[error("unsupported language: {language}")]
    UnsupportedLanguage { language: String },

    /// One-time runtime bootstrap failed
    #[error("grammar runtime failed to start: {message}")]
    Bootstrap { message: String },

    /// Grammar artifact missing or incompatible
    #[error("failed to load grammar for {language}: {message}")]
    GrammarLoad {
        language: LanguageId,
        message: String,
    },

    /// Previous tree was produced under a different language
    #[error("previous tree was parsed as {found}, but {expected} was requested")]
    LanguageMismatch {
        expected: LanguageId,
        found: LanguageId,
    },

    /// Parser returned no tree
    #[error("parser produced no tree for {language}")]
    ParseFailure { language: LanguageId },

    /// Highlight query for the language does not compile
    #[error("highlight query for {language} failed to compile: {message}")]
    QueryCompile {
        language: LanguageId,
        message: String,
    },
}

impl HighlightError {
    /// True for runtime conditions that should disable highlighting for a
    /// document instead of surfacing to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HighlightError::Bootstrap { .. }
                | HighlightError::GrammarLoad { .. }
                | HighlightError::ParseFailure { .. }
                | HighlightError::QueryCompile { .. }
        )
    }

    pub fn unsupported(language: LanguageId) -> Self {
        HighlightError::UnsupportedLanguage {
            language: language.name().to_string(),
        }
    }
}
