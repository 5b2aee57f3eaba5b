//! Language identification and detection
//!
//! Maps file extensions to language IDs and provides language metadata.
//! The set of languages is closed: every variant has a bundled grammar.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::HighlightError;

/// Supported language identifiers
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LanguageId {
    Rust,
    JavaScript,
    TypeScript,
    Tsx,
    Python,
    Go,
    C,
    Cpp,
    Java,
    Json,
    Bash,
    Html,
    Css,
    Toml,
}

impl LanguageId {
    /// Every supported language, in declaration order
    pub const ALL: &'static [LanguageId] = &[
        LanguageId::Rust,
        LanguageId::JavaScript,
        LanguageId::TypeScript,
        LanguageId::Tsx,
        LanguageId::Python,
        LanguageId::Go,
        LanguageId::C,
        LanguageId::Cpp,
        LanguageId::Java,
        LanguageId::Json,
        LanguageId::Bash,
        LanguageId::Html,
        LanguageId::Css,
        LanguageId::Toml,
    ];

    /// Detect language from file extension.
    ///
    /// Returns `None` for extensions without highlighting support, meaning
    /// no highlight session should be attached to the document.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lang = match ext.to_lowercase().as_str() {
            "rs" => LanguageId::Rust,
            "js" | "mjs" | "cjs" | "jsx" => LanguageId::JavaScript,
            "ts" | "mts" | "cts" => LanguageId::TypeScript,
            "tsx" => LanguageId::Tsx,
            "py" | "pyi" => LanguageId::Python,
            "go" => LanguageId::Go,
            "c" => LanguageId::C,
            // .h is ambiguous, default to C++
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "h" => LanguageId::Cpp,
            "java" => LanguageId::Java,
            "json" => LanguageId::Json,
            "sh" | "bash" => LanguageId::Bash,
            "html" | "htm" => LanguageId::Html,
            "css" => LanguageId::Css,
            "toml" => LanguageId::Toml,
            _ => return None,
        };
        Some(lang)
    }

    /// Detect language from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Stable lowercase name used in config files and on the command line
    pub fn name(&self) -> &'static str {
        match self {
            LanguageId::Rust => "rust",
            LanguageId::JavaScript => "javascript",
            LanguageId::TypeScript => "typescript",
            LanguageId::Tsx => "tsx",
            LanguageId::Python => "python",
            LanguageId::Go => "go",
            LanguageId::C => "c",
            LanguageId::Cpp => "cpp",
            LanguageId::Java => "java",
            LanguageId::Json => "json",
            LanguageId::Bash => "bash",
            LanguageId::Html => "html",
            LanguageId::Css => "css",
            LanguageId::Toml => "toml",
        }
    }

    /// Parse a language name (as produced by [`LanguageId::name`]).
    pub fn from_name(name: &str) -> Result<Self, HighlightError> {
        let wanted = name.trim().to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.name() == wanted)
            .ok_or(HighlightError::UnsupportedLanguage { language: wanted })
    }

    /// Get display name for the language
    pub fn display_name(&self) -> &'static str {
        match self {
            LanguageId::Rust => "Rust",
            LanguageId::JavaScript => "JavaScript",
            LanguageId::TypeScript => "TypeScript",
            LanguageId::Tsx => "TSX",
            LanguageId::Python => "Python",
            LanguageId::Go => "Go",
            LanguageId::C => "C",
            LanguageId::Cpp => "C++",
            LanguageId::Java => "Java",
            LanguageId::Json => "JSON",
            LanguageId::Bash => "Bash",
            LanguageId::Html => "HTML",
            LanguageId::Css => "CSS",
            LanguageId::Toml => "TOML",
        }
    }
}

impl fmt::Display for LanguageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
