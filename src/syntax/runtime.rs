//! Grammar runtime adapter
//!
//! Everything the engine needs from tree-sitter goes through this module:
//! loading a grammar from a catalog locator, constructing parsers, and the
//! tree wrapper that remembers which language and text produced it.

use std::fmt;
use std::sync::Arc;

use tree_sitter::{InputEdit, Node, Parser, Point, Tree};

use super::catalog::GrammarArtifact;
use super::error::HighlightError;
use super::languages::LanguageId;

/// Capability interface over the grammar runtime.
///
/// `ParserRuntime` calls `bootstrap` once per process, `load_grammar` once
/// per language and `new_parser` once per language.
pub trait GrammarRuntime: Send + Sync {
    /// One-time global initialization
    fn bootstrap(&self) -> Result<(), HighlightError>;

    /// Resolve an artifact locator into a compiled grammar
    fn load_grammar(
        &self,
        language: LanguageId,
        artifact: &GrammarArtifact,
    ) -> Result<Grammar, HighlightError>;

    /// Construct a parser bound to `grammar`
    fn new_parser(&self, grammar: &Grammar) -> Result<Parser, HighlightError> {
        let mut parser = Parser::new();
        parser
            .set_language(grammar.ts_language())
            .map_err(|e| HighlightError::GrammarLoad {
                language: grammar.language(),
                message: e.to_string(),
            })?;
        Ok(parser)
    }
}

/// A loaded grammar, tagged with the language it was loaded for
#[derive(Clone)]
pub struct Grammar {
    language: LanguageId,
    inner: tree_sitter::Language,
}

impl Grammar {
    pub fn new(language: LanguageId, inner: tree_sitter::Language) -> Self {
        Self { language, inner }
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub fn ts_language(&self) -> &tree_sitter::Language {
        &self.inner
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

/// Runtime over the grammars linked into the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct BundledRuntime;

impl BundledRuntime {
    /// Grammar linked under `name` (a [`LanguageId::name`])
    pub fn bundled_language(name: &str) -> Option<tree_sitter::Language> {
        let lang = match name {
            "rust" => tree_sitter_rust::LANGUAGE.into(),
            "javascript" => tree_sitter_javascript::LANGUAGE.into(),
            "typescript" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            "tsx" => tree_sitter_typescript::LANGUAGE_TSX.into(),
            "python" => tree_sitter_python::LANGUAGE.into(),
            "go" => tree_sitter_go::LANGUAGE.into(),
            "c" => tree_sitter_c::LANGUAGE.into(),
            "cpp" => tree_sitter_cpp::LANGUAGE.into(),
            "java" => tree_sitter_java::LANGUAGE.into(),
            "json" => tree_sitter_json::LANGUAGE.into(),
            "bash" => tree_sitter_bash::LANGUAGE.into(),
            "html" => tree_sitter_html::LANGUAGE.into(),
            "css" => tree_sitter_css::LANGUAGE.into(),
            "toml" => tree_sitter_toml_ng::LANGUAGE.into(),
            _ => return None,
        };
        Some(lang)
    }
}

impl GrammarRuntime for BundledRuntime {
    fn bootstrap(&self) -> Result<(), HighlightError> {
        tracing::debug!(
            "tree-sitter runtime ready (ABI {}, min compatible {})",
            tree_sitter::LANGUAGE_VERSION,
            tree_sitter::MIN_COMPATIBLE_LANGUAGE_VERSION
        );
        Ok(())
    }

    fn load_grammar(
        &self,
        language: LanguageId,
        artifact: &GrammarArtifact,
    ) -> Result<Grammar, HighlightError> {
        let name = artifact
            .bundled_name()
            .ok_or_else(|| HighlightError::GrammarLoad {
                language,
                message: format!("unsupported artifact locator '{}'", artifact),
            })?;

        let inner = Self::bundled_language(name).ok_or_else(|| HighlightError::GrammarLoad {
            language,
            message: format!("artifact '{}' not found", artifact),
        })?;

        Ok(Grammar::new(language, inner))
    }
}

/// A parsed tree paired with the text and language that produced it
#[derive(Clone)]
pub struct SyntaxTree {
    language: LanguageId,
    tree: Tree,
    source: Arc<str>,
}

impl SyntaxTree {
    pub(crate) fn new(language: LanguageId, tree: Tree, source: Arc<str>) -> Self {
        Self {
            language,
            tree,
            source,
        }
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn shared_source(&self) -> Arc<str> {
        Arc::clone(&self.source)
    }

    pub fn root_node(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// S-expression of the whole tree (useful in tests and diagnostics)
    pub fn to_sexp(&self) -> String {
        self.tree.root_node().to_sexp()
    }

    pub(crate) fn into_tree(self) -> Tree {
        self.tree
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("language", &self.language)
            .field("source_len", &self.source.len())
            .finish_non_exhaustive()
    }
}

/// Row and byte column of `offset` in `text`
pub(crate) fn point_at(text: &str, offset: usize) -> Point {
    let before = &text.as_bytes()[..offset.min(text.len())];
    let row = before.iter().filter(|&&b| b == b'\n').count();
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |newline| newline + 1);
    Point {
        row,
        column: before.len() - line_start,
    }
}

/// The single span that turns `old` into `new`: everything between their
/// shared prefix and shared suffix. `None` when the texts are equal.
pub(crate) fn edit_between(old: &str, new: &str) -> Option<InputEdit> {
    if old == new {
        return None;
    }
    let (old_bytes, new_bytes) = (old.as_bytes(), new.as_bytes());

    let start = old_bytes
        .iter()
        .zip(new_bytes)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old_bytes[start..]
        .iter()
        .rev()
        .zip(new_bytes[start..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let old_end = old_bytes.len() - suffix;
    let new_end = new_bytes.len() - suffix;

    Some(InputEdit {
        start_byte: start,
        old_end_byte: old_end,
        new_end_byte: new_end,
        start_position: point_at(old, start),
        old_end_position: point_at(old, old_end),
        new_end_position: point_at(new, new_end),
    })
}
