//! Highlight query engine
//!
//! Holds one compiled highlight query per language and runs it against a
//! tree's root node, flattening every match's captures into a single list.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use streaming_iterator::StreamingIterator;
use tree_sitter::{Query, QueryCursor};

use super::error::HighlightError;
use super::languages::LanguageId;
use super::parser::lock;
use super::runtime::SyntaxTree;

/// Highlight query source for a language.
///
/// C++ layers its query over the C query and TypeScript/TSX layer theirs
/// over the JavaScript query; the derived grammars only ship additions.
pub fn highlight_query_source(language: LanguageId) -> Cow<'static, str> {
    match language {
        LanguageId::Rust => Cow::Borrowed(tree_sitter_rust::HIGHLIGHTS_QUERY),
        LanguageId::JavaScript => Cow::Borrowed(tree_sitter_javascript::HIGHLIGHT_QUERY),
        LanguageId::TypeScript | LanguageId::Tsx => Cow::Owned(format!(
            "{}\n{}",
            tree_sitter_javascript::HIGHLIGHT_QUERY,
            tree_sitter_typescript::HIGHLIGHTS_QUERY
        )),
        LanguageId::Python => Cow::Borrowed(tree_sitter_python::HIGHLIGHTS_QUERY),
        LanguageId::Go => Cow::Borrowed(tree_sitter_go::HIGHLIGHTS_QUERY),
        LanguageId::C => Cow::Borrowed(tree_sitter_c::HIGHLIGHT_QUERY),
        LanguageId::Cpp => Cow::Owned(format!(
            "{}\n{}",
            tree_sitter_c::HIGHLIGHT_QUERY,
            tree_sitter_cpp::HIGHLIGHT_QUERY
        )),
        LanguageId::Java => Cow::Borrowed(tree_sitter_java::HIGHLIGHTS_QUERY),
        LanguageId::Json => Cow::Borrowed(tree_sitter_json::HIGHLIGHTS_QUERY),
        LanguageId::Bash => Cow::Borrowed(tree_sitter_bash::HIGHLIGHT_QUERY),
        LanguageId::Html => Cow::Borrowed(tree_sitter_html::HIGHLIGHTS_QUERY),
        LanguageId::Css => Cow::Borrowed(tree_sitter_css::HIGHLIGHTS_QUERY),
        LanguageId::Toml => Cow::Borrowed(tree_sitter_toml_ng::HIGHLIGHTS_QUERY),
    }
}

/// A named byte range matched by a highlight query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Start byte (inclusive)
    pub start: usize,
    /// End byte (exclusive)
    pub end: usize,
    /// Capture name without the leading `@`, e.g. `keyword` or `function.method`
    pub name: Arc<str>,
}

impl Capture {
    pub fn new(start: usize, end: usize, name: &str) -> Self {
        Self {
            start,
            end,
            name: Arc::from(name),
        }
    }
}

/// A compiled query with its capture names interned once
pub struct CompiledQuery {
    language: LanguageId,
    query: Query,
    names: Vec<Arc<str>>,
}

impl CompiledQuery {
    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub fn capture_names(&self) -> &[Arc<str>] {
        &self.names
    }

    pub fn pattern_count(&self) -> usize {
        self.query.pattern_count()
    }
}

impl fmt::Debug for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledQuery")
            .field("language", &self.language)
            .field("captures", &self.names.len())
            .finish_non_exhaustive()
    }
}

type QueryCell = Arc<OnceLock<Result<Arc<CompiledQuery>, HighlightError>>>;

/// Per-language compiled query cache plus capture extraction
#[derive(Default)]
pub struct HighlightQueryEngine {
    queries: Mutex<HashMap<LanguageId, QueryCell>>,
}

impl HighlightQueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled query for the tree's language, compiling it on first use
    pub fn compiled(&self, tree: &SyntaxTree) -> Result<Arc<CompiledQuery>, HighlightError> {
        let language = tree.language();
        let cell = {
            let mut queries = lock(&self.queries);
            Arc::clone(queries.entry(language).or_default())
        };

        cell.get_or_init(|| {
            let source = highlight_query_source(language);
            let root = tree.root_node();
            let ts_language = root.language();
            match Query::new(&ts_language, &source) {
                Ok(query) => {
                    let names = query
                        .capture_names()
                        .iter()
                        .map(|name| Arc::from(*name))
                        .collect();
                    tracing::debug!(
                        "Compiled highlight query for {} ({} patterns)",
                        language,
                        query.pattern_count()
                    );
                    Ok(Arc::new(CompiledQuery {
                        language,
                        query,
                        names,
                    }))
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to compile highlight query for {} at row {}, column {}: {}",
                        language,
                        e.row,
                        e.column,
                        e
                    );
                    Err(HighlightError::QueryCompile {
                        language,
                        message: e.to_string(),
                    })
                }
            }
        })
        .clone()
    }

    /// Run the language's highlight query over `tree`.
    ///
    /// Captures come back in match order, which is not document order.
    /// Zero-width captures are dropped.
    pub fn extract_captures(
        &self,
        tree: &SyntaxTree,
        language: LanguageId,
    ) -> Result<Vec<Capture>, HighlightError> {
        if tree.language() != language {
            return Err(HighlightError::LanguageMismatch {
                expected: language,
                found: tree.language(),
            });
        }

        let compiled = self.compiled(tree)?;
        let source = tree.source().as_bytes();
        let mut cursor = QueryCursor::new();
        let mut captures = Vec::new();

        let mut matches = cursor.matches(&compiled.query, tree.root_node(), source);
        while let Some(query_match) = matches.next() {
            for capture in query_match.captures {
                let start = capture.node.start_byte();
                let end = capture.node.end_byte();
                if start == end {
                    continue;
                }
                captures.push(Capture {
                    start,
                    end,
                    name: Arc::clone(&compiled.names[capture.index as usize]),
                });
            }
        }

        tracing::trace!("Extracted {} captures for {}", captures.len(), language);
        Ok(captures)
    }
}
