//! Highlight engine composition root
//!
//! Bundles the parser runtime, the query engine and the range compiler.
//! One engine is built at startup and shared (via `Arc`) by every document
//! and the background worker; tests build a fresh one each.

use std::sync::Arc;

use super::catalog::GrammarCatalog;
use super::error::HighlightError;
use super::highlights::{DecorationSet, RangeCompiler};
use super::languages::LanguageId;
use super::parser::ParserRuntime;
use super::query::HighlightQueryEngine;
use super::runtime::{BundledRuntime, GrammarRuntime, SyntaxTree};
use crate::config::HighlightConfig;

/// Result of highlighting one document revision
#[derive(Debug, Clone)]
pub struct Highlighted {
    pub tree: SyntaxTree,
    pub decorations: DecorationSet,
}

pub struct HighlightEngine {
    parsers: ParserRuntime,
    queries: HighlightQueryEngine,
    compiler: RangeCompiler,
}

impl HighlightEngine {
    pub fn new(
        catalog: GrammarCatalog,
        runtime: Arc<dyn GrammarRuntime>,
        class_prefix: impl Into<String>,
    ) -> Self {
        Self {
            parsers: ParserRuntime::new(catalog, runtime),
            queries: HighlightQueryEngine::new(),
            compiler: RangeCompiler::new(class_prefix),
        }
    }

    /// Engine over the bundled grammars with default class names
    pub fn bundled() -> Self {
        Self::from_config(&HighlightConfig::default())
    }

    /// Engine over the bundled grammars, applying config overrides
    pub fn from_config(config: &HighlightConfig) -> Self {
        let catalog = GrammarCatalog::bundled().with_overrides(&config.grammar_overrides);
        Self::new(catalog, Arc::new(BundledRuntime), config.class_prefix.clone())
    }

    pub fn parsers(&self) -> &ParserRuntime {
        &self.parsers
    }

    pub fn queries(&self) -> &HighlightQueryEngine {
        &self.queries
    }

    pub fn compiler(&self) -> &RangeCompiler {
        &self.compiler
    }

    /// Parse (incrementally when `previous` is given) and compute decorations
    pub fn highlight(
        &self,
        text: impl Into<Arc<str>>,
        language: LanguageId,
        previous: Option<SyntaxTree>,
        revision: u64,
    ) -> Result<Highlighted, HighlightError> {
        let tree = match previous {
            Some(previous) => self.parsers.reparse(text, language, previous)?,
            None => self.parsers.parse(text, language)?,
        };
        let decorations = self.decorations(&tree, revision)?;
        Ok(Highlighted { tree, decorations })
    }

    /// Decorations for an existing tree
    pub fn decorations(
        &self,
        tree: &SyntaxTree,
        revision: u64,
    ) -> Result<DecorationSet, HighlightError> {
        let captures = self.queries.extract_captures(tree, tree.language())?;
        Ok(self.compiler.compile(captures, tree.language(), revision))
    }

    /// Full parse of `text` straight to decorations
    pub fn highlight_text(
        &self,
        text: &str,
        language: LanguageId,
    ) -> Result<DecorationSet, HighlightError> {
        self.highlight(text, language, None, 0)
            .map(|highlighted| highlighted.decorations)
    }

    /// Validate the catalog, then load every grammar and compile every query.
    /// Returns the pattern count per language.
    pub fn self_check(&self) -> Vec<(LanguageId, Result<usize, HighlightError>)> {
        if let Err(e) = self.parsers.catalog().validate() {
            tracing::warn!("Grammar catalog is incomplete: {}", e);
        }

        self.parsers
            .catalog()
            .languages()
            .into_iter()
            .map(|lang| {
                let result = self
                    .parsers
                    .parse("", lang)
                    .and_then(|tree| self.queries.compiled(&tree))
                    .map(|query| query.pattern_count());
                (lang, result)
            })
            .collect()
    }
}
