//! Parser runtime manager
//!
//! Owns the one-time runtime bootstrap, the per-language grammar cache and
//! the per-language parser instances. Supports incremental parsing by
//! editing the previous tree before handing it back to tree-sitter.
//!
//! Every cache is append-only and keyed by [`LanguageId`]. Loads go through
//! a `OnceLock` per key, so concurrent first use of a language performs a
//! single load and every caller observes the same result.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Instant;

use tree_sitter::{Parser, Tree};

use super::catalog::GrammarCatalog;
use super::error::HighlightError;
use super::languages::LanguageId;
use super::runtime::{edit_between, Grammar, GrammarRuntime, SyntaxTree};

type LoadCell = Arc<OnceLock<Result<Grammar, HighlightError>>>;

/// Parser instance shared by every document of one language
pub type SharedParser = Arc<Mutex<Parser>>;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ParserRuntime {
    catalog: GrammarCatalog,
    runtime: Arc<dyn GrammarRuntime>,
    bootstrap: OnceLock<Result<(), HighlightError>>,
    grammars: Mutex<HashMap<LanguageId, LoadCell>>,
    parsers: Mutex<HashMap<LanguageId, SharedParser>>,
}

impl ParserRuntime {
    pub fn new(catalog: GrammarCatalog, runtime: Arc<dyn GrammarRuntime>) -> Self {
        Self {
            catalog,
            runtime,
            bootstrap: OnceLock::new(),
            grammars: Mutex::new(HashMap::new()),
            parsers: Mutex::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &GrammarCatalog {
        &self.catalog
    }

    /// Bootstrap the grammar runtime. Idempotent; the first caller runs the
    /// bootstrap and concurrent callers wait for its outcome.
    pub fn ensure_runtime_ready(&self) -> Result<(), HighlightError> {
        self.bootstrap
            .get_or_init(|| {
                tracing::debug!("Bootstrapping grammar runtime");
                let result = self.runtime.bootstrap();
                if let Err(e) = &result {
                    tracing::error!("Grammar runtime bootstrap failed: {}", e);
                }
                result
            })
            .clone()
    }

    /// Compiled grammar for a language, loading it on first use.
    ///
    /// A failed load is remembered; see [`Self::forget_failed_grammar`].
    pub fn grammar(&self, language: LanguageId) -> Result<Grammar, HighlightError> {
        let cell = {
            let mut grammars = lock(&self.grammars);
            Arc::clone(grammars.entry(language).or_default())
        };

        cell.get_or_init(|| self.load_grammar(language)).clone()
    }

    fn load_grammar(&self, language: LanguageId) -> Result<Grammar, HighlightError> {
        self.ensure_runtime_ready()?;
        let artifact = self.catalog.locate(language)?;

        let started = Instant::now();
        let result = self.runtime.load_grammar(language, artifact);
        match &result {
            Ok(_) => tracing::debug!(
                "Loaded grammar for {} from {} in {:?}",
                language,
                artifact,
                started.elapsed()
            ),
            // Logged here only: the failure is cached, so this runs once per language
            Err(e) => tracing::warn!("Highlighting disabled for {}: {}", language, e),
        }
        result
    }

    /// Drop a cached grammar load failure so the next request retries.
    /// Returns true if a failure was forgotten.
    pub fn forget_failed_grammar(&self, language: LanguageId) -> bool {
        let mut grammars = lock(&self.grammars);
        let failed = grammars
            .get(&language)
            .and_then(|cell| cell.get())
            .is_some_and(|result| result.is_err());
        if failed {
            grammars.remove(&language);
        }
        failed
    }

    /// Parser instance for a language, constructed on first use
    pub fn parser(&self, language: LanguageId) -> Result<SharedParser, HighlightError> {
        if let Some(parser) = lock(&self.parsers).get(&language) {
            return Ok(Arc::clone(parser));
        }

        let grammar = self.grammar(language)?;

        let mut parsers = lock(&self.parsers);
        if let Some(parser) = parsers.get(&language) {
            return Ok(Arc::clone(parser));
        }
        let parser = Arc::new(Mutex::new(self.runtime.new_parser(&grammar)?));
        parsers.insert(language, Arc::clone(&parser));
        tracing::debug!("Created parser for {}", language);
        Ok(parser)
    }

    /// Languages whose grammar has loaded successfully
    pub fn loaded_languages(&self) -> Vec<LanguageId> {
        let grammars = lock(&self.grammars);
        let mut langs: Vec<LanguageId> = grammars
            .iter()
            .filter(|(_, cell)| matches!(cell.get(), Some(Ok(_))))
            .map(|(lang, _)| *lang)
            .collect();
        langs.sort();
        langs
    }

    /// Full parse without a previous tree
    pub fn parse(
        &self,
        text: impl Into<Arc<str>>,
        language: LanguageId,
    ) -> Result<SyntaxTree, HighlightError> {
        self.run_parser(text.into(), language, None)
    }

    /// Incremental parse reusing `previous`.
    ///
    /// `previous` must have been produced for the same language.
    pub fn reparse(
        &self,
        text: impl Into<Arc<str>>,
        language: LanguageId,
        previous: SyntaxTree,
    ) -> Result<SyntaxTree, HighlightError> {
        if previous.language() != language {
            return Err(HighlightError::LanguageMismatch {
                expected: language,
                found: previous.language(),
            });
        }

        let text = text.into();
        let Some(edit) = edit_between(previous.source(), &text) else {
            tracing::trace!("Source unchanged, reusing previous tree");
            return Ok(previous);
        };

        tracing::trace!(
            "Incremental parse: edit at byte {}..{} -> {}..{}",
            edit.start_byte,
            edit.old_end_byte,
            edit.start_byte,
            edit.new_end_byte
        );

        let mut old_tree = previous.into_tree();
        old_tree.edit(&edit);
        self.run_parser(text, language, Some(&old_tree))
    }

    fn run_parser(
        &self,
        text: Arc<str>,
        language: LanguageId,
        old_tree: Option<&Tree>,
    ) -> Result<SyntaxTree, HighlightError> {
        self.ensure_runtime_ready()?;
        let parser = self.parser(language)?;

        let started = Instant::now();
        let tree = lock(&parser).parse(text.as_bytes(), old_tree);
        let Some(tree) = tree else {
            tracing::error!("Parse failed for {}", language);
            return Err(HighlightError::ParseFailure { language });
        };

        tracing::trace!(
            "Parsed {} bytes of {} in {:?} (incremental: {})",
            text.len(),
            language,
            started.elapsed(),
            old_tree.is_some()
        );
        Ok(SyntaxTree::new(language, tree, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::catalog::GrammarArtifact;
    use crate::syntax::runtime::BundledRuntime;

    fn runtime() -> ParserRuntime {
        ParserRuntime::new(GrammarCatalog::bundled(), Arc::new(BundledRuntime))
    }

    #[test]
    fn test_rust_parsing() {
        let parsers = runtime();
        let source = r#"fn main() {
    let x = 42;
    println!("Hello");
}
"#;
        let tree = parsers.parse(source, LanguageId::Rust).unwrap();
        assert_eq!(tree.language(), LanguageId::Rust);
        assert_eq!(tree.source(), source);
        assert!(tree.to_sexp().starts_with("(source_file"));
    }

    #[test]
    fn test_reparse_matches_full_parse() {
        let parsers = runtime();
        let old = parsers
            .parse("function add(a, b) { return a + b; }", LanguageId::JavaScript)
            .unwrap();
        let new_text = "function add(a, b) { return a * b; }";

        let incremental = parsers
            .reparse(new_text, LanguageId::JavaScript, old)
            .unwrap();
        let full = parsers.parse(new_text, LanguageId::JavaScript).unwrap();

        assert_eq!(incremental.source(), new_text);
        assert_eq!(incremental.to_sexp(), full.to_sexp());
    }

    #[test]
    fn test_reparse_unchanged_source_reuses_tree() {
        let parsers = runtime();
        let tree = parsers.parse("x = 1", LanguageId::Python).unwrap();
        let sexp = tree.to_sexp();
        let again = parsers.reparse("x = 1", LanguageId::Python, tree).unwrap();
        assert_eq!(again.to_sexp(), sexp);
    }

    #[test]
    fn test_reparse_rejects_tree_from_other_language() {
        let parsers = runtime();
        let tree = parsers.parse("fn main() {}", LanguageId::Rust).unwrap();
        let err = parsers
            .reparse("fn main() {}", LanguageId::Go, tree)
            .unwrap_err();
        assert_eq!(
            err,
            HighlightError::LanguageMismatch {
                expected: LanguageId::Go,
                found: LanguageId::Rust,
            }
        );
    }

    #[test]
    fn test_parser_instance_is_reused() {
        let parsers = runtime();
        let first = parsers.parser(LanguageId::C).unwrap();
        let second = parsers.parser(LanguageId::C).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(parsers.loaded_languages(), vec![LanguageId::C]);
    }

    #[test]
    fn test_missing_artifact_is_grammar_load_error() {
        let catalog = GrammarCatalog::from_entries([(
            LanguageId::Json,
            GrammarArtifact::new("bundled:not-a-grammar"),
        )]);
        let parsers = ParserRuntime::new(catalog, Arc::new(BundledRuntime));

        let err = parsers.parse("{}", LanguageId::Json).unwrap_err();
        assert!(matches!(err, HighlightError::GrammarLoad { .. }));
        // Failure is cached rather than retried
        assert!(parsers.grammar(LanguageId::Json).is_err());
        assert!(parsers.loaded_languages().is_empty());

        assert!(parsers.forget_failed_grammar(LanguageId::Json));
        assert!(!parsers.forget_failed_grammar(LanguageId::Json));
    }

    #[test]
    fn test_language_outside_catalog_is_unsupported() {
        let catalog = GrammarCatalog::from_entries([(
            LanguageId::Rust,
            GrammarArtifact::bundled(LanguageId::Rust),
        )]);
        let parsers = ParserRuntime::new(catalog, Arc::new(BundledRuntime));
        let err = parsers.parse("x = 1", LanguageId::Python).unwrap_err();
        assert!(matches!(err, HighlightError::UnsupportedLanguage { .. }));
    }

    #[test]
    fn test_malformed_input_still_parses() {
        let parsers = runtime();
        let tree = parsers.parse("fn main( {{{", LanguageId::Rust).unwrap();
        assert!(tree.root_node().has_error());
    }
}
