//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hilite::commands::Cmd;
use hilite::messages::SyntaxMsg;
use hilite::syntax::{
    BundledRuntime, DocumentId, Grammar, GrammarArtifact, GrammarCatalog, GrammarRuntime,
    HighlightEngine, HighlightError, HighlightSession, LanguageId, ParseJob,
};
use tree_sitter::Parser;

/// Grammar runtime that counts calls and can be told to fail or stall
#[derive(Default)]
pub struct CountingRuntime {
    pub bootstraps: AtomicUsize,
    pub loads: AtomicUsize,
    pub parsers: AtomicUsize,
    /// Sleep inside bootstrap and load to widen race windows
    pub delay: Option<Duration>,
    /// Languages whose load fails as if the artifact were missing
    pub failing: HashSet<LanguageId>,
    /// Fail the one-time runtime bootstrap
    pub failing_bootstrap: bool,
}

impl CountingRuntime {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing(languages: &[LanguageId]) -> Self {
        Self {
            failing: languages.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn failing_bootstrap() -> Self {
        Self {
            failing_bootstrap: true,
            ..Self::default()
        }
    }

    pub fn bootstraps(&self) -> usize {
        self.bootstraps.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn parsers(&self) -> usize {
        self.parsers.load(Ordering::SeqCst)
    }

    fn stall(&self) {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
    }
}

impl GrammarRuntime for CountingRuntime {
    fn bootstrap(&self) -> Result<(), HighlightError> {
        self.bootstraps.fetch_add(1, Ordering::SeqCst);
        self.stall();
        if self.failing_bootstrap {
            return Err(HighlightError::Bootstrap {
                message: "runtime image missing".into(),
            });
        }
        Ok(())
    }

    fn load_grammar(
        &self,
        language: LanguageId,
        artifact: &GrammarArtifact,
    ) -> Result<Grammar, HighlightError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.stall();
        if self.failing.contains(&language) {
            return Err(HighlightError::GrammarLoad {
                language,
                message: format!("artifact '{}' not found", artifact),
            });
        }
        BundledRuntime.load_grammar(language, artifact)
    }

    fn new_parser(&self, grammar: &Grammar) -> Result<Parser, HighlightError> {
        self.parsers.fetch_add(1, Ordering::SeqCst);
        BundledRuntime.new_parser(grammar)
    }
}

/// Engine over the bundled catalog and the given runtime
pub fn engine_with(runtime: Arc<CountingRuntime>) -> HighlightEngine {
    HighlightEngine::new(GrammarCatalog::bundled(), runtime, "ts-")
}

/// Engine whose catalog points `language` at an artifact that does not exist
pub fn engine_missing_artifact(language: LanguageId) -> HighlightEngine {
    let catalog = GrammarCatalog::bundled().with_overrides(
        &[(language, "bundled:does-not-exist".to_string())]
            .into_iter()
            .collect(),
    );
    HighlightEngine::new(catalog, Arc::new(BundledRuntime), "ts-")
}

/// Attach a session and run its bootstrap to completion
pub fn ready_session(
    engine: &HighlightEngine,
    language: LanguageId,
    text: &str,
) -> HighlightSession {
    let (mut session, cmd) = HighlightSession::attach(DocumentId(1), language, text, engine)
        .expect("language should be in the catalog");
    session.run_to_completion(cmd, engine);
    session
}

/// The single parse job carried by `cmd`
pub fn single_job(cmd: Option<Cmd>) -> ParseJob {
    let mut jobs = cmd.expect("expected a command").into_jobs();
    assert_eq!(jobs.len(), 1, "expected exactly one parse job");
    jobs.remove(0)
}

/// Apply an edit and run any resulting jobs inline
pub fn edit(session: &mut HighlightSession, engine: &HighlightEngine, text: &str) {
    if let Some(cmd) = session.update(SyntaxMsg::edit(text)) {
        session.run_to_completion(cmd, engine);
    }
}

/// `(from, to, class)` triples for compact assertions
pub fn triples(set: &hilite::DecorationSet) -> Vec<(usize, usize, String)> {
    set.ranges()
        .iter()
        .map(|r| (r.from, r.to, r.class().to_string()))
        .collect()
}
