//! Per-document highlight session
//!
//! A session binds one open document to one language and drives it through
//! `Uninitialized → Bootstrapping → Ready ⇄ Reparsing`, ending in `Disposed`
//! when the host closes the view.
//!
//! At most one parse job is in flight per session. Edits that arrive while
//! a job runs only bump the revision; when the job returns, a result for an
//! older revision is discarded and a job for the current text is started.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::catalog::GrammarCatalog;
use super::engine::{HighlightEngine, Highlighted};
use super::error::HighlightError;
use super::highlights::DecorationSet;
use super::languages::LanguageId;
use super::runtime::SyntaxTree;
use crate::commands::Cmd;
use crate::messages::SyntaxMsg;

/// Unique identifier for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    /// First full parse in flight; decorations are empty
    Bootstrapping,
    Ready,
    /// Incremental reparse in flight; previous decorations stay visible
    Reparsing,
    Disposed,
}

/// Work item for one document revision
#[derive(Debug)]
pub struct ParseJob {
    pub document_id: DocumentId,
    pub revision: u64,
    pub language: LanguageId,
    pub text: Arc<str>,
    previous: Option<SyntaxTree>,
    bootstrap: bool,
    alive: Arc<AtomicBool>,
}

impl ParseJob {
    /// False once the owning session has been disposed
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn is_incremental(&self) -> bool {
        self.previous.is_some()
    }

    pub(crate) fn liveness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.alive)
    }

    /// Run the job against `engine`. Blocks until the parse completes.
    pub fn run(self, engine: &HighlightEngine) -> ParseOutcome {
        let started = Instant::now();
        let incremental = self.previous.is_some();

        let ready = if self.bootstrap {
            engine
                .parsers()
                .ensure_runtime_ready()
                .and_then(|()| engine.parsers().parser(self.language))
                .map(|_| ())
        } else {
            Ok(())
        };
        let result = ready.and_then(|()| {
            engine.highlight(self.text, self.language, self.previous, self.revision)
        });

        tracing::trace!(
            "Parse job doc={} rev={} finished in {:?} (incremental: {})",
            self.document_id.0,
            self.revision,
            started.elapsed(),
            incremental
        );

        ParseOutcome {
            document_id: self.document_id,
            revision: self.revision,
            language: self.language,
            result,
        }
    }
}

/// Result of a [`ParseJob`]
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub document_id: DocumentId,
    pub revision: u64,
    pub language: LanguageId,
    pub result: Result<Highlighted, HighlightError>,
}

/// Highlight state for one open document
pub struct HighlightSession {
    document_id: DocumentId,
    language: LanguageId,
    state: SessionState,
    /// Bumped on every content change and language switch
    revision: u64,
    text: Arc<str>,
    /// Revision of the job currently running, if any
    in_flight: Option<u64>,
    previous_tree: Option<SyntaxTree>,
    decorations: Arc<DecorationSet>,
    disabled: Option<HighlightError>,
    alive: Arc<AtomicBool>,
}

impl HighlightSession {
    pub fn new(document_id: DocumentId, language: LanguageId, text: impl Into<Arc<str>>) -> Self {
        Self {
            document_id,
            language,
            state: SessionState::Uninitialized,
            revision: 0,
            text: text.into(),
            in_flight: None,
            previous_tree: None,
            decorations: Arc::new(DecorationSet::empty(0)),
            disabled: None,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create and mount a session in one step
    pub fn attach(
        document_id: DocumentId,
        language: LanguageId,
        text: impl Into<Arc<str>>,
        engine: &HighlightEngine,
    ) -> Result<(Self, Cmd), HighlightError> {
        let mut session = Self::new(document_id, language, text);
        let cmd = session.mount(engine.parsers().catalog())?;
        Ok((session, cmd))
    }

    /// Start bootstrapping: returns the job that loads the grammar and
    /// performs the first full parse.
    ///
    /// Fails if the language has no catalog entry.
    pub fn mount(&mut self, catalog: &GrammarCatalog) -> Result<Cmd, HighlightError> {
        if self.state != SessionState::Uninitialized {
            return Ok(Cmd::None);
        }
        catalog.locate(self.language)?;

        tracing::debug!(
            "Mounting highlight session doc={} language={}",
            self.document_id.0,
            self.language
        );
        self.state = SessionState::Bootstrapping;
        Ok(self.start_job())
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Decorations to render now
    pub fn decorations(&self) -> Arc<DecorationSet> {
        Arc::clone(&self.decorations)
    }

    /// True once highlighting has been disabled for this document
    pub fn is_degraded(&self) -> bool {
        self.disabled.is_some()
    }

    /// Why highlighting was disabled, if it was
    pub fn disabled_reason(&self) -> Option<&HighlightError> {
        self.disabled.as_ref()
    }

    pub fn has_tree(&self) -> bool {
        self.previous_tree.is_some()
    }

    pub fn is_parse_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Handle a message; returns the side effect the host should perform
    pub fn update(&mut self, msg: SyntaxMsg) -> Option<Cmd> {
        if self.state == SessionState::Disposed {
            tracing::debug!(
                "Ignoring message for disposed session doc={}",
                self.document_id.0
            );
            return None;
        }

        match msg {
            SyntaxMsg::DocumentChanged {
                text,
                content_changed,
            } => self.on_document_changed(text, content_changed),
            SyntaxMsg::ParseCompleted(outcome) => self.on_parse_completed(outcome),
            SyntaxMsg::LanguageChanged(language) => self.on_language_changed(language),
        }
    }

    fn on_document_changed(&mut self, text: Arc<str>, content_changed: bool) -> Option<Cmd> {
        if !content_changed || text == self.text {
            tracing::trace!("Skipping structural no-op for doc={}", self.document_id.0);
            return None;
        }

        self.text = text;
        self.revision += 1;

        if self.state == SessionState::Uninitialized || self.is_degraded() {
            return None;
        }

        if let Some(running) = self.in_flight {
            tracing::trace!(
                "Parse of rev {} in flight for doc={}, rev {} will follow",
                running,
                self.document_id.0,
                self.revision
            );
            return None;
        }

        Some(self.start_job())
    }

    fn on_parse_completed(&mut self, outcome: ParseOutcome) -> Option<Cmd> {
        if outcome.document_id != self.document_id {
            tracing::warn!(
                "Parse result for doc={} delivered to doc={}",
                outcome.document_id.0,
                self.document_id.0
            );
            return None;
        }
        if self.in_flight != Some(outcome.revision) {
            tracing::warn!(
                "Unexpected parse result for doc={} rev={}",
                self.document_id.0,
                outcome.revision
            );
            return None;
        }
        self.in_flight = None;

        if outcome.revision != self.revision {
            tracing::debug!(
                "Discarding stale parse results: doc revision {} != result revision {}",
                self.revision,
                outcome.revision
            );
            if let Ok(highlighted) = outcome.result {
                // Still a valid base for the next incremental parse
                if outcome.language == self.language {
                    self.previous_tree = Some(highlighted.tree);
                }
            }
            if self.is_degraded() {
                return None;
            }
            return Some(self.start_job());
        }

        match outcome.result {
            Ok(Highlighted { tree, decorations }) => {
                tracing::debug!(
                    "Applied {} decorations for doc={} rev={}",
                    decorations.len(),
                    self.document_id.0,
                    outcome.revision
                );
                self.previous_tree = Some(tree);
                self.decorations = Arc::new(decorations);
                self.state = SessionState::Ready;
                Some(Cmd::Redraw {
                    document_id: self.document_id,
                })
            }
            Err(e @ HighlightError::LanguageMismatch { .. }) => {
                if cfg!(debug_assertions) {
                    panic!("doc={}: {}", self.document_id.0, e);
                }
                tracing::error!(
                    "doc={}: {}; falling back to a full parse",
                    self.document_id.0,
                    e
                );
                Some(self.restart_full_parse())
            }
            Err(e) => {
                self.disable(e);
                Some(Cmd::Redraw {
                    document_id: self.document_id,
                })
            }
        }
    }

    fn on_language_changed(&mut self, language: LanguageId) -> Option<Cmd> {
        if language == self.language {
            return None;
        }

        tracing::debug!(
            "Language changed from {} to {} for doc={}",
            self.language,
            language,
            self.document_id.0
        );
        self.language = language;
        self.revision += 1;
        self.previous_tree = None;
        self.disabled = None;
        self.decorations = Arc::new(DecorationSet::empty(self.revision));

        if self.state == SessionState::Uninitialized {
            return None;
        }
        let redraw = Cmd::Redraw {
            document_id: self.document_id,
        };
        if self.in_flight.is_some() {
            return Some(redraw);
        }
        Some(Cmd::batch(vec![redraw, self.start_job()]))
    }

    fn start_job(&mut self) -> Cmd {
        let bootstrap = self.state == SessionState::Bootstrapping;
        if !bootstrap {
            self.state = SessionState::Reparsing;
        }
        self.in_flight = Some(self.revision);

        Cmd::RunSyntaxParse(ParseJob {
            document_id: self.document_id,
            revision: self.revision,
            language: self.language,
            text: Arc::clone(&self.text),
            previous: self.previous_tree.take(),
            bootstrap,
            alive: Arc::clone(&self.alive),
        })
    }

    /// Drop the retained tree and parse the current text from scratch
    fn restart_full_parse(&mut self) -> Cmd {
        self.previous_tree = None;
        self.start_job()
    }

    fn disable(&mut self, reason: HighlightError) {
        if reason.is_recoverable() {
            tracing::debug!(
                "Highlighting disabled for doc={}: {}",
                self.document_id.0,
                reason
            );
        } else {
            tracing::error!(
                "Highlighting disabled for doc={} after unexpected error: {}",
                self.document_id.0,
                reason
            );
        }
        self.previous_tree = None;
        self.decorations = Arc::new(DecorationSet::empty(self.revision));
        self.disabled = Some(reason);
        self.state = SessionState::Ready;
    }

    /// Tear down the session. Results of jobs still in flight are dropped.
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        tracing::debug!("Disposing highlight session doc={}", self.document_id.0);
        self.alive.store(false, Ordering::Release);
        self.state = SessionState::Disposed;
        self.in_flight = None;
        self.previous_tree = None;
        self.decorations = Arc::new(DecorationSet::empty(self.revision));
    }

    /// Run every job `cmd` carries inline, feeding outcomes back until the
    /// session is idle. For synchronous hosts such as the CLI.
    ///
    /// Returns true if any update asked for a redraw.
    pub fn run_to_completion(&mut self, cmd: Cmd, engine: &HighlightEngine) -> bool {
        let mut redraw = cmd.needs_redraw();
        let mut jobs = cmd.into_jobs();
        while let Some(job) = jobs.pop() {
            let outcome = job.run(engine);
            if let Some(next) = self.update(SyntaxMsg::ParseCompleted(outcome)) {
                redraw |= next.needs_redraw();
                jobs.extend(next.into_jobs());
            }
        }
        redraw
    }
}

impl Drop for HighlightSession {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}
