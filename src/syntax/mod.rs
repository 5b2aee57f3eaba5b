//! Syntax highlighting module
//!
//! Provides tree-sitter based syntax highlighting with:
//! - A grammar catalog mapping languages to grammar artifacts
//! - Lazy, single-flight grammar loading and parser construction
//! - Incremental reparsing against the previous tree
//! - Highlight query evaluation and decoration compilation
//! - Per-document sessions driven by a background worker
//!
//! ## Architecture
//!
//! ```text
//! Document Edit → SyntaxMsg::DocumentChanged → Cmd::RunSyntaxParse
//!              → (worker thread) ParseJob::run → SyntaxMsg::ParseCompleted
//!              → Cmd::Redraw
//! ```
//!
//! Results for a revision older than the session's current one are
//! discarded, and their tree seeds the next incremental parse.

mod catalog;
mod engine;
mod error;
mod highlights;
mod languages;
mod parser;
mod query;
mod runtime;
mod session;
mod worker;

pub use catalog::{GrammarArtifact, GrammarCatalog, BUNDLED_SCHEME};
pub use engine::{HighlightEngine, Highlighted};
pub use error::HighlightError;
pub use highlights::{
    Decoration, DecorationSet, HighlightRange, RangeCompiler, DEFAULT_CLASS_PREFIX,
};
pub use languages::LanguageId;
pub use parser::{ParserRuntime, SharedParser};
pub use query::{highlight_query_source, Capture, CompiledQuery, HighlightQueryEngine};
pub use runtime::{BundledRuntime, Grammar, GrammarRuntime, SyntaxTree};
pub use session::{DocumentId, HighlightSession, ParseJob, ParseOutcome, SessionState};
pub use worker::SyntaxWorker;
