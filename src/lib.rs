//! hilite - incremental tree-sitter syntax highlighting
//!
//! This crate turns source text into sorted, styled byte ranges and keeps
//! them in sync with edits. Per-document sessions follow the Elm
//! Architecture pattern: messages in, commands out.

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod messages;
pub mod syntax;
pub mod tracing;

// Re-export commonly used types
pub use commands::Cmd;
pub use config::HighlightConfig;
pub use messages::SyntaxMsg;
pub use syntax::{DecorationSet, HighlightEngine, HighlightError, HighlightSession, LanguageId};
