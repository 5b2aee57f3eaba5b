//! Command-line argument parsing for the highlighter
//!
//! Supports:
//! - Highlighting a file (text or JSON output)
//! - Listing supported languages
//! - Checking that every grammar loads and every query compiles

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::config::HighlightConfig;
use crate::syntax::{DecorationSet, LanguageId};

/// Longest source excerpt shown per range in text output
const EXCERPT_CHARS: usize = 40;

/// Incremental tree-sitter syntax highlighter
#[derive(Parser, Debug)]
#[command(name = "hilite", version, about = "Incremental tree-sitter syntax highlighter")]
pub struct CliArgs {
    /// Config file to use instead of ~/.config/hilite/config.yaml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the decorations computed for a file
    Highlight {
        /// File to highlight
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Language name, overriding detection from the file extension
        #[arg(short, long, value_name = "NAME")]
        language: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List supported languages and their grammar artifacts
    Languages,
    /// Load every grammar and compile every highlight query
    Check,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Pick the language for `path`: an explicit name wins, then config
/// associations and the extension table.
pub fn resolve_language(
    path: &Path,
    explicit: Option<&str>,
    config: &HighlightConfig,
) -> Result<LanguageId, String> {
    if let Some(name) = explicit {
        return LanguageId::from_name(name).map_err(|e| e.to_string());
    }
    config.language_for_path(path).ok_or_else(|| {
        format!(
            "No highlighting for {} (use --language to pick one)",
            path.display()
        )
    })
}

/// One line per range: `from..to<TAB>class<TAB>excerpt`
pub fn render_text(set: &DecorationSet, source: &str) -> String {
    let mut out = String::new();
    for range in set.ranges() {
        let excerpt: String = source
            .get(range.from..range.to)
            .unwrap_or_default()
            .chars()
            .take(EXCERPT_CHARS)
            .flat_map(char::escape_debug)
            .collect();
        let _ = writeln!(out, "{}..{}\t{}\t{}", range.from, range.to, range.class(), excerpt);
    }
    out
}
