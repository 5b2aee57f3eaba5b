//! Message types for the Elm-style architecture
//!
//! All highlight session state changes flow through these message types.

use std::sync::Arc;

use crate::syntax::{LanguageId, ParseOutcome};

/// Syntax highlighting messages delivered to a `HighlightSession`
#[derive(Debug, Clone)]
pub enum SyntaxMsg {
    /// The host document changed
    DocumentChanged {
        /// Full current text
        text: Arc<str>,
        /// False for structural no-ops (selection moves, re-layout)
        content_changed: bool,
    },
    /// A parse job has completed with results
    ParseCompleted(ParseOutcome),
    /// Language changed for the document (triggers a full parse)
    LanguageChanged(LanguageId),
}

// Convenience constructors for common messages
impl SyntaxMsg {
    /// Create a content edit message
    pub fn edit(text: impl Into<Arc<str>>) -> Self {
        SyntaxMsg::DocumentChanged {
            text: text.into(),
            content_changed: true,
        }
    }

    /// Create a change notification that did not alter the text
    pub fn no_op(text: impl Into<Arc<str>>) -> Self {
        SyntaxMsg::DocumentChanged {
            text: text.into(),
            content_changed: false,
        }
    }
}
