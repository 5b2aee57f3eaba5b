//! Commands returned by highlight session updates
//!
//! Commands are side effects the host performs after an update: running a
//! parse job (on the worker thread or inline) or repainting a document.

use crate::syntax::{DocumentId, ParseJob};

/// Side effects requested by a session update
#[derive(Debug)]
pub enum Cmd {
    /// No command
    None,
    /// Repaint the document with the session's current decorations
    Redraw { document_id: DocumentId },
    /// Run a parse job off the update loop.
    /// Its outcome comes back as `SyntaxMsg::ParseCompleted`.
    RunSyntaxParse(ParseJob),
    /// Multiple commands
    Batch(Vec<Cmd>),
}

impl Cmd {
    /// Create a batch of commands
    pub fn batch(cmds: Vec<Cmd>) -> Self {
        Cmd::Batch(cmds)
    }

    /// Check if this command requires a redraw
    pub fn needs_redraw(&self) -> bool {
        match self {
            Cmd::None => false,
            Cmd::Redraw { .. } => true,
            // Parse jobs don't need immediate redraw - ParseCompleted triggers redraw
            Cmd::RunSyntaxParse(_) => false,
            Cmd::Batch(cmds) => cmds.iter().any(|c| c.needs_redraw()),
        }
    }

    /// Flatten into the parse jobs this command carries
    pub fn into_jobs(self) -> Vec<ParseJob> {
        match self {
            Cmd::RunSyntaxParse(job) => vec![job],
            Cmd::Batch(cmds) => cmds.into_iter().flat_map(Cmd::into_jobs).collect(),
            Cmd::None | Cmd::Redraw { .. } => Vec::new(),
        }
    }
}
