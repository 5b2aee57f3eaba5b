//! Background parse worker
//!
//! Runs [`ParseJob`]s on a dedicated thread so the host's update loop never
//! blocks on parsing. Outcomes are sent back over a channel and should be
//! fed to the owning session as `SyntaxMsg::ParseCompleted`.

use std::io;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use super::engine::HighlightEngine;
use super::session::{ParseJob, ParseOutcome};
use crate::commands::Cmd;

pub struct SyntaxWorker {
    jobs: Option<Sender<ParseJob>>,
    handle: Option<JoinHandle<()>>,
}

impl SyntaxWorker {
    /// Spawn a worker with its own result channel
    pub fn spawn(engine: Arc<HighlightEngine>) -> io::Result<(Self, Receiver<ParseOutcome>)> {
        let (tx, rx) = mpsc::channel();
        let worker = Self::spawn_with_sender(engine, tx)?;
        Ok((worker, rx))
    }

    /// Spawn a worker that reports into an existing channel
    pub fn spawn_with_sender(
        engine: Arc<HighlightEngine>,
        results: Sender<ParseOutcome>,
    ) -> io::Result<Self> {
        let (jobs_tx, jobs_rx) = mpsc::channel::<ParseJob>();

        let handle = std::thread::Builder::new()
            .name("syntax-worker".into())
            .spawn(move || {
                tracing::debug!("Syntax worker started");
                for job in jobs_rx {
                    if !job.is_alive() {
                        tracing::trace!(
                            "Skipping parse for disposed doc={}",
                            job.document_id.0
                        );
                        continue;
                    }

                    let alive = job.liveness();
                    let outcome = job.run(&engine);

                    // Session went away while we were parsing
                    if !alive.load(Ordering::Acquire) {
                        tracing::trace!(
                            "Dropping parse result for disposed doc={}",
                            outcome.document_id.0
                        );
                        continue;
                    }
                    if results.send(outcome).is_err() {
                        tracing::debug!("Result receiver closed, stopping syntax worker");
                        break;
                    }
                }
                tracing::debug!("Syntax worker stopped");
            })?;

        Ok(Self {
            jobs: Some(jobs_tx),
            handle: Some(handle),
        })
    }

    /// Queue a job. Returns false if the worker has shut down.
    pub fn submit(&self, job: ParseJob) -> bool {
        match &self.jobs {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        }
    }

    /// Queue every job carried by `cmd`; returns true if the command also
    /// asked for a redraw
    pub fn process_cmd(&self, cmd: Cmd) -> bool {
        let redraw = cmd.needs_redraw();
        for job in cmd.into_jobs() {
            if !self.submit(job) {
                tracing::warn!("Syntax worker is gone, parse job dropped");
            }
        }
        redraw
    }
}

impl Drop for SyntaxWorker {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Syntax worker panicked");
            }
        }
    }
}
