//! Session Client
//!
//! Thin wrapper around the [`ChatController`] for TUI integration.
//!
//! # Architecture
//!
//! The TUI is a "thin client" - it doesn't contain any session logic.
//! The controller decides what happens; this client only runs the network
//! half of each operation off the event loop:
//! 1. Forward a key action to the controller
//! 2. Spawn the returned job on the runtime
//! 3. Receive the outcome over a channel
//! 4. Hand it back to the controller on the event loop

use tokio::sync::mpsc;

use delphi_core::{ChatController, Job, Outcome};

/// Capacity of the outcome channel
const OUTCOME_CHANNEL_SIZE: usize = 16;

/// Client that drives a [`ChatController`] from the event loop
pub struct SessionClient {
    /// The session state
    controller: ChatController,
    /// Handed to spawned jobs
    tx: mpsc::Sender<Outcome>,
    /// Outcomes of finished jobs
    rx: mpsc::Receiver<Outcome>,
}

impl SessionClient {
    /// Wrap a controller
    pub fn new(controller: ChatController) -> Self {
        let (tx, rx) = mpsc::channel(OUTCOME_CHANNEL_SIZE);
        Self { controller, tx, rx }
    }

    /// Read-only view for rendering
    pub fn controller(&self) -> &ChatController {
        &self.controller
    }

    /// Select a roster entry (`None` clears the selection)
    pub fn select_user(&mut self, index: Option<usize>) {
        let job = self.controller.select_user(index);
        self.spawn(job);
    }

    /// Step the roster cursor through `[none, users...]`
    pub fn cycle_highlight(&mut self, forward: bool) {
        self.controller.cycle_highlight(forward);
    }

    /// Select the entry under the roster cursor
    pub fn commit_highlight(&mut self) {
        let job = self.controller.commit_highlight();
        self.spawn(job);
    }

    /// Submit the input line
    pub fn submit(&mut self) {
        let job = self.controller.submit();
        self.spawn(job);
    }

    /// Type a character into the input line
    pub fn push_input(&mut self, c: char) {
        self.controller.push_input(c);
    }

    /// Delete the last input character
    pub fn backspace(&mut self) {
        self.controller.backspace();
    }

    /// Wait for the next finished job
    pub async fn next_outcome(&mut self) -> Option<Outcome> {
        self.rx.recv().await
    }

    /// Receive all pending outcomes (non-blocking)
    pub fn recv_all(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.rx.try_recv() {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Apply an outcome; `false` if it was stale
    pub fn apply(&mut self, outcome: Outcome) -> bool {
        self.controller.apply(outcome)
    }

    /// Apply everything that has arrived, returning how many were current
    pub fn apply_pending(&mut self) -> usize {
        let outcomes = self.recv_all();
        outcomes
            .into_iter()
            .map(|outcome| self.controller.apply(outcome))
            .filter(|applied| *applied)
            .count()
    }

    fn spawn(&self, job: Option<Job>) {
        let Some(job) = job else {
            return;
        };

        tracing::debug!(epoch = job.epoch(), send = job.is_send(), "spawning job");
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = job.run().await;
            if tx.send(outcome).await.is_err() {
                tracing::debug!("session closed before job finished");
            }
        });
    }
}
