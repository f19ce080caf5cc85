//! # Playback Loop
//!
//! Drives the cycle until cancelled:
//!
//! ```text
//! scan roots -> pick -> play -> record -> scan roots -> ...
//! ```
//!
//! Everything runs on one thread with at most one player child alive. A scan
//! that finds nothing ends the run with an error; cancellation ends it cleanly
//! and the interrupted file is not recorded.

use anyhow::{Context, Result};
use log::{error, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::candidates::{CandidateSet, Scanner};
use crate::ledger::Ledger;
use crate::player::{PlayOutcome, Player};
use crate::selector::Selector;
use crate::signal::CancelFlag;

/// What to do with a file the player failed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Count it as played so a broken file is not picked over and over
    #[default]
    Record,
    /// Leave it eligible for another attempt
    Retry,
}

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files that played to their end
    pub played: usize,
    /// Files the player failed on
    pub failed: usize,
}

/// The scan, pick, play, record cycle.
pub struct PlaybackLoop<'a, R> {
    roots: Vec<PathBuf>,
    scanner: &'a dyn Scanner,
    player: &'a mut dyn Player,
    selector: Selector<R>,
    ledger: Ledger,
    failure_policy: FailurePolicy,
    cancel: CancelFlag,
}

impl<'a, R: Rng> PlaybackLoop<'a, R> {
    pub fn new(
        roots: Vec<PathBuf>,
        scanner: &'a dyn Scanner,
        player: &'a mut dyn Player,
        selector: Selector<R>,
        ledger: Ledger,
        cancel: CancelFlag,
    ) -> Self {
        info!(
            "searching...\n\t{}",
            roots
                .iter()
                .map(|root| root.display().to_string())
                .collect::<Vec<_>>()
                .join("\n\t")
        );
        Self {
            roots,
            scanner,
            player,
            selector,
            ledger,
            failure_policy: FailurePolicy::default(),
            cancel,
        }
    }

    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn selector(&self) -> &Selector<R> {
        &self.selector
    }

    /// Run cycles until cancelled.
    ///
    /// # Errors
    ///
    /// Fails when a scan finds no candidates, when selection hits an internal
    /// invariant violation, when the ledger file can not be appended to, or
    /// when the player can not be started at all.
    pub fn run(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        while !self.cancel.is_cancelled() {
            let candidates = CandidateSet::refresh(self.scanner, &self.roots)?;
            let path = self
                .selector
                .pick(&candidates, &mut self.ledger)
                .context("Failed to pick the next file")?;
            if self.cancel.is_cancelled() {
                break;
            }

            match self.player.play(&path, &self.cancel)? {
                PlayOutcome::Finished => {
                    self.ledger.record(&path)?;
                    summary.played += 1;
                }
                PlayOutcome::Failed(reason) => {
                    error!("playing '{path}' failed: {reason}");
                    summary.failed += 1;
                    match self.failure_policy {
                        FailurePolicy::Record => self.ledger.record(&path)?,
                        FailurePolicy::Retry => warn!("'{path}' stays eligible for another attempt"),
                    }
                }
                PlayOutcome::Cancelled => {
                    info!("playback of '{path}' cancelled");
                    break;
                }
            }
        }

        info!(
            "exit ({} played, {} failed, mode {})",
            summary.played,
            summary.failed,
            self.selector.mode()
        );
        Ok(summary)
    }
}
