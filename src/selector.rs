//! # File Selection
//!
//! Picks the next file to play from a [`CandidateSet`], steering around
//! everything in the [`Ledger`].
//!
//! ## Modes
//!
//! - [`Mode::Newest`] (initial): play the youngest unplayed file. When even
//!   that file is older than the threshold there is nothing new left, so the
//!   selector switches to random mode for the rest of the process.
//! - [`Mode::Random`]: uniform choice among unplayed files. When everything
//!   was played the ledger is cleared and the whole set is eligible again.
//!
//! The only transition is `Newest -> Random`, taken inside [`Selector::pick`].

use log::{debug, info, warn};
use rand::Rng;
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::time::{Duration, SystemTime};

use crate::candidates::CandidateSet;
use crate::error::SelectionError;
use crate::ledger::Ledger;

/// Age given to files whose metadata can not be read; sorts them last.
pub const UNKNOWN_AGE: Duration = Duration::from_secs(999_999_999);

/// Selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Newest,
    Random,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Newest => f.write_str("newest"),
            Mode::Random => f.write_str("random"),
        }
    }
}

/// Tunables for the selector.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext {
    /// A newest pick older than this means nothing new is left
    pub newest_threshold: Duration,
    /// Share of the ledger dropped when every candidate was already played
    pub eviction_fraction: f64,
}

impl Default for SelectionContext {
    fn default() -> Self {
        Self {
            newest_threshold: Duration::from_secs(600),
            eviction_fraction: 0.1,
        }
    }
}

/// How old a file is.
pub trait AgeSource: Sync {
    fn age(&self, path: &str) -> Duration;
}

/// Age from the file's status-change time (creation time where that is not
/// available).
#[derive(Debug, Default, Clone, Copy)]
pub struct FsAge;

impl AgeSource for FsAge {
    fn age(&self, path: &str) -> Duration {
        let Some(changed) = changed_at(path) else {
            return UNKNOWN_AGE;
        };
        // A timestamp in the future counts as brand new.
        SystemTime::now()
            .duration_since(changed)
            .unwrap_or(Duration::ZERO)
    }
}

#[cfg(unix)]
fn changed_at(path: &str) -> Option<SystemTime> {
    use std::os::unix::fs::MetadataExt;

    let meta = fs::metadata(path).ok()?;
    let secs = u64::try_from(meta.ctime()).ok()?;
    let nanos = u32::try_from(meta.ctime_nsec()).unwrap_or(0);
    Some(SystemTime::UNIX_EPOCH + Duration::new(secs, nanos))
}

#[cfg(not(unix))]
fn changed_at(path: &str) -> Option<SystemTime> {
    let meta = fs::metadata(path).ok()?;
    meta.created().or_else(|_| meta.modified()).ok()
}

/// Stateful picker; owns its random source so runs can be reproduced.
pub struct Selector<R> {
    mode: Mode,
    rng: R,
    ages: Box<dyn AgeSource>,
    context: SelectionContext,
}

impl<R: Rng> Selector<R> {
    /// Selector in newest mode, aging files from filesystem metadata.
    pub fn new(rng: R, context: SelectionContext) -> Self {
        Self::with_age_source(rng, context, Box::new(FsAge))
    }

    pub fn with_age_source(rng: R, context: SelectionContext, ages: Box<dyn AgeSource>) -> Self {
        Self {
            mode: Mode::Newest,
            rng,
            ages,
            context,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Choose the next file. The result is always a member of `candidates`.
    ///
    /// # Errors
    ///
    /// [`SelectionError::EmptyLedgerEviction`] if every candidate counts as
    /// played yet the ledger is empty, which a non-empty candidate set rules out.
    pub fn pick(&mut self, candidates: &CandidateSet, ledger: &mut Ledger) -> Result<String, SelectionError> {
        match self.mode {
            Mode::Newest => self.newest_pick(candidates, ledger),
            Mode::Random => Ok(self.random_pick(candidates, ledger)),
        }
    }

    fn random_pick(&mut self, candidates: &CandidateSet, ledger: &mut Ledger) -> String {
        info!(
            "*** choosing randomly from {} files ({} played = {:4.1}%)",
            candidates.len(),
            ledger.len(),
            played_percent(candidates, ledger)
        );

        let mut unplayed = unplayed_files(candidates, ledger);
        if unplayed.is_empty() {
            info!(
                "played all {} items in list. clearing ledger to start over again.",
                candidates.len()
            );
            ledger.clear();
            unplayed = candidates.iter().collect();
        }

        let idx = self.rng.gen_range(0..unplayed.len());
        unplayed[idx].clone()
    }

    fn newest_pick(&mut self, candidates: &CandidateSet, ledger: &mut Ledger) -> Result<String, SelectionError> {
        info!(
            "*** choosing latest from {} files ({} played = {:4.1}%)",
            candidates.len(),
            ledger.len(),
            played_percent(candidates, ledger)
        );

        let mut unplayed = unplayed_files(candidates, ledger);
        while unplayed.is_empty() {
            warn!("no file found that is not in the ledger! shifting out oldest entries...");
            ledger.evict_oldest(self.context.eviction_fraction)?;
            unplayed = unplayed_files(candidates, ledger);
        }

        let ages: Vec<Duration> = unplayed
            .par_iter()
            .map(|path| self.ages.age(path))
            .collect();

        // Strictly-less keeps the first of equally old files.
        let mut newest = 0;
        for (idx, age) in ages.iter().enumerate().skip(1) {
            if *age < ages[newest] {
                newest = idx;
            }
        }
        let age = ages[newest];
        let chosen = unplayed[newest];

        debug!("latest file is {chosen} (age {} sec)", age.as_secs());

        if age > self.context.newest_threshold {
            info!("newest file is {} sec old. switching to random mode.", age.as_secs());
            self.mode = Mode::Random;
            return Ok(self.random_pick(candidates, ledger));
        }

        Ok(chosen.clone())
    }
}

fn unplayed_files<'a>(candidates: &'a CandidateSet, ledger: &Ledger) -> Vec<&'a String> {
    candidates.iter().filter(|path| !ledger.contains(path)).collect()
}

fn played_percent(candidates: &CandidateSet, ledger: &Ledger) -> f64 {
    100.0 * ledger.len() as f64 / candidates.len() as f64
}
