//! # Recency Ledger
//!
//! Ordered record of played files. Membership is answered from a hash map of
//! path counts so `contains` stays O(1) while the ordered log is kept for
//! eviction and persistence.
//!
//! ## File Format
//!
//! When bound to a file, every [`Ledger::record`] appends one line:
//!
//! ```text
//! 1700000000 /media/videos/some file.mp4
//! ```
//!
//! The timestamp is whole unix seconds, followed by a single space and the path
//! verbatim (spaces included). Only the first space separates the fields.
//! Paths containing a line break can not be represented and are refused.
//!
//! Eviction and clearing only touch memory unless compaction is enabled, in
//! which case the file is rewritten to match.

use anyhow::{anyhow, Context, Result};
use log::{debug, info, warn};
use std::collections::{HashMap, VecDeque};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;

use crate::error::SelectionError;

/// Conventional ledger file name, relative to the working directory.
pub const DEFAULT_LEDGER_FILE: &str = ".playrandoms";

/// Whether `path` can be stored as a single ledger line.
pub fn is_recordable(path: &str) -> bool {
    !path.contains(['\n', '\r'])
}

/// One played file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Unix timestamp (seconds) of when playback finished
    pub played_at: u64,
    pub path: String,
}

impl LedgerEntry {
    fn to_line(&self) -> String {
        format!("{} {}\n", self.played_at, self.path)
    }

    fn parse(line: &str) -> Result<Self> {
        let (stamp, path) = line
            .split_once(' ')
            .ok_or_else(|| anyhow!("missing separator in ledger line {line:?}"))?;
        let played_at = stamp
            .parse::<u64>()
            .with_context(|| format!("invalid timestamp {stamp:?}"))?;
        if path.is_empty() {
            return Err(anyhow!("empty path in ledger line {line:?}"));
        }
        Ok(Self {
            played_at,
            path: path.to_string(),
        })
    }
}

/// Append-only history of played files, optionally persisted.
#[derive(Debug, Default)]
pub struct Ledger {
    entries: VecDeque<LedgerEntry>,
    counts: HashMap<String, usize>,
    file: Option<PathBuf>,
    compact_on_evict: bool,
    /// The file ends in a partial line that could not be truncated.
    unterminated: bool,
}

impl Ledger {
    /// A ledger that lives in memory only.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Bind the ledger to `file` and load whatever history it holds.
    ///
    /// Never fails: a missing file gives an empty ledger, an unreadable or
    /// corrupt one gives an empty ledger plus a warning. The binding holds in
    /// every case, so new plays are still appended.
    pub fn load(file: impl Into<PathBuf>) -> Self {
        Self::load_with(file.into(), truncate)
    }

    fn load_with(file: PathBuf, repair: impl FnOnce(&Path, u64) -> Result<()>) -> Self {
        let mut ledger = Self {
            file: Some(file.clone()),
            ..Self::default()
        };

        match read_entries(&file, repair) {
            Ok(loaded) => {
                for entry in loaded.entries {
                    ledger.push(entry);
                }
                ledger.unterminated = loaded.unterminated;
                info!("loaded ledger {} with {} entries", file.display(), ledger.len());
            }
            Err(e) if is_not_found(&e) => {
                debug!("no ledger found at {}", file.display());
            }
            Err(e) => {
                warn!("could not load {}: {e:#}. ledger starts empty.", file.display());
            }
        }

        ledger
    }

    /// Rewrite the persisted file whenever eviction or clearing shrinks memory.
    #[must_use]
    pub fn with_compaction(mut self, enabled: bool) -> Self {
        self.compact_on_evict = enabled;
        self
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.counts.contains_key(path)
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    /// Record `path` as played now.
    ///
    /// The line hits the file before memory is touched, so after a crash the
    /// file is never behind the in-memory view.
    ///
    /// # Errors
    ///
    /// Fails for paths containing a line break and when the bound file can
    /// not be appended to.
    pub fn record(&mut self, path: &str) -> Result<()> {
        if !is_recordable(path) {
            return Err(anyhow!("refusing to record path with a line break: {path:?}"));
        }
        let entry = LedgerEntry {
            played_at: unix_now(),
            path: path.to_string(),
        };

        if let Some(file) = &self.file {
            let mut line = entry.to_line();
            if self.unterminated {
                line.insert(0, '\n');
            }
            append_line(file, &line)
                .with_context(|| format!("Failed to append to ledger {}", file.display()))?;
            self.unterminated = false;
        }

        debug!("recorded {path}");
        self.push(entry);
        Ok(())
    }

    /// Drop the oldest `max(1, floor(len * fraction))` entries.
    ///
    /// Returns how many entries were removed.
    pub fn evict_oldest(&mut self, fraction: f64) -> Result<usize, SelectionError> {
        if self.entries.is_empty() {
            return Err(SelectionError::EmptyLedgerEviction);
        }

        let len = self.entries.len();
        let count = ((len as f64 * fraction).floor() as usize).clamp(1, len);
        for _ in 0..count {
            if let Some(entry) = self.entries.pop_front() {
                self.forget(&entry.path);
            }
        }

        warn!("evicted {count} oldest ledger entries, {} remain", self.entries.len());
        self.compact_if_enabled();
        Ok(count)
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.counts.clear();
        self.compact_if_enabled();
    }

    /// Rewrite the bound file so it holds exactly the in-memory entries.
    ///
    /// The new content goes to a temporary file in the same directory which is
    /// then renamed over the old one.
    pub fn compact(&mut self) -> Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };

        let dir = match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to create temporary ledger in {}", dir.display()))?;
        for entry in &self.entries {
            tmp.write_all(entry.to_line().as_bytes())?;
        }
        tmp.as_file().sync_data()?;
        tmp.persist(file)
            .with_context(|| format!("Failed to replace ledger {}", file.display()))?;

        debug!("compacted {} to {} entries", file.display(), self.entries.len());
        self.unterminated = false;
        Ok(())
    }

    fn compact_if_enabled(&mut self) {
        if self.compact_on_evict {
            if let Err(e) = self.compact() {
                warn!("ledger compaction failed, file keeps stale entries: {e:#}");
            }
        }
    }

    fn push(&mut self, entry: LedgerEntry) {
        *self.counts.entry(entry.path.clone()).or_insert(0) += 1;
        self.entries.push_back(entry);
    }

    fn forget(&mut self, path: &str) {
        if let Some(count) = self.counts.get_mut(path) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(path);
            }
        }
    }
}

struct Loaded {
    entries: Vec<LedgerEntry>,
    unterminated: bool,
}

/// Parse the ledger file. A trailing line without a newline is a write cut
/// short by a crash: it is ignored and, through `repair`, truncated away.
fn read_entries(file: &Path, repair: impl FnOnce(&Path, u64) -> Result<()>) -> Result<Loaded> {
    let content = fs::read_to_string(file)?;
    let mut unterminated = false;

    let complete = match content.rfind('\n') {
        Some(idx) => idx + 1,
        None => 0,
    };
    if complete < content.len() {
        warn!(
            "ignoring partial last line in {}: {:?}",
            file.display(),
            &content[complete..]
        );
        if let Err(e) = repair(file, complete as u64) {
            warn!("{e:#}. the next entry starts on a fresh line.");
            unterminated = true;
        }
    }

    let entries = content[..complete]
        .lines()
        .filter(|line| !line.is_empty())
        .map(LedgerEntry::parse)
        .collect::<Result<_>>()?;
    Ok(Loaded {
        entries,
        unterminated,
    })
}

fn truncate(file: &Path, len: u64) -> Result<()> {
    OpenOptions::new()
        .write(true)
        .open(file)
        .and_then(|f| f.set_len(len))
        .with_context(|| format!("Failed to truncate partial line in {}", file.display()))
}

fn append_line(file: &Path, line: &str) -> io::Result<()> {
    let mut out = OpenOptions::new().create(true).append(true).open(file)?;
    // One write per line keeps a concurrent reader or a crash from seeing half an entry.
    out.write_all(line.as_bytes())?;
    out.sync_data()
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
