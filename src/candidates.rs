//! # Candidate Discovery
//!
//! Finds the playable files under the configured roots. The result of every
//! refresh is a fresh [`CandidateSet`]; nothing is updated incrementally.
//!
//! ## Filter Rules
//!
//! - Audio: `mp3`, `ogg`, `wma`
//! - Video: `mpg`, `mpeg`, `avi`, `mov`, `m4v`, `mp4`, `wmv`, `flv`, `mkv`,
//!   at least 5 MiB and without `sample` anywhere in the path
//!
//! Extensions and the `sample` check are case-insensitive. Symbolic links are
//! followed. Order is whatever the directory walk yields.

use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{ScanFailure, SelectionError};
use crate::ledger::is_recordable;

pub const AUDIO_EXTENSIONS: [&str; 3] = ["mp3", "ogg", "wma"];
pub const VIDEO_EXTENSIONS: [&str; 9] = ["mpg", "mpeg", "avi", "mov", "m4v", "mp4", "wmv", "flv", "mkv"];

/// Smaller video files are usually trailers or broken downloads.
pub const MIN_VIDEO_BYTES: u64 = 5 * 1024 * 1024;

lazy_static::lazy_static! {
    static ref AUDIO: HashSet<&'static str> = AUDIO_EXTENSIONS.into_iter().collect();
    static ref VIDEO: HashSet<&'static str> = VIDEO_EXTENSIONS.into_iter().collect();
}

/// Source of candidate files.
pub trait Scanner {
    /// Scan `roots` for playable files.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanFailure`] when parts of the tree could not be read. The
    /// failure still carries every file that was found.
    fn scan(&self, roots: &[PathBuf]) -> Result<Vec<String>, ScanFailure>;
}

/// Walks the filesystem with [`walkdir`].
#[derive(Debug, Default)]
pub struct FsScanner;

impl FsScanner {
    pub fn new() -> Self {
        info!("audio extensions: {AUDIO_EXTENSIONS:?}");
        info!("video extensions: {VIDEO_EXTENSIONS:?}");
        Self
    }
}

impl Scanner for FsScanner {
    fn scan(&self, roots: &[PathBuf]) -> Result<Vec<String>, ScanFailure> {
        let mut files = Vec::new();
        let mut errors = Vec::new();

        for root in roots {
            debug!("scanning {}", root.display());
            for entry in WalkDir::new(root).follow_links(true) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        errors.push(e.to_string());
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }

                let path = entry.path();
                let Some(kind) = classify(path) else {
                    continue;
                };
                if kind == MediaKind::Video && !acceptable_video(path) {
                    continue;
                }

                match path.to_str() {
                    Some(path) if is_recordable(path) => files.push(path.to_string()),
                    Some(path) => warn!("skipping path with a line break {path:?}"),
                    None => warn!("skipping non UTF-8 path {}", path.display()),
                }
            }
        }

        if errors.is_empty() {
            Ok(files)
        } else {
            Err(ScanFailure {
                errors,
                partial: files,
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaKind {
    Audio,
    Video,
}

fn classify(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if AUDIO.contains(ext.as_str()) {
        Some(MediaKind::Audio)
    } else if VIDEO.contains(ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

fn acceptable_video(path: &Path) -> bool {
    if path.to_string_lossy().to_lowercase().contains("sample") {
        return false;
    }
    // fs::metadata follows symlinks, matching the walk
    fs::metadata(path).is_ok_and(|meta| meta.len() >= MIN_VIDEO_BYTES)
}

/// The files eligible for selection in one cycle. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    paths: Vec<String>,
}

impl CandidateSet {
    /// Wrap a list of paths, rejecting an empty one.
    pub fn new(paths: Vec<String>, roots: &[PathBuf]) -> Result<Self, SelectionError> {
        if paths.is_empty() {
            return Err(SelectionError::NoCandidates {
                roots: roots.to_vec(),
            });
        }
        Ok(Self { paths })
    }

    /// Rescan `roots`. A failed scan is logged and its partial output used.
    pub fn refresh(scanner: &dyn Scanner, roots: &[PathBuf]) -> Result<Self, SelectionError> {
        let paths = match scanner.scan(roots) {
            Ok(paths) => paths,
            Err(failure) => {
                error!("{failure}");
                failure.partial
            }
        };
        debug!("found {} candidates", paths.len());
        Self::new(paths, roots)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the set holds no files.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.paths
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.paths.iter()
    }
}
