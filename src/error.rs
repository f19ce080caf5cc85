//! Domain errors for candidate discovery and file selection.
//!
//! Everything else in the crate reports through `anyhow`; these two cases are
//! typed so the playback loop and the tests can tell them apart.

use std::path::PathBuf;
use thiserror::Error;

/// Failures that end a selection cycle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// The scan produced nothing to play.
    #[error("no suitable files found in {}", display_roots(.roots))]
    NoCandidates { roots: Vec<PathBuf> },

    /// Every candidate was already played and the ledger had nothing left to evict.
    #[error("can not remove entries from an empty ledger")]
    EmptyLedgerEviction,
}

/// The scanner hit errors while walking the roots.
///
/// `partial` holds whatever was found before and after the failures; it is
/// still a usable result set.
#[derive(Debug, Error)]
#[error("scan finished with {} error(s): {}", .errors.len(), .errors.join("; "))]
pub struct ScanFailure {
    pub errors: Vec<String>,
    pub partial: Vec<String>,
}

fn display_roots(roots: &[PathBuf]) -> String {
    roots
        .iter()
        .map(|root| root.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_candidates_lists_roots() {
        let err = SelectionError::NoCandidates {
            roots: vec![PathBuf::from("/media/a"), PathBuf::from("/media/b")],
        };
        assert_eq!(err.to_string(), "no suitable files found in /media/a, /media/b");
    }

    #[test]
    fn test_scan_failure_message_counts_errors() {
        let failure = ScanFailure {
            errors: vec!["permission denied".to_string()],
            partial: vec!["/media/a.mp3".to_string()],
        };
        assert!(failure.to_string().starts_with("scan finished with 1 error(s)"));
    }
}
