//! # Integration Tests for playrandom
//!
//! Drives the library end to end: real directory scans in temporary
//! directories, a persisted ledger across simulated runs, and a scripted
//! player standing in for mplayer.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

use playrandom::candidates::{FsScanner, MIN_VIDEO_BYTES};
use playrandom::error::SelectionError;
use playrandom::ledger::Ledger;
use playrandom::playback::{FailurePolicy, PlaybackLoop, RunSummary};
use playrandom::player::{PlayOutcome, Player};
use playrandom::selector::{AgeSource, Mode, SelectionContext, Selector};
use playrandom::signal::CancelFlag;

/// Test helper to create a media tree with a few playable and unplayable files
fn create_media_tree() -> Result<TempDir> {
    let dir = TempDir::new()?;
    let make = |name: &str, size: u64| -> Result<()> {
        let path = dir.path().join(name);
        fs::create_dir_all(path.parent().unwrap())?;
        File::create(&path)?.set_len(size)?;
        Ok(())
    };

    make("music/one.mp3", 100)?;
    make("music/two.ogg", 100)?;
    make("movies/film.mkv", MIN_VIDEO_BYTES)?;
    make("movies/film-sample.mkv", MIN_VIDEO_BYTES)?;
    make("movies/tiny.mp4", 1024)?;
    make("docs/readme.txt", 100)?;
    Ok(dir)
}

/// Ages keyed by file name; anything unknown is a day old.
struct AgesByName(HashMap<&'static str, u64>);

impl AgeSource for AgesByName {
    fn age(&self, path: &str) -> Duration {
        let name = Path::new(path).file_name().and_then(|n| n.to_str()).unwrap_or("");
        Duration::from_secs(self.0.get(name).copied().unwrap_or(86_400))
    }
}

/// Finishes `plays` files, then cancels on the next one.
struct CountingPlayer {
    plays: usize,
    played: Vec<String>,
    outcome: PlayOutcome,
}

impl CountingPlayer {
    fn new(plays: usize) -> Self {
        Self {
            plays,
            played: Vec::new(),
            outcome: PlayOutcome::Finished,
        }
    }
}

impl Player for CountingPlayer {
    fn play(&mut self, path: &str, cancel: &CancelFlag) -> Result<PlayOutcome> {
        assert!(Path::new(path).is_absolute());
        assert!(Path::new(path).is_file(), "{path} should exist");
        if self.played.len() == self.plays {
            cancel.cancel();
            return Ok(PlayOutcome::Cancelled);
        }
        self.played.push(path.to_string());
        Ok(self.outcome.clone())
    }
}

fn selector(ages: &[(&'static str, u64)], seed: u64) -> Selector<StdRng> {
    Selector::with_age_source(
        StdRng::seed_from_u64(seed),
        SelectionContext::default(),
        Box::new(AgesByName(ages.iter().copied().collect())),
    )
}

fn run(
    root: &Path,
    player: &mut CountingPlayer,
    selector: Selector<StdRng>,
    ledger: Ledger,
    policy: FailurePolicy,
) -> Result<(RunSummary, Mode, usize)> {
    let scanner = FsScanner::new();
    let mut playback = PlaybackLoop::new(
        vec![root.to_path_buf()],
        &scanner,
        player,
        selector,
        ledger,
        CancelFlag::new(),
    )
    .with_failure_policy(policy);
    let summary = playback.run()?;
    Ok((summary, playback.selector().mode(), playback.ledger().len()))
}

fn names(paths: &[String]) -> Vec<String> {
    paths
        .iter()
        .map(|p| Path::new(p).file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[cfg(test)]
mod playback_tests {
    use super::*;

    #[test]
    fn test_new_files_play_newest_first_then_random() -> Result<()> {
        let media = create_media_tree()?;
        let mut player = CountingPlayer::new(3);
        let ages = [("two.ogg", 10), ("film.mkv", 120), ("one.mp3", 4000)];

        let (summary, mode, recorded) = run(
            media.path(),
            &mut player,
            selector(&ages, 3),
            Ledger::in_memory(),
            FailurePolicy::Record,
        )?;

        assert_eq!(summary.played, 3);
        // The interrupted fourth pick found everything played and cleared the ledger.
        assert_eq!(recorded, 0);
        assert_eq!(mode, Mode::Random);
        assert_eq!(names(&player.played), ["two.ogg", "film.mkv", "one.mp3"]);
        Ok(())
    }

    #[test]
    fn test_ledger_survives_restart() -> Result<()> {
        let media = create_media_tree()?;
        let state = TempDir::new()?;
        let ledger_file = state.path().join(".playrandoms");
        let ages = [("two.ogg", 10), ("film.mkv", 20), ("one.mp3", 30)];

        let mut first = CountingPlayer::new(2);
        run(media.path(), &mut first, selector(&ages, 1), Ledger::load(&ledger_file), FailurePolicy::Record)?;
        assert_eq!(names(&first.played), ["two.ogg", "film.mkv"]);

        // A fresh process starts in newest mode and skips what the file remembers.
        let mut second = CountingPlayer::new(1);
        let (_, mode, recorded) = run(
            media.path(),
            &mut second,
            selector(&ages, 1),
            Ledger::load(&ledger_file),
            FailurePolicy::Record,
        )?;
        assert_eq!(names(&second.played), ["one.mp3"]);
        assert_eq!(mode, Mode::Newest);
        // The interrupted pick had to evict two.ogg from memory; the file keeps it.
        assert_eq!(recorded, 2);

        let content = fs::read_to_string(&ledger_file)?;
        assert_eq!(content.lines().count(), 3);
        Ok(())
    }

    #[test]
    fn test_random_cycle_repeats_after_everything_played() -> Result<()> {
        let media = create_media_tree()?;
        let mut player = CountingPlayer::new(7);

        let (summary, mode, _) = run(
            media.path(),
            &mut player,
            selector(&[], 42),
            Ledger::in_memory(),
            FailurePolicy::Record,
        )?;

        assert_eq!(summary.played, 7);
        assert_eq!(mode, Mode::Random);
        let mut first_round = names(&player.played[..3]);
        first_round.sort();
        assert_eq!(first_round, ["film.mkv", "one.mp3", "two.ogg"]);
        Ok(())
    }

    #[test]
    fn test_retry_policy_leaves_failures_unrecorded() -> Result<()> {
        let media = create_media_tree()?;
        let mut player = CountingPlayer::new(2);
        player.outcome = PlayOutcome::Failed("decoder crashed".to_string());

        let (summary, _, recorded) = run(
            media.path(),
            &mut player,
            selector(&[], 9),
            Ledger::in_memory(),
            FailurePolicy::Retry,
        )?;

        assert_eq!(summary, RunSummary { played: 0, failed: 2 });
        assert_eq!(recorded, 0);
        Ok(())
    }

    #[test]
    fn test_empty_tree_is_fatal() -> Result<()> {
        let empty = TempDir::new()?;
        let mut player = CountingPlayer::new(1);

        let err = run(empty.path(), &mut player, selector(&[], 0), Ledger::in_memory(), FailurePolicy::Record)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SelectionError>(),
            Some(SelectionError::NoCandidates { .. })
        ));
        assert!(player.played.is_empty());
        Ok(())
    }

    #[test]
    fn test_ledger_file_with_spaces_is_honoured() -> Result<()> {
        let media = TempDir::new()?;
        let spaced = media.path().join("x y.mp3");
        let plain = media.path().join("z.mp3");
        File::create(&spaced)?;
        File::create(&plain)?;

        let ledger_file = media.path().join("history");
        fs::write(&ledger_file, format!("1700000000 {}\n", spaced.display()))?;

        let mut player = CountingPlayer::new(1);
        run(
            media.path(),
            &mut player,
            selector(&[("x y.mp3", 1), ("z.mp3", 2)], 0),
            Ledger::load(&ledger_file),
            FailurePolicy::Record,
        )?;
        assert_eq!(names(&player.played), ["z.mp3"]);
        Ok(())
    }
}

#[cfg(test)]
mod cli_tests {
    use clap::Parser;
    use playrandom::cli::Args;
    use playrandom::config::Settings;
    use std::path::PathBuf;

    #[test]
    fn test_cli_matches_settings() {
        let args = Args::try_parse_from([
            "playrandom", "--dark", "--fs", "-V", "30", "-s", "2", "--ledger", "/tmp/h", "/a", "/b",
        ])
        .unwrap();

        // With --ledger taking an optional value, /tmp/h is the ledger file.
        assert_eq!(args.directories, [PathBuf::from("/a"), PathBuf::from("/b")]);

        let settings = Settings::default().with_args(&args);
        let options = settings.player_options();
        assert!(options.dark && options.fullscreen);
        assert_eq!((options.volume, options.volstep), (30, 2));
        assert_eq!(settings.ledger_file, Some(PathBuf::from("/tmp/h")));
    }

    #[test]
    fn test_cli_help_mentions_core_options() {
        let err = Args::try_parse_from(["playrandom", "--help"]).unwrap_err();
        let help = err.to_string();
        assert!(help.contains("--volume"));
        assert!(help.contains("--ledger"));
        assert!(help.contains("--dark"));
    }
}
