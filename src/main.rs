//! # playrandom
//!
//! Finds all playable media files below the given directories and plays one
//! after another with mplayer: the newest unplayed file first, random
//! unplayed files once nothing new is left. Runs until interrupted.
//!
//! ## Usage
//!
//! ```bash
//! # Play from the current directory
//! playrandom
//!
//! # Fullscreen movies in a dark room, history kept in ./.playrandoms
//! playrandom --fs --dark /srv/Videos --ledger
//!
//! # More logging
//! playrandom -v ~/Music
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use path_absolutize::Absolutize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io;
use std::path::PathBuf;

use playrandom::candidates::FsScanner;
use playrandom::cli::Args;
use playrandom::completion;
use playrandom::config::Settings;
use playrandom::ledger::Ledger;
use playrandom::playback::PlaybackLoop;
use playrandom::player::Mplayer;
use playrandom::selector::Selector;
use playrandom::signal;

/// Main entry point.
///
/// # Logging
///
/// Logs at `info` by default, `debug` with `-v`. `RUST_LOG` still wins:
/// - `RUST_LOG=playrandom::selector=debug playrandom` - Module-specific logging
///
/// # Exit Status
///
/// Zero after an interrupt, non-zero when nothing can be played or a fatal
/// error occurs.
fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
    debug!("{args:#?}");

    if args.version {
        println!("playrandom {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if let Some(shell) = args.completions {
        let mut cmd = Args::command();
        completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd, &mut io::stdout());
        return Ok(());
    }

    let settings = Settings::load(args.config.as_deref())?.with_args(&args);
    debug!("{settings:#?}");

    let roots = args
        .directories
        .iter()
        .map(|dir| {
            dir.absolutize()
                .map(|abs| abs.to_path_buf())
                .with_context(|| format!("Invalid directory {}", dir.display()))
        })
        .collect::<Result<Vec<PathBuf>>>()?;

    if let Some(history) = std::env::current_dir()
        .ok()
        .and_then(|cwd| settings.unbound_ledger(&cwd))
    {
        info!(
            "{} exists but is not used; pass --ledger to keep history across runs",
            history.display()
        );
    }

    let ledger = match &settings.ledger_file {
        Some(file) => Ledger::load(file),
        None => Ledger::in_memory(),
    }
    .with_compaction(settings.compact_on_evict);

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let selector = Selector::new(rng, settings.selection_context());

    let cancel = signal::install()?;
    let scanner = FsScanner::new();
    let mut player = Mplayer::new(settings.player.clone(), &settings.player_options());

    PlaybackLoop::new(roots, &scanner, &mut player, selector, ledger, cancel)
        .with_failure_policy(settings.failure_policy)
        .run()?;

    Ok(())
}
