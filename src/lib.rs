//! Endless media rotation: play the newest unplayed file, and once nothing new
//! is left, random unplayed files, until interrupted.
//!
//! Core modules:
//! - [`ledger`] - Persistent record of played files
//! - [`candidates`] - Discovery of playable files
//! - [`selector`] - Newest/random selection state machine
//! - [`playback`] - The scan, pick, play, record loop
//!
//! ### Supporting Modules
//!
//! - [`player`] - External player process handling
//! - [`signal`] - Cooperative cancellation on SIGINT/SIGTERM
//! - [`config`] - Settings file and defaults
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//! - [`error`] - Typed selection errors
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use playrandom::candidates::FsScanner;
//! use playrandom::ledger::Ledger;
//! use playrandom::playback::PlaybackLoop;
//! use playrandom::player::{Mplayer, PlayerOptions};
//! use playrandom::selector::{SelectionContext, Selector};
//! use playrandom::signal;
//! use rand::SeedableRng;
//!
//! let scanner = FsScanner::new();
//! let mut player = Mplayer::new("mplayer", &PlayerOptions::default());
//! let selector = Selector::new(rand::rngs::StdRng::from_entropy(), SelectionContext::default());
//! let ledger = Ledger::load(".playrandoms");
//!
//! let mut playback = PlaybackLoop::new(
//!     vec!["/home/me/Videos".into()],
//!     &scanner,
//!     &mut player,
//!     selector,
//!     ledger,
//!     signal::install()?,
//! );
//! let summary = playback.run()?;
//! println!("played {} files", summary.played);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Selection Details
//!
//! ### Newest Mode
//! - Ages every unplayed candidate by its status-change time
//! - Picks the youngest; ties go to the earlier candidate
//! - If every candidate was played, evicts the oldest tenth of the ledger first
//! - If the youngest file is older than ten minutes, switches to random mode for good
//!
//! ### Random Mode
//! - Uniform choice among unplayed candidates
//! - Once everything was played the ledger is cleared and the cycle restarts
//!
//! ## Error Handling
//!
//! Application code returns `anyhow::Result`. Selection failures are typed
//! ([`error::SelectionError`]) so they can be matched after downcasting.

pub mod candidates;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod ledger;
pub mod playback;
pub mod player;
pub mod selector;
pub mod signal;
