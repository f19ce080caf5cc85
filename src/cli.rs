//! # Command-Line Interface Module
//!
//! Defines the command line with Clap derive macros. There are no
//! subcommands: every invocation plays until interrupted, unless
//! `--completions` asks for a completion script instead.
//!
//! ## Examples
//!
//! ```bash
//! playrandom ~/Videos ~/Music
//! playrandom --fs --dark -V 60 --ledger ~/Videos
//! playrandom --completions bash > ~/.local/share/bash-completion/completions/playrandom
//! ```

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::ledger::DEFAULT_LEDGER_FILE;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
///
/// `-V` is taken by `--volume`, so `--version` is a plain long flag handled
/// in `main` rather than clap's generated one.
#[derive(Parser, Debug)]
#[command(name = "playrandom")]
#[command(about = "Find playable media files and play them one after another, newest first, then at random")]
pub struct Args {
    /// Directories to search for media files
    #[arg(value_name = "DIRECTORY", default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub directories: Vec<PathBuf>,

    /// Set additional flags for playing movies in a dark environment
    #[arg(long)]
    pub dark: bool,

    /// Start videos fullscreen
    #[arg(long = "fs")]
    pub fullscreen: bool,

    /// Set initial volume to <X> percent [default: 80]
    #[arg(short = 'V', long, value_name = "X", value_parser = clap::value_parser!(u32).range(0..=100))]
    pub volume: Option<u32>,

    /// Volume step [default: 3]
    #[arg(short = 's', long, value_name = "X")]
    pub volstep: Option<u32>,

    /// Print more stuff
    #[arg(short, long)]
    pub verbose: bool,

    /// Remember played files in FILE across runs
    ///
    /// Without a value the ledger is `.playrandoms` in the working directory.
    #[arg(
        long,
        value_name = "FILE",
        num_args = 0..=1,
        default_missing_value = DEFAULT_LEDGER_FILE,
        value_hint = clap::ValueHint::FilePath
    )]
    pub ledger: Option<PathBuf>,

    /// Rewrite the ledger file when old entries are evicted or cleared
    #[arg(long)]
    pub compact_ledger: bool,

    /// Leave files the player failed on eligible instead of marking them played
    #[arg(long)]
    pub retry_failed: bool,

    /// Player program to run
    #[arg(long, value_name = "PROGRAM", env = "PLAYRANDOM_PLAYER")]
    pub player: Option<String>,

    /// Seed for random selection, for reproducible runs
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Settings file to use instead of the default location
    #[arg(long, value_name = "FILE", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Print a completion script for SHELL and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,

    /// Print version and exit
    #[arg(long)]
    pub version: bool,
}
