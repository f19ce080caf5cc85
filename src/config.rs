//! # Configuration Module
//!
//! Optional settings file plus the defaults used when it is absent.
//!
//! ## Settings File
//!
//! Looked up in the platform-standard configuration directory:
//! - Linux: `~/.config/playrandom/config.json`
//! - macOS: `~/Library/Application Support/playrandom/config.json`
//! - Windows: `%APPDATA%\playrandom\config.json`
//!
//! Every field is optional:
//!
//! ```json
//! {
//!   "player": "mplayer",
//!   "volume": 80,
//!   "volstep": 3,
//!   "fullscreen": false,
//!   "dark": false,
//!   "ledger_file": "/home/me/Videos/.playrandoms",
//!   "compact_on_evict": false,
//!   "failure_policy": "record",
//!   "newest_threshold_secs": 600,
//!   "eviction_fraction": 0.1
//! }
//! ```
//!
//! Command-line options override whatever the file says.

use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Args;
use crate::ledger::DEFAULT_LEDGER_FILE;
use crate::playback::FailurePolicy;
use crate::player::PlayerOptions;
use crate::selector::SelectionContext;

/// Returns the platform-appropriate settings file path.
///
/// Unlike a data directory nothing is created here: a missing settings file
/// simply means defaults.
///
/// # Errors
///
/// Fails when the system configuration directory can not be determined.
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        anyhow!("Could not determine system config directory. Please pass --config explicitly.")
    })?;

    Ok(config_dir.join("playrandom").join("config.json"))
}

/// Everything that shapes a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Player program, looked up on `PATH`
    pub player: String,
    pub volume: u32,
    pub volstep: u32,
    pub fullscreen: bool,
    pub dark: bool,
    /// Where play history is persisted; `None` keeps it in memory
    pub ledger_file: Option<PathBuf>,
    pub compact_on_evict: bool,
    pub failure_policy: FailurePolicy,
    pub newest_threshold_secs: u64,
    pub eviction_fraction: f64,
}

impl Default for Settings {
    fn default() -> Self {
        let player = PlayerOptions::default();
        let selection = SelectionContext::default();
        Self {
            player: "mplayer".to_string(),
            volume: player.volume,
            volstep: player.volstep,
            fullscreen: player.fullscreen,
            dark: player.dark,
            ledger_file: None,
            compact_on_evict: false,
            failure_policy: FailurePolicy::default(),
            newest_threshold_secs: selection.newest_threshold.as_secs(),
            eviction_fraction: selection.eviction_fraction,
        }
    }
}

impl Settings {
    /// Read settings from `path`.
    ///
    /// # Errors
    ///
    /// Fails when the file can not be read or is not valid settings JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings: Self = serde_json::from_str(&text)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from an explicit path, or from the default location if one exists.
    ///
    /// An explicit path must be readable; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let path = match get_config_path() {
            Ok(path) => path,
            Err(e) => {
                debug!("{e}");
                return Ok(Self::default());
            }
        };
        match fs::metadata(&path) {
            Ok(_) => Self::from_file(&path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no settings file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("Failed to access {}", path.display())),
        }
    }

    /// Apply command-line overrides on top of file settings.
    #[must_use]
    pub fn with_args(mut self, args: &Args) -> Self {
        if let Some(player) = &args.player {
            self.player = player.clone();
        }
        if let Some(volume) = args.volume {
            self.volume = volume;
        }
        if let Some(volstep) = args.volstep {
            self.volstep = volstep;
        }
        if let Some(ledger) = &args.ledger {
            self.ledger_file = Some(ledger.clone());
        }
        // Switches can only turn things on.
        self.fullscreen |= args.fullscreen;
        self.dark |= args.dark;
        self.compact_on_evict |= args.compact_ledger;
        if args.retry_failed {
            self.failure_policy = FailurePolicy::Retry;
        }
        self
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.eviction_fraction) {
            return Err(anyhow!(
                "eviction_fraction must be between 0 and 1, got {}",
                self.eviction_fraction
            ));
        }
        if self.player.trim().is_empty() {
            return Err(anyhow!("player must not be empty"));
        }
        Ok(())
    }

    pub fn player_options(&self) -> PlayerOptions {
        PlayerOptions {
            volume: self.volume,
            volstep: self.volstep,
            fullscreen: self.fullscreen,
            dark: self.dark,
        }
    }

    pub fn selection_context(&self) -> SelectionContext {
        SelectionContext {
            newest_threshold: Duration::from_secs(self.newest_threshold_secs),
            eviction_fraction: self.eviction_fraction,
        }
    }

    /// A history file in `dir` that this run will not use because no ledger
    /// file is configured.
    pub fn unbound_ledger(&self, dir: &Path) -> Option<PathBuf> {
        if self.ledger_file.is_some() {
            return None;
        }
        let candidate = dir.join(DEFAULT_LEDGER_FILE);
        candidate.is_file().then_some(candidate)
    }
}
