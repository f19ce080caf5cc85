//! # Media Player Integration
//!
//! Runs an external player (mplayer by default) for one file at a time and
//! reports how playback ended.
//!
//! ## Command Line
//!
//! ```text
//! mplayer -softvol -ao pulse [-fs] -volume 80 -volstep 3 \
//!         [-vo gl -brightness -40 -contrast -10] <file>
//! ```
//!
//! The dark-room flags dim the picture for watching in an unlit room.
//!
//! ## Cancellation
//!
//! The child is polled while the cancel flag is watched. Once the flag is
//! raised the child gets SIGTERM and is waited for, so no orphan is left behind.

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;
use std::process::{Child, Command};
use std::thread;
use std::time::Duration;

use crate::signal::CancelFlag;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How one playback ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The media ran to its end (or the user quit the player normally)
    Finished,
    /// The player could not play the file
    Failed(String),
    /// Interrupted by the user; the whole run stops
    Cancelled,
}

/// Something that plays a file to completion.
pub trait Player {
    /// Play `path`, blocking until it ends or `cancel` is raised.
    ///
    /// # Errors
    ///
    /// Only for failures that make further playback pointless, such as a
    /// player binary that can not be started.
    fn play(&mut self, path: &str, cancel: &CancelFlag) -> Result<PlayOutcome>;
}

/// Startup options handed to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerOptions {
    /// Initial volume in percent
    pub volume: u32,
    pub volstep: u32,
    pub fullscreen: bool,
    /// Dim brightness and contrast for a dark room
    pub dark: bool,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            volume: 80,
            volstep: 3,
            fullscreen: false,
            dark: false,
        }
    }
}

/// mplayer, or a compatible program taking the same flags.
#[derive(Debug, Clone)]
pub struct Mplayer {
    program: String,
    args: Vec<String>,
}

impl Mplayer {
    pub fn new(program: impl Into<String>, options: &PlayerOptions) -> Self {
        let program = program.into();
        let args = build_args(options);
        debug!("using player command: {program} {}", args.join(" "));
        Self { program, args }
    }

    /// Full argument list for `path`, program name excluded.
    pub fn command_line(&self, path: &str) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(path.to_string());
        args
    }

    fn wait(&self, mut child: Child, cancel: &CancelFlag) -> Result<PlayOutcome> {
        loop {
            if cancel.is_cancelled() {
                info!("interrupted: terminating {} subprocess...", self.program);
                terminate(&mut child);
                child.wait().context("Failed to reap player process")?;
                info!("subprocess was terminated.");
                return Ok(PlayOutcome::Cancelled);
            }

            match child.try_wait().context("Failed to poll player process")? {
                Some(status) if cancel.is_cancelled() => {
                    // The terminal delivered the interrupt to the player as well.
                    debug!("player exited with {status} after interrupt");
                    return Ok(PlayOutcome::Cancelled);
                }
                Some(status) if status.success() => {
                    info!("subprocess finished.");
                    return Ok(PlayOutcome::Finished);
                }
                Some(status) => {
                    return Ok(PlayOutcome::Failed(format!("{} exited with {status}", self.program)));
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        }
    }
}

impl Player for Mplayer {
    fn play(&mut self, path: &str, cancel: &CancelFlag) -> Result<PlayOutcome> {
        if !Path::new(path).is_file() {
            return Ok(PlayOutcome::Failed(format!("'{path}' is not a file")));
        }

        info!("*** playing '{path}'");
        let args = self.command_line(path);
        debug!("calling {} {:?}", self.program, args);

        let child = Command::new(&self.program)
            .args(&args)
            .spawn()
            .with_context(|| format!("Failed to start player '{}'", self.program))?;

        self.wait(child, cancel)
    }
}

fn build_args(options: &PlayerOptions) -> Vec<String> {
    let mut args: Vec<String> = ["-softvol", "-ao", "pulse"].map(String::from).to_vec();
    if options.fullscreen {
        args.push("-fs".to_string());
    }
    args.extend(["-volume".to_string(), options.volume.to_string()]);
    args.extend(["-volstep".to_string(), options.volstep.to_string()]);
    if options.dark {
        args.extend(["-vo", "gl", "-brightness", "-40", "-contrast", "-10"].map(String::from));
    }
    args
}

#[cfg(unix)]
fn terminate(child: &mut Child) {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };
    // SAFETY: plain kill(2) on our own, not yet reaped, child.
    if unsafe { libc::kill(pid, libc::SIGTERM) } != 0 {
        debug!("SIGTERM to {pid} failed: {}", std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::warn!("failed to kill player: {e}");
    }
}
