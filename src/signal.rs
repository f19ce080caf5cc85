//! Cooperative cancellation.
//!
//! SIGINT and SIGTERM only raise a flag. The playback loop and the player poll
//! it and unwind at a safe point, so a ledger line is never half written and
//! the player child is reaped before we exit.

use anyhow::{bail, Result};
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

lazy_static::lazy_static! {
    static ref INTERRUPTED: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    /// A flag nobody but the holder can raise.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(unix)]
extern "C" fn on_signal(_signum: libc::c_int) {
    // Only an atomic store: anything more is not async-signal-safe.
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Route SIGINT and SIGTERM into the returned flag.
#[cfg(unix)]
pub fn install() -> Result<CancelFlag> {
    // Touch the flag now so the handler never runs the lazy initializer.
    let flag = CancelFlag {
        flag: Arc::clone(&INTERRUPTED),
    };

    for signum in [libc::SIGINT, libc::SIGTERM] {
        let handler = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
        // SAFETY: the handler only performs an atomic store.
        let previous = unsafe { libc::signal(signum, handler) };
        if previous == libc::SIG_ERR {
            bail!("Failed to install handler for signal {signum}");
        }
    }

    debug!("signal handlers installed");
    Ok(flag)
}

/// Without unix signals the flag can only be raised programmatically.
#[cfg(not(unix))]
pub fn install() -> Result<CancelFlag> {
    Ok(CancelFlag {
        flag: Arc::clone(&INTERRUPTED),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_flag_is_clear() {
        assert!(!CancelFlag::new().is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let flag = CancelFlag::new();
        let other = flag.clone();
        other.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_independent_flags() {
        let a = CancelFlag::new();
        let b = CancelFlag::new();
        a.cancel();
        assert!(!b.is_cancelled());
    }
}
