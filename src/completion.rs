//! # Shell Completion Module
//!
//! Generates completion scripts through `clap_complete`.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! playrandom --completions bash > ~/.local/share/bash-completion/completions/playrandom
//!
//! # Generate zsh completions
//! playrandom --completions zsh > ~/.config/zsh/completions/_playrandom
//! ```

use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::Write;

/// Write the completion script for `cmd` to `out`.
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

/// Convert our `Shell` enum to `clap_complete`'s.
pub fn shell_to_completion_shell(shell: crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}
