//! Completions command.

use clap::CommandFactory;
use clap_complete::generate;

/// Generates shell completions for the `pallet` CLI.
pub fn completions(shell: clap_complete::Shell) {
    let mut cmd = crate::Cli::command();
    generate(shell, &mut cmd, "pallet", &mut std::io::stdout());
}
