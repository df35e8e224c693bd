//! `bluejay completions <SHELL>` — print a completion script.
//!
//! Source the output from your shell profile, e.g.
//! `bluejay completions zsh > "${fpath[1]}/_bluejay"`.

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

const BIN_NAME: &str = "bluejay";

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    let stdout = io::stdout();
    write_script(shell, &mut stdout.lock())
}

fn write_script(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, BIN_NAME, out);
    out.flush()?;
    Ok(())
}
