//! Shell completions command implementation.

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, Shell};
use crate::error::Result;

impl From<&Shell> for clap_complete::Shell {
    fn from(shell: &Shell) -> Self {
        match shell {
            Shell::Bash => Self::Bash,
            Shell::Zsh => Self::Zsh,
            Shell::Fish => Self::Fish,
            Shell::PowerShell => Self::PowerShell,
            Shell::Elvish => Self::Elvish,
        }
    }
}

/// Generate shell completions for the specified shell.
pub fn execute(shell: &Shell) -> Result<()> {
    write_completions(shell, &mut io::stdout());
    Ok(())
}

/// Write the completion script for `shell`, named after the binary.
fn write_completions(shell: &Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(clap_complete::Shell::from(shell), &mut cmd, bin_name, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completions_cover_subcommands() {
        let mut out = Vec::new();
        write_completions(&Shell::Bash, &mut out);
        let script = String::from_utf8(out).unwrap();

        assert!(script.contains("reporter"));
        assert!(script.contains("once"));
        assert!(script.contains("--gist-id"));
    }
}
