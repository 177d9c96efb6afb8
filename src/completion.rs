//! `circle completions`: shell scripts rendered by clap_complete.

use anyhow::{Context, Result, bail};
use clap::CommandFactory;
use clap_complete::{Generator, Shell as CompletionShell, generate};
use std::{fs, path::PathBuf};
use tracing::debug;

use crate::cli::{AppContext, Cli, CompletionsArgs, Shell};

const BIN_NAME: &str = "circle";

impl From<Shell> for CompletionShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => CompletionShell::Bash,
            Shell::Zsh => CompletionShell::Zsh,
            Shell::Fish => CompletionShell::Fish,
            Shell::PowerShell => CompletionShell::PowerShell,
            Shell::Elvish => CompletionShell::Elvish,
        }
    }
}

/// Completion script for `shell`, held in memory
pub fn script(shell: Shell) -> Result<String> {
    let mut buf = Vec::new();
    generate(CompletionShell::from(shell), &mut Cli::command(), BIN_NAME, &mut buf);

    String::from_utf8(buf).context("completion script is not UTF-8")
}

/// File the script lands in under `dir`, named the way each shell expects
fn target_path(shell: Shell, dir: PathBuf) -> PathBuf {
    dir.join(CompletionShell::from(shell).file_name(BIN_NAME))
}

pub fn run(args: CompletionsArgs, ctx: &AppContext) -> Result<()> {
    let body = script(args.shell.clone())?;

    if args.stdout {
        print!("{body}");
        return Ok(());
    }

    let Some(dir) = args.out_dir else {
        bail!("--out-dir is required unless --stdout is set");
    };

    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let path = target_path(args.shell, dir);
    fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;

    debug!(path = %path.display(), "completion written");
    if !ctx.quiet {
        eprintln!("Wrote completion to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;

    use super::*;

    fn quiet() -> AppContext {
        AppContext { quiet: true, no_color: true, verbose: false }
    }

    #[test]
    fn scripts_mention_subcommands() {
        let bash = script(Shell::Bash).unwrap();

        assert!(bash.contains(BIN_NAME));
        assert!(bash.contains("scan"));
        assert!(bash.contains("normalize"));
    }

    #[test]
    fn out_dir_gets_shell_named_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        let args = CompletionsArgs {
            shell: Shell::Fish,
            out_dir: Some(dir.path().join("completions")),
            stdout: false,
        };

        run(args, &quiet()).unwrap();

        dir.child("completions/circle.fish")
            .assert(predicates::str::contains("circle"));
    }

    #[test]
    fn missing_destination_is_an_error() {
        let args = CompletionsArgs { shell: Shell::Zsh, out_dir: None, stdout: false };

        let err = run(args, &quiet()).unwrap_err();

        assert!(err.to_string().contains("--out-dir"));
    }
}
