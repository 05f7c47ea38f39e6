// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for `fscm` using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! fscm [global options] <command>
//! status [--json]
//! watch
//! commit -m MSG [--scope all|staged|changes] [FILE...]
//! pull | push
//! update [TREEISH] [--discard]
//! undo [--dry-run]
//! show PATH [--checkin REV]
//! log [FILE] [-r REV] [-n N]
//! options | inis | version
//! ```

pub mod global;
pub mod repo;

#[cfg(test)]
mod tests;

use crate::cli::global::GlobalOptions;
use crate::cli::repo::{CommitArgs, LogArgs, ShowArgs, StatusArgs, UndoArgs, UpdateArgs};
use clap::{Parser, Subcommand};

/// Fossil working-copy synchronization
///
/// Keeps a live model of a Fossil checkout and runs commands through it.
#[derive(Debug, Parser)]
#[command(
    name = "fscm",
    author,
    version,
    about = "Fossil working-copy state synchronization",
    long_about = "fossil-scm-sync Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Tracks a Fossil checkout: change groups, running operations\n\
                  and incoming/outgoing counts. `fscm watch` keeps the model\n\
                  live; the other commands run once. See `fscm <command> --help`\n\
                  for more information about a command.",
    after_help = "CONFIG FILES:\n\n\
                  fscm reads `fscm.toml` next to the executable, then `fscm.toml`\n\
                  in the checkout root; the second overrides the first. Files given\n\
                  with --ini are loaded after those, then FSCM_SECTION__KEY\n\
                  environment variables, then --set overrides. Use\n\
                  --no-default-inis to only use --ini."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their values.
    Options,

    /// Lists the config files used.
    Inis,

    /// Shows the change groups of the checkout.
    Status(StatusArgs),

    /// Watches the checkout and prints model events until Ctrl-C.
    Watch,

    /// Commits changes.
    Commit(CommitArgs),

    /// Pulls from the default remote.
    Pull,

    /// Pushes to the default remote.
    Push,

    /// Updates the checkout.
    Update(UpdateArgs),

    /// Undoes the last undoable command.
    Undo(UndoArgs),

    /// Prints a file as of a check-in.
    Show(ShowArgs),

    /// Lists timeline entries.
    Log(LogArgs),
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
