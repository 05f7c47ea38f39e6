// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers
//!   config   options, inis, config loading
//!   repo     status, commit, pull, push, update, undo, show, log
//!   watch    live model with file watching
//! ```

pub mod config;
pub mod repo;
pub mod watch;

#[cfg(test)]
mod tests;
