// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |           repo / watch / config
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |         repository        |
//!              |  groups, run protocol,    |
//!              |  events, refresh gate     |
//!              '--+-----------+--------+---'
//!                 |           |        |
//!                 v           v        v
//!            autoinout    coalesce   operation
//!           in/out poll   throttle/  running
//!                         debounce   bitset
//!                 |
//!                 v
//!       fossil (FossilRepository trait, CLI adapter, parsers)
//!
//!   +-----------------------------------------+
//!   |  resource   status model, grouping      |
//!   +-----------------------------------------+
//!   |  foundation   error, logging, config,   |
//!   |               interaction               |
//!   +-----------------------------------------+
//! ```

pub mod autoinout;
pub mod cli;
pub mod cmd;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod fossil;
pub mod interaction;
pub mod logging;
pub mod operation;
pub mod repository;
pub mod resource;
