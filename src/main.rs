// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Config --> Logging --> Command Dispatch
//!   Options | Inis | Status | Watch | Commit | Pull | Push
//!   Update | Undo | Show | Log
//! ```

use std::path::Path;
use std::process::ExitCode;

use fossil_scm_sync::cli::{self, Command};
use fossil_scm_sync::cmd::config::{
    build_config_loader, load_config, run_inis_command, run_options_command, working_dir,
};
use fossil_scm_sync::cmd::repo::{
    open_repository, run_commit_command, run_log_command, run_pull_command, run_push_command,
    run_show_command, run_status_command, run_undo_command, run_update_command,
};
use fossil_scm_sync::cmd::watch::run_watch_command;
use fossil_scm_sync::config::{Config, GlobalConfig};
use fossil_scm_sync::logging::{LogConfig, LogLevel, init_logging};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    if matches!(cli.command, Some(Command::Version)) {
        handle_version_command();
        return ExitCode::SUCCESS;
    }

    let dir = working_dir(&cli.global);
    let config = match load_config(&cli.global, &dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let log_config = build_log_config(&config.global);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match dispatch_command(&cli, &config, &dir).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn build_log_config(global: &GlobalConfig) -> LogConfig {
    let log_file = (global.file_log_level != LogLevel::SILENT)
        .then(|| global.log_file.display().to_string());

    LogConfig::builder()
        .with_console_level(global.output_log_level)
        .with_file_level(global.file_log_level)
        .maybe_with_log_file(log_file)
        .build()
}

async fn dispatch_command(cli: &cli::Cli, config: &Config, dir: &Path) -> anyhow::Result<()> {
    let Some(command) = &cli.command else {
        eprintln!("No command specified. Use --help for usage information.");
        anyhow::bail!("No command specified");
    };

    match command {
        Command::Version => {
            handle_version_command();
            Ok(())
        }
        Command::Options => {
            run_options_command(config);
            Ok(())
        }
        Command::Inis => {
            let loader = build_config_loader(&cli.global, dir)?;
            run_inis_command(&loader.format_loaded_files());
            Ok(())
        }
        Command::Watch => {
            let repo = open_repository(config, dir, true).await?;
            run_watch_command(repo).await
        }
        command => {
            let repo = open_repository(config, dir, false).await?;
            let result = match command {
                Command::Status(args) => run_status_command(&repo, args),
                Command::Commit(args) => run_commit_command(&repo, args).await,
                Command::Pull => run_pull_command(&repo).await,
                Command::Push => run_push_command(&repo).await,
                Command::Update(args) => run_update_command(&repo, args).await,
                Command::Undo(args) => run_undo_command(&repo, args).await,
                Command::Show(args) => run_show_command(&repo, args).await,
                Command::Log(args) => run_log_command(&repo, args).await,
                Command::Version | Command::Options | Command::Inis | Command::Watch => Ok(()),
            };
            repo.dispose();
            result
        }
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}
