// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Config loading and config-related commands.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::global::{GlobalOptions, parse_override};
use crate::config::{Config, ConfigLoader};
use crate::error::Result;

/// File name looked up next to the executable and in the checkout.
pub const CONFIG_FILE_NAME: &str = "fscm.toml";

/// Environment prefix, e.g. `FSCM_SYNC__DEBOUNCE_MS`.
pub const ENV_PREFIX: &str = "FSCM";

/// Directory commands operate on: `-C` or the current directory.
#[must_use]
pub fn working_dir(global: &GlobalOptions) -> PathBuf {
    global
        .repository
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Assembles every config source in precedence order.
///
/// # Errors
///
/// Returns an error if a `--set` option is malformed.
pub fn build_config_loader(global: &GlobalOptions, dir: &Path) -> Result<ConfigLoader> {
    let mut loader = ConfigLoader::new();

    if !global.no_default_inis {
        if let Some(exe_dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            loader = loader.add_toml_file_optional(exe_dir.join(CONFIG_FILE_NAME));
        }
        loader = loader.add_toml_file_optional(dir.join(CONFIG_FILE_NAME));
    }

    for ini_path in &global.inis {
        loader = loader.add_toml_file(ini_path);
    }

    loader = loader.with_env_prefix(ENV_PREFIX);

    for option in global.to_config_overrides() {
        let (key, value) = parse_override(&option)?;
        debug!(key = %key, value = %value, "config override");
        loader = loader.set(&key, value)?;
    }

    Ok(loader)
}

/// Loads and validates the configuration.
///
/// # Errors
///
/// Returns an error if any source is invalid.
pub fn load_config(global: &GlobalOptions, dir: &Path) -> Result<Config> {
    build_config_loader(global, dir)?.build()
}

/// Display current configuration options.
pub fn run_options_command(config: &Config) {
    for line in config.format_options() {
        println!("{line}");
    }
}

/// Display loaded configuration files.
pub fn run_inis_command(config_files: &[String]) {
    if config_files.is_empty() {
        println!("No configuration files loaded");
    } else {
        for line in config_files {
            println!("{line}");
        }
    }
}
