// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration section types.
//!
//! ```text
//! Config: GlobalConfig [global], FossilConfig [fossil], SyncConfig [sync]
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::logging::LogLevel;

/// Global configuration options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for stdout output (0-6).
    pub output_log_level: LogLevel,
    /// Log level for file output (0-6).
    pub file_log_level: LogLevel,
    /// Path to log file.
    pub log_file: PathBuf,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            output_log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: PathBuf::from("fscm.log"),
        }
    }
}

/// Fossil executable and identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FossilConfig {
    /// Executable name or path.
    pub path: PathBuf,
    /// Commit user override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Default for FossilConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("fossil"),
            username: None,
        }
    }
}

/// Automatic refresh and polling behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Refresh on filesystem changes.
    pub auto_refresh: bool,
    /// Update the checkout after a pull.
    pub auto_update: bool,
    /// Poll the remote for incoming/outgoing changes.
    pub auto_in_out: bool,
    pub auto_in_out_interval_ms: u64,
    /// Quiet window for filesystem events.
    pub debounce_ms: u64,
    /// Pause after a filesystem-triggered refresh.
    pub refresh_cooldown_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            auto_update: true,
            auto_in_out: true,
            auto_in_out_interval_ms: 3 * 60 * 1000,
            debounce_ms: 1000,
            refresh_cooldown_ms: 5000,
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub const fn auto_in_out_interval(&self) -> Duration {
        Duration::from_millis(self.auto_in_out_interval_ms)
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub const fn refresh_cooldown(&self) -> Duration {
        Duration::from_millis(self.refresh_cooldown_ms)
    }

    /// Rejects values that would make the timers spin.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero poll interval or
    /// debounce window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auto_in_out_interval_ms == 0 {
            return Err(invalid("auto_in_out_interval_ms", "must be greater than 0"));
        }
        if self.debounce_ms == 0 {
            return Err(invalid("debounce_ms", "must be greater than 0"));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: "sync".to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}
