// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management.
//!
//! The loaded [`Config`] is passed explicitly to whatever needs it; nothing
//! reads configuration from global state.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. fscm.toml next to the executable
//! 3. fscm.toml in the checkout root
//! 4. --ini
//! 5. FSCM_* env vars
//! 6. CLI overrides (-s section.key=value)
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! FSCM_SYNC__AUTO_REFRESH=false   → sync.auto_refresh = false
//! FSCM_FOSSIL__PATH=/opt/fossil   → fossil.path = "/opt/fossil"
//! FSCM_GLOBAL__LOG_FILE=sync.log  → global.log_file = "sync.log"
//! ```

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::repository::SyncSettings;

pub use loader::ConfigLoader;
pub use types::{FossilConfig, GlobalConfig, SyncConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub global: GlobalConfig,
    pub fossil: FossilConfig,
    pub sync: SyncConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use fossil_scm_sync::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("fscm.toml")
    ///     .with_env_prefix("FSCM")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or does not match the
    /// `Config` structure.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for out-of-range timer values.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.sync.validate()
    }

    /// Behaviour switches handed to the repository coordinator.
    #[must_use]
    pub fn repository_settings(&self) -> SyncSettings {
        SyncSettings::builder()
            .with_auto_refresh(self.sync.auto_refresh)
            .with_auto_update(self.sync.auto_update)
            .with_auto_in_out(self.sync.auto_in_out)
            .with_auto_in_out_interval(self.sync.auto_in_out_interval())
            .with_debounce(self.sync.debounce())
            .with_refresh_cooldown(self.sync.refresh_cooldown())
            .maybe_with_username(self.fossil.username.clone())
            .build()
    }

    /// Effective options as aligned `key = value` lines, sorted by key.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_fossil_options(&mut options);
        self.format_sync_options(&mut options);

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.output_log_level".into(),
            self.global.output_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert(
            "global.log_file".into(),
            self.global.log_file.display().to_string(),
        );
    }

    fn format_fossil_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "fossil.path".into(),
            self.fossil.path.display().to_string(),
        );
        options.insert(
            "fossil.username".into(),
            self.fossil.username.clone().unwrap_or_default(),
        );
    }

    fn format_sync_options(&self, options: &mut BTreeMap<String, String>) {
        let sync = &self.sync;
        options.insert("sync.auto_refresh".into(), sync.auto_refresh.to_string());
        options.insert("sync.auto_update".into(), sync.auto_update.to_string());
        options.insert("sync.auto_in_out".into(), sync.auto_in_out.to_string());
        options.insert(
            "sync.auto_in_out_interval_ms".into(),
            sync.auto_in_out_interval_ms.to_string(),
        );
        options.insert("sync.debounce_ms".into(), sync.debounce_ms.to_string());
        options.insert(
            "sync.refresh_cooldown_ms".into(),
            sync.refresh_cooldown_ms.to_string(),
        );
    }
}
