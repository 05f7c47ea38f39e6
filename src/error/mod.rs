// fossil-scm-sync: Fossil working-copy state synchronization
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!            SyncError (<= 24 bytes, Clone)
//!                     |
//!     +---------+-----+------+--------+
//!     v         v            v        v
//!   Fossil  Repository   Resource   Io/Other
//!    Box       Box          Box     Arc/Box<str>
//!
//! Sub-errors:
//!   Fossil      message + FossilErrorCode + stderr/exit code
//!   Repository  Disposed, CouldNotShow
//!   Resource    UnexpectedRenameStatus
//!
//! ConfigError is separate: it only surfaces through anyhow at load time.
//! ```
//!
//! `SyncError` is `Clone` so a throttled call can hand the very same failure
//! to every caller waiting on it.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`SyncError`].
pub type SyncResult<T> = std::result::Result<T, SyncError>;

/// Result type for calls into the Fossil collaborator.
pub type FossilResult<T> = std::result::Result<T, FossilError>;

/// Top-level error type of the synchronization engine.
#[derive(Debug, Clone, Error)]
pub enum SyncError {
    /// The external Fossil tool reported a failure.
    #[error("fossil error: {0}")]
    Fossil(#[from] Box<FossilError>),

    /// Repository coordinator rejected or failed an operation.
    #[error("repository error: {0}")]
    Repository(#[from] Box<RepositoryError>),

    /// Resource model invariant violated.
    #[error("resource error: {0}")]
    Resource(#[from] Box<ResourceError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Arc<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

impl SyncError {
    /// Create a generic [`SyncError::Other`].
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into().into_boxed_str())
    }

    /// Returns the Fossil error if this failure came from the external tool.
    #[must_use]
    pub fn as_fossil(&self) -> Option<&FossilError> {
        match self {
            Self::Fossil(err) => Some(err.as_ref()),
            _ => None,
        }
    }

    /// Returns the structured Fossil error code, if any.
    #[must_use]
    pub fn fossil_code(&self) -> Option<FossilErrorCode> {
        self.as_fossil().and_then(FossilError::code)
    }

    /// True when the tool reports the checkout is gone.
    #[must_use]
    pub fn is_not_a_repository(&self) -> bool {
        self.fossil_code() == Some(FossilErrorCode::NotAFossilRepository)
    }
}

macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for SyncError {
                fn from(err: $error) -> Self {
                    SyncError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    FossilError => Fossil,
    RepositoryError => Repository,
    ResourceError => Resource,
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

// --- Fossil Errors ---

/// Structured error codes reported by the Fossil collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FossilErrorCode {
    /// The working directory is no longer an open checkout.
    NotAFossilRepository,
    /// Requested file does not exist at the given revision.
    NoSuchFile,
    /// Pushing would fork the remote.
    PushCreatesNewRemoteHead,
    /// Untracked working files collide with incoming files.
    UntrackedFilesDiffer,
    /// Checkout has unsaved changes.
    UnsavedChanges,
    /// Remote rejected the credentials.
    AuthenticationFailed,
    /// Remote refused the operation for this user.
    NotAuthorized,
    /// Branch name already taken.
    BranchAlreadyExists,
    /// Unclassified failure.
    Unknown,
}

impl FossilErrorCode {
    /// Stable identifier of the code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotAFossilRepository => "NotAFossilRepository",
            Self::NoSuchFile => "NoSuchFile",
            Self::PushCreatesNewRemoteHead => "PushCreatesNewRemoteHead",
            Self::UntrackedFilesDiffer => "UntrackedFilesDiffer",
            Self::UnsavedChanges => "UnsavedChanges",
            Self::AuthenticationFailed => "AuthenticationFailed",
            Self::NotAuthorized => "NotAuthorized",
            Self::BranchAlreadyExists => "BranchAlreadyExists",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for FossilErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by the external Fossil executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FossilError {
    message: String,
    code: Option<FossilErrorCode>,
    exit_code: Option<i32>,
    stderr: Option<String>,
    command: Option<String>,
    filenames: Vec<String>,
}

impl FossilError {
    /// Creates an error with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            exit_code: None,
            stderr: None,
            command: None,
            filenames: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_code(mut self, code: FossilErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    #[must_use]
    pub const fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    #[must_use]
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = Some(stderr.into());
        self
    }

    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    #[must_use]
    pub fn with_filenames(mut self, filenames: Vec<String>) -> Self {
        self.filenames = filenames;
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn code(&self) -> Option<FossilErrorCode> {
        self.code
    }

    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    #[must_use]
    pub fn stderr(&self) -> Option<&str> {
        self.stderr.as_deref()
    }

    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// File names the tool complained about (e.g. colliding untracked files).
    #[must_use]
    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    /// Replaces the reported file names.
    pub fn set_filenames(&mut self, filenames: Vec<String>) {
        self.filenames = filenames;
    }

    /// Message suitable for a status indicator.
    ///
    /// Preference: stderr without a leading `abort:`, then the error code,
    /// then the raw message. The result is trimmed.
    #[must_use]
    pub fn normalized_message(&self) -> String {
        let stderr = self
            .stderr
            .as_deref()
            .map(|s| s.trim_start())
            .map(|s| s.strip_prefix("abort:").unwrap_or(s).trim_start())
            .unwrap_or_default();
        if !stderr.is_empty() {
            return stderr.trim().to_string();
        }
        self.code.map_or_else(
            || self.message.trim().to_string(),
            |code| code.as_str().to_string(),
        )
    }
}

impl fmt::Display for FossilError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(code) = self.code {
            write!(f, " ({code})")?;
        }
        Ok(())
    }
}

impl std::error::Error for FossilError {}

// --- Repository Errors ---

/// Coordinator-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Operation requested after the repository was disposed.
    #[error("repository not initialized")]
    Disposed,

    /// `show` failed with a non-zero exit code.
    #[error("could not show object (exit code {exit_code})")]
    CouldNotShow { exit_code: i32 },
}

// --- Resource Errors ---

/// Resource model invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// A rename target was attached to a status that cannot carry one.
    #[error("renamed resource '{path}' with unexpected status: {status}")]
    UnexpectedRenameStatus { path: String, status: String },
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}
