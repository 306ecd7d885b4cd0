//! Error types for probing and option finalization.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single toolchain probe step.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The command could not be started at all (missing executable, permissions).
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the command's output or waiting for it failed after it started.
    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited nonzero. Carries the merged compiler output.
    #[error("{output}")]
    Failed { output: String },

    /// A probe source file could not be created.
    #[error("failed to create '{}': {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A probe artifact could not be removed for a reason other than being absent.
    #[error("failed to remove '{}': {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A probe consulted an option that was never registered.
    #[error("option '{0}' is not set")]
    MissingOption(String),
}

impl ProbeError {
    /// Returns true if the toolchain ran and rejected the input.
    pub fn is_probe_failure(&self) -> bool {
        matches!(self, ProbeError::Failed { .. })
    }

    /// Returns true if the toolchain could not be started.
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, ProbeError::Launch { .. })
    }
}

/// Failure while finalizing the configured options.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("cannot parse value of {option}: unbalanced quoting in '{text}'")]
    Parse { option: String, text: String },

    /// An option's validator failed. Displays the underlying diagnostic verbatim.
    #[error("{source}")]
    Check {
        option: String,
        #[source]
        source: ProbeError,
    },
}

impl ConfigError {
    /// Name of the option this error is attributed to.
    pub fn option(&self) -> &str {
        match self {
            ConfigError::UnknownOption(name) => name,
            ConfigError::Parse { option, .. } | ConfigError::Check { option, .. } => option,
        }
    }
}

pub type Result<T, E = ProbeError> = std::result::Result<T, E>;
