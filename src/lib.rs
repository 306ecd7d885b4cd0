//! # attoconf - Minimal C/C++ Configure Step
//!
//! attoconf validates compiler and linker flags by actually running the
//! toolchain on tiny programs before the flags are written into build files.
//!
//! ## Quick Start
//!
//! ```bash
//! # Check the defaults (gcc / g++) and write build/config.make
//! attoconf -B build
//!
//! # Override options the way ./configure does
//! attoconf -B build CC=clang "CFLAGS=-O2 -g" LIBS=-lm
//! ```
//!
//! ## Module Organization
//!
//! - [`probe`] - Compile and link probes against the configured toolchain
//! - [`options`] - Option declarations, registry, and validators
//! - [`process`] / [`temp_file`] - Process execution and scoped probe files
//! - [`config`] / [`output`] - `attoconf.toml` input and `config.make` output

/// Configuration file parsing (`attoconf.toml`).
pub mod config;

/// Error types for probes and option finalization.
pub mod error;

/// Option declarations, registry, and validators.
pub mod options;

/// Rendering of validated options (`config.make`, JSON).
pub mod output;

/// Toolchain probes.
pub mod probe;

/// Process execution with merged output capture.
pub mod process;

/// Option value storage.
pub mod store;

/// Scoped probe files.
pub mod temp_file;

/// Terminal UI utilities (tables).
pub mod ui;

#[cfg(test)]
mod testing;

pub use error::{ConfigError, ProbeError};
pub use probe::{Dialect, ExtraFlags, ProbeContext, ProbeRequest};
pub use store::OptionStore;
