//! Error types for Macsweep
//!
//! Uses `thiserror` for library errors; the binary wraps these in `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Macsweep operations
pub type SweepResult<T> = Result<T, SweepError>;

/// Main error type for Macsweep operations
#[derive(Error, Debug)]
pub enum SweepError {
    /// No controlling terminal for an interactive command
    #[error("stdin is not a terminal - interactive selection requires a TTY")]
    NoTty,

    /// Interactive menu invoked with zero candidate items
    #[error("no items to select from")]
    EmptyMenu,

    /// Unknown action identifier from the catalog
    #[error("unknown action '{id}'")]
    UnknownAction { id: String },

    /// An action handler needed a path but the entry carried none
    #[error("action '{id}' requires a path but the catalog entry has none")]
    MissingPath { id: String },

    /// An external tool invoked by an action exited non-zero
    #[error("tool '{tool}' failed with status {status}")]
    ToolFailed { tool: String, status: i32 },

    /// Catalog file could not be parsed
    #[error("invalid catalog file {path}: {message}")]
    InvalidCatalog { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}
