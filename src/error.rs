//! Error types for `mediaunlock`
//!
//! The coordinator itself never surfaces errors from its public operations:
//! probe failures are recoverable and surface failures are logged. The
//! types here describe those failures for logging and for the collaborator
//! traits, plus the configuration and CLI error hierarchy.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `mediaunlock` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Scenario finished with targets still locked (`--require-all`)
    pub const INCOMPLETE: i32 = 4;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `mediaunlock` operations.
#[derive(Debug, Error)]
pub enum MediaUnlockError {
    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Interaction surface error
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// Some targets never unlocked
    #[error("{} target(s) still locked: {}", pending.len(), pending.join(", "))]
    Incomplete {
        /// Identifiers of the targets that remained locked
        pending: Vec<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MediaUnlockError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Incomplete { .. } => ExitCode::INCOMPLETE,
            Self::Surface(_) => ExitCode::ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Playback Errors
// ============================================================================

/// Reasons a media target refused to begin playback.
///
/// All of these are recoverable from the coordinator's point of view: the
/// target stays locked and the next qualifying event retries it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlaybackError {
    /// The platform did not accept the current context as a user gesture
    #[error("playback not allowed: {0}")]
    NotAllowed(String),

    /// Playback was interrupted before it acknowledged starting
    #[error("playback aborted: {0}")]
    Aborted(String),

    /// The media cannot be played at all
    #[error("playback unsupported: {0}")]
    Unsupported(String),
}

// ============================================================================
// Signal Errors
// ============================================================================

/// Reasons a completion signal settled without resolving.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalError {
    /// The signal was rejected
    #[error("signal rejected: {0}")]
    Rejected(String),

    /// The owning registry was dropped while the signal was pending
    #[error("signal abandoned before it settled")]
    Abandoned,
}

// ============================================================================
// Surface Errors
// ============================================================================

/// Errors raised by an interaction surface while adding or removing listeners.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SurfaceError {
    /// The surface no longer accepts listener changes
    #[error("interaction surface is detached")]
    Detached,

    /// Listener is not registered under the given kind and options
    #[error("no listener {id} registered for '{kind}'")]
    UnknownListener {
        /// Event kind the removal targeted
        kind: String,
        /// Listener identifier
        id: u64,
    },

    /// The surface refused the operation
    #[error("surface rejected listener change: {0}")]
    Rejected(String),
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Scenario loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the scenario file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Scenario validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the scenario file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Scenario file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during scenario validation.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "targets[1].id")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Prevents the scenario from being used
    Error,
    /// Informational; the scenario still loads
    Warning,
}

/// Result type alias for `mediaunlock` operations.
pub type Result<T> = std::result::Result<T, MediaUnlockError>;
