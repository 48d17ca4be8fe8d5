//! Error types for the rating and matchmaking engines
//!
//! Library operations return [`MatchmakingError`] so callers can tell a bad roster
//! from a missing player or a failed save. Configuration loading and the binary
//! use `anyhow` on top of this.

use std::path::Path;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MatchmakingError>;

/// Typed errors surfaced to the command layer
#[derive(Debug, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("Player already exists: {player_id}")]
    DuplicatePlayer { player_id: u64 },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("I/O failure while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not decode snapshot: {reason}")]
    Decode { reason: String },

    #[error("Skill calculation failed: {reason}")]
    SkillCalculation { reason: String },

    #[error("Domain worker is no longer running")]
    WorkerUnavailable,
}

impl MatchmakingError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the action and path that failed
    pub fn io(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            context: format!("{} {}", action, path.display()),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
