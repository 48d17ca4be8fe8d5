//! Matchforge - skill ratings and team balancing for small game rooms
//!
//! This crate provides a rating store with undoable history, a balanced
//! two-team finder driven by a pluggable skill model, and a lane-aware 5v5
//! finder for games with fixed roles.

pub mod config;
pub mod error;
pub mod journal;
pub mod lanes;
pub mod matching;
pub mod metrics;
pub mod persistence;
pub mod rating;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{MatchmakingError, Result};
pub use types::*;

// Re-export key components
pub use lanes::LaneMatchmakingSystem;
pub use rating::{RankingSystem, SkillModel};
pub use service::{AppState, DomainWorker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
