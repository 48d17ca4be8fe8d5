//! Configuration management for the matchforge engines
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, MatchmakingSettings, ServiceSettings, StorageSettings};
pub use rating::{GameConfig, SkillModelKind};
