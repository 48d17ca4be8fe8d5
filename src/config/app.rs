//! Main application configuration
//!
//! This module defines the configuration structures for the matchmaking engines,
//! including environment variable loading, TOML file loading and validation.

use crate::config::rating::{GameConfig, SkillModelKind};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub storage: StorageSettings,
    pub game: GameConfig,
    pub matchmaking: MatchmakingSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Where state lives on disk and how much undo history is kept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root directory; each domain gets its own subdirectory
    pub data_dir: PathBuf,
    /// Number of undoable operations kept by the journal
    pub max_operation_history: usize,
}

/// Matchmaking-specific settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Skill model used for rating updates and match quality
    pub skill_model: SkillModelKind,
    /// Fixed seed for the tie-break and mirroring randomness
    pub rng_seed: Option<u64>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "matchforge".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            max_operation_history: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Storage settings
        if let Ok(data_dir) = env::var("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(history) = env::var("MAX_OPERATION_HISTORY") {
            self.storage.max_operation_history = history
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_OPERATION_HISTORY value: {}", history))?;
        }

        // Game settings
        if let Ok(mean) = env::var("INITIAL_MEAN") {
            self.game.initial_mean = mean
                .parse()
                .map_err(|_| anyhow!("Invalid INITIAL_MEAN value: {}", mean))?;
        }
        if let Ok(stddev) = env::var("INITIAL_STDDEV") {
            self.game.initial_stddev = stddev
                .parse()
                .map_err(|_| anyhow!("Invalid INITIAL_STDDEV value: {}", stddev))?;
        }
        if let Ok(beta) = env::var("SKILL_BETA") {
            self.game.beta = beta
                .parse()
                .map_err(|_| anyhow!("Invalid SKILL_BETA value: {}", beta))?;
        }
        if let Ok(draw) = env::var("DRAW_PROBABILITY") {
            self.game.draw_probability = draw
                .parse()
                .map_err(|_| anyhow!("Invalid DRAW_PROBABILITY value: {}", draw))?;
        }

        // Matchmaking settings
        if let Ok(model) = env::var("SKILL_MODEL") {
            self.matchmaking.skill_model = model.parse().map_err(|e: String| anyhow!(e))?;
        }
        if let Ok(seed) = env::var("RNG_SEED") {
            self.matchmaking.rng_seed = Some(
                seed.parse()
                    .map_err(|_| anyhow!("Invalid RNG_SEED value: {}", seed))?,
            );
        }

        Ok(())
    }

    /// Directory holding the rating domain's current state and backups
    pub fn ratings_dir(&self) -> PathBuf {
        self.storage.data_dir.join("ratings")
    }

    /// Directory holding the lane domain's current state
    pub fn lanes_dir(&self) -> PathBuf {
        self.storage.data_dir.join("lanes")
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.storage.data_dir.as_os_str().is_empty() {
        return Err(anyhow!("Data directory cannot be empty"));
    }
    if config.storage.max_operation_history == 0 {
        return Err(anyhow!("Max operation history must be greater than 0"));
    }

    config
        .game
        .validate()
        .map_err(|e| anyhow!("Invalid game configuration: {}", e))?;

    Ok(())
}
