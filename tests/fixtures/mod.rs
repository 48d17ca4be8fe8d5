//! Shared setup for the integration tests

#![allow(dead_code)]

use matchforge::config::{AppConfig, GameConfig};
use matchforge::lanes::LaneMatchmakingSystem;
use matchforge::rating::{RankingSystem, TrueSkillModel};
use matchforge::service::AppState;
use matchforge::types::{LaneStrengths, PlayerId};
use std::path::Path;
use tempfile::TempDir;

/// Seed shared by every test so tie-breaks are repeatable
pub const TEST_SEED: u64 = 20;

/// App configuration rooted in `dir` with a fixed seed
pub fn test_config(dir: &Path, max_history: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.data_dir = dir.to_path_buf();
    config.storage.max_operation_history = max_history;
    config.matchmaking.rng_seed = Some(TEST_SEED);
    config
}

/// Full application on a fresh temporary directory
pub fn create_test_app(max_history: usize) -> (TempDir, AppState) {
    let dir = tempfile::tempdir().expect("temp dir");
    let app = AppState::new(test_config(dir.path(), max_history)).expect("app state");
    (dir, app)
}

/// Ranking system using TrueSkill with default settings
pub fn create_ranking_system(dir: &Path, max_history: usize) -> RankingSystem {
    let model = TrueSkillModel::new(GameConfig::default()).expect("model");
    RankingSystem::create(dir, max_history, Box::new(model), Some(TEST_SEED))
        .expect("ranking system")
}

pub fn create_lane_system(dir: &Path) -> LaneMatchmakingSystem {
    let mut system = LaneMatchmakingSystem::create(dir, Some(TEST_SEED)).expect("lane system");
    system.init().expect("lane init");
    system
}

/// Varied but fully defined lane strengths for player `id`
pub fn lane_strengths_for(id: PlayerId) -> LaneStrengths {
    let seed = id as i32;
    [
        Some((seed * 37) % 1000),
        Some((seed * 53 + 100) % 1000),
        Some((seed * 71 + 200) % 1000),
        Some((seed * 89 + 300) % 1000),
        Some((seed * 97 + 400) % 1000),
    ]
}
