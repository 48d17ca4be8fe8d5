//! Player ratings and the ranking system built on them
//!
//! This module provides the pluggable skill models (TrueSkill and Weng-Lin via
//! the skillratings crate), the in-memory rating store with win/loss and
//! partner statistics, and the journaled ranking system on top.

pub mod skill;
pub mod store;
pub mod system;
pub mod trueskill;
pub mod weng_lin;

// Re-export commonly used types
pub use skill::{create_skill_model, SkillModel};
pub use store::{PartnerStats, PlayerStats, RatingStore};
pub use system::{RankingSystem, RATING_SAVE_FILE};
pub use trueskill::TrueSkillModel;
pub use weng_lin::WengLinModel;
