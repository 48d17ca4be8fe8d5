//! Rating system configuration

use crate::error::{MatchmakingError, Result};
use crate::types::Rating;
use serde::{Deserialize, Serialize};

/// Parameters of the skill model shared by every player of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Mean given to players registered without an explicit rating
    pub initial_mean: f64,
    /// Standard deviation given to new and unknown players
    pub initial_stddev: f64,
    /// Skill distance that gives roughly a 76% chance of winning
    pub beta: f64,
    /// Probability of a draw between equal teams (draw margin)
    pub draw_probability: f64,
    /// Additive dynamics keeping deviations from collapsing to zero
    pub dynamics: f64,
    /// `k` in the conservative rating `mean - k * stddev`
    pub conservative_multiplier: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_mean: 25.0,
            initial_stddev: 25.0 / 3.0,
            beta: 25.0 / 6.0,
            draw_probability: 0.1,
            dynamics: 25.0 / 300.0,
            conservative_multiplier: 3.0,
        }
    }
}

impl GameConfig {
    /// Rating for a player nobody has registered yet
    pub fn default_rating(&self) -> Rating {
        self.initial_rating(self.initial_mean)
    }

    /// Rating for a newly registered player with the given mean
    pub fn initial_rating(&self, mean: f64) -> Rating {
        Rating::new(mean, self.initial_stddev, self.conservative_multiplier)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.initial_mean.is_finite() {
            return Err(MatchmakingError::validation("Initial mean must be finite"));
        }
        if !(self.initial_stddev > 0.0) {
            return Err(MatchmakingError::validation(
                "Initial standard deviation must be positive",
            ));
        }
        if !(self.beta > 0.0) {
            return Err(MatchmakingError::validation("Beta must be positive"));
        }
        if !(0.0..1.0).contains(&self.draw_probability) {
            return Err(MatchmakingError::validation(
                "Draw probability must be in [0, 1)",
            ));
        }
        if !(self.dynamics >= 0.0) || self.dynamics.is_infinite() {
            return Err(MatchmakingError::validation(
                "Dynamics must be a non-negative finite number",
            ));
        }
        if !self.conservative_multiplier.is_finite() || self.conservative_multiplier < 0.0 {
            return Err(MatchmakingError::validation(
                "Conservative multiplier must be a non-negative finite number",
            ));
        }
        Ok(())
    }
}

/// Which skill model updates ratings and scores match quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillModelKind {
    #[default]
    TrueSkill,
    WengLin,
}

impl std::str::FromStr for SkillModelKind {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "trueskill" | "true_skill" => Ok(SkillModelKind::TrueSkill),
            "weng_lin" | "wenglin" | "openskill" => Ok(SkillModelKind::WengLin),
            other => Err(format!("Unknown skill model: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_game_config() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());

        let rating = config.default_rating();
        assert_eq!(rating.mean, 25.0);
        assert_eq!(rating.stddev, 25.0 / 3.0);
        assert_eq!(rating.conservative_multiplier, 3.0);
        assert_eq!(config.initial_rating(30.0).mean, 30.0);
    }

    #[test]
    fn test_game_config_validation() {
        let mut config = GameConfig::default();
        config.initial_stddev = 0.0;
        assert!(config.validate().is_err());

        config = GameConfig::default();
        config.beta = -1.0;
        assert!(config.validate().is_err());

        config = GameConfig::default();
        config.draw_probability = 1.0;
        assert!(config.validate().is_err());

        config = GameConfig::default();
        config.initial_mean = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_game_config_rejects_non_finite_parameters() {
        let mut config = GameConfig::default();
        config.dynamics = f64::NAN;
        assert!(config.validate().is_err());

        config.dynamics = f64::INFINITY;
        assert!(config.validate().is_err());

        config = GameConfig::default();
        config.conservative_multiplier = f64::NAN;
        assert!(config.validate().is_err());

        config.conservative_multiplier = -1.0;
        assert!(config.validate().is_err());

        config.conservative_multiplier = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_skill_model_kind_parsing() {
        assert_eq!("TrueSkill".parse(), Ok(SkillModelKind::TrueSkill));
        assert_eq!("weng_lin".parse(), Ok(SkillModelKind::WengLin));
        assert!("elo".parse::<SkillModelKind>().is_err());
    }
}
