//! Weng-Lin (OpenSkill) rating model
//!
//! This module provides an alternative skill model using the Weng-Lin algorithm
//! from the skillratings crate. Team results are fed through the multi-team
//! update with explicit ranks, 1 = first place.

use crate::config::GameConfig;
use crate::error::{MatchmakingError, Result};
use crate::rating::skill::{collect_ratings, validate_two_teams, SkillModel};
use crate::types::{PlayerId, Rating};
use skillratings::weng_lin::{weng_lin_multi_team, WengLinConfig, WengLinRating};
use skillratings::MultiTeamOutcome;
use std::collections::HashMap;
use tracing::warn;

/// Default uncertainty tolerance for the Weng-Lin update
pub const DEFAULT_UNCERTAINTY_TOLERANCE: f64 = 0.000_001;

/// Weng-Lin skill model
#[derive(Debug, Clone)]
pub struct WengLinModel {
    game: GameConfig,
    config: WengLinConfig,
}

impl WengLinModel {
    /// Create a new Weng-Lin model sharing the game's beta
    pub fn new(game: GameConfig) -> Result<Self> {
        Self::with_tolerance(game, DEFAULT_UNCERTAINTY_TOLERANCE)
    }

    pub fn with_tolerance(game: GameConfig, uncertainty_tolerance: f64) -> Result<Self> {
        game.validate()?;

        if uncertainty_tolerance < 0.0 {
            return Err(MatchmakingError::validation(
                "Uncertainty tolerance must be non-negative",
            ));
        }

        Ok(Self {
            config: WengLinConfig {
                beta: game.beta,
                uncertainty_tolerance,
            },
            game,
        })
    }

    /// Collapse a team into one rating: summed skill, pooled uncertainty
    fn team_rating(team: &[Rating]) -> WengLinRating {
        WengLinRating {
            rating: team.iter().map(|r| r.mean).sum(),
            uncertainty: team.iter().map(|r| r.stddev.powi(2)).sum::<f64>().sqrt(),
        }
    }

    /// Probability that each team wins, `(team1, team2)`
    pub fn expected_score(&self, team1: &[Rating], team2: &[Rating]) -> (f64, f64) {
        skillratings::weng_lin::expected_score(
            &Self::team_rating(team1),
            &Self::team_rating(team2),
            &self.config,
        )
    }
}

impl SkillModel for WengLinModel {
    fn name(&self) -> &'static str {
        "weng_lin"
    }

    fn default_rating(&self) -> Rating {
        self.game.default_rating()
    }

    fn initial_rating(&self, mean: f64) -> Rating {
        self.game.initial_rating(mean)
    }

    fn update_ratings(
        &self,
        teams: &[Vec<(PlayerId, Rating)>],
        ranks: &[u32],
    ) -> Result<HashMap<PlayerId, Rating>> {
        validate_two_teams(teams, ranks)?;

        let teams_with_outcomes: Vec<(Vec<WengLinRating>, MultiTeamOutcome)> = teams
            .iter()
            .zip(ranks)
            .map(|(team, rank)| {
                let ratings = team.iter().map(|(_, r)| (*r).into()).collect();
                (ratings, MultiTeamOutcome::new(*rank as usize))
            })
            .collect();

        // Convert to the format expected by weng_lin_multi_team
        let teams_refs: Vec<(&[WengLinRating], MultiTeamOutcome)> = teams_with_outcomes
            .iter()
            .map(|(team, outcome)| (team.as_slice(), *outcome))
            .collect();

        let new_ratings = weng_lin_multi_team(&teams_refs, &self.config);
        if new_ratings.len() != teams.len() {
            warn!(
                "Weng-Lin returned {} teams for {} inputs",
                new_ratings.len(),
                teams.len()
            );
        }

        let updated: Vec<Vec<Rating>> = new_ratings
            .into_iter()
            .map(|team| {
                let multiplier = self.game.conservative_multiplier;
                team.into_iter()
                    .map(|r| Rating::new(r.rating, r.uncertainty, multiplier))
                    .collect()
            })
            .collect();

        if updated.len() != teams.len() {
            return Err(MatchmakingError::SkillCalculation {
                reason: "Weng-Lin update lost a team".to_string(),
            });
        }
        collect_ratings(teams, &updated)
    }

    fn match_quality(&self, team1: &[Rating], team2: &[Rating]) -> f64 {
        if team1.is_empty() || team2.is_empty() {
            return f64::MIN_POSITIVE;
        }

        // Even odds give 1.0, a foregone conclusion approaches 0
        let (team1_wins, team2_wins) = self.expected_score(team1, team2);
        (2.0 * team1_wins.min(team2_wins)).clamp(f64::MIN_POSITIVE, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> WengLinModel {
        WengLinModel::new(GameConfig::default()).unwrap()
    }

    fn team(ids: &[PlayerId], mean: f64) -> Vec<(PlayerId, Rating)> {
        ids.iter()
            .map(|id| (*id, Rating::new(mean, 25.0 / 3.0, 3.0)))
            .collect()
    }

    #[test]
    fn test_model_creation() {
        let model = model();
        let rating = model.default_rating();
        assert_eq!(rating.mean, 25.0);
        assert_eq!(rating.stddev, 25.0 / 3.0);

        assert!(WengLinModel::with_tolerance(GameConfig::default(), -1.0).is_err());
    }

    #[test]
    fn test_two_team_update() {
        let model = model();
        let updated = model
            .update_ratings(&[team(&[1, 2], 25.0), team(&[3, 4], 25.0)], &[1, 2])
            .unwrap();

        assert_eq!(updated.len(), 4);
        assert!(updated[&1].mean > 25.0);
        assert!(updated[&2].mean > 25.0);
        assert!(updated[&3].mean < 25.0);
        assert!(updated[&4].mean < 25.0);
    }

    #[test]
    fn test_expected_score_calculation() {
        let model = model();
        let strong = [Rating::new(35.0, 3.0, 3.0)];
        let weak = [Rating::new(15.0, 3.0, 3.0)];

        let (strong_wins, weak_wins) = model.expected_score(&strong, &weak);
        assert!(strong_wins > 0.7);
        assert!(weak_wins < 0.3);
        assert!((strong_wins + weak_wins - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_quality() {
        let model = model();
        let average = Rating::new(25.0, 3.0, 3.0);
        let strong = Rating::new(40.0, 3.0, 3.0);

        let even = model.match_quality(&[average, average], &[average, average]);
        let uneven = model.match_quality(&[strong, strong], &[average, average]);

        assert!((even - 1.0).abs() < 1e-9);
        assert!(uneven < even);
        assert!(uneven > 0.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let model = model();
        assert!(model.update_ratings(&[], &[]).is_err());
        assert!(model
            .update_ratings(&[team(&[1], 25.0), team(&[2], 25.0)], &[1])
            .is_err());
    }
}
