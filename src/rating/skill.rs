//! Skill model trait and factory
//!
//! A skill model turns a two-team result into new ratings and scores how evenly
//! a proposed split is expected to play out. The stores and finders only see
//! this trait, so the rating algorithm can be swapped per game.

use crate::config::{GameConfig, SkillModelKind};
use crate::error::{MatchmakingError, Result};
use crate::rating::trueskill::TrueSkillModel;
use crate::rating::weng_lin::WengLinModel;
use crate::types::{PlayerId, Rating};
use std::collections::HashMap;

/// Pluggable rating algorithm
#[cfg_attr(test, mockall::automock)]
pub trait SkillModel: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Rating assumed for players that were never registered
    fn default_rating(&self) -> Rating;

    /// Rating for a newly registered player with the given mean
    fn initial_rating(&self, mean: f64) -> Rating;

    /// Compute new ratings for every player of `teams`.
    ///
    /// `ranks[i]` is the finishing position of `teams[i]`, 1 = winner.
    fn update_ratings(
        &self,
        teams: &[Vec<(PlayerId, Rating)>],
        ranks: &[u32],
    ) -> Result<HashMap<PlayerId, Rating>>;

    /// Quality of `team1` vs `team2` in (0, 1]; higher is more balanced
    fn match_quality(&self, team1: &[Rating], team2: &[Rating]) -> f64;
}

/// Build the configured skill model
pub fn create_skill_model(kind: SkillModelKind, game: GameConfig) -> Result<Box<dyn SkillModel>> {
    Ok(match kind {
        SkillModelKind::TrueSkill => Box::new(TrueSkillModel::new(game)?),
        SkillModelKind::WengLin => Box::new(WengLinModel::new(game)?),
    })
}

/// Check the shape shared by both two-team models
pub(crate) fn validate_two_teams(teams: &[Vec<(PlayerId, Rating)>], ranks: &[u32]) -> Result<()> {
    if teams.len() != 2 || ranks.len() != 2 {
        return Err(MatchmakingError::SkillCalculation {
            reason: format!(
                "Expected two teams with two ranks, got {} teams and {} ranks",
                teams.len(),
                ranks.len()
            ),
        });
    }
    if teams.iter().any(|team| team.is_empty()) {
        return Err(MatchmakingError::SkillCalculation {
            reason: "Every team needs at least one player".to_string(),
        });
    }
    Ok(())
}

/// Collect updated ratings, rejecting anything the algorithm produced that is not finite
pub(crate) fn collect_ratings(
    teams: &[Vec<(PlayerId, Rating)>],
    updated: &[Vec<Rating>],
) -> Result<HashMap<PlayerId, Rating>> {
    let mut result = HashMap::new();
    for (team, new_ratings) in teams.iter().zip(updated) {
        if team.len() != new_ratings.len() {
            return Err(MatchmakingError::SkillCalculation {
                reason: format!(
                    "Expected {} updated ratings, got {}",
                    team.len(),
                    new_ratings.len()
                ),
            });
        }
        for ((player_id, _), rating) in team.iter().zip(new_ratings) {
            if !rating.mean.is_finite() || !rating.stddev.is_finite() {
                return Err(MatchmakingError::SkillCalculation {
                    reason: format!("Non-finite rating computed for player {}", player_id),
                });
            }
            result.insert(*player_id, *rating);
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(ids: &[PlayerId]) -> Vec<(PlayerId, Rating)> {
        ids.iter()
            .map(|id| (*id, GameConfig::default().default_rating()))
            .collect()
    }

    #[test]
    fn test_factory_builds_both_models() {
        let trueskill =
            create_skill_model(SkillModelKind::TrueSkill, GameConfig::default()).unwrap();
        assert_eq!(trueskill.name(), "trueskill");

        let weng_lin = create_skill_model(SkillModelKind::WengLin, GameConfig::default()).unwrap();
        assert_eq!(weng_lin.name(), "weng_lin");
    }

    #[test]
    fn test_factory_rejects_invalid_config() {
        let game = GameConfig {
            beta: -2.0,
            ..GameConfig::default()
        };
        assert!(create_skill_model(SkillModelKind::TrueSkill, game).is_err());
    }

    #[test]
    fn test_validate_two_teams() {
        assert!(validate_two_teams(&[team(&[1]), team(&[2])], &[1, 2]).is_ok());
        assert!(validate_two_teams(&[team(&[1])], &[1]).is_err());
        assert!(validate_two_teams(&[team(&[1]), team(&[])], &[1, 2]).is_err());
        assert!(validate_two_teams(&[team(&[1]), team(&[2])], &[1]).is_err());
    }

    #[test]
    fn test_collect_ratings_rejects_nan() {
        let teams = vec![team(&[1]), team(&[2])];
        let bad = Rating::new(f64::NAN, 1.0, 3.0);
        let good = Rating::new(20.0, 1.0, 3.0);

        assert!(collect_ratings(&teams, &[vec![good], vec![bad]]).is_err());
        assert!(collect_ratings(&teams, &[vec![good], vec![]]).is_err());

        let collected = collect_ratings(&teams, &[vec![good], vec![good]]).unwrap();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected[&1], good);
    }
}
