//! TrueSkill rating model
//!
//! Default skill model. Uses the two-team TrueSkill update and match quality
//! from the skillratings crate.

use crate::config::GameConfig;
use crate::error::Result;
use crate::rating::skill::{collect_ratings, validate_two_teams, SkillModel};
use crate::types::{PlayerId, Rating};
use skillratings::trueskill::{
    match_quality_two_teams, trueskill_two_teams, TrueSkillConfig, TrueSkillRating,
};
use skillratings::Outcomes;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TrueSkillModel {
    game: GameConfig,
    config: TrueSkillConfig,
}

impl TrueSkillModel {
    pub fn new(game: GameConfig) -> Result<Self> {
        game.validate()?;

        let config = TrueSkillConfig {
            draw_probability: game.draw_probability,
            beta: game.beta,
            default_dynamics: game.dynamics,
        };

        Ok(Self { game, config })
    }

    fn to_rating(&self, rating: TrueSkillRating) -> Rating {
        Rating::new(
            rating.rating,
            rating.uncertainty,
            self.game.conservative_multiplier,
        )
    }
}

impl SkillModel for TrueSkillModel {
    fn name(&self) -> &'static str {
        "trueskill"
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

        let outcome = match ranks[0].cmp(&ranks[1]) {
            Ordering::Less => Outcomes::WIN,
            Ordering::Greater => Outcomes::LOSS,
            Ordering::Equal => Outcomes::DRAW,
        };

        let team1: Vec<TrueSkillRating> = teams[0].iter().map(|(_, r)| (*r).into()).collect();
        let team2: Vec<TrueSkillRating> = teams[1].iter().map(|(_, r)| (*r).into()).collect();

        let (new_team1, new_team2) = trueskill_two_teams(&team1, &team2, &outcome, &self.config);
        debug!(
            "TrueSkill update for {} vs {} players",
            team1.len(),
            team2.len()
        );

        let updated = [
            new_team1.into_iter().map(|r| self.to_rating(r)).collect(),
            new_team2.into_iter().map(|r| self.to_rating(r)).collect(),
        ];
        collect_ratings(teams, &updated)
    }

    fn match_quality(&self, team1: &[Rating], team2: &[Rating]) -> f64 {
        let team1: Vec<TrueSkillRating> = team1.iter().map(|r| (*r).into()).collect();
        let team2: Vec<TrueSkillRating> = team2.iter().map(|r| (*r).into()).collect();

        match_quality_two_teams(&team1, &team2, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> TrueSkillModel {
        TrueSkillModel::new(GameConfig::default()).unwrap()
    }

    fn default_team(ids: &[PlayerId]) -> Vec<(PlayerId, Rating)> {
        ids.iter()
            .map(|id| (*id, GameConfig::default().default_rating()))
            .collect()
    }

    #[test]
    fn test_winners_gain_losers_drop() {
        let model = model();
        let updated = model
            .update_ratings(&[default_team(&[1, 2]), default_team(&[3, 4])], &[1, 2])
            .unwrap();

        assert_eq!(updated.len(), 4);
        for winner in [1, 2] {
            assert!(updated[&winner].mean > 25.0);
            assert!(updated[&winner].stddev < 25.0 / 3.0);
            assert_eq!(updated[&winner].conservative_multiplier, 3.0);
        }
        for loser in [3, 4] {
            assert!(updated[&loser].mean < 25.0);
        }
    }

    #[test]
    fn test_reversed_ranks_favour_second_team() {
        let model = model();
        let updated = model
            .update_ratings(&[default_team(&[1]), default_team(&[2])], &[2, 1])
            .unwrap();

        assert!(updated[&1].mean < 25.0);
        assert!(updated[&2].mean > 25.0);
    }

    #[test]
    fn test_quality_prefers_even_teams() {
        let model = model();
        let strong = Rating::new(35.0, 2.0, 3.0);
        let weak = Rating::new(15.0, 2.0, 3.0);
        let average = Rating::new(25.0, 2.0, 3.0);

        let even = model.match_quality(&[strong, weak], &[average, average]);
        let lopsided = model.match_quality(&[strong, strong], &[weak, weak]);

        assert!(even > lopsided);
        assert!(even > 0.0 && even <= 1.0);
        assert!(lopsided > 0.0);
    }

    #[test]
    fn test_rejects_single_team() {
        let model = model();
        assert!(model.update_ratings(&[default_team(&[1])], &[1]).is_err());
    }
}
