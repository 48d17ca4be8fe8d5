//! Player ratings and win/loss statistics
//!
//! The store owns one [`PlayerStats`] per known player and one [`PartnerStats`]
//! per ordered pair of players who have shared a match. Both maps are flat;
//! partner entries are keyed by `(player, other)`.

use crate::error::{MatchmakingError, Result};
use crate::persistence::codec::{decode_ratings, encode_ratings};
use crate::persistence::{PersistentState, RatingSnapshot};
use crate::rating::skill::SkillModel;
use crate::types::{MatchOutcome, PlayerId, Rating};
use crate::utils::win_rate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Rating and overall record of one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: PlayerId,
    pub rating: Rating,
    pub games_won: u32,
    pub games_lost: u32,
}

impl PlayerStats {
    pub fn new(player_id: PlayerId, rating: Rating) -> Self {
        Self {
            player_id,
            rating,
            games_won: 0,
            games_lost: 0,
        }
    }

    pub fn total_games_played(&self) -> u32 {
        self.games_won + self.games_lost
    }

    /// `None` until the player has finished a game
    pub fn win_rate(&self) -> Option<f64> {
        win_rate(self.games_won, self.games_lost)
    }
}

/// Record of `player_id` together with or against `other_player_id`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerStats {
    pub player_id: PlayerId,
    pub other_player_id: PlayerId,
    pub games_won_with: u32,
    pub games_lost_with: u32,
    pub games_won_against: u32,
    pub games_lost_against: u32,
}

impl PartnerStats {
    pub fn new(player_id: PlayerId, other_player_id: PlayerId) -> Self {
        Self {
            player_id,
            other_player_id,
            ..Self::default()
        }
    }

    pub fn games_with(&self) -> u32 {
        self.games_won_with + self.games_lost_with
    }

    pub fn games_against(&self) -> u32 {
        self.games_won_against + self.games_lost_against
    }

    pub fn win_rate_with(&self) -> Option<f64> {
        win_rate(self.games_won_with, self.games_lost_with)
    }

    pub fn win_rate_against(&self) -> Option<f64> {
        win_rate(self.games_won_against, self.games_lost_against)
    }
}

/// Ratings, counters and match history for one game
#[derive(Debug, Clone, PartialEq)]
pub struct RatingStore {
    default_rating: Rating,
    players: HashMap<PlayerId, PlayerStats>,
    partners: HashMap<(PlayerId, PlayerId), PartnerStats>,
    match_history: Vec<MatchOutcome>,
}

impl RatingStore {
    /// Create an empty store; `default_rating` is used for unknown players
    pub fn new(default_rating: Rating) -> Self {
        Self {
            default_rating,
            players: HashMap::new(),
            partners: HashMap::new(),
            match_history: Vec::new(),
        }
    }

    pub fn default_rating(&self) -> Rating {
        self.default_rating
    }

    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.players.contains_key(&player_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn player_stats(&self, player_id: PlayerId) -> Result<&PlayerStats> {
        self.players
            .get(&player_id)
            .ok_or_else(|| MatchmakingError::not_found(format!("player {}", player_id)))
    }

    /// Every known player, ordered by id
    pub fn all_player_stats(&self) -> Vec<&PlayerStats> {
        let mut stats: Vec<&PlayerStats> = self.players.values().collect();
        stats.sort_by_key(|s| s.player_id);
        stats
    }

    /// Every known player, highest mean first
    pub fn leaderboard(&self) -> Vec<&PlayerStats> {
        let mut stats = self.all_player_stats();
        stats.sort_by(|a, b| {
            b.rating
                .mean
                .total_cmp(&a.rating.mean)
                .then(a.player_id.cmp(&b.player_id))
        });
        stats
    }

    /// Partner records of one player, ordered by the other player's id
    pub fn partner_stats(&self, player_id: PlayerId) -> Result<Vec<&PartnerStats>> {
        if !self.has_player(player_id) {
            return Err(MatchmakingError::not_found(format!("player {}", player_id)));
        }

        let mut stats: Vec<&PartnerStats> = self
            .partners
            .values()
            .filter(|p| p.player_id == player_id)
            .collect();
        stats.sort_by_key(|p| p.other_player_id);
        Ok(stats)
    }

    pub fn partner(&self, player_id: PlayerId, other_player_id: PlayerId) -> Option<&PartnerStats> {
        self.partners.get(&(player_id, other_player_id))
    }

    pub fn match_history(&self) -> &[MatchOutcome] {
        &self.match_history
    }

    /// Stored rating, or the default rating for an unknown player
    pub fn rating_or_default(&self, player_id: PlayerId) -> Rating {
        self.players
            .get(&player_id)
            .map(|s| s.rating)
            .unwrap_or(self.default_rating)
    }

    pub fn create_player(&mut self, player_id: PlayerId, rating: Rating) -> Result<()> {
        if self.has_player(player_id) {
            return Err(MatchmakingError::DuplicatePlayer { player_id });
        }
        self.players
            .insert(player_id, PlayerStats::new(player_id, rating));
        debug!("Created player {} with mean {}", player_id, rating.mean);
        Ok(())
    }

    /// Apply a played match: new ratings for everyone, then counters and history.
    ///
    /// Nothing is touched if the skill model fails.
    pub fn apply_outcome(&mut self, outcome: &MatchOutcome, model: &dyn SkillModel) -> Result<()> {
        let winners: Vec<(PlayerId, Rating)> = outcome
            .winning_players()
            .iter()
            .map(|id| (*id, self.rating_or_default(*id)))
            .collect();
        let losers: Vec<(PlayerId, Rating)> = outcome
            .losing_players()
            .iter()
            .map(|id| (*id, self.rating_or_default(*id)))
            .collect();

        let updated = model.update_ratings(&[winners, losers], &[1, 2])?;

        let roster = outcome.matchup.roster();
        let mut new_ratings = Vec::with_capacity(roster.len());
        for player_id in &roster {
            let rating = updated.get(player_id).ok_or_else(|| MatchmakingError::SkillCalculation {
                reason: format!("No updated rating for player {}", player_id),
            })?;
            new_ratings.push((*player_id, *rating));
        }

        for (player_id, rating) in new_ratings {
            self.stats_entry(player_id).rating = rating;
        }
        self.record_counters(outcome);

        // History keeps only what the save file can hold
        let mut recorded = outcome.clone();
        recorded.matchup.quality = None;
        self.match_history.push(recorded);

        debug!(
            "Applied outcome: {} won, {} players rated",
            outcome.winner(),
            roster.len()
        );
        Ok(())
    }

    fn record_counters(&mut self, outcome: &MatchOutcome) {
        let winners = outcome.winning_players();
        let losers = outcome.losing_players();

        for &winner in winners {
            self.stats_entry(winner).games_won += 1;
            for &teammate in winners.iter().filter(|id| **id != winner) {
                self.partner_entry(winner, teammate).games_won_with += 1;
            }
            for &opponent in losers {
                self.partner_entry(winner, opponent).games_won_against += 1;
            }
        }

        for &loser in losers {
            self.stats_entry(loser).games_lost += 1;
            for &teammate in losers.iter().filter(|id| **id != loser) {
                self.partner_entry(loser, teammate).games_lost_with += 1;
            }
            for &opponent in winners {
                self.partner_entry(loser, opponent).games_lost_against += 1;
            }
        }
    }

    /// Stats of `player_id`; creates if missing, never fails
    fn stats_entry(&mut self, player_id: PlayerId) -> &mut PlayerStats {
        let default_rating = self.default_rating;
        self.players
            .entry(player_id)
            .or_insert_with(|| PlayerStats::new(player_id, default_rating))
    }

    /// Partner record of the ordered pair; creates if missing, never fails
    fn partner_entry(
        &mut self,
        player_id: PlayerId,
        other_player_id: PlayerId,
    ) -> &mut PartnerStats {
        self.partners
            .entry((player_id, other_player_id))
            .or_insert_with(|| PartnerStats::new(player_id, other_player_id))
    }

    /// Whole-store copy
    pub fn snapshot(&self) -> RatingStore {
        self.clone()
    }

    /// Replace the whole store with a previous snapshot
    pub fn restore(&mut self, snapshot: RatingStore) {
        *self = snapshot;
    }

    /// Reset to the persisted ratings, rebuilding counters by replaying the history
    pub fn rebuild(&mut self, snapshot: RatingSnapshot) {
        self.clear();
        for (player_id, rating) in snapshot.ratings {
            self.players
                .insert(player_id, PlayerStats::new(player_id, rating));
        }
        for outcome in &snapshot.match_history {
            self.record_counters(outcome);
        }
        self.match_history = snapshot.match_history;
    }

    fn to_snapshot(&self) -> RatingSnapshot {
        RatingSnapshot {
            ratings: self
                .players
                .iter()
                .map(|(id, stats)| (*id, stats.rating))
                .collect(),
            match_history: self.match_history.clone(),
        }
    }
}

impl PersistentState for RatingStore {
    fn encode(&self) -> Result<String> {
        encode_ratings(&self.to_snapshot())
    }

    fn load_from(&mut self, contents: &str) -> Result<()> {
        let snapshot = decode_ratings(contents)?;
        self.rebuild(snapshot);
        Ok(())
    }

    fn clear(&mut self) {
        self.players.clear();
        self.partners.clear();
        self.match_history.clear();
    }
}
