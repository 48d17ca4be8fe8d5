//! Per-player lane strengths
//!
//! Strengths are entered as ratings from 0.0 to 100.0 with one decimal and
//! stored as integers ten times larger. `?` (or anything unparsable) marks an
//! unranked lane.

use crate::error::{MatchmakingError, Result};
use crate::persistence::codec::{decode_lanes, encode_lanes};
use crate::persistence::PersistentState;
use crate::types::{LanePlayerData, LaneStrengths, PlayerId, LANE_COUNT};
use std::collections::HashMap;

/// Highest stored lane strength
pub const MAX_LANE_STRENGTH: i32 = 1000;

/// Parse one rating such as `7.5` into its stored strength, `None` for unranked
pub fn parse_lane_rating(text: &str) -> Option<i32> {
    let rating: f64 = text.trim().parse().ok()?;
    if !rating.is_finite() {
        return None;
    }
    let scaled = (rating * 10.0).round().clamp(0.0, f64::from(MAX_LANE_STRENGTH));
    Some(scaled as i32)
}

/// Reject stored strengths outside `0..=MAX_LANE_STRENGTH`
pub fn validate_lane_strengths(player_id: PlayerId, lane_strength: &LaneStrengths) -> Result<()> {
    for strength in lane_strength.iter().flatten() {
        if !(0..=MAX_LANE_STRENGTH).contains(strength) {
            return Err(MatchmakingError::validation(format!(
                "Lane strength {} of player {} is outside 0..={}",
                strength, player_id, MAX_LANE_STRENGTH
            )));
        }
    }
    Ok(())
}

/// Render a stored strength the way it is entered
pub fn format_lane_rating(strength: Option<i32>) -> String {
    match strength {
        Some(strength) => format!("{:.1}", f64::from(strength) / 10.0),
        None => "?".to_string(),
    }
}

/// Parse exactly one rating per lane, in lane order
pub fn parse_lane_ratings<S: AsRef<str>>(ratings: &[S]) -> Result<LaneStrengths> {
    if ratings.len() != LANE_COUNT {
        return Err(MatchmakingError::validation(format!(
            "Expected {} lane ratings, got {}",
            LANE_COUNT,
            ratings.len()
        )));
    }

    let mut strengths: LaneStrengths = [None; LANE_COUNT];
    for (slot, text) in strengths.iter_mut().zip(ratings) {
        *slot = parse_lane_rating(text.as_ref());
    }
    Ok(strengths)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaneRatingStore {
    players: HashMap<PlayerId, LanePlayerData>,
}

impl LaneRatingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_player_data(&self, player_id: PlayerId) -> bool {
        self.players.contains_key(&player_id)
    }

    pub fn player_data(&self, player_id: PlayerId) -> Option<&LanePlayerData> {
        self.players.get(&player_id)
    }

    /// Register or replace a player's lane strengths
    pub fn update_player(
        &mut self,
        player_id: PlayerId,
        lane_strength: LaneStrengths,
    ) -> Result<()> {
        validate_lane_strengths(player_id, &lane_strength)?;
        self.players
            .insert(player_id, LanePlayerData::new(player_id, lane_strength));
        Ok(())
    }

    /// Every player, ordered by id
    pub fn all_player_data(&self) -> Vec<&LanePlayerData> {
        let mut players: Vec<&LanePlayerData> = self.players.values().collect();
        players.sort_by_key(|p| p.player_id);
        players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl PersistentState for LaneRatingStore {
    fn encode(&self) -> Result<String> {
        encode_lanes(self.players.values())
    }

    fn load_from(&mut self, contents: &str) -> Result<()> {
        self.players = decode_lanes(contents)?
            .into_iter()
            .map(|player| (player.player_id, player))
            .collect();
        Ok(())
    }

    fn clear(&mut self) {
        self.players.clear();
    }
}
