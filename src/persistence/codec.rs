//! JSON snapshot formats
//!
//! Rating snapshot, current format:
//!
//! ```json
//! {
//!   "version": 2,
//!   "ratings": { "1001": { "mean": 25.0, "std": 8.33, "multiplier": 3.0 } },
//!   "matchOutcomes": [ { "team1": [1001], "team2": [1002], "outcome": true } ]
//! }
//! ```
//!
//! Files without `version` are legacy. Their outcomes may use the older
//! `{"WINNERS": [...], "LOSERS": [...]}` shape, read as team 1 = winners.
//!
//! Lane snapshot: `{"version": 2, "players": [{"playerId": 1, "laneStrength": [..5]}]}`.
//! Unknown lanes are `null`; legacy files use `i32::MIN` instead.

use crate::error::{MatchmakingError, Result};
use crate::lanes::store::validate_lane_strengths;
use crate::types::{
    LanePlayerData, LaneStrengths, Match, MatchOutcome, PlayerId, Rating, LANE_COUNT,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Version written by this build
pub const FORMAT_VERSION: u32 = 2;

/// Lane strength written by older builds for an unranked lane
pub const LEGACY_UNKNOWN_LANE: i32 = i32::MIN;

/// Decoded content of a rating snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingSnapshot {
    pub ratings: BTreeMap<PlayerId, Rating>,
    pub match_history: Vec<MatchOutcome>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RatingFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    #[serde(default)]
    ratings: BTreeMap<PlayerId, Rating>,
    #[serde(default, rename = "matchOutcomes")]
    match_outcomes: Vec<OutcomeRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum OutcomeRecord {
    Teams {
        team1: Vec<PlayerId>,
        team2: Vec<PlayerId>,
        outcome: bool,
    },
    WinnersLosers {
        #[serde(rename = "WINNERS")]
        winners: Vec<PlayerId>,
        #[serde(rename = "LOSERS")]
        losers: Vec<PlayerId>,
    },
}

impl From<&MatchOutcome> for OutcomeRecord {
    fn from(outcome: &MatchOutcome) -> Self {
        OutcomeRecord::Teams {
            team1: outcome.matchup.team1.iter().copied().collect(),
            team2: outcome.matchup.team2.iter().copied().collect(),
            outcome: outcome.team1_won,
        }
    }
}

impl TryFrom<OutcomeRecord> for MatchOutcome {
    type Error = MatchmakingError;

    fn try_from(record: OutcomeRecord) -> Result<Self> {
        let (team1, team2, team1_won) = match record {
            OutcomeRecord::Teams {
                team1,
                team2,
                outcome,
            } => (team1, team2, outcome),
            OutcomeRecord::WinnersLosers { winners, losers } => (winners, losers, true),
        };

        let matchup = Match::new(team1, team2, None)
            .map_err(|e| MatchmakingError::decode(format!("Invalid stored match: {}", e)))?;
        Ok(MatchOutcome { matchup, team1_won })
    }
}

/// Serialize ratings and match history in the current format
pub fn encode_ratings(snapshot: &RatingSnapshot) -> Result<String> {
    let file = RatingFile {
        version: Some(FORMAT_VERSION),
        ratings: snapshot.ratings.clone(),
        match_outcomes: snapshot.match_history.iter().map(OutcomeRecord::from).collect(),
    };

    serde_json::to_string_pretty(&file)
        .map_err(|e| MatchmakingError::decode(format!("Failed to encode ratings: {}", e)))
}

/// Decode a rating snapshot in either the current or the legacy format
pub fn decode_ratings(contents: &str) -> Result<RatingSnapshot> {
    let file: RatingFile = serde_json::from_str(contents)
        .map_err(|e| MatchmakingError::decode(format!("Malformed rating snapshot: {}", e)))?;

    match file.version {
        None => debug!("Reading legacy rating snapshot"),
        Some(version) if version > FORMAT_VERSION => {
            return Err(MatchmakingError::decode(format!(
                "Unsupported rating snapshot version {}",
                version
            )));
        }
        Some(_) => {}
    }

    for (player_id, rating) in &file.ratings {
        if !rating.mean.is_finite() || !rating.stddev.is_finite() || rating.stddev < 0.0 {
            return Err(MatchmakingError::decode(format!(
                "Invalid rating stored for player {}",
                player_id
            )));
        }
    }

    let match_history = file
        .match_outcomes
        .into_iter()
        .map(MatchOutcome::try_from)
        .collect::<Result<Vec<_>>>()?;

    Ok(RatingSnapshot {
        ratings: file.ratings,
        match_history,
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct LaneFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<u32>,
    #[serde(default)]
    players: Vec<LaneRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LaneRecord {
    player_id: PlayerId,
    lane_strength: Vec<Option<i32>>,
}

/// Serialize lane data, sorted by player id
pub fn encode_lanes<'a>(players: impl IntoIterator<Item = &'a LanePlayerData>) -> Result<String> {
    let mut records: Vec<LaneRecord> = players
        .into_iter()
        .map(|player| LaneRecord {
            player_id: player.player_id,
            lane_strength: player.lane_strength.to_vec(),
        })
        .collect();
    records.sort_by_key(|record| record.player_id);

    let file = LaneFile {
        version: Some(FORMAT_VERSION),
        players: records,
    };
    serde_json::to_string_pretty(&file)
        .map_err(|e| MatchmakingError::decode(format!("Failed to encode lane data: {}", e)))
}

/// Decode lane data, skipping entries whose strength vector is not five lanes long
pub fn decode_lanes(contents: &str) -> Result<Vec<LanePlayerData>> {
    let file: LaneFile = serde_json::from_str(contents)
        .map_err(|e| MatchmakingError::decode(format!("Malformed lane snapshot: {}", e)))?;

    if let Some(version) = file.version {
        if version > FORMAT_VERSION {
            return Err(MatchmakingError::decode(format!(
                "Unsupported lane snapshot version {}",
                version
            )));
        }
    }

    let mut players = Vec::with_capacity(file.players.len());
    for record in file.players {
        if record.lane_strength.len() != LANE_COUNT {
            warn!(
                "Skipping lane data for player {}: expected {} lanes, found {}",
                record.player_id,
                LANE_COUNT,
                record.lane_strength.len()
            );
            continue;
        }

        let mut lane_strength: LaneStrengths = [None; LANE_COUNT];
        for (slot, value) in lane_strength.iter_mut().zip(record.lane_strength) {
            *slot = value.filter(|v| *v != LEGACY_UNKNOWN_LANE);
        }
        validate_lane_strengths(record.player_id, &lane_strength)
            .map_err(|e| MatchmakingError::decode(format!("Invalid stored lane data: {}", e)))?;
        players.push(LanePlayerData::new(record.player_id, lane_strength));
    }

    Ok(players)
}
