//! Common types used throughout the rating and matchmaking engines

use crate::error::{MatchmakingError, Result};
use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillRating;
use skillratings::weng_lin::WengLinRating;
use std::collections::BTreeSet;

/// Externally assigned player identifier (a chat user id)
pub type PlayerId = u64;

/// Skill estimate for one player. Replaced wholesale on every update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub mean: f64,
    #[serde(rename = "std")]
    pub stddev: f64,
    #[serde(rename = "multiplier")]
    pub conservative_multiplier: f64,
}

impl Rating {
    pub fn new(mean: f64, stddev: f64, conservative_multiplier: f64) -> Self {
        Self {
            mean,
            stddev,
            conservative_multiplier,
        }
    }

    /// Skill value the player is very likely to exceed: `mean - k * stddev`
    pub fn conservative_rating(&self) -> f64 {
        self.mean - self.conservative_multiplier * self.stddev
    }
}

impl From<Rating> for TrueSkillRating {
    fn from(rating: Rating) -> Self {
        Self {
            rating: rating.mean,
            uncertainty: rating.stddev,
        }
    }
}

impl From<Rating> for WengLinRating {
    fn from(rating: Rating) -> Self {
        Self {
            rating: rating.mean,
            uncertainty: rating.stddev,
        }
    }
}

/// One side of a two-team match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Team1,
    Team2,
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Team::Team1 => write!(f, "Team 1"),
            Team::Team2 => write!(f, "Team 2"),
        }
    }
}

/// A proposed or played split of a roster into two disjoint teams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub team1: BTreeSet<PlayerId>,
    pub team2: BTreeSet<PlayerId>,
    /// Quality in (0, 1] when the match came out of a search
    pub quality: Option<f64>,
}

impl Match {
    /// Build a match, rejecting empty or overlapping teams
    pub fn new(
        team1: impl IntoIterator<Item = PlayerId>,
        team2: impl IntoIterator<Item = PlayerId>,
        quality: Option<f64>,
    ) -> Result<Self> {
        let team1: BTreeSet<PlayerId> = team1.into_iter().collect();
        let team2: BTreeSet<PlayerId> = team2.into_iter().collect();

        if team1.is_empty() || team2.is_empty() {
            return Err(MatchmakingError::validation(
                "Both teams need at least one player",
            ));
        }
        if let Some(player_id) = team1.intersection(&team2).next() {
            return Err(MatchmakingError::validation(format!(
                "Player {} cannot be on both teams",
                player_id
            )));
        }

        Ok(Self {
            team1,
            team2,
            quality,
        })
    }

    /// Every player taking part in the match
    pub fn roster(&self) -> BTreeSet<PlayerId> {
        self.team1.union(&self.team2).copied().collect()
    }

    pub fn team(&self, team: Team) -> &BTreeSet<PlayerId> {
        match team {
            Team::Team1 => &self.team1,
            Team::Team2 => &self.team2,
        }
    }
}

/// The result of a played match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub matchup: Match,
    pub team1_won: bool,
}

impl MatchOutcome {
    pub fn team1_won(matchup: Match) -> Self {
        Self {
            matchup,
            team1_won: true,
        }
    }

    pub fn team2_won(matchup: Match) -> Self {
        Self {
            matchup,
            team1_won: false,
        }
    }

    pub fn won_by(matchup: Match, winner: Team) -> Self {
        match winner {
            Team::Team1 => Self::team1_won(matchup),
            Team::Team2 => Self::team2_won(matchup),
        }
    }

    pub fn winner(&self) -> Team {
        if self.team1_won {
            Team::Team1
        } else {
            Team::Team2
        }
    }

    pub fn winning_players(&self) -> &BTreeSet<PlayerId> {
        if self.team1_won {
            &self.matchup.team1
        } else {
            &self.matchup.team2
        }
    }

    pub fn losing_players(&self) -> &BTreeSet<PlayerId> {
        if self.team1_won {
            &self.matchup.team2
        } else {
            &self.matchup.team1
        }
    }
}

/// Number of lanes (roles) in the lane-based game
pub const LANE_COUNT: usize = 5;

/// Per-lane strength, `None` when the player is unranked in that lane
pub type LaneStrengths = [Option<i32>; LANE_COUNT];

/// Roles of the lane-based game, indexed 0..5
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    Top,
    Jungle,
    Mid,
    Bot,
    Support,
}

impl Lane {
    pub const ALL: [Lane; LANE_COUNT] = [
        Lane::Top,
        Lane::Jungle,
        Lane::Mid,
        Lane::Bot,
        Lane::Support,
    ];

    pub fn index(self) -> usize {
        match self {
            Lane::Top => 0,
            Lane::Jungle => 1,
            Lane::Mid => 2,
            Lane::Bot => 3,
            Lane::Support => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Lane::Top => "Top",
            Lane::Jungle => "Jungle",
            Lane::Mid => "Mid",
            Lane::Bot => "Bot",
            Lane::Support => "Support",
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lane strengths registered for one player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanePlayerData {
    pub player_id: PlayerId,
    pub lane_strength: LaneStrengths,
}

impl LanePlayerData {
    pub fn new(player_id: PlayerId, lane_strength: LaneStrengths) -> Self {
        Self {
            player_id,
            lane_strength,
        }
    }

    pub fn strength(&self, lane: Lane) -> Option<i32> {
        self.lane_strength[lane.index()]
    }

    /// Strength added to a team score when playing `lane_index`, zero if unranked
    pub fn contribution(&self, lane_index: usize) -> i64 {
        self.lane_strength[lane_index].map(i64::from).unwrap_or(0)
    }
}

/// A 5v5 candidate produced by the lane matchmaker.
///
/// Team lists are ordered by lane (top, jungle, mid, bot, support) according to the
/// strongest assignment found for that team. Positive diffs favour team 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneMatch {
    pub team1: Vec<LanePlayerData>,
    pub team2: Vec<LanePlayerData>,
    pub max_strength_diff: i32,
    pub expected_lane_variance: f64,
    pub average_strength_diff: i32,
}

impl LaneMatch {
    /// Swap the team labels, negating every signed statistic
    pub fn mirror(self) -> Self {
        Self {
            team1: self.team2,
            team2: self.team1,
            max_strength_diff: -self.max_strength_diff,
            expected_lane_variance: -self.expected_lane_variance,
            average_strength_diff: -self.average_strength_diff,
        }
    }

    pub fn team1_ids(&self) -> BTreeSet<PlayerId> {
        self.team1.iter().map(|p| p.player_id).collect()
    }

    pub fn team2_ids(&self) -> BTreeSet<PlayerId> {
        self.team2.iter().map(|p| p.player_id).collect()
    }
}
