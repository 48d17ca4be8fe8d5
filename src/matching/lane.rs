//! 5v5 lane-aware match search
//!
//! For every split of ten players into two teams of five, each team's best lane
//! assignments are found by brute force over all 5! orderings. The strongest
//! few assignments of each side are played against each other to estimate how
//! lopsided the lanes will be, and the splits with the smallest expected lane
//! imbalance win.
//!
//! The expected variance is a weighting heuristic, not a probability model.

use crate::error::{MatchmakingError, Result};
use crate::lanes::store::validate_lane_strengths;
use crate::matching::combinatorics::{combinations, permutations};
use crate::matching::top_k::BoundedTopK;
use crate::types::{Lane, LaneMatch, LanePlayerData, PlayerId, LANE_COUNT};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::debug;

/// Players per team
pub const TEAM_SIZE: usize = LANE_COUNT;

/// Players in a lane match
pub const ROSTER_SIZE: usize = 2 * TEAM_SIZE;

/// Weights of the five lanes followed by the two bot/support cross terms
pub const LANE_WEIGHTS: [i64; 7] = [7, 10, 10, 3, 4, 3, 3];

const BOT_SUPPORT_WEIGHT: usize = 5;
const SUPPORT_BOT_WEIGHT: usize = 6;

/// Divisor of the weighted square sum
pub const LANE_WEIGHT_SUM: i64 = {
    let mut sum = 0;
    let mut i = 0;
    while i < LANE_WEIGHTS.len() {
        sum += LANE_WEIGHTS[i];
        i += 1;
    }
    sum
};

/// One assignment of a team's players to lanes, index = lane
#[derive(Debug, Clone)]
struct TeamConfiguration<'p> {
    players: Vec<&'p LanePlayerData>,
    strength: i64,
}

impl<'p> TeamConfiguration<'p> {
    fn new(players: Vec<&'p LanePlayerData>) -> Self {
        let strength = players
            .iter()
            .enumerate()
            .map(|(lane, player)| player.contribution(lane))
            .sum();
        Self { players, strength }
    }
}

/// Weighted squared difference keeping its sign; zero if either side is unranked
fn signed_square(ours: Option<i32>, theirs: Option<i32>, weight: i64) -> i64 {
    match (ours, theirs) {
        (Some(ours), Some(theirs)) => {
            let diff = i64::from(ours) - i64::from(theirs);
            let square = diff * diff * weight;
            if diff > 0 {
                square
            } else {
                -square
            }
        }
        _ => 0,
    }
}

/// Weighted lane variance of two lane assignments; positive favours `team1`.
///
/// Both slices are indexed by lane. Lanes where either player is unranked are skipped.
pub fn lane_variance(team1: &[&LanePlayerData], team2: &[&LanePlayerData]) -> f64 {
    let mut square_variance: i64 = Lane::ALL
        .iter()
        .map(|lane| {
            let i = lane.index();
            let (ours, theirs) = (team1[i].strength(*lane), team2[i].strength(*lane));
            signed_square(ours, theirs, LANE_WEIGHTS[i])
        })
        .sum();

    let bot = Lane::Bot.index();
    let support = Lane::Support.index();
    square_variance += signed_square(
        team1[bot].strength(Lane::Bot),
        team2[support].strength(Lane::Support),
        LANE_WEIGHTS[BOT_SUPPORT_WEIGHT],
    );
    square_variance += signed_square(
        team1[support].strength(Lane::Support),
        team2[bot].strength(Lane::Bot),
        LANE_WEIGHTS[SUPPORT_BOT_WEIGHT],
    );

    let magnitude = (square_variance.abs() as f64 / LANE_WEIGHT_SUM as f64).sqrt();
    if square_variance > 0 {
        magnitude
    } else {
        -magnitude
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Score used to rank splits; lower is more balanced
pub fn match_strength(lane_match: &LaneMatch) -> f64 {
    let strength_gap = f64::from(lane_match.max_strength_diff) / 20.0;
    lane_match.expected_lane_variance.abs() + strength_gap.abs()
}

/// Players of the strongest assignment in lane order, or the team as given
fn lane_order(
    configs: &[TeamConfiguration<'_>],
    team: &[&LanePlayerData],
) -> Vec<LanePlayerData> {
    let players = configs.first().map_or(team, |c| c.players.as_slice());
    players.iter().map(|p| (*p).clone()).collect()
}

/// Scale `totals` so they sum to one, falling back to equal weights when they sum to zero
fn normalize(totals: &[f64]) -> Vec<f64> {
    let sum: f64 = totals.iter().sum();
    if sum == 0.0 {
        let uniform = 1.0 / totals.len() as f64;
        return vec![uniform; totals.len()];
    }
    totals.iter().map(|total| total / sum).collect()
}

#[derive(Debug, Clone)]
pub struct LaneMatchFinder {
    /// Lane assignments kept per team
    pub permutations_to_consider: usize,
    /// Best splits kept before the random pick
    pub candidates_to_consider: usize,
    /// Splits returned to the caller
    pub candidates_to_return: usize,
}

impl Default for LaneMatchFinder {
    fn default() -> Self {
        Self {
            permutations_to_consider: 8,
            candidates_to_consider: 5,
            candidates_to_return: 2,
        }
    }
}

impl LaneMatchFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Random picks among the most balanced splits, each possibly mirrored
    pub fn find_candidates<R>(
        &self,
        players: &[LanePlayerData],
        rng: &mut R,
    ) -> Result<Vec<LaneMatch>>
    where
        R: Rng + ?Sized,
    {
        let mut candidates = self.ranked_candidates(players)?;
        candidates.shuffle(rng);
        candidates.truncate(self.candidates_to_return);

        Ok(candidates
            .into_iter()
            .map(|candidate| {
                if rng.gen_bool(0.5) {
                    candidate.mirror()
                } else {
                    candidate
                }
            })
            .collect())
    }

    /// The most balanced splits, best first
    pub fn ranked_candidates(&self, players: &[LanePlayerData]) -> Result<Vec<LaneMatch>> {
        let mut roster: Vec<&LanePlayerData> = players.iter().collect();
        roster.sort_by_key(|p| p.player_id);

        if roster.len() != ROSTER_SIZE {
            return Err(MatchmakingError::validation(format!(
                "Lane matchmaking needs exactly {} players, got {}",
                ROSTER_SIZE,
                roster.len()
            )));
        }
        let unique: BTreeSet<PlayerId> = roster.iter().map(|p| p.player_id).collect();
        if unique.len() != roster.len() {
            return Err(MatchmakingError::validation(
                "Lane matchmaking roster contains duplicate players",
            ));
        }
        for player in &roster {
            validate_lane_strengths(player.player_id, &player.lane_strength)?;
        }

        // The first player always plays on team 1, so no split is seen mirrored
        let (fixed, others) = roster.split_at(1);

        let mut best = BoundedTopK::new(self.candidates_to_consider);
        let mut evaluated = 0;
        for partners in combinations(others, TEAM_SIZE - 1) {
            let team1: Vec<&LanePlayerData> =
                fixed.iter().chain(partners.iter()).copied().collect();
            let team2: Vec<&LanePlayerData> = others
                .iter()
                .copied()
                .filter(|p| !partners.iter().any(|q| q.player_id == p.player_id))
                .collect();

            let lane_match = self.evaluate(&team1, &team2);
            best.push(-match_strength(&lane_match), lane_match);
            evaluated += 1;
        }

        debug!("Evaluated {} lane splits", evaluated);
        Ok(best
            .into_sorted_vec()
            .into_iter()
            .map(|(_, lane_match)| lane_match)
            .collect())
    }

    /// Statistics of one fixed split
    pub fn evaluate(&self, team1: &[&LanePlayerData], team2: &[&LanePlayerData]) -> LaneMatch {
        let configs1 = self.top_configurations(team1);
        let configs2 = self.top_configurations(team2);

        let mut variances = vec![vec![0.0; configs2.len()]; configs1.len()];
        let mut totals1 = vec![0.0; configs1.len()];
        let mut totals2 = vec![0.0; configs2.len()];
        for (i, config1) in configs1.iter().enumerate() {
            for (j, config2) in configs2.iter().enumerate() {
                let variance = lane_variance(&config1.players, &config2.players);
                variances[i][j] = variance;
                totals1[i] += variance;
                totals2[j] += variance;
            }
        }

        let weights1 = normalize(&totals1);
        let weights2 = normalize(&totals2);
        let mut expected_lane_variance = 0.0;
        for (i, weight1) in weights1.iter().enumerate() {
            for (j, weight2) in weights2.iter().enumerate() {
                expected_lane_variance += weight1 * weight2 * variances[i][j];
            }
        }

        let best_strength =
            |configs: &[TeamConfiguration<'_>]| configs.first().map_or(0, |c| c.strength);
        let total_strength =
            |configs: &[TeamConfiguration<'_>]| configs.iter().map(|c| c.strength).sum::<i64>();
        let max_strength_diff = best_strength(&configs1) - best_strength(&configs2);
        let average_strength_diff = total_strength(&configs1) - total_strength(&configs2);

        LaneMatch {
            team1: lane_order(&configs1, team1),
            team2: lane_order(&configs2, team2),
            max_strength_diff: saturate(max_strength_diff),
            expected_lane_variance,
            average_strength_diff: saturate(average_strength_diff),
        }
    }

    /// The strongest lane assignments of a team, strongest first
    fn top_configurations<'p>(&self, team: &[&'p LanePlayerData]) -> Vec<TeamConfiguration<'p>> {
        let mut top = BoundedTopK::new(self.permutations_to_consider);
        for ordering in permutations(team) {
            let config = TeamConfiguration::new(ordering);
            top.push(config.strength as f64, config);
        }
        top.into_sorted_vec()
            .into_iter()
            .map(|(_, config)| config)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lanes::store::MAX_LANE_STRENGTH;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn flat(player_id: PlayerId, strength: i32) -> LanePlayerData {
        LanePlayerData::new(player_id, [Some(strength); LANE_COUNT])
    }

    fn spread_roster() -> Vec<LanePlayerData> {
        (0..10u64)
            .map(|i| {
                let base = 20 + (i as i32) * 7;
                LanePlayerData::new(
                    100 + i,
                    [
                        Some(base),
                        Some(base + 10),
                        Some(90 - base / 2),
                        Some((base * 3) % 80),
                        Some(40 + (i as i32 % 3) * 5),
                    ],
                )
            })
            .collect()
    }

    #[test]
    fn test_lane_variance_exact() {
        let strong: Vec<LanePlayerData> = (0..5).map(|i| flat(i, 10)).collect();
        let weak: Vec<LanePlayerData> = (5..10).map(|i| flat(i, 0)).collect();
        let strong: Vec<&LanePlayerData> = strong.iter().collect();
        let weak: Vec<&LanePlayerData> = weak.iter().collect();

        // (100 * 34 + 100 * 3 + 100 * 3) / 40 = 100
        assert_eq!(lane_variance(&strong, &weak), 10.0);
        assert_eq!(lane_variance(&weak, &strong), -10.0);
        assert_eq!(lane_variance(&strong, &strong), 0.0);
    }

    #[test]
    fn test_lane_variance_single_lane() {
        let mut team1: Vec<LanePlayerData> = (0..5).map(|i| flat(i, 50)).collect();
        let team2: Vec<LanePlayerData> = (5..10).map(|i| flat(i, 50)).collect();
        // Top lane 20 points stronger: 400 * 7 / 40 = 70
        team1[0].lane_strength[0] = Some(70);

        let team1: Vec<&LanePlayerData> = team1.iter().collect();
        let team2: Vec<&LanePlayerData> = team2.iter().collect();
        assert!((lane_variance(&team1, &team2) - 70f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_unranked_lanes_are_skipped() {
        let mut team1: Vec<LanePlayerData> = (0..5).map(|i| flat(i, 10)).collect();
        let team2: Vec<LanePlayerData> = (5..10).map(|i| flat(i, 10)).collect();
        team1[1].lane_strength[1] = None;

        let team1: Vec<&LanePlayerData> = team1.iter().collect();
        let team2: Vec<&LanePlayerData> = team2.iter().collect();
        assert_eq!(lane_variance(&team1, &team2), 0.0);
    }

    #[test]
    fn test_normalize_falls_back_to_uniform() {
        assert_eq!(normalize(&[0.0, 0.0, 0.0, 0.0]), vec![0.25; 4]);
        assert_eq!(normalize(&[1.0, 3.0]), vec![0.25, 0.75]);
    }

    #[test]
    fn test_evaluate_even_teams() {
        let players: Vec<LanePlayerData> = (0..10).map(|i| flat(i, 50)).collect();
        let refs: Vec<&LanePlayerData> = players.iter().collect();

        let lane_match = LaneMatchFinder::new().evaluate(&refs[..5], &refs[5..]);
        assert_eq!(lane_match.max_strength_diff, 0);
        assert_eq!(lane_match.average_strength_diff, 0);
        assert_eq!(lane_match.expected_lane_variance, 0.0);
        assert_eq!(lane_match.team1.len(), 5);
    }

    #[test]
    fn test_evaluate_orders_team_by_best_lanes() {
        // Each player is only good at one lane, listed in reverse lane order
        let specialists: Vec<LanePlayerData> = (0..5)
            .map(|i| {
                let mut strengths = [Some(1); LANE_COUNT];
                strengths[4 - i] = Some(90);
                LanePlayerData::new(i as PlayerId, strengths)
            })
            .collect();
        let others: Vec<LanePlayerData> = (5..10).map(|i| flat(i, 10)).collect();
        let team1: Vec<&LanePlayerData> = specialists.iter().collect();
        let team2: Vec<&LanePlayerData> = others.iter().collect();

        let lane_match = LaneMatchFinder::new().evaluate(&team1, &team2);

        let order: Vec<PlayerId> = lane_match.team1.iter().map(|p| p.player_id).collect();
        assert_eq!(order, vec![4, 3, 2, 1, 0]);
        assert_eq!(lane_match.max_strength_diff, 450 - 50);
        assert!(lane_match.expected_lane_variance > 0.0);
    }

    #[test]
    fn test_ranked_candidates_sorted_by_strength() {
        let finder = LaneMatchFinder::new();
        let ranked = finder.ranked_candidates(&spread_roster()).unwrap();

        assert_eq!(ranked.len(), 5);
        for pair in ranked.windows(2) {
            assert!(match_strength(&pair[0]) <= match_strength(&pair[1]));
        }
        // The lowest id is always on team 1 before mirroring
        for candidate in &ranked {
            assert!(candidate.team1_ids().contains(&100));
        }
    }

    #[test]
    fn test_find_candidates_partitions_roster() {
        let roster = spread_roster();
        let all: BTreeSet<PlayerId> = roster.iter().map(|p| p.player_id).collect();
        let mut rng = StdRng::seed_from_u64(3);

        let candidates = LaneMatchFinder::new().find_candidates(&roster, &mut rng).unwrap();
        assert_eq!(candidates.len(), 2);
        for candidate in candidates {
            let team1 = candidate.team1_ids();
            let team2 = candidate.team2_ids();
            assert_eq!(team1.len(), 5);
            assert_eq!(team2.len(), 5);
            assert!(team1.is_disjoint(&team2));
            assert_eq!(team1.union(&team2).copied().collect::<BTreeSet<_>>(), all);
            assert!(candidate.expected_lane_variance.is_finite());
        }
    }

    #[test]
    fn test_seeded_search_is_repeatable() {
        let roster = spread_roster();
        let finder = LaneMatchFinder::new();

        let first = finder
            .find_candidates(&roster, &mut StdRng::seed_from_u64(11))
            .unwrap();
        let second = finder
            .find_candidates(&roster, &mut StdRng::seed_from_u64(11))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_lane_weight_sum() {
        assert_eq!(LANE_WEIGHT_SUM, LANE_WEIGHTS.iter().sum::<i64>());
        assert_eq!(LANE_WEIGHT_SUM, 40);
    }

    #[test]
    fn test_out_of_range_strengths_are_rejected() {
        let mut players: Vec<LanePlayerData> = (0..10).map(|i| flat(i, 0)).collect();
        for player in players.iter_mut().take(5) {
            player.lane_strength = [Some(i32::MAX); LANE_COUNT];
        }

        let finder = LaneMatchFinder::new();
        assert!(matches!(
            finder.ranked_candidates(&players),
            Err(MatchmakingError::Validation { .. })
        ));
    }

    #[test]
    fn test_strongest_allowed_strengths_evaluate() {
        let strong: Vec<LanePlayerData> = (0..5).map(|i| flat(i, MAX_LANE_STRENGTH)).collect();
        let weak: Vec<LanePlayerData> = (5..10).map(|i| flat(i, 0)).collect();
        let players: Vec<LanePlayerData> = strong.into_iter().chain(weak).collect();

        let ranked = LaneMatchFinder::new().ranked_candidates(&players).unwrap();
        assert!(ranked.iter().all(|c| c.expected_lane_variance.is_finite()));
    }

    #[test]
    fn test_roster_validation() {
        let finder = LaneMatchFinder::new();
        let nine: Vec<LanePlayerData> = (0..9).map(|i| flat(i, 5)).collect();
        assert!(matches!(
            finder.ranked_candidates(&nine),
            Err(MatchmakingError::Validation { .. })
        ));

        let mut duplicated: Vec<LanePlayerData> = (0..10).map(|i| flat(i, 5)).collect();
        duplicated[9].player_id = 0;
        assert!(finder.ranked_candidates(&duplicated).is_err());
    }
}
