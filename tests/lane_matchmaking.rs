//! Integration tests for lane-based 5v5 matchmaking

mod fixtures;

use fixtures::{create_lane_system, create_test_app, lane_strengths_for};
use matchforge::lanes::{parse_lane_ratings, LANE_SAVE_FILE};
use matchforge::matching::LaneMatchFinder;
use matchforge::types::{LanePlayerData, PlayerId, LANE_COUNT};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

fn ten_players() -> Vec<LanePlayerData> {
    (1..=10)
        .map(|id| LanePlayerData::new(id, lane_strengths_for(id)))
        .collect()
}

#[test]
fn test_ten_defined_players_give_two_partitions() {
    let dir = tempfile::tempdir().unwrap();
    let mut system = create_lane_system(dir.path());
    for player in ten_players() {
        system
            .update_player_data(player.player_id, player.lane_strength)
            .unwrap();
    }

    let roster: BTreeSet<PlayerId> = (1..=10).collect();
    let candidates = system.find_match_candidates(&roster).unwrap();
    assert_eq!(candidates.len(), 2);

    for candidate in &candidates {
        let team1 = candidate.team1_ids();
        let team2 = candidate.team2_ids();
        assert_eq!(team1.len(), LANE_COUNT);
        assert_eq!(team2.len(), LANE_COUNT);
        assert!(team1.is_disjoint(&team2));
        let all: BTreeSet<PlayerId> = team1.union(&team2).copied().collect();
        assert_eq!(all, roster);
        assert!(candidate.expected_lane_variance.is_finite());
    }
}

#[test]
fn test_ranked_candidates_are_most_balanced_first() {
    let finder = LaneMatchFinder::new();
    let ranked = finder.ranked_candidates(&ten_players()).unwrap();

    assert_eq!(ranked.len(), finder.candidates_to_consider);
    let strengths: Vec<f64> = ranked
        .iter()
        .map(matchforge::matching::match_strength)
        .collect();
    assert!(strengths.windows(2).all(|w| w[0] <= w[1]));

    // Player 1 is never moved to team 2 before mirroring
    for candidate in &ranked {
        assert!(candidate.team1_ids().contains(&1));
    }
}

#[test]
fn test_same_seed_same_candidates() {
    let finder = LaneMatchFinder::new();
    let players = ten_players();

    let first = finder
        .find_candidates(&players, &mut StdRng::seed_from_u64(11))
        .unwrap();
    let second = finder
        .find_candidates(&players, &mut StdRng::seed_from_u64(11))
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unranked_lanes_still_produce_candidates() {
    let mut players = ten_players();
    for player in players.iter_mut().take(4) {
        player.lane_strength[0] = None;
        player.lane_strength[3] = None;
    }

    let candidates = LaneMatchFinder::new()
        .find_candidates(&players, &mut StdRng::seed_from_u64(2))
        .unwrap();
    assert_eq!(candidates.len(), 2);
    assert!(candidates
        .iter()
        .all(|c| c.expected_lane_variance.is_finite()));
}

#[test]
fn test_lane_data_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut system = create_lane_system(dir.path());
        let strengths = parse_lane_ratings(&["7.5", "?", "3", "10", "0.1"]).unwrap();
        system.update_player_data(42, strengths).unwrap();
    }
    assert!(dir.path().join(LANE_SAVE_FILE).is_file());

    let system = create_lane_system(dir.path());
    let data = system.player_data(42).unwrap();
    assert_eq!(data.lane_strength, [Some(75), None, Some(30), Some(100), Some(1)]);
}

#[test]
fn test_lanes_through_app_worker() {
    tokio_test::block_on(async {
        let (_dir, app) = create_test_app(10);

        for id in 1..=10u64 {
            app.lanes()
                .call(move |lanes| lanes.update_player_data(id, lane_strengths_for(id)))
                .await
                .unwrap();
        }

        let short_roster: BTreeSet<PlayerId> = (1..=9).collect();
        let err = app
            .lanes()
            .call(move |lanes| lanes.find_match_candidates(&short_roster))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            matchforge::MatchmakingError::Validation { .. }
        ));

        let roster: BTreeSet<PlayerId> = (1..=10).collect();
        let candidates = app
            .lanes()
            .call(move |lanes| lanes.find_match_candidates(&roster))
            .await
            .unwrap();
        assert_eq!(candidates.len(), 2);

        // Out-of-range strengths are refused and the worker keeps serving
        let err = app
            .lanes()
            .call(|lanes| lanes.update_player_data(1, [Some(i32::MAX); LANE_COUNT]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            matchforge::MatchmakingError::Validation { .. }
        ));
        assert!(app.lanes().is_running());

        let roster: BTreeSet<PlayerId> = (1..=10).collect();
        let candidates = app
            .lanes()
            .call(move |lanes| lanes.find_match_candidates(&roster))
            .await
            .unwrap();
        assert_eq!(candidates.len(), 2);

        app.shutdown().await.unwrap();
    });
}
