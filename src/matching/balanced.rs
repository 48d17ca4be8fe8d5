//! Balanced two-team split search
//!
//! Every `⌊n/2⌋`-subset of the roster is tried as team 1 and scored with the
//! skill model's match quality. A small pool of the best splits is kept and
//! one of them is picked at random, so a static roster does not always get
//! the identical proposal.

use crate::error::{MatchmakingError, Result};
use crate::matching::combinatorics::combinations;
use crate::matching::top_k::BoundedTopK;
use crate::rating::skill::SkillModel;
use crate::types::{Match, PlayerId, Rating};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// How many of the best splits stay in the random pool for a roster of `n`.
///
/// Doubled for even rosters, where each split is also seen mirrored.
pub fn pool_size(n: usize) -> usize {
    let size = match n {
        0..=4 => 1,
        5..=6 => 2,
        _ => 3,
    };
    if n % 2 == 0 {
        size * 2
    } else {
        size
    }
}

pub struct BalancedMatchFinder<'a> {
    model: &'a dyn SkillModel,
}

impl<'a> BalancedMatchFinder<'a> {
    pub fn new(model: &'a dyn SkillModel) -> Self {
        Self { model }
    }

    /// The retained splits, best quality first
    pub fn candidates<F>(&self, roster: &BTreeSet<PlayerId>, rating_of: F) -> Result<Vec<Match>>
    where
        F: Fn(PlayerId) -> Rating,
    {
        if roster.len() < 2 {
            return Err(MatchmakingError::validation(format!(
                "A match needs at least 2 players, got {}",
                roster.len()
            )));
        }

        let players: Vec<PlayerId> = roster.iter().copied().collect();
        let ratings: HashMap<PlayerId, Rating> =
            players.iter().map(|id| (*id, rating_of(*id))).collect();
        let team1_size = players.len() / 2;

        let mut best = BoundedTopK::new(pool_size(players.len()));
        for team1 in combinations(&players, team1_size) {
            let team2: Vec<PlayerId> = players
                .iter()
                .copied()
                .filter(|id| !team1.contains(id))
                .collect();

            let team1_ratings: Vec<Rating> = team1.iter().map(|id| ratings[id]).collect();
            let team2_ratings: Vec<Rating> = team2.iter().map(|id| ratings[id]).collect();
            let quality = self.model.match_quality(&team1_ratings, &team2_ratings);

            best.push(quality, (team1, team2));
        }

        best.into_sorted_vec()
            .into_iter()
            .map(|(quality, (team1, team2))| Match::new(team1, team2, Some(quality)))
            .collect()
    }

    /// Pick one of the best splits of `roster` uniformly at random
    pub fn find<F, R>(
        &self,
        roster: &BTreeSet<PlayerId>,
        rating_of: F,
        rng: &mut R,
    ) -> Result<Match>
    where
        F: Fn(PlayerId) -> Rating,
        R: Rng + ?Sized,
    {
        let candidates = self.candidates(roster, rating_of)?;
        let chosen = candidates
            .choose(rng)
            .cloned()
            .ok_or_else(|| MatchmakingError::not_found("balanced match candidate"))?;

        debug!(
            "Chose split with quality {:?} out of {} candidates using {}",
            chosen.quality,
            candidates.len(),
            self.model.name()
        );
        Ok(chosen)
    }
}
