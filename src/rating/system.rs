//! Ranking system for one game
//!
//! Ties the rating store to its journal and skill model. Every write goes
//! through the journal so the latest writes can be undone; match searches are
//! read-only apart from remembering the last proposal.

use crate::error::{MatchmakingError, Result};
use crate::journal::{JournalEntry, OperationJournal, RankingOperation};
use crate::matching::BalancedMatchFinder;
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::rating::skill::SkillModel;
use crate::rating::store::{PartnerStats, PlayerStats, RatingStore};
use crate::types::{Match, MatchOutcome, PlayerId, Team};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// File holding the rating domain's current state
pub const RATING_SAVE_FILE: &str = "data.json";

pub struct RankingSystem {
    journal: OperationJournal<RatingStore, RankingOperation>,
    model: Box<dyn SkillModel>,
    rng: StdRng,
    last_proposed: Option<Match>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl RankingSystem {
    /// Open the ranking system saved in `save_dir`, creating the directory layout if needed
    pub fn create(
        save_dir: &Path,
        max_operation_history: usize,
        model: Box<dyn SkillModel>,
        rng_seed: Option<u64>,
    ) -> Result<Self> {
        let store = RatingStore::new(model.default_rating());
        let journal =
            OperationJournal::open(save_dir, RATING_SAVE_FILE, max_operation_history, store)?;

        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            "Ranking system ready with {} players using {}",
            journal.state().player_count(),
            model.name()
        );

        Ok(Self {
            journal,
            model,
            rng,
            last_proposed: None,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self.report_size();
        self
    }

    pub fn store(&self) -> &RatingStore {
        self.journal.state()
    }

    pub fn skill_model(&self) -> &dyn SkillModel {
        self.model.as_ref()
    }

    pub fn create_player(&mut self, player_id: PlayerId, initial_mean: f64) -> Result<()> {
        if !initial_mean.is_finite() {
            return Err(MatchmakingError::validation(format!(
                "Initial rating must be a finite number, got {}",
                initial_mean
            )));
        }
        if self.store().has_player(player_id) {
            return Err(MatchmakingError::DuplicatePlayer { player_id });
        }

        let rating = self.model.initial_rating(initial_mean);
        let operation = RankingOperation::CreatePlayer {
            player_id,
            initial_mean,
        };
        self.perform(operation, |store, _| store.create_player(player_id, rating))
    }

    pub fn create_player_with_default_rating(&mut self, player_id: PlayerId) -> Result<()> {
        let mean = self.model.default_rating().mean;
        self.create_player(player_id, mean)
    }

    pub fn record_outcome(&mut self, outcome: MatchOutcome) -> Result<()> {
        let operation = RankingOperation::RecordOutcome {
            outcome: outcome.clone(),
        };
        self.perform(operation, |store, model| store.apply_outcome(&outcome, model))
    }

    /// Record the result of the last proposed match
    pub fn record_last_match_outcome(&mut self, winner: Team) -> Result<MatchOutcome> {
        let matchup = self
            .last_proposed
            .clone()
            .ok_or_else(|| MatchmakingError::not_found("proposed match"))?;

        let outcome = MatchOutcome::won_by(matchup, winner);
        self.record_outcome(outcome.clone())?;
        Ok(outcome)
    }

    pub fn undo_last(&mut self) -> Result<RankingOperation> {
        let operation = self.journal.undo_last()?;
        if let Some(metrics) = &self.metrics {
            metrics.record_undo();
        }
        self.report_size();
        Ok(operation)
    }

    pub fn last_operation(&self) -> Result<&RankingOperation> {
        self.journal.peek_last()
    }

    /// Undoable operations, oldest first
    pub fn operation_history(&self) -> impl Iterator<Item = &JournalEntry<RankingOperation>> {
        self.journal.entries()
    }

    /// Propose a balanced split of `roster` and remember it as the last proposal
    pub fn find_balanced_match(&mut self, roster: &BTreeSet<PlayerId>) -> Result<Match> {
        let timer = MetricsTimer::start();
        let store = self.journal.state();
        let finder = BalancedMatchFinder::new(self.model.as_ref());
        let chosen = finder.find(roster, |id| store.rating_or_default(id), &mut self.rng)?;

        if let Some(metrics) = &self.metrics {
            metrics.record_match_search("balanced", timer.stop());
        }
        debug!("Proposed {:?} vs {:?}", chosen.team1, chosen.team2);

        self.last_proposed = Some(chosen.clone());
        Ok(chosen)
    }

    pub fn last_proposed_match(&self) -> Option<&Match> {
        self.last_proposed.as_ref()
    }

    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.store().has_player(player_id)
    }

    pub fn player_stats(&self, player_id: PlayerId) -> Result<PlayerStats> {
        self.store().player_stats(player_id).cloned()
    }

    pub fn all_player_stats(&self) -> Vec<PlayerStats> {
        self.store().all_player_stats().into_iter().cloned().collect()
    }

    pub fn leaderboard(&self) -> Vec<PlayerStats> {
        self.store().leaderboard().into_iter().cloned().collect()
    }

    pub fn partner_stats(&self, player_id: PlayerId) -> Result<Vec<PartnerStats>> {
        Ok(self
            .store()
            .partner_stats(player_id)?
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn match_history(&self) -> &[MatchOutcome] {
        self.store().match_history()
    }

    fn perform<F>(&mut self, operation: RankingOperation, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut RatingStore, &dyn SkillModel) -> Result<()>,
    {
        let kind = operation.kind();
        let model = self.model.as_ref();
        let evicted = self
            .journal
            .perform(operation, |store| mutate(store, model))?;

        if let Some(metrics) = &self.metrics {
            metrics.record_operation(kind, evicted);
        }
        self.report_size();
        Ok(())
    }

    fn report_size(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.set_registered_players("ratings", self.store().player_count());
        }
    }
}
