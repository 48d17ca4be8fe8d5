//! Lane matchmaking for one game
//!
//! Lane data is saved straight to `lanes.json` on every update; there is no
//! journal and no undo for this domain.

use crate::error::{MatchmakingError, Result};
use crate::lanes::store::LaneRatingStore;
use crate::matching::lane::{LaneMatchFinder, ROSTER_SIZE};
use crate::metrics::{MetricsCollector, MetricsTimer};
use crate::persistence::files::{atomic_write, check_file_slot, ensure_dir, read_optional};
use crate::persistence::PersistentState;
use crate::types::{LaneMatch, LanePlayerData, LaneStrengths, PlayerId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// File holding the lane domain's state
pub const LANE_SAVE_FILE: &str = "lanes.json";

pub struct LaneMatchmakingSystem {
    store: LaneRatingStore,
    save_file: PathBuf,
    finder: LaneMatchFinder,
    rng: StdRng,
    metrics: Option<Arc<MetricsCollector>>,
}

impl LaneMatchmakingSystem {
    /// Validate `save_dir` and build an empty system; call [`init`](Self::init) to load
    pub fn create(save_dir: &Path, rng_seed: Option<u64>) -> Result<Self> {
        ensure_dir(save_dir)?;
        let save_file = save_dir.join(LANE_SAVE_FILE);
        check_file_slot(&save_file)?;

        let rng = match rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            store: LaneRatingStore::new(),
            save_file,
            finder: LaneMatchFinder::new(),
            rng,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Load the saved lane data, if any
    pub fn init(&mut self) -> Result<()> {
        if let Some(contents) = read_optional(&self.save_file)? {
            info!("Loading from save file, {}", self.save_file.display());
            let mut loaded = LaneRatingStore::new();
            loaded.load_from(&contents)?;
            self.store = loaded;
            info!("Loaded lane data for {} players", self.store.len());
        }
        self.report_size();
        Ok(())
    }

    pub fn has_player_data(&self, player_id: PlayerId) -> bool {
        self.store.has_player_data(player_id)
    }

    pub fn player_data(&self, player_id: PlayerId) -> Result<&LanePlayerData> {
        self.store
            .player_data(player_id)
            .ok_or_else(|| {
                MatchmakingError::not_found(format!("lane data for player {}", player_id))
            })
    }

    pub fn all_player_data(&self) -> Vec<&LanePlayerData> {
        self.store.all_player_data()
    }

    /// Register or replace lane strengths and save; nothing changes if the save fails
    pub fn update_player_data(
        &mut self,
        player_id: PlayerId,
        lane_strength: LaneStrengths,
    ) -> Result<()> {
        let previous = self.store.clone();
        self.store.update_player(player_id, lane_strength)?;

        if let Err(e) = self.save() {
            warn!("Failed to save lane data, reverting update: {}", e);
            self.store = previous;
            return Err(e);
        }

        info!("Updated lane data for player {}", player_id);
        self.report_size();
        Ok(())
    }

    /// Up to two balanced 5v5 proposals for `roster`.
    ///
    /// Empty when any player has no lane data; see [`has_player_data`](Self::has_player_data).
    pub fn find_match_candidates(
        &mut self,
        roster: &BTreeSet<PlayerId>,
    ) -> Result<Vec<LaneMatch>> {
        if roster.len() != ROSTER_SIZE {
            return Err(MatchmakingError::validation(format!(
                "Lane matchmaking needs exactly {} players, got {}",
                ROSTER_SIZE,
                roster.len()
            )));
        }

        let mut players = Vec::with_capacity(roster.len());
        for player_id in roster {
            match self.store.player_data(*player_id) {
                Some(data) => players.push(data.clone()),
                None => {
                    warn!("Player {} has no lane data, no candidates", player_id);
                    return Ok(Vec::new());
                }
            }
        }

        let timer = MetricsTimer::start();
        let candidates = self.finder.find_candidates(&players, &mut self.rng)?;
        if let Some(metrics) = &self.metrics {
            metrics.record_match_search("lane", timer.stop());
        }

        info!("Found {} lane match candidates", candidates.len());
        Ok(candidates)
    }

    pub fn save_file(&self) -> &Path {
        &self.save_file
    }

    fn save(&self) -> Result<()> {
        atomic_write(&self.save_file, &self.store.encode()?)
    }

    fn report_size(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.set_registered_players("lanes", self.store.len());
        }
    }
}
