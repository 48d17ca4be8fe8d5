//! Main application state and domain coordination
//!
//! `AppState` owns one worker per domain. The rating domain and the lane
//! domain each get their own save directory under the configured data dir and
//! their own thread; callers reach them only through the typed handles.

use crate::config::AppConfig;
use crate::lanes::LaneMatchmakingSystem;
use crate::metrics::MetricsCollector;
use crate::rating::{create_skill_model, RankingSystem};
use crate::service::worker::DomainWorker;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Shutdown error: {message}")]
    Shutdown { message: String },
}

/// Application state containing both domain workers
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Ranking system for the team game
    ranking: DomainWorker<RankingSystem>,

    /// Lane matchmaking for the five-lane game
    lanes: DomainWorker<LaneMatchmakingSystem>,

    /// Shared by both workers
    metrics: Arc<MetricsCollector>,
}

impl AppState {
    /// Load both domains from disk and start their workers
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        info!(
            "Initializing {} with data in {}",
            config.service.name,
            config.storage.data_dir.display()
        );

        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| ServiceError::Initialization {
            message: format!("Failed to create metrics collector: {}", e),
        })?);

        let ranking = Self::initialize_ranking(&config, metrics.clone())?;
        let lanes = Self::initialize_lanes(&config, metrics.clone())?;

        Ok(Self {
            config,
            ranking,
            lanes,
            metrics,
        })
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn ranking(&self) -> &DomainWorker<RankingSystem> {
        &self.ranking
    }

    pub fn lanes(&self) -> &DomainWorker<LaneMatchmakingSystem> {
        &self.lanes
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Both workers still accept jobs
    pub fn is_running(&self) -> bool {
        self.ranking.is_running() && self.lanes.is_running()
    }

    /// Let queued jobs finish and stop both workers
    pub async fn shutdown(self) -> Result<(), ServiceError> {
        info!("Stopping domain workers");

        let ranking = self.ranking.shutdown().await;
        let lanes = self.lanes.shutdown().await;

        for (name, result) in [("ranking", ranking), ("lanes", lanes)] {
            if let Err(e) = result {
                warn!("Failed to stop {} worker: {}", name, e);
                return Err(ServiceError::Shutdown {
                    message: format!("{} worker: {}", name, e),
                });
            }
        }

        info!("✅ Domain workers stopped");
        Ok(())
    }

    fn initialize_ranking(
        config: &AppConfig,
        metrics: Arc<MetricsCollector>,
    ) -> Result<DomainWorker<RankingSystem>, ServiceError> {
        let model = create_skill_model(config.matchmaking.skill_model, config.game.clone())
            .map_err(|e| ServiceError::Configuration {
                message: format!("Invalid skill model settings: {}", e),
            })?;

        let system = RankingSystem::create(
            &config.ratings_dir(),
            config.storage.max_operation_history,
            model,
            config.matchmaking.rng_seed,
        )
        .map_err(|e| ServiceError::Initialization {
            message: format!("Failed to load ranking system: {}", e),
        })?
        .with_metrics(metrics);

        DomainWorker::spawn("ranking", system).map_err(|e| ServiceError::Initialization {
            message: e.to_string(),
        })
    }

    fn initialize_lanes(
        config: &AppConfig,
        metrics: Arc<MetricsCollector>,
    ) -> Result<DomainWorker<LaneMatchmakingSystem>, ServiceError> {
        let load = |e: crate::error::MatchmakingError| ServiceError::Initialization {
            message: format!("Failed to load lane data: {}", e),
        };

        let seed = config.matchmaking.rng_seed;
        let mut system = LaneMatchmakingSystem::create(&config.lanes_dir(), seed)
            .map_err(load)?
            .with_metrics(metrics);
        system.init().map_err(load)?;

        DomainWorker::spawn("lanes", system).map_err(|e| ServiceError::Initialization {
            message: e.to_string(),
        })
    }
}
