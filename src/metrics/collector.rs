//! Metrics collection using Prometheus
//!
//! Counters for journaled writes and undo, histograms for match searches and
//! gauges for the size of each domain.

use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the rating and matchmaking engines
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Journal-related metrics
    journal_metrics: JournalMetrics,

    /// Search and store metrics
    matchmaking_metrics: MatchmakingMetrics,
}

/// Journal-related metrics
#[derive(Clone)]
pub struct JournalMetrics {
    /// Journaled writes by operation kind
    pub operations_total: IntCounterVec,

    /// Operations undone
    pub undo_total: IntCounter,

    /// Entries dropped from the front of the history
    pub backups_evicted_total: IntCounter,
}

/// Search and store metrics
#[derive(Clone)]
pub struct MatchmakingMetrics {
    /// Match search duration by finder
    pub match_search_seconds: HistogramVec,

    /// Players known to each domain
    pub registered_players: IntGaugeVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with its own registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let journal_metrics = JournalMetrics::new(&registry)?;
        let matchmaking_metrics = MatchmakingMetrics::new(&registry)?;

        Ok(Self {
            registry,
            journal_metrics,
            matchmaking_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn journal(&self) -> &JournalMetrics {
        &self.journal_metrics
    }

    pub fn matchmaking(&self) -> &MatchmakingMetrics {
        &self.matchmaking_metrics
    }

    /// Record a successful journaled write
    pub fn record_operation(&self, kind: &str, evicted: usize) {
        self.journal_metrics
            .operations_total
            .with_label_values(&[kind])
            .inc();

        if evicted > 0 {
            self.journal_metrics
                .backups_evicted_total
                .inc_by(evicted as u64);
        }
    }

    pub fn record_undo(&self) {
        self.journal_metrics.undo_total.inc();
    }

    /// Record how long a match search took
    pub fn record_match_search(&self, finder: &str, duration: Duration) {
        self.matchmaking_metrics
            .match_search_seconds
            .with_label_values(&[finder])
            .observe(duration.as_secs_f64());
    }

    pub fn set_registered_players(&self, domain: &str, count: usize) {
        self.matchmaking_metrics
            .registered_players
            .with_label_values(&[domain])
            .set(count as i64);
    }

    /// Text exposition of every registered metric
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl JournalMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let operations_total = IntCounterVec::new(
            Opts::new(
                "matchforge_journal_operations_total",
                "Total journaled operations",
            ),
            &["operation"],
        )?;
        registry.register(Box::new(operations_total.clone()))?;

        let undo_total = IntCounter::new("matchforge_undo_total", "Total operations undone")?;
        registry.register(Box::new(undo_total.clone()))?;

        let backups_evicted_total = IntCounter::new(
            "matchforge_backups_evicted_total",
            "Journal entries evicted from the undo history",
        )?;
        registry.register(Box::new(backups_evicted_total.clone()))?;

        Ok(Self {
            operations_total,
            undo_total,
            backups_evicted_total,
        })
    }
}

impl MatchmakingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let match_search_seconds = HistogramVec::new(
            HistogramOpts::new("matchforge_match_search_seconds", "Match search duration")
                .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["finder"],
        )?;
        registry.register(Box::new(match_search_seconds.clone()))?;

        let registered_players = IntGaugeVec::new(
            Opts::new("matchforge_registered_players", "Players known to a domain"),
            &["domain"],
        )?;
        registry.register(Box::new(registered_players.clone()))?;

        Ok(Self {
            match_search_seconds,
            registered_players,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _journal = collector.journal();
        let _matchmaking = collector.matchmaking();
    }

    #[test]
    fn test_operation_recording() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_operation("create_player", 0);
        collector.record_operation("record_outcome", 2);
        collector.record_undo();

        let journal = collector.journal();
        assert_eq!(
            journal
                .operations_total
                .with_label_values(&["record_outcome"])
                .get(),
            1
        );
        assert_eq!(journal.backups_evicted_total.get(), 2);
        assert_eq!(journal.undo_total.get(), 1);
    }

    #[test]
    fn test_render_contains_metric_names() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        collector.record_match_search("balanced", Duration::from_millis(3));
        collector.set_registered_players("ratings", 4);
        collector.record_operation("create_player", 0);

        let text = collector.render().unwrap();
        assert!(text.contains("matchforge_match_search_seconds"));
        assert!(text.contains("matchforge_registered_players{domain=\"ratings\"} 4"));
        assert!(text.contains("matchforge_journal_operations_total"));
    }

    #[test]
    fn test_metrics_timer() {
        let timer = MetricsTimer::start();

        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.elapsed();

        assert!(duration >= Duration::from_millis(10));

        let final_duration = timer.stop();
        assert!(final_duration >= Duration::from_millis(10));
    }
}
