//! Metrics for the rating and matchmaking engines
//!
//! Metrics are collected into a private Prometheus registry and rendered as
//! text on request; nothing is served over the network.

pub mod collector;

pub use collector::{JournalMetrics, MatchmakingMetrics, MetricsCollector, MetricsTimer};
