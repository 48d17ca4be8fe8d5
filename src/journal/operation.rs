//! Journaled operations

use crate::types::{MatchOutcome, PlayerId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A write to the ranking store, kept for "last" and "undo" display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RankingOperation {
    CreatePlayer { player_id: PlayerId, initial_mean: f64 },
    RecordOutcome { outcome: MatchOutcome },
}

impl RankingOperation {
    /// Label used for the journal metrics
    pub fn kind(&self) -> &'static str {
        match self {
            RankingOperation::CreatePlayer { .. } => "create_player",
            RankingOperation::RecordOutcome { .. } => "record_outcome",
        }
    }
}

fn write_team(
    f: &mut fmt::Formatter<'_>,
    players: impl IntoIterator<Item = PlayerId>,
) -> fmt::Result {
    let names: Vec<String> = players.into_iter().map(|id| id.to_string()).collect();
    write!(f, "[{}]", names.join(", "))
}

impl fmt::Display for RankingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingOperation::CreatePlayer {
                player_id,
                initial_mean,
            } => write!(
                f,
                "Create player {} with initial rating {:.2}",
                player_id, initial_mean
            ),
            RankingOperation::RecordOutcome { outcome } => {
                write!(f, "Record match outcome: ")?;
                write_team(f, outcome.winning_players().iter().copied())?;
                write!(f, " beat ")?;
                write_team(f, outcome.losing_players().iter().copied())
            }
        }
    }
}

/// One journaled write and the backup that reverses it
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry<O> {
    pub operation: O,
    /// Absent when there was no persisted state before the write
    pub backup_path: Option<PathBuf>,
}
