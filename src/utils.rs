//! Utility functions shared by the stores and the journal

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// File name for a backup captured at `at`.
///
/// Named by capture time; the random suffix keeps two captures in the same
/// millisecond apart.
pub fn backup_file_name(at: DateTime<Utc>, extension: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}.{}",
        at.format("%Y-%m-%d_%H-%M-%S-%3f"),
        &suffix[..8],
        extension
    )
}

/// Win rate over `won + lost` games, `None` when nothing was played
pub fn win_rate(won: u32, lost: u32) -> Option<f64> {
    let total = won + lost;
    if total == 0 {
        None
    } else {
        Some(f64::from(won) / f64::from(total))
    }
}
