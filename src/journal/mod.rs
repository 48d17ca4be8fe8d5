//! Undoable mutation journal
//!
//! Every write to a journaled store is captured together with a backup of the
//! persisted state taken just before it, so the latest writes can be undone.

pub mod history;
pub mod operation;

pub use history::OperationJournal;
pub use operation::{JournalEntry, RankingOperation};
