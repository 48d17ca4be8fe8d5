//! On-disk state for the rating and lane domains
//!
//! Each domain keeps one current-state JSON file. The rating domain also keeps
//! a `backups/` directory of pre-mutation snapshots managed by the journal.

pub mod codec;
pub mod files;

pub use codec::{RatingSnapshot, FORMAT_VERSION};

use crate::error::Result;

/// State that can be written to and restored from a snapshot file
pub trait PersistentState: Clone {
    /// Serialize the whole state
    fn encode(&self) -> Result<String>;

    /// Replace the state with the decoded contents of a snapshot file.
    ///
    /// On error the state may be partially overwritten; callers decode into a copy.
    fn load_from(&mut self, contents: &str) -> Result<()>;

    /// Drop everything, back to a freshly created store
    fn clear(&mut self);
}
