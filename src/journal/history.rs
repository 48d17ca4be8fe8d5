//! Bounded undo history over a persisted store

use crate::error::{MatchmakingError, Result};
use crate::journal::operation::JournalEntry;
use crate::persistence::files::{
    atomic_write, copy_file, prepare_save_dir, read_optional, read_required, remove_if_exists,
};
use crate::persistence::PersistentState;
use crate::utils::{backup_file_name, current_timestamp};
use std::collections::VecDeque;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Owns a store and routes every write through backup, mutate and persist.
///
/// Entries are evicted oldest first once there are more than `max_history`
/// of them, and undone newest first.
#[derive(Debug)]
pub struct OperationJournal<S, O> {
    state: S,
    entries: VecDeque<JournalEntry<O>>,
    state_path: PathBuf,
    backup_dir: PathBuf,
    max_history: usize,
}

impl<S, O> OperationJournal<S, O>
where
    S: PersistentState,
    O: Clone + Display,
{
    /// Open the journal for `save_dir`, loading `state_file_name` if it exists.
    ///
    /// `initial` is used as-is when there is nothing persisted yet.
    pub fn open(
        save_dir: &Path,
        state_file_name: &str,
        max_history: usize,
        initial: S,
    ) -> Result<Self> {
        if max_history == 0 {
            return Err(MatchmakingError::validation(
                "Operation history must hold at least one entry",
            ));
        }

        let state_path = save_dir.join(state_file_name);
        let backup_dir = prepare_save_dir(save_dir, &state_path)?;

        let mut state = initial;
        if let Some(contents) = read_optional(&state_path)? {
            info!("Loading from save file, {}", state_path.display());
            state.clear();
            state.load_from(&contents)?;
        }

        Ok(Self {
            state,
            entries: VecDeque::with_capacity(max_history + 1),
            state_path,
            backup_dir,
            max_history,
        })
    }

    /// Apply `mutate` as one undoable write.
    ///
    /// On any failure the store, the state file and the history are left as
    /// they were. Returns how many old entries were evicted.
    pub fn perform<F>(&mut self, operation: O, mutate: F) -> Result<usize>
    where
        F: FnOnce(&mut S) -> Result<()>,
    {
        let backup_path = self.capture_backup()?;
        let pre_image = self.state.clone();

        let result = mutate(&mut self.state).and_then(|()| self.persist());
        if let Err(e) = result {
            warn!("Operation '{}' failed, rolling back: {}", operation, e);
            self.state = pre_image;
            if let Some(path) = &backup_path {
                if let Err(remove_err) = remove_if_exists(path) {
                    warn!("Failed to remove unused backup: {}", remove_err);
                }
            }
            return Err(e);
        }

        info!("Performed operation: {}", operation);
        self.entries.push_back(JournalEntry {
            operation,
            backup_path,
        });
        Ok(self.evict_overflow())
    }

    /// Reverse the most recent operation and return it
    pub fn undo_last(&mut self) -> Result<O> {
        let entry = self
            .entries
            .pop_back()
            .ok_or_else(|| MatchmakingError::not_found("operation to undo"))?;

        if let Err(e) = self.restore_pre_image(&entry) {
            self.entries.push_back(entry);
            return Err(e);
        }

        info!("Undid operation: {}", entry.operation);
        Ok(entry.operation)
    }

    /// Most recent operation, without undoing it
    pub fn peek_last(&self) -> Result<&O> {
        self.entries
            .back()
            .map(|entry| &entry.operation)
            .ok_or_else(|| MatchmakingError::not_found("recorded operation"))
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from oldest to newest
    pub fn entries(&self) -> impl Iterator<Item = &JournalEntry<O>> {
        self.entries.iter()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    fn capture_backup(&self) -> Result<Option<PathBuf>> {
        if !self.state_path.is_file() {
            return Ok(None);
        }

        let backup_path = self
            .backup_dir
            .join(backup_file_name(current_timestamp(), "json"));
        info!("Backing up data to {}", backup_path.display());
        copy_file(&self.state_path, &backup_path)?;
        Ok(Some(backup_path))
    }

    fn persist(&self) -> Result<()> {
        let encoded = self.state.encode()?;
        atomic_write(&self.state_path, &encoded)
    }

    fn restore_pre_image(&mut self, entry: &JournalEntry<O>) -> Result<()> {
        let mut restored = self.state.clone();
        restored.clear();
        if let Some(path) = &entry.backup_path {
            debug!("Restoring from backup {}", path.display());
            restored.load_from(&read_required(path)?)?;
        }

        atomic_write(&self.state_path, &restored.encode()?)?;
        self.state = restored;

        if let Some(path) = &entry.backup_path {
            if let Err(e) = remove_if_exists(path) {
                warn!("Failed to remove consumed backup: {}", e);
            }
        }
        Ok(())
    }

    fn evict_overflow(&mut self) -> usize {
        let mut evicted = 0;
        while self.entries.len() > self.max_history {
            let Some(entry) = self.entries.pop_front() else {
                break;
            };
            if let Some(path) = &entry.backup_path {
                if let Err(e) = remove_if_exists(path) {
                    warn!("Failed to remove evicted backup: {}", e);
                }
            }
            debug!("Evicted operation from history: {}", entry.operation);
            evicted += 1;
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Tally {
        values: Vec<u32>,
        #[serde(skip)]
        poisoned: bool,
    }

    impl PersistentState for Tally {
        fn encode(&self) -> Result<String> {
            if self.poisoned {
                return Err(MatchmakingError::decode("poisoned"));
            }
            serde_json::to_string(&self.values).map_err(|e| MatchmakingError::decode(e.to_string()))
        }

        fn load_from(&mut self, contents: &str) -> Result<()> {
            self.values = serde_json::from_str(contents)
                .map_err(|e| MatchmakingError::decode(e.to_string()))?;
            Ok(())
        }

        fn clear(&mut self) {
            self.values.clear();
        }
    }

    fn open(dir: &TempDir, max_history: usize) -> OperationJournal<Tally, String> {
        OperationJournal::open(dir.path(), "data.json", max_history, Tally::default()).unwrap()
    }

    fn push(journal: &mut OperationJournal<Tally, String>, value: u32) -> usize {
        journal
            .perform(format!("push {}", value), |tally| {
                tally.values.push(value);
                Ok(())
            })
            .unwrap()
    }

    fn backup_count(journal: &OperationJournal<Tally, String>) -> usize {
        fs::read_dir(journal.backup_dir()).unwrap().count()
    }

    #[test]
    fn test_first_operation_has_no_backup() {
        let dir = tempdir().unwrap();
        let mut journal = open(&dir, 5);

        push(&mut journal, 1);
        push(&mut journal, 2);

        let entries: Vec<_> = journal.entries().collect();
        assert!(entries[0].backup_path.is_none());
        let backup = entries[1].backup_path.as_ref().unwrap();
        assert_eq!(fs::read_to_string(backup).unwrap(), "[1]");
        assert_eq!(fs::read_to_string(journal.state_path()).unwrap(), "[1,2]");
        assert_eq!(journal.peek_last().unwrap(), "push 2");
    }

    #[test]
    fn test_undo_restores_and_consumes_backup() {
        let dir = tempdir().unwrap();
        let mut journal = open(&dir, 5);
        push(&mut journal, 1);
        push(&mut journal, 2);

        assert_eq!(journal.undo_last().unwrap(), "push 2");
        assert_eq!(journal.state().values, vec![1]);
        assert_eq!(backup_count(&journal), 0);
        assert_eq!(fs::read_to_string(journal.state_path()).unwrap(), "[1]");

        assert_eq!(journal.undo_last().unwrap(), "push 1");
        assert!(journal.state().values.is_empty());

        assert!(journal.undo_last().unwrap_err().is_not_found());
        assert!(journal.peek_last().unwrap_err().is_not_found());
    }

    #[test]
    fn test_history_cap_evicts_oldest_and_its_backup() {
        let dir = tempdir().unwrap();
        let mut journal = open(&dir, 2);

        assert_eq!(push(&mut journal, 1), 0);
        assert_eq!(push(&mut journal, 2), 0);
        assert_eq!(push(&mut journal, 3), 1);
        assert_eq!(push(&mut journal, 4), 1);

        assert_eq!(journal.len(), 2);
        assert_eq!(backup_count(&journal), 2);

        journal.undo_last().unwrap();
        journal.undo_last().unwrap();
        assert_eq!(journal.state().values, vec![1, 2]);
        assert!(journal.undo_last().is_err());
    }

    #[test]
    fn test_failed_mutation_leaves_everything_unchanged() {
        let dir = tempdir().unwrap();
        let mut journal = open(&dir, 5);
        push(&mut journal, 1);

        let result = journal.perform("fail".to_string(), |tally| {
            tally.values.push(99);
            Err(MatchmakingError::validation("rejected"))
        });
        assert!(result.is_err());
        assert_eq!(journal.state().values, vec![1]);
        assert_eq!(journal.len(), 1);
        assert_eq!(backup_count(&journal), 0);
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let dir = tempdir().unwrap();
        let mut journal = open(&dir, 5);
        push(&mut journal, 1);

        let result = journal.perform("poison".to_string(), |tally| {
            tally.values.push(2);
            tally.poisoned = true;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(journal.state(), &Tally { values: vec![1], poisoned: false });
        assert_eq!(journal.len(), 1);
        assert_eq!(backup_count(&journal), 0);
        assert_eq!(fs::read_to_string(journal.state_path()).unwrap(), "[1]");
    }

    #[test]
    fn test_reopen_loads_state_with_empty_history() {
        let dir = tempdir().unwrap();
        {
            let mut journal = open(&dir, 5);
            push(&mut journal, 7);
        }

        let journal = open(&dir, 5);
        assert_eq!(journal.state().values, vec![7]);
        assert!(journal.is_empty());
    }

    #[test]
    fn test_corrupt_state_file_fails_open() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("data.json"), "{not json").unwrap();

        let result: Result<OperationJournal<Tally, String>> =
            OperationJournal::open(dir.path(), "data.json", 5, Tally::default());
        assert!(matches!(result, Err(MatchmakingError::Decode { .. })));
    }

    #[test]
    fn test_zero_history_rejected() {
        let dir = tempdir().unwrap();
        let result: Result<OperationJournal<Tally, String>> =
            OperationJournal::open(dir.path(), "data.json", 0, Tally::default());
        assert!(result.is_err());
    }
}
