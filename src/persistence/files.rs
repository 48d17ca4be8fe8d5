//! File helpers for snapshot storage

use crate::error::{MatchmakingError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the directory holding pre-mutation snapshots
pub const BACKUP_DIR: &str = "backups";

/// Read a whole file, `None` when it does not exist
pub fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(MatchmakingError::io("reading", path, e)),
    }
}

/// Read a file that must exist
pub fn read_required(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| MatchmakingError::io("reading", path, e))
}

/// Replace `path` with `contents` via a sibling temp file and a rename
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let mut temp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| {
            MatchmakingError::validation(format!("{} has no file name", path.display()))
        })?;
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, contents).map_err(|e| MatchmakingError::io("writing", &temp_path, e))?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(MatchmakingError::io("replacing", path, e));
    }

    debug!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map_err(|e| MatchmakingError::io("copying to", to, e))?;
    Ok(())
}

/// Remove a file, returning whether it was there
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(MatchmakingError::io("removing", path, e)),
    }
}

/// Create `dir` if needed, failing when the path exists but is not a directory
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(MatchmakingError::validation(format!(
            "Save directory, {}, is not a directory",
            dir.display()
        )));
    }
    fs::create_dir_all(dir).map_err(|e| MatchmakingError::io("creating", dir, e))
}

/// Fail when something other than a regular file sits at `path`
pub fn check_file_slot(path: &Path) -> Result<()> {
    if path.exists() && !path.is_file() {
        return Err(MatchmakingError::validation(format!(
            "Save file, {}, is not a file",
            path.display()
        )));
    }
    Ok(())
}

/// Validate a journaled save directory and return its backup directory
pub fn prepare_save_dir(dir: &Path, state_file: &Path) -> Result<PathBuf> {
    ensure_dir(dir)?;
    check_file_slot(state_file)?;

    let backup_dir = dir.join(BACKUP_DIR);
    if backup_dir.exists() && !backup_dir.is_dir() {
        return Err(MatchmakingError::validation(format!(
            "Backup directory, {}, is not a directory",
            backup_dir.display()
        )));
    }
    fs::create_dir_all(&backup_dir).map_err(|e| MatchmakingError::io("creating", &backup_dir, e))?;

    Ok(backup_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        atomic_write(&path, "first").unwrap();
        atomic_write(&path, "second").unwrap();

        assert_eq!(read_required(&path).unwrap(), "second");
        assert!(!dir.path().join("data.json.tmp").exists());
    }

    #[test]
    fn test_read_optional_and_remove() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        assert_eq!(read_optional(&path).unwrap(), None);
        assert!(!remove_if_exists(&path).unwrap());

        fs::write(&path, "{}").unwrap();
        assert_eq!(read_optional(&path).unwrap().as_deref(), Some("{}"));
        assert!(remove_if_exists(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_prepare_save_dir() {
        let dir = tempdir().unwrap();
        let save_dir = dir.path().join("ratings");

        let backups = prepare_save_dir(&save_dir, &save_dir.join("data.json")).unwrap();
        assert!(backups.is_dir());
        assert_eq!(backups, save_dir.join(BACKUP_DIR));

        // A directory where the state file should be
        fs::create_dir(save_dir.join("other.json")).unwrap();
        assert!(matches!(
            prepare_save_dir(&save_dir, &save_dir.join("other.json")),
            Err(MatchmakingError::Validation { .. })
        ));

        // A file where the save directory should be
        let file = dir.path().join("plain");
        fs::write(&file, "").unwrap();
        assert!(prepare_save_dir(&file, &file.join("data.json")).is_err());
    }

    #[test]
    fn test_backup_dir_must_be_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(BACKUP_DIR), "").unwrap();

        assert!(prepare_save_dir(dir.path(), &dir.path().join("data.json")).is_err());
    }
}
