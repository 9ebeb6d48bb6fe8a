//! Atomic file replacement.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use orgdiff_model::{OrgDiffError, Result};
use tracing::{info, warn};

/// Writes the full content of a file. Swappable so failures can be simulated.
pub trait ContentWriter {
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
}

/// Writes through the filesystem and syncs before returning.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsWriter;

impl ContentWriter for FsWriter {
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(contents)?;
        file.sync_all()
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

pub fn backup_path(path: &Path) -> PathBuf {
    sibling(path, ".backup")
}

pub fn tmp_path(path: &Path) -> PathBuf {
    sibling(path, ".tmp")
}

/// Writes `contents` to `<path>.tmp` and renames it over `path`.
pub fn write_atomic(path: &Path, contents: &[u8], writer: &dyn ContentWriter) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| OrgDiffError::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let temp = tmp_path(path);
    if let Err(e) = writer.write(&temp, contents) {
        let _ = fs::remove_file(&temp);
        return Err(OrgDiffError::Write {
            path: temp,
            source: e,
        });
    }
    fs::rename(&temp, path).map_err(|e| {
        let _ = fs::remove_file(&temp);
        OrgDiffError::Write {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

/// Replaces an existing file, keeping a `<path>.backup` copy of the old
/// content. On failure the original content is put back.
pub fn replace_with_backup(path: &Path, contents: &[u8], writer: &dyn ContentWriter) -> Result<()> {
    let backup = backup_path(path);
    fs::copy(path, &backup).map_err(|e| OrgDiffError::Write {
        path: backup.clone(),
        source: e,
    })?;
    info!(backup = %backup.display(), "created backup");

    if let Err(err) = write_atomic(path, contents, writer) {
        warn!(path = %path.display(), error = %err, "write failed, restoring backup");
        if let Err(restore) = fs::copy(&backup, path) {
            warn!(path = %path.display(), error = %restore, "could not restore backup");
        }
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct FailingWriter;

    impl ContentWriter for FailingWriter {
        fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
            // Leave a partial file behind before failing.
            fs::write(path, &contents[..contents.len() / 2])?;
            Err(io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, b"new", &FsWriter).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_failed_replace_keeps_original_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Account.jsonl");
        fs::write(&path, "{\"Id\":1}\n{\"Id\":1}\n").unwrap();

        let err = replace_with_backup(&path, b"{\"Id\":1}\n", &FailingWriter).unwrap_err();

        assert!(matches!(err, OrgDiffError::Write { .. }));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "{\"Id\":1}\n{\"Id\":1}\n"
        );
        assert!(backup_path(&path).exists());
        assert!(!tmp_path(&path).exists());
    }
}
