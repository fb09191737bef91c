//! Local staging for downloads, with guaranteed cleanup.
//!
//! Every download lands as a uniquely named file under a configured
//! staging root; the [`StagedFile`] guard removes it on drop, so staging
//! files never accumulate even when the upload after them fails.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` to a fresh staging file for `key`. The root directory
    /// is created on demand. The on-disk name carries a generated suffix
    /// so concurrent processes sharing a root cannot collide.
    pub fn stage(&self, key: &str, bytes: &[u8]) -> io::Result<StagedFile> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(format!("{key}.{}", Uuid::new_v4()));
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), size = bytes.len(), "Staged resource bytes");
        Ok(StagedFile { path })
    }
}

/// Guard for one staged file: removal is tied to drop, not to success.
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = ?err, "Failed to remove staged file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn stage_writes_the_bytes() {
        let root = tempdir().unwrap();
        let staging = StagingArea::new(root.path());

        let staged = staging.stage("Lines_20230101T000000", b"feed").unwrap();
        assert_eq!(fs::read(staged.path()).unwrap(), b"feed");
    }

    #[test]
    fn dropping_the_guard_removes_the_file() {
        let root = tempdir().unwrap();
        let staging = StagingArea::new(root.path());

        let staged = staging.stage("Lines_20230101T000000", b"feed").unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn drop_tolerates_an_already_removed_file() {
        let root = tempdir().unwrap();
        let staging = StagingArea::new(root.path());

        let staged = staging.stage("Lines_20230101T000000", b"feed").unwrap();
        fs::remove_file(staged.path()).unwrap();
        drop(staged);
    }

    #[test]
    fn root_is_created_on_demand() {
        let root = tempdir().unwrap();
        let nested = root.path().join("staging/run");
        let staging = StagingArea::new(&nested);

        let staged = staging.stage("Lines_20230101T000000", b"feed").unwrap();
        assert!(staged.path().starts_with(&nested));
    }
}
