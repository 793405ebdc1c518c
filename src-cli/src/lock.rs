use fs2::FileExt;
use std::{
    ffi::OsString,
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

use crate::store::Result;

/// A file-based exclusive lock over one state file.
///
/// Lock path: `{state}.lock` next to the state file. Held for the whole
/// load, mutate and write cycle so concurrent invocations on the same event
/// never interleave. Releasing unlocks the file and leaves it on disk, so
/// every waiter locks the same inode.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
    lock_file: File,
}

impl StateLock {
    pub fn new(state: &Path) -> Result<Self> {
        let path = Self::lock_path(state);
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        file.lock_exclusive()?;

        log::debug!("acquired state lock at {}", path.display());
        Ok(Self {
            lock_file: file,
            path,
        })
    }

    pub fn lock_path(state: &Path) -> PathBuf {
        let mut name = OsString::from(state.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(err) = self.lock_file.unlock() {
            log::warn!("failed to release state lock: {}", err);
        }
        log::debug!("released state lock at {}", self.path.display());
    }
}
