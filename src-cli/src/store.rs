use std::{
    fs::{self, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use comment_engine::{EventId, EventSnapshot};

pub const DEFAULT_STATE_FILE: &str = "event-comments.json";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error in state file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("State file {0} not found; run `evc init` first")]
    Missing(PathBuf),
    #[error("State file {0} already exists")]
    AlreadyExists(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Create a state file holding an empty page for `event_id`.
pub fn init(path: &Path, event_id: EventId) -> Result<EventSnapshot> {
    let snapshot = EventSnapshot::empty(event_id);
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    file.write_all(serde_json::to_string_pretty(&snapshot)?.as_bytes())?;
    log::info!("initialized {} for event {}", path.display(), snapshot.event_id);
    Ok(snapshot)
}

pub fn load(path: &Path) -> Result<EventSnapshot> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(Error::Missing(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    let snapshot: EventSnapshot = serde_json::from_str(&content)?;
    log::debug!(
        "loaded {} comments for event {} from {}",
        snapshot.comments.len(),
        snapshot.event_id,
        path.display()
    );
    Ok(snapshot)
}

/// Replace the state file. Writes a sibling temp file first so a crash never
/// leaves a half-written snapshot behind.
pub fn write(path: &Path, snapshot: &EventSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    log::debug!("wrote {}", path.display());
    Ok(())
}
