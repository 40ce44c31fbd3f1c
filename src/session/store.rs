use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ViewfinderResult;
use crate::session::state::Viewport;

const STATE_FILE: &str = "state.json";

/// Single-slot persistence for the active [`Viewport`].
///
/// The slot is a JSON file in the scratch directory. Commands run as
/// separate processes, so this file is the only thing carrying a session
/// from one invocation to the next. Access is unsynchronized: concurrent
/// invocations race on the read-modify-write and the last writer wins.
/// One operator driving one session at a time is the supported model.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(dir: &Path) -> Self {
        Self { path: dir.join(STATE_FILE) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the active viewport, if any.
    ///
    /// A missing file means no session. A file that fails to parse is
    /// treated the same way rather than wedging every command; the next
    /// `start` overwrites it.
    pub fn load(&self) -> ViewfinderResult<Option<Viewport>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&raw) {
            Ok(viewport) => Ok(Some(viewport)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding unreadable session state");
                Ok(None)
            }
        }
    }

    pub fn save(&self, viewport: &Viewport) -> ViewfinderResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(viewport)?;
        fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), depth = viewport.zoom_depth, "session state saved");
        Ok(())
    }

    /// Remove the slot. Returns whether a session existed.
    pub fn clear(&self) -> ViewfinderResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
