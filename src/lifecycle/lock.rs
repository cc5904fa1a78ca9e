//! File-presence run lock.
//!
//! The marker is created once a server exists and removed once it is gone.
//! While it exists no new run may start; a marker left behind by a failed
//! deletion therefore blocks every later run until someone removes it by hand.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;

#[derive(Debug, Clone)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if the marker exists.
    ///
    /// A marker whose presence cannot be determined counts as present. A
    /// parent that is not a directory means the marker cannot exist.
    pub fn is_locked(&self) -> bool {
        match fs::symlink_metadata(&self.path) {
            Ok(_) => true,
            Err(e) => !matches!(
                e.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
            ),
        }
    }

    /// Creates (or overwrites) the marker. The content is informational only.
    pub fn acquire(&self, server_id: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(
            &self.path,
            format!("server={server_id}\nlocked_at={}\n", Utc::now().to_rfc3339()),
        )
    }

    /// Removes the marker; fails if it does not exist.
    pub fn release(&self) -> io::Result<bool> {
        fs::remove_file(&self.path)?;
        Ok(true)
    }
}
