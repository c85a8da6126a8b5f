//! Temporarily switch the process working directory.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

/// Changes into a directory on [`enter`](ScopedWorkingDir::enter) and
/// changes back when dropped, whichever way the scope is left.
#[derive(Debug)]
pub struct ScopedWorkingDir {
    original: PathBuf,
}

impl ScopedWorkingDir {
    pub fn enter(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let original = std::env::current_dir()?;
        let target = std::fs::canonicalize(path)?;
        if target != original {
            std::env::set_current_dir(&target)?;
            debug!(from = %original.display(), to = %target.display(), "Entered directory");
        }
        Ok(Self { original })
    }

    pub fn original(&self) -> &Path {
        &self.original
    }
}

impl Drop for ScopedWorkingDir {
    fn drop(&mut self) {
        let current = std::env::current_dir().ok();
        if current.as_deref() == Some(self.original.as_path()) {
            return;
        }
        if let Err(e) = std::env::set_current_dir(&self.original) {
            error!(path = %self.original.display(), error = ?e, "Failed to restore working directory");
        } else {
            debug!(path = %self.original.display(), "Restored working directory");
        }
    }
}
