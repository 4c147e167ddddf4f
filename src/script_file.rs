//! Per-attempt script file on disk
//!
//! KWin loads scripts by path, so the generated text has to land on the
//! filesystem first. Each attempt gets its own path and the file is removed on
//! every exit path: explicitly through [`ScriptFile::remove`], or on drop when a
//! panic unwinds past it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::debug_log::debug_log;

/// rw-r--r--: KWin reads the file, nothing executes it
pub const SCRIPT_FILE_MODE: u32 = 0o644;

/// Default directory for generated scripts
pub fn default_script_dir() -> PathBuf {
    std::env::temp_dir()
}

#[cfg(unix)]
fn current_uid() -> u32 {
    unsafe { libc::getuid() }
}

#[cfg(not(unix))]
fn current_uid() -> u32 {
    0
}

#[derive(Debug)]
pub struct ScriptFile {
    path: PathBuf,
    written: bool,
}

impl ScriptFile {
    /// Pick a unique path under `dir`. No I/O happens until [`write`](Self::write).
    pub fn reserve(dir: &Path) -> Self {
        let name = format!(
            "summon-kwin-{}-{}.js",
            current_uid(),
            uuid::Uuid::new_v4().simple()
        );
        Self {
            path: dir.join(name),
            written: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_written(&self) -> bool {
        self.written
    }

    /// Write the script and set its permissions
    pub fn write(&mut self, text: &str) -> io::Result<&Path> {
        fs::write(&self.path, text)?;
        self.written = true;

        #[cfg(unix)]
        fs::set_permissions(&self.path, fs::Permissions::from_mode(SCRIPT_FILE_MODE))?;

        debug_log("SCRIPT", &format!("Wrote script to {}", self.path.display()));
        Ok(&self.path)
    }

    /// Best-effort removal. Errors are logged, never returned.
    pub fn remove(mut self) {
        self.remove_from_disk();
    }

    fn remove_from_disk(&mut self) {
        if !self.written {
            return;
        }
        self.written = false;

        match fs::remove_file(&self.path) {
            Ok(()) => debug_log("SCRIPT", &format!("Removed {}", self.path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => debug_log(
                "SCRIPT",
                &format!("Failed to remove {}: {}", self.path.display(), e),
            ),
        }
    }
}

impl Drop for ScriptFile {
    fn drop(&mut self) {
        self.remove_from_disk();
    }
}
