//! Screenshot artifacts for scenario runs.
//!
//! Files land in `<base>/<folder>/<status>-<title>-<project>.png`, where
//! `<base>` comes from `SCREENSHOT_BASE_DIR` (absolute, or relative to the
//! working directory) and defaults to `<cwd>/screenshots`.

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::result::FormprobeResult;

/// Environment variable overriding the screenshot base directory
pub const SCREENSHOT_DIR_ENV: &str = "SCREENSHOT_BASE_DIR";

/// Replace every run of non-alphanumeric characters with `_`
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_run = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }
    out
}

/// Base directory for screenshots given the environment override
#[must_use]
pub fn resolve_base_dir(env_value: Option<&OsStr>, cwd: &Path) -> PathBuf {
    match env_value {
        Some(base) if !base.is_empty() => {
            let base = Path::new(base);
            if base.is_absolute() {
                base.to_path_buf()
            } else {
                cwd.join(base)
            }
        }
        _ => cwd.join("screenshots"),
    }
}

/// Writes per-case screenshots for one suite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenshotStore {
    dir: PathBuf,
    project: String,
}

impl ScreenshotStore {
    /// Create a store writing into `base/folder`
    #[must_use]
    pub fn new(base: impl AsRef<Path>, folder: &str, project: impl Into<String>) -> Self {
        Self {
            dir: base.as_ref().join(folder),
            project: project.into(),
        }
    }

    /// Create a store from `SCREENSHOT_BASE_DIR` and the working directory
    pub fn from_env(folder: &str, project: impl Into<String>) -> FormprobeResult<Self> {
        let cwd = env::current_dir()?;
        let base = resolve_base_dir(env::var_os(SCREENSHOT_DIR_ENV).as_deref(), &cwd);
        Ok(Self::new(base, folder, project))
    }

    /// Target directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a case
    #[must_use]
    pub fn file_name(&self, status: &str, title: &str) -> String {
        format!("{status}-{}-{}.png", sanitize_title(title), self.project)
    }

    /// Full path for a case
    #[must_use]
    pub fn path_for(&self, status: &str, title: &str) -> PathBuf {
        self.dir.join(self.file_name(status, title))
    }

    /// Write screenshot bytes, creating the directory as needed
    pub fn save(&self, status: &str, title: &str, png: &[u8]) -> FormprobeResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(status, title);
        fs::write(&path, png)?;
        info!(path = %path.display(), "saved screenshot");
        Ok(path)
    }
}
