// Runtime settings
// Loaded from an optional JSON file, then overridden from the command line

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::schedule::reader::file_extension;
use crate::schedule::ScheduleError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Where uploads land; watched for changes
    pub storage_dir: PathBuf,

    /// Recognized schedule extensions, lowercase without the dot
    pub allowed_extensions: Vec<String>,

    /// Quiet period after the last change before reloading
    pub debounce_ms: u64,

    /// Per-viewer bound on a refresh send
    pub send_timeout_ms: u64,

    /// Refresh events buffered per viewer
    pub session_buffer: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("uploads"),
            allowed_extensions: vec!["xlsx".to_string(), "xls".to_string(), "csv".to_string()],
            debounce_ms: 750,
            send_timeout_ms: 2000,
            session_buffer: 8,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    ///
    /// Lines starting with `//` are treated as comments.
    pub fn load(path: Option<&Path>) -> Result<Self, ScheduleError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = fs::read_to_string(path)
            .map_err(|e| ScheduleError::Settings(format!("{}: {}", path.display(), e)))?;
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Settings = serde_json::from_str(&cleaned)
            .map_err(|e| ScheduleError::Settings(format!("{}: {}", path.display(), e)))?;
        settings.normalized()
    }

    /// Lowercase the extension list and reject unusable values
    pub fn normalized(mut self) -> Result<Self, ScheduleError> {
        self.allowed_extensions = self
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        if self.allowed_extensions.is_empty() {
            return Err(ScheduleError::Settings("allowed_extensions is empty".to_string()));
        }
        if self.send_timeout_ms == 0 {
            return Err(ScheduleError::Settings("send_timeout_ms must be positive".to_string()));
        }
        self.session_buffer = self.session_buffer.max(1);
        Ok(self)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn accepts(&self, path: &Path) -> bool {
        extension_allowed(path, &self.allowed_extensions)
    }

    /// Create the storage directory if missing
    pub fn ensure_storage_dir(&self) -> Result<(), ScheduleError> {
        if !self.storage_dir.exists() {
            fs::create_dir_all(&self.storage_dir)?;
            tracing::info!(dir = %self.storage_dir.display(), "created storage directory");
        }
        Ok(())
    }
}

/// Whether `path` carries one of `allowed` (case-insensitive)
pub fn extension_allowed(path: &Path, allowed: &[String]) -> bool {
    match file_extension(path) {
        Some(ext) => allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)),
        None => false,
    }
}
