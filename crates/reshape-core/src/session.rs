use crate::config::Settings;
use crate::error::{Error, Result};
use chrono::Local;
use std::fmt::Write;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// State of a single run. The timestamp is fixed when the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSession {
    timestamp: String,
    archive_name: String,
}

impl ArchiveSession {
    /// Fails if `timestamp_format` holds a specifier chrono cannot render.
    pub fn start(settings: &Settings) -> Result<Self> {
        let mut timestamp = String::new();
        write!(timestamp, "{}", Local::now().format(&settings.timestamp_format))
            .map_err(|_| Settings::invalid_timestamp_format(&settings.timestamp_format))?;
        Ok(Self::with_timestamp(settings, timestamp))
    }

    pub fn with_timestamp(settings: &Settings, timestamp: impl Into<String>) -> Self {
        let timestamp = timestamp.into();
        let archive_name = format!("{}_{}", settings.archive_prefix, timestamp);
        Self {
            timestamp,
            archive_name,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Preferred archive directory name; the created one may carry a suffix.
    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }

    /// Creates a fresh archive directory under `root`.
    ///
    /// An existing directory is never reused: if the name is taken, `_1`,
    /// `_2`, ... is appended until creation succeeds.
    pub fn create_archive_dir(&self, root: &Path) -> Result<PathBuf> {
        let mut candidate = root.join(&self.archive_name);
        let mut suffix = 0u32;
        loop {
            match fs::create_dir(&candidate) {
                Ok(()) => {
                    info!(path = %candidate.display(), "Created archive directory.");
                    return Ok(candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %candidate.display(), "Archive name taken, trying next suffix.");
                    suffix += 1;
                    candidate = root.join(format!("{}_{}", self.archive_name, suffix));
                }
                Err(e) => return Err(Error::io(candidate, e)),
            }
        }
    }
}
