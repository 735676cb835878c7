use crate::error::{Error, Result};
use chrono::format::{Item, StrftimeItems};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Prefix of the per-run archive directory (`<prefix>_<timestamp>`).
    pub archive_prefix: String,

    /// chrono format string used for the archive timestamp.
    pub timestamp_format: String,

    /// Extension (without the dot) that marks a file as a structure descriptor.
    pub descriptor_extension: String,

    /// File name used when emitting a template.
    pub template_name: String,

    /// Top-level names that are never archived (version control metadata).
    pub preserve: Vec<String>,

    /// Timeout for fetching a remote descriptor, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            archive_prefix: "archive".to_string(),
            timestamp_format: "%Y%m%d_%H%M%S".to_string(),
            descriptor_extension: "map".to_string(),
            template_name: "repository_structure.map".to_string(),
            preserve: vec![".git".to_string()],
            fetch_timeout_secs: 30,
        }
    }
}

impl Settings {
    const ENV_PREFIX: &'static str = "RESHAPE";

    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "reshape").ok_or(Error::ConfigDirNotFound)?;
        Ok(dirs.config_dir().join("settings.toml"))
    }

    /// Loads the user settings file (if any), then `RESHAPE_*` environment overrides.
    pub fn new() -> Result<Self> {
        match Self::config_path() {
            Ok(path) => Self::build(Some(&path), false),
            Err(Error::ConfigDirNotFound) => Self::build(None, false),
            Err(e) => Err(e),
        }
    }

    /// Loads settings from an explicit file, which must exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::build(Some(path), true)
    }

    fn build(path: Option<&Path>, required: bool) -> Result<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("archive_prefix", defaults.archive_prefix)?
            .set_default("timestamp_format", defaults.timestamp_format)?
            .set_default("descriptor_extension", defaults.descriptor_extension)?
            .set_default("template_name", defaults.template_name)?
            .set_default("preserve", defaults.preserve)?
            .set_default("fetch_timeout_secs", defaults.fetch_timeout_secs)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(required));
        }

        let settings: Self = builder
            .add_source(config::Environment::with_prefix(Self::ENV_PREFIX))
            .build()?
            .try_deserialize()
            .map_err(Error::Config)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return Err(Self::invalid_timestamp_format(&self.timestamp_format));
        }
        Ok(())
    }

    pub(crate) fn invalid_timestamp_format(format: &str) -> Error {
        Error::Config(config::ConfigError::Message(format!(
            "invalid timestamp_format '{format}'"
        )))
    }

    /// Whether `name` carries the descriptor extension.
    pub fn is_descriptor(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .is_some_and(|ext| ext == self.descriptor_extension.as_str())
    }

    /// Whether `name` looks like one of this tool's archive directories.
    pub fn is_archive_name(&self, name: &str) -> bool {
        name.strip_prefix(self.archive_prefix.as_str())
            .is_some_and(|rest| rest.starts_with('_'))
    }
}
