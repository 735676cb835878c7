use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path};

/// Declarative target layout of a working directory.
///
/// A `Structure` names what should exist after a run; it does not promise that
/// any of the listed files are actually present in the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Structure {
    pub directories: BTreeMap<String, DirectoryEntry>,
    pub root_files: Vec<String>,
}

/// Desired contents of one top-level directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryEntry {
    /// Files restored directly inside the directory.
    #[serde(default)]
    pub files: Vec<String>,
    /// Relative subdirectories recreated empty.
    #[serde(default)]
    pub dirs: Vec<String>,
}

impl Structure {
    /// Parses and validates a serialized descriptor. `origin` names the URL or
    /// path it came from and is carried into any error.
    pub fn from_json(text: &str, origin: &str) -> Result<Self> {
        let structure: Self =
            serde_json::from_str(text).map_err(|e| Error::MalformedDescriptor {
                origin: origin.to_string(),
                reason: e.to_string(),
            })?;
        structure
            .validate()
            .map_err(|reason| Error::MalformedDescriptor {
                origin: origin.to_string(),
                reason,
            })?;
        Ok(structure)
    }

    /// Template form: pretty JSON, four-space indent.
    pub fn to_json(&self) -> Result<String> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever emits UTF-8.
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        for (name, entry) in &self.directories {
            if !is_simple_component(name) {
                return Err(format!("directory name '{name}' is not a single path component"));
            }
            if is_hidden(name) {
                return Err(format!("directory name '{name}' is hidden"));
            }
            for file in &entry.files {
                if !is_simple_component(file) {
                    return Err(format!(
                        "file '{file}' in directory '{name}' is not a single path component"
                    ));
                }
            }
            for dir in &entry.dirs {
                if !is_relative_subpath(dir) {
                    return Err(format!(
                        "subdirectory '{dir}' in directory '{name}' must be a relative path without '..'"
                    ));
                }
            }
        }
        for file in &self.root_files {
            if !is_simple_component(file) {
                return Err(format!("root file '{file}' is not a single path component"));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.root_files.is_empty()
    }
}

pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn is_simple_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(c)), None) if c == name
    )
}

fn is_relative_subpath(path: &str) -> bool {
    !path.is_empty()
        && Path::new(path)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}
