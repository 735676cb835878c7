//! Producing a [`Structure`] from a remote descriptor, a local descriptor file,
//! or a live directory scan.
//!
//! All three sources share [`scan_directory`]'s view of a layout, so a template
//! captured from a directory can later be replayed in its place.

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::structure::{is_hidden, DirectoryEntry, Structure};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

/// Where a [`Structure`] comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructureSource {
    /// The empty layout: everything is archived and nothing is restored.
    Default,
    Url(String),
    /// A descriptor file, or a directory to scan.
    Path(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Loader {
    settings: Settings,
}

impl Loader {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn load(&self, source: &StructureSource) -> Result<Structure> {
        match source {
            StructureSource::Default => Ok(Structure::default()),
            StructureSource::Url(url) => self.load_from_url(url),
            StructureSource::Path(path) => load_from_path(path),
        }
    }

    /// Fetches `url` and parses the body as a descriptor.
    #[instrument(skip(self))]
    pub fn load_from_url(&self, url: &str) -> Result<Structure> {
        info!("Fetching structure descriptor.");
        let unavailable = |source| Error::SourceUnavailable {
            url: url.to_string(),
            source,
        };

        let client = reqwest::blocking::Client::builder()
            .user_agent(format!("reshape/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(self.settings.fetch_timeout_secs))
            .build()
            .map_err(unavailable)?;

        let body = client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.text())
            .map_err(unavailable)?;

        debug!(bytes = body.len(), "Descriptor downloaded.");
        Structure::from_json(&body, url)
    }

    /// Scans `scan_root` and writes it as a template under the configured name.
    pub fn emit_template(&self, scan_root: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
        emit_template(scan_root, output_dir, &self.settings.template_name)
    }
}

/// Loads a descriptor file, or scans `path` if it is a directory.
#[instrument]
pub fn load_from_path(path: &Path) -> Result<Structure> {
    let path = std::path::absolute(path).map_err(|e| Error::io(path, e))?;
    if path.is_dir() {
        return scan_directory(&path);
    }
    if !path.exists() {
        return Err(Error::NotFound(path));
    }

    debug!(path = %path.display(), "Reading structure descriptor.");
    let origin = path.to_string_lossy().into_owned();
    let bytes = fs::read(&path).map_err(|e| Error::io(&path, e))?;
    let text = String::from_utf8(bytes).map_err(|e| Error::MalformedDescriptor {
        origin: origin.clone(),
        reason: e.to_string(),
    })?;
    Structure::from_json(&text, &origin)
}

/// Captures the layout of `root`.
///
/// Every non-hidden top-level directory becomes an entry whose `files` are the
/// files directly inside it and whose `dirs` are all nested directories at any
/// depth. Files below the first level are not recorded: only the shape of the
/// tree is kept. Hidden names are skipped at every depth.
#[instrument]
pub fn scan_directory(root: &Path) -> Result<Structure> {
    if !root.is_dir() {
        return Err(Error::NotFound(root.to_path_buf()));
    }

    let mut structure = Structure::default();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            debug!(path = %entry.path().display(), "Skipping non UTF-8 name.");
            continue;
        };
        if is_hidden(&name) {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            let scanned = scan_tracked_directory(path)?;
            structure.directories.insert(name, scanned);
        } else if path.is_file() {
            structure.root_files.push(name);
        }
    }

    debug!(
        directories = structure.directories.len(),
        root_files = structure.root_files.len(),
        "Scan complete."
    );
    Ok(structure)
}

fn scan_tracked_directory(dir: &Path) -> Result<DirectoryEntry> {
    let mut entry = DirectoryEntry::default();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !e.file_name().to_str().is_some_and(is_hidden));

    for item in walker {
        let item = item?;
        let Ok(relative) = item.path().strip_prefix(dir) else {
            continue;
        };
        let Some(relative) = relative_string(relative) else {
            debug!(path = %item.path().display(), "Skipping non UTF-8 path.");
            continue;
        };

        // Linked directories are neither descended nor recorded.
        if item.path_is_symlink() && item.path().is_dir() {
            debug!(path = %item.path().display(), "Skipping directory symlink.");
            continue;
        }
        if item.file_type().is_dir() {
            entry.dirs.push(relative);
        } else if item.depth() == 1 {
            entry.files.push(relative);
        }
    }
    Ok(entry)
}

/// `/`-joined form of a relative path, independent of the platform separator.
fn relative_string(path: &Path) -> Option<String> {
    let parts = path
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Scans `scan_root` and writes the result as `<output_dir>/<template_name>`
/// (or under `scan_root` when no output directory is given). An existing
/// template is overwritten.
#[instrument]
pub fn emit_template(
    scan_root: &Path,
    output_dir: Option<&Path>,
    template_name: &str,
) -> Result<PathBuf> {
    let structure = scan_directory(scan_root)?;

    let target_dir = match output_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
            dir.to_path_buf()
        }
        None => scan_root.to_path_buf(),
    };

    let template_path = target_dir.join(template_name);
    fs::write(&template_path, structure.to_json()?)
        .map_err(|e| Error::io(&template_path, e))?;
    info!(path = %template_path.display(), "Created structure template.");
    Ok(template_path)
}
