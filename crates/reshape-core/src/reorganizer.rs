use crate::config::Settings;
use crate::error::Result;
use crate::report::{Diagnostic, PhaseReport, RunReport};
use crate::session::ArchiveSession;
use crate::structure::Structure;
use std::ffi::{OsStr, OsString};
use std::fs::{self, FileTimes};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, span, warn, Level};
use walkdir::WalkDir;

/// Archives the top level of a working directory, then rebuilds it from a
/// [`Structure`] by copying files back out of the archive.
///
/// The working directory is assumed to be used by one process at a time.
#[derive(Debug)]
pub struct Reorganizer {
    settings: Settings,
    root: PathBuf,
    tool_name: Option<OsString>,
}

impl Reorganizer {
    pub fn new(settings: Settings, root: impl Into<PathBuf>) -> Self {
        let tool_name = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_name().map(OsStr::to_os_string));
        Self {
            settings,
            root: root.into(),
            tool_name,
        }
    }

    /// Name of the tool's own file, which is never archived.
    pub fn with_tool_name(mut self, name: impl Into<OsString>) -> Self {
        self.tool_name = Some(name.into());
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Runs the whole transaction. Only failing to create the archive
    /// directory is an error; everything after that is reported per item.
    #[instrument(skip_all, name = "reorganize", fields(root = %self.root.display()))]
    pub fn run(&self, structure: &Structure, session: &ArchiveSession) -> Result<RunReport> {
        info!("Starting reorganization...");
        let archive_dir = session.create_archive_dir(&self.root)?;

        let archive = self.archive_existing(&archive_dir);
        info!(
            moved = archive.completed.len(),
            failed = archive.diagnostics.len(),
            "Archive phase finished."
        );

        let rebuild = self.rebuild_directories(structure, &archive_dir);
        let root = self.restore_root_files(structure, &archive_dir);
        info!(
            restored = rebuild.completed.len() + root.completed.len(),
            "Reorganization finished."
        );

        Ok(RunReport {
            archive_dir,
            archive,
            rebuild,
            root,
        })
    }

    /// Moves every top-level entry into `archive_dir`, except preserved
    /// names, the archive itself, the tool and descriptor files.
    #[instrument(skip(self))]
    pub fn archive_existing(&self, archive_dir: &Path) -> PhaseReport {
        let mut report = PhaseReport::default();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(path = %self.root.display(), %error, "Could not list working directory.");
                report.diagnostics.push(Diagnostic::ListFailed {
                    path: self.root.clone(),
                    error,
                });
                return report;
            }
        };

        let mut names: Vec<OsString> = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => names.push(entry.file_name()),
                Err(error) => {
                    warn!(path = %self.root.display(), %error, "Could not read directory entry.");
                    report.diagnostics.push(Diagnostic::ListFailed {
                        path: self.root.clone(),
                        error,
                    });
                }
            }
        }
        names.sort();

        for name in names {
            if self.is_protected(&name, archive_dir) {
                debug!(name = %name.to_string_lossy(), "Leaving entry in place.");
                continue;
            }
            let from = self.root.join(&name);
            let to = archive_dir.join(&name);
            match move_entry(&from, &to) {
                Ok(()) => {
                    debug!(from = %from.display(), to = %to.display(), "Archived entry.");
                    report.completed.push(to);
                }
                Err(error) => {
                    warn!(from = %from.display(), %error, "Could not archive entry, leaving it in place.");
                    report.diagnostics.push(Diagnostic::MoveFailed { from, to, error });
                }
            }
        }
        report
    }

    /// Recreates every directory of `structure` with its subdirectories and
    /// restores its listed files from the archive.
    #[instrument(skip(self, structure))]
    pub fn rebuild_directories(&self, structure: &Structure, archive_dir: &Path) -> PhaseReport {
        let mut report = PhaseReport::default();

        for (dir_name, entry) in &structure.directories {
            let dir_span = span!(Level::INFO, "directory", name = %dir_name);
            let _enter = dir_span.enter();

            let target = self.root.join(dir_name);
            if let Err(error) = fs::create_dir_all(&target) {
                warn!(path = %target.display(), %error, "Could not create directory, skipping its contents.");
                report.diagnostics.push(Diagnostic::CreateDirFailed { path: target, error });
                continue;
            }
            info!("Created directory.");

            for sub in &entry.dirs {
                let path = target.join(sub);
                match fs::create_dir_all(&path) {
                    Ok(()) => debug!(subdirectory = %sub, "Created subdirectory."),
                    Err(error) => {
                        warn!(path = %path.display(), %error, "Could not create subdirectory.");
                        report.diagnostics.push(Diagnostic::CreateDirFailed { path, error });
                    }
                }
            }

            for file in &entry.files {
                let from = archive_dir.join(dir_name).join(file);
                restore_file(&from, &target.join(file), &mut report);
            }
        }
        report
    }

    #[instrument(skip(self, structure))]
    pub fn restore_root_files(&self, structure: &Structure, archive_dir: &Path) -> PhaseReport {
        let mut report = PhaseReport::default();
        for file in &structure.root_files {
            restore_file(&archive_dir.join(file), &self.root.join(file), &mut report);
        }
        report
    }

    fn is_protected(&self, name: &OsStr, archive_dir: &Path) -> bool {
        if archive_dir.file_name() == Some(name) {
            return true;
        }
        if self.tool_name.as_deref() == Some(name) {
            return true;
        }
        let Some(name) = name.to_str() else {
            return false;
        };
        self.settings.preserve.iter().any(|p| p == name) || self.settings.is_descriptor(name)
    }
}

/// Copies `from` to `to` unless the source is missing or the destination is
/// already taken. The archive keeps its copy either way.
fn restore_file(from: &Path, to: &Path, report: &mut PhaseReport) {
    if !from.exists() {
        warn!(from = %from.display(), "Could not find file in archive.");
        report.diagnostics.push(Diagnostic::MissingSource {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        return;
    }
    if to.exists() {
        warn!(to = %to.display(), "Destination already exists, not overwriting.");
        report.diagnostics.push(Diagnostic::DestinationExists {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        return;
    }

    match copy_with_times(from, to) {
        Ok(()) => {
            info!(path = %to.display(), "Restored file.");
            report.completed.push(to.to_path_buf());
        }
        Err(error) => {
            warn!(from = %from.display(), to = %to.display(), %error, "Could not restore file.");
            report.diagnostics.push(Diagnostic::RestoreFailed {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                error,
            });
        }
    }
}

/// `fs::copy` keeps permissions; access and modification times are carried over here.
fn copy_with_times(from: &Path, to: &Path) -> io::Result<()> {
    let metadata = fs::metadata(from)?;
    fs::copy(from, to)?;

    let mut times = FileTimes::new();
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    open_for_times(to)?.set_times(times)
}

/// The copy may be read-only already; Unix only needs a read handle to set times.
#[cfg(unix)]
fn open_for_times(path: &Path) -> io::Result<fs::File> {
    fs::File::open(path)
}

#[cfg(not(unix))]
fn open_for_times(path: &Path) -> io::Result<fs::File> {
    fs::File::options().write(true).open(path)
}

fn move_entry(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = %from.display(), "Rename crosses devices, copying instead.");
            copy_tree(from, to)?;
            if from.is_dir() {
                fs::remove_dir_all(from)
            } else {
                fs::remove_file(from)
            }
        }
        other => other,
    }
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    if !from.is_dir() {
        return copy_with_times(from, to);
    }
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(io::Error::other)?;
        let target = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            copy_with_times(entry.path(), &target)?;
        }
    }
    Ok(())
}
