use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A per-item failure recorded during a run. None of these stop the run.
#[derive(Debug, Error)]
pub enum Diagnostic {
    #[error("Could not move '{}' to '{}': {error}", from.display(), to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("Could not list '{}': {error}", path.display())]
    ListFailed {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("Could not create directory '{}': {error}", path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("Could not find '{}' to restore '{}'", from.display(), to.display())]
    MissingSource { from: PathBuf, to: PathBuf },

    #[error("Not restoring '{}': '{}' already exists", from.display(), to.display())]
    DestinationExists { from: PathBuf, to: PathBuf },

    #[error("Could not restore '{}' from '{}': {error}", to.display(), from.display())]
    RestoreFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: io::Error,
    },
}

impl Diagnostic {
    /// Missing sources are expected when a layout lists files that were never there.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::MissingSource { .. })
    }
}

/// What one phase did: the paths it produced and the items it had to skip.
#[derive(Debug, Default)]
pub struct PhaseReport {
    pub completed: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

impl PhaseReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Debug)]
pub struct RunReport {
    pub archive_dir: PathBuf,
    pub archive: PhaseReport,
    pub rebuild: PhaseReport,
    pub root: PhaseReport,
}

impl RunReport {
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.archive
            .diagnostics
            .iter()
            .chain(&self.rebuild.diagnostics)
            .chain(&self.root.diagnostics)
    }

    pub fn is_clean(&self) -> bool {
        self.archive.is_clean() && self.rebuild.is_clean() && self.root.is_clean()
    }
}
