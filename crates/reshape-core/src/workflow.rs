//! The run as a user sees it: pick a source, load it, confirm, reorganize.
//!
//! Interactive choices go through [`Prompt`] so the flow can be driven without
//! a terminal.

use crate::error::Result;
use crate::loader::{Loader, StructureSource};
use crate::reorganizer::Reorganizer;
use crate::report::RunReport;
use crate::session::ArchiveSession;
use std::path::PathBuf;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceChoice {
    Default,
    Url(String),
    Path(PathBuf),
    /// Write a template of the current directory instead of reorganizing.
    Template { output_dir: Option<PathBuf> },
}

pub trait Prompt {
    /// Asks which source to use. `None` means no valid selection was made.
    fn choose_source(&mut self) -> Option<SourceChoice>;

    /// Asks for a yes/no confirmation. Anything but an explicit yes is a no.
    fn confirm(&mut self, message: &str) -> bool;
}

#[derive(Debug)]
pub enum Outcome {
    NoSelection,
    TemplateCreated(PathBuf),
    Cancelled,
    Completed(RunReport),
}

pub const CONFIRM_MESSAGE: &str = "This will reorganize your project directory. \
All files will be moved to a timestamped archive directory first. Continue?";

#[derive(Debug)]
pub struct Workflow {
    loader: Loader,
    reorganizer: Reorganizer,
}

impl Workflow {
    pub fn new(loader: Loader, reorganizer: Reorganizer) -> Self {
        Self { loader, reorganizer }
    }

    pub fn reorganizer(&self) -> &Reorganizer {
        &self.reorganizer
    }

    /// Drives one run. A load failure is returned before anything on disk is
    /// touched; so is a declined confirmation.
    #[instrument(skip(self, prompt))]
    pub fn execute(
        &self,
        choice: Option<SourceChoice>,
        prompt: &mut dyn Prompt,
    ) -> Result<Outcome> {
        let Some(choice) = choice.or_else(|| prompt.choose_source()) else {
            return Ok(Outcome::NoSelection);
        };

        let source = match choice {
            SourceChoice::Template { output_dir } => {
                let path = self
                    .loader
                    .emit_template(self.reorganizer.root(), output_dir.as_deref())?;
                return Ok(Outcome::TemplateCreated(path));
            }
            SourceChoice::Default => StructureSource::Default,
            SourceChoice::Url(url) => StructureSource::Url(url),
            SourceChoice::Path(path) => StructureSource::Path(path),
        };

        let structure = self.loader.load(&source)?;

        if !prompt.confirm(CONFIRM_MESSAGE) {
            info!("Reorganization cancelled by user.");
            return Ok(Outcome::Cancelled);
        }

        let session = ArchiveSession::start(self.reorganizer.settings())?;
        let report = self.reorganizer.run(&structure, &session)?;
        Ok(Outcome::Completed(report))
    }
}
