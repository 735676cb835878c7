pub mod config;
pub mod error;
pub mod loader;
pub mod reorganizer;
pub mod report;
pub mod session;
pub mod structure;
pub mod tree;
pub mod workflow;

// Publicly re-export the main types for a clean external API.
pub use config::Settings;
pub use error::{Error, ErrorKind, Result};
pub use loader::{emit_template, load_from_path, scan_directory, Loader, StructureSource};
pub use reorganizer::Reorganizer;
pub use report::{Diagnostic, PhaseReport, RunReport};
pub use session::ArchiveSession;
pub use structure::{DirectoryEntry, Structure};
pub use tree::render_tree;
pub use workflow::{Outcome, Prompt, SourceChoice, Workflow};
