use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use clap::{ArgAction, ArgGroup, ColorChoice, Parser};
use console::style;
use dialoguer::{Confirm, Input, Select};
use reshape_core::{
    render_tree, ErrorKind, Loader, Outcome, Prompt, Reorganizer, RunReport, Settings, SourceChoice,
    Workflow,
};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Archive a project's top level and rebuild it from a structure descriptor.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("source").args(["url", "file", "create_template"])))]
struct Cli {
    /// URL of a structure descriptor (.map file).
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Local descriptor file, or a directory whose layout is copied.
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Write a template descriptor of the current directory into DIR.
    #[arg(long, value_name = "DIR")]
    create_template: Option<PathBuf>,

    /// Read settings from this file instead of the user configuration.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Set the verbosity level. Use -v for debug, -vv for trace.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Control when to use color output.
    #[arg(long, value_name = "WHEN", default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Also write logs to this file.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn source_choice(&self) -> Option<SourceChoice> {
        if let Some(dir) = &self.create_template {
            Some(SourceChoice::Template { output_dir: Some(dir.clone()) })
        } else if let Some(url) = &self.url {
            Some(SourceChoice::Url(url.clone()))
        } else {
            self.file.clone().map(SourceChoice::Path)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose, cli.color, cli.log_file.as_deref())?;

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from '{}'", path.display()))?,
        None => Settings::new().context("Failed to load settings")?,
    };

    let root = std::env::current_dir().context("Could not determine the current directory")?;
    let workflow = Workflow::new(
        Loader::new(settings.clone()),
        Reorganizer::new(settings, &root),
    );

    let choice = cli.source_choice();
    if choice.is_none() {
        println!("{}", style("Project Structure Cleaner").bold());
    }

    let outcome = workflow
        .execute(choice, &mut TerminalPrompt::default())
        .map_err(|err| {
            let message = match err.kind() {
                ErrorKind::IoFailure => "Could not complete the operation",
                _ => "No valid structure provided. Exiting",
            };
            anyhow::Error::new(err).context(message)
        })?;

    match outcome {
        Outcome::NoSelection => println!("Invalid choice"),
        Outcome::Cancelled => println!("Operation cancelled"),
        Outcome::TemplateCreated(path) => {
            println!(
                "Created structure template: {}",
                style(path.display()).yellow()
            );
            println!("Edit it and run reshape again with --file.");
        }
        Outcome::Completed(report) => {
            print_summary(&root, workflow.reorganizer().settings(), &report)?;
        }
    }
    Ok(())
}

fn init_tracing(
    verbosity: u8,
    color: ColorChoice,
    log_file: Option<&Path>,
) -> Result<Option<WorkerGuard>> {
    let level = match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(color != ColorChoice::Never);

    let Some(path) = log_file else {
        builder.with_writer(std::io::stderr).init();
        return Ok(None);
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Could not open log file '{}'", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    builder
        .with_writer(std::io::stderr.and(writer))
        .init();
    Ok(Some(guard))
}

fn print_summary(root: &Path, settings: &Settings, report: &RunReport) -> Result<()> {
    println!("\n{}", style("=== Final Repository Structure ===").bold());
    let tree = render_tree(root, settings).context("Could not read the rebuilt directory")?;
    print!("{tree}");

    let diagnostics: Vec<_> = report.diagnostics().collect();
    if !diagnostics.is_empty() {
        println!("\n{}", style("Some items need attention:").yellow().bold());
        for diagnostic in diagnostics {
            let marker = if diagnostic.is_warning() {
                style("warning").yellow()
            } else {
                style("error").red()
            };
            println!("  {marker}: {diagnostic}");
        }
    }

    let archive_name = report.archive_dir.file_name().map_or_else(
        || report.archive_dir.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    );
    println!(
        "\n{}",
        style("Cleanup complete! Check the repository structure above.").green().bold()
    );
    println!("All other files have been moved to {}", style(archive_name).cyan());
    Ok(())
}

/// Menu and confirmation on the terminal, through dialoguer.
#[derive(Default)]
struct TerminalPrompt {
    theme: dialoguer::theme::ColorfulTheme,
}

impl Prompt for TerminalPrompt {
    fn choose_source(&mut self) -> Option<SourceChoice> {
        let options = [
            "Use default structure",
            "Load from URL",
            "Load from local .map file or directory",
            "Create template from current directory",
        ];
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Select option")
            .items(&options)
            .default(0)
            .interact_opt()
            .ok()??;

        match selection {
            0 => Some(SourceChoice::Default),
            1 => self.ask("Enter URL to .map file", false).map(SourceChoice::Url),
            2 => self
                .ask("Enter path to .map file or directory", false)
                .map(|p| SourceChoice::Path(p.into())),
            3 => {
                let dir = self.ask(
                    "Enter output directory (or press Enter for current directory)",
                    true,
                )?;
                let dir = dir.trim();
                Some(SourceChoice::Template {
                    output_dir: (!dir.is_empty()).then(|| dir.into()),
                })
            }
            _ => None,
        }
    }

    fn confirm(&mut self, message: &str) -> bool {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

impl TerminalPrompt {
    fn ask(&self, prompt: &str, allow_empty: bool) -> Option<String> {
        Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(allow_empty)
            .interact_text()
            .ok()
    }
}
