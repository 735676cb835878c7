use crate::config::Settings;
use crate::error::Result;
use std::fmt::Write;
use std::path::Path;
use walkdir::WalkDir;

/// Renders the layout under `root`, four spaces per level, directories
/// suffixed with `/`. Preserved entries and archive directories are left out.
pub fn render_tree(root: &Path, settings: &Settings) -> Result<String> {
    let mut out = String::from("./\n");
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            let top_level = entry.depth() == 1;
            let hidden_from_tree =
                settings.preserve.iter().any(|p| *p == name) || settings.is_archive_name(&name);
            !(top_level && hidden_from_tree)
        });

    for entry in walker {
        let entry = entry?;
        let indent = "    ".repeat(entry.depth());
        let name = entry.file_name().to_string_lossy();
        let suffix = if entry.file_type().is_dir() { "/" } else { "" };
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{indent}{name}{suffix}");
    }
    Ok(out)
}
