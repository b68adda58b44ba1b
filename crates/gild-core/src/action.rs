//! Leaf actions - the file-producing (or file-removing) work behind a task

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::globs::{self, relative_to};
use crate::key::TaskKey;
use crate::toolchain::Toolchain;

/// Separator between concatenated scripts
pub const SCRIPT_SEPARATOR: &str = ";";
/// Separator between concatenated stylesheets
pub const STYLE_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Satisfies the graph without doing anything
    Noop { reason: &'static str },

    /// Remove every path matching the patterns (files or whole directories)
    Delete { targets: Vec<String> },

    /// Compile the first existing entry file, prefix it and write it with a source map
    CompileStyles {
        entries: Vec<PathBuf>,
        load_paths: Vec<PathBuf>,
        output: PathBuf,
    },

    /// Concatenate matched files, optionally minify, write one bundle
    ConcatScripts {
        patterns: Vec<String>,
        output: PathBuf,
        minify: bool,
    },

    /// Concatenate matched stylesheets and prefix the bundle
    BundleStyles { patterns: Vec<String>, output: PathBuf },

    /// Compile every matched entry in place (`x/styles/main.scss` → `x/styles/main.css`)
    CompileInPlace {
        patterns: Vec<String>,
        load_paths: Vec<PathBuf>,
    },

    /// Copy matched files below `destination`, keeping paths relative to the glob base
    Copy {
        patterns: Vec<String>,
        destination: PathBuf,
    },

    /// Re-run `target` whenever a file matching the patterns changes
    Watch {
        patterns: Vec<String>,
        target: TaskKey,
    },
}

impl Action {
    /// Run the action. `Watch` is handled by the executor and does nothing here.
    pub fn run(&self, toolchain: &dyn Toolchain) -> Result<()> {
        match self {
            Action::Noop { reason } => {
                debug!("Skipping: {}", reason);
                Ok(())
            }
            Action::Watch { .. } => Ok(()),
            Action::Delete { targets } => delete(targets),
            Action::CompileStyles {
                entries,
                load_paths,
                output,
            } => compile_styles(toolchain, entries, load_paths, output),
            Action::ConcatScripts {
                patterns,
                output,
                minify,
            } => concat_scripts(toolchain, patterns, output, *minify),
            Action::BundleStyles { patterns, output } => bundle_styles(toolchain, patterns, output),
            Action::CompileInPlace {
                patterns,
                load_paths,
            } => compile_in_place(toolchain, patterns, load_paths),
            Action::Copy {
                patterns,
                destination,
            } => copy(patterns, destination),
        }
    }
}

fn delete(targets: &[String]) -> Result<()> {
    for path in globs::expand(targets)? {
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };

        match result {
            Ok(()) => debug!("Deleted {}", path.display()),
            // Another parallel clean got there first
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_context(|| format!("failed to delete {}", path.display())),
        }
    }
    Ok(())
}

fn compile_styles(
    toolchain: &dyn Toolchain,
    entries: &[PathBuf],
    load_paths: &[PathBuf],
    output: &Path,
) -> Result<()> {
    let Some(entry) = entries.iter().find(|p| p.is_file()) else {
        debug!("No stylesheet entry for {}", output.display());
        return Ok(());
    };

    let css = toolchain.compile_sass(entry, load_paths)?;
    let css = toolchain.prefix_css(css)?;

    let file = file_name(output)?;
    let map_name = format!("{}.map", file);
    let out_dir = output.parent().unwrap_or(Path::new("."));
    let source = relative_to(entry, out_dir);

    let map = serde_json::json!({
        "version": 3,
        "file": file,
        "sources": [source.to_string_lossy().replace('\\', "/")],
        "names": [],
        "mappings": "",
    });

    let css = format!("{}\n/*# sourceMappingURL={} */\n", css.trim_end(), map_name);
    write(output, &css)?;
    write(&out_dir.join(map_name), &serde_json::to_string(&map)?)?;

    Ok(())
}

fn concat_scripts(
    toolchain: &dyn Toolchain,
    patterns: &[String],
    output: &Path,
    minify: bool,
) -> Result<()> {
    let Some(js) = concat(patterns, SCRIPT_SEPARATOR)? else {
        debug!("No scripts matched for {}", output.display());
        return Ok(());
    };

    let js = if minify { toolchain.minify_js(js)? } else { js };
    write(output, &js)
}

fn bundle_styles(toolchain: &dyn Toolchain, patterns: &[String], output: &Path) -> Result<()> {
    let Some(css) = concat(patterns, STYLE_SEPARATOR)? else {
        debug!("No stylesheets matched for {}", output.display());
        return Ok(());
    };

    let css = toolchain.prefix_css(css)?;
    write(output, &css)
}

fn compile_in_place(
    toolchain: &dyn Toolchain,
    patterns: &[String],
    load_paths: &[PathBuf],
) -> Result<()> {
    for entry in globs::expand(patterns)? {
        if !entry.is_file() {
            continue;
        }
        let css = toolchain.compile_sass(&entry, load_paths)?;
        let css = toolchain.prefix_css(css)?;
        write(&entry.with_extension("css"), &css)?;
    }
    Ok(())
}

fn copy(patterns: &[String], destination: &Path) -> Result<()> {
    let files: Vec<_> = globs::expand_with_base(patterns)?
        .into_iter()
        .filter(|(path, _)| path.is_file())
        .collect();

    files.par_iter().try_for_each(|(path, base)| -> Result<()> {
        let relative = match path.strip_prefix(base) {
            Ok(relative) => relative.to_path_buf(),
            Err(_) => PathBuf::from(file_name(path)?),
        };
        let target = destination.join(relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(path, &target)
            .with_context(|| format!("failed to copy {} to {}", path.display(), target.display()))?;
        Ok(())
    })?;

    debug!("Copied {} files into {}", files.len(), destination.display());
    Ok(())
}

/// Read and join every matched file; `None` when nothing matched
fn concat(patterns: &[String], separator: &str) -> Result<Option<String>> {
    let files: Vec<_> = globs::expand(patterns)?
        .into_iter()
        .filter(|p| p.is_file())
        .collect();

    if files.is_empty() {
        return Ok(None);
    }

    let parts = files
        .iter()
        .map(|path| {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(parts.join(separator)))
}

fn write(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))
}
