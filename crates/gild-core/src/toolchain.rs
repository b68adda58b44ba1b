//! Toolchain - Sass compiler, CSS prefixer and JS minifier
//!
//! Sass/SCSS is compiled in-process with `grass`. Prefixing and minification
//! are delegated to external commands that read stdin and write stdout.

use anyhow::{anyhow, bail, Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::ToolchainConfig;

/// Compilers invoked by leaf actions
pub trait Toolchain: Send + Sync {
    /// Compile one Sass/SCSS entry file to compressed CSS
    fn compile_sass(&self, path: &Path, load_paths: &[PathBuf]) -> Result<String>;

    /// Add vendor prefixes
    fn prefix_css(&self, css: String) -> Result<String>;

    /// Minify JavaScript, keeping license comments
    fn minify_js(&self, js: String) -> Result<String>;
}

/// `grass` plus configurable external commands
#[derive(Debug, Clone, Default)]
pub struct DefaultToolchain {
    prefixer: Option<Vec<String>>,
    minifier: Vec<String>,
}

impl DefaultToolchain {
    pub fn from_config(config: &ToolchainConfig) -> Self {
        Self {
            prefixer: config.prefixer.clone(),
            minifier: config.minifier.clone(),
        }
    }
}

impl Toolchain for DefaultToolchain {
    fn compile_sass(&self, path: &Path, load_paths: &[PathBuf]) -> Result<String> {
        let mut options = grass::Options::default().style(grass::OutputStyle::Compressed);
        for load_path in load_paths {
            options = options.load_path(load_path);
        }

        grass::from_path(path, &options).map_err(|e| anyhow!("{}: {}", path.display(), e))
    }

    fn prefix_css(&self, css: String) -> Result<String> {
        match &self.prefixer {
            Some(command) => pipe_through(command, css),
            None => Ok(css),
        }
    }

    fn minify_js(&self, js: String) -> Result<String> {
        pipe_through(&self.minifier, js)
    }
}

/// Feed `input` to a command's stdin and collect its stdout
fn pipe_through(command: &[String], input: String) -> Result<String> {
    let Some((program, args)) = command.split_first() else {
        bail!("empty tool command");
    };

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("failed to start {}", program))?;

    // Write from another thread so a chatty tool cannot deadlock on a full pipe
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow!("{} has no stdin", program))?;
    let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));

    let output = child.wait_with_output()?;
    writer
        .join()
        .map_err(|_| anyhow!("stdin writer for {} panicked", program))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{} failed: {}", program, stderr.trim());
    }

    Ok(String::from_utf8(output.stdout)?)
}
