//! Session logging
//!
//! Console events go to stderr so rendered reference lists on stdout stay
//! pipeable; an optional append-mode file layer captures the same events
//! with full targets for later inspection.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Console verbosity, resolved from the CLI flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Debug,
}

impl Verbosity {
    /// `--debug` wins over `--quiet` when both are given
    pub fn from_flags(debug: bool, quiet: bool) -> Self {
        if debug {
            Verbosity::Debug
        } else if quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }

    fn level(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "info",
            Verbosity::Debug => "debug",
        }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::new(format!("refmatch={}", self.level()))
    }
}

/// Install the global subscriber: a stderr layer at the requested verbosity
/// plus, when a path is given, a plain-text file layer
pub fn init_logging(verbosity: Verbosity, log_file: Option<&Path>) -> Result<()> {
    let debug = verbosity == Verbosity::Debug;
    let console = fmt::layer()
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug)
        .with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Arc::new(open_append(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(verbosity.filter())
        .with(console)
        .with(file_layer)
        .init();
    Ok(())
}

fn open_append(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))
}

/// Timestamped log path under the user config directory
pub fn default_log_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("could not determine config directory")?
        .join("refmatch")
        .join("logs");
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    Ok(dir.join(format!("review-{}.log", stamp)))
}
