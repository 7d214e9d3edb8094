//! Log output setup
//!
//! One-shot lookups log to stderr. Watch mode owns the terminal, so it logs
//! to `wxlookup.log` in the platform data directory instead.

use directories::ProjectDirs;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "wxlookup.log";

/// Where log lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Log file used while the TUI is active, if a data directory exists
    pub fn watch_file() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "wxlookup")?;
        Some(LogTarget::File(project_dirs.data_local_dir().join(LOG_FILE)))
    }
}

/// Filter used when `RUST_LOG` is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "wxlookup=debug"
    } else {
        "wxlookup=info"
    }
}

/// Installs the global subscriber
///
/// `RUST_LOG` wins over `verbose`. Calling this twice is harmless; the
/// second call is ignored.
pub fn init(verbose: bool, target: LogTarget) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // try_init only fails when a subscriber is already installed
    match target {
        LogTarget::Stderr => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
        LogTarget::File(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
    }

    Ok(())
}
