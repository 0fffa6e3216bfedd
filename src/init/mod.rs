//! Initialization module for sigcheck projects.
//!
//! `sigcheck init` lays out a project like this:
//!
//! ```text
//! .sigcheck/
//! ├── sigcheck.toml    # Paths, tool command lines, thresholds
//! └── logs/            # Daily log files
//! media/
//! ├── documents/       # Uploaded documents (removed after each verification)
//! └── UserSignaturesSquare/   # Reference signatures
//! ```
//!
//! The artifact roots follow whatever `sigcheck.toml` configures.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{Config, SIGCHECK_DIR};
use crate::settings::{SETTINGS_FILE, SigcheckToml};

/// Result of initializing a sigcheck project.
#[derive(Debug)]
pub struct InitResult {
    /// Path to the .sigcheck directory
    pub sigcheck_dir: PathBuf,
    /// Whether the directory was newly created (false if it already existed)
    pub created: bool,
    /// Whether a default sigcheck.toml was written
    pub wrote_settings: bool,
}

/// Initialize a sigcheck project in the given directory.
///
/// Safe to run repeatedly: existing settings are kept and only missing
/// directories are created.
pub fn init_project(project_dir: &Path) -> Result<InitResult> {
    let sigcheck_dir = project_dir.join(SIGCHECK_DIR);
    let created = !sigcheck_dir.exists();

    std::fs::create_dir_all(&sigcheck_dir)
        .with_context(|| format!("Failed to create directory: {}", sigcheck_dir.display()))?;

    let settings_path = sigcheck_dir.join(SETTINGS_FILE);
    let wrote_settings = !settings_path.exists();
    if wrote_settings {
        SigcheckToml::default().save(&settings_path)?;
    }

    let settings = SigcheckToml::load(&settings_path)?;
    Config::from_settings(project_dir.to_path_buf(), &settings, false).ensure_directories()?;

    tracing::info!(dir = %sigcheck_dir.display(), created, "initialized project");
    Ok(InitResult {
        sigcheck_dir,
        created,
        wrote_settings,
    })
}

/// Check if a project is already initialized with sigcheck.
pub fn is_initialized(project_dir: &Path) -> bool {
    project_dir.join(SIGCHECK_DIR).exists()
}
