use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::artifacts::normalize_separators;
use crate::settings::{SigcheckToml, ToolsSection};
use crate::stage::{PollPolicy, VerificationPolicy};

/// Name of the sigcheck working directory inside a project.
pub const SIGCHECK_DIR: &str = ".sigcheck";

/// Runtime configuration for sigcheck.
///
/// Bridges `SigcheckToml` with what the pipeline needs at run time: every
/// configured directory resolved against the project directory, tool
/// command lines with environment overrides applied, and the discovery and
/// verification policies.
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub sigcheck_dir: PathBuf,
    pub log_dir: PathBuf,
    pub document_root: PathBuf,
    pub signature_root: PathBuf,
    pub results_root: PathBuf,
    pub detection_runs: PathBuf,
    /// Relative to a detection run directory
    pub crop_subdir: PathBuf,
    pub clean_input: PathBuf,
    pub clean_output: PathBuf,
    pub tools: ToolsSection,
    pub poll: PollPolicy,
    pub verification: VerificationPolicy,
    pub verbose: bool,
}

impl Config {
    /// Load configuration for `project_dir`, reading `.sigcheck/sigcheck.toml`
    /// when present.
    pub fn new(project_dir: PathBuf, verbose: bool) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let settings = SigcheckToml::load_or_default(&project_dir.join(SIGCHECK_DIR))?;
        Ok(Self::from_settings(project_dir, &settings, verbose))
    }

    /// Build a configuration from already-loaded settings.
    pub fn from_settings(project_dir: PathBuf, settings: &SigcheckToml, verbose: bool) -> Self {
        let sigcheck_dir = project_dir.join(SIGCHECK_DIR);
        let log_dir = sigcheck_dir.join("logs");
        let paths = &settings.paths;

        Self {
            document_root: resolve(&project_dir, &paths.document_root),
            signature_root: resolve(&project_dir, &paths.signature_root),
            results_root: resolve(&project_dir, &paths.results_root),
            detection_runs: resolve(&project_dir, &paths.detection_runs),
            crop_subdir: normalize_separators(Path::new(&paths.crop_subdir)),
            clean_input: resolve(&project_dir, &paths.clean_input),
            clean_output: resolve(&project_dir, &paths.clean_output),
            tools: settings.tools.resolved(),
            poll: PollPolicy {
                attempts: settings.discovery.poll_attempts,
                interval: Duration::from_millis(settings.discovery.poll_interval_ms),
            },
            verification: VerificationPolicy::new(settings.verification.genuine_threshold),
            verbose,
            project_dir,
            sigcheck_dir,
            log_dir,
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.log_dir).context("Failed to create log directory")?;
        std::fs::create_dir_all(&self.signature_root)
            .context("Failed to create signature directory")?;
        std::fs::create_dir_all(&self.document_root)
            .context("Failed to create document directory")?;
        Ok(())
    }

    /// Roots removed by the cleanup coordinator once a session completes.
    ///
    /// Stage directories configured outside `results_root` are added as
    /// roots of their own. A stage directory that would take the project or
    /// the reference signatures with it is never added.
    pub fn transient_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![self.results_root.clone(), self.document_root.clone()];
        for staged in [&self.detection_runs, &self.clean_input, &self.clean_output] {
            if roots.iter().any(|root| staged.starts_with(root)) {
                continue;
            }
            if self.project_dir.starts_with(staged) || self.signature_root.starts_with(staged) {
                tracing::warn!(
                    path = %staged.display(),
                    "stage directory contains the project or signature root; not cleaning it up"
                );
                continue;
            }
            roots.push(staged.clone());
        }
        roots
    }
}

fn resolve(project_dir: &Path, configured: &str) -> PathBuf {
    let path = normalize_separators(Path::new(configured));
    if path.is_absolute() {
        path
    } else {
        normalize_separators(&project_dir.join(path))
    }
}
