//! Removal of the transient artifact roots once a session completes.

use serde::Serialize;
use std::io;
use std::path::PathBuf;

use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// What a cleanup pass did with each root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    /// Roots that were already gone
    pub absent: Vec<PathBuf>,
    pub failures: Vec<CleanupFailure>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CleanupCoordinator {
    roots: Vec<PathBuf>,
}

impl CleanupCoordinator {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Coordinator for the configured results, document and stage roots.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.transient_roots())
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Recursively delete every root. Idempotent: missing roots are recorded
    /// as absent, and a root that fails to delete does not stop the rest.
    pub fn cleanup(&self) -> CleanupReport {
        let mut report = CleanupReport::default();

        for root in &self.roots {
            match std::fs::remove_dir_all(root) {
                Ok(()) => {
                    tracing::info!(path = %root.display(), "removed transient root");
                    report.removed.push(root.clone());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    report.absent.push(root.clone());
                }
                Err(e) => {
                    tracing::warn!(path = %root.display(), error = %e, "cleanup failed");
                    report.failures.push(CleanupFailure {
                        path: root.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SigcheckToml;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cleanup_removes_roots_recursively() {
        let dir = tempdir().unwrap();
        let results = dir.path().join("results");
        let documents = dir.path().join("media/documents");
        fs::create_dir_all(results.join("yolov5/exp/crops")).unwrap();
        fs::create_dir_all(&documents).unwrap();
        fs::write(documents.join("doc1.png"), "doc").unwrap();

        let report = CleanupCoordinator::new(vec![results.clone(), documents.clone()]).cleanup();

        assert_eq!(report.removed, vec![results.clone(), documents.clone()]);
        assert!(report.is_clean());
        assert!(!results.exists());
        assert!(!documents.exists());
        assert!(dir.path().join("media").exists());
    }

    #[test]
    fn test_cleanup_removes_detection_runs_outside_results() {
        let dir = tempdir().unwrap();
        let mut settings = SigcheckToml::default();
        settings.paths.detection_runs = "runs".to_string();
        let config = Config::from_settings(dir.path().to_path_buf(), &settings, false);
        let crops = config.detection_runs.join("exp").join(&config.crop_subdir);
        fs::create_dir_all(&crops).unwrap();
        fs::write(crops.join("doc1.jpg"), "crop").unwrap();

        let report = CleanupCoordinator::from_config(&config).cleanup();

        assert_eq!(report.removed, vec![config.detection_runs.clone()]);
        assert!(!config.detection_runs.exists());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let dir = tempdir().unwrap();
        let results = dir.path().join("results");
        fs::create_dir_all(&results).unwrap();
        let coordinator = CleanupCoordinator::new(vec![results.clone()]);

        coordinator.cleanup();
        let second = coordinator.cleanup();
        assert!(second.removed.is_empty());
        assert_eq!(second.absent, vec![results]);
        assert!(second.is_clean());
    }

    #[test]
    fn test_cleanup_continues_past_failures() {
        let dir = tempdir().unwrap();
        let not_a_dir = dir.path().join("results");
        fs::write(&not_a_dir, "file, not a directory").unwrap();
        let documents = dir.path().join("documents");
        fs::create_dir_all(&documents).unwrap();

        let report = CleanupCoordinator::new(vec![not_a_dir.clone(), documents.clone()]).cleanup();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, not_a_dir);
        assert_eq!(report.removed, vec![documents]);
        assert!(!report.is_clean());
    }
}
