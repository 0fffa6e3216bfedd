use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::discovery::{PollPolicy, latest_run_directory, poll_for_file};
use super::executor::Executor;
use super::StageKind;
use crate::artifacts::{normalize_separators, selection_stem};
use crate::errors::StageError;

/// Slack for filesystems with coarse modification times.
const MTIME_TOLERANCE: Duration = Duration::from_secs(2);

/// What the detection stage produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionOutput {
    /// Run directory the detector created
    pub run_dir: PathBuf,
    /// Crop directory handed to the cleaning stage
    pub crop_dir: PathBuf,
    /// Expected crop of the uploaded document
    pub crop_file: PathBuf,
    /// Whether `crop_file` appeared within the poll budget
    pub crop_found: bool,
    /// The newest run directory predates this invocation
    pub stale: bool,
}

pub struct DetectionAdapter {
    detector: Arc<dyn Executor>,
    normalizer: Option<Arc<dyn Executor>>,
    runs_root: PathBuf,
    crop_subdir: PathBuf,
    poll: PollPolicy,
}

impl DetectionAdapter {
    pub fn new(
        detector: Arc<dyn Executor>,
        normalizer: Option<Arc<dyn Executor>>,
        runs_root: PathBuf,
        crop_subdir: PathBuf,
        poll: PollPolicy,
    ) -> Self {
        Self {
            detector,
            normalizer,
            runs_root,
            crop_subdir,
            poll,
        }
    }

    /// Run the detector on `document` and discover its output.
    ///
    /// A missing run directory is fatal. A crop file that never shows up is
    /// not: the crop directory still counts as this stage's output.
    pub async fn run(&self, document: &Path) -> Result<DetectionOutput, StageError> {
        let started = SystemTime::now();
        self.detector.invoke(&[document.to_path_buf()]).await?;

        let run = latest_run_directory(&self.runs_root)?.ok_or_else(|| {
            StageError::ExecutorOutputMissing {
                stage: StageKind::Detect,
                path: self.runs_root.clone(),
            }
        })?;

        let stale = run.modified + MTIME_TOLERANCE < started;
        if stale {
            tracing::warn!(
                run_dir = %run.path.display(),
                "newest detection run predates this invocation"
            );
        }

        let crop_dir = normalize_separators(&run.path.join(&self.crop_subdir));
        if let Some(normalizer) = &self.normalizer {
            normalizer.invoke(&[crop_dir.clone()]).await?;
        }

        let crop_file = normalize_separators(
            &crop_dir.join(format!("{}.jpg", selection_stem(document))),
        );
        let crop_found = poll_for_file(&crop_file, self.poll).await;
        if !crop_found {
            tracing::warn!(
                crop_file = %crop_file.display(),
                waited_ms = self.poll.max_wait().as_millis() as u64,
                "detected signature file never appeared"
            );
        }

        Ok(DetectionOutput {
            run_dir: run.path,
            crop_dir,
            crop_file,
            crop_found,
            stale,
        })
    }
}
