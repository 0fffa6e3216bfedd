use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::StageKind;
use super::detect::DetectionOutput;
use super::executor::Executor;
use super::staging::replace_dir_with_copy;
use crate::artifacts::ArtifactStore;
use crate::errors::StageError;

/// What the cleaning stage produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningOutput {
    /// Number of crop files staged into the cleaner's input directory
    pub staged_files: usize,
    pub cleaned_image: PathBuf,
}

pub struct CleaningAdapter {
    cleaner: Arc<dyn Executor>,
    clean_input: PathBuf,
    artifacts: ArtifactStore,
}

impl CleaningAdapter {
    pub fn new(cleaner: Arc<dyn Executor>, clean_input: PathBuf, artifacts: ArtifactStore) -> Self {
        Self {
            cleaner,
            clean_input,
            artifacts,
        }
    }

    /// Stage the detection crops, run the cleaner, and locate
    /// `<clean_output>/<stem>_fake.png` for `document`.
    ///
    /// The cleaner's input directory is shared by every session in the
    /// project; concurrent cleans of different documents can overwrite each
    /// other's staged crops.
    pub async fn run(
        &self,
        document: &Path,
        detection: &DetectionOutput,
    ) -> Result<CleaningOutput, StageError> {
        let staged_files = replace_dir_with_copy(&detection.crop_dir, &self.clean_input)?;
        if staged_files == 0 {
            tracing::warn!(crop_dir = %detection.crop_dir.display(), "no crops to clean");
        }

        self.cleaner.invoke(&[self.clean_input.clone()]).await?;

        let cleaned_image = self.artifacts.cleaned_output_path(document);
        if !cleaned_image.is_file() {
            return Err(StageError::ExecutorOutputMissing {
                stage: StageKind::Clean,
                path: cleaned_image,
            });
        }

        Ok(CleaningOutput {
            staged_files,
            cleaned_image,
        })
    }
}
