use std::path::PathBuf;
use std::sync::Arc;

use super::report::{EvaluationReport, Notice};
use super::state::PipelineState;
use crate::artifacts::{ArtifactStore, normalize_separators};
use crate::cleanup::CleanupCoordinator;
use crate::config::Config;
use crate::errors::{PipelineError, Selection};
use crate::session::{FieldValue, Session, SessionField, SessionHandle, SessionId, SessionStore};
use crate::stage::{
    CleaningAdapter, Classification, DetectionAdapter, StageKind, StageTools, VerificationAdapter,
};

/// The single input of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    /// Re-evaluate without changing anything
    Refresh,
    SelectSignature(PathBuf),
    UploadDocument { name: String, bytes: Vec<u8> },
    /// Use a document already stored under the document root
    SelectDocument(PathBuf),
    Confirm(StageKind),
}

/// Drives a session through the pipeline, one full re-evaluation per intent.
///
/// Nothing is memoized between passes: every confirmed stage the pass
/// reaches is executed again, and the results are rebuilt from the files the
/// tools left behind.
pub struct PipelineController {
    store: Arc<dyn SessionStore>,
    artifacts: ArtifactStore,
    detection: DetectionAdapter,
    cleaning: CleaningAdapter,
    verification: VerificationAdapter,
    cleanup: CleanupCoordinator,
}

impl PipelineController {
    /// Controller backed by the command-line tools from the configuration.
    pub fn from_config(config: &Config, store: Arc<dyn SessionStore>) -> Self {
        Self::with_tools(config, store, StageTools::from_config(config))
    }

    pub fn with_tools(config: &Config, store: Arc<dyn SessionStore>, tools: StageTools) -> Self {
        let artifacts = ArtifactStore::from_config(config);
        Self {
            detection: DetectionAdapter::new(
                tools.detector,
                tools.normalizer,
                config.detection_runs.clone(),
                config.crop_subdir.clone(),
                config.poll,
            ),
            cleaning: CleaningAdapter::new(
                tools.cleaner,
                config.clean_input.clone(),
                artifacts.clone(),
            ),
            verification: VerificationAdapter::new(
                tools.comparator,
                artifacts.clone(),
                config.verification,
            ),
            cleanup: CleanupCoordinator::from_config(config),
            artifacts,
            store,
        }
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Apply `intent` to the session, then walk the pipeline as far as the
    /// session's selections and confirmations allow.
    ///
    /// Stage failures are reported in the returned report; only session
    /// store failures surface as errors.
    pub async fn evaluate(
        &self,
        session_id: &SessionId,
        intent: UserIntent,
    ) -> Result<EvaluationReport, PipelineError> {
        let handle = self.store.get_or_create(session_id)?;
        let mut report = EvaluationReport::new(*session_id);

        if handle.snapshot()?.finished {
            if intent != UserIntent::Refresh {
                report.notice(Notice::Info(
                    "This session is complete. Start a new session to check another document."
                        .to_string(),
                ));
            }
            report.state = PipelineState::Done;
            return Ok(report);
        }

        self.apply_intent(&handle, intent, &mut report)?;
        let session = handle.snapshot()?;
        self.advance(&handle, &session, &mut report).await?;

        tracing::info!(
            session = %session_id,
            state = %report.state,
            failed = report.is_failed(),
            "evaluation pass complete"
        );
        Ok(report)
    }

    fn apply_intent(
        &self,
        handle: &SessionHandle,
        intent: UserIntent,
        report: &mut EvaluationReport,
    ) -> Result<(), PipelineError> {
        let session = handle.snapshot()?;

        match intent {
            UserIntent::Refresh => {}
            UserIntent::SelectSignature(path) => {
                handle.set(
                    SessionField::SignatureSelection,
                    FieldValue::Path(normalize_separators(&path)),
                )?;
            }
            UserIntent::UploadDocument { name, bytes } => {
                if session.signature_selection.is_none() {
                    report.notice(Notice::Prompt(Selection::Signature.prompt().to_string()));
                    return Ok(());
                }
                match self.artifacts.store_upload(&name, &bytes) {
                    Ok(path) => handle.set(SessionField::DocumentSelection, FieldValue::Path(path))?,
                    Err(e) => report.notice(Notice::Error(e.to_string())),
                }
            }
            UserIntent::SelectDocument(path) => {
                if session.signature_selection.is_none() {
                    report.notice(Notice::Prompt(Selection::Signature.prompt().to_string()));
                    return Ok(());
                }
                handle.set(
                    SessionField::DocumentSelection,
                    FieldValue::Path(normalize_separators(&path)),
                )?;
            }
            UserIntent::Confirm(stage) => {
                let ceiling = PipelineState::ceiling(&session);
                if ceiling >= PipelineState::awaiting(stage) {
                    handle.set(SessionField::confirmation(stage), FieldValue::Flag(true))?;
                } else {
                    report.notice(Notice::Prompt(format!(
                        "'{}' is not available yet. {}",
                        stage.action_label(),
                        blocked_by(ceiling)
                    )));
                }
            }
        }
        Ok(())
    }

    async fn advance(
        &self,
        handle: &SessionHandle,
        session: &Session,
        report: &mut EvaluationReport,
    ) -> Result<(), PipelineError> {
        let Some(signature) = &session.signature_selection else {
            report.state = PipelineState::SelectSignature;
            report.notice(Notice::Prompt(Selection::Signature.prompt().to_string()));
            return Ok(());
        };
        report.display(signature, "Selected Signature");

        let Some(document) = &session.document_selection else {
            report.state = PipelineState::SelectDocument;
            report.notice(Notice::Prompt(Selection::Document.prompt().to_string()));
            return Ok(());
        };
        report.display(document, "Uploaded Document");

        // Detect
        if !session.detect_confirmed {
            await_confirmation(StageKind::Detect, report);
            return Ok(());
        }
        report.state = PipelineState::Detecting;
        let detection = match self.detection.run(document).await {
            Ok(output) => output,
            Err(e) => {
                report.fail(StageKind::Detect, &e);
                return Ok(());
            }
        };
        handle.set(
            SessionField::StageOutputRoot,
            FieldValue::Path(detection.crop_dir.clone()),
        )?;
        if detection.stale {
            report.notice(Notice::Warning(format!(
                "Detection output in {} predates this run and may be stale",
                detection.run_dir.display()
            )));
        }
        if detection.crop_found {
            report.display(&detection.crop_file, "Detected Signature");
        } else {
            report.notice(Notice::Warning(format!(
                "Could not find the detected signature file: {}",
                detection.crop_file.display()
            )));
        }

        // Clean
        if !session.clean_confirmed {
            await_confirmation(StageKind::Clean, report);
            return Ok(());
        }
        report.state = PipelineState::Cleaning;
        match self.cleaning.run(document, &detection).await {
            Ok(output) => report.display(&output.cleaned_image, "Cleaned Signature"),
            Err(e) => {
                report.fail(StageKind::Clean, &e);
                return Ok(());
            }
        }

        // Verify
        if !session.verify_confirmed {
            await_confirmation(StageKind::Verify, report);
            return Ok(());
        }
        report.state = PipelineState::Verifying;
        match self.verification.run(signature).await {
            Ok(verdict) => {
                report.display(&verdict.reference, "Original Signature");
                report.display(&verdict.candidate, "Detected Signature");
                report.notice(Notice::Info(format!(
                    "Similarity Score: {}",
                    verdict.percent()
                )));
                let message = verdict.classification.message().to_string();
                report.notice(match verdict.classification {
                    Classification::Genuine => Notice::Success(message),
                    Classification::Forged => Notice::Error(message),
                });
                report.verdict = Some(verdict);
            }
            Err(e) => report.fail(StageKind::Verify, &e),
        }

        self.finish(handle, report)
    }

    /// Runs after every verification attempt, whatever its outcome.
    fn finish(
        &self,
        handle: &SessionHandle,
        report: &mut EvaluationReport,
    ) -> Result<(), PipelineError> {
        let cleanup = self.cleanup.cleanup();
        for failure in &cleanup.failures {
            report.notice(Notice::Warning(format!(
                "Could not remove {}: {}",
                failure.path.display(),
                failure.reason
            )));
        }
        report.cleanup = Some(cleanup);

        handle.set(SessionField::Finished, FieldValue::Flag(true))?;
        report.state = PipelineState::Done;
        Ok(())
    }
}

fn await_confirmation(stage: StageKind, report: &mut EvaluationReport) {
    report.state = PipelineState::awaiting(stage);
    report.notice(Notice::Prompt(format!(
        "Confirm '{}' to continue.",
        stage.action_label()
    )));
}

fn blocked_by(ceiling: PipelineState) -> String {
    match ceiling {
        PipelineState::SelectSignature => Selection::Signature.prompt().to_string(),
        PipelineState::SelectDocument => Selection::Document.prompt().to_string(),
        other => match other.awaited_stage() {
            Some(stage) => format!("Confirm '{}' first.", stage.action_label()),
            None => format!("The session is at '{}'.", other),
        },
    }
}
