use anyhow::{Context, Result};
use dialoguer::{Input, Select, theme::ColorfulTheme};
use std::path::Path;

use crate::artifacts::ArtifactStore;
use crate::errors::{PipelineError, Selection};
use crate::pipeline::{EvaluationReport, PipelineState, UserIntent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Intent(UserIntent),
    Quit,
}

/// Turns the outcome of one evaluation pass into the user's next action.
pub struct IntentGate {
    artifacts: ArtifactStore,
    /// Confirm every stage without asking (--yes)
    pub auto_confirm: bool,
}

impl IntentGate {
    pub fn new(artifacts: ArtifactStore, auto_confirm: bool) -> Self {
        Self {
            artifacts,
            auto_confirm,
        }
    }

    pub fn next(&mut self, report: &EvaluationReport) -> Result<GateDecision> {
        if report.state.is_terminal() {
            return Ok(GateDecision::Quit);
        }

        if self.auto_confirm {
            return auto_decision(report);
        }

        self.prompt_user(report)
    }

    fn prompt_user(&mut self, report: &EvaluationReport) -> Result<GateDecision> {
        let theme = ColorfulTheme::default();

        if report.is_failed() {
            let choice = Select::with_theme(&theme)
                .with_prompt("The stage failed. What next?")
                .items(&["Retry", "Quit"])
                .default(0)
                .interact()?;
            return Ok(match choice {
                0 => GateDecision::Intent(UserIntent::Refresh),
                _ => GateDecision::Quit,
            });
        }

        match report.state {
            PipelineState::SelectSignature => self.prompt_signature(&theme),
            PipelineState::SelectDocument => {
                let choice = Select::with_theme(&theme)
                    .with_prompt("Upload a Document")
                    .items(&["Upload a document", "Change signature", "Quit"])
                    .default(0)
                    .interact()?;
                match choice {
                    0 => prompt_document(&theme),
                    1 => self.prompt_signature(&theme),
                    _ => Ok(GateDecision::Quit),
                }
            }
            state => {
                let Some(stage) = state.awaited_stage() else {
                    return Ok(GateDecision::Quit);
                };
                let choice = Select::with_theme(&theme)
                    .with_prompt("Proceed?")
                    .items(&[
                        stage.action_label(),
                        "Change signature",
                        "Upload a different document",
                        "Quit",
                    ])
                    .default(0)
                    .interact()?;
                match choice {
                    0 => Ok(GateDecision::Intent(UserIntent::Confirm(stage))),
                    1 => self.prompt_signature(&theme),
                    2 => prompt_document(&theme),
                    _ => Ok(GateDecision::Quit),
                }
            }
        }
    }

    fn prompt_signature(&self, theme: &ColorfulTheme) -> Result<GateDecision> {
        let signatures = self.artifacts.list_signatures()?;
        if signatures.is_empty() {
            anyhow::bail!(
                "No signatures available in {}",
                self.artifacts.signature_root().display()
            );
        }

        let mut items: Vec<&str> = signatures.iter().map(|s| s.name.as_str()).collect();
        items.push("Quit");
        let choice = Select::with_theme(theme)
            .with_prompt("Select a signature file")
            .items(&items[..])
            .default(0)
            .interact()?;

        Ok(match signatures.get(choice) {
            Some(entry) => GateDecision::Intent(UserIntent::SelectSignature(entry.path.clone())),
            None => GateDecision::Quit,
        })
    }
}

/// Non-interactive policy: confirm whatever stage is awaited, stop on failure.
fn auto_decision(report: &EvaluationReport) -> Result<GateDecision> {
    if report.is_failed() {
        return Ok(GateDecision::Quit);
    }

    match report.state {
        PipelineState::SelectSignature => {
            Err(PipelineError::SelectionMissing(Selection::Signature).into())
        }
        PipelineState::SelectDocument => {
            Err(PipelineError::SelectionMissing(Selection::Document).into())
        }
        state => match state.awaited_stage() {
            Some(stage) => {
                tracing::info!(%stage, "auto-confirmed (--yes)");
                Ok(GateDecision::Intent(UserIntent::Confirm(stage)))
            }
            None => Ok(GateDecision::Quit),
        },
    }
}

fn prompt_document(theme: &ColorfulTheme) -> Result<GateDecision> {
    let path: String = Input::with_theme(theme)
        .with_prompt("Path to the document image (png, jpg, jpeg)")
        .interact_text()?;
    Ok(GateDecision::Intent(upload_intent(Path::new(path.trim()))?))
}

/// Read a local file into an upload intent.
pub fn upload_intent(path: &Path) -> Result<UserIntent> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {}", path.display()))?;
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    Ok(UserIntent::UploadDocument { name, bytes })
}
