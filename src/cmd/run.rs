//! Interactive session driver: `sigcheck run`.
//!
//! One session per invocation. Every user action becomes one `UserIntent`
//! and one full evaluation pass; the report of each pass is rendered before
//! the next action is collected.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::super::Cli;

pub fn check_run_prerequisites(project_dir: &Path) -> Result<()> {
    use sigcheck::init::is_initialized;

    if !is_initialized(project_dir) {
        anyhow::bail!("Project not initialized. Run 'sigcheck init' first.");
    }
    Ok(())
}

pub async fn cmd_run(
    cli: &Cli,
    project_dir: PathBuf,
    signature: Option<&str>,
    document: Option<&Path>,
    yes: bool,
) -> Result<()> {
    use sigcheck::config::Config;
    use sigcheck::gates::{GateDecision, IntentGate, upload_intent};
    use sigcheck::pipeline::{DisplaySink, EvaluationReport, PipelineController, UserIntent};
    use sigcheck::session::{InMemorySessionStore, SessionId, SessionStore};
    use sigcheck::settings::SigcheckToml;
    use sigcheck::ui::{PassSpinner, TerminalSink};

    check_run_prerequisites(&project_dir)?;

    let config = Config::new(project_dir, cli.verbose)?;
    config.ensure_directories()?;
    for warning in SigcheckToml::load_or_default(&config.sigcheck_dir)?.validate() {
        tracing::warn!("sigcheck.toml: {}", warning);
    }

    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let controller = PipelineController::from_config(&config, store);
    let sink = TerminalSink::new(cli.json);
    let mut gate = IntentGate::new(controller.artifacts().clone(), yes);

    let session_id = SessionId::new();
    tracing::info!(session = %session_id, "starting session");

    // Selections given on the command line are applied before prompting.
    let mut pending = VecDeque::new();
    if let Some(name) = signature {
        let path = controller.artifacts().resolve_signature(name).with_context(|| {
            format!(
                "Signature '{}' not found in {}",
                name,
                controller.artifacts().signature_root().display()
            )
        })?;
        pending.push_back(UserIntent::SelectSignature(path));
    }
    if let Some(path) = document {
        pending.push_back(upload_intent(path)?);
    }

    let mut last: Option<EvaluationReport> = None;
    loop {
        let intent = match (pending.pop_front(), &last) {
            (Some(intent), _) => intent,
            (None, None) => UserIntent::Refresh,
            (None, Some(report)) => match gate.next(report)? {
                GateDecision::Intent(intent) => intent,
                GateDecision::Quit => break,
            },
        };

        // Verbose logs share stderr with the spinner.
        let spinner = PassSpinner::start(&pass_label(&intent), !cli.json && !config.verbose);
        let report = controller.evaluate(&session_id, intent).await?;
        match &report.failure {
            Some(failure) => spinner.fail(&format!("{} failed", failure.stage)),
            None => spinner.finish(),
        }

        sink.render(&report);
        last = Some(report);
    }

    if yes
        && let Some(report) = &last
        && let Some(failure) = &report.failure
    {
        anyhow::bail!("{} stage failed: {}", failure.stage, failure.message);
    }

    Ok(())
}

fn pass_label(intent: &sigcheck::pipeline::UserIntent) -> String {
    use sigcheck::pipeline::UserIntent;

    match intent {
        UserIntent::Confirm(stage) => format!("Running {}...", stage),
        UserIntent::UploadDocument { name, .. } => format!("Uploading {}...", name),
        _ => "Evaluating...".to_string(),
    }
}
