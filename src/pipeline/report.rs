use serde::Serialize;
use std::path::PathBuf;

use super::state::PipelineState;
use crate::cleanup::CleanupReport;
use crate::errors::StageError;
use crate::session::SessionId;
use crate::stage::{StageKind, Verdict};

/// An image the display sink should show, with its caption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayItem {
    pub path: PathBuf,
    pub caption: String,
}

/// A user-visible message produced during an evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum Notice {
    /// Input the user still has to provide; not an error
    Prompt(String),
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Prompt(m)
            | Notice::Info(m)
            | Notice::Success(m)
            | Notice::Warning(m)
            | Notice::Error(m) => m,
        }
    }
}

/// A stage failure as it is reported to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageFailure {
    pub stage: StageKind,
    pub kind: &'static str,
    pub message: String,
}

/// Everything one evaluation pass produced, in display order.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub session_id: SessionId,
    pub state: PipelineState,
    pub displays: Vec<DisplayItem>,
    pub notices: Vec<Notice>,
    pub verdict: Option<Verdict>,
    pub cleanup: Option<CleanupReport>,
    pub failure: Option<StageFailure>,
}

impl EvaluationReport {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            state: PipelineState::SelectSignature,
            displays: Vec::new(),
            notices: Vec::new(),
            verdict: None,
            cleanup: None,
            failure: None,
        }
    }

    pub fn display(&mut self, path: impl Into<PathBuf>, caption: &str) {
        self.displays.push(DisplayItem {
            path: path.into(),
            caption: caption.to_string(),
        });
    }

    pub fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Record a stage failure as an error notice.
    pub fn fail(&mut self, stage: StageKind, error: &StageError) {
        tracing::warn!(%stage, kind = error.kind(), error = %error, "stage failed");
        self.notices.push(Notice::Error(error.to_string()));
        self.failure = Some(StageFailure {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn captions(&self) -> Vec<&str> {
        self.displays.iter().map(|d| d.caption.as_str()).collect()
    }
}

/// Receives the outcome of each evaluation pass.
pub trait DisplaySink {
    fn render(&self, report: &EvaluationReport);
}
