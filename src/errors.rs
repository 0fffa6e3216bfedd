//! Typed error hierarchy for the sigcheck pipeline.
//!
//! Four enums cover the subsystems:
//! - `StageError` — external stage invocation, discovery and staging failures
//! - `SessionError` — session state store failures
//! - `ArtifactError` — upload intake and artifact store failures
//! - `PipelineError` — controller-level conditions, wraps the others

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::stage::StageKind;

/// Errors produced by a stage adapter during one evaluation pass.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("Reference signature not found at {path}")]
    ReferenceNotFound { path: PathBuf },

    #[error("{stage} output missing: expected {path}")]
    ExecutorOutputMissing { stage: StageKind, path: PathBuf },

    #[error("{tool} failed: {reason}")]
    ExecutorFailed { tool: String, reason: String },

    #[error("Comparator returned no candidates, verification not possible")]
    EmptyVerificationResult,

    #[error("Failed to stage {from} into {to}: {source}")]
    StagingFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to scan {path} for stage output: {reason}")]
    DiscoveryFailed { path: PathBuf, reason: String },
}

impl StageError {
    /// Short machine-friendly name of the variant, used in reports and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StageError::ReferenceNotFound { .. } => "reference_not_found",
            StageError::ExecutorOutputMissing { .. } => "executor_output_missing",
            StageError::ExecutorFailed { .. } => "executor_failed",
            StageError::EmptyVerificationResult => "empty_verification_result",
            StageError::StagingFailed { .. } => "staging_failed",
            StageError::DiscoveryFailed { .. } => "discovery_failed",
        }
    }
}

/// Errors from the session state store.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store lock poisoned")]
    LockPoisoned,

    #[error("Field {field} expects a {expected} value")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Errors from upload intake and the artifact store.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Unsupported upload type for '{name}': expected png, jpg or jpeg")]
    UnsupportedType { name: String },

    #[error("Invalid file name '{name}'")]
    InvalidFileName { name: String },

    #[error("Artifact I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which selection the user still has to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Signature,
    Document,
}

impl Selection {
    /// Prompt shown while this selection is missing.
    pub fn prompt(&self) -> &'static str {
        match self {
            Selection::Signature => "Please select a valid signature to proceed.",
            Selection::Document => "Please upload a document to proceed.",
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Signature => write!(f, "reference signature"),
            Selection::Document => write!(f, "document"),
        }
    }
}

/// Controller-level errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No {0} selected")]
    SelectionMissing(Selection),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}
