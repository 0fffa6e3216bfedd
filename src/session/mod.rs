//! Per-session state that survives every re-evaluation of the pipeline.
//!
//! A `Session` is a typed record with explicitly defaulted fields. Callers
//! address individual fields through `SessionField` and read them back as a
//! `FieldValue`, where an unset path reads as `FieldValue::Absent` rather
//! than an error.

pub mod store;

pub use store::{InMemorySessionStore, SessionHandle, SessionStore};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::SessionError;
use crate::stage::StageKind;

/// Identity of one user session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Named keys of the session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    SignatureSelection,
    DocumentSelection,
    StageOutputRoot,
    DetectConfirmed,
    CleanConfirmed,
    VerifyConfirmed,
    Finished,
}

impl SessionField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionField::SignatureSelection => "signature_selection",
            SessionField::DocumentSelection => "document_selection",
            SessionField::StageOutputRoot => "stage_output_root",
            SessionField::DetectConfirmed => "detect_confirmed",
            SessionField::CleanConfirmed => "clean_confirmed",
            SessionField::VerifyConfirmed => "verify_confirmed",
            SessionField::Finished => "finished",
        }
    }

    /// The confirmation flag gating a stage.
    pub fn confirmation(stage: StageKind) -> Self {
        match stage {
            StageKind::Detect => SessionField::DetectConfirmed,
            StageKind::Clean => SessionField::CleanConfirmed,
            StageKind::Verify => SessionField::VerifyConfirmed,
        }
    }

    fn is_flag(&self) -> bool {
        matches!(
            self,
            SessionField::DetectConfirmed
                | SessionField::CleanConfirmed
                | SessionField::VerifyConfirmed
                | SessionField::Finished
        )
    }
}

impl fmt::Display for SessionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value read from or written to a session field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Path field that has not been set
    Absent,
    Path(PathBuf),
    Flag(bool),
}

impl FieldValue {
    pub fn as_path(&self) -> Option<&PathBuf> {
        match self {
            FieldValue::Path(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, FieldValue::Flag(true))
    }
}

/// Progress of one user session through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub signature_selection: Option<PathBuf>,
    pub document_selection: Option<PathBuf>,
    pub stage_output_root: Option<PathBuf>,
    pub detect_confirmed: bool,
    pub clean_confirmed: bool,
    pub verify_confirmed: bool,
    /// Set once verification ran and cleanup removed the staging roots
    pub finished: bool,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            signature_selection: None,
            document_selection: None,
            stage_output_root: None,
            detect_confirmed: false,
            clean_confirmed: false,
            verify_confirmed: false,
            finished: false,
        }
    }

    pub fn get(&self, field: SessionField) -> FieldValue {
        let path = |p: &Option<PathBuf>| match p {
            Some(p) => FieldValue::Path(p.clone()),
            None => FieldValue::Absent,
        };
        match field {
            SessionField::SignatureSelection => path(&self.signature_selection),
            SessionField::DocumentSelection => path(&self.document_selection),
            SessionField::StageOutputRoot => path(&self.stage_output_root),
            SessionField::DetectConfirmed => FieldValue::Flag(self.detect_confirmed),
            SessionField::CleanConfirmed => FieldValue::Flag(self.clean_confirmed),
            SessionField::VerifyConfirmed => FieldValue::Flag(self.verify_confirmed),
            SessionField::Finished => FieldValue::Flag(self.finished),
        }
    }

    /// Write a field. Flags are monotonic: once true, writing false is a no-op.
    pub fn set(&mut self, field: SessionField, value: FieldValue) -> Result<(), SessionError> {
        if field.is_flag() {
            let FieldValue::Flag(flag) = value else {
                return Err(SessionError::FieldType {
                    field: field.as_str(),
                    expected: "flag",
                });
            };
            let slot = match field {
                SessionField::DetectConfirmed => &mut self.detect_confirmed,
                SessionField::CleanConfirmed => &mut self.clean_confirmed,
                SessionField::VerifyConfirmed => &mut self.verify_confirmed,
                _ => &mut self.finished,
            };
            if *slot && !flag {
                tracing::debug!(session = %self.id, field = %field, "ignoring attempt to clear a monotonic flag");
            }
            *slot |= flag;
            return Ok(());
        }

        let path = match value {
            FieldValue::Path(p) if p.as_os_str().is_empty() => None,
            FieldValue::Path(p) => Some(p),
            FieldValue::Absent => None,
            FieldValue::Flag(_) => {
                return Err(SessionError::FieldType {
                    field: field.as_str(),
                    expected: "path",
                });
            }
        };
        match field {
            SessionField::SignatureSelection => self.signature_selection = path,
            SessionField::DocumentSelection => self.document_selection = path,
            _ => self.stage_output_root = path,
        }
        Ok(())
    }

    pub fn is_confirmed(&self, stage: StageKind) -> bool {
        self.get(SessionField::confirmation(stage)).as_flag()
    }
}
