use serde::Serialize;
use std::fmt;

use crate::session::Session;
use crate::stage::StageKind;

/// Where a session stands in the pipeline, in strict order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    SelectSignature,
    SelectDocument,
    AwaitDetectConfirm,
    Detecting,
    AwaitCleanConfirm,
    Cleaning,
    AwaitVerifyConfirm,
    Verifying,
    Done,
}

impl PipelineState {
    /// Furthest state an evaluation pass over `session` may reach.
    ///
    /// A stage state is only reachable when both selections are present and
    /// every earlier stage is confirmed, whatever order the flags were set in.
    pub fn ceiling(session: &Session) -> PipelineState {
        if session.finished {
            return PipelineState::Done;
        }
        if session.signature_selection.is_none() {
            return PipelineState::SelectSignature;
        }
        if session.document_selection.is_none() {
            return PipelineState::SelectDocument;
        }

        let mut ceiling = PipelineState::AwaitDetectConfirm;
        for stage in StageKind::ALL {
            if !session.is_confirmed(stage) {
                return ceiling;
            }
            ceiling = match stage.next() {
                Some(next) => PipelineState::awaiting(next),
                None => PipelineState::running(stage),
            };
        }
        ceiling
    }

    pub fn awaiting(stage: StageKind) -> PipelineState {
        match stage {
            StageKind::Detect => PipelineState::AwaitDetectConfirm,
            StageKind::Clean => PipelineState::AwaitCleanConfirm,
            StageKind::Verify => PipelineState::AwaitVerifyConfirm,
        }
    }

    pub fn running(stage: StageKind) -> PipelineState {
        match stage {
            StageKind::Detect => PipelineState::Detecting,
            StageKind::Clean => PipelineState::Cleaning,
            StageKind::Verify => PipelineState::Verifying,
        }
    }

    /// Stage whose confirmation this state waits for.
    pub fn awaited_stage(&self) -> Option<StageKind> {
        match self {
            PipelineState::AwaitDetectConfirm => Some(StageKind::Detect),
            PipelineState::AwaitCleanConfirm => Some(StageKind::Clean),
            PipelineState::AwaitVerifyConfirm => Some(StageKind::Verify),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == PipelineState::Done
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::SelectSignature => "select signature",
            PipelineState::SelectDocument => "select document",
            PipelineState::AwaitDetectConfirm => "awaiting detect confirmation",
            PipelineState::Detecting => "detecting",
            PipelineState::AwaitCleanConfirm => "awaiting clean confirmation",
            PipelineState::Cleaning => "cleaning",
            PipelineState::AwaitVerifyConfirm => "awaiting verify confirmation",
            PipelineState::Verifying => "verifying",
            PipelineState::Done => "done",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionId;
    use std::path::PathBuf;

    fn selected() -> Session {
        let mut session = Session::new(SessionId::new());
        session.signature_selection = Some(PathBuf::from("refs/alice.png"));
        session.document_selection = Some(PathBuf::from("media/documents/doc1.png"));
        session
    }

    #[test]
    fn test_ceiling_without_selections() {
        let mut session = Session::new(SessionId::new());
        assert_eq!(PipelineState::ceiling(&session), PipelineState::SelectSignature);

        session.signature_selection = Some(PathBuf::from("refs/alice.png"));
        assert_eq!(PipelineState::ceiling(&session), PipelineState::SelectDocument);
    }

    #[test]
    fn test_ceiling_follows_confirmations() {
        let mut session = selected();
        assert_eq!(PipelineState::ceiling(&session), PipelineState::AwaitDetectConfirm);

        session.detect_confirmed = true;
        assert_eq!(PipelineState::ceiling(&session), PipelineState::AwaitCleanConfirm);

        session.clean_confirmed = true;
        assert_eq!(PipelineState::ceiling(&session), PipelineState::AwaitVerifyConfirm);

        session.verify_confirmed = true;
        assert_eq!(PipelineState::ceiling(&session), PipelineState::Verifying);

        session.finished = true;
        assert_eq!(PipelineState::ceiling(&session), PipelineState::Done);
    }

    #[test]
    fn test_never_detecting_without_both_selections() {
        for (sig, doc) in [(false, false), (true, false), (false, true)] {
            let mut session = Session::new(SessionId::new());
            session.detect_confirmed = true;
            session.clean_confirmed = true;
            session.verify_confirmed = true;
            if sig {
                session.signature_selection = Some(PathBuf::from("a.png"));
            }
            if doc {
                session.document_selection = Some(PathBuf::from("d.png"));
            }
            assert!(PipelineState::ceiling(&session) < PipelineState::Detecting);
        }
    }

    #[test]
    fn test_out_of_order_flag_does_not_skip_a_stage() {
        let mut session = selected();
        session.clean_confirmed = true;
        assert_eq!(PipelineState::ceiling(&session), PipelineState::AwaitDetectConfirm);
    }

    #[test]
    fn test_state_order_and_stage_mapping() {
        assert!(PipelineState::SelectSignature < PipelineState::Done);
        for stage in StageKind::ALL {
            let awaiting = PipelineState::awaiting(stage);
            let running = PipelineState::running(stage);
            assert!(awaiting < running);
            assert_eq!(awaiting.awaited_stage(), Some(stage));
        }
    }
}
