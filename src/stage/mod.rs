//! Stage executor adapters.
//!
//! Each stage wraps an opaque external tool that communicates only through
//! the filesystem. The adapters own every path-discovery heuristic
//! (latest-run scan, bounded polling, deterministic output names) and hand
//! the controller a typed result instead of a directory listing.
//!
//! | Stage | Tool input | Discovered output |
//! |-------|-----------|-------------------|
//! | Detect | uploaded document | newest run dir + crop file |
//! | Clean | staged copy of the crop dir | `<stem>_fake.png` |
//! | Verify | reference + cleaned dir | top-ranked candidate + verdict |

pub mod clean;
pub mod detect;
pub mod discovery;
pub mod executor;
pub mod staging;
pub mod verify;

pub use clean::{CleaningAdapter, CleaningOutput};
pub use detect::{DetectionAdapter, DetectionOutput};
pub use discovery::{PollPolicy, RunDirectory, latest_run_directory, poll_for_file};
pub use executor::{CommandExecutor, Executor, Invocation, StageTools};
pub use staging::replace_dir_with_copy;
pub use verify::{
    Candidate, Classification, GENUINE_THRESHOLD, Verdict, VerificationAdapter,
    VerificationPolicy, parse_ranking, rank_candidates,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three gated processing stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Detect,
    Clean,
    Verify,
}

impl StageKind {
    pub const ALL: [StageKind; 3] = [StageKind::Detect, StageKind::Clean, StageKind::Verify];

    /// Label of the user action that confirms this stage.
    pub fn action_label(&self) -> &'static str {
        match self {
            StageKind::Detect => "Detect Signature",
            StageKind::Clean => "Clean Signature",
            StageKind::Verify => "Verify Signature",
        }
    }

    pub fn next(&self) -> Option<StageKind> {
        match self {
            StageKind::Detect => Some(StageKind::Clean),
            StageKind::Clean => Some(StageKind::Verify),
            StageKind::Verify => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Detect => write!(f, "detection"),
            StageKind::Clean => write!(f, "cleaning"),
            StageKind::Verify => write!(f, "verification"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        assert_eq!(
            StageKind::ALL,
            [StageKind::Detect, StageKind::Clean, StageKind::Verify]
        );
        assert_eq!(StageKind::Detect.next(), Some(StageKind::Clean));
        assert_eq!(StageKind::Verify.next(), None);
    }

    #[test]
    fn test_stage_display_and_labels() {
        assert_eq!(StageKind::Clean.to_string(), "cleaning");
        assert_eq!(StageKind::Verify.action_label(), "Verify Signature");
    }
}
