use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::executor::Executor;
use crate::artifacts::ArtifactStore;
use crate::errors::StageError;

/// Scores at or above this are classified genuine.
pub const GENUINE_THRESHOLD: f64 = 0.80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Genuine,
    Forged,
}

impl Classification {
    pub fn message(&self) -> &'static str {
        match self {
            Classification::Genuine => "The Signature is Genuine",
            Classification::Forged => "The Signature is Forged",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerificationPolicy {
    threshold: f64,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self::new(GENUINE_THRESHOLD)
    }
}

impl VerificationPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classify(&self, score: f64) -> Classification {
        if score >= self.threshold {
            Classification::Genuine
        } else {
            Classification::Forged
        }
    }
}

/// One ranked comparator result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub path: PathBuf,
    pub score: f64,
}

/// Outcome of a verification run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub reference: PathBuf,
    pub candidate: PathBuf,
    pub score: f64,
    pub classification: Classification,
}

impl Verdict {
    /// Score as a whole percentage, the way it is shown to users.
    pub fn percent(&self) -> String {
        format!("{:.0}%", self.score * 100.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RankedItem {
    Object { path: PathBuf, score: f64 },
    Pair(PathBuf, f64),
}

/// Parse comparator stdout into candidates, in the order the tool printed them.
///
/// Blank output means the tool found nothing to compare.
pub fn parse_ranking(stdout: &str) -> Result<Vec<Candidate>, StageError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let items: Vec<RankedItem> =
        serde_json::from_str(trimmed).map_err(|e| StageError::ExecutorFailed {
            tool: "comparator".to_string(),
            reason: format!("unparseable ranking output: {}", e),
        })?;

    Ok(items
        .into_iter()
        .map(|item| match item {
            RankedItem::Object { path, score } | RankedItem::Pair(path, score) => {
                Candidate { path, score }
            }
        })
        .collect())
}

/// Sort best-first. Non-finite scores are dropped; ties keep input order.
pub fn rank_candidates(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.retain(|c| c.score.is_finite());
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates
}

pub struct VerificationAdapter {
    comparator: Arc<dyn Executor>,
    artifacts: ArtifactStore,
    policy: VerificationPolicy,
}

impl VerificationAdapter {
    pub fn new(
        comparator: Arc<dyn Executor>,
        artifacts: ArtifactStore,
        policy: VerificationPolicy,
    ) -> Self {
        Self {
            comparator,
            artifacts,
            policy,
        }
    }

    pub fn policy(&self) -> VerificationPolicy {
        self.policy
    }

    /// Compare the reference for `signature_selection` against the cleaned
    /// output directory and classify the top-ranked candidate.
    pub async fn run(&self, signature_selection: &Path) -> Result<Verdict, StageError> {
        let reference = self.artifacts.reference_signature_path(signature_selection);
        if !reference.is_file() {
            return Err(StageError::ReferenceNotFound { path: reference });
        }

        let invocation = self
            .comparator
            .invoke(&[reference.clone(), self.artifacts.clean_output().to_path_buf()])
            .await?;

        let ranked = rank_candidates(parse_ranking(&invocation.stdout)?);
        let top = ranked
            .into_iter()
            .next()
            .ok_or(StageError::EmptyVerificationResult)?;

        let classification = self.policy.classify(top.score);
        tracing::info!(
            candidate = %top.path.display(),
            score = top.score,
            ?classification,
            "verification complete"
        );

        Ok(Verdict {
            reference,
            candidate: top.path,
            score: top.score,
            classification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::Invocation;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;

    struct FakeComparator {
        stdout: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Executor for FakeComparator {
        fn name(&self) -> &str {
            "comparator"
        }

        async fn invoke(&self, _args: &[PathBuf]) -> Result<Invocation, StageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Invocation {
                exit_code: 0,
                stdout: self.stdout.to_string(),
                elapsed: Duration::ZERO,
            })
        }
    }

    fn store(root: &Path) -> ArtifactStore {
        ArtifactStore::new(
            root.join("media/documents"),
            root.join("media/UserSignaturesSquare"),
            root.join("results/gan/images"),
        )
    }

    #[test]
    fn test_threshold_boundary_is_genuine() {
        let policy = VerificationPolicy::default();
        assert_eq!(policy.classify(0.80), Classification::Genuine);
        assert_eq!(policy.classify(0.7999), Classification::Forged);
        assert_eq!(policy.classify(1.0), Classification::Genuine);
    }

    #[test]
    fn test_classification_is_monotonic() {
        let policy = VerificationPolicy::new(0.5);
        let mut seen_genuine = false;
        for i in 0..=100 {
            let genuine = policy.classify(i as f64 / 100.0) == Classification::Genuine;
            assert!(genuine || !seen_genuine, "score {} dropped back to forged", i);
            seen_genuine |= genuine;
        }
        assert!(seen_genuine);
    }

    #[test]
    fn test_parse_ranking_accepts_both_shapes() {
        let parsed =
            parse_ranking(r#"[{"path": "a_fake.png", "score": 0.4}, ["b_fake.png", 0.9]]"#)
                .unwrap();
        assert_eq!(
            parsed,
            vec![
                Candidate {
                    path: PathBuf::from("a_fake.png"),
                    score: 0.4
                },
                Candidate {
                    path: PathBuf::from("b_fake.png"),
                    score: 0.9
                },
            ]
        );
    }

    #[test]
    fn test_parse_ranking_blank_is_empty() {
        assert!(parse_ranking("  \n").unwrap().is_empty());
        assert!(parse_ranking("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_ranking_rejects_garbage() {
        let err = parse_ranking("similarity: high").unwrap_err();
        assert_eq!(err.kind(), "executor_failed");
    }

    #[test]
    fn test_rank_candidates_best_first_stable() {
        let c = |p: &str, s: f64| Candidate {
            path: PathBuf::from(p),
            score: s,
        };
        let ranked = rank_candidates(vec![c("a", 0.5), c("b", 0.9), c("c", 0.5), c("d", f64::NAN)]);
        let order: Vec<_> = ranked.iter().map(|c| c.path.to_string_lossy().into_owned()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_verdict_percent() {
        let verdict = Verdict {
            reference: PathBuf::from("r.png"),
            candidate: PathBuf::from("c.png"),
            score: 0.924,
            classification: Classification::Genuine,
        };
        assert_eq!(verdict.percent(), "92%");
    }

    #[tokio::test]
    async fn test_missing_reference_skips_comparator() {
        let dir = tempdir().unwrap();
        let comparator = Arc::new(FakeComparator {
            stdout: r#"[["x.png", 0.9]]"#,
            calls: AtomicUsize::new(0),
        });
        let adapter = VerificationAdapter::new(
            comparator.clone(),
            store(dir.path()),
            VerificationPolicy::default(),
        );

        let err = adapter.run(Path::new("alice.jpg")).await.unwrap_err();
        match err {
            StageError::ReferenceNotFound { path } => {
                assert!(path.ends_with("UserSignaturesSquare/alice.png"))
            }
            other => panic!("Expected ReferenceNotFound, got {:?}", other),
        }
        assert_eq!(comparator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_verify_classifies_top_candidate() {
        let dir = tempdir().unwrap();
        let artifacts = store(dir.path());
        fs::create_dir_all(artifacts.signature_root()).unwrap();
        fs::write(artifacts.signature_root().join("alice.png"), "ref").unwrap();

        let comparator = Arc::new(FakeComparator {
            stdout: r#"[["low_fake.png", 0.31], {"path": "doc1_fake.png", "score": 0.92}]"#,
            calls: AtomicUsize::new(0),
        });
        let adapter =
            VerificationAdapter::new(comparator, artifacts, VerificationPolicy::default());

        let verdict = adapter.run(Path::new("alice.png")).await.unwrap();
        assert_eq!(verdict.candidate, PathBuf::from("doc1_fake.png"));
        assert_eq!(verdict.classification, Classification::Genuine);
        assert_eq!(verdict.percent(), "92%");
    }

    #[tokio::test]
    async fn test_empty_ranking_is_empty_verification_result() {
        let dir = tempdir().unwrap();
        let artifacts = store(dir.path());
        fs::create_dir_all(artifacts.signature_root()).unwrap();
        fs::write(artifacts.signature_root().join("alice.png"), "ref").unwrap();

        let adapter = VerificationAdapter::new(
            Arc::new(FakeComparator {
                stdout: "[]",
                calls: AtomicUsize::new(0),
            }),
            artifacts,
            VerificationPolicy::default(),
        );
        let err = adapter.run(Path::new("alice.png")).await.unwrap_err();
        assert!(matches!(err, StageError::EmptyVerificationResult));
    }
}
