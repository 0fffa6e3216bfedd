//! Invocation of the external stage tools.
//!
//! Tools are plain processes: `program args.. <stage paths..>`, run to
//! completion in the project directory. A non-zero exit (or a failure to
//! spawn) is an `ExecutorFailed`; nothing is retried and no timeout is
//! applied, so a hung tool hangs the evaluation pass.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::config::Config;
use crate::errors::StageError;
use crate::settings::ToolSettings;

/// Outcome of a successful tool run.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub exit_code: i32,
    pub stdout: String,
    pub elapsed: Duration,
}

/// An opaque stage executor.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Run the tool with the given path arguments and wait for it to exit.
    async fn invoke(&self, args: &[PathBuf]) -> Result<Invocation, StageError>;
}

/// Executor backed by an external command.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    name: String,
    settings: ToolSettings,
    working_dir: PathBuf,
}

impl CommandExecutor {
    pub fn new(name: &str, settings: ToolSettings, working_dir: impl AsRef<Path>) -> Self {
        Self {
            name: name.to_string(),
            settings,
            working_dir: working_dir.as_ref().to_path_buf(),
        }
    }

    /// The command line as it will be run, for logs.
    pub fn display_command(&self, args: &[PathBuf]) -> String {
        let mut parts = vec![self.settings.program.clone()];
        parts.extend(self.settings.args.iter().cloned());
        parts.extend(args.iter().map(|a| a.display().to_string()));
        parts.join(" ")
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, args: &[PathBuf]) -> Result<Invocation, StageError> {
        tracing::info!(tool = %self.name, command = %self.display_command(args), "invoking stage tool");
        let start = Instant::now();

        let output = Command::new(&self.settings.program)
            .args(&self.settings.args)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| StageError::ExecutorFailed {
                tool: self.name.clone(),
                reason: format!("failed to spawn '{}': {}", self.settings.program, e),
            })?;

        let elapsed = start.elapsed();
        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);

        tracing::info!(
            tool = %self.name,
            exit_code,
            elapsed_ms = elapsed.as_millis() as u64,
            "stage tool finished"
        );

        if !output.status.success() {
            let detail = stderr.trim();
            let reason = if detail.is_empty() {
                format!("exited with code {}", exit_code)
            } else {
                format!("exited with code {}: {}", exit_code, detail)
            };
            return Err(StageError::ExecutorFailed {
                tool: self.name.clone(),
                reason,
            });
        }

        if !stderr.trim().is_empty() {
            tracing::debug!(tool = %self.name, stderr = %stderr.trim(), "stage tool stderr");
        }

        Ok(Invocation {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            elapsed,
        })
    }
}

/// The executors the pipeline drives.
#[derive(Clone)]
pub struct StageTools {
    pub detector: Arc<dyn Executor>,
    /// Optional resize pass over the detection crop directory
    pub normalizer: Option<Arc<dyn Executor>>,
    pub cleaner: Arc<dyn Executor>,
    pub comparator: Arc<dyn Executor>,
}

impl StageTools {
    /// Command-backed tools as configured in `sigcheck.toml`.
    pub fn from_config(config: &Config) -> Self {
        let tool = |name: &str, settings: &ToolSettings| -> Arc<dyn Executor> {
            Arc::new(CommandExecutor::new(
                name,
                settings.clone(),
                &config.project_dir,
            ))
        };

        Self {
            detector: tool("detector", &config.tools.detector),
            normalizer: config
                .tools
                .active_normalizer()
                .map(|settings| tool("normalizer", settings)),
            cleaner: tool("cleaner", &config.tools.cleaner),
            comparator: tool("comparator", &config.tools.comparator),
        }
    }
}
