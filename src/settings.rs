//! File-backed configuration for sigcheck.
//!
//! Settings are read from `.sigcheck/sigcheck.toml`. Every field has a
//! default, so a missing file (or a partial one) yields a working setup
//! that matches the directory layout the external tools expect.
//!
//! # Configuration File Format
//!
//! ```toml
//! [paths]
//! document_root = "media/documents"
//! signature_root = "media/UserSignaturesSquare"
//! results_root = "results"
//! detection_runs = "results/yolov5"
//! crop_subdir = "crops/DLSignature"
//! clean_input = "results/gan/gan_signdata_kaggle/gan_ips/testB"
//! clean_output = "results/gan/gan_signdata_kaggle/test_latest/images"
//!
//! [tools]
//! normalize = true
//!
//! [tools.detector]
//! program = "python"
//! args = ["yolo_files/detect.py", "--source"]
//!
//! [tools.normalizer]
//! program = "python"
//! args = ["helper_fns/gan_utils.py", "--resize"]
//!
//! [tools.cleaner]
//! program = "python"
//! args = ["gan_files/test.py", "--dataroot"]
//!
//! [tools.comparator]
//! program = "python"
//! args = ["vgg_finetuned_model/vgg_verify.py"]
//!
//! [discovery]
//! poll_attempts = 5
//! poll_interval_ms = 1000
//!
//! [verification]
//! genuine_threshold = 0.80
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::artifacts::normalize_separators;
use crate::stage::GENUINE_THRESHOLD;

/// Name of the settings file inside the `.sigcheck` directory.
pub const SETTINGS_FILE: &str = "sigcheck.toml";

/// Artifact and staging directory layout, relative to the project directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsSection {
    /// Where uploaded documents are written
    #[serde(default = "default_document_root")]
    pub document_root: String,
    /// Reference signatures offered for selection
    #[serde(default = "default_signature_root")]
    pub signature_root: String,
    /// Stage output root, removed by cleanup
    #[serde(default = "default_results_root")]
    pub results_root: String,
    /// Directory in which the detector creates timestamped run directories
    #[serde(default = "default_detection_runs")]
    pub detection_runs: String,
    /// Crop directory inside a detection run
    #[serde(default = "default_crop_subdir")]
    pub crop_subdir: String,
    /// Cleaner input directory (shared, overwritten per run)
    #[serde(default = "default_clean_input")]
    pub clean_input: String,
    /// Cleaner output directory
    #[serde(default = "default_clean_output")]
    pub clean_output: String,
}

fn default_document_root() -> String {
    "media/documents".to_string()
}

fn default_signature_root() -> String {
    "media/UserSignaturesSquare".to_string()
}

fn default_results_root() -> String {
    "results".to_string()
}

fn default_detection_runs() -> String {
    "results/yolov5".to_string()
}

fn default_crop_subdir() -> String {
    "crops/DLSignature".to_string()
}

fn default_clean_input() -> String {
    "results/gan/gan_signdata_kaggle/gan_ips/testB".to_string()
}

fn default_clean_output() -> String {
    "results/gan/gan_signdata_kaggle/test_latest/images".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            document_root: default_document_root(),
            signature_root: default_signature_root(),
            results_root: default_results_root(),
            detection_runs: default_detection_runs(),
            crop_subdir: default_crop_subdir(),
            clean_input: default_clean_input(),
            clean_output: default_clean_output(),
        }
    }
}

/// Command line for one external tool. Stage path arguments are appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolSettings {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Program to run, with fallback to an environment override.
    fn resolved(&self, env_var: &str) -> Self {
        let program = std::env::var(env_var).unwrap_or_else(|_| self.program.clone());
        Self {
            program,
            args: self.args.clone(),
        }
    }
}

/// External stage executors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsSection {
    /// Run the normalizer over the detection crop directory
    #[serde(default = "default_normalize")]
    pub normalize: bool,
    #[serde(default = "default_detector")]
    pub detector: ToolSettings,
    /// Resize step run over the detection crop directory
    #[serde(default = "default_normalizer")]
    pub normalizer: ToolSettings,
    #[serde(default = "default_cleaner")]
    pub cleaner: ToolSettings,
    #[serde(default = "default_comparator")]
    pub comparator: ToolSettings,
}

fn default_detector() -> ToolSettings {
    ToolSettings::new("python", &["yolo_files/detect.py", "--source"])
}

fn default_normalize() -> bool {
    true
}

fn default_normalizer() -> ToolSettings {
    ToolSettings::new("python", &["helper_fns/gan_utils.py", "--resize"])
}

fn default_cleaner() -> ToolSettings {
    ToolSettings::new("python", &["gan_files/test.py", "--dataroot"])
}

fn default_comparator() -> ToolSettings {
    ToolSettings::new("python", &["vgg_finetuned_model/vgg_verify.py"])
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            normalize: default_normalize(),
            detector: default_detector(),
            normalizer: default_normalizer(),
            cleaner: default_cleaner(),
            comparator: default_comparator(),
        }
    }
}

impl ToolsSection {
    /// The normalizer, unless `normalize = false` turned it off.
    pub fn active_normalizer(&self) -> Option<&ToolSettings> {
        self.normalize.then_some(&self.normalizer)
    }

    /// Apply `SIGCHECK_*_CMD` environment overrides.
    pub fn resolved(&self) -> Self {
        Self {
            normalize: self.normalize,
            detector: self.detector.resolved("SIGCHECK_DETECTOR_CMD"),
            normalizer: self.normalizer.resolved("SIGCHECK_NORMALIZER_CMD"),
            cleaner: self.cleaner.resolved("SIGCHECK_CLEANER_CMD"),
            comparator: self.comparator.resolved("SIGCHECK_COMPARATOR_CMD"),
        }
    }
}

/// Bounded polling for the detection crop file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySection {
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_attempts() -> u32 {
    5
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            poll_attempts: default_poll_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationSection {
    /// Minimum top score classified as genuine
    #[serde(default = "default_genuine_threshold")]
    pub genuine_threshold: f64,
}

fn default_genuine_threshold() -> f64 {
    GENUINE_THRESHOLD
}

impl Default for VerificationSection {
    fn default() -> Self {
        Self {
            genuine_threshold: default_genuine_threshold(),
        }
    }
}

/// Root of `sigcheck.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SigcheckToml {
    #[serde(default)]
    pub paths: PathsSection,
    #[serde(default)]
    pub tools: ToolsSection,
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub verification: VerificationSection,
}

impl SigcheckToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse sigcheck.toml")
    }

    /// Load `sigcheck.toml` from the given `.sigcheck` directory.
    /// Returns default configuration if the file doesn't exist.
    pub fn load_or_default(sigcheck_dir: &Path) -> Result<Self> {
        let config_path = sigcheck_dir.join(SETTINGS_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize sigcheck.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let threshold = self.verification.genuine_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            warnings.push(format!(
                "genuine_threshold {} is outside [0, 1]; every signature will classify the same way",
                threshold
            ));
        }

        if self.discovery.poll_attempts == 0 {
            warnings.push(
                "poll_attempts = 0: the detection crop file is checked once without waiting"
                    .to_string(),
            );
        }

        let results = normalize_separators(Path::new(&self.paths.results_root));
        let staged = [
            ("detection_runs", &self.paths.detection_runs),
            ("clean_input", &self.paths.clean_input),
            ("clean_output", &self.paths.clean_output),
        ];
        for (name, value) in staged {
            if !normalize_separators(Path::new(value)).starts_with(&results) {
                warnings.push(format!(
                    "paths.{} = \"{}\" is outside paths.results_root; cleanup removes it separately",
                    name, value
                ));
            }
        }

        let tools = [
            ("detector", Some(&self.tools.detector)),
            ("normalizer", self.tools.active_normalizer()),
            ("cleaner", Some(&self.tools.cleaner)),
            ("comparator", Some(&self.tools.comparator)),
        ];
        for (name, tool) in tools {
            if let Some(tool) = tool
                && tool.program.trim().is_empty()
            {
                warnings.push(format!("tools.{} has an empty program", name));
            }
        }

        warnings
    }
}
