//! Configuration view and validation commands: `sigcheck config`.

use anyhow::Result;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use sigcheck::config::{Config, SIGCHECK_DIR};
    use sigcheck::settings::{SETTINGS_FILE, SigcheckToml, ToolSettings};

    let sigcheck_dir = project_dir.join(SIGCHECK_DIR);
    let config_path = sigcheck_dir.join(SETTINGS_FILE);

    let print_tool = |name: &str, tool: &ToolSettings| {
        println!("  {} = \"{} {}\"", name, tool.program, tool.args.join(" "));
    };

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Sigcheck Configuration");
            println!("======================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                SigcheckToml::load(&config_path)?
            } else {
                println!("No sigcheck.toml found at {}", config_path.display());
                println!("Using default configuration.");
                SigcheckToml::default()
            };
            println!();

            println!("[paths]");
            println!("  document_root = \"{}\"", toml.paths.document_root);
            println!("  signature_root = \"{}\"", toml.paths.signature_root);
            println!("  results_root = \"{}\"", toml.paths.results_root);
            println!("  detection_runs = \"{}\"", toml.paths.detection_runs);
            println!("  crop_subdir = \"{}\"", toml.paths.crop_subdir);
            println!("  clean_input = \"{}\"", toml.paths.clean_input);
            println!("  clean_output = \"{}\"", toml.paths.clean_output);
            println!();

            println!("[discovery]");
            println!("  poll_attempts = {}", toml.discovery.poll_attempts);
            println!("  poll_interval_ms = {}", toml.discovery.poll_interval_ms);
            println!();

            println!("[verification]");
            println!(
                "  genuine_threshold = {}",
                toml.verification.genuine_threshold
            );
            println!();

            // Effective values include SIGCHECK_*_CMD overrides
            println!("Effective tools (with env overrides):");
            let config = Config::from_settings(project_dir.to_path_buf(), &toml, false);
            print_tool("detector", &config.tools.detector);
            if let Some(normalizer) = config.tools.active_normalizer() {
                print_tool("normalizer", normalizer);
            }
            print_tool("cleaner", &config.tools.cleaner);
            print_tool("comparator", &config.tools.comparator);
            println!();

            if !config_path.exists() {
                println!("Run 'sigcheck config init' to create a sigcheck.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No sigcheck.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = SigcheckToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("sigcheck.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !sigcheck_dir.exists() {
                std::fs::create_dir_all(&sigcheck_dir)?;
            }

            SigcheckToml::default().save(&config_path)?;

            println!("Created sigcheck.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [paths] artifact and staging directories");
            println!("  - [tools.detector], [tools.cleaner], [tools.comparator] command lines");
            println!("  - [discovery] and [verification] timing and threshold");
            println!();
        }
    }

    Ok(())
}
