//! Project initialization command.

use anyhow::Result;

pub fn cmd_init(project_dir: &std::path::Path) -> Result<()> {
    use sigcheck::init::{init_project, is_initialized};

    let was_initialized = is_initialized(project_dir);

    let result = init_project(project_dir)?;

    if result.created {
        println!(
            "Initialized sigcheck project at {}",
            result.sigcheck_dir.display()
        );
        println!();
        println!("Created directory structure:");
        println!("  .sigcheck/");
        println!("  ├── sigcheck.toml   # Paths, tool commands, thresholds");
        println!("  └── logs/           # Daily log files");
        println!("  media/");
        println!("  ├── documents/              # Uploaded documents");
        println!("  └── UserSignaturesSquare/   # Reference signatures");
        println!();
        println!("Next steps:");
        println!("  1. Add reference signatures (<name>.png) to the signature root");
        println!("  2. Point [tools] in sigcheck.toml at your detector, cleaner and comparator");
        println!("  3. Run `sigcheck run` to check a document");
    } else if was_initialized {
        println!(
            "Sigcheck project already initialized at {}",
            result.sigcheck_dir.display()
        );
        if result.wrote_settings {
            println!("Restored missing sigcheck.toml with defaults.");
        }
        println!("Directory structure verified.");
    }

    Ok(())
}
