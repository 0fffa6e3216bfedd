//! On-demand cleanup: `sigcheck clean`.

use anyhow::Result;

use super::super::Cli;

pub fn cmd_clean(cli: &Cli, project_dir: &std::path::Path) -> Result<()> {
    use sigcheck::cleanup::CleanupCoordinator;
    use sigcheck::config::Config;
    use sigcheck::ui::print_cleanup;

    let config = Config::new(project_dir.to_path_buf(), cli.verbose)?;
    let report = CleanupCoordinator::from_config(&config).cleanup();

    if cli.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print_cleanup(&report);
    }

    Ok(())
}
