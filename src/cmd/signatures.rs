//! Reference signature listing: `sigcheck signatures`.

use anyhow::Result;

use super::super::Cli;

pub fn cmd_signatures(cli: &Cli, project_dir: &std::path::Path) -> Result<()> {
    use sigcheck::artifacts::ArtifactStore;
    use sigcheck::config::Config;
    use sigcheck::ui::print_signatures;

    let config = Config::new(project_dir.to_path_buf(), cli.verbose)?;
    let artifacts = ArtifactStore::from_config(&config);
    let entries = artifacts.list_signatures()?;

    if cli.json {
        println!("{}", serde_json::to_string(&entries)?);
    } else {
        print_signatures(artifacts.signature_root(), &entries);
    }

    Ok(())
}
