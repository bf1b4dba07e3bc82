//! `brokkr project open` - open a registered project

use anyhow::{anyhow, Result};
use brokkr_core::config::BrokkrConfig;
use brokkr_projects::{ProcessRunner, ProjectRegistry, SystemRunner};

use tracing::debug;

use crate::cli::OpenProjectArgs;
use crate::output;

pub async fn run(args: OpenProjectArgs) -> Result<()> {
    let config = BrokkrConfig::load()?;
    let registry = ProjectRegistry::open(&BrokkrConfig::registry_path()?)?;

    let def = registry
        .get(&args.name)
        .ok_or_else(|| anyhow!("no project named '{}' in the registry", args.name))?;
    let path = def.resolved_path(&config.project_dir);
    if !path.exists() {
        return Err(anyhow!(
            "project '{}' is registered but {} does not exist",
            def.name,
            path
        ));
    }

    let runner = SystemRunner;
    debug!("opening '{}' at {}", def.name, path);

    if args.browser {
        let repo = format!("{}/{}", def.author, def.name);
        runner
            .run("gh", &["browse", "--repo", &repo], Some(&path))
            .await?;
        return Ok(());
    }

    let mut launched = false;
    if let Some(ide) = &config.commands.ide {
        runner.run_shell(ide, Some(&path)).await?;
        launched = true;
    }
    if let Some(terminal) = &config.commands.terminal {
        runner.run_shell(terminal, Some(&path)).await?;
        launched = true;
    }

    if launched {
        output::success(&format!("Opened '{}' at {}", def.name, path));
    } else {
        output::info(&format!("Project '{}' lives at {}", def.name, path));
        output::info("Configure `commands.ide` or `commands.terminal` to launch tools here.");
    }

    Ok(())
}
