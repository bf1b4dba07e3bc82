//! `brokkr project list` - list registered projects

use anyhow::Result;
use brokkr_core::config::BrokkrConfig;
use brokkr_projects::ProjectRegistry;
use console::style;

use crate::cli::ListProjectArgs;
use crate::output;

pub fn run(args: ListProjectArgs) -> Result<()> {
    let registry = ProjectRegistry::open(&BrokkrConfig::registry_path()?)?;
    let projects = registry.projects();

    if args.json {
        println!("{}", serde_json::to_string_pretty(projects)?);
        return Ok(());
    }

    if projects.is_empty() {
        output::info("No projects yet. Create one with `brokkr project new <name>`.");
        return Ok(());
    }

    output::header("Projects");
    for def in projects {
        let created = def
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "  {} {} {}",
            style(&def.name).bold(),
            style(format!("[{}]", def.template.id)).dim(),
            style(created).dim()
        );
        if !def.description.is_empty() {
            println!("    {}", def.description);
        }
    }

    Ok(())
}
