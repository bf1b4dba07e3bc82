//! `brokkr project new` - create a project from a template

use anyhow::{anyhow, Context, Result};
use brokkr_core::config::BrokkrConfig;
use brokkr_core::pipeline::PipelineObserver;
use brokkr_core::types::{ProjectDefinition, TemplateReference};
use brokkr_projects::{ProjectCreator, ProjectRegistry};
use dialoguer::{Confirm, Input};
use std::sync::Arc;
use tracing::debug;

use crate::cli::NewProjectArgs;
use crate::observer::TerminalObserver;
use crate::output;

pub async fn run(args: NewProjectArgs) -> Result<()> {
    let config = BrokkrConfig::load()?;
    let mut registry = ProjectRegistry::open(&BrokkrConfig::registry_path()?)?;

    if registry.get(&args.name).is_some() {
        return Err(anyhow!("a project named '{}' already exists", args.name));
    }

    let mut def = resolve_definition(args)?;
    let path = def.resolved_path(&config.project_dir);
    debug!("resolved project path to {}", path);
    if path.exists() {
        return Err(anyhow!("target directory {} already exists", path));
    }

    output::header("Create New Project");
    output::kv("Name", &def.name);
    output::kv("Template", &def.template.id);
    output::kv("Repository", &def.origin_url());
    output::kv("Location", path.as_str());
    println!();

    let creator = ProjectCreator::new(&config)?
        .with_observer(Arc::new(TerminalObserver::new()) as Arc<dyn PipelineObserver>);

    match creator.create(&def, &path).await {
        Ok(_) => {
            def.path = Some(path.clone());
            registry.add(def.clone())?;

            println!();
            output::success(&format!("Project '{}' is ready", def.name));
            output::kv("Local", path.as_str());
            output::kv("Remote", &def.origin_url());
            output::info(&format!("Run `brokkr project open {}` to start", def.name));
            Ok(())
        }
        Err(err) => {
            println!();
            output::error(&format!("Failed at: {}", err.task_path));
            Err(err.into())
        }
    }
}

/// Merge CLI arguments with interactive prompts into a full definition
fn resolve_definition(args: NewProjectArgs) -> Result<ProjectDefinition> {
    let description = match args.description {
        Some(description) => description,
        None if args.interactive => Input::new()
            .with_prompt("Description")
            .allow_empty(true)
            .interact_text()?,
        None => String::new(),
    };

    let author = match args.author {
        Some(author) => author,
        None if args.interactive => Input::new().with_prompt("GitHub account").interact_text()?,
        None => std::env::var("USER").context(
            "no author given; pass --author, set BROKKR_AUTHOR, or use --interactive",
        )?,
    };

    let private = if args.private {
        true
    } else if args.interactive {
        Confirm::new()
            .with_prompt("Private repository?")
            .default(false)
            .interact()?
    } else {
        false
    };

    Ok(ProjectDefinition {
        name: args.name,
        description,
        author,
        private,
        template: TemplateReference::new(args.template),
        path: args.path,
        created_at: None,
    })
}
