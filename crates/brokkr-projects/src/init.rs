//! Template-supplied project initialization
//!
//! After extraction, a template gets one shot at arbitrary setup work
//! (installing dependencies, generating files, fetching extra assets).
//! The extension point is the [`TemplateInitializer`] trait; the
//! shipping implementation reads a declarative manifest at
//! `.brokkr/init.yaml` inside the extracted tree and turns its steps
//! into a nested task tree, so template-defined setup is reported with
//! the same hierarchical progress UI as the built-in stages.
//!
//! Initialization logic never touches the host process directly: it
//! works through the [`Capabilities`] bundle, a fixed whitelist of
//! host operations (HTTP client, shell execution, archive utilities).

use crate::archive::extract_subtree;
use crate::error::{Error, Result};
use crate::fetch::ArchiveFetcher;
use crate::process::ProcessRunner;
use anyhow::anyhow;
use async_trait::async_trait;
use brokkr_core::pipeline::{ProgressSink, Task, TaskOutcome};
use brokkr_core::progress::ProgressTracker;
use brokkr_core::types::ProjectDefinition;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Directory inside an extracted template holding brokkr metadata
pub const MANIFEST_DIR: &str = ".brokkr";

/// Initialization manifest file name
pub const MANIFEST_FILE: &str = "init.yaml";

/// Constrained set of host capabilities handed to template
/// initialization logic. Constructed once per initializer invocation
/// and not retained afterward.
///
/// Pipeline construction is part of the capability surface too:
/// initializers build nested pipelines by returning `Vec<Task>` from
/// [`TemplateInitializer::initialize`], which the engine executes as
/// children of the init stage.
#[derive(Clone)]
pub struct Capabilities {
    /// HTTP client for template-driven fetches
    pub http: reqwest::Client,

    /// Shell/process execution
    pub runner: Arc<dyn ProcessRunner>,

    /// Download-and-extract helper for auxiliary archives
    pub archive: ArchiveTools,
}

impl Capabilities {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Result<Self> {
        let fetcher = ArchiveFetcher::new()?;
        Ok(Self::from_parts(fetcher.client().clone(), runner))
    }

    pub fn from_parts(http: reqwest::Client, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            archive: ArchiveTools {
                client: http.clone(),
            },
            http,
            runner,
        }
    }
}

/// Archive utilities exposed to template logic
#[derive(Clone)]
pub struct ArchiveTools {
    client: reqwest::Client,
}

impl ArchiveTools {
    /// Download a zip archive and extract one subtree of it into `dest`
    pub async fn fetch_subtree(
        &self,
        url: &str,
        subtree: &str,
        dest: &Utf8Path,
        sink: &ProgressSink,
    ) -> Result<()> {
        let fetcher = ArchiveFetcher::with_client(self.client.clone());
        let tracker = ProgressTracker::new("downloading");
        let buffer = fetcher.download(url, tracker, sink).await?;
        std::fs::create_dir_all(dest)?;
        extract_subtree(subtree, buffer, dest)
    }
}

/// Polymorphic initializer capability: resolves and runs the
/// template's setup logic, optionally returning a further task tree
/// that the pipeline executes as a nested stage.
#[async_trait]
pub trait TemplateInitializer: Send + Sync {
    async fn initialize(
        &self,
        def: &ProjectDefinition,
        path: &Utf8Path,
        caps: &Capabilities,
    ) -> Result<Option<Vec<Task>>>;
}

/// Declarative initialization manifest
#[derive(Debug, Deserialize)]
struct InitManifest {
    #[serde(default)]
    steps: Vec<InitStep>,
}

#[derive(Debug, Deserialize)]
struct InitStep {
    #[serde(default)]
    title: Option<String>,
    #[serde(flatten)]
    action: InitAction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum InitAction {
    /// Shell command executed in the project directory
    Run(String),
    /// Fetch a zip archive and extract a subtree into the project
    Fetch(FetchAction),
    /// Write a file relative to the project directory
    Write(WriteAction),
}

#[derive(Debug, Deserialize)]
struct FetchAction {
    url: String,
    subtree: String,
    #[serde(default)]
    dest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WriteAction {
    path: String,
    contents: String,
}

/// [`TemplateInitializer`] reading `.brokkr/init.yaml` from the
/// extracted template.
///
/// Manifest strings are rendered with tera against the project
/// definition before parsing, so templates can interpolate `{{ name }}`,
/// `{{ description }}`, `{{ author }}` and `{{ private }}`.
pub struct ManifestInitializer;

#[async_trait]
impl TemplateInitializer for ManifestInitializer {
    async fn initialize(
        &self,
        def: &ProjectDefinition,
        path: &Utf8Path,
        caps: &Capabilities,
    ) -> Result<Option<Vec<Task>>> {
        let template = def.template.id.clone();
        let manifest_path = path.join(MANIFEST_DIR).join(MANIFEST_FILE);

        let raw = std::fs::read_to_string(&manifest_path).map_err(|source| {
            Error::template_init(
                template.as_str(),
                anyhow!("missing init manifest at {manifest_path}: {source}"),
            )
        })?;

        let context = tera::Context::from_serialize(def)
            .map_err(|source| Error::template_init(template.as_str(), source))?;
        let rendered = tera::Tera::one_off(&raw, &context, false)
            .map_err(|source| Error::template_init(template.as_str(), source))?;

        let manifest: InitManifest = serde_yaml_ng::from_str(&rendered)
            .map_err(|source| Error::template_init(template.as_str(), source))?;

        debug!(
            "template '{}' declares {} init step(s)",
            template,
            manifest.steps.len()
        );

        if manifest.steps.is_empty() {
            return Ok(None);
        }

        let tasks = manifest
            .steps
            .into_iter()
            .map(|step| step_task(step, &template, path, caps))
            .collect();
        Ok(Some(tasks))
    }
}

/// Turn one manifest step into a leaf task. Step failures surface as
/// `Error::TemplateInit` so the pipeline reports which template broke.
fn step_task(step: InitStep, template: &str, path: &Utf8Path, caps: &Capabilities) -> Task {
    let template = template.to_string();
    let project_path: Utf8PathBuf = path.to_owned();

    match step.action {
        InitAction::Run(command) => {
            let title = step
                .title
                .unwrap_or_else(|| format!("Running `{command}`"));
            let runner = Arc::clone(&caps.runner);
            Task::leaf(title, move |_ctx| async move {
                runner
                    .run_shell(&command, Some(&project_path))
                    .await
                    .map_err(|source| Error::template_init(template.as_str(), source))?;
                Ok(TaskOutcome::Done)
            })
        }
        InitAction::Fetch(fetch) => {
            let title = step
                .title
                .unwrap_or_else(|| format!("Fetching {}", fetch.url));
            let archive = caps.archive.clone();
            Task::leaf(title, move |ctx| async move {
                let dest = match fetch.dest.as_deref() {
                    Some(dest) => project_path.join(dest),
                    None => project_path.clone(),
                };
                archive
                    .fetch_subtree(&fetch.url, &fetch.subtree, &dest, &ctx.sink())
                    .await
                    .map_err(|source| Error::template_init(template.as_str(), source))?;
                Ok(TaskOutcome::Done)
            })
        }
        InitAction::Write(write) => {
            let title = step
                .title
                .unwrap_or_else(|| format!("Writing {}", write.path));
            Task::leaf(title, move |_ctx| async move {
                let target = project_path.join(&write.path);
                let result: Result<()> = async {
                    if let Some(parent) = target.parent() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                    tokio::fs::write(&target, write.contents.as_bytes()).await?;
                    Ok(())
                }
                .await;
                result.map_err(|source| Error::template_init(template.as_str(), source))?;
                Ok(TaskOutcome::Done)
            })
        }
    }
}
