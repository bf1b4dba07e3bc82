//! Publishing a created project to GitHub
//!
//! A fixed sequence of four steps, each one external process, each
//! fatal on non-zero exit and never retried. Order matters: the local
//! repository must exist before remotes can be added, and remotes must
//! exist before the push. There is no compensation for partial
//! failure: a repository already created on GitHub stays there when a
//! later step fails, and the pipeline's task path tells the user
//! exactly where things stopped.

use crate::process::ProcessRunner;
use brokkr_core::config::GitWorkflowConfig;
use brokkr_core::pipeline::{Task, TaskOutcome};
use brokkr_core::types::ProjectDefinition;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use tracing::info;

/// Builds the publish sub-pipeline
pub struct RepositoryPublisher {
    runner: Arc<dyn ProcessRunner>,
    git: GitWorkflowConfig,
}

impl RepositoryPublisher {
    pub fn new(runner: Arc<dyn ProcessRunner>, git: GitWorkflowConfig) -> Self {
        Self { runner, git }
    }

    /// The four publish steps for `def` at `path`, in execution order
    pub fn tasks(&self, def: &ProjectDefinition, path: &Utf8Path) -> Vec<Task> {
        vec![
            self.init_repository(path),
            self.create_remote_repository(def, path),
            self.link_origin(def, path),
            self.push_initial_commit(path),
        ]
    }

    fn init_repository(&self, path: &Utf8Path) -> Task {
        let runner = Arc::clone(&self.runner);
        let branch = self.git.default_branch.clone();
        let path: Utf8PathBuf = path.to_owned();
        Task::leaf("Creating local repository", move |_ctx| async move {
            runner
                .run(
                    "git",
                    &["init", path.as_str(), "--initial-branch", &branch],
                    None,
                )
                .await?;
            Ok(TaskOutcome::Done)
        })
    }

    fn create_remote_repository(&self, def: &ProjectDefinition, path: &Utf8Path) -> Task {
        let runner = Arc::clone(&self.runner);
        let upstream = self.git.upstream_remote.clone();
        let name = def.name.clone();
        let description = def.description.clone();
        let visibility = if def.private { "--private" } else { "--public" };
        let path: Utf8PathBuf = path.to_owned();
        Task::leaf("Creating repository on GitHub", move |_ctx| async move {
            runner
                .run(
                    "gh",
                    &[
                        "repo",
                        "create",
                        &name,
                        "--description",
                        &description,
                        visibility,
                        "--source",
                        path.as_str(),
                        "--remote",
                        &upstream,
                    ],
                    None,
                )
                .await?;
            info!("created GitHub repository '{}'", name);
            Ok(TaskOutcome::Done)
        })
    }

    fn link_origin(&self, def: &ProjectDefinition, path: &Utf8Path) -> Task {
        let runner = Arc::clone(&self.runner);
        let origin = self.git.origin_remote.clone();
        let url = def.origin_url();
        let path: Utf8PathBuf = path.to_owned();
        Task::leaf("Linking local repository to GitHub", move |_ctx| async move {
            runner
                .run("git", &["remote", "add", &origin, &url], Some(&path))
                .await?;
            Ok(TaskOutcome::Done)
        })
    }

    fn push_initial_commit(&self, path: &Utf8Path) -> Task {
        let runner = Arc::clone(&self.runner);
        let branch = self.git.default_branch.clone();
        let origin = self.git.origin_remote.clone();
        let message = self.git.initial_commit_message.clone();
        let path: Utf8PathBuf = path.to_owned();
        Task::leaf("Pushing first changes to GitHub", move |_ctx| async move {
            let cwd = Some(path.as_path());
            runner.run("git", &["add", "-A"], cwd).await?;
            runner
                .run("git", &["commit", "-q", "-m", &message], cwd)
                .await?;
            runner
                .run("git", &["push", "--quiet", "-u", &origin, &branch], cwd)
                .await?;
            Ok(TaskOutcome::Done)
        })
    }
}
