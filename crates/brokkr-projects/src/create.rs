//! Project creation pipeline
//!
//! [`ProjectCreator`] wires the individual pieces into the three-stage
//! pipeline: download and extract the template, run its initialization,
//! publish the result to GitHub. Stages run strictly in order and the
//! first failure aborts the run.

use crate::fetch::ArchiveFetcher;
use crate::init::{Capabilities, ManifestInitializer, TemplateInitializer};
use crate::process::{ProcessRunner, SystemRunner};
use crate::publish::RepositoryPublisher;
use crate::{archive, error::Result};
use brokkr_core::config::BrokkrConfig;
use brokkr_core::pipeline::{
    NullObserver, Pipeline, PipelineError, PipelineObserver, Task, TaskOutcome, TaskReport,
};
use brokkr_core::progress::ProgressTracker;
use brokkr_core::types::ProjectDefinition;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

/// The downloaded archive buffer, handed from the download leaf to the
/// extraction leaf. Exactly one of the two holds it at a time.
type ArchiveSlot = Arc<Mutex<Option<Vec<u8>>>>;

/// Assembles and runs the project creation pipeline
pub struct ProjectCreator {
    archive_url: String,
    fetcher: ArchiveFetcher,
    runner: Arc<dyn ProcessRunner>,
    initializer: Arc<dyn TemplateInitializer>,
    publisher: RepositoryPublisher,
    observer: Arc<dyn PipelineObserver>,
}

impl ProjectCreator {
    pub fn new(config: &BrokkrConfig) -> Result<Self> {
        let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);
        Ok(Self {
            archive_url: config.archive_url.clone(),
            fetcher: ArchiveFetcher::new()?,
            runner: Arc::clone(&runner),
            initializer: Arc::new(ManifestInitializer),
            publisher: RepositoryPublisher::new(runner, config.git.clone()),
            observer: Arc::new(NullObserver),
        })
    }

    /// Substitute the process runner (also rebuilds the publisher)
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>, config: &BrokkrConfig) -> Self {
        self.publisher = RepositoryPublisher::new(Arc::clone(&runner), config.git.clone());
        self.runner = runner;
        self
    }

    pub fn with_initializer(mut self, initializer: Arc<dyn TemplateInitializer>) -> Self {
        self.initializer = initializer;
        self
    }

    pub fn with_fetcher(mut self, fetcher: ArchiveFetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run the full creation pipeline for `def` at `path`
    pub async fn create(
        &self,
        def: &ProjectDefinition,
        path: &Utf8Path,
    ) -> std::result::Result<TaskReport, PipelineError> {
        info!("creating project '{}' at {}", def.name, path);
        let pipeline = self
            .pipeline(def, path)
            .with_observer(Arc::clone(&self.observer));
        pipeline.run().await
    }

    /// The three-stage task tree for `def` at `path`
    pub fn pipeline(&self, def: &ProjectDefinition, path: &Utf8Path) -> Pipeline {
        let slot: ArchiveSlot = Arc::new(Mutex::new(None));

        Pipeline::new(vec![
            Task::group(
                "Downloading the template",
                vec![
                    self.download_task(path, Arc::clone(&slot)),
                    self.extract_task(def, path, slot),
                ],
            ),
            self.init_task(def, path),
            Task::group(
                "Publishing the project",
                self.publisher.tasks(def, path),
            ),
        ])
    }

    fn download_task(&self, path: &Utf8Path, slot: ArchiveSlot) -> Task {
        let fetcher = self.fetcher.clone();
        let url = self.archive_url.clone();
        let path: Utf8PathBuf = path.to_owned();
        Task::leaf("Downloading template archive", move |ctx| async move {
            std::fs::create_dir_all(&path)?;
            let tracker = ProgressTracker::new("downloading");
            let buffer = fetcher.download(&url, tracker, &ctx.sink()).await?;
            *slot.lock().unwrap() = Some(buffer);
            Ok(TaskOutcome::Done)
        })
    }

    fn extract_task(&self, def: &ProjectDefinition, path: &Utf8Path, slot: ArchiveSlot) -> Task {
        let subtree = def.template.subtree();
        let path: Utf8PathBuf = path.to_owned();
        Task::leaf(
            "Extracting the template from the archive",
            move |_ctx| async move {
                let buffer = slot
                    .lock()
                    .unwrap()
                    .take()
                    .ok_or_else(|| anyhow::anyhow!("archive buffer already consumed"))?;
                archive::extract_subtree(&subtree, buffer, &path)?;
                Ok(TaskOutcome::Done)
            },
        )
    }

    fn init_task(&self, def: &ProjectDefinition, path: &Utf8Path) -> Task {
        let initializer = Arc::clone(&self.initializer);
        let caps = Capabilities::from_parts(self.fetcher.client().clone(), Arc::clone(&self.runner));
        let def = def.clone();
        let path: Utf8PathBuf = path.to_owned();
        Task::leaf("Initializing the project", move |_ctx| async move {
            match initializer.initialize(&def, &path, &caps).await? {
                Some(tasks) => Ok(TaskOutcome::Nested(tasks)),
                None => Ok(TaskOutcome::Done),
            }
        })
    }
}
