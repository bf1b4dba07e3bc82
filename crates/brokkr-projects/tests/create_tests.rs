//! End-to-end tests for the project creation pipeline, with the
//! template archive served by a local mock HTTP server and git/gh
//! invocations recorded instead of executed.

use async_trait::async_trait;
use brokkr_core::config::BrokkrConfig;
use brokkr_core::pipeline::{Task, TaskStatus};
use brokkr_core::types::{ProjectDefinition, TemplateReference};
use brokkr_projects::{
    Capabilities, Error, ManifestInitializer, ProcessRunner, ProjectCreator, TemplateInitializer,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::FileOptions;
use zip::ZipWriter;

/// Records every process invocation and always succeeds
struct RecordingRunner {
    calls: Mutex<Vec<String>>,
}

impl RecordingRunner {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        _cwd: Option<&Utf8Path>,
    ) -> brokkr_projects::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", program, args.join(" ")));
        Ok(())
    }
}

/// Fails `gh` invocations, succeeds on everything else
struct GhFailsRunner {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl ProcessRunner for GhFailsRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        _cwd: Option<&Utf8Path>,
    ) -> brokkr_projects::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", program, args.join(" ")));
        if program == "gh" {
            return Err(Error::Process {
                command: program.to_string(),
                exit_code: 1,
                stderr: "GraphQL: Name already exists on this account".to_string(),
            });
        }
        Ok(())
    }
}

/// Initializer that contributes no nested tasks
struct NoopInitializer;

#[async_trait]
impl TemplateInitializer for NoopInitializer {
    async fn initialize(
        &self,
        _def: &ProjectDefinition,
        _path: &Utf8Path,
        _caps: &Capabilities,
    ) -> brokkr_projects::Result<Option<Vec<Task>>> {
        Ok(None)
    }
}

fn template_archive(manifest: Option<&str>) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();

    writer.start_file("templates/basic/README.md", options).unwrap();
    writer.write_all(b"# basic template\n").unwrap();
    writer
        .start_file("templates/basic/src/main.txt", options)
        .unwrap();
    writer.write_all(b"hello\n").unwrap();
    writer.start_file("templates/other/file.txt", options).unwrap();
    writer.write_all(b"not this one\n").unwrap();

    if let Some(manifest) = manifest {
        writer
            .start_file("templates/basic/.brokkr/init.yaml", options)
            .unwrap();
        writer.write_all(manifest.as_bytes()).unwrap();
    }

    writer.finish().unwrap().into_inner()
}

async fn archive_server(body: Vec<u8>) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/templates.zip"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/zip")
                .set_body_bytes(body),
        )
        .mount(&server)
        .await;
    server
}

fn test_config(server: &MockServer) -> BrokkrConfig {
    let mut config = BrokkrConfig::default();
    config.archive_url = format!("{}/templates.zip", server.uri());
    config
}

fn demo_def() -> ProjectDefinition {
    ProjectDefinition {
        name: "demo".to_string(),
        description: "A demo project".to_string(),
        author: "octocat".to_string(),
        private: false,
        template: TemplateReference::new("basic"),
        path: None,
        created_at: None,
    }
}

fn project_dir() -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("demo")).unwrap();
    (temp, path)
}

#[tokio::test]
async fn test_successful_creation_end_to_end() {
    let server = archive_server(template_archive(None)).await;
    let config = test_config(&server);
    let runner = Arc::new(RecordingRunner::new());
    let (_temp, path) = project_dir();

    let creator = ProjectCreator::new(&config)
        .unwrap()
        .with_runner(Arc::clone(&runner) as Arc<dyn ProcessRunner>, &config)
        .with_initializer(Arc::new(NoopInitializer));

    let report = creator.create(&demo_def(), &path).await.unwrap();
    assert_eq!(report.status(), TaskStatus::Succeeded);

    // only the selected subtree is materialized
    assert_eq!(
        std::fs::read_to_string(path.join("README.md")).unwrap(),
        "# basic template\n"
    );
    assert!(path.join("src/main.txt").exists());
    assert!(!path.join("file.txt").exists());

    // publish ran all six commands in order
    let calls = runner.calls();
    assert_eq!(calls.len(), 6);
    assert!(calls[0].starts_with("git init"));
    assert!(calls[1].starts_with("gh repo create demo"));
    assert!(calls[1].contains("--public"));
    assert!(calls[2].starts_with("git remote add origin"));
    assert!(calls[3].starts_with("git add"));
    assert!(calls[4].starts_with("git commit"));
    assert!(calls[5].starts_with("git push"));
}

#[tokio::test]
async fn test_download_failure_aborts_before_any_process_runs() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/templates.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config(&server);
    let runner = Arc::new(RecordingRunner::new());
    let (_temp, path) = project_dir();

    let creator = ProjectCreator::new(&config)
        .unwrap()
        .with_runner(Arc::clone(&runner) as Arc<dyn ProcessRunner>, &config)
        .with_initializer(Arc::new(NoopInitializer));

    let err = creator.create(&demo_def(), &path).await.unwrap_err();
    assert_eq!(
        err.task_path,
        "Downloading the template / Downloading template archive"
    );
    match err.source.downcast_ref::<Error>() {
        Some(Error::Download { status, .. }) => assert_eq!(*status, 404),
        other => panic!("expected Download error, got {other:?}"),
    }

    assert!(runner.calls().is_empty());
    assert_eq!(
        err.report.node(&["Publishing the project"]).unwrap().status,
        TaskStatus::Pending
    );
}

#[tokio::test]
async fn test_missing_template_subtree_fails_extraction() {
    let server = archive_server(template_archive(None)).await;
    let config = test_config(&server);
    let runner = Arc::new(RecordingRunner::new());
    let (_temp, path) = project_dir();

    let mut def = demo_def();
    def.template = TemplateReference::new("nonexistent");

    let creator = ProjectCreator::new(&config)
        .unwrap()
        .with_runner(Arc::clone(&runner) as Arc<dyn ProcessRunner>, &config)
        .with_initializer(Arc::new(NoopInitializer));

    let err = creator.create(&def, &path).await.unwrap_err();
    assert_eq!(
        err.task_path,
        "Downloading the template / Extracting the template from the archive"
    );
    assert!(matches!(
        err.source.downcast_ref::<Error>(),
        Some(Error::Extraction { .. })
    ));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_failed_github_creation_stops_publishing() {
    let server = archive_server(template_archive(None)).await;
    let config = test_config(&server);
    let runner = Arc::new(GhFailsRunner {
        calls: Mutex::new(Vec::new()),
    });
    let (_temp, path) = project_dir();

    let creator = ProjectCreator::new(&config)
        .unwrap()
        .with_runner(Arc::clone(&runner) as Arc<dyn ProcessRunner>, &config)
        .with_initializer(Arc::new(NoopInitializer));

    let err = creator.create(&demo_def(), &path).await.unwrap_err();
    assert_eq!(
        err.task_path,
        "Publishing the project / Creating repository on GitHub"
    );

    // git init ran, gh failed, nothing after
    let calls = runner.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].starts_with("gh repo create"));

    // the extracted template stays on disk for inspection
    assert!(path.join("README.md").exists());
}

#[tokio::test]
async fn test_manifest_initialization_runs_as_nested_tasks() {
    let manifest = "\
steps:
  - title: Record the project name
    write:
      path: NAME
      contents: \"{{ name }}\"
";
    let server = archive_server(template_archive(Some(manifest))).await;
    let config = test_config(&server);
    let runner = Arc::new(RecordingRunner::new());
    let (_temp, path) = project_dir();

    let creator = ProjectCreator::new(&config)
        .unwrap()
        .with_runner(Arc::clone(&runner) as Arc<dyn ProcessRunner>, &config)
        .with_initializer(Arc::new(ManifestInitializer));

    let report = creator.create(&demo_def(), &path).await.unwrap();
    assert_eq!(report.status(), TaskStatus::Succeeded);

    // the manifest step ran as a child of the init stage
    let step = report
        .node(&["Initializing the project", "Record the project name"])
        .unwrap();
    assert_eq!(step.status, TaskStatus::Succeeded);
    assert_eq!(std::fs::read_to_string(path.join("NAME")).unwrap(), "demo");
}
