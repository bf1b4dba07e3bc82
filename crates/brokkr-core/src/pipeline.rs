//! Hierarchical task pipeline with sequential, fail-fast execution
//!
//! A pipeline is a tree of tasks: leaves are asynchronous units of
//! work, groups are ordered lists of children executed strictly one
//! after another. The first failure at any depth aborts the remaining
//! siblings of its group and bubbles up as a [`PipelineError`] carrying
//! the path of the failed task.
//!
//! Leaves may emit textual progress lines through a bounded channel on
//! their [`TaskContext`]; the engine drains that channel on a fixed
//! interval while the leaf runs, forwards the most recent line per tick
//! to the observer, and stops as soon as the leaf's future completes,
//! whether or not the producer closed the channel.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Capacity of a leaf's progress-line channel. Progress lines are
/// lossy by design; when the buffer is full the newest line is dropped.
const PROGRESS_BUFFER: usize = 64;

/// Default interval at which queued progress lines are forwarded
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(80);

/// Execution status of a single task node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// Status and timing of one task after (or during) a run
#[derive(Debug, Clone, Serialize)]
pub struct TaskNode {
    pub title: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<Duration>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TaskNode>,
}

impl TaskNode {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: TaskStatus::Pending,
            error: None,
            elapsed: None,
            children: Vec::new(),
        }
    }
}

/// The task tree after a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub tasks: Vec<TaskNode>,
}

impl TaskReport {
    /// Aggregate status across the root tasks: `Failed` if any task
    /// failed, `Succeeded` only when every task succeeded.
    pub fn status(&self) -> TaskStatus {
        aggregate_status(&self.tasks)
    }

    /// Look up a node by its title path
    pub fn node(&self, path: &[&str]) -> Option<&TaskNode> {
        let mut nodes = &self.tasks;
        let mut found: Option<&TaskNode> = None;
        for title in path {
            let next = nodes.iter().find(|n| n.title == *title)?;
            nodes = &next.children;
            found = Some(next);
        }
        found
    }
}

fn aggregate_status(nodes: &[TaskNode]) -> TaskStatus {
    if nodes.iter().any(|n| n.status == TaskStatus::Failed) {
        TaskStatus::Failed
    } else if nodes.iter().all(|n| n.status == TaskStatus::Succeeded) {
        TaskStatus::Succeeded
    } else if nodes.iter().any(|n| n.status == TaskStatus::Running) {
        TaskStatus::Running
    } else {
        TaskStatus::Pending
    }
}

/// Error surfaced by [`Pipeline::run`] when any task fails
#[derive(Debug, thiserror::Error)]
#[error("task '{task_path}' failed: {source}")]
pub struct PipelineError {
    /// Titles from the root to the failed task, joined with " / "
    pub task_path: String,

    /// The task tree as it stood when the run aborted
    pub report: TaskReport,

    #[source]
    pub source: anyhow::Error,
}

/// Lossy sender half of a leaf's progress-line channel
#[derive(Clone)]
pub struct ProgressSink {
    tx: mpsc::Sender<String>,
}

impl ProgressSink {
    /// Queue a progress line; dropped silently when the buffer is full
    pub fn send(&self, line: impl Into<String>) {
        let _ = self.tx.try_send(line.into());
    }
}

/// Handle passed to every leaf task
pub struct TaskContext {
    sink: ProgressSink,
}

impl TaskContext {
    /// Emit a progress line
    pub fn progress(&self, line: impl Into<String>) {
        self.sink.send(line);
    }

    /// Clone the sink, e.g. to hand it to a helper performing the work
    pub fn sink(&self) -> ProgressSink {
        self.sink.clone()
    }
}

/// What a leaf produced: either plain completion or a further task
/// tree to execute as its children
pub enum TaskOutcome {
    Done,
    Nested(Vec<Task>),
}

type LeafFuture = Pin<Box<dyn Future<Output = anyhow::Result<TaskOutcome>> + Send + 'static>>;
type LeafFn = Box<dyn FnOnce(TaskContext) -> LeafFuture + Send>;

enum Work {
    Leaf(LeafFn),
    Group(Vec<Task>),
}

/// One node of the task tree handed to a [`Pipeline`]
pub struct Task {
    title: String,
    work: Work,
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("title", &self.title).finish_non_exhaustive()
    }
}

impl Task {
    /// An asynchronous unit of work
    pub fn leaf<F, Fut>(title: impl Into<String>, work: F) -> Self
    where
        F: FnOnce(TaskContext) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<TaskOutcome>> + Send + 'static,
    {
        Self {
            title: title.into(),
            work: Work::Leaf(Box::new(move |ctx| Box::pin(work(ctx)))),
        }
    }

    /// An ordered group of child tasks
    pub fn group(title: impl Into<String>, children: Vec<Task>) -> Self {
        Self {
            title: title.into(),
            work: Work::Group(children),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

/// Observer of task lifecycle and progress events
pub trait PipelineObserver: Send + Sync {
    fn task_started(&self, path: &[String]) {
        let _ = path;
    }

    fn task_progress(&self, path: &[String], line: &str) {
        let _ = (path, line);
    }

    fn task_finished(&self, path: &[String], status: TaskStatus, elapsed: Duration) {
        let _ = (path, status, elapsed);
    }
}

/// Observer that ignores every event
pub struct NullObserver;

impl PipelineObserver for NullObserver {}

/// A runnable task tree
pub struct Pipeline {
    tasks: Vec<Task>,
    observer: Arc<dyn PipelineObserver>,
    poll_interval: Duration,
}

impl Pipeline {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            observer: Arc::new(NullObserver),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Override the progress drain interval (mainly for tests)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Execute the whole tree sequentially, fail-fast.
    ///
    /// Returns the final [`TaskReport`] on success. On the first
    /// failure the remaining siblings of the failed task are never
    /// started and the error carries both the failed task's path and
    /// the report as it stood.
    pub async fn run(self) -> Result<TaskReport, PipelineError> {
        let mut nodes: Vec<TaskNode> = self
            .tasks
            .iter()
            .map(|task| TaskNode::new(&task.title))
            .collect();
        let mut path = Vec::new();

        let outcome = run_tasks(
            self.tasks,
            &mut nodes,
            &mut path,
            Arc::clone(&self.observer),
            self.poll_interval,
        )
        .await;

        let report = TaskReport { tasks: nodes };
        match outcome {
            Ok(()) => Ok(report),
            Err(failure) => Err(PipelineError {
                task_path: failure.path.join(" / "),
                report,
                source: failure.source,
            }),
        }
    }
}

struct Failure {
    path: Vec<String>,
    source: anyhow::Error,
}

fn run_tasks<'a>(
    tasks: Vec<Task>,
    nodes: &'a mut [TaskNode],
    path: &'a mut Vec<String>,
    observer: Arc<dyn PipelineObserver>,
    poll_interval: Duration,
) -> Pin<Box<dyn Future<Output = Result<(), Failure>> + Send + 'a>> {
    Box::pin(async move {
        for (index, task) in tasks.into_iter().enumerate() {
            let node = &mut nodes[index];
            path.push(task.title);
            node.status = TaskStatus::Running;
            observer.task_started(path);
            let started = Instant::now();

            let result = match task.work {
                Work::Group(children) => {
                    node.children = children
                        .iter()
                        .map(|child| TaskNode::new(&child.title))
                        .collect();
                    run_tasks(
                        children,
                        &mut node.children,
                        path,
                        Arc::clone(&observer),
                        poll_interval,
                    )
                    .await
                }
                Work::Leaf(work) => {
                    match run_leaf(work, path, observer.as_ref(), poll_interval).await {
                        Ok(TaskOutcome::Done) => Ok(()),
                        Ok(TaskOutcome::Nested(children)) => {
                            node.children = children
                                .iter()
                                .map(|child| TaskNode::new(&child.title))
                                .collect();
                            run_tasks(
                                children,
                                &mut node.children,
                                path,
                                Arc::clone(&observer),
                                poll_interval,
                            )
                            .await
                        }
                        Err(source) => Err(Failure {
                            path: path.clone(),
                            source,
                        }),
                    }
                }
            };

            let elapsed = started.elapsed();
            node.elapsed = Some(elapsed);

            match result {
                Ok(()) => {
                    node.status = TaskStatus::Succeeded;
                    observer.task_finished(path, TaskStatus::Succeeded, elapsed);
                    path.pop();
                }
                Err(failure) => {
                    node.status = TaskStatus::Failed;
                    // record detail only where the failure originated;
                    // ancestors show Failed with the child carrying it
                    if node.children.is_empty() {
                        node.error = Some(failure.source.to_string());
                    }
                    observer.task_finished(path, TaskStatus::Failed, elapsed);
                    path.pop();
                    return Err(failure);
                }
            }
        }
        Ok(())
    })
}

async fn run_leaf(
    work: LeafFn,
    path: &[String],
    observer: &dyn PipelineObserver,
    poll_interval: Duration,
) -> anyhow::Result<TaskOutcome> {
    let (tx, mut rx) = mpsc::channel(PROGRESS_BUFFER);
    let ctx = TaskContext {
        sink: ProgressSink { tx },
    };

    let mut handle = tokio::spawn(work(ctx));
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let joined = loop {
        tokio::select! {
            joined = &mut handle => break joined,
            _ = ticker.tick() => {
                if let Some(line) = drain_latest(&mut rx) {
                    observer.task_progress(path, &line);
                }
            }
        }
    };

    // the operation is done: forward what the producer emitted before
    // completing, then stop draining regardless of channel state
    if let Some(line) = drain_latest(&mut rx) {
        observer.task_progress(path, &line);
    }

    match joined {
        Ok(result) => result,
        Err(join_error) => Err(anyhow::anyhow!("task panicked: {join_error}")),
    }
}

fn drain_latest(rx: &mut mpsc::Receiver<String>) -> Option<String> {
    let mut latest = None;
    while let Ok(line) = rx.try_recv() {
        latest = Some(line);
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::sync::Mutex;

    fn recording_leaf(
        title: &str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    ) -> Task {
        let name = title.to_string();
        Task::leaf(title, move |_ctx| async move {
            log.lock().unwrap().push(name.clone());
            if fail {
                bail!("{} exploded", name);
            }
            Ok(TaskOutcome::Done)
        })
    }

    #[tokio::test]
    async fn test_sequential_group_fails_fast() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(vec![
            recording_leaf("first", Arc::clone(&log), false),
            recording_leaf("second", Arc::clone(&log), true),
            recording_leaf("third", Arc::clone(&log), false),
        ]);

        let err = pipeline.run().await.unwrap_err();
        assert_eq!(err.task_path, "second");
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);

        let statuses: Vec<TaskStatus> =
            err.report.tasks.iter().map(|n| n.status).collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::Succeeded, TaskStatus::Failed, TaskStatus::Pending]
        );
        assert!(err.report.node(&["second"]).unwrap().error.is_some());
    }

    #[tokio::test]
    async fn test_nested_group_status_bubbles_up() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(vec![Task::group(
            "outer",
            vec![Task::group(
                "inner",
                vec![recording_leaf("boom", Arc::clone(&log), true)],
            )],
        )]);

        let err = pipeline.run().await.unwrap_err();
        assert_eq!(err.task_path, "outer / inner / boom");
        assert_eq!(err.report.status(), TaskStatus::Failed);
        assert_eq!(
            err.report.node(&["outer"]).unwrap().status,
            TaskStatus::Failed
        );
        assert_eq!(
            err.report.node(&["outer", "inner", "boom"]).unwrap().status,
            TaskStatus::Failed
        );
        // detail lives on the failing leaf, not its ancestors
        assert!(err.report.node(&["outer"]).unwrap().error.is_none());
    }

    #[tokio::test]
    async fn test_all_succeed_aggregates_succeeded() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(vec![Task::group(
            "stage",
            vec![
                recording_leaf("a", Arc::clone(&log), false),
                recording_leaf("b", Arc::clone(&log), false),
            ],
        )]);

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.status(), TaskStatus::Succeeded);
        assert!(report.node(&["stage"]).unwrap().elapsed.is_some());
    }

    #[tokio::test]
    async fn test_leaf_may_return_nested_tasks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let nested_log = Arc::clone(&log);
        let pipeline = Pipeline::new(vec![Task::leaf("parent", move |_ctx| async move {
            Ok(TaskOutcome::Nested(vec![
                recording_leaf("child-a", Arc::clone(&nested_log), false),
                recording_leaf("child-b", nested_log, false),
            ]))
        })]);

        let report = pipeline.run().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["child-a", "child-b"]);
        assert_eq!(
            report.node(&["parent", "child-b"]).unwrap().status,
            TaskStatus::Succeeded
        );
        assert_eq!(report.node(&["parent"]).unwrap().status, TaskStatus::Succeeded);
    }

    struct CollectingObserver {
        lines: Mutex<Vec<String>>,
    }

    impl PipelineObserver for CollectingObserver {
        fn task_progress(&self, _path: &[String], line: &str) {
            self.lines.lock().unwrap().push(line.to_string());
        }
    }

    #[tokio::test]
    async fn test_progress_lines_are_drained() {
        let observer = Arc::new(CollectingObserver {
            lines: Mutex::new(Vec::new()),
        });

        let pipeline = Pipeline::new(vec![Task::leaf("working", |ctx| async move {
            for step in 1..=3 {
                ctx.progress(format!("step {step}/3"));
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            Ok(TaskOutcome::Done)
        })])
        .with_observer(Arc::clone(&observer) as Arc<dyn PipelineObserver>)
        .with_poll_interval(Duration::from_millis(5));

        pipeline.run().await.unwrap();

        let lines = observer.lines.lock().unwrap();
        assert!(!lines.is_empty());
        assert_eq!(lines.last().unwrap(), "step 3/3");
    }

    #[tokio::test]
    async fn test_draining_stops_when_operation_completes() {
        // the producer never "closes" its sequence; completion of the
        // leaf itself must end the drain loop
        let observer = Arc::new(CollectingObserver {
            lines: Mutex::new(Vec::new()),
        });

        let pipeline = Pipeline::new(vec![Task::leaf("quiet", |ctx| async move {
            let sink = ctx.sink();
            sink.send("only line");
            Ok(TaskOutcome::Done)
        })])
        .with_observer(Arc::clone(&observer) as Arc<dyn PipelineObserver>)
        .with_poll_interval(Duration::from_millis(5));

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.status(), TaskStatus::Succeeded);
        assert_eq!(*observer.lines.lock().unwrap(), vec!["only line"]);
    }
}
