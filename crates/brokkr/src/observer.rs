//! Terminal rendering of pipeline progress
//!
//! One spinner is live at a time, always for the innermost running
//! task. When a running task turns out to be a group (a child starts
//! underneath it), its spinner is retired and the title is reprinted as
//! a plain section line so the children render below it.

use brokkr_core::pipeline::{PipelineObserver, TaskStatus};
use console::style;
use indicatif::ProgressBar;
use std::sync::Mutex;
use std::time::Duration;

use crate::output;

struct ActiveTask {
    path: Vec<String>,
    bar: ProgressBar,
}

/// [`PipelineObserver`] rendering the task tree to the terminal
pub struct TerminalObserver {
    active: Mutex<Option<ActiveTask>>,
}

impl TerminalObserver {
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }
}

fn indent(path: &[String]) -> String {
    "  ".repeat(path.len().saturating_sub(1))
}

fn title(path: &[String]) -> &str {
    path.last().map(String::as_str).unwrap_or("")
}

impl PipelineObserver for TerminalObserver {
    fn task_started(&self, path: &[String]) {
        let mut active = self.active.lock().unwrap();

        // a child starting under the active task means that task is a
        // group: retire its spinner and leave its title as a section line
        if let Some(current) = active.take() {
            if path.starts_with(&current.path) {
                current.bar.finish_and_clear();
                println!(
                    "{}{}",
                    indent(&current.path),
                    style(title(&current.path)).bold()
                );
            } else {
                current.bar.finish_and_clear();
            }
        }

        let bar = output::spinner(&format!("{}{}", indent(path), title(path)));
        *active = Some(ActiveTask {
            path: path.to_vec(),
            bar,
        });
    }

    fn task_progress(&self, path: &[String], line: &str) {
        let active = self.active.lock().unwrap();
        if let Some(current) = active.as_ref() {
            if current.path == path {
                current.bar.set_message(format!("{}{}", indent(path), line));
            }
        }
    }

    fn task_finished(&self, path: &[String], status: TaskStatus, elapsed: Duration) {
        let mut active = self.active.lock().unwrap();

        // groups had their line printed when the first child started
        let is_leaf = match active.as_ref() {
            Some(current) => current.path == path,
            None => false,
        };
        if is_leaf {
            if let Some(current) = active.take() {
                current.bar.finish_and_clear();
            }
        } else if status != TaskStatus::Failed {
            return;
        }

        let mark = match status {
            TaskStatus::Failed => style("✗").red().bold(),
            _ => style("✓").green().bold(),
        };
        println!(
            "{}{} {} {}",
            indent(path),
            mark,
            title(path),
            style(format!("({})", humanize(elapsed))).dim()
        );
    }
}

fn humanize(elapsed: Duration) -> String {
    if elapsed.as_secs() >= 1 {
        format!("{:.1}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}
