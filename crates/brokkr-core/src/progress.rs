//! Fractional progress tracking for long-running operations
//!
//! A `ProgressTracker` is owned by the component performing the work
//! (e.g. the archive fetcher), which feeds it completed/total unit
//! counts. `render()` produces the textual progress line that flows
//! through the pipeline's progress channel to the observer.

use std::time::{Duration, Instant};

/// Width of the rendered progress bar in glyphs
const BAR_WIDTH: usize = 24;

/// Tracks fractional completion and timing for a single operation
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    message: String,
    completed: u64,
    total: Option<u64>,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            completed: 0,
            total: None,
            started: Instant::now(),
        }
    }

    /// Record progress. `completed` is monotonically non-decreasing;
    /// a smaller value than previously seen is ignored. A zero or
    /// absent total keeps the tracker indeterminate until a non-zero
    /// total is observed.
    pub fn update(&mut self, completed: u64, total: Option<u64>) {
        if completed > self.completed {
            self.completed = completed;
        }
        if let Some(total) = total.filter(|t| *t > 0) {
            self.total = Some(total);
        }
    }

    /// Fraction complete in `[0, 1]`; `0.0` while the total is unknown
    pub fn fraction(&self) -> f64 {
        match self.total {
            Some(total) if total > 0 => (self.completed as f64 / total as f64).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// True once the fraction has reached `1.0`
    pub fn is_complete(&self) -> bool {
        self.fraction() >= 1.0
    }

    /// Units recorded so far
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Estimated time remaining, extrapolated from elapsed time and the
    /// current fraction. Undefined while the fraction is zero.
    pub fn eta(&self) -> Option<Duration> {
        let fraction = self.fraction();
        if fraction <= 0.0 {
            return None;
        }
        if fraction >= 1.0 {
            return Some(Duration::ZERO);
        }
        let elapsed = self.started.elapsed().as_secs_f64();
        Some(Duration::from_secs_f64(elapsed * (1.0 - fraction) / fraction))
    }

    /// Render a single progress line.
    ///
    /// Determinate: `message [#####>------] 42% | time left: 12s`.
    /// Indeterminate (total unknown): the byte count only, with no
    /// percentage or ETA.
    pub fn render(&self) -> String {
        if self.total.is_none() {
            return format!("{} {}", self.message, human_size(self.completed));
        }

        let fraction = self.fraction();
        let mut line = format!(
            "{} [{}] {:>3.0}%",
            self.message,
            bar(fraction, BAR_WIDTH),
            fraction * 100.0
        );
        if let Some(eta) = self.eta() {
            line.push_str(&format!(" | time left: {}", format_duration(eta)));
        }
        line
    }
}

fn bar(fraction: f64, width: usize) -> String {
    let filled = (fraction * width as f64).floor() as usize;
    let filled = filled.min(width);
    let mut bar = "#".repeat(filled);
    if filled < width {
        bar.push('>');
        bar.push_str(&"-".repeat(width - filled - 1));
    }
    bar
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}s", secs)
    }
}

/// Convert bytes to human-readable size
pub fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}
