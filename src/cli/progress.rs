//! Terminal progress display for request downloads
//!
//! The download command keeps a single `indicatif` line on stdout: a batch bar
//! for the request plus the percentage of the file currently in flight. The
//! bar is hidden unless stdout is a terminal.
//! Login gets an `indicatif` spinner on stderr.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::app::fetcher::FetchObserver;
use crate::app::models::FileDescriptor;
use crate::constants::progress::BAR_WIDTH;

/// Render the batch progress line for `out_dir`
///
/// `progress` is a fraction. Negative values render an empty bar marked
/// `Halt...`; values of one or more are clamped and marked `Done...` with a
/// trailing newline. The line starts with `\r` so it overwrites itself.
pub fn render_progress(progress: f64, out_dir: &Path) -> String {
    let (fraction, status) = if progress.is_nan() || progress < 0.0 {
        (0.0, "Halt...\n")
    } else if progress >= 1.0 {
        (1.0, "Done...\n")
    } else {
        (progress, "")
    };

    let filled = ((fraction * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    let bar = format!("{}{}", "=".repeat(filled), " ".repeat(BAR_WIDTH - filled));

    format!(
        "\rDownloading Request to '{}' directory.  Download Progress: [{}] {:.1}% {}",
        display_dir(out_dir),
        bar,
        fraction * 100.0,
        status
    )
}

/// Relative directories are shown as `./dir`
fn display_dir(out_dir: &Path) -> String {
    let shown = out_dir.display().to_string();
    if out_dir.is_absolute() || shown.starts_with('.') {
        shown
    } else {
        format!("./{}", shown)
    }
}

/// Draws download progress on stdout through an `indicatif` bar
///
/// The bar's `{msg}` template carries the line from [`render_progress`], so
/// indicatif owns clearing and redrawing.
pub struct ConsoleProgress {
    out_dir: PathBuf,
    bar: ProgressBar,
    batch: f64,
    current_file: Option<String>,
    last_percent: Option<u64>,
}

impl ConsoleProgress {
    /// Create a display; the bar is hidden when `enabled` is false
    pub fn new(out_dir: &Path, enabled: bool) -> Self {
        let bar = if enabled {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::stdout())
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar().template("{msg}") {
            bar.set_style(style);
        }

        Self {
            out_dir: out_dir.to_path_buf(),
            bar,
            batch: 0.0,
            current_file: None,
            last_percent: None,
        }
    }

    /// Enabled when stdout is a terminal and output is not suppressed
    pub fn for_terminal(out_dir: &Path, quiet: bool) -> Self {
        Self::new(out_dir, !quiet && atty::is(atty::Stream::Stdout))
    }

    fn redraw(&mut self, file_percent: Option<f64>) {
        let line = render_progress(self.batch, &self.out_dir);
        let mut message = line
            .trim_matches(|c: char| c == '\r' || c == '\n')
            .trim_end()
            .to_string();

        if self.batch.is_nan() || self.batch < 0.0 {
            self.bar.abandon_with_message(message);
        } else if self.batch >= 1.0 {
            self.bar.finish_with_message(message);
        } else {
            if let (Some(name), Some(percent)) = (&self.current_file, file_percent) {
                message.push_str(&format!(" {} {:.1}%", name, percent));
            }
            self.bar.set_message(message);
        }
    }
}

impl FetchObserver for ConsoleProgress {
    fn batch_progress(&mut self, fraction: f64) {
        self.batch = fraction;
        self.redraw(None);
    }

    fn file_started(&mut self, file: &FileDescriptor) {
        self.current_file = file.file_name().map(str::to_string);
        self.last_percent = None;
    }

    fn file_progress(&mut self, received: u64, total: Option<u64>) {
        let Some(total) = total.filter(|total| *total > 0) else {
            return;
        };

        let percent = received as f64 / total as f64 * 100.0;
        // Redraw only when the displayed tenth of a percent changes
        let tenths = (percent * 10.0) as u64;
        if self.last_percent == Some(tenths) {
            return;
        }
        self.last_percent = Some(tenths);
        self.redraw(Some(percent));
    }

    fn file_finished(&mut self, _file: &FileDescriptor, _bytes: u64) {
        self.current_file = None;
    }
}

/// Spinner shown on stderr while a call is in flight
///
/// Returns `None` when disabled so callers can skip it with `if let`.
pub fn spinner(message: &str, enabled: bool) -> Option<ProgressBar> {
    if !enabled || !atty::is(atty::Stream::Stderr) {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Some(spinner)
}
