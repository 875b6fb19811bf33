use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// A RAII struct that automatically finishes the spinner when dropped.
pub struct Spinner<'a> {
    /// The global progress bar collection that's integrated with the logger.
    global_progress: &'a MultiProgress,
    /// The progress bar for this spinner.
    spinner: ProgressBar,
}

impl<'a> Spinner<'a> {
    /// Create a new "dots" spinner shown while uploads are in flight. Hooked
    /// into the global progress bar collection, which is integrated with the
    /// logger.
    pub fn new(global_progress: &'a MultiProgress) -> Self {
        let spinner = global_progress.add(ProgressBar::new_spinner());
        spinner.enable_steady_tick(Duration::from_millis(80));
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&[
                    "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
                ]),
        );
        Self {
            global_progress,
            spinner,
        }
    }

    /// Show which file of the batch is currently being uploaded.
    pub fn uploading(&self, index: usize, total: usize, path: &Path) {
        let name = path.file_name().unwrap_or(path.as_os_str());
        self.spinner.set_message(format!(
            "[{index}/{total}] Uploading {}...",
            name.to_string_lossy()
        ));
    }
}

impl Drop for Spinner<'_> {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
        self.global_progress.remove(&self.spinner);
    }
}
