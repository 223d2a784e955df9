use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use relocator_core::{ProgressReporter, RelocationAction, RelocationStatus};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif.
///
/// Scans get a bar once the number of directories is known, relocations a spinner.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    pub fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn spinner(message: String) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars(TICK_CHARS),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}

fn action_label(action: RelocationAction) -> &'static str {
    match action {
        RelocationAction::CreateJunction => "Relocating",
        RelocationAction::RemoveJunction => "Restoring",
        RelocationAction::RemoveBackup => "Removing backup of",
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, root: &Path) {
        self.set_bar(Self::spinner(format!("Scanning {}...", root.display())));
    }

    fn on_scan_progress(&self, measured: usize, total: usize) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                if pb.length() != Some(total as u64) {
                    pb.set_style(
                        ProgressStyle::with_template(
                            "  {spinner:.cyan} Measuring [{bar:30.cyan/dim}] {pos}/{len} directories",
                        )
                        .unwrap_or_else(|_| ProgressStyle::default_bar())
                        .progress_chars("━╸─")
                        .tick_chars(TICK_CHARS),
                    );
                    pb.set_length(total as u64);
                }
                pb.set_position(measured as u64);
            }
        }
    }

    fn on_scan_complete(&self, entries: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  {} Scan complete: {} directories in {:.2}s",
            "✓".green(),
            entries,
            duration_secs
        );
    }

    fn on_relocate_start(&self, path: &Path, action: RelocationAction) {
        self.set_bar(Self::spinner(format!(
            "{} {}...",
            action_label(action),
            path.display()
        )));
    }

    fn on_relocate_complete(&self, path: &Path, action: RelocationAction, status: RelocationStatus) {
        self.finish_bar();
        eprintln!(
            "  {} {} {}: {}",
            "✓".green(),
            action_label(action),
            path.display(),
            status
        );
    }
}
