//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use waymark::{ChainResult, ChainStatus};

/// Progress reporter for chain replay
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter writing to stderr
    #[must_use]
    pub fn new(use_color: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
        }
    }

    /// Start a progress bar over `total` chains
    pub fn start_progress(&mut self, total: u64, message: &str) {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Finish and clear the progress bar
    pub fn finish(&mut self) {
        if let Some(pb) = self.progress_bar.take() {
            pb.finish_and_clear();
        }
    }

    fn line(&self, symbol: &str, plain: &str, color: Style, message: &str) {
        let prefix = if self.use_color {
            color.apply_to(symbol).bold().to_string()
        } else {
            plain.to_string()
        };
        let line = format!("{prefix} {message}");
        match &self.progress_bar {
            Some(pb) if !pb.is_hidden() => pb.println(line),
            _ => {
                let _ = self.term.write_line(&line);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        self.line("✓", "PASS", Style::new().green(), message);
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        self.line("✗", "FAIL", Style::new().red(), message);
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        self.line("⚠", "WARN", Style::new().yellow(), message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        self.line("ℹ", "INFO", Style::new().blue(), message);
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print one chain's outcome and its warnings
    pub fn chain_result(&self, result: &ChainResult) {
        let detail = format!(
            "{} ({} step(s), {} warning(s){}, {}ms)",
            result.chain,
            result.steps_executed,
            result.warnings.len(),
            if result.setup_skipped {
                ", setup skipped"
            } else {
                ""
            },
            result.duration_ms
        );
        match result.status {
            ChainStatus::Passed => self.success(&detail),
            ChainStatus::Failed => self.failure(&detail),
        }
        for warning in &result.warnings {
            self.warning(&format!("  {warning}"));
        }
        if let Some(failure) = &result.failure {
            self.failure(&format!("  {failure}"));
        }
    }

    /// Print the replay summary
    pub fn summary(&self, passed: usize, failed: usize) {
        let total = passed + failed;
        let _ = self.term.write_line("");
        if self.use_color {
            let status = if failed > 0 {
                Style::new().red().bold().apply_to("FAILED")
            } else {
                Style::new().green().bold().apply_to("PASSED")
            };
            let _ = self.term.write_line(&format!(
                "{status} {total} chain(s) ({passed} passed, {failed} failed)"
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} chain(s) ({passed} passed, {failed} failed)"
            ));
        }
    }
}
