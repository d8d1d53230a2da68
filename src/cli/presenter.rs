//! CLI presenter for output formatting

use colored::*;

use crate::application::DispatchStats;

/// Presenter for CLI output formatting
#[derive(Debug, Default)]
pub struct Presenter;

impl Presenter {
    /// Create a new presenter
    pub fn new() -> Self {
        Self
    }

    /// Print info message to stderr
    pub fn info(&self, message: &str) {
        eprintln!("{} {}", "ℹ".cyan(), message);
    }

    /// Print success message to stderr
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", "✓".green(), message);
    }

    /// Print warning message to stderr
    pub fn warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print error message to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Output text to stdout
    pub fn output(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a key-value pair (for config list)
    pub fn key_value(&self, key: &str, value: &str) {
        println!("{}: {}", key.cyan(), value);
    }

    /// Summary printed when the dispatch loop stops
    pub fn dispatch_summary(&self, stats: &DispatchStats) {
        eprintln!("{} {}", "●".cyan(), format_stats(stats));
    }

}

fn format_stats(stats: &DispatchStats) -> String {
    format!(
        "{} received, {} notified, {} suppressed, {} unhandled, {} skipped, {} failed, {} malformed",
        stats.received,
        stats.notified,
        stats.suppressed,
        stats.unhandled,
        stats.skipped,
        stats.failed,
        stats.malformed
    )
}
