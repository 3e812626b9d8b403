//! Colored terminal output for command progress and summaries.

use std::fmt::Display;

use console::{Style, Term};

/// Width of the label column in [`Output::field`] lines.
const LABEL_WIDTH: usize = 28;

/// Terminal output formatter.
///
/// Progress and summaries go to stderr. [`data`](Self::data) writes command
/// results to stdout so they can be piped into other tools.
pub(crate) struct Output {
    stderr: Term,
    stdout: Term,
    dim: Style,
    green: Style,
    yellow: Style,
    red: Style,
    heading: Style,
}

impl Output {
    /// Create a new output formatter.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            stderr: Term::stderr(),
            stdout: Term::stdout(),
            dim: Style::new().dim(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            heading: Style::new().cyan().bold(),
        }
    }

    fn line(&self, style: &Style, msg: &str) {
        let _ = self.stderr.write_line(&style.apply_to(msg).to_string());
    }

    /// Print a `label: value` line with an aligned, dimmed label.
    pub(crate) fn field(&self, label: &str, value: impl Display) {
        let label = format!("{label}:");
        let _ = self.stderr.write_line(&format!(
            "{} {value}",
            self.dim.apply_to(format!("{label:<LABEL_WIDTH$}"))
        ));
    }

    /// Print a field in yellow when its count is non-zero.
    pub(crate) fn failures(&self, label: &str, count: u64) {
        if count > 0 {
            let label = format!("{label}:");
            self.warning(&format!("{label:<LABEL_WIDTH$} {count}"));
        }
    }

    /// Print a section heading (cyan bold, underlined with `=`).
    pub(crate) fn heading(&self, title: &str) {
        self.line(&self.heading, title);
        let _ = self.stderr.write_line(&"=".repeat(title.len().max(LABEL_WIDTH)));
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        self.line(&self.green, msg);
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        self.line(&self.yellow, msg);
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        self.line(&self.red, msg);
    }

    /// Write a command result to stdout.
    pub(crate) fn data(&self, text: &str) -> std::io::Result<()> {
        self.stdout.write_line(text)
    }
}
