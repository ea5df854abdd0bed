//! Output formatting module

pub mod progress;
pub mod reporter;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use reporter::TerminalReporter;
pub use styles::Styles;

/// Output context carrying styling and terminal state.
pub struct OutputContext {
    /// Stylesheet for colored output.
    pub styles: Styles,
    /// Whether stdout is a TTY.
    pub is_tty: bool,
}

impl OutputContext {
    /// Create output context for the current terminal.
    ///
    /// Colors are used only on a TTY and only when `no_color` (set from the
    /// `NO_COLOR` convention) is false.
    #[must_use]
    pub fn new(no_color: bool) -> Self {
        let is_tty = Term::stdout().is_term();

        let mut styles = Styles::default();
        if !no_color && is_tty {
            styles.colorize();
        }

        Self { styles, is_tty }
    }

    /// Check if animated progress indicators should be shown.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty
    }

    /// Print a success message prefixed with `✓`.
    pub fn success(&self, msg: &str) {
        println!("  {} {msg}", "✓".style(self.styles.success));
    }

    /// Print a warning message prefixed with `⚠`.
    pub fn warn(&self, msg: &str) {
        println!("  {} {msg}", "⚠".style(self.styles.warning));
    }

    /// Print an error message prefixed with `✗` to stderr.
    pub fn error(&self, msg: &str) {
        eprintln!("  {} {msg}", "✗".style(self.styles.error));
    }

    /// Print an info message prefixed with `ℹ`.
    pub fn info(&self, msg: &str) {
        println!("  {} {msg}", "ℹ".style(self.styles.info));
    }

    /// Print a section header.
    pub fn header(&self, msg: &str) {
        println!("  {}", msg.style(self.styles.header));
    }

    /// Print a key-value pair with the key dimmed and padded.
    pub fn kv(&self, key: &str, value: &str) {
        println!("  {:<8}  {value}", key.style(self.styles.dim));
    }
}
