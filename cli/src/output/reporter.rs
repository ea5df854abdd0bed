//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! On a TTY each `step()` becomes a spinner that the next `success()` turns
//! into a checkmark. Elsewhere (pipes, CI logs) every event is one plain line.

use std::cell::RefCell;

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` starts a spinner, or prints `"  → {message}"` without a TTY
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ⚠ {message}"` without disturbing an active spinner
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    active: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            active: RefCell::new(None),
        }
    }

    fn clear_active(&self) {
        if let Some(pb) = self.active.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        self.clear_active();
        if self.ctx.show_progress() {
            *self.active.borrow_mut() = Some(progress::spinner(message));
        } else {
            println!("  {} {message}", "→".style(self.ctx.styles.step));
        }
    }

    fn success(&self, message: &str) {
        match self.active.borrow_mut().take() {
            Some(pb) => progress::finish_ok(&pb, message),
            None => self.ctx.success(message),
        }
    }

    fn warn(&self, message: &str) {
        match self.active.borrow().as_ref() {
            Some(pb) => pb.suspend(|| self.ctx.warn(message)),
            None => self.ctx.warn(message),
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        // A step that never reached success() left its spinner running.
        self.clear_active();
    }
}
