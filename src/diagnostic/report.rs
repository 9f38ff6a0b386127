//! Error-reporting hooks.
//!
//! A stream can route its errors through an [`ErrorHook`] instead of the
//! event channel. The hook is per stream instance, so two streams with
//! different hooks never interfere.

use std::io::Write;

use super::error::{StreamError, PLUGIN_NAME};

/// Receives every error of the stream it is attached to.
///
/// Once a hook has reported an error, that unit's flow is finished: no
/// `Error` event is sent for it and the stream continues with the next unit.
///
/// Any `Fn(&StreamError) + Send + Sync` closure is a hook.
pub trait ErrorHook: Send + Sync {
    /// Report one error.
    fn report(&self, error: &StreamError);
}

impl<F> ErrorHook for F
where
    F: Fn(&StreamError) + Send + Sync,
{
    fn report(&self, error: &StreamError) {
        self(error)
    }
}

// ============================================================================
// LogError
// ============================================================================

/// Default hook: prints a formatted report to stderr.
///
/// ```text
/// Error in plugin "sass"
/// Message:
///     scss/error.scss
///     Error: expected ":".
/// ```
#[derive(Debug, Clone, Copy)]
pub struct LogError {
    /// Whether to use ANSI colors.
    pub colored: bool,
}

impl Default for LogError {
    fn default() -> Self {
        Self { colored: true }
    }
}

impl LogError {
    /// Plain-text reports (no ANSI colors).
    pub fn plain() -> Self {
        Self { colored: false }
    }
}

impl ErrorHook for LogError {
    fn report(&self, error: &StreamError) {
        let report = format_report(error, self.colored);
        let mut stderr = std::io::stderr().lock();
        // Nothing sensible to do if stderr itself is gone.
        let _ = writeln!(stderr, "{report}");
    }
}

/// Render the report printed by [`LogError`].
pub fn format_report(error: &StreamError, colored: bool) -> String {
    let plugin = format!("\"{PLUGIN_NAME}\"");
    let (header, plugin, path) = if colored {
        (paint_error("Error"), paint_plugin(&plugin), paint_path(error.relative_path()))
    } else {
        ("Error".to_owned(), plugin, error.relative_path().to_owned())
    };

    let mut out = format!("{header} in plugin {plugin}\nMessage:\n");
    let mut lines = error.message_formatted().lines();
    // First line of the formatted message is the relative path.
    if lines.next().is_some() {
        out.push_str("    ");
        out.push_str(&path);
    }
    for line in lines {
        out.push_str("\n    ");
        out.push_str(line);
    }
    out
}

#[cfg(feature = "colored-diagnostics")]
fn paint_error(text: &str) -> String {
    use owo_colors::OwoColorize;
    text.red().to_string()
}

#[cfg(feature = "colored-diagnostics")]
fn paint_plugin(text: &str) -> String {
    use owo_colors::OwoColorize;
    text.cyan().to_string()
}

#[cfg(feature = "colored-diagnostics")]
fn paint_path(text: &str) -> String {
    use owo_colors::OwoColorize;
    text.underline().to_string()
}

#[cfg(not(feature = "colored-diagnostics"))]
fn paint_error(text: &str) -> String {
    text.to_owned()
}

#[cfg(not(feature = "colored-diagnostics"))]
fn paint_plugin(text: &str) -> String {
    text.to_owned()
}

#[cfg(not(feature = "colored-diagnostics"))]
fn paint_path(text: &str) -> String {
    text.to_owned()
}
