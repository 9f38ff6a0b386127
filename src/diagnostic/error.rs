//! Stream error type and the compile-failure translator.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::compiler::CompileFailure;
use crate::path::{absolute, absolute_from_process, relative_slash};

/// Name used when rendering errors for humans.
pub const PLUGIN_NAME: &str = "sass";

/// Message emitted for units whose contents are a live byte stream.
pub const STREAMING_NOT_SUPPORTED: &str = "Streaming not supported";

/// Classification of a [`StreamError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamErrorKind {
    /// The unit carried streaming contents; nothing was compiled.
    Unsupported,
    /// The compiler rejected the source.
    Compile,
    /// A source file could not be read while filling `sourcesContent`.
    Io,
}

/// Error emitted on a stream's error channel.
///
/// Created once per failed unit and never mutated afterwards. `Display`
/// renders [`message`](StreamError::message).
///
/// # Example
///
/// ```ignore
/// for event in events {
///     if let Event::Error(err) = event {
///         eprintln!("{}: {}", err.relative_path(), err.message_original());
///     }
/// }
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct StreamError {
    kind: StreamErrorKind,
    message: String,
    message_original: String,
    message_formatted: String,
    file: PathBuf,
    relative_path: String,
    line: Option<usize>,
    column: Option<usize>,
}

impl StreamError {
    /// Error for a unit whose contents are a live stream.
    pub fn unsupported(unit_path: &Path, cwd: &Path) -> Self {
        let relative_path = display_path(unit_path, cwd);
        Self {
            kind: StreamErrorKind::Unsupported,
            message: STREAMING_NOT_SUPPORTED.to_owned(),
            message_original: STREAMING_NOT_SUPPORTED.to_owned(),
            message_formatted: format!("{relative_path}\n{STREAMING_NOT_SUPPORTED}"),
            file: unit_path.to_path_buf(),
            relative_path,
            line: None,
            column: None,
        }
    }

    /// Error for a source file that could not be read during source-map
    /// reconciliation of `unit_path`.
    pub fn io(source: &Path, err: &io::Error, unit_path: &Path, cwd: &Path) -> Self {
        let relative_path = display_path(unit_path, cwd);
        let original = format!("cannot read source map source {}: {err}", source.display());
        Self {
            kind: StreamErrorKind::Io,
            message: original.clone(),
            message_formatted: format!("{relative_path}\n{original}"),
            message_original: original,
            file: source.to_path_buf(),
            relative_path,
            line: None,
            column: None,
        }
    }

    /// Classification.
    pub fn kind(&self) -> StreamErrorKind {
        self.kind
    }

    /// Human-readable message, including the location when known.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The compiler's raw message, unmodified.
    pub fn message_original(&self) -> &str {
        &self.message_original
    }

    /// Multi-line rendering: relative path, then the compiler's own
    /// diagnostic. Used by [`LogError`](super::LogError).
    pub fn message_formatted(&self) -> &str {
        &self.message_formatted
    }

    /// File the error points at (the unit itself, or an imported file).
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Unit path relative to the working directory, `/`-separated.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// 1-based line, if known.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// 1-based column, if known.
    pub fn column(&self) -> Option<usize> {
        self.column
    }
}

/// `unit_path` relative to `cwd`, `/`-separated. Relative unit paths are
/// taken to be relative to `cwd`.
fn display_path(unit_path: &Path, cwd: &Path) -> String {
    let cwd = absolute_from_process(cwd);
    relative_slash(&absolute(unit_path, &cwd), &cwd)
}

/// Translate a compiler failure for `unit_path` into a [`StreamError`].
///
/// A failure without a file, or one attributed to the engine's `stdin`
/// pseudo-file, is attributed to the unit.
pub fn translate(failure: &CompileFailure, unit_path: &Path, cwd: &Path) -> StreamError {
    let file = match failure.file.as_deref() {
        Some(file) if file != Path::new("stdin") && !file.as_os_str().is_empty() => file.to_path_buf(),
        _ => unit_path.to_path_buf(),
    };
    let relative_path = display_path(unit_path, cwd);

    let message = match failure.line {
        Some(line) => format!("{} on line {line} of {}", failure.message, file.display()),
        None => failure.message.clone(),
    };

    let detail = match (&failure.formatted, failure.line, failure.column) {
        (Some(formatted), _, _) => formatted.clone(),
        (None, Some(line), Some(column)) => {
            format!("{}\n  --> {}:{line}:{column}", failure.message, file.display())
        }
        (None, _, _) => message.clone(),
    };

    StreamError {
        kind: StreamErrorKind::Compile,
        message,
        message_original: failure.message.clone(),
        message_formatted: format!("{relative_path}\n{detail}"),
        file,
        relative_path,
        line: failure.line,
        column: failure.column,
    }
}
