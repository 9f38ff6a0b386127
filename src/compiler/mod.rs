//! Compiler boundary.
//!
//! The stream adapter never parses Sass itself. It talks to an engine through
//! the [`Compiler`] trait: hand it a [`CompileOptions`], get back either a
//! [`CompileOutput`] or a [`CompileFailure`]. Failures are values, never
//! panics; [`render_guarded`] converts an engine panic into a failure so a
//! misbehaving engine cannot take the stream down.
//!
//! With the `grass` feature (default) the crate ships [`GrassCompiler`].

#[cfg(feature = "grass")]
mod grass;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::OutputStyle;
use crate::sourcemap::SourceMap;

#[cfg(feature = "grass")]
pub use self::grass::GrassCompiler;

/// Outcome of a single render call.
pub type RenderResult = Result<CompileOutput, CompileFailure>;

/// Continuation invoked exactly once when an asynchronous render finishes.
pub type RenderCallback = Box<dyn FnOnce(RenderResult) + Send + 'static>;

// =============================================================================
// Options
// =============================================================================

/// Per-invocation compiler options.
///
/// Built fresh for every unit by the compile invoker; see
/// [`compile_options`](crate::process::compile_options).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Source text of the unit (empty for placeholder units).
    pub data: String,
    /// Path of the unit being compiled; used for diagnostics and as the
    /// entry of the consumed-file list.
    pub file: PathBuf,
    /// Directories searched for imports. The unit's own directory is always
    /// first.
    pub include_paths: Vec<PathBuf>,
    /// Whether a source map should be produced.
    pub source_map: bool,
    /// Whether the produced source map should embed `sourcesContent`.
    pub source_map_contents: bool,
    /// Output formatting style, forwarded verbatim.
    pub output_style: OutputStyle,
    /// Parse with the indented (`.sass`) syntax.
    pub indented_syntax: bool,
}

// =============================================================================
// Results
// =============================================================================

/// Bookkeeping reported by the compiler alongside the CSS.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileStats {
    /// The entry file (the unit's path).
    pub entry: PathBuf,
    /// Every file consumed while compiling, entry first, then imports in the
    /// order they were read.
    pub included_files: Vec<PathBuf>,
    /// Wall-clock time spent in the engine.
    pub duration: Duration,
}

/// Successful compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    /// Compiled CSS text.
    pub css: String,
    /// Consumed files and timing.
    pub stats: CompileStats,
    /// Raw source map, when the engine produced one.
    pub map: Option<SourceMap>,
}

impl CompileOutput {
    /// Create an output without a source map.
    pub fn new(css: impl Into<String>, stats: CompileStats) -> Self {
        Self {
            css: css.into(),
            stats,
            map: None,
        }
    }

    /// Attach a source map.
    pub fn with_map(mut self, map: SourceMap) -> Self {
        self.map = Some(map);
        self
    }
}

/// Compilation rejected by the engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct CompileFailure {
    /// Raw engine message, without location suffixes.
    pub message: String,
    /// The engine's own multi-line rendering (snippet, gutter), if any.
    pub formatted: Option<String>,
    /// File the error occurred in. `None` means the entry unit.
    pub file: Option<PathBuf>,
    /// 1-based line.
    pub line: Option<usize>,
    /// 1-based column.
    pub column: Option<usize>,
}

impl CompileFailure {
    /// Create a failure with a message and no location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            formatted: None,
            file: None,
            line: None,
            column: None,
        }
    }

    /// Set file, line and column.
    pub fn with_location(mut self, file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Set the file only.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Set the engine's formatted rendering.
    pub fn with_formatted(mut self, formatted: impl Into<String>) -> Self {
        self.formatted = Some(formatted.into());
        self
    }
}

// =============================================================================
// Compiler Trait
// =============================================================================

/// A stylesheet engine.
///
/// Implementors provide the synchronous [`render`](Compiler::render). The
/// asynchronous form defaults to running `render` on the rayon pool and
/// calling the continuation from there; engines with their own async entry
/// point can override it.
///
/// # Example
///
/// ```ignore
/// struct Echo;
///
/// impl Compiler for Echo {
///     fn render(&self, options: &CompileOptions) -> RenderResult {
///         let stats = CompileStats {
///             entry: options.file.clone(),
///             included_files: vec![options.file.clone()],
///             ..Default::default()
///         };
///         Ok(CompileOutput::new(options.data.clone(), stats))
///     }
/// }
/// ```
pub trait Compiler: Send + Sync + 'static {
    /// Compile one unit and block until done.
    fn render(&self, options: &CompileOptions) -> RenderResult;

    /// Compile one unit without blocking the caller.
    ///
    /// `done` must be called exactly once.
    #[cfg(feature = "async")]
    fn render_async(self: std::sync::Arc<Self>, options: CompileOptions, done: RenderCallback) {
        rayon::spawn(move || done(render_guarded(&*self, &options)));
    }
}

/// Call [`Compiler::render`], turning an engine panic into a [`CompileFailure`].
pub fn render_guarded<C: Compiler + ?Sized>(compiler: &C, options: &CompileOptions) -> RenderResult {
    match panic::catch_unwind(AssertUnwindSafe(|| compiler.render(options))) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(file = %options.file.display(), %message, "compiler panicked");
            Err(CompileFailure::new(format!("compiler panicked: {message}")).with_file(options.file.clone()))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
