//! # sass-stream
//!
//! Sass compilation as a stage of a file-processing pipeline.
//!
//! Units (virtual files with a path, base directory, contents and an
//! optional source map) are written into a transform. Each one comes out the
//! other side as an [`Event`]:
//!
//! - **Data**: the unit compiled to CSS with its extension changed to `.css`,
//!   or the unit unchanged if there was nothing to compile
//! - **Error**: a [`StreamError`] naming the file and line that failed
//! - **End**: every unit written before `end()` has been emitted
//!
//! Units that carry a source map get it rewritten so `sources` lists every
//! file the compiler consumed, relative to the unit's base.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sass_stream::prelude::*;
//!
//! let (stream, events) = Sass::default()
//!     .with_options(Options::builder().include_path("node_modules").build())
//!     .into_sync();
//!
//! stream.write(VirtualFile::from_disk("scss", "scss/site.scss")?);
//! stream.end();
//!
//! for event in events {
//!     match event {
//!         Event::Data(file) => std::fs::write(file.path(), file.contents().unwrap_or_default())?,
//!         Event::Error(err) => eprintln!("{}", err.message_formatted()),
//!         Event::End => {}
//!     }
//! }
//! ```
//!
//! ## Modules
//!
//! - [`process`]: Filter, compile invoker, result mapper and the transforms
//! - [`compiler`]: The [`Compiler`] boundary and the grass backend
//! - [`sourcemap`]: Source map model and reconciliation
//! - [`diagnostic`]: Error translation and reporting hooks
//! - [`unit`]: The [`Unit`] contract and [`VirtualFile`]
//! - [`config`]: Stream options
//!
//! ## Features
//!
//! - `grass` (default): [`GrassCompiler`] and `Sass::default()`
//! - `async` (default): [`AsyncTransform`], compiling on the rayon pool
//! - `colored-diagnostics` (default): ANSI colors in [`LogError`] reports

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod compiler;
pub mod config;
pub mod diagnostic;
pub mod path;
pub mod process;
pub mod sourcemap;
pub mod unit;

#[cfg(test)]
mod testing;

// =============================================================================
// Prelude - import commonly used items with a single `use`
// =============================================================================

/// Prelude module for convenient imports.
///
/// ```ignore
/// use sass_stream::prelude::*;
/// ```
pub mod prelude {
    // Streams
    #[cfg(feature = "async")]
    pub use crate::AsyncTransform;
    pub use crate::{Event, Events, Sass, SyncTransform, Transform};

    // Units
    pub use crate::{SourceMap, Unit, VirtualFile};

    // Configuration
    pub use crate::{Options, OutputStyle};

    // Errors
    pub use crate::{ErrorHook, LogError, StreamError, StreamErrorKind};
}

// =============================================================================
// Streams
// =============================================================================

#[cfg(feature = "async")]
pub use process::AsyncTransform;
pub use process::{Event, Events, Sass, SyncTransform, Transform};

// =============================================================================
// Units
// =============================================================================

pub use sourcemap::SourceMap;
pub use unit::{Contents, Unit, VirtualFile};

// =============================================================================
// Compiler
// =============================================================================

#[cfg(feature = "grass")]
pub use compiler::GrassCompiler;
pub use compiler::{
    CompileFailure, CompileOptions, CompileOutput, CompileStats, Compiler, RenderCallback,
    RenderResult,
};

// =============================================================================
// Infrastructure
// =============================================================================

pub use config::{Options, OptionsBuilder, OutputStyle};
pub use diagnostic::{ErrorHook, LogError, StreamError, StreamErrorKind, PLUGIN_NAME};
