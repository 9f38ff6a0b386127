//! Unit processing pipeline.
//!
//! - [`filter`] - Decide whether a unit passes through, is rejected or compiles
//! - [`invoke`] - Build compiler options and call the compiler
//! - [`mapper`] - Apply a compile result back onto the unit
//! - [`stream`] - Sync and async transforms tying the stages together

pub mod filter;
pub mod invoke;
pub mod mapper;
pub mod stream;

pub use filter::{classify, Filter};
pub use invoke::{compile_options, invoke};
#[cfg(feature = "async")]
pub use invoke::invoke_async;
pub use mapper::{apply, finish, output_path, CSS_EXTENSION};
#[cfg(feature = "async")]
pub use stream::AsyncTransform;
pub use stream::{Event, Events, Sass, SyncTransform, Transform};
