//! Stream errors and how they are reported.

mod error;
mod report;

pub use error::{translate, StreamError, StreamErrorKind, PLUGIN_NAME, STREAMING_NOT_SUPPORTED};
pub use report::{format_report, ErrorHook, LogError};
