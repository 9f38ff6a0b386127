//! Unit classification.

use crate::unit::Unit;

/// What the stream does with a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// Forward unchanged.
    PassThrough,
    /// Streaming contents; emit "Streaming not supported".
    Unsupported,
    /// Hand to the compiler.
    Compile,
}

/// Classify a unit.
///
/// Directories pass through, as do placeholders that carry no source map.
/// A placeholder *with* a source map is compiled as empty text so the map is
/// still reconciled and an output file is still produced.
pub fn classify<U: Unit + ?Sized>(unit: &U) -> Filter {
    if unit.is_directory() {
        return Filter::PassThrough;
    }
    if unit.is_null() && unit.source_map().is_none() {
        return Filter::PassThrough;
    }
    if unit.is_stream() {
        return Filter::Unsupported;
    }
    Filter::Compile
}
