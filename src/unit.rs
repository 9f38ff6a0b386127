//! Units: the file-like values flowing through a stream.
//!
//! The adapter only needs a handful of capabilities from a unit, captured by
//! the [`Unit`] trait. [`VirtualFile`] is the bundled implementation; hosts
//! with their own file type implement the trait instead.

use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::path::relative_to;
use crate::sourcemap::SourceMap;

// =============================================================================
// Unit Trait
// =============================================================================

/// Capabilities the stream adapter requires from a unit.
///
/// A unit is owned by exactly one task while it is processed, so mutation
/// goes through `&mut self` and no interior locking is needed.
pub trait Unit: Send + 'static {
    /// Absolute path; the unit's identity.
    fn path(&self) -> &Path;

    /// Replace the path.
    fn set_path(&mut self, path: PathBuf);

    /// Base directory the unit's relative path is computed from.
    fn base(&self) -> &Path;

    /// Buffered contents. `None` for placeholder and streaming units.
    fn contents(&self) -> Option<&[u8]>;

    /// Replace the contents with a buffer.
    fn set_contents(&mut self, contents: Vec<u8>);

    /// Carried source map, if an upstream stage asked for one.
    fn source_map(&self) -> Option<&SourceMap>;

    /// Attach or replace the carried source map.
    fn set_source_map(&mut self, map: SourceMap);

    /// Refers to a directory.
    fn is_directory(&self) -> bool;

    /// Placeholder without contents.
    fn is_null(&self) -> bool;

    /// Contents are a live byte stream.
    fn is_stream(&self) -> bool;

    /// Contents are an in-memory buffer.
    fn is_buffer(&self) -> bool {
        !self.is_null() && !self.is_stream()
    }

    /// Called after the contents were replaced by compiled output.
    fn touch(&mut self) {}
}

// =============================================================================
// VirtualFile
// =============================================================================

/// Contents of a [`VirtualFile`].
pub enum Contents {
    /// No contents.
    Null,
    /// In-memory bytes.
    Buffer(Vec<u8>),
    /// Live byte stream.
    Stream(Box<dyn Read + Send>),
}

impl fmt::Debug for Contents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Buffer(bytes) => write!(f, "Buffer({} bytes)", bytes.len()),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// An in-memory file with a base directory and optional source map.
///
/// # Example
///
/// ```ignore
/// let file = VirtualFile::new("/site/scss", "/site/scss/main.scss", ".a{color:red}")
///     .with_source_map(SourceMap::identity("main.scss"));
/// assert_eq!(file.relative(), Path::new("main.scss"));
/// ```
#[derive(Debug)]
pub struct VirtualFile {
    base: PathBuf,
    path: PathBuf,
    contents: Contents,
    source_map: Option<SourceMap>,
    directory: bool,
    modified: Option<DateTime<Local>>,
}

impl VirtualFile {
    /// Create a buffered file.
    pub fn new(base: impl Into<PathBuf>, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self::with_contents(base, path, Contents::Buffer(contents.into()))
    }

    /// Create a placeholder without contents.
    pub fn null(base: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self::with_contents(base, path, Contents::Null)
    }

    /// Create a directory reference.
    pub fn directory(base: impl Into<PathBuf>, path: impl Into<PathBuf>) -> Self {
        Self {
            directory: true,
            ..Self::with_contents(base, path, Contents::Null)
        }
    }

    /// Create a file whose contents are a live stream.
    pub fn stream(base: impl Into<PathBuf>, path: impl Into<PathBuf>, reader: impl Read + Send + 'static) -> Self {
        Self::with_contents(base, path, Contents::Stream(Box::new(reader)))
    }

    /// Read `path` from disk into a buffered file.
    pub fn from_disk(base: impl Into<PathBuf>, path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let bytes = fs::read(&path)?;
        let modified = fs::metadata(&path)?.modified().ok().map(DateTime::<Local>::from);
        Ok(Self {
            modified,
            ..Self::new(base, path, bytes)
        })
    }

    fn with_contents(base: impl Into<PathBuf>, path: impl Into<PathBuf>, contents: Contents) -> Self {
        Self {
            base: base.into(),
            path: path.into(),
            contents,
            source_map: None,
            directory: false,
            modified: None,
        }
    }

    /// Attach a source map.
    pub fn with_source_map(mut self, map: SourceMap) -> Self {
        self.source_map = Some(map);
        self
    }

    /// Path relative to the base directory.
    pub fn relative(&self) -> PathBuf {
        relative_to(&self.path, &self.base)
    }

    /// Raw contents.
    pub fn raw_contents(&self) -> &Contents {
        &self.contents
    }

    /// Take the contents, leaving a placeholder.
    pub fn take_contents(&mut self) -> Contents {
        std::mem::replace(&mut self.contents, Contents::Null)
    }

    /// Last modification time, if known.
    pub fn modified(&self) -> Option<DateTime<Local>> {
        self.modified
    }
}

impl Unit for VirtualFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn set_path(&mut self, path: PathBuf) {
        self.path = path;
    }

    fn base(&self) -> &Path {
        &self.base
    }

    fn contents(&self) -> Option<&[u8]> {
        match &self.contents {
            Contents::Buffer(bytes) => Some(bytes.as_slice()),
            Contents::Null | Contents::Stream(_) => None,
        }
    }

    fn set_contents(&mut self, contents: Vec<u8>) {
        self.contents = Contents::Buffer(contents);
    }

    fn source_map(&self) -> Option<&SourceMap> {
        self.source_map.as_ref()
    }

    fn set_source_map(&mut self, map: SourceMap) {
        self.source_map = Some(map);
    }

    fn is_directory(&self) -> bool {
        self.directory
    }

    fn is_null(&self) -> bool {
        matches!(self.contents, Contents::Null)
    }

    fn is_stream(&self) -> bool {
        matches!(self.contents, Contents::Stream(_))
    }

    fn touch(&mut self) {
        self.modified = Some(Local::now());
    }
}
