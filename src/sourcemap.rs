//! Source-map state carried on units, and its reconciliation after a compile.
//!
//! Upstream pipeline stages attach a [`SourceMap`] to a unit to ask for maps.
//! Before compilation that map usually lists a single synthetic source; after
//! compilation [`reconcile`] rewrites `sources` to the files the compiler
//! actually consumed, relative to the unit's base directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagnostic::StreamError;
use crate::path::{absolute, absolute_from_process, relative_slash, same_path};

/// A version 3 source map.
///
/// Fields the adapter does not interpret (`mappings`, `names`, unknown keys)
/// are carried through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Format version, always 3 in practice.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Generated file the map describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Prefix applied to every entry of `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    /// Contributing source files.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Inline contents, parallel to `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    /// Symbol names referenced by `mappings`.
    #[serde(default)]
    pub names: Vec<String>,
    /// VLQ-encoded mappings.
    #[serde(default)]
    pub mappings: String,
    /// Any other keys, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_version() -> u32 {
    3
}

impl Default for SourceMap {
    fn default() -> Self {
        Self {
            version: default_version(),
            file: None,
            source_root: None,
            sources: Vec::new(),
            sources_content: None,
            names: Vec::new(),
            mappings: String::new(),
            extra: serde_json::Map::new(),
        }
    }
}

impl SourceMap {
    /// The map an upstream "init" stage attaches: one source, empty mappings.
    pub fn identity(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            file: Some(source.clone()),
            sources: vec![source],
            ..Self::default()
        }
    }

    /// Parse from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON text.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Inputs to [`reconcile`] describing the unit being compiled.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    /// The unit's path at compile time (the entry file).
    pub entry: &'a Path,
    /// The unit's in-memory source text. Used instead of the disk copy for
    /// the entry so in-stream edits show up in `sourcesContent`.
    pub entry_contents: &'a str,
    /// The unit's path after compilation (`.css` extension).
    pub output: &'a Path,
    /// The unit's base directory. `sources` are made relative to it.
    pub base: &'a Path,
    /// Working directory, for error attribution.
    pub cwd: &'a Path,
    /// Populate `sourcesContent` even if no map carried it.
    pub inline_contents: bool,
}

/// Rewrite a unit's source map after compilation.
///
/// - The result starts from the compiler's map when there is one, otherwise
///   from the map the unit carried. `version`, `mappings`, `names` and
///   unknown keys are left as they are.
/// - `sources` becomes `included`, relative to `base`; an empty `included`
///   means the entry alone. The compiler's list wins over whatever sources
///   the carried map had.
/// - `file` becomes the relative output path.
/// - `sourcesContent` is filled in `sources` order when either map already
///   had it, or when `inline_contents` is set.
pub fn reconcile(
    carried: SourceMap,
    compiled: Option<SourceMap>,
    included: &[PathBuf],
    ctx: &ReconcileContext<'_>,
) -> Result<SourceMap, StreamError> {
    let wants_contents = ctx.inline_contents
        || carried.sources_content.is_some()
        || compiled.as_ref().is_some_and(|m| m.sources_content.is_some());

    let mut map = compiled.unwrap_or(carried);

    // Relative paths (unit paths, relative include paths) are taken to be
    // relative to the working directory.
    let cwd = absolute_from_process(ctx.cwd);
    let base = absolute(ctx.base, &cwd);
    let consumed: Vec<PathBuf> = if included.is_empty() {
        vec![absolute(ctx.entry, &cwd)]
    } else {
        included.iter().map(|p| absolute(p, &cwd)).collect()
    };

    map.sources = consumed.iter().map(|p| relative_slash(p, &base)).collect();
    map.file = Some(relative_slash(&absolute(ctx.output, &cwd), &base));
    tracing::trace!(entry = %ctx.entry.display(), sources = ?map.sources, "reconciled source map");

    if wants_contents {
        let contents = consumed
            .iter()
            .map(|source| read_source(source, &cwd, ctx).map(Some))
            .collect::<Result<Vec<_>, _>>()?;
        map.sources_content = Some(contents);
    }

    Ok(map)
}

fn read_source(source: &Path, cwd: &Path, ctx: &ReconcileContext<'_>) -> Result<String, StreamError> {
    if same_path(source, &absolute(ctx.entry, cwd)) {
        return Ok(ctx.entry_contents.to_owned());
    }
    fs::read_to_string(source).map_err(|err| StreamError::io(source, &err, ctx.entry, ctx.cwd))
}
