//! Path utilities.
//!
//! All helpers here are lexical: they never touch the file system, so the
//! results depend only on their arguments (the working directory is always
//! passed in explicitly).

use std::env;
use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;

/// Normalize a path lexically.
///
/// Drops `.` components and folds `..` into the preceding normal component.
/// Leading `..` components of a relative path are kept; `..` directly under
/// the root is discarded. A path that cleans away entirely becomes `.`.
#[inline]
pub fn normalize(path: &Path) -> PathBuf {
    path.clean()
}

/// Resolve `path` against `cwd` and normalize it.
pub fn absolute(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.clean()
    } else {
        cwd.join(path).clean()
    }
}

/// Resolve `path` against the process working directory.
///
/// Falls back to the normalized path when the working directory is gone.
pub fn absolute_from_process(path: &Path) -> PathBuf {
    match env::current_dir() {
        Ok(cwd) => absolute(path, &cwd),
        Err(_) => normalize(path),
    }
}

/// Compute `path` relative to `base`.
///
/// Both paths are normalized first and must both be absolute or both be
/// relative; resolve them with [`absolute`] otherwise. When `path` is not
/// below `base`, the result climbs out with `..` components. Equal paths
/// yield an empty path.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path = normalize(path);
    let base = normalize(base);

    let mut target = path.components().peekable();
    let mut from = base.components().peekable();
    while let (Some(a), Some(b)) = (target.peek(), from.peek()) {
        if a != b {
            break;
        }
        target.next();
        from.next();
    }

    let mut out = PathBuf::new();
    for _ in from {
        out.push("..");
    }
    for component in target {
        out.push(component.as_os_str());
    }
    out
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::RootDir => parts.push(String::new()),
            Component::Prefix(prefix) => parts.push(prefix.as_os_str().to_string_lossy().into_owned()),
            other => parts.push(other.as_os_str().to_string_lossy().into_owned()),
        }
    }
    if parts.len() == 1 && parts[0].is_empty() {
        return "/".to_owned();
    }
    parts.join("/")
}

/// `relative_to` followed by `to_slash`.
#[inline]
pub fn relative_slash(path: &Path, base: &Path) -> String {
    to_slash(&relative_to(path, base))
}

/// Replace the extension of the final path component.
///
/// Paths without an extension get one appended.
#[inline]
pub fn replace_extension(path: &Path, extension: &str) -> PathBuf {
    path.with_extension(extension)
}

/// Whether two paths name the same file after lexical normalization.
#[inline]
pub fn same_path(a: &Path, b: &Path) -> bool {
    normalize(a) == normalize(b)
}
