//! Applying a compile result to its unit.

use std::path::PathBuf;

use crate::compiler::{CompileOutput, RenderResult};
use crate::config::Options;
use crate::diagnostic::{translate, StreamError};
use crate::path::replace_extension;
use crate::sourcemap::{reconcile, ReconcileContext};
use crate::unit::Unit;

/// Extension of compiled units.
pub const CSS_EXTENSION: &str = "css";

/// Rewrite `unit` with a successful compilation.
///
/// Contents become the CSS, the path's extension becomes `.css` (directory
/// and base are kept), and a carried source map is reconciled. Nothing is
/// mutated if reconciliation fails.
pub fn apply<U: Unit + ?Sized>(unit: &mut U, output: &CompileOutput, options: &Options) -> Result<(), StreamError> {
    let target = output_path(unit);

    let map = match unit.source_map() {
        Some(carried) => {
            let entry = if output.stats.entry.as_os_str().is_empty() {
                unit.path().to_path_buf()
            } else {
                output.stats.entry.clone()
            };
            let entry_contents = unit.contents().map(String::from_utf8_lossy).unwrap_or_default();
            let ctx = ReconcileContext {
                entry: &entry,
                entry_contents: &entry_contents,
                output: &target,
                base: unit.base(),
                cwd: &options.cwd,
                inline_contents: options.source_map_contents,
            };
            Some(reconcile(carried.clone(), output.map.clone(), &output.stats.included_files, &ctx)?)
        }
        None => None,
    };

    if let Some(map) = map {
        unit.set_source_map(map);
    }
    unit.set_contents(output.css.as_bytes().to_vec());
    unit.set_path(target);
    unit.touch();
    Ok(())
}

/// Turn a render result into the unit to emit or the error to report.
pub fn finish<U: Unit>(mut unit: U, result: RenderResult, options: &Options) -> Result<U, StreamError> {
    match result {
        Ok(output) => {
            apply(&mut unit, &output, options)?;
            tracing::debug!(
                path = %unit.path().display(),
                duration = ?output.stats.duration,
                included = output.stats.included_files.len(),
                "compiled"
            );
            Ok(unit)
        }
        Err(failure) => {
            let error = translate(&failure, unit.path(), &options.cwd);
            tracing::debug!(path = %unit.path().display(), error = %error, "compile failed");
            Err(error)
        }
    }
}

/// Path a unit will have after compilation.
pub fn output_path<U: Unit + ?Sized>(unit: &U) -> PathBuf {
    replace_extension(unit.path(), CSS_EXTENSION)
}
