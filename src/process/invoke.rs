//! Compile invocation: options per unit, sync and async calls.

use std::path::{Path, PathBuf};
#[cfg(feature = "async")]
use std::sync::Arc;

use crate::compiler::{render_guarded, CompileOptions, Compiler, RenderResult};
#[cfg(feature = "async")]
use crate::compiler::RenderCallback;
use crate::config::Options;
use crate::unit::Unit;

/// Build the compiler options for one unit.
///
/// - `data` is the unit's contents decoded as UTF-8 (invalid sequences are
///   replaced), or empty for a placeholder.
/// - `include_paths` is the unit's own directory followed by the configured
///   paths, so relative imports resolve next to the unit first.
/// - `source_map` is on exactly when the unit carries a source map.
pub fn compile_options<U: Unit + ?Sized>(unit: &U, options: &Options) -> CompileOptions {
    let file = unit.path().to_path_buf();
    let data = unit
        .contents()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default();

    let mut include_paths = Vec::with_capacity(options.include_paths.len() + 1);
    include_paths.push(own_directory(&file));
    include_paths.extend(options.include_paths.iter().cloned());

    let compile = CompileOptions {
        indented_syntax: options.is_indented(&file),
        data,
        file,
        include_paths,
        source_map: unit.source_map().is_some(),
        source_map_contents: options.source_map_contents,
        output_style: options.output_style,
    };
    tracing::trace!(
        file = %compile.file.display(),
        include_paths = ?compile.include_paths,
        source_map = compile.source_map,
        "compile options"
    );
    compile
}

fn own_directory(file: &Path) -> PathBuf {
    match file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Compile synchronously.
pub fn invoke(compiler: &dyn Compiler, options: &CompileOptions) -> RenderResult {
    with_fallback_line(render_guarded(compiler, options))
}

/// Compile on the compiler's asynchronous entry point; `done` runs once with
/// the result.
#[cfg(feature = "async")]
pub fn invoke_async<F>(compiler: Arc<dyn Compiler>, options: CompileOptions, done: F)
where
    F: FnOnce(RenderResult) + Send + 'static,
{
    let done: RenderCallback = Box::new(move |result| done(with_fallback_line(result)));
    compiler.render_async(options, done);
}

/// Failures without a line point at the unit's first line.
fn with_fallback_line(result: RenderResult) -> RenderResult {
    result.map_err(|mut failure| {
        failure.line.get_or_insert(1);
        failure
    })
}
