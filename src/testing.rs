//! Test doubles.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::compiler::{CompileFailure, CompileOptions, CompileOutput, CompileStats, Compiler, RenderResult};
use crate::sourcemap::SourceMap;

enum Outcome {
    Css {
        css: String,
        imports: Vec<PathBuf>,
        map: Option<SourceMap>,
    },
    Fail(CompileFailure),
}

#[derive(Default)]
struct Script {
    outcome: Option<Outcome>,
    delay: Duration,
}

/// Compiler with canned answers keyed by file name.
///
/// Unscripted files echo their source text back as CSS.
#[derive(Default)]
pub(crate) struct ScriptedCompiler {
    scripts: FxHashMap<String, Script>,
    calls: Mutex<Vec<CompileOptions>>,
}

impl ScriptedCompiler {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn script(&mut self, name: &str) -> &mut Script {
        self.scripts.entry(name.to_owned()).or_default()
    }

    pub(crate) fn css(self, name: &str, css: &str) -> Self {
        self.imports(name, css, &[])
    }

    pub(crate) fn imports(mut self, name: &str, css: &str, imports: &[&Path]) -> Self {
        self.script(name).outcome = Some(Outcome::Css {
            css: css.to_owned(),
            imports: imports.iter().map(|p| p.to_path_buf()).collect(),
            map: None,
        });
        self
    }

    pub(crate) fn map(mut self, name: &str, css: &str, imports: &[&Path], map: SourceMap) -> Self {
        self.script(name).outcome = Some(Outcome::Css {
            css: css.to_owned(),
            imports: imports.iter().map(|p| p.to_path_buf()).collect(),
            map: Some(map),
        });
        self
    }

    pub(crate) fn fail(mut self, name: &str, failure: CompileFailure) -> Self {
        self.script(name).outcome = Some(Outcome::Fail(failure));
        self
    }

    pub(crate) fn delay(mut self, name: &str, delay: Duration) -> Self {
        self.script(name).delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> Vec<CompileOptions> {
        self.calls.lock().clone()
    }
}

impl Compiler for ScriptedCompiler {
    fn render(&self, options: &CompileOptions) -> RenderResult {
        self.calls.lock().push(options.clone());

        let name = options
            .file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let script = self.scripts.get(&name);

        if let Some(delay) = script.map(|s| s.delay).filter(|d| !d.is_zero()) {
            thread::sleep(delay);
        }

        let stats = |imports: &[PathBuf]| CompileStats {
            entry: options.file.clone(),
            included_files: std::iter::once(options.file.clone()).chain(imports.iter().cloned()).collect(),
            duration: Duration::ZERO,
        };

        match script.and_then(|s| s.outcome.as_ref()) {
            Some(Outcome::Fail(failure)) => Err(failure.clone()),
            Some(Outcome::Css { css, imports, map }) => {
                let output = CompileOutput::new(css.clone(), stats(imports));
                Ok(match map {
                    Some(map) => output.with_map(map.clone()),
                    None => output,
                })
            }
            None => Ok(CompileOutput::new(options.data.clone(), stats(&[]))),
        }
    }
}
