//! [`Compiler`] backed by the `grass` crate.
//!
//! grass does not report which files it read, so every compilation goes
//! through a [`RecordingFs`] that remembers the order of successful reads.
//! That order becomes `stats.included_files`.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use super::{CompileFailure, CompileOptions, CompileOutput, CompileStats, Compiler, RenderResult};
use crate::config::OutputStyle;
use crate::path::absolute_from_process;

/// File name grass gives to string input.
const STDIN: &str = "stdin";

/// Sass engine using [grass](https://docs.rs/grass).
///
/// Compiles the in-memory source text, so edits made by earlier pipeline
/// stages are honored. Relative imports resolve next to the unit first, then
/// against `include_paths`. grass does
/// not emit source maps; `CompileOutput::map` is always `None` and the
/// reconciler works from the carried map.
///
/// Output styles grass lacks map to the nearest one it has: `Nested` and
/// `Compact` render as `Expanded`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrassCompiler;

impl GrassCompiler {
    /// Create the compiler.
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for GrassCompiler {
    fn render(&self, options: &CompileOptions) -> RenderResult {
        let started = Instant::now();
        let fs = RecordingFs::new(&options.file, options.data.as_bytes());

        let syntax = if options.indented_syntax {
            ::grass::InputSyntax::Sass
        } else {
            ::grass::InputSyntax::Scss
        };

        // Compiling from the unit's path (served from memory) lets relative
        // imports resolve next to the unit before the load paths.
        let css = {
            let grass_options = ::grass::Options::default()
                .fs(&fs)
                .style(grass_style(options.output_style))
                .input_syntax(syntax)
                .load_paths(options.include_paths.as_slice())
                .quiet(true);
            ::grass::from_path(&options.file, &grass_options)
        }
        .map_err(|err| failure_from_grass(err, &options.file))?;

        let mut included_files = vec![options.file.clone()];
        included_files.extend(fs.into_reads());

        Ok(CompileOutput::new(
            css,
            CompileStats {
                entry: options.file.clone(),
                included_files,
                duration: started.elapsed(),
            },
        ))
    }
}

fn grass_style(style: OutputStyle) -> ::grass::OutputStyle {
    match style {
        OutputStyle::Compressed => ::grass::OutputStyle::Compressed,
        OutputStyle::Expanded => ::grass::OutputStyle::Expanded,
        OutputStyle::Nested | OutputStyle::Compact => {
            tracing::debug!(requested = ?style, "output style unsupported by grass, using expanded");
            ::grass::OutputStyle::Expanded
        }
    }
}

fn failure_from_grass(err: Box<::grass::Error>, entry: &Path) -> CompileFailure {
    let formatted = err.to_string();
    match (*err).kind() {
        ::grass::ErrorKind::ParseError { message, loc, .. } => {
            let name = loc.file.name();
            let file = if name == STDIN || name.is_empty() {
                entry.to_path_buf()
            } else {
                PathBuf::from(name)
            };
            CompileFailure::new(message)
                .with_location(file, loc.begin.line + 1, loc.begin.column + 1)
                .with_formatted(formatted)
        }
        _ => {
            let message = formatted.strip_prefix("Error: ").unwrap_or(&formatted).to_owned();
            CompileFailure::new(message).with_file(entry).with_formatted(formatted)
        }
    }
}

// =============================================================================
// RecordingFs
// =============================================================================

/// File system that forwards to the real one and records every file read.
///
/// The entry file is served from memory, never from disk. Recorded paths are
/// absolute, resolved against the process working directory the way the OS
/// resolved them.
#[derive(Debug)]
struct RecordingFs {
    entry: PathBuf,
    source: Vec<u8>,
    reads: Mutex<Reads>,
}

#[derive(Debug, Default)]
struct Reads {
    order: Vec<PathBuf>,
    seen: FxHashSet<PathBuf>,
}

impl RecordingFs {
    fn new(entry: &Path, source: &[u8]) -> Self {
        Self {
            entry: absolute_from_process(entry),
            source: source.to_vec(),
            reads: Mutex::default(),
        }
    }

    fn is_entry(&self, path: &Path) -> bool {
        absolute_from_process(path) == self.entry
    }

    fn record(&self, path: &Path) {
        let path = absolute_from_process(path);
        let mut reads = self.reads.lock();
        if reads.seen.insert(path.clone()) {
            reads.order.push(path);
        }
    }

    fn into_reads(self) -> Vec<PathBuf> {
        self.reads.into_inner().order
    }
}

impl ::grass::Fs for RecordingFs {
    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        self.is_entry(path) || path.is_file()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        if self.is_entry(path) {
            return Ok(self.source.clone());
        }
        let bytes = std::fs::read(path)?;
        tracing::trace!(path = %path.display(), "import read");
        self.record(path);
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use tempfile::{Builder, TempDir};

    /// Directory under the process working directory, removed on drop.
    fn dir_in_process_cwd(prefix: &str) -> (TempDir, String) {
        let dir = Builder::new().prefix(prefix).tempdir_in(env::current_dir().unwrap()).unwrap();
        let name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
        (dir, name)
    }

    fn options(file: &Path, data: &str) -> CompileOptions {
        CompileOptions {
            data: data.to_owned(),
            file: file.to_path_buf(),
            include_paths: vec![file.parent().unwrap().to_path_buf()],
            source_map: false,
            source_map_contents: false,
            output_style: OutputStyle::Expanded,
            indented_syntax: false,
        }
    }

    #[test]
    fn test_compile_simple() {
        let output = GrassCompiler
            .render(&options(Path::new("/p/a.scss"), ".a{color:red}"))
            .unwrap();
        assert_eq!(output.css, ".a {\n  color: red;\n}\n");
        assert_eq!(output.stats.included_files, vec![PathBuf::from("/p/a.scss")]);
        assert!(output.map.is_none());
    }

    #[test]
    fn test_compile_empty() {
        let output = GrassCompiler.render(&options(Path::new("/p/empty.scss"), "")).unwrap();
        assert_eq!(output.css, "");
    }

    #[test]
    fn test_compile_compressed() {
        let mut opts = options(Path::new("/p/a.scss"), ".a { color: red; }");
        opts.output_style = OutputStyle::Compressed;
        let output = GrassCompiler.render(&opts).unwrap();
        assert_eq!(output.css.trim_end(), ".a{color:red}");
    }

    #[test]
    fn test_compile_indented() {
        let mut opts = options(Path::new("/p/indent.sass"), ".a\n  color: red\n");
        opts.indented_syntax = true;
        let output = GrassCompiler.render(&opts).unwrap();
        assert!(output.css.contains("color: red;"));
    }

    #[test]
    fn test_records_imports_in_order() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("includes")).unwrap();
        fs::write(dir.path().join("includes/_cats.scss"), ".cat { color: white; }\n").unwrap();
        fs::write(dir.path().join("includes/_dogs.scss"), ".dog { color: black; }\n").unwrap();
        let entry = dir.path().join("inheritance.scss");
        let source = "@import 'includes/cats';\n@import 'includes/dogs';\n";
        fs::write(&entry, source).unwrap();

        let output = GrassCompiler.render(&options(&entry, source)).unwrap();
        let included = output.stats.included_files;

        assert_eq!(included.len(), 3);
        assert_eq!(included[0], entry);
        assert!(included[1].ends_with("includes/_cats.scss"));
        assert!(included[2].ends_with("includes/_dogs.scss"));
        assert!(output.css.contains(".cat"));
        assert!(output.css.contains(".dog"));
    }

    #[test]
    fn test_parse_error_location() {
        let file = Path::new("/p/error.scss");
        let err = GrassCompiler
            .render(&options(file, "a {\n  color: $undefined;\n}\n"))
            .unwrap_err();

        assert_eq!(err.line, Some(2));
        assert_eq!(err.file.as_deref(), Some(file));
        assert!(err.message.contains("Undefined variable"));
        assert!(err.formatted.is_some());
    }

    #[test]
    fn test_sibling_import_beats_process_cwd() {
        let (decoy, name) = dir_in_process_cwd("decoy");
        fs::write(decoy.path().join("_x.scss"), ".decoy { color: black; }\n").unwrap();

        let dir = TempDir::new().unwrap();
        let scss = dir.path().join("scss");
        fs::create_dir_all(scss.join(&name)).unwrap();
        fs::write(scss.join(&name).join("_x.scss"), ".real { color: red; }\n").unwrap();

        let entry = scss.join("main.scss");
        let output = GrassCompiler.render(&options(&entry, &format!("@import '{name}/x';\n"))).unwrap();

        assert!(output.css.contains(".real"));
        assert!(!output.css.contains(".decoy"));
        assert_eq!(output.stats.included_files[1], scss.join(&name).join("_x.scss"));
    }

    #[test]
    fn test_entry_served_from_memory() {
        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("main.scss");
        fs::write(&entry, ".disk { color: red; }\n").unwrap();

        let output = GrassCompiler.render(&options(&entry, ".memory { color: red; }\n")).unwrap();
        assert!(output.css.contains(".memory"));
        assert_eq!(output.stats.included_files, vec![entry]);
    }

    #[test]
    fn test_relative_include_path_recorded_absolute() {
        let (vendor, name) = dir_in_process_cwd("vendor");
        fs::write(vendor.path().join("_v.scss"), ".v { color: blue; }\n").unwrap();

        let dir = TempDir::new().unwrap();
        let entry = dir.path().join("main.scss");
        let mut opts = options(&entry, "@import 'v';\n");
        opts.include_paths.push(PathBuf::from(&name));

        let output = GrassCompiler.render(&opts).unwrap();
        let expected = env::current_dir().unwrap().join(&name).join("_v.scss");
        assert_eq!(output.stats.included_files, vec![entry, expected]);
    }

    #[test]
    fn test_unsupported_styles_fall_back_to_expanded() {
        assert!(matches!(grass_style(OutputStyle::Nested), ::grass::OutputStyle::Expanded));
        assert!(matches!(grass_style(OutputStyle::Compact), ::grass::OutputStyle::Expanded));
        assert!(matches!(grass_style(OutputStyle::Compressed), ::grass::OutputStyle::Compressed));
    }
}
