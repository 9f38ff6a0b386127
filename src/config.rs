//! Per-stream configuration.
//!
//! Use [`OptionsBuilder`] to assemble [`Options`]; they are handed to
//! [`Sass::with_options`](crate::Sass::with_options) and forwarded into every
//! [`CompileOptions`](crate::compiler::CompileOptions) the stream builds.

use std::path::{Path, PathBuf};

/// CSS output formatting style.
///
/// Forwarded verbatim to the compiler. Engines that do not know a style fall
/// back to the closest one they support.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OutputStyle {
    /// Nested rules indented by depth, closing braces on the last line.
    #[default]
    Nested,
    /// One declaration per line.
    Expanded,
    /// One rule per line.
    Compact,
    /// Minified.
    Compressed,
}

/// Options shared by every unit of one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Extra import directories, searched after the unit's own directory.
    pub include_paths: Vec<PathBuf>,
    /// Output formatting style.
    pub output_style: OutputStyle,
    /// Always embed `sourcesContent` in reconciled source maps.
    pub source_map_contents: bool,
    /// Force (or forbid) the indented syntax. `None` decides per unit from
    /// its `.sass` extension.
    pub indented_syntax: Option<bool>,
    /// Directory error paths are made relative to.
    pub cwd: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            include_paths: Vec::new(),
            output_style: OutputStyle::default(),
            source_map_contents: false,
            indented_syntax: None,
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl Options {
    /// Start a builder.
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::new()
    }

    /// Whether `path` should be parsed with the indented syntax.
    pub fn is_indented(&self, path: &Path) -> bool {
        self.indented_syntax
            .unwrap_or_else(|| path.extension().is_some_and(|ext| ext == "sass"))
    }
}

/// Builder for [`Options`].
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    include_paths: Vec<PathBuf>,
    output_style: Option<OutputStyle>,
    source_map_contents: bool,
    indented_syntax: Option<bool>,
    cwd: Option<PathBuf>,
}

impl OptionsBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one include path.
    pub fn include_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.include_paths.push(path.into());
        self
    }

    /// Append several include paths, keeping their order.
    pub fn include_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.include_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Set the output style.
    ///
    /// Default: [`OutputStyle::Nested`]
    pub fn output_style(mut self, style: OutputStyle) -> Self {
        self.output_style = Some(style);
        self
    }

    /// Always embed `sourcesContent` in reconciled source maps.
    pub fn source_map_contents(mut self, enabled: bool) -> Self {
        self.source_map_contents = enabled;
        self
    }

    /// Force the indented syntax on or off for every unit.
    pub fn indented_syntax(mut self, enabled: bool) -> Self {
        self.indented_syntax = Some(enabled);
        self
    }

    /// Set the working directory used for relative error paths.
    ///
    /// Default: the process working directory at build time.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Build the options.
    pub fn build(self) -> Options {
        let defaults = Options::default();
        Options {
            include_paths: self.include_paths,
            output_style: self.output_style.unwrap_or(defaults.output_style),
            source_map_contents: self.source_map_contents,
            indented_syntax: self.indented_syntax,
            cwd: self.cwd.unwrap_or(defaults.cwd),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert!(options.include_paths.is_empty());
        assert_eq!(options.output_style, OutputStyle::Nested);
        assert!(!options.source_map_contents);
    }

    #[test]
    fn test_builder() {
        let options = Options::builder()
            .include_path("/vendor")
            .include_paths(["/a", "/b"])
            .output_style(OutputStyle::Compressed)
            .source_map_contents(true)
            .cwd("/work")
            .build();
        assert_eq!(
            options.include_paths,
            vec![PathBuf::from("/vendor"), PathBuf::from("/a"), PathBuf::from("/b")]
        );
        assert_eq!(options.output_style, OutputStyle::Compressed);
        assert!(options.source_map_contents);
        assert_eq!(options.cwd, PathBuf::from("/work"));
    }

    #[test]
    fn test_indented_detection() {
        let options = Options::default();
        assert!(options.is_indented(Path::new("/p/indent.sass")));
        assert!(!options.is_indented(Path::new("/p/mixins.scss")));

        let forced = Options::builder().indented_syntax(true).build();
        assert!(forced.is_indented(Path::new("/p/mixins.scss")));
    }
}
