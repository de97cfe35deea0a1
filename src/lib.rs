//! Stylus stylesheet compiler
//!
//! Compiles indentation-based `.styl` sources into flat CSS text. The
//! language is line-oriented: selectors open nested rule blocks scoped by
//! their exact indentation prefix, `name = value` binds variables,
//! `name(params)` with an indented body defines a mixin callable from any
//! property position, `&` references the composed parent selector, and
//! `@import "name"` splices another file into the parse buffer.
//!
//! # Basic Usage
//!
//! ```no_run
//! use stylc::{Stylus, Result};
//!
//! fn main() -> Result<()> {
//!     let mut stylus = Stylus::new();
//!     stylus.set_read_dir("styles")?;
//!     stylus.set_write_dir("public/css")?;
//!     stylus.parse_files(false)?;
//!     Ok(())
//! }
//! ```
//!
//! # Pipeline
//!
//! 1. **Line buffer** - split the source, drop blanks and lone braces
//! 2. **Classification** - type each line via the classifier's decision table
//! 3. **Parse** - recursive block descent, variable/function capture,
//!    import splicing
//! 4. **Emit** - serialize the ordered block list to CSS
//!
//! All parse state lives in a per-render context; nothing carries over
//! between files besides variables seeded through [`Stylus::assign`].

pub mod codegen;
pub mod context;
pub mod error;
pub mod indent;
pub mod lexer;
pub mod mixin;
pub mod parser;
pub mod preprocessor;
pub mod substitute;

pub mod cli;

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

// Re-export commonly used types and functions
pub use codegen::CssGenerator;
pub use context::{Block, FunctionDef, RenderContext};
pub use error::{CompilerError, Result};
pub use lexer::{LineClassifier, LineKind};
pub use parser::Parser;
pub use preprocessor::{Importer, STYL_EXTENSION};
pub use substitute::Substituter;

pub use cli::Cli;

/// Compiler version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Metrics for one render pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderStats {
    /// Source size in bytes
    pub source_size: u64,

    /// Generated CSS size in bytes (0 when nothing was emitted)
    pub output_size: u64,

    /// Blocks encountered, empty ones included
    pub block_count: usize,

    /// Variables bound at end of pass
    pub variable_count: usize,

    /// Functions defined
    pub function_count: usize,

    /// Imports spliced
    pub import_count: usize,

    /// Render time in milliseconds
    pub render_time_ms: u64,
}

/// The compiler engine.
///
/// Holds the directory configuration and externally assigned variables;
/// everything else is per-render state that never outlives one call.
#[derive(Debug, Default)]
pub struct Stylus {
    read_dir: Option<PathBuf>,
    write_dir: Option<PathBuf>,
    import_dir: Option<PathBuf>,
    seed_vars: HashMap<String, String>,
}

impl Stylus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the directory `.styl` sources are read from.
    pub fn set_read_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        self.read_dir = Some(Self::checked_dir(dir)?);
        Ok(())
    }

    /// Sets the directory generated `.css` files are written to.
    pub fn set_write_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        self.write_dir = Some(Self::checked_dir(dir)?);
        Ok(())
    }

    /// Sets the directory `@import` paths resolve against. Defaults to the
    /// read directory when unset.
    pub fn set_import_dir(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        self.import_dir = Some(Self::checked_dir(dir)?);
        Ok(())
    }

    fn checked_dir(dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        if dir.is_dir() {
            Ok(dir.to_path_buf())
        } else {
            Err(CompilerError::not_a_directory(dir.display()))
        }
    }

    /// Assigns a variable available to every subsequent render, ahead of any
    /// declaration in the source itself.
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.seed_vars.insert(name.into(), value.into());
    }

    /// Renders stylus source into CSS. Returns `None` when no block
    /// produced any output.
    pub fn render(&self, source: &str) -> Result<Option<String>> {
        self.render_with_stats(source).map(|(css, _)| css)
    }

    /// Renders and reports pass metrics alongside the CSS.
    pub fn render_with_stats(&self, source: &str) -> Result<(Option<String>, RenderStats)> {
        let start = Instant::now();
        let read_dir = self
            .read_dir
            .as_ref()
            .ok_or_else(|| CompilerError::config("no read directory specified"))?;
        let import_dir = self.import_dir.as_ref().unwrap_or(read_dir);
        let importer = Importer::new(import_dir);

        let ctx = RenderContext::with_variables(self.seed_vars.clone());
        let mut parser = Parser::with_importer(ctx, &importer);
        parser.parse(source)?;
        let import_count = parser.imports_spliced();
        let ctx = parser.finish();

        let mut stats = RenderStats {
            source_size: source.len() as u64,
            block_count: ctx.blocks.len(),
            variable_count: ctx.vars.len(),
            function_count: ctx.functions.len(),
            import_count,
            ..RenderStats::default()
        };

        let css = CssGenerator::new().generate(&ctx.blocks);
        stats.output_size = css.len() as u64;
        stats.render_time_ms = start.elapsed().as_millis() as u64;
        log::debug!(
            "render: {} bytes in, {} bytes out, {} blocks",
            stats.source_size,
            stats.output_size,
            stats.block_count
        );

        Ok((if css.is_empty() { None } else { Some(css) }, stats))
    }

    /// Reads `<read_dir>/<file>` and renders it. Names without an extension
    /// get `.styl` appended; names with any other extension are not ours and
    /// yield `None`.
    pub fn parse_file_to_string(&self, file: &str) -> Result<Option<String>> {
        let read_dir = self
            .read_dir
            .as_ref()
            .ok_or_else(|| CompilerError::config("no read directory specified"))?;
        let Some(name) = normalize_styl_name(file) else {
            return Ok(None);
        };
        let path = read_dir.join(&name);
        let source = fs::read_to_string(&path).map_err(|_| CompilerError::FileNotFound {
            path: path.display().to_string(),
        })?;
        self.render(&source)
    }

    /// Renders `<read_dir>/<file>` and writes `<write_dir>/<file>.css`.
    ///
    /// Existing output is left alone unless `overwrite` is set, and a render
    /// that produced nothing writes nothing. Returns the path written, if
    /// any.
    pub fn parse_file(&self, file: &str, overwrite: bool) -> Result<Option<PathBuf>> {
        let write_dir = self
            .write_dir
            .as_ref()
            .ok_or_else(|| CompilerError::config("no write directory specified"))?;
        let Some(name) = normalize_styl_name(file) else {
            return Ok(None);
        };

        let css_name = format!("{}.css", name.trim_end_matches(STYL_EXTENSION));
        let out_path = write_dir.join(css_name);
        if out_path.exists() && !overwrite {
            log::debug!("skipping {}: output exists", name);
            return Ok(None);
        }

        match self.parse_file_to_string(&name)? {
            Some(css) => {
                fs::write(&out_path, css)?;
                log::info!("wrote {}", out_path.display());
                Ok(Some(out_path))
            }
            None => Ok(None),
        }
    }

    /// Renders every `.styl` file in the read directory into the write
    /// directory. Returns how many files were written.
    pub fn parse_files(&self, overwrite: bool) -> Result<usize> {
        let read_dir = self
            .read_dir
            .as_ref()
            .ok_or_else(|| CompilerError::config("no read directory specified"))?;
        if self.write_dir.is_none() {
            return Err(CompilerError::config("no write directory specified"));
        }

        let mut written = 0;
        for entry in fs::read_dir(read_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if self.parse_file(name, overwrite)?.is_some() {
                    written += 1;
                }
            }
        }
        Ok(written)
    }
}

/// Collapses a file name to its canonical `.styl` form: extensionless names
/// get the extension, repeated `.styl` suffixes collapse to one, and any
/// other extension means the file is not a stylesheet.
fn normalize_styl_name(file: &str) -> Option<String> {
    if file.ends_with(STYL_EXTENSION) {
        let mut stem = file;
        while let Some(shorter) = stem.strip_suffix(STYL_EXTENSION) {
            stem = shorter;
        }
        Some(format!("{stem}{STYL_EXTENSION}"))
    } else if !file.contains('.') {
        Some(format!("{file}{STYL_EXTENSION}"))
    } else {
        None
    }
}

/// Renders source text against a read directory, without touching disk for
/// the output.
pub fn render_source(source: &str, read_dir: impl AsRef<Path>) -> Result<Option<String>> {
    let mut stylus = Stylus::new();
    stylus.set_read_dir(read_dir)?;
    stylus.render(source)
}

/// Renders one `.styl` file to one `.css` file, resolving imports against
/// the input's directory. The output file is written even when empty, so a
/// stale previous version never survives a recompile.
pub fn render_file(input_path: &str, output_path: &str) -> Result<RenderStats> {
    let input = Path::new(input_path);
    let source = fs::read_to_string(input).map_err(|_| CompilerError::FileNotFound {
        path: input_path.to_string(),
    })?;
    let read_dir = match input.parent() {
        Some(parent) if parent != Path::new("") => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut stylus = Stylus::new();
    stylus.set_read_dir(read_dir)?;
    let (css, stats) = stylus.render_with_stats(&source)?;
    fs::write(output_path, css.unwrap_or_default())?;
    Ok(stats)
}
