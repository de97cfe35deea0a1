//! `@import` resolution and file splicing
//!
//! An import is textual: the referenced file's lines replace the directive
//! in the parse buffer, so a single flat buffer can span many physical
//! files. Paths resolve against the import directory when one is set,
//! otherwise the read directory; a quoted name without an extension gets
//! the stylesheet's own.

use crate::error::{CompilerError, Result};
use crate::lexer::split_lines;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// The stylesheet extension applied to extensionless import names.
pub const STYL_EXTENSION: &str = ".styl";

static IMPORT_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"@import\s*['"]([^'"]+)['"]"#).unwrap());
static EXPLICIT_EXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+)(\.[^.]*)$").unwrap());

#[derive(Debug)]
pub struct Importer {
    search_dir: PathBuf,
}

impl Importer {
    pub fn new(search_dir: impl Into<PathBuf>) -> Self {
        Self {
            search_dir: search_dir.into(),
        }
    }

    /// Resolves an `@import` directive line to the file it names.
    pub fn resolve(&self, directive: &str) -> Result<PathBuf> {
        let caps = IMPORT_PATH_RE.captures(directive).ok_or_else(|| {
            CompilerError::import(directive.trim(), "malformed @import directive")
        })?;
        let name = &caps[1];
        let file = match EXPLICIT_EXT_RE.captures(name) {
            Some(parts) => format!("{}{}", &parts[1], &parts[2]),
            None => format!("{name}{STYL_EXTENSION}"),
        };
        Ok(self.search_dir.join(file))
    }

    /// Reads the imported file and returns its lines ready for splicing,
    /// with blank lines and lone closing braces already dropped. A file
    /// that cannot be read fails the whole render.
    pub fn load(&self, directive: &str) -> Result<Vec<String>> {
        let path = self.resolve(directive)?;
        log::debug!("importing {}", path.display());
        let contents = fs::read_to_string(&path)
            .map_err(|e| CompilerError::import(path.display().to_string(), e.to_string()))?;
        Ok(split_lines(&contents))
    }

    pub fn search_dir(&self) -> &Path {
        &self.search_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn resolve_defaults_to_styl_extension() {
        let importer = Importer::new("/styles");
        let path = importer.resolve("@import \"reset\"").unwrap();
        assert_eq!(path, Path::new("/styles/reset.styl"));
    }

    #[test]
    fn resolve_honors_explicit_extension() {
        let importer = Importer::new("/styles");
        let path = importer.resolve("@import \"vendor.css\"").unwrap();
        assert_eq!(path, Path::new("/styles/vendor.css"));
        // single quotes work too
        let path = importer.resolve("@import 'mixins'").unwrap();
        assert_eq!(path, Path::new("/styles/mixins.styl"));
    }

    #[test]
    fn malformed_directive_is_an_error() {
        let importer = Importer::new("/styles");
        let err = importer.resolve("@import reset").unwrap_err();
        assert!(matches!(err, CompilerError::Import { .. }));
    }

    #[test]
    fn load_splits_and_filters_lines() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "reset.styl", "body {\n  margin: 0\n}\n\nhtml\n  padding: 0\n");
        let importer = Importer::new(dir.path());
        let lines = importer.load("@import \"reset\"").unwrap();
        assert_eq!(lines, vec!["body {", "  margin: 0", "html", "  padding: 0"]);
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let dir = TempDir::new().unwrap();
        let importer = Importer::new(dir.path());
        let err = importer.load("@import \"nope\"").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("nope.styl"), "{message}");
    }
}
