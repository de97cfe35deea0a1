//! Line-level lexical analysis for .styl sources
//!
//! The language has no token stream; the unit of parsing is the physical
//! line. This module prepares the line buffer and classifies each line into
//! a typed [`LineKind`] so the parser's dispatch is an explicit decision
//! table rather than a pile of ad-hoc predicate calls. Classification is
//! heuristic on purpose: a line is never rejected, only routed, and
//! anything unrecognized inside a block falls through as a property.

use crate::indent::{indent_of, is_deeper};
use once_cell::sync::Lazy;
use regex::Regex;

static LINE_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\n|\r").unwrap());

/// Splits source text into the parse buffer: lines that are blank or a lone
/// closing brace are dropped, so brace-style input collapses to the same
/// buffer as indentation-style input.
pub fn split_lines(source: &str) -> Vec<String> {
    LINE_BREAK_RE
        .split(source)
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && trimmed != "}"
        })
        .map(|line| line.to_string())
        .collect()
}

/// What a physical line of input is, as decided by [`LineClassifier::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `name(param, param)` at the left margin, body on the following
    /// indented lines.
    FunctionDecl,
    /// `name = value` followed by a line at the same indentation.
    VariableDecl,
    /// A block header: one selector, a selector list, or a parent reference.
    Selector,
    /// `@import "name"`.
    Import,
    /// `property value` (or a mixin invocation) inside a block.
    Property,
    /// Nothing matched; ends the enclosing block.
    Unknown,
}

/// Heuristic line classifier.
///
/// The individual predicates are pure and order-independent; ambiguity is
/// resolved by the fixed priority in [`classify`]: function declaration,
/// variable declaration, selector, import, property.
pub struct LineClassifier {
    function_decl_re: Regex,
    variable_decl_re: Regex,
    bare_selector_re: Regex,
    selector_list_re: Regex,
    property_re: Regex,
    invocation_re: Regex,
}

impl LineClassifier {
    pub fn new() -> Self {
        Self {
            function_decl_re: Regex::new(r"^[$A-Za-z0-9_-]+\s*\(").unwrap(),
            variable_decl_re: Regex::new(r"^[$A-Za-z0-9_-]+\s*=\s*\S").unwrap(),
            bare_selector_re: Regex::new(r#"^[A-Za-z0-9.#*+&\[\]='">~^$-]+,?$"#).unwrap(),
            selector_list_re: Regex::new(r#"^[A-Za-z0-9.#*+&\[\]='">~^$ ,-]+,$"#).unwrap(),
            property_re: Regex::new(r"\S\s+\S").unwrap(),
            invocation_re: Regex::new(r"^[$A-Za-z0-9_-]+\(.*\);?$").unwrap(),
        }
    }

    /// The decision table: the first matching kind in driver priority order
    /// wins. `indent` is the indentation the caller expects block headers at.
    pub fn classify(&self, lines: &[String], i: usize, indent: &str) -> LineKind {
        let line = &lines[i];
        if self.is_function_declaration(line) {
            LineKind::FunctionDecl
        } else if self.is_variable_declaration(lines, i) {
            LineKind::VariableDecl
        } else if self.is_block_declaration(lines, i, indent) {
            LineKind::Selector
        } else if self.is_import(line) {
            LineKind::Import
        } else if self.is_property(line) {
            LineKind::Property
        } else {
            LineKind::Unknown
        }
    }

    /// `name(` at the left margin. Indented lines never match, which is what
    /// keeps mixin bodies from re-declaring their own function.
    pub fn is_function_declaration(&self, line: &str) -> bool {
        self.function_decl_re.is_match(line)
    }

    /// `name = value` with a non-empty value, at any indentation (variables
    /// can be declared inside a block). The lookahead to the next line is
    /// what distinguishes an assignment from a property whose value happens
    /// to contain `=`: a declaration is always followed by a line at the
    /// same indentation.
    pub fn is_variable_declaration(&self, lines: &[String], i: usize) -> bool {
        let line = &lines[i];
        self.variable_decl_re.is_match(line.trim_start())
            && matches!(lines.get(i + 1), Some(next) if indent_of(next) == indent_of(line))
    }

    /// `@import` directive.
    pub fn is_import(&self, line: &str) -> bool {
        line.starts_with("@import")
    }

    /// Looks like "token separator token". Deliberately loose: there is no
    /// check against CSS property grammar, only that a name and a value are
    /// separated by whitespace. A bare `name(args)` invocation has no
    /// interior whitespace but must still reach the resolver, so the
    /// call shape is accepted as well.
    pub fn is_property(&self, line: &str) -> bool {
        self.property_re.is_match(line) || self.invocation_re.is_match(line.trim())
    }

    /// Whether the line opens a block at the expected indentation.
    pub fn is_block_declaration(&self, lines: &[String], i: usize, indent: &str) -> bool {
        let line = &lines[i];
        if self.starts_selector_shaped(line) || line.contains('{') {
            return true;
        }
        if let Some(rest) = line.strip_prefix(indent) {
            if self.bare_selector_re.is_match(rest)
                || self.selector_list_re.is_match(rest)
                || rest.starts_with('&')
            {
                return true;
            }
        }
        // Lookahead: a line with no other selector signal still opens a
        // block if what follows is nested under it.
        matches!(lines.get(i + 1), Some(next) if is_deeper(indent_of(next), indent_of(line)))
    }

    /// A left-margin line that starts with a tag/class/id/wildcard character
    /// and carries no parenthesis; a `:not(` pseudo-class is the one
    /// parenthesis a selector may contain.
    fn starts_selector_shaped(&self, line: &str) -> bool {
        let mut chars = line.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphanumeric() || c == '.' || c == '#' || c == '*' => {}
            _ => return false,
        }
        match line.find('(') {
            None => line.len() >= 2,
            Some(pos) => line[..pos].ends_with(":not"),
        }
    }
}

impl Default for LineClassifier {
    fn default() -> Self {
        Self::new()
    }
}
