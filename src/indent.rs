//! Indentation handling for .styl sources
//!
//! Scopes are delimited by the exact leading-whitespace string of a line,
//! not by a computed depth. Two lines belong to the same scope only when
//! their prefixes are byte-identical; a line is "deeper" than another only
//! when its prefix is a strict superstring of the other's. Mixed tabs and
//! spaces therefore never compare equal to each other. Every scope
//! comparison in the crate goes through these functions.

/// Returns the leading whitespace of a line, or `""` if there is none.
pub fn indent_of(line: &str) -> &str {
    let end = line
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..end]
}

/// Whether the line starts with any whitespace at all.
pub fn is_indented(line: &str) -> bool {
    line.chars().next().map(|c| c.is_whitespace()).unwrap_or(false)
}

/// Exact-prefix scope equality.
pub fn same_indent(a: &str, b: &str) -> bool {
    a == b
}

/// Whether indentation prefix `a` is strictly deeper than `b`: a strict
/// superstring of it.
pub fn is_deeper(a: &str, b: &str) -> bool {
    a.len() > b.len() && a.starts_with(b)
}
