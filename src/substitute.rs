//! Variable substitution
//!
//! Rewrites argument strings and declaration values by replacing variable
//! references with their bound values. References come in two forms: a bare
//! identifier at a word boundary (`color fg`) and a brace-delimited
//! identifier (`-{side}-margin`). Names may carry a `$` sigil; the sigil is
//! part of the name, not syntax.

use regex::Regex;
use std::collections::HashMap;

/// Characters that can appear in a variable name. A bare reference is only
/// replaced when the characters on both sides (if any) fall outside this
/// set.
fn is_name_char(c: char) -> bool {
    c == '$' || c == '_' || c == '-' || c.is_ascii_alphanumeric()
}

/// Replaces every occurrence of `token` in `text`, matching either the bare
/// token at a word boundary or the `{token}` form, with `value`.
///
/// The boundary test is done by hand: the regex crate has no lookaround, and
/// the token is caller data, so building a pattern per token buys nothing.
pub(crate) fn replace_token(text: &str, token: &str, value: &str) -> String {
    if token.is_empty() {
        return text.to_string();
    }
    let braced = format!("{{{token}}}");
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        if text[i..].starts_with(&braced) {
            out.push_str(value);
            i += braced.len();
            continue;
        }
        if text[i..].starts_with(token) {
            // boundaries are judged against the original text, not the
            // already-substituted output
            let before_ok = text[..i].chars().last().map(|c| !is_name_char(c)).unwrap_or(true);
            let end = i + token.len();
            let after_ok = text[end..].chars().next().map(|c| !is_name_char(c)).unwrap_or(true);
            if before_ok && after_ok {
                out.push_str(value);
                i = end;
                continue;
            }
        }
        let ch = text[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// The substitution engine. Regexes are compiled once and reused across the
/// render pass.
pub struct Substituter {
    token_re: Regex,
    multi_token_re: Regex,
    value_side_re: Regex,
}

impl Substituter {
    pub fn new() -> Self {
        Self {
            token_re: Regex::new(r"[$A-Za-z0-9_-]+").unwrap(),
            multi_token_re: Regex::new(r"[,\s]").unwrap(),
            value_side_re: Regex::new(r"^(\S+\s+)(.*)$").unwrap(),
        }
    }

    /// Substitutes variable references in an argument string.
    ///
    /// Multi-token text (anything containing whitespace or a comma) is
    /// scanned for variable-like tokens, each known one replaced everywhere
    /// it occurs. A single token is replaced wholesale iff it is itself a
    /// bound name. Unknown tokens are left untouched.
    pub fn substitute(&self, vars: &HashMap<String, String>, text: &str) -> String {
        if self.multi_token_re.is_match(text) {
            let mut out = text.to_string();
            for m in self.token_re.find_iter(text) {
                if let Some(value) = vars.get(m.as_str()) {
                    out = replace_token(&out, m.as_str(), value);
                }
            }
            out
        } else if let Some(value) = vars.get(text) {
            value.clone()
        } else {
            text.to_string()
        }
    }

    /// Substitutes only the value side of a declaration line, leaving the
    /// leading property-name token untouched. A line with no whitespace has
    /// no value side and is returned unchanged (the delegation check
    /// consumes such lines downstream).
    pub fn substitute_value_side(&self, vars: &HashMap<String, String>, line: &str) -> String {
        match self.value_side_re.captures(line) {
            Some(caps) => format!("{}{}", &caps[1], self.substitute(vars, &caps[2])),
            None => line.to_string(),
        }
    }
}

impl Default for Substituter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn single_token_replaced_wholesale() {
        let v = vars(&[("fg", "red")]);
        let s = Substituter::new();
        assert_eq!(s.substitute(&v, "fg"), "red");
        assert_eq!(s.substitute(&v, "bg"), "bg");
    }

    #[test]
    fn multi_token_replaces_at_word_boundaries() {
        let v = vars(&[("fg", "red"), ("pad", "4px")]);
        let s = Substituter::new();
        assert_eq!(s.substitute(&v, "1px solid fg"), "1px solid red");
        assert_eq!(s.substitute(&v, "fg, pad"), "red, 4px");
        // "fg" inside a longer word is not a reference
        assert_eq!(s.substitute(&v, "bgfg fg"), "bgfg red");
    }

    #[test]
    fn brace_delimited_references() {
        let v = vars(&[("side", "left")]);
        let s = Substituter::new();
        assert_eq!(s.substitute(&v, "margin-{side} 0"), "margin-left 0");
    }

    #[test]
    fn sigil_names() {
        let v = vars(&[("$fg", "red")]);
        let s = Substituter::new();
        assert_eq!(s.substitute(&v, "1px solid $fg"), "1px solid red");
        assert_eq!(s.substitute(&v, "$fg"), "red");
    }

    #[test]
    fn substitution_is_idempotent() {
        let v = vars(&[("fg", "red"), ("w", "100%")]);
        let s = Substituter::new();
        let once = s.substitute(&v, "fg w fg");
        let twice = s.substitute(&v, &once);
        assert_eq!(once, "red 100% red");
        assert_eq!(once, twice);
    }

    #[test]
    fn value_side_keeps_property_name() {
        let v = vars(&[("color", "red")]);
        let s = Substituter::new();
        // the leading token is the property name, never substituted
        assert_eq!(s.substitute_value_side(&v, "color color"), "color red");
    }

    #[test]
    fn value_side_without_whitespace_is_unchanged() {
        let v = vars(&[("x", "1")]);
        let s = Substituter::new();
        assert_eq!(s.substitute_value_side(&v, "border-radius(x)"), "border-radius(x)");
    }

    #[test]
    fn replace_token_boundaries() {
        assert_eq!(replace_token("fg fgx {fg}", "fg", "red"), "red fgx red");
        assert_eq!(replace_token("x-fg", "fg", "red"), "x-fg");
        assert_eq!(replace_token("(fg)", "fg", "red"), "(red)");
    }
}
