//! User-defined function (mixin) invocation
//!
//! A call replays the function's captured body lines: variable substitution
//! on the value side, positional parameter substitution, and the magic
//! `arguments` keyword carrying the caller's full, unsplit argument list.
//! A body line that is itself a call to a *different* defined function
//! aborts the current call and delegates to that function, forwarding this
//! call's own argument string as the nested call's parent arguments — a
//! mixin can therefore consist of a single forwarding call. Delegation
//! chains are depth-limited; a mutual A→B→A loop fails the render instead
//! of recursing until the stack runs out.

use crate::context::RenderContext;
use crate::error::{CompilerError, Result};
use crate::substitute::{replace_token, Substituter};
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum call depth for one declaration, delegation included.
pub const MAX_CALL_DEPTH: usize = 32;

static DELEGATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^:\s(]+):?\s*\(?\s*([^);]+)\)?;?\s*$").unwrap());
static FORMAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([^: ]+):? ([^;]+);?$").unwrap());
static ARG_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*").unwrap());

/// Invokes `name` with a raw positional argument string. `parent_args` is
/// set only when this call was reached through delegation; it is what the
/// `arguments` keyword expands to in that case.
pub fn call(
    ctx: &RenderContext,
    substituter: &Substituter,
    name: &str,
    arguments: &str,
    parent_args: Option<&str>,
    depth: usize,
) -> Result<String> {
    if depth >= MAX_CALL_DEPTH {
        return Err(CompilerError::RecursionLimit {
            function: name.to_string(),
            limit: MAX_CALL_DEPTH,
        });
    }
    let Some(function) = ctx.functions.get(name) else {
        return Ok(String::new());
    };

    let mut output = String::new();
    for (i, raw) in function.body.iter().enumerate() {
        let mut line = substituter.substitute_value_side(&ctx.vars, raw);

        if let Some(caps) = DELEGATE_RE.captures(&line) {
            let target = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let nested_args = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            if target != name && ctx.functions.contains_key(target) {
                return call(ctx, substituter, target, nested_args, Some(arguments), depth + 1);
            }
        }

        if !function.params.is_empty() {
            for (j, actual) in ARG_SPLIT_RE.split(arguments).enumerate() {
                let Some(param) = function.params.get(j) else {
                    break;
                };
                line = replace_token(&line, param, strip_quotes(actual));
            }
        }

        if i > 0 {
            output.push_str("\n\t");
        }
        line = line.replace("arguments", parent_args.unwrap_or(arguments));
        output.push_str(&format_declaration(&line));
    }
    Ok(output)
}

/// Strips one layer of matching enclosing quotes from an actual argument.
fn strip_quotes(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'\'' || bytes[0] == b'"') && bytes[bytes.len() - 1] == bytes[0] {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Canonicalizes a finished body line to `property: value;`. Lines that do
/// not fit the name-space-value shape pass through unchanged.
fn format_declaration(line: &str) -> String {
    FORMAT_RE.replace(line, "$1: $2;").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::FunctionDef;

    fn def(params: &[&str], body: &[&str]) -> FunctionDef {
        FunctionDef {
            params: params.iter().map(|s| s.to_string()).collect(),
            body: body.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn ctx_with(funcs: &[(&str, FunctionDef)]) -> RenderContext {
        let mut ctx = RenderContext::new();
        for (name, f) in funcs {
            ctx.define_function(*name, f.clone());
        }
        ctx
    }

    #[test]
    fn parameter_substitution() {
        let ctx = ctx_with(&[("pad", def(&["x"], &["padding x"]))]);
        let sub = Substituter::new();
        let out = call(&ctx, &sub, "pad", "10px", None, 0).unwrap();
        assert_eq!(out, "padding: 10px;");
    }

    #[test]
    fn multi_line_body_joined_with_tab() {
        let ctx = ctx_with(&[(
            "size",
            def(&["w", "h"], &["width w", "height h"]),
        )]);
        let sub = Substituter::new();
        let out = call(&ctx, &sub, "size", "10px, 20px", None, 0).unwrap();
        assert_eq!(out, "width: 10px;\n\theight: 20px;");
    }

    #[test]
    fn quotes_stripped_from_actual_arguments() {
        let ctx = ctx_with(&[("family", def(&["f"], &["font-family f"]))]);
        let sub = Substituter::new();
        let out = call(&ctx, &sub, "family", "'Helvetica'", None, 0).unwrap();
        assert_eq!(out, "font-family: Helvetica;");
    }

    #[test]
    fn arguments_keyword_expands_to_raw_argument_list() {
        let ctx = ctx_with(&[("pad", def(&[], &["padding arguments"]))]);
        let sub = Substituter::new();
        let out = call(&ctx, &sub, "pad", "0 auto", None, 0).unwrap();
        assert_eq!(out, "padding: 0 auto;");
    }

    #[test]
    fn delegation_forwards_caller_arguments() {
        let ctx = ctx_with(&[
            (
                "border-radius",
                def(&["n"], &["-webkit-border-radius arguments", "border-radius arguments"]),
            ),
            ("round", def(&["n"], &["border-radius(n)"])),
        ]);
        let sub = Substituter::new();
        let out = call(&ctx, &sub, "round", "5px", None, 0).unwrap();
        assert_eq!(out, "-webkit-border-radius: 5px;\n\tborder-radius: 5px;");
    }

    #[test]
    fn self_reference_does_not_delegate() {
        let ctx = ctx_with(&[("margin", def(&["m"], &["margin m"]))]);
        let sub = Substituter::new();
        let out = call(&ctx, &sub, "margin", "8px", None, 0).unwrap();
        assert_eq!(out, "margin: 8px;");
    }

    #[test]
    fn mutual_delegation_hits_recursion_limit() {
        let ctx = ctx_with(&[
            ("a", def(&[], &["b(arguments)"])),
            ("b", def(&[], &["a(arguments)"])),
        ]);
        let sub = Substituter::new();
        let err = call(&ctx, &sub, "a", "1px", None, 0).unwrap_err();
        assert!(matches!(err, CompilerError::RecursionLimit { limit, .. } if limit == MAX_CALL_DEPTH));
    }

    #[test]
    fn missing_extra_arguments_leave_params_literal() {
        let ctx = ctx_with(&[("size", def(&["w", "h"], &["width w", "height h"]))]);
        let sub = Substituter::new();
        let out = call(&ctx, &sub, "size", "10px", None, 0).unwrap();
        assert_eq!(out, "width: 10px;\n\theight: h;");
    }
}
