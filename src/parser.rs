//! Recursive-descent parsing over the line buffer
//!
//! The driver scans the buffer once, left to right, dispatching each line on
//! its [`LineKind`]. Block headers open a recursive descent that consumes
//! the exact-indentation run of selector names, composes them with the
//! ancestor selectors, and then walks the nested body; `@import` splices the
//! referenced file's lines into the buffer in place of the directive and
//! rescans from the splice point. Declarations land in the per-render
//! [`RenderContext`], which the emitter serializes afterwards.

use crate::context::{Block, FunctionDef, RenderContext};
use crate::error::{CompilerError, Result};
use crate::indent::{indent_of, same_indent};
use crate::lexer::{split_lines, LineClassifier, LineKind};
use crate::mixin;
use crate::preprocessor::Importer;
use crate::substitute::Substituter;
use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound on import splices per render; a self-importing file would
/// otherwise grow the buffer forever.
pub const MAX_IMPORT_SPLICES: usize = 255;

static FUNCTION_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^(]+)\(\s*([^)]*?)\s*\)").unwrap());
static VARIABLE_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([$A-Za-z0-9_-]+)\s*=\s*([^;]+);?$").unwrap());
static DECLARATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^:\s(]+)\s*:?\s*([^;]+);?\s*$").unwrap());
static TRAILING_BRACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\{\s*$").unwrap());
static NAME_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s?").unwrap());
static ARG_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*").unwrap());

pub struct Parser<'a> {
    classifier: LineClassifier,
    substituter: Substituter,
    importer: Option<&'a Importer>,
    ctx: RenderContext,
    imports_spliced: usize,
}

impl<'a> Parser<'a> {
    /// A parser without import support; `@import` lines fail. Rendering
    /// through the engine always attaches an importer.
    pub fn new(ctx: RenderContext) -> Self {
        Self {
            classifier: LineClassifier::new(),
            substituter: Substituter::new(),
            importer: None,
            ctx,
            imports_spliced: 0,
        }
    }

    pub fn with_importer(ctx: RenderContext, importer: &'a Importer) -> Self {
        Self {
            importer: Some(importer),
            ..Self::new(ctx)
        }
    }

    /// Runs the driver scan over `source`.
    pub fn parse(&mut self, source: &str) -> Result<()> {
        let mut lines = split_lines(source);
        log::debug!("parsing {} lines", lines.len());

        let mut i = 0;
        while i < lines.len() {
            match self.classifier.classify(&lines, i, "") {
                LineKind::FunctionDecl => self.add_function(&lines, &mut i),
                LineKind::VariableDecl => self.add_variable(&lines[i])?,
                LineKind::Selector => self.add_block(&lines, &mut i, "", &[])?,
                LineKind::Import => {
                    self.splice_import(&mut lines, &mut i)?;
                    // rescan from the first spliced line
                    continue;
                }
                LineKind::Property | LineKind::Unknown => {}
            }
            i += 1;
        }

        log::debug!(
            "parsed {} blocks, {} variables, {} functions",
            self.ctx.blocks.len(),
            self.ctx.vars.len(),
            self.ctx.functions.len()
        );
        Ok(())
    }

    /// How many `@import` directives were spliced during the pass.
    pub fn imports_spliced(&self) -> usize {
        self.imports_spliced
    }

    /// Hands the populated tables back for emission.
    pub fn finish(self) -> RenderContext {
        self.ctx
    }

    /// Consumes a block: the header run of selector names at `indent`, then
    /// the nested body at whatever indentation its first line carries. A
    /// placeholder slot is reserved up front so nested blocks, resolved
    /// while this block's own declarations are still being collected, end up
    /// *after* it in emission order.
    fn add_block(
        &mut self,
        lines: &[String],
        i: &mut usize,
        indent: &str,
        parent_names: &[String],
    ) -> Result<()> {
        let position = self.ctx.blocks.len();
        self.ctx.blocks.push(Block::default());

        let mut names: Vec<String> = Vec::new();
        while *i < lines.len() && same_indent(indent_of(&lines[*i]), indent) {
            let header = TRAILING_BRACE_RE.replace(lines[*i].trim(), "");
            names.extend(
                NAME_SPLIT_RE
                    .split(&header)
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string()),
            );
            *i += 1;
        }

        if !parent_names.is_empty() {
            let mut composed = Vec::with_capacity(names.len() * parent_names.len());
            for child in &names {
                for parent in parent_names {
                    composed.push(compose_selector(parent, child));
                }
            }
            names = composed;
        }

        let body_indent = lines
            .get(*i)
            .map(|l| indent_of(l).to_string())
            .unwrap_or_default();
        let mut declarations = Vec::new();

        while *i < lines.len() && same_indent(indent_of(&lines[*i]), &body_indent) {
            match self.classifier.classify(lines, *i, &body_indent) {
                LineKind::Selector => self.add_block(lines, i, &body_indent, &names)?,
                LineKind::VariableDecl => self.add_variable(&lines[*i])?,
                LineKind::Property => declarations.push(self.resolve_line(&lines[*i])?),
                _ => break,
            }
            *i += 1;
        }

        // leave the cursor one line before the stopping line; the caller's
        // loop increments past it
        *i = i.saturating_sub(1);
        self.ctx.blocks[position] = Block {
            names,
            declarations,
        };
        Ok(())
    }

    /// Captures a function declaration: name, formal parameters, and the raw
    /// body lines (every following indented line, indentation stripped).
    fn add_function(&mut self, lines: &[String], i: &mut usize) {
        let Some(caps) = FUNCTION_DECL_RE.captures(&lines[*i]) else {
            return;
        };
        let name = caps[1].trim().to_string();
        let params: Vec<String> = if caps[2].is_empty() {
            Vec::new()
        } else {
            ARG_SPLIT_RE
                .split(&caps[2])
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        let mut body = Vec::new();
        while *i + 1 < lines.len() && crate::indent::is_indented(&lines[*i + 1]) {
            *i += 1;
            body.push(lines[*i].trim().to_string());
        }

        log::debug!("function '{}' ({} params, {} lines)", name, params.len(), body.len());
        self.ctx.define_function(name, FunctionDef { params, body });
    }

    /// Binds a variable. The value is resolved through the same path as a
    /// declaration line, so references to earlier variables are substituted
    /// at declaration time; later redefinition does not revisit them.
    fn add_variable(&mut self, line: &str) -> Result<()> {
        let trimmed = line.trim_start();
        let Some(caps) = VARIABLE_DECL_RE.captures(trimmed) else {
            return Ok(());
        };
        let name = caps[1].to_string();
        let resolved = self.resolve_line(trimmed)?;
        let value = match resolved.find('=') {
            Some(pos) => resolved[pos + 1..].trim_start().to_string(),
            None => resolved,
        }
        .replace(';', "");
        self.ctx.assign(name, value);
        Ok(())
    }

    /// Resolves one declaration line: a call when the name half names a
    /// defined function, otherwise variable substitution on the value half
    /// and canonical `name: value;` formatting. A line that defeats even the
    /// loose name/value split is passed through untouched save for a
    /// terminating semicolon.
    fn resolve_line(&self, line: &str) -> Result<String> {
        let Some(caps) = DECLARATION_RE.captures(line) else {
            let trimmed = line.trim();
            return Ok(if trimmed.ends_with(';') {
                trimmed.to_string()
            } else {
                format!("{trimmed};")
            });
        };
        let name = &caps[1];
        let remainder = &caps[2];
        if self.ctx.functions.contains_key(name) {
            let args = remainder.replace(['(', ')'], "");
            mixin::call(&self.ctx, &self.substituter, name, &args, None, 0)
        } else {
            let value = self.substituter.substitute(&self.ctx.vars, remainder);
            Ok(format!("{name}: {value};"))
        }
    }

    /// Replaces the `@import` directive at the cursor with the referenced
    /// file's lines. The cursor is left at the splice start so the new lines
    /// are scanned from their beginning.
    fn splice_import(&mut self, lines: &mut Vec<String>, i: &mut usize) -> Result<()> {
        let Some(importer) = self.importer else {
            return Err(CompilerError::config(
                "no read directory configured for @import",
            ));
        };
        if self.imports_spliced >= MAX_IMPORT_SPLICES {
            return Err(CompilerError::import(
                lines[*i].trim(),
                format!("more than {MAX_IMPORT_SPLICES} imports; possible import cycle"),
            ));
        }
        let imported = importer.load(&lines[*i])?;
        self.imports_spliced += 1;
        lines.splice(*i..=*i, imported);
        Ok(())
    }
}

/// Combines one parent selector with one child name: class/id/pseudo-class
/// children concatenate directly, a `&` reference substitutes the parent,
/// anything else joins as a descendant.
fn compose_selector(parent: &str, child: &str) -> String {
    if child.starts_with(['.', '#', ':']) {
        format!("{parent}{child}")
    } else if child.contains('&') {
        child.replace('&', parent)
    } else {
        format!("{parent} {child}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> RenderContext {
        let mut parser = Parser::new(RenderContext::new());
        parser.parse(source).unwrap();
        parser.finish()
    }

    #[test]
    fn simple_block() {
        let ctx = parse("body\n  color: red");
        assert_eq!(ctx.blocks.len(), 1);
        assert_eq!(ctx.blocks[0].names, vec!["body"]);
        assert_eq!(ctx.blocks[0].declarations, vec!["color: red;"]);
    }

    #[test]
    fn variable_declared_inside_block() {
        let ctx = parse("body\n  color = red\n  color: color");
        assert_eq!(ctx.vars.get("color").map(String::as_str), Some("red"));
        assert_eq!(ctx.blocks[0].declarations, vec!["color: red;"]);
    }

    #[test]
    fn top_level_variable_resolves_through_table() {
        let ctx = parse("base = #333\nfg = base\nbody\n  color: fg");
        assert_eq!(ctx.vars.get("fg").map(String::as_str), Some("#333"));
        assert_eq!(ctx.blocks[0].declarations, vec!["color: #333;"]);
    }

    #[test]
    fn variable_redefinition_is_last_write_wins() {
        let ctx = parse("fg = red\nfg = blue\nbody\n  color: fg");
        assert_eq!(ctx.blocks[0].declarations, vec!["color: blue;"]);
    }

    #[test]
    fn nested_blocks_compose_descendants() {
        let ctx = parse("ul\n  li\n    color: blue");
        assert_eq!(ctx.blocks.len(), 2);
        assert!(ctx.blocks[0].is_empty());
        assert_eq!(ctx.blocks[1].names, vec!["ul li"]);
    }

    #[test]
    fn class_child_concatenates() {
        let ctx = parse("div\n  .warn\n    color: red");
        assert_eq!(ctx.blocks[1].names, vec!["div.warn"]);
    }

    #[test]
    fn parent_reference_substitutes() {
        let ctx = parse("a\n  &:hover\n    color: red");
        assert_eq!(ctx.blocks[1].names, vec!["a:hover"]);
    }

    #[test]
    fn selector_list_cross_product() {
        let ctx = parse("h1, h2\n  a, b\n    color: red");
        assert_eq!(ctx.blocks[1].names, vec!["h1 a", "h2 a", "h1 b", "h2 b"]);
    }

    #[test]
    fn trailing_comma_continues_selector_list() {
        let ctx = parse("h1,\nh2\n  color: red");
        assert_eq!(ctx.blocks[0].names, vec!["h1", "h2"]);
        assert_eq!(ctx.blocks[0].declarations, vec!["color: red;"]);
    }

    #[test]
    fn brace_style_headers_are_tolerated() {
        let ctx = parse("body {\n  color: red\n}");
        assert_eq!(ctx.blocks[0].names, vec!["body"]);
        assert_eq!(ctx.blocks[0].declarations, vec!["color: red;"]);
    }

    #[test]
    fn function_declaration_and_call() {
        let ctx = parse("pad(x)\n  padding: x\ndiv\n  pad(10px)");
        assert_eq!(ctx.blocks[0].declarations, vec!["padding: 10px;"]);
    }

    #[test]
    fn function_call_space_form() {
        let ctx = parse("pad(x)\n  padding: x\ndiv\n  pad 10px");
        assert_eq!(ctx.blocks[0].declarations, vec!["padding: 10px;"]);
    }

    #[test]
    fn deep_nesting_composes_associatively() {
        // pre-composing the outer two levels must give the same selector
        let nested = parse("a\n  b\n    c\n      color: red");
        let flat = parse("a b\n  c\n    color: red");
        let deep = nested.blocks.iter().find(|b| !b.is_empty()).unwrap();
        let shallow = flat.blocks.iter().find(|b| !b.is_empty()).unwrap();
        assert_eq!(deep.names, shallow.names);
        assert_eq!(deep.names, vec!["a b c"]);
    }

    #[test]
    fn import_without_context_fails() {
        let mut parser = Parser::new(RenderContext::new());
        let err = parser.parse("@import \"reset\"").unwrap_err();
        assert!(matches!(err, CompilerError::Config { .. }));
    }

    #[test]
    fn unknown_line_ends_block() {
        let ctx = parse("body\n  color: red\n  !\ndiv\n  color: blue");
        assert_eq!(ctx.blocks[0].declarations, vec!["color: red;"]);
        // the second block is still picked up by the driver
        assert!(ctx.blocks.iter().any(|b| b.names == vec!["div"]));
    }

    #[test]
    fn compose_selector_rules() {
        assert_eq!(compose_selector("ul", "li"), "ul li");
        assert_eq!(compose_selector("div", ".warn"), "div.warn");
        assert_eq!(compose_selector("a", ":hover"), "a:hover");
        assert_eq!(compose_selector("a", "&:hover"), "a:hover");
        assert_eq!(compose_selector("p", "& + &"), "p + p");
    }
}
