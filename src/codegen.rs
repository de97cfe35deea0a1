//! CSS emission
//!
//! Serializes the finalized block list in encounter order. Blocks with no
//! declarations are skipped outright, so an empty rule never reaches the
//! output, not even as bare braces. Nothing is reordered, deduplicated or
//! minified.

use crate::context::Block;

#[derive(Debug, Default)]
pub struct CssGenerator {
    output: String,
}

impl CssGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(mut self, blocks: &[Block]) -> String {
        for block in blocks {
            if block.is_empty() {
                continue;
            }
            self.output.push_str(&block.names.join(", "));
            self.output.push_str(" {\n");
            for (i, declaration) in block.declarations.iter().enumerate() {
                if i > 0 {
                    self.output.push('\n');
                }
                self.output.push('\t');
                self.output.push_str(declaration);
            }
            self.output.push_str("\n}\n");
        }
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(names: &[&str], declarations: &[&str]) -> Block {
        Block {
            names: names.iter().map(|s| s.to_string()).collect(),
            declarations: declarations.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn emits_tab_indented_declarations() {
        let css = CssGenerator::new().generate(&[block(&["body"], &["color: red;"])]);
        assert_eq!(css, "body {\n\tcolor: red;\n}\n");
    }

    #[test]
    fn joins_selector_lists_with_comma() {
        let css = CssGenerator::new().generate(&[block(
            &["h1", "h2"],
            &["margin: 0;", "padding: 0;"],
        )]);
        assert_eq!(css, "h1, h2 {\n\tmargin: 0;\n\tpadding: 0;\n}\n");
    }

    #[test]
    fn empty_blocks_produce_nothing() {
        let css = CssGenerator::new().generate(&[
            block(&["ul"], &[]),
            block(&["ul li"], &["color: blue;"]),
        ]);
        assert_eq!(css, "ul li {\n\tcolor: blue;\n}\n");
    }

    #[test]
    fn all_empty_yields_empty_string() {
        let css = CssGenerator::new().generate(&[block(&["div"], &[])]);
        assert!(css.is_empty());
    }

    #[test]
    fn preserves_declaration_order() {
        let css = CssGenerator::new().generate(&[block(
            &["p"],
            &["z-index: 2;", "color: red;", "z-index: 1;"],
        )]);
        assert_eq!(css, "p {\n\tz-index: 2;\n\tcolor: red;\n\tz-index: 1;\n}\n");
    }
}
