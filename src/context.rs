//! Per-render compilation state
//!
//! One [`RenderContext`] is created for every render call and dropped when
//! the CSS has been emitted. The variable table, function table and block
//! list never outlive a single pass, so nothing leaks between files when
//! one engine instance renders a whole directory.

use std::collections::HashMap;

/// A user-defined function (mixin): formal parameter names plus the raw,
/// indentation-stripped body lines. The body is captured once at
/// declaration; substitution happens per call.
#[derive(Debug, Clone, Default)]
pub struct FunctionDef {
    pub params: Vec<String>,
    pub body: Vec<String>,
}

/// A finalized rule block: fully composed selector names and resolved
/// `property: value;` declarations. A block without declarations is kept in
/// the list (it holds its slot in emission order) but produces no output.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub names: Vec<String>,
    pub declarations: Vec<String>,
}

impl Block {
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

/// The three tables of one render pass.
#[derive(Debug, Default)]
pub struct RenderContext {
    pub vars: HashMap<String, String>,
    pub functions: HashMap<String, FunctionDef>,
    pub blocks: Vec<Block>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the variable table before parsing starts (externally supplied
    /// values, e.g. `-D` definitions).
    pub fn with_variables(vars: HashMap<String, String>) -> Self {
        Self {
            vars,
            ..Self::default()
        }
    }

    /// Binds a variable. Redefinition is last-write-wins; text already
    /// resolved against the old value is not revisited.
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn define_function(&mut self, name: impl Into<String>, def: FunctionDef) {
        self.functions.insert(name.into(), def);
    }
}
