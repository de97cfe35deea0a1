//! Error types for the Stylus compiler

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Import error: {path}: {message}")]
    Import { path: String, message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Recursion limit exceeded calling '{function}' (limit: {limit})")]
    RecursionLimit { function: String, limit: usize },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },
}

pub type Result<T> = std::result::Result<T, CompilerError>;

impl CompilerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn import(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Import {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn not_a_directory(path: impl std::fmt::Display) -> Self {
        Self::Config {
            message: format!("{} is not a directory", path),
        }
    }
}
