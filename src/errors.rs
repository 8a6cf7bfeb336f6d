use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ReqpinError {
    #[error("Invalid path {path}: expected an existing {expected}")]
    #[diagnostic(code(reqpin::invalid_path))]
    InvalidPath { path: PathBuf, expected: PathKind },

    #[error("Could not write manifest {path}: {source}")]
    #[diagnostic(code(reqpin::write_failure))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(reqpin::config))]
    Config(String),

    #[error(transparent)]
    #[diagnostic(code(reqpin::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(reqpin::json))]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(code(reqpin::glob))]
    Glob(#[from] globset::Error),
}

/// The kind of filesystem entry a workflow expects as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

impl std::fmt::Display for PathKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathKind::File => write!(f, "file"),
            PathKind::Directory => write!(f, "directory"),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReqpinError>;
