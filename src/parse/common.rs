use serde::Serialize;
use std::path::PathBuf;

/// Normalized top-level module identifier: the first dotted segment of an
/// imported name. Never empty and never contains a dot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ImportName(String);

impl ImportName {
    /// Take the first dotted segment of `dotted`.
    ///
    /// Returns None for empty input and for relative paths (leading dot).
    pub fn top_level(dotted: &str) -> Option<Self> {
        let first = dotted.trim().split('.').next()?.trim();
        if first.is_empty() {
            return None;
        }
        Some(Self(first.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImportName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for ImportName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One import construct as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportStatement {
    /// `import a.b.c` / `import a as b, c`
    Direct { names: Vec<String> },
    /// `from a.b import c` (level 0) / `from ..a import c` (level 2)
    From {
        module: Option<String>,
        names: Vec<String>,
        level: usize,
    },
}

impl ImportStatement {
    /// Top-level names this statement pulls in from outside the project.
    ///
    /// Relative from-imports never name external packages and yield nothing.
    pub fn top_level_names(&self) -> Vec<ImportName> {
        match self {
            ImportStatement::Direct { names } => names
                .iter()
                .filter_map(|n| ImportName::top_level(n))
                .collect(),
            ImportStatement::From { level, .. } if *level > 0 => Vec::new(),
            ImportStatement::From { module, .. } => module
                .as_deref()
                .and_then(ImportName::top_level)
                .into_iter()
                .collect(),
        }
    }
}

/// A file that could not be turned into a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    pub file: PathBuf,
    pub message: String,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}
