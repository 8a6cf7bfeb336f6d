use crate::parse::common::{ImportName, ImportStatement, ParseFailure};
use std::collections::BTreeSet;
use std::path::Path;
use streaming_iterator::StreamingIterator;

const IMPORT_QUERY: &str = r#"[(import_statement) (import_from_statement)] @stmt"#;

pub struct PythonFrontend;

impl PythonFrontend {
    pub fn new() -> Self {
        Self
    }

    pub fn language(&self) -> tree_sitter::Language {
        tree_sitter_python::LANGUAGE.into()
    }

    /// Read `path` and collect the top-level names it imports.
    pub fn extract_file(&self, path: &Path) -> Result<BTreeSet<ImportName>, ParseFailure> {
        let source = std::fs::read(path).map_err(|e| ParseFailure {
            file: path.to_path_buf(),
            message: format!("could not read file: {e}"),
        })?;
        if std::str::from_utf8(&source).is_err() {
            return Err(ParseFailure {
                file: path.to_path_buf(),
                message: "file is not valid UTF-8".to_string(),
            });
        }
        self.extract_imports(&source, path)
    }

    /// Collect the top-level names imported by `source`.
    pub fn extract_imports(
        &self,
        source: &[u8],
        file_path: &Path,
    ) -> Result<BTreeSet<ImportName>, ParseFailure> {
        let statements = self.parse_statements(source, file_path)?;
        Ok(statements
            .iter()
            .flat_map(ImportStatement::top_level_names)
            .collect())
    }

    /// Parse `source` and return every import statement in document order.
    ///
    /// A tree containing error or missing nodes is rejected as a whole.
    pub fn parse_statements(
        &self,
        source: &[u8],
        file_path: &Path,
    ) -> Result<Vec<ImportStatement>, ParseFailure> {
        let failure = |message: String| ParseFailure {
            file: file_path.to_path_buf(),
            message,
        };

        let lang = self.language();
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&lang)
            .map_err(|e| failure(format!("failed to load Python grammar: {e}")))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| failure("parser produced no tree".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            let message = match first_error(root) {
                Some(node) => format!(
                    "syntax error at line {}, column {}",
                    node.start_position().row + 1,
                    node.start_position().column + 1
                ),
                None => "syntax error".to_string(),
            };
            return Err(failure(message));
        }

        let query = tree_sitter::Query::new(&lang, IMPORT_QUERY)
            .map_err(|e| failure(format!("failed to compile import query: {e}")))?;

        let mut statements = Vec::new();
        let mut cursor = tree_sitter::QueryCursor::new();
        let mut matches = cursor.matches(&query, root, source);
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                let statement = match node.kind() {
                    "import_statement" => direct_import(node, source),
                    "import_from_statement" => from_import(node, source),
                    _ => None,
                };
                statements.extend(statement);
            }
        }

        Ok(statements)
    }
}

impl Default for PythonFrontend {
    fn default() -> Self {
        Self::new()
    }
}

fn direct_import(node: tree_sitter::Node, source: &[u8]) -> Option<ImportStatement> {
    let names = imported_names(node, source);
    if names.is_empty() {
        return None;
    }
    Some(ImportStatement::Direct { names })
}

fn from_import(node: tree_sitter::Node, source: &[u8]) -> Option<ImportStatement> {
    let module_node = node.child_by_field_name("module_name")?;

    let (module, level) = if module_node.kind() == "relative_import" {
        let mut cursor = module_node.walk();
        let mut level = 0;
        let mut module = None;
        for child in module_node.named_children(&mut cursor) {
            match child.kind() {
                "import_prefix" => {
                    level = child
                        .utf8_text(source)
                        .ok()?
                        .chars()
                        .filter(|&c| c == '.')
                        .count();
                }
                _ => module = dotted_path(child, source),
            }
        }
        (module, level)
    } else {
        (Some(dotted_path(module_node, source)?), 0)
    };

    Some(ImportStatement::From {
        module,
        names: imported_names(node, source),
        level,
    })
}

/// Targets bound by the `name` field, looking through `as` aliases.
fn imported_names(node: tree_sitter::Node, source: &[u8]) -> Vec<String> {
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .filter_map(|child| {
            let target = if child.kind() == "aliased_import" {
                child.child_by_field_name("name")?
            } else {
                child
            };
            dotted_path(target, source)
        })
        .collect()
}

/// `a.b.c` rebuilt from the identifiers of a `dotted_name`, so line
/// continuations and spacing around the dots never reach a name.
fn dotted_path(node: tree_sitter::Node, source: &[u8]) -> Option<String> {
    let segments: Vec<&str> = if node.kind() == "identifier" {
        vec![node.utf8_text(source).ok()?]
    } else {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|c| c.kind() == "identifier")
            .filter_map(|c| c.utf8_text(source).ok())
            .collect()
    };
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("."))
}

fn first_error(node: tree_sitter::Node) -> Option<tree_sitter::Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error() || c.is_missing())
        .find_map(first_error)
}
