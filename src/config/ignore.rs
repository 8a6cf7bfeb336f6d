use std::path::Path;

pub const IGNORE_FILE: &str = ".reqpinignore";

/// Load `.reqpinignore` by walking up from the given directory.
/// Lines are glob patterns; blank lines and `#` comments are skipped.
pub fn load_reqpinignore(start: &Path) -> Vec<String> {
    let mut dir = start.to_path_buf();
    loop {
        let ignore_path = dir.join(IGNORE_FILE);
        if ignore_path.is_file() {
            match std::fs::read_to_string(&ignore_path) {
                Ok(content) => return parse_ignore_patterns(&content),
                Err(e) => {
                    tracing::warn!("could not read {}: {e}", ignore_path.display());
                    return Vec::new();
                }
            }
        }
        if !dir.pop() {
            break;
        }
    }
    Vec::new()
}

fn parse_ignore_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_string())
        .collect()
}
