use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Extract filename from a file path
///
/// Returns the filename component of a path, or "Unknown" if it can't be extracted.
pub fn extract_filename(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != ".")
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Check if a file path points to a markdown file.
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            lower == "md" || lower == "markdown"
        })
        .unwrap_or(false)
}

/// Entries never shown in the workspace tree nor searched.
pub fn is_excluded_entry(name: &str) -> bool {
    name.starts_with('.') || name == "node_modules"
}

/// Distinct `{{token}}` placeholders in source order.
///
/// A token is any run of characters other than `}`; `{{}}` is not a placeholder.
pub fn find_placeholders(content: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    let mut rest = content;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(len) = after.find('}') else { break };
        if len > 0 && after[len..].starts_with("}}") {
            let placeholder = &rest[start..start + 2 + len + 2];
            if !found.iter().any(|p| p == placeholder) {
                found.push(placeholder.to_string());
            }
            rest = &after[len + 2..];
        } else {
            rest = &rest[start + 1..];
        }
    }
    found
}

/// Byte offset of the first placeholder, if any.
pub fn first_placeholder_position(content: &str) -> Option<usize> {
    let first = find_placeholders(content).into_iter().next()?;
    content.find(&first)
}

/// Current Unix timestamp in milliseconds
pub fn current_timestamp_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_filename_from_path() {
        assert_eq!(extract_filename("/home/user/notes.md"), "notes.md");
        assert_eq!(extract_filename("readme.markdown"), "readme.markdown");
    }

    #[test]
    fn test_extract_filename_edge_cases() {
        assert_eq!(extract_filename("/home/user/"), "user");
        assert_eq!(extract_filename(""), "Unknown");
        assert_eq!(extract_filename("/"), "Unknown");
    }

    #[test]
    fn test_is_markdown_file() {
        assert!(is_markdown_file(Path::new("/a/b.md")));
        assert!(is_markdown_file(Path::new("/a/B.MARKDOWN")));
        assert!(!is_markdown_file(Path::new("/a/b.txt")));
        assert!(!is_markdown_file(Path::new("/a/md")));
    }

    #[test]
    fn test_excluded_entries() {
        assert!(is_excluded_entry(".git"));
        assert!(is_excluded_entry("node_modules"));
        assert!(!is_excluded_entry("docs"));
    }

    #[test]
    fn test_find_placeholders_dedup_in_order() {
        let content = "# {{title}}\n{{author}} wrote {{title}} on {{date}}";
        assert_eq!(
            find_placeholders(content),
            vec!["{{title}}", "{{author}}", "{{date}}"]
        );
    }

    #[test]
    fn test_find_placeholders_ignores_malformed() {
        assert!(find_placeholders("no braces").is_empty());
        assert!(find_placeholders("{{}} and {{open").is_empty());
        assert_eq!(find_placeholders("{{{x}}"), vec!["{{{x}}"]);
        assert_eq!(find_placeholders("{{a b}}"), vec!["{{a b}}"]);
    }

    #[test]
    fn test_first_placeholder_position() {
        assert_eq!(first_placeholder_position("Hello {{name}}!"), Some(6));
        assert_eq!(first_placeholder_position("Hello"), None);
    }
}
