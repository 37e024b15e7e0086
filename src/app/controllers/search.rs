use std::fs;
use std::path::{Path, PathBuf};

use regex_lite::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::workspace::list_dir;
use crate::app::domain::workspace::NodeKind;
use crate::app::infrastructure::error::{AppError, Result};
use crate::app::services::text_ops::{extract_filename, is_markdown_file};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
    pub use_regex: bool,
}

/// One match inside a line. Offsets are byte offsets into `line_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMatch {
    /// 1-based line number.
    pub line: usize,
    pub line_text: String,
    pub matches: Vec<MatchSpan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    pub file_path: String,
    pub file_name: String,
    pub relative_path: String,
    pub matches: Vec<LineMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub results: Vec<FileResult>,
    pub total_matches: usize,
    pub total_files: usize,
}

/// Compile the effective pattern. An invalid regex degrades to a literal
/// search with the other options preserved.
pub fn build_matcher(text: &str, options: SearchOptions) -> Result<Regex> {
    let literal = regex_lite::escape(text);
    let base = if options.use_regex {
        match Regex::new(text) {
            Ok(_) => text.to_string(),
            Err(e) => {
                tracing::warn!(pattern = text, error = %e, "invalid regex, searching literally");
                literal.clone()
            }
        }
    } else {
        literal.clone()
    };

    let wrap = |p: &str| {
        if options.whole_word {
            format!(r"\b(?:{})\b", p)
        } else {
            p.to_string()
        }
    };

    RegexBuilder::new(&wrap(&base))
        .case_insensitive(!options.case_sensitive)
        .build()
        .or_else(|_| {
            RegexBuilder::new(&wrap(&literal))
                .case_insensitive(!options.case_sensitive)
                .build()
        })
        .map_err(|e| AppError::InvalidArgument(e.to_string()))
}

/// All matches in `line`. A zero-width match advances the cursor by one
/// character so the scan always terminates.
pub fn match_line(re: &Regex, line: &str) -> Vec<MatchSpan> {
    let mut spans = Vec::new();
    let mut pos = 0;
    while pos <= line.len() {
        let Some(m) = re.find_at(line, pos) else { break };
        spans.push(MatchSpan {
            start: m.start(),
            end: m.end(),
            text: m.as_str().to_string(),
        });
        if m.end() > m.start() {
            pos = m.end();
        } else {
            match line[m.end()..].chars().next() {
                Some(c) => pos = m.end() + c.len_utf8(),
                None => break,
            }
        }
    }
    spans
}

/// Markdown files under `dir`, skipping hidden entries and `node_modules`.
pub fn collect_markdown_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let entries = match list_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable folder");
            return;
        }
    };
    for (path, _, kind) in entries {
        match kind {
            NodeKind::Folder => collect_markdown_files(&path, out),
            NodeKind::File if is_markdown_file(&path) => out.push(path),
            NodeKind::File => {}
        }
    }
}

#[derive(Debug, Default)]
pub struct GlobalSearchManager;

impl GlobalSearchManager {
    pub fn new() -> Self {
        Self
    }

    pub fn search(
        &self,
        workspace_root: Option<&Path>,
        text: &str,
        options: SearchOptions,
    ) -> Result<SearchResponse> {
        let root = workspace_root.ok_or(AppError::NoWorkspace)?;
        if text.trim().is_empty() {
            return Err(AppError::EmptyQuery);
        }
        let re = build_matcher(text, options)?;

        let mut files = Vec::new();
        collect_markdown_files(root, &mut files);

        let mut results = Vec::new();
        let mut total_matches = 0;
        for path in files {
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };

            let mut line_matches = Vec::new();
            for (idx, line) in content.lines().enumerate() {
                let spans = match_line(&re, line);
                if spans.is_empty() {
                    continue;
                }
                total_matches += spans.len();
                line_matches.push(LineMatch {
                    line: idx + 1,
                    line_text: line.to_string(),
                    matches: spans,
                });
            }

            if !line_matches.is_empty() {
                let file_path = path.to_string_lossy().to_string();
                let relative_path = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .to_string();
                results.push(FileResult {
                    file_name: extract_filename(&file_path),
                    file_path,
                    relative_path,
                    matches: line_matches,
                });
            }
        }

        tracing::debug!(query = text, files = results.len(), total_matches, "search finished");
        Ok(SearchResponse {
            success: true,
            total_files: results.len(),
            results,
            total_matches,
        })
    }
}
