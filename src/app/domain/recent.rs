use serde::{Deserialize, Serialize};

use crate::app::services::text_ops::extract_filename;

pub const MAX_RECENT_FILES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentFile {
    pub path: String,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub opened_at: i64,
}

/// Move `path` to the front of the list, refreshing its timestamp and
/// evicting the oldest entries beyond the bound.
pub fn touch_recent(list: &mut Vec<RecentFile>, path: &str, opened_at: i64) {
    list.retain(|f| f.path != path);
    // Timestamps must stay descending even if the clock stepped backwards
    let opened_at = list
        .first()
        .map(|f| opened_at.max(f.opened_at))
        .unwrap_or(opened_at);
    list.insert(
        0,
        RecentFile {
            path: path.to_string(),
            name: extract_filename(path),
            opened_at,
        },
    );
    list.truncate(MAX_RECENT_FILES);
}

/// Repair a list read from disk: drop duplicates, order, bound.
pub fn normalize_recent(mut list: Vec<RecentFile>) -> Vec<RecentFile> {
    list.sort_by(|a, b| b.opened_at.cmp(&a.opened_at));
    let mut seen: Vec<String> = Vec::new();
    list.retain(|f| {
        if seen.contains(&f.path) {
            false
        } else {
            seen.push(f.path.clone());
            true
        }
    });
    list.truncate(MAX_RECENT_FILES);
    list
}
