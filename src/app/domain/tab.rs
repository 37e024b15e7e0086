use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::services::text_ops::extract_filename;

/// Opaque tab identifier, stable for the tab's lifetime and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub Uuid);

impl TabId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPosition {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub file_path: Option<String>,
    pub content: String,
    pub modified: bool,
    pub scroll_position: f64,
    pub cursor: CursorPosition,
    pub title: String,
    pub active: bool,
    /// Content as last read from or written to disk.
    #[serde(skip)]
    pub saved_content: String,
}

impl Tab {
    pub fn new_untitled(counter: u32) -> Self {
        Self {
            id: TabId::fresh(),
            file_path: None,
            content: String::new(),
            modified: false,
            scroll_position: 0.0,
            cursor: CursorPosition::default(),
            title: format!("Untitled {}", counter),
            active: false,
            saved_content: String::new(),
        }
    }

    pub fn new_from_file(path: String, content: String) -> Self {
        Self {
            id: TabId::fresh(),
            title: extract_filename(&path),
            file_path: Some(path),
            saved_content: content.clone(),
            content,
            modified: false,
            scroll_position: 0.0,
            cursor: CursorPosition::default(),
            active: false,
        }
    }

    pub fn set_file_path(&mut self, path: String) {
        self.title = extract_filename(&path);
        self.file_path = Some(path);
    }
}

/// The persisted shape of a tab: buffer contents are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTab {
    pub id: TabId,
    pub file_path: Option<String>,
    #[serde(default)]
    pub modified: bool,
    #[serde(default)]
    pub scroll_position: f64,
    #[serde(default)]
    pub cursor: CursorPosition,
}

impl From<&Tab> for PersistedTab {
    fn from(tab: &Tab) -> Self {
        Self {
            id: tab.id.clone(),
            file_path: tab.file_path.clone(),
            modified: tab.modified,
            scroll_position: tab.scroll_position,
            cursor: tab.cursor,
        }
    }
}
