//! The application action namespace.
//!
//! Menu leaves, keyboard shortcut defaults and `menu:action` event names all
//! come from this single table.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionId {
    New,
    Open,
    OpenFolder,
    OpenRecent,
    Save,
    SaveAs,
    SaveAll,
    CloseTab,
    NextTab,
    PreviousTab,
    ExportHtml,
    ExportPdf,
    InsertTemplate,
    Undo,
    Redo,
    Find,
    FindInFiles,
    ToggleTheme,
    ToggleSidebar,
    ToggleOutline,
    ToggleTypewriter,
    FocusMode,
    ToggleLineNumbers,
    ToggleStatistics,
    ViewModeEditor,
    ViewModePreview,
    ViewModeSplit,
    ToggleAutoSave,
    AutoSaveSettings,
    OpenKeyboardShortcuts,
    About,
}

impl ActionId {
    pub const ALL: [ActionId; 31] = [
        ActionId::New,
        ActionId::Open,
        ActionId::OpenFolder,
        ActionId::OpenRecent,
        ActionId::Save,
        ActionId::SaveAs,
        ActionId::SaveAll,
        ActionId::CloseTab,
        ActionId::NextTab,
        ActionId::PreviousTab,
        ActionId::ExportHtml,
        ActionId::ExportPdf,
        ActionId::InsertTemplate,
        ActionId::Undo,
        ActionId::Redo,
        ActionId::Find,
        ActionId::FindInFiles,
        ActionId::ToggleTheme,
        ActionId::ToggleSidebar,
        ActionId::ToggleOutline,
        ActionId::ToggleTypewriter,
        ActionId::FocusMode,
        ActionId::ToggleLineNumbers,
        ActionId::ToggleStatistics,
        ActionId::ViewModeEditor,
        ActionId::ViewModePreview,
        ActionId::ViewModeSplit,
        ActionId::ToggleAutoSave,
        ActionId::AutoSaveSettings,
        ActionId::OpenKeyboardShortcuts,
        ActionId::About,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionId::New => "new",
            ActionId::Open => "open",
            ActionId::OpenFolder => "open-folder",
            ActionId::OpenRecent => "open-recent",
            ActionId::Save => "save",
            ActionId::SaveAs => "save-as",
            ActionId::SaveAll => "save-all",
            ActionId::CloseTab => "close-tab",
            ActionId::NextTab => "next-tab",
            ActionId::PreviousTab => "previous-tab",
            ActionId::ExportHtml => "export-html",
            ActionId::ExportPdf => "export-pdf",
            ActionId::InsertTemplate => "insert-template",
            ActionId::Undo => "undo",
            ActionId::Redo => "redo",
            ActionId::Find => "find",
            ActionId::FindInFiles => "find-in-files",
            ActionId::ToggleTheme => "toggle-theme",
            ActionId::ToggleSidebar => "toggle-sidebar",
            ActionId::ToggleOutline => "toggle-outline",
            ActionId::ToggleTypewriter => "toggle-typewriter",
            ActionId::FocusMode => "focus-mode",
            ActionId::ToggleLineNumbers => "toggle-line-numbers",
            ActionId::ToggleStatistics => "toggle-statistics",
            ActionId::ViewModeEditor => "view-mode-editor",
            ActionId::ViewModePreview => "view-mode-preview",
            ActionId::ViewModeSplit => "view-mode-split",
            ActionId::ToggleAutoSave => "toggle-auto-save",
            ActionId::AutoSaveSettings => "auto-save-settings",
            ActionId::OpenKeyboardShortcuts => "open-keyboard-shortcuts",
            ActionId::About => "about",
        }
    }

    pub fn from_str(s: &str) -> Option<ActionId> {
        ActionId::ALL.iter().copied().find(|a| a.as_str() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionId::New => "New",
            ActionId::Open => "Open...",
            ActionId::OpenFolder => "Open Folder...",
            ActionId::OpenRecent => "Open Recent",
            ActionId::Save => "Save",
            ActionId::SaveAs => "Save As...",
            ActionId::SaveAll => "Save All",
            ActionId::CloseTab => "Close Tab",
            ActionId::NextTab => "Next Tab",
            ActionId::PreviousTab => "Previous Tab",
            ActionId::ExportHtml => "Export as HTML...",
            ActionId::ExportPdf => "Export as PDF...",
            ActionId::InsertTemplate => "Insert Template...",
            ActionId::Undo => "Undo",
            ActionId::Redo => "Redo",
            ActionId::Find => "Find...",
            ActionId::FindInFiles => "Find in Files...",
            ActionId::ToggleTheme => "Toggle Theme",
            ActionId::ToggleSidebar => "Toggle Sidebar",
            ActionId::ToggleOutline => "Toggle Outline",
            ActionId::ToggleTypewriter => "Typewriter Mode",
            ActionId::FocusMode => "Focus Mode",
            ActionId::ToggleLineNumbers => "Line Numbers",
            ActionId::ToggleStatistics => "Statistics",
            ActionId::ViewModeEditor => "Editor Only",
            ActionId::ViewModePreview => "Preview Only",
            ActionId::ViewModeSplit => "Split View",
            ActionId::ToggleAutoSave => "Auto Save",
            ActionId::AutoSaveSettings => "Auto Save Settings...",
            ActionId::OpenKeyboardShortcuts => "Keyboard Shortcuts...",
            ActionId::About => "About MarkPad",
        }
    }

    /// Default binding, written with `Ctrl` as the primary modifier
    /// (rendered as `Cmd` on macOS).
    ///
    /// Toggle Outline has no default: the accelerator it historically shared
    /// with Open Folder is left unassigned rather than guessed.
    pub fn default_binding(&self) -> Option<&'static str> {
        match self {
            ActionId::New => Some("Ctrl+N"),
            ActionId::Open => Some("Ctrl+O"),
            ActionId::OpenFolder => Some("Ctrl+Shift+O"),
            ActionId::OpenRecent => None,
            ActionId::Save => Some("Ctrl+S"),
            ActionId::SaveAs => Some("Ctrl+Shift+S"),
            ActionId::SaveAll => Some("Ctrl+Alt+S"),
            ActionId::CloseTab => Some("Ctrl+W"),
            ActionId::NextTab => Some("Ctrl+Tab"),
            ActionId::PreviousTab => Some("Ctrl+Shift+Tab"),
            ActionId::ExportHtml => Some("Ctrl+Shift+E"),
            ActionId::ExportPdf => Some("Ctrl+Shift+P"),
            ActionId::InsertTemplate => Some("Ctrl+Shift+N"),
            ActionId::Undo => Some("Ctrl+Z"),
            ActionId::Redo => Some("Ctrl+Shift+Z"),
            ActionId::Find => Some("Ctrl+F"),
            ActionId::FindInFiles => Some("Ctrl+Shift+F"),
            ActionId::ToggleTheme => Some("Ctrl+Shift+T"),
            ActionId::ToggleSidebar => Some("Ctrl+B"),
            ActionId::ToggleOutline => None,
            ActionId::ToggleTypewriter => Some("Ctrl+Alt+T"),
            ActionId::FocusMode => Some("Ctrl+Shift+M"),
            ActionId::ToggleLineNumbers => Some("Ctrl+Alt+L"),
            ActionId::ToggleStatistics => Some("Ctrl+Alt+I"),
            ActionId::ViewModeEditor => Some("Ctrl+1"),
            ActionId::ViewModePreview => Some("Ctrl+2"),
            ActionId::ViewModeSplit => Some("Ctrl+3"),
            ActionId::ToggleAutoSave => None,
            ActionId::AutoSaveSettings => None,
            ActionId::OpenKeyboardShortcuts => Some("Ctrl+K"),
            ActionId::About => None,
        }
    }
}

impl Serialize for ActionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ActionId::from_str(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown action: {}", s)))
    }
}
