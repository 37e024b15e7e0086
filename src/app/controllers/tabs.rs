use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::app::domain::tab::{CursorPosition, PersistedTab, Tab, TabId};
use crate::app::infrastructure::config_store::{SharedConfig, keys};
use crate::app::infrastructure::error::{AppError, Result};

/// Read a file for a tab, mapping a missing file to `NOT_FOUND`.
pub fn read_document(path: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::NotFound(path.to_string()),
        _ => AppError::io(path, e),
    })
}

pub struct TabManager {
    tabs: Vec<Tab>,
    active_id: Option<TabId>,
    untitled_counter: u32,
    config: SharedConfig,
}

impl TabManager {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            tabs: Vec::new(),
            active_id: None,
            untitled_counter: 0,
            config,
        }
    }

    /// Open a tab. A path that is already open returns (and activates) the
    /// existing tab; otherwise content defaults to the file on disk.
    pub fn create(&mut self, path: Option<&str>, content: Option<String>) -> Result<Tab> {
        let tab = match path {
            Some(path) => {
                if let Some(existing) = self.find_by_path(path) {
                    let id = existing.id.clone();
                    self.set_active(Some(id.clone()));
                    return self.cloned(&id);
                }
                let content = match content {
                    Some(c) => c,
                    None => read_document(path)?,
                };
                Tab::new_from_file(path.to_string(), content)
            }
            None => {
                self.untitled_counter += 1;
                let mut tab = Tab::new_untitled(self.untitled_counter);
                if let Some(c) = content {
                    tab.modified = !c.is_empty();
                    tab.content = c;
                }
                tab
            }
        };

        let id = tab.id.clone();
        tracing::debug!(tab = %id, path = ?tab.file_path, "tab created");
        self.tabs.push(tab);
        self.set_active(Some(id.clone()));
        self.cloned(&id)
    }

    /// Remove a tab. Activation passes to the right neighbor, else the left.
    pub fn close(&mut self, id: &TabId) -> Result<()> {
        let idx = self.index_of(id)?;
        self.tabs.remove(idx);

        if self.active_id.as_ref() == Some(id) {
            let next = if self.tabs.is_empty() {
                None
            } else if idx < self.tabs.len() {
                Some(self.tabs[idx].id.clone())
            } else {
                Some(self.tabs[idx - 1].id.clone())
            };
            self.set_active(next);
        }
        Ok(())
    }

    pub fn switch(&mut self, id: &TabId) -> Result<Tab> {
        self.index_of(id)?;
        self.set_active(Some(id.clone()));
        self.cloned(id)
    }

    pub fn get(&self, id: &TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| &t.id == id)
    }

    pub fn active(&self) -> Option<&Tab> {
        let id = self.active_id.as_ref()?;
        self.get(id)
    }

    pub fn all(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn modified(&self) -> Vec<&Tab> {
        self.tabs.iter().filter(|t| t.modified).collect()
    }

    pub fn find_by_path(&self, path: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.file_path.as_deref() == Some(path))
    }

    /// Replace the buffer. Returns the resulting modified flag.
    pub fn update_content(&mut self, id: &TabId, content: String) -> Result<bool> {
        let tab = self.tab_mut(id)?;
        tab.modified = content != tab.saved_content;
        tab.content = content;
        Ok(tab.modified)
    }

    pub fn update_scroll(&mut self, id: &TabId, scroll: f64) -> Result<()> {
        if !scroll.is_finite() {
            return Err(AppError::InvalidArgument("scroll position must be finite".to_string()));
        }
        self.tab_mut(id)?.scroll_position = scroll;
        Ok(())
    }

    pub fn update_cursor(&mut self, id: &TabId, cursor: CursorPosition) -> Result<()> {
        self.tab_mut(id)?.cursor = cursor;
        Ok(())
    }

    pub fn update_file_path(&mut self, id: &TabId, path: &str) -> Result<Tab> {
        if path.is_empty() {
            return Err(AppError::InvalidArgument("file path is empty".to_string()));
        }
        let tab = self.tab_mut(id)?;
        tab.set_file_path(path.to_string());
        Ok(tab.clone())
    }

    /// Clearing the flag records the current buffer as the saved content.
    pub fn mark_modified(&mut self, id: &TabId, modified: bool) -> Result<()> {
        let tab = self.tab_mut(id)?;
        tab.modified = modified;
        if !modified {
            tab.saved_content = tab.content.clone();
        }
        Ok(())
    }

    /// Tab after the active one, wrapping around.
    pub fn next(&self) -> Option<&Tab> {
        self.neighbor(1)
    }

    /// Tab before the active one, wrapping around.
    pub fn previous(&self) -> Option<&Tab> {
        self.neighbor(self.tabs.len().saturating_sub(1))
    }

    fn neighbor(&self, step: usize) -> Option<&Tab> {
        if self.tabs.is_empty() {
            return None;
        }
        let idx = self
            .active_id
            .as_ref()
            .and_then(|id| self.tabs.iter().position(|t| &t.id == id));
        match idx {
            Some(i) => self.tabs.get((i + step) % self.tabs.len()),
            None => self.tabs.first(),
        }
    }

    /// Persist the ordered file-backed tabs and the active id.
    ///
    /// Buffer contents are never written; untitled tabs are not persisted.
    pub fn save(&self) -> Result<()> {
        let persisted: Vec<PersistedTab> = self
            .tabs
            .iter()
            .filter(|t| t.file_path.is_some())
            .map(PersistedTab::from)
            .collect();
        let active = self
            .active()
            .filter(|t| t.file_path.is_some())
            .map(|t| Value::String(t.id.to_string()))
            .unwrap_or(Value::Null);

        let mut config = self.config.borrow_mut();
        config.set_as(keys::TABS, &persisted)?;
        config.set(keys::ACTIVE_TAB_ID, active)?;
        tracing::debug!(count = persisted.len(), "tabs saved");
        Ok(())
    }

    /// Rebuild the tab set from the persisted list.
    ///
    /// Entries whose file has vanished are skipped. Restored tabs get fresh
    /// ids; if the recorded active tab was skipped the first tab becomes active.
    pub fn restore(&mut self) -> Result<Vec<Tab>> {
        let (persisted, active_id) = {
            let config = self.config.borrow();
            let persisted: Vec<PersistedTab> = config.get_as(keys::TABS).unwrap_or_default();
            let active_id = config
                .get_string(keys::ACTIVE_TAB_ID)
                .and_then(|s| TabId::parse(&s));
            (persisted, active_id)
        };

        let mut restored = Vec::new();
        let mut new_active = None;
        for entry in persisted {
            let Some(path) = entry.file_path else { continue };
            if !Path::new(&path).is_file() {
                tracing::info!(%path, "skipping tab whose file no longer exists");
                continue;
            }
            let content = match read_document(&path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(%path, error = %e, "skipping unreadable tab");
                    continue;
                }
            };
            let mut tab = Tab::new_from_file(path, content);
            tab.scroll_position = entry.scroll_position;
            tab.cursor = entry.cursor;
            if active_id.as_ref() == Some(&entry.id) {
                new_active = Some(tab.id.clone());
            }
            restored.push(tab);
        }

        self.tabs = restored;
        let active = new_active.or_else(|| self.tabs.first().map(|t| t.id.clone()));
        self.set_active(active);
        tracing::info!(count = self.tabs.len(), "tabs restored");
        Ok(self.tabs.clone())
    }

    fn set_active(&mut self, id: Option<TabId>) {
        for tab in &mut self.tabs {
            tab.active = Some(&tab.id) == id.as_ref();
        }
        self.active_id = id;
    }

    fn index_of(&self, id: &TabId) -> Result<usize> {
        self.tabs
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| AppError::NotFound(format!("tab {}", id)))
    }

    fn tab_mut(&mut self, id: &TabId) -> Result<&mut Tab> {
        self.tabs
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| AppError::NotFound(format!("tab {}", id)))
    }

    fn cloned(&self, id: &TabId) -> Result<Tab> {
        self.get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("tab {}", id)))
    }
}
