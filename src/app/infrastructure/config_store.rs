use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use super::error::{AppError, Result};
use crate::app::domain::recent::{RecentFile, normalize_recent, touch_recent};
use crate::app::services::text_ops::current_timestamp_millis;

/// Recognized configuration keys.
pub mod keys {
    pub const THEME: &str = "theme";
    pub const LINE_NUMBERS: &str = "lineNumbers";
    pub const SIDEBAR_VISIBLE: &str = "workspace.sidebarVisible";
    pub const WORKSPACE_ROOT: &str = "workspace.root";
    pub const EXPANDED_FOLDERS: &str = "workspace.expandedFolders";
    pub const LAST_ACTIVE_FILE: &str = "workspace.lastActiveFile";
    pub const TABS: &str = "tabs";
    pub const ACTIVE_TAB_ID: &str = "activeTabId";
    pub const RECENT_FILES: &str = "recentFiles";
    pub const SHORTCUTS: &str = "shortcuts";
    pub const CUSTOM_TEMPLATES: &str = "customTemplates";
    pub const ADVANCED_MARKDOWN_FEATURES: &str = "advancedMarkdown.features";
    pub const AUTO_SAVE_ENABLED: &str = "autoSave.enabled";
    pub const AUTO_SAVE_DELAY: &str = "autoSave.delay";
    pub const VIEW_MODE: &str = "viewMode";
    pub const OUTLINE_VISIBLE: &str = "outline.visible";
    pub const TYPEWRITER_ENABLED: &str = "typewriter.enabled";
    pub const STATISTICS_VISIBLE: &str = "statistics.visible";
    pub const FOCUS_MODE: &str = "focusMode";
    pub const UPDATE_AUTO_CHECK: &str = "update.autoCheck";
    pub const UPDATE_LAST_CHECK: &str = "update.lastCheck";

    /// Keys owned by the open workspace, cleared when it closes.
    pub const WORKSPACE_SCOPED: [&str; 3] = [WORKSPACE_ROOT, EXPANDED_FOLDERS, LAST_ACTIVE_FILE];

    /// Keys whose owner caches them; only the owner's channels may write them.
    pub const MANAGED: [&str; 9] = [
        SHORTCUTS,
        ADVANCED_MARKDOWN_FEATURES,
        TABS,
        ACTIVE_TAB_ID,
        CUSTOM_TEMPLATES,
        RECENT_FILES,
        WORKSPACE_ROOT,
        EXPANDED_FOLDERS,
        LAST_ACTIVE_FILE,
    ];

    pub fn is_managed(key: &str) -> bool {
        MANAGED.contains(&key)
    }
}

/// Declared default for a recognized key; unknown keys have none.
pub fn default_value(key: &str) -> Option<Value> {
    let value = match key {
        keys::THEME => json!("light"),
        keys::LINE_NUMBERS => json!(true),
        keys::SIDEBAR_VISIBLE => json!(true),
        keys::WORKSPACE_ROOT => Value::Null,
        keys::EXPANDED_FOLDERS => json!([]),
        keys::LAST_ACTIVE_FILE => Value::Null,
        keys::TABS => json!([]),
        keys::ACTIVE_TAB_ID => Value::Null,
        keys::RECENT_FILES => json!([]),
        keys::SHORTCUTS => json!({}),
        keys::CUSTOM_TEMPLATES => json!([]),
        keys::ADVANCED_MARKDOWN_FEATURES => {
            json!({"mermaid": true, "katex": true, "callouts": true})
        }
        keys::AUTO_SAVE_ENABLED => json!(false),
        keys::AUTO_SAVE_DELAY => json!(2000),
        keys::VIEW_MODE => json!("split"),
        keys::OUTLINE_VISIBLE => json!(false),
        keys::TYPEWRITER_ENABLED => json!(false),
        keys::STATISTICS_VISIBLE => json!(false),
        keys::FOCUS_MODE => json!(false),
        keys::UPDATE_AUTO_CHECK => json!(true),
        keys::UPDATE_LAST_CHECK => json!(0),
        _ => return None,
    };
    Some(value)
}

/// The config store is shared by every manager on the main loop.
pub type SharedConfig = Rc<RefCell<ConfigStore>>;

/// Typed key/value persistence backed by a single JSON document.
pub struct ConfigStore {
    path: PathBuf,
    values: Map<String, Value>,
    load_error: Option<String>,
}

impl ConfigStore {
    /// Get config file path (cross-platform)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("markpad");
        path.push("config.json");
        path
    }

    /// Load the store from `path`.
    ///
    /// A missing file yields defaults. A malformed file is moved aside to
    /// `*.bak`, replaced with defaults, and the parse error is kept in
    /// [`ConfigStore::load_error`].
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self {
            path,
            values: Map::new(),
            load_error: None,
        };

        match fs::read_to_string(&store.path) {
            Ok(contents) => match serde_json::from_str::<Value>(&contents) {
                Ok(Value::Object(map)) => {
                    tracing::info!(path = %store.path.display(), keys = map.len(), "config loaded");
                    store.values = map;
                }
                Ok(_) => store.recover("config root is not a JSON object".to_string()),
                Err(e) => store.recover(e.to_string()),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %store.path.display(), "no config file, using defaults");
            }
            Err(e) => {
                tracing::warn!(path = %store.path.display(), error = %e, "failed to read config, using defaults");
                store.load_error = Some(e.to_string());
            }
        }

        store
    }

    pub fn into_shared(self) -> SharedConfig {
        Rc::new(RefCell::new(self))
    }

    fn recover(&mut self, reason: String) {
        tracing::warn!(path = %self.path.display(), %reason, "malformed config replaced with defaults");
        let backup = self.path.with_extension("json.bak");
        if let Err(e) = fs::rename(&self.path, &backup) {
            tracing::warn!(error = %e, "could not back up malformed config");
        }
        self.values = Map::new();
        self.load_error = Some(reason);
        if let Err(e) = self.persist() {
            tracing::warn!(error = %e, "could not write default config");
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse or read failure encountered while loading, if any.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Stored value, else the declared default.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned().or_else(|| default_value(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Typed read. A stored value of the wrong shape falls back to the default.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if let Some(stored) = self.values.get(key) {
            match serde_json::from_value(stored.clone()) {
                Ok(v) => return Some(v),
                Err(e) => tracing::warn!(key, error = %e, "stored config value has wrong shape"),
            }
        }
        default_value(key).and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get_as::<bool>(key).unwrap_or(false)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get_as::<Option<String>>(key).flatten()
    }

    /// Store `value` under `key` and persist. Re-setting an equal value
    /// does not touch the disk.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        if key.is_empty() {
            return Err(AppError::InvalidArgument("config key is empty".to_string()));
        }
        if self.values.get(key) == Some(&value) {
            return Ok(());
        }
        self.values.insert(key.to_string(), value);
        self.persist()
    }

    pub fn set_as<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value)
    }

    /// Remove several keys with a single write.
    pub fn remove_all(&mut self, keys: &[&str]) -> Result<()> {
        let mut changed = false;
        for key in keys {
            changed |= self.values.remove(*key).is_some();
        }
        if changed { self.persist() } else { Ok(()) }
    }

    /// Write the whole store: temp file, fsync, rename.
    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| AppError::io(parent, e))?;
            }
        }

        let content = serde_json::to_string_pretty(&self.values)?;
        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp_path).map_err(|e| AppError::io(&temp_path, e))?;
            file.write_all(content.as_bytes())
                .map_err(|e| AppError::io(&temp_path, e))?;
            file.sync_all().map_err(|e| AppError::io(&temp_path, e))?;
        }
        fs::rename(&temp_path, &self.path).map_err(|e| AppError::io(&self.path, e))?;
        tracing::trace!(path = %self.path.display(), "config persisted");
        Ok(())
    }

    /// Recent files, most recent first.
    pub fn recent_files(&self) -> Vec<RecentFile> {
        normalize_recent(self.get_as(keys::RECENT_FILES).unwrap_or_default())
    }

    pub fn add_recent_file(&mut self, path: &str) -> Result<Vec<RecentFile>> {
        let mut list = self.recent_files();
        touch_recent(&mut list, path, current_timestamp_millis());
        self.set_as(keys::RECENT_FILES, &list)?;
        Ok(list)
    }

    pub fn remove_recent_file(&mut self, path: &str) -> Result<Vec<RecentFile>> {
        let mut list = self.recent_files();
        list.retain(|f| f.path != path);
        self.set_as(keys::RECENT_FILES, &list)?;
        Ok(list)
    }

    pub fn clear_recent_files(&mut self) -> Result<()> {
        self.set(keys::RECENT_FILES, json!([]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::open(dir.path().join("config.json"))
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.load_error().is_none());
        assert_eq!(store.get(keys::LINE_NUMBERS), Some(json!(true)));
        assert_eq!(store.get("no.such.key"), None);
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_set_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set(keys::THEME, json!("dark")).unwrap();
        store.set("custom.key", json!({"a": 1})).unwrap();

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.get(keys::THEME), Some(json!("dark")));
        assert_eq!(reloaded.get("custom.key"), Some(json!({"a": 1})));
        assert!(!dir.path().join("config.json.tmp").exists());
    }

    #[test]
    fn test_malformed_file_replaced_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let store = ConfigStore::open(&path);
        assert!(store.load_error().is_some());
        assert_eq!(store.get(keys::THEME), Some(json!("light")));
        assert!(dir.path().join("config.json.bak").exists());
        let rewritten: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(rewritten, json!({}));
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"futureKey": [1,2,3], "theme": "dark"}"#).unwrap();

        let mut store = ConfigStore::open(&path);
        store.set(keys::LINE_NUMBERS, json!(false)).unwrap();
        let reloaded = ConfigStore::open(&path);
        assert_eq!(reloaded.get("futureKey"), Some(json!([1, 2, 3])));
        assert_eq!(reloaded.get(keys::LINE_NUMBERS), Some(json!(false)));
    }

    #[test]
    fn test_wrong_shape_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set(keys::LINE_NUMBERS, json!("yes")).unwrap();
        assert!(store.get_bool(keys::LINE_NUMBERS));
    }

    #[test]
    fn test_recent_files_lru() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        for p in ["/x", "/y", "/z", "/x"] {
            store.add_recent_file(p).unwrap();
        }
        let recent = store.recent_files();
        let paths: Vec<&str> = recent.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["/x", "/z", "/y"]);

        store.remove_recent_file("/z").unwrap();
        assert_eq!(store_in(&dir).recent_files().len(), 2);
        store.clear_recent_files().unwrap();
        assert!(store.recent_files().is_empty());
    }

    #[test]
    fn test_remove_all_clears_keys() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set(keys::WORKSPACE_ROOT, json!("/w")).unwrap();
        store.set(keys::LAST_ACTIVE_FILE, json!("/w/a.md")).unwrap();
        store.remove_all(&keys::WORKSPACE_SCOPED).unwrap();
        assert_eq!(store_in(&dir).get_string(keys::WORKSPACE_ROOT), None);
        assert_eq!(store.get(keys::LAST_ACTIVE_FILE), Some(Value::Null));
    }
}
