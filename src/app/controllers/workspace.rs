use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::app::domain::workspace::{NodeKind, TreeNode};
use crate::app::infrastructure::config_store::{SharedConfig, keys};
use crate::app::infrastructure::error::{AppError, Result};
use crate::app::services::text_ops::{extract_filename, is_excluded_entry};

/// Visible children of `dir`, folders first, then by case-insensitive name.
/// Symbolic links to folders are left out.
pub fn list_dir(dir: &Path) -> std::io::Result<Vec<(PathBuf, String, NodeKind)>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().to_string();
        if is_excluded_entry(&name) {
            continue;
        }
        let path = entry.path();
        let kind = match entry.file_type() {
            Ok(ft) if ft.is_dir() => NodeKind::Folder,
            // Linked folders are never descended into; linked files resolve normally
            Ok(ft) if ft.is_symlink() => {
                if !path.is_file() {
                    continue;
                }
                NodeKind::File
            }
            Ok(_) => NodeKind::File,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping entry of unknown type");
                continue;
            }
        };
        entries.push((path, name, kind));
    }
    entries.sort_by(|a, b| {
        let folder_first = (a.2 != NodeKind::Folder).cmp(&(b.2 != NodeKind::Folder));
        folder_first.then_with(|| a.1.to_lowercase().cmp(&b.1.to_lowercase()))
    });
    Ok(entries)
}

pub struct WorkspaceManager {
    root: Option<PathBuf>,
    expanded: BTreeSet<PathBuf>,
    config: SharedConfig,
}

impl WorkspaceManager {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            root: None,
            expanded: BTreeSet::new(),
            config,
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn root_string(&self) -> Option<String> {
        self.root.as_ref().map(|p| p.to_string_lossy().to_string())
    }

    /// Open `path` as the workspace root, clearing any expansions.
    pub fn open(&mut self, path: &str) -> Result<String> {
        if path.trim().is_empty() {
            return Err(AppError::InvalidArgument("workspace path is empty".to_string()));
        }
        let root = fs::canonicalize(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(path.to_string()),
            _ => AppError::io(path, e),
        })?;
        if !root.is_dir() {
            return Err(AppError::InvalidArgument(format!("not a folder: {}", path)));
        }

        let root_str = root.to_string_lossy().to_string();
        {
            let mut config = self.config.borrow_mut();
            config.set(keys::WORKSPACE_ROOT, Value::String(root_str.clone()))?;
            config.set(keys::EXPANDED_FOLDERS, Value::Array(Vec::new()))?;
            config.set(keys::LAST_ACTIVE_FILE, Value::Null)?;
        }
        self.root = Some(root);
        self.expanded.clear();
        tracing::info!(root = %root_str, "workspace opened");
        Ok(root_str)
    }

    pub fn close(&mut self) -> Result<()> {
        self.root = None;
        self.expanded.clear();
        self.config.borrow_mut().remove_all(&keys::WORKSPACE_SCOPED)?;
        tracing::info!("workspace closed");
        Ok(())
    }

    /// Whether `path` lies inside the workspace root.
    pub fn contains(&self, path: &Path) -> bool {
        match &self.root {
            Some(root) => {
                path.starts_with(root) && !path.components().any(|c| c == Component::ParentDir)
            }
            None => false,
        }
    }

    pub fn expanded_folders(&self) -> Vec<String> {
        self.expanded
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect()
    }

    pub fn toggle_folder(&mut self, path: &str, expanded: bool) -> Result<()> {
        if self.root.is_none() {
            return Err(AppError::NoWorkspace);
        }
        let folder = PathBuf::from(path);
        if !self.contains(&folder) {
            return Err(AppError::InvalidArgument(format!("{} is outside the workspace", path)));
        }
        let changed = if expanded {
            self.expanded.insert(folder)
        } else {
            self.expanded.remove(&folder)
        };
        if changed {
            self.config
                .borrow_mut()
                .set_as(keys::EXPANDED_FOLDERS, &self.expanded_folders())?;
        }
        Ok(())
    }

    /// Record the file last focused inside this workspace.
    pub fn set_last_active_file(&mut self, path: &str) -> Result<()> {
        if !self.contains(Path::new(path)) {
            return Ok(());
        }
        self.config
            .borrow_mut()
            .set(keys::LAST_ACTIVE_FILE, Value::String(path.to_string()))
    }

    pub fn last_active_file(&self) -> Option<String> {
        self.config.borrow().get_string(keys::LAST_ACTIVE_FILE)
    }

    /// Tree rooted at the workspace. Each folder is listed one level deep
    /// unless it is expanded, in which case its subfolders follow the same rule.
    pub fn get_tree(&self) -> Result<TreeNode> {
        let root = self.root.as_ref().ok_or(AppError::NoWorkspace)?;
        let mut node = TreeNode {
            path: root.to_string_lossy().to_string(),
            name: extract_filename(&root.to_string_lossy()),
            kind: NodeKind::Folder,
            children: None,
            error: None,
        };
        self.fill_children(&mut node, root);
        Ok(node)
    }

    fn fill_children(&self, node: &mut TreeNode, dir: &Path) {
        match list_dir(dir) {
            Ok(entries) => {
                let children = entries
                    .into_iter()
                    .map(|(path, name, kind)| {
                        let mut child = TreeNode {
                            path: path.to_string_lossy().to_string(),
                            name,
                            kind,
                            children: None,
                            error: None,
                        };
                        if kind == NodeKind::Folder && self.expanded.contains(&path) {
                            self.fill_children(&mut child, &path);
                        }
                        child
                    })
                    .collect();
                node.children = Some(children);
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "failed to list folder");
                node.error = Some(e.to_string());
            }
        }
    }

    /// Reload the persisted workspace. A root that no longer exists is cleared.
    pub fn restore(&mut self) -> Result<Option<String>> {
        let (root, expanded) = {
            let config = self.config.borrow();
            let root = config.get_string(keys::WORKSPACE_ROOT);
            let expanded: Vec<String> = config.get_as(keys::EXPANDED_FOLDERS).unwrap_or_default();
            (root, expanded)
        };

        let Some(root) = root else {
            return Ok(None);
        };
        let root = PathBuf::from(root);
        if !root.is_dir() {
            tracing::info!(root = %root.display(), "persisted workspace no longer exists");
            self.close()?;
            return Ok(None);
        }

        self.root = Some(root);
        self.expanded = expanded
            .into_iter()
            .map(PathBuf::from)
            .filter(|p| self.contains(p))
            .collect();
        Ok(self.root_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::infrastructure::config_store::ConfigStore;
    use tempfile::TempDir;

    fn setup() -> (TempDir, TempDir, SharedConfig) {
        let ws = TempDir::new().unwrap();
        let root = ws.path();
        fs::create_dir_all(root.join("docs/deep")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::write(root.join("README.md"), "# Readme").unwrap();
        fs::write(root.join(".hidden.md"), "secret").unwrap();
        fs::write(root.join("docs/guide.md"), "guide").unwrap();
        fs::write(root.join("docs/deep/inner.md"), "inner").unwrap();

        let cfg_dir = TempDir::new().unwrap();
        let config = ConfigStore::open(cfg_dir.path().join("config.json")).into_shared();
        (ws, cfg_dir, config)
    }

    fn names(node: &TreeNode) -> Vec<String> {
        node.children
            .as_ref()
            .map(|c| c.iter().map(|n| n.name.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_tree_excludes_hidden_and_node_modules() {
        let (ws, _cfg, config) = setup();
        let mut wm = WorkspaceManager::new(config);
        wm.open(ws.path().to_str().unwrap()).unwrap();
        let tree = wm.get_tree().unwrap();
        assert_eq!(names(&tree), vec!["docs", "README.md"]);

        let root = wm.root().unwrap().to_path_buf();
        tree.walk(&mut |n| {
            assert!(Path::new(&n.path).starts_with(&root));
            assert!(!n.name.starts_with('.'));
            assert_ne!(n.name, "node_modules");
        });
    }

    #[cfg(unix)]
    #[test]
    fn test_tree_leaves_out_linked_folders() {
        let (ws, _cfg, config) = setup();
        std::os::unix::fs::symlink(ws.path(), ws.path().join("loop")).unwrap();
        std::os::unix::fs::symlink(ws.path().join("README.md"), ws.path().join("link.md")).unwrap();
        let mut wm = WorkspaceManager::new(config);
        wm.open(ws.path().to_str().unwrap()).unwrap();
        let tree = wm.get_tree().unwrap();
        assert_eq!(names(&tree), vec!["docs", "link.md", "README.md"]);
    }

    #[test]
    fn test_collapsed_folder_has_no_children() {
        let (ws, _cfg, config) = setup();
        let mut wm = WorkspaceManager::new(config);
        wm.open(ws.path().to_str().unwrap()).unwrap();
        let tree = wm.get_tree().unwrap();
        let docs = &tree.children.as_ref().unwrap()[0];
        assert!(docs.is_folder());
        assert!(docs.children.is_none());
    }

    #[test]
    fn test_expanded_folders_materialize_recursively() {
        let (ws, _cfg, config) = setup();
        let mut wm = WorkspaceManager::new(config);
        let root = wm.open(ws.path().to_str().unwrap()).unwrap();
        let docs = Path::new(&root).join("docs");
        wm.toggle_folder(docs.to_str().unwrap(), true).unwrap();

        let tree = wm.get_tree().unwrap();
        let docs_node = &tree.children.as_ref().unwrap()[0];
        assert_eq!(names(docs_node), vec!["deep", "guide.md"]);
        assert!(docs_node.children.as_ref().unwrap()[0].children.is_none());

        wm.toggle_folder(docs.to_str().unwrap(), false).unwrap();
        assert!(wm.get_tree().unwrap().children.unwrap()[0].children.is_none());
    }

    #[test]
    fn test_toggle_outside_root_rejected() {
        let (ws, _cfg, config) = setup();
        let mut wm = WorkspaceManager::new(config);
        assert_eq!(wm.toggle_folder("/tmp", true).unwrap_err().code(), "NO_WORKSPACE");
        let root = wm.open(ws.path().to_str().unwrap()).unwrap();
        assert_eq!(wm.toggle_folder("/", true).unwrap_err().code(), "INVALID_ARGUMENT");
        let escape = format!("{}/../etc", root);
        assert_eq!(wm.toggle_folder(&escape, true).unwrap_err().code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_restore_and_close() {
        let (ws, _cfg, config) = setup();
        let root;
        {
            let mut wm = WorkspaceManager::new(config.clone());
            root = wm.open(ws.path().to_str().unwrap()).unwrap();
            let docs = Path::new(&root).join("docs");
            wm.toggle_folder(docs.to_str().unwrap(), true).unwrap();
        }

        let mut wm = WorkspaceManager::new(config.clone());
        assert_eq!(wm.restore().unwrap(), Some(root.clone()));
        assert_eq!(wm.expanded_folders().len(), 1);

        wm.close().unwrap();
        assert!(wm.root().is_none());
        assert_eq!(config.borrow().get_string(keys::WORKSPACE_ROOT), None);
        assert_eq!(WorkspaceManager::new(config).restore().unwrap(), None);
    }

    #[test]
    fn test_open_missing_folder() {
        let (_ws, _cfg, config) = setup();
        let mut wm = WorkspaceManager::new(config);
        assert_eq!(wm.open("/no/such/folder").unwrap_err().code(), "NOT_FOUND");
        assert_eq!(wm.get_tree().unwrap_err().code(), "NO_WORKSPACE");
    }

    #[test]
    fn test_last_active_file_only_inside_root() {
        let (ws, _cfg, config) = setup();
        let mut wm = WorkspaceManager::new(config);
        let root = wm.open(ws.path().to_str().unwrap()).unwrap();
        wm.set_last_active_file("/elsewhere/x.md").unwrap();
        assert_eq!(wm.last_active_file(), None);
        let inside = format!("{}/README.md", root);
        wm.set_last_active_file(&inside).unwrap();
        assert_eq!(wm.last_active_file(), Some(inside));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_folder_flagged_not_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let (ws, _cfg, config) = setup();
        let locked = ws.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        // Permission bits do not restrict root
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut wm = WorkspaceManager::new(config);
        let root = wm.open(ws.path().to_str().unwrap()).unwrap();
        let locked_path = Path::new(&root).join("locked");
        wm.toggle_folder(locked_path.to_str().unwrap(), true).unwrap();
        let tree = wm.get_tree().unwrap();
        let node = tree
            .children
            .as_ref()
            .unwrap()
            .iter()
            .find(|n| n.name == "locked")
            .unwrap();
        assert!(node.error.is_some());
        assert!(node.children.is_none());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
