//! Application menu as plain data.
//!
//! The native menu shell renders [`Menu`] and reports activations by item id;
//! [`ApplicationMenu::resolve`] turns an id back into a command.

use serde::Serialize;
use serde_json::json;

use crate::app::controllers::shortcuts::ShortcutRegistry;
use crate::app::domain::action::ActionId;
use crate::app::domain::recent::RecentFile;
use crate::app::infrastructure::config_store::{ConfigStore, keys};
use crate::app::infrastructure::platform::Platform;
use crate::ipc::events::Event;

const APP_NAME: &str = "MarkPad";
const RECENT_PREFIX: &str = "open-recent:";
const CLEAR_RECENT_ID: &str = "clear-recent";
const CHECK_UPDATES_ID: &str = "check-for-updates";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MenuItem {
    #[serde(rename_all = "camelCase")]
    Action {
        id: String,
        label: String,
        accelerator: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
    },
    /// Leaf handled by the main process itself rather than the renderer.
    Command { id: String, label: String },
    /// Entry of the Open Recent submenu.
    Recent { id: String, label: String, path: String },
    /// Native behavior supplied by the menu shell (copy, quit, ...).
    Role { role: String },
    Submenu { label: String, items: Vec<MenuItem> },
    Separator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Menu {
    pub items: Vec<MenuItem>,
}

impl Menu {
    /// Every leaf in depth-first order.
    pub fn leaves(&self) -> Vec<&MenuItem> {
        fn walk<'a>(items: &'a [MenuItem], out: &mut Vec<&'a MenuItem>) {
            for item in items {
                match item {
                    MenuItem::Submenu { items, .. } => walk(items, out),
                    other => out.push(other),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.items, &mut out);
        out
    }

    pub fn find_submenu(&self, label: &str) -> Option<&[MenuItem]> {
        fn walk<'a>(items: &'a [MenuItem], label: &str) -> Option<&'a [MenuItem]> {
            items.iter().find_map(|item| match item {
                MenuItem::Submenu { label: l, items } if l == label => Some(items.as_slice()),
                MenuItem::Submenu { items, .. } => walk(items, label),
                _ => None,
            })
        }
        walk(&self.items, label)
    }
}

/// What activating a menu item asks the main process to do.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuCommand {
    Emit(Event),
    ClearRecent,
    CheckForUpdates,
}

/// Config key whose boolean value is the item's checkbox state.
fn checked_key(action: ActionId) -> Option<&'static str> {
    match action {
        ActionId::ToggleSidebar => Some(keys::SIDEBAR_VISIBLE),
        ActionId::ToggleOutline => Some(keys::OUTLINE_VISIBLE),
        ActionId::ToggleTypewriter => Some(keys::TYPEWRITER_ENABLED),
        ActionId::FocusMode => Some(keys::FOCUS_MODE),
        ActionId::ToggleLineNumbers => Some(keys::LINE_NUMBERS),
        ActionId::ToggleStatistics => Some(keys::STATISTICS_VISIBLE),
        ActionId::ToggleAutoSave => Some(keys::AUTO_SAVE_ENABLED),
        _ => None,
    }
}

fn view_mode(action: ActionId) -> Option<&'static str> {
    match action {
        ActionId::ViewModeEditor => Some("editor"),
        ActionId::ViewModePreview => Some("preview"),
        ActionId::ViewModeSplit => Some("split"),
        _ => None,
    }
}

struct Builder<'a> {
    platform: Platform,
    shortcuts: &'a ShortcutRegistry,
    config: &'a ConfigStore,
}

impl Builder<'_> {
    fn action(&self, action: ActionId) -> MenuItem {
        let checked = if let Some(key) = checked_key(action) {
            Some(self.config.get_bool(key))
        } else {
            view_mode(action).map(|mode| {
                self.config.get_string(keys::VIEW_MODE).as_deref() == Some(mode)
            })
        };
        MenuItem::Action {
            id: action.as_str().to_string(),
            label: action.label().to_string(),
            accelerator: self
                .shortcuts
                .get(action)
                .map(|b| b.accelerator(self.platform)),
            checked,
        }
    }

    fn actions(&self, actions: &[ActionId]) -> Vec<MenuItem> {
        actions.iter().map(|a| self.action(*a)).collect()
    }

    fn recent(&self, recent: &[RecentFile]) -> MenuItem {
        let mut items: Vec<MenuItem> = recent
            .iter()
            .enumerate()
            .map(|(i, r)| MenuItem::Recent {
                id: format!("{}{}", RECENT_PREFIX, i),
                label: r.name.clone(),
                path: r.path.clone(),
            })
            .collect();
        if !items.is_empty() {
            items.push(MenuItem::Separator);
        }
        items.push(MenuItem::Command {
            id: CLEAR_RECENT_ID.to_string(),
            label: "Clear Recent".to_string(),
        });
        MenuItem::Submenu {
            label: ActionId::OpenRecent.label().to_string(),
            items,
        }
    }

    fn build(&self, recent: &[RecentFile]) -> Menu {
        let mac = self.platform.is_mac();
        let mut menus = Vec::new();

        if mac {
            menus.push(MenuItem::Submenu {
                label: APP_NAME.to_string(),
                items: vec![
                    self.action(ActionId::About),
                    MenuItem::Separator,
                    self.action(ActionId::OpenKeyboardShortcuts),
                    MenuItem::Separator,
                    MenuItem::Role { role: "hide".to_string() },
                    MenuItem::Role { role: "quit".to_string() },
                ],
            });
        }

        let mut file = self.actions(&[ActionId::New, ActionId::Open, ActionId::OpenFolder]);
        file.push(self.recent(recent));
        file.push(MenuItem::Separator);
        file.extend(self.actions(&[ActionId::Save, ActionId::SaveAs, ActionId::SaveAll]));
        file.push(MenuItem::Separator);
        file.extend(self.actions(&[ActionId::ExportHtml, ActionId::ExportPdf]));
        file.push(MenuItem::Separator);
        file.push(self.action(ActionId::CloseTab));
        if !mac {
            file.push(MenuItem::Separator);
            file.push(MenuItem::Role { role: "quit".to_string() });
        }
        menus.push(MenuItem::Submenu { label: "File".to_string(), items: file });

        let mut edit = self.actions(&[ActionId::Undo, ActionId::Redo]);
        edit.push(MenuItem::Separator);
        for role in ["cut", "copy", "paste", "selectAll"] {
            edit.push(MenuItem::Role { role: role.to_string() });
        }
        edit.push(MenuItem::Separator);
        edit.extend(self.actions(&[ActionId::Find, ActionId::FindInFiles]));
        edit.push(MenuItem::Separator);
        edit.push(self.action(ActionId::InsertTemplate));
        menus.push(MenuItem::Submenu { label: "Edit".to_string(), items: edit });

        let mut view = self.actions(&[
            ActionId::ViewModeEditor,
            ActionId::ViewModePreview,
            ActionId::ViewModeSplit,
        ]);
        view.push(MenuItem::Separator);
        view.extend(self.actions(&[
            ActionId::ToggleTheme,
            ActionId::ToggleSidebar,
            ActionId::ToggleOutline,
            ActionId::ToggleLineNumbers,
            ActionId::ToggleStatistics,
        ]));
        view.push(MenuItem::Separator);
        view.extend(self.actions(&[ActionId::ToggleTypewriter, ActionId::FocusMode]));
        view.push(MenuItem::Separator);
        view.extend(self.actions(&[ActionId::NextTab, ActionId::PreviousTab]));
        menus.push(MenuItem::Submenu { label: "View".to_string(), items: view });

        let mut settings = self.actions(&[ActionId::ToggleAutoSave, ActionId::AutoSaveSettings]);
        if !mac {
            settings.push(MenuItem::Separator);
            settings.push(self.action(ActionId::OpenKeyboardShortcuts));
        }
        menus.push(MenuItem::Submenu { label: "Settings".to_string(), items: settings });

        let mut help = vec![MenuItem::Command {
            id: CHECK_UPDATES_ID.to_string(),
            label: "Check for Updates...".to_string(),
        }];
        if !mac {
            help.push(MenuItem::Separator);
            help.push(self.action(ActionId::About));
        }
        menus.push(MenuItem::Submenu { label: "Help".to_string(), items: help });

        Menu { items: menus }
    }
}

pub fn build_menu(
    platform: Platform,
    shortcuts: &ShortcutRegistry,
    config: &ConfigStore,
) -> Menu {
    Builder { platform, shortcuts, config }.build(&config.recent_files())
}

/// The current menu plus the activation dispatcher.
pub struct ApplicationMenu {
    platform: Platform,
    menu: Menu,
    recent: Vec<RecentFile>,
}

impl ApplicationMenu {
    pub fn new(platform: Platform, shortcuts: &ShortcutRegistry, config: &ConfigStore) -> Self {
        let recent = config.recent_files();
        let menu = Builder { platform, shortcuts, config }.build(&recent);
        Self { platform, menu, recent }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Rebuild after shortcuts, recent files or checkbox state change.
    pub fn rebuild(&mut self, shortcuts: &ShortcutRegistry, config: &ConfigStore) {
        *self = Self::new(self.platform, shortcuts, config);
        tracing::debug!(recent = self.recent.len(), "menu rebuilt");
    }

    pub fn resolve(&self, item_id: &str) -> Option<MenuCommand> {
        if item_id == CLEAR_RECENT_ID {
            return Some(MenuCommand::ClearRecent);
        }
        if item_id == CHECK_UPDATES_ID {
            return Some(MenuCommand::CheckForUpdates);
        }
        if let Some(index) = item_id.strip_prefix(RECENT_PREFIX) {
            let entry = index.parse::<usize>().ok().and_then(|i| self.recent.get(i))?;
            return Some(MenuCommand::Emit(Event::MenuAction {
                action: ActionId::OpenRecent.as_str().to_string(),
                payload: Some(json!(entry.path)),
            }));
        }
        let action = ActionId::from_str(item_id).filter(|a| *a != ActionId::OpenRecent)?;
        Some(MenuCommand::Emit(Event::MenuAction {
            action: action.as_str().to_string(),
            payload: None,
        }))
    }
}
