//! Renderer-side facade.
//!
//! [`Bridge`] is the only object renderer code holds: one typed method per
//! request channel, plus `on_*` subscriptions that hand back a
//! [`Subscription`] disposer. The transport itself is never exposed.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::app::controllers::search::{SearchOptions, SearchResponse};
use crate::app::controllers::shortcuts::ActionInfo;
use crate::app::controllers::templates::{TemplateChanges, TemplateMetadata};
use crate::app::domain::action::ActionId;
use crate::app::domain::features::FeatureFlags;
use crate::app::domain::recent::RecentFile;
use crate::app::domain::tab::{CursorPosition, Tab, TabId};
use crate::app::domain::template::Template;
use crate::app::domain::update::UpdateState;
use crate::app::domain::workspace::TreeNode;
use crate::app::infrastructure::error::AppError;
use crate::app::services::clipboard::SavedImage;
use crate::ipc::channel::Channel;
use crate::ipc::events::{EventKind, ListenerId};
use crate::ipc::response::IpcError;
use crate::ipc::transport::Transport;

pub type BridgeResult<T> = std::result::Result<T, IpcError>;

/// Payload of `update-available`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub version: String,
    pub release_notes: String,
}

/// Payload of `download-progress`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressInfo {
    pub percent: f64,
    pub bytes_per_second: f64,
    pub transferred: u64,
    pub total: u64,
}

/// Handle to one event listener. Call [`Subscription::unsubscribe`] when
/// the subscribing view goes away; dropping it leaves the listener attached.
#[must_use = "the listener stays attached until unsubscribe is called"]
pub struct Subscription {
    transport: Rc<dyn Transport>,
    id: ListenerId,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Detach the listener. Returns `false` if it was already detached.
    pub fn unsubscribe(self) -> bool {
        self.transport.unlisten(self.id)
    }
}

#[derive(Clone)]
pub struct Bridge {
    transport: Rc<dyn Transport>,
}

impl Bridge {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Rc::new(transport),
        }
    }

    fn call<R: DeserializeOwned>(&self, channel: Channel, args: Vec<Value>) -> BridgeResult<R> {
        let data = self.transport.invoke(channel.as_str(), args).into_result()?;
        serde_json::from_value(data).map_err(|e| IpcError::from(AppError::from(e)))
    }

    fn call_unit(&self, channel: Channel, args: Vec<Value>) -> BridgeResult<()> {
        self.transport
            .invoke(channel.as_str(), args)
            .into_result()
            .map(|_| ())
    }

    fn on(&self, kind: EventKind, callback: impl Fn(&[Value]) + 'static) -> Subscription {
        let id = self.transport.listen(kind, Rc::new(callback));
        Subscription {
            transport: self.transport.clone(),
            id,
        }
    }

    // file

    /// `None` when the user cancelled the dialog.
    pub fn open_file(&self, path: Option<&str>) -> BridgeResult<Option<Tab>> {
        self.call(Channel::FileOpen, vec![json!(path)])
    }

    pub fn open_recent(&self, path: &str) -> BridgeResult<Tab> {
        self.call(Channel::FileOpenRecent, vec![json!(path)])
    }

    pub fn read_file(&self, path: &str) -> BridgeResult<String> {
        self.call(Channel::FileRead, vec![json!(path)])
    }

    pub fn save_file(&self, path: &str, content: &str) -> BridgeResult<()> {
        self.call_unit(Channel::FileSave, vec![json!(path), json!(content)])
    }

    /// Path written, or `None` if the dialog was cancelled.
    pub fn save_file_as(&self, content: &str, path: Option<&str>) -> BridgeResult<Option<String>> {
        let saved: Option<Value> = self.call(Channel::FileSaveAs, vec![json!(content), json!(path)])?;
        Ok(saved.and_then(|v| v.get("path").and_then(Value::as_str).map(str::to_string)))
    }

    pub fn file_dropped(&self, path: &str) -> BridgeResult<bool> {
        self.call(Channel::FileDropped, vec![json!(path)])
    }

    pub fn get_recent_files(&self) -> BridgeResult<Vec<RecentFile>> {
        self.call(Channel::FileGetRecent, vec![])
    }

    pub fn remove_recent_file(&self, path: &str) -> BridgeResult<Vec<RecentFile>> {
        self.call(Channel::FileRemoveRecent, vec![json!(path)])
    }

    pub fn clear_recent_files(&self) -> BridgeResult<()> {
        self.call_unit(Channel::FileClearRecent, vec![])
    }

    // export

    pub fn export_html(
        &self,
        content: &str,
        path: Option<&str>,
        title: Option<&str>,
    ) -> BridgeResult<Option<String>> {
        self.call(Channel::ExportHtml, vec![json!(content), json!(path), json!(title)])
    }

    pub fn export_pdf(&self, html: &str, path: Option<&str>) -> BridgeResult<Option<String>> {
        self.call(Channel::ExportPdf, vec![json!(html), json!(path)])
    }

    // config

    pub fn config_get(&self, key: &str) -> BridgeResult<Value> {
        self.call(Channel::ConfigGet, vec![json!(key)])
    }

    pub fn config_set(&self, key: &str, value: Value) -> BridgeResult<()> {
        self.call_unit(Channel::ConfigSet, vec![json!(key), value])
    }

    pub fn get_line_numbers(&self) -> BridgeResult<bool> {
        self.call(Channel::ConfigGetLineNumbers, vec![])
    }

    pub fn toggle_line_numbers(&self) -> BridgeResult<bool> {
        self.call(Channel::ConfigToggleLineNumbers, vec![])
    }

    // tabs

    pub fn create_tab(&self, path: Option<&str>, content: Option<&str>) -> BridgeResult<Tab> {
        self.call(Channel::TabCreate, vec![json!(path), json!(content)])
    }

    pub fn close_tab(&self, id: &TabId) -> BridgeResult<()> {
        self.call_unit(Channel::TabClose, vec![json!(id)])
    }

    pub fn switch_tab(&self, id: &TabId) -> BridgeResult<Tab> {
        self.call(Channel::TabSwitch, vec![json!(id)])
    }

    pub fn get_tab(&self, id: &TabId) -> BridgeResult<Tab> {
        self.call(Channel::TabGet, vec![json!(id)])
    }

    pub fn get_all_tabs(&self) -> BridgeResult<Vec<Tab>> {
        self.call(Channel::TabGetAll, vec![])
    }

    pub fn get_modified_tabs(&self) -> BridgeResult<Vec<Tab>> {
        self.call(Channel::TabGetModified, vec![])
    }

    pub fn get_active_tab(&self) -> BridgeResult<Option<Tab>> {
        self.call(Channel::TabGetActive, vec![])
    }

    pub fn mark_tab_modified(&self, id: &TabId, modified: bool) -> BridgeResult<()> {
        self.call_unit(Channel::TabMarkModified, vec![json!(id), json!(modified)])
    }

    /// Returns the tab's modified flag after the update.
    pub fn update_tab_content(&self, id: &TabId, content: &str) -> BridgeResult<bool> {
        self.call(Channel::TabUpdateContent, vec![json!(id), json!(content)])
    }

    pub fn update_tab_scroll(&self, id: &TabId, scroll: f64) -> BridgeResult<()> {
        self.call_unit(Channel::TabUpdateScroll, vec![json!(id), json!(scroll)])
    }

    pub fn update_tab_cursor(&self, id: &TabId, cursor: CursorPosition) -> BridgeResult<()> {
        self.call_unit(Channel::TabUpdateCursor, vec![json!(id), json!(cursor)])
    }

    pub fn update_tab_file_path(&self, id: &TabId, path: &str) -> BridgeResult<Tab> {
        self.call(Channel::TabUpdateFilePath, vec![json!(id), json!(path)])
    }

    pub fn save_tabs(&self) -> BridgeResult<()> {
        self.call_unit(Channel::TabSave, vec![])
    }

    pub fn restore_tabs(&self) -> BridgeResult<Vec<Tab>> {
        self.call(Channel::TabRestore, vec![])
    }

    pub fn next_tab(&self) -> BridgeResult<Option<Tab>> {
        self.call(Channel::TabGetNext, vec![])
    }

    pub fn previous_tab(&self) -> BridgeResult<Option<Tab>> {
        self.call(Channel::TabGetPrevious, vec![])
    }

    // shortcuts

    pub fn get_shortcut(&self, action: &str) -> BridgeResult<Option<String>> {
        self.call(Channel::ShortcutsGet, vec![json!(action)])
    }

    pub fn set_shortcut(&self, action: &str, binding: &str) -> BridgeResult<String> {
        self.call(Channel::ShortcutsSet, vec![json!(action), json!(binding)])
    }

    pub fn reset_shortcut(&self, action: &str) -> BridgeResult<Option<String>> {
        self.call(Channel::ShortcutsReset, vec![json!(action)])
    }

    pub fn reset_all_shortcuts(&self) -> BridgeResult<()> {
        self.call_unit(Channel::ShortcutsResetAll, vec![])
    }

    pub fn get_all_shortcuts(&self) -> BridgeResult<BTreeMap<String, Option<String>>> {
        self.call(Channel::ShortcutsGetAll, vec![])
    }

    pub fn get_available_actions(&self) -> BridgeResult<Vec<ActionInfo>> {
        self.call(Channel::ShortcutsGetAvailableActions, vec![])
    }

    pub fn check_shortcut_conflict(
        &self,
        binding: &str,
        except: Option<&str>,
    ) -> BridgeResult<Option<ActionId>> {
        self.call(Channel::ShortcutsCheckConflict, vec![json!(binding), json!(except)])
    }

    pub fn get_default_shortcut(&self, action: &str) -> BridgeResult<Option<String>> {
        self.call(Channel::ShortcutsGetDefault, vec![json!(action)])
    }

    // templates

    pub fn get_template(&self, id: &str) -> BridgeResult<Option<Template>> {
        self.call(Channel::TemplateGet, vec![json!(id)])
    }

    pub fn get_all_templates(&self) -> BridgeResult<Vec<Template>> {
        self.call(Channel::TemplateGetAll, vec![])
    }

    pub fn get_built_in_templates(&self) -> BridgeResult<Vec<Template>> {
        self.call(Channel::TemplateGetBuiltIn, vec![])
    }

    pub fn get_custom_templates(&self) -> BridgeResult<Vec<Template>> {
        self.call(Channel::TemplateGetCustom, vec![])
    }

    pub fn save_custom_template(
        &self,
        name: &str,
        content: &str,
        metadata: Option<TemplateMetadata>,
    ) -> BridgeResult<Template> {
        self.call(
            Channel::TemplateSaveCustom,
            vec![json!(name), json!(content), json!(metadata)],
        )
    }

    pub fn delete_custom_template(&self, id: &str) -> BridgeResult<bool> {
        self.call(Channel::TemplateDeleteCustom, vec![json!(id)])
    }

    pub fn update_custom_template(&self, id: &str, changes: TemplateChanges) -> BridgeResult<bool> {
        self.call(Channel::TemplateUpdateCustom, vec![json!(id), json!(changes)])
    }

    pub fn get_template_categories(&self) -> BridgeResult<Vec<String>> {
        self.call(Channel::TemplateGetCategories, vec![])
    }

    pub fn get_templates_by_category(&self, category: &str) -> BridgeResult<Vec<Template>> {
        self.call(Channel::TemplateGetByCategory, vec![json!(category)])
    }

    pub fn mark_template_used(&self, id: &str) -> BridgeResult<()> {
        self.call_unit(Channel::TemplateMarkUsed, vec![json!(id)])
    }

    pub fn find_placeholders(&self, content: &str) -> BridgeResult<Vec<String>> {
        self.call(Channel::TemplateFindPlaceholders, vec![json!(content)])
    }

    pub fn first_placeholder_position(&self, content: &str) -> BridgeResult<i64> {
        self.call(Channel::TemplateGetFirstPlaceholderPosition, vec![json!(content)])
    }

    // advanced markdown

    pub fn get_advanced_markdown_settings(&self) -> BridgeResult<FeatureFlags> {
        self.call(Channel::AdvancedMarkdownGetSettings, vec![])
    }

    /// `enabled` is passed through untyped so the main side can reject
    /// non-boolean values.
    pub fn toggle_advanced_markdown_feature(
        &self,
        name: &str,
        enabled: Value,
    ) -> BridgeResult<FeatureFlags> {
        self.call(Channel::AdvancedMarkdownToggleFeature, vec![json!(name), enabled])
    }

    // workspace

    pub fn open_workspace(&self, path: Option<&str>) -> BridgeResult<Option<String>> {
        self.call(Channel::WorkspaceOpen, vec![json!(path)])
    }

    pub fn close_workspace(&self) -> BridgeResult<()> {
        self.call_unit(Channel::WorkspaceClose, vec![])
    }

    pub fn get_workspace_path(&self) -> BridgeResult<Option<String>> {
        self.call(Channel::WorkspaceGetPath, vec![])
    }

    pub fn get_workspace_tree(&self) -> BridgeResult<TreeNode> {
        self.call(Channel::WorkspaceGetTree, vec![])
    }

    pub fn restore_workspace(&self) -> BridgeResult<Option<String>> {
        self.call(Channel::WorkspaceRestore, vec![])
    }

    pub fn toggle_folder(&self, path: &str, expanded: bool) -> BridgeResult<()> {
        self.call_unit(Channel::WorkspaceToggleFolder, vec![json!(path), json!(expanded)])
    }

    // search, images, shell

    pub fn global_search(&self, text: &str, options: SearchOptions) -> BridgeResult<SearchResponse> {
        self.call(Channel::GlobalSearch, vec![json!(text), json!(options)])
    }

    pub fn save_image_from_clipboard(
        &self,
        data: &str,
        document_path: Option<&str>,
    ) -> BridgeResult<SavedImage> {
        self.call(Channel::ImageSaveFromClipboard, vec![json!(data), json!(document_path)])
    }

    pub fn open_external(&self, url: &str) -> BridgeResult<()> {
        self.call_unit(Channel::ShellOpenExternal, vec![json!(url)])
    }

    // updates

    pub fn check_for_updates(&self) -> BridgeResult<UpdateState> {
        self.call(Channel::UpdateCheck, vec![])
    }

    pub fn download_update(&self) -> BridgeResult<UpdateState> {
        self.call(Channel::UpdateDownload, vec![])
    }

    pub fn install_update(&self) -> BridgeResult<UpdateState> {
        self.call(Channel::UpdateInstall, vec![])
    }

    pub fn get_update_state(&self) -> BridgeResult<UpdateState> {
        self.call(Channel::UpdateGetState, vec![])
    }

    /// Acknowledge an update error; only valid in the error state.
    pub fn dismiss_update_error(&self) -> BridgeResult<UpdateState> {
        self.call(Channel::UpdateDismissError, vec![])
    }

    // events

    /// `callback(action, payload)`.
    pub fn on_menu_action(&self, callback: impl Fn(&str, Option<&Value>) + 'static) -> Subscription {
        self.on(EventKind::MenuAction, move |args| {
            if let Some(action) = args.first().and_then(Value::as_str) {
                callback(action, args.get(1));
            }
        })
    }

    pub fn on_file_dropped(&self, callback: impl Fn(&str) + 'static) -> Subscription {
        self.on(EventKind::FileDropped, move |args| {
            if let Some(path) = args.first().and_then(Value::as_str) {
                callback(path);
            }
        })
    }

    pub fn on_update_available(&self, callback: impl Fn(&UpdateInfo) + 'static) -> Subscription {
        self.on(EventKind::UpdateAvailable, move |args| {
            if let Some(info) = first_as::<UpdateInfo>(args) {
                callback(&info);
            }
        })
    }

    /// `callback(version)`.
    pub fn on_update_downloaded(&self, callback: impl Fn(&str) + 'static) -> Subscription {
        self.on(EventKind::UpdateDownloaded, move |args| {
            if let Some(version) = args
                .first()
                .and_then(|v| v.get("version"))
                .and_then(Value::as_str)
            {
                callback(version);
            }
        })
    }

    pub fn on_update_error(&self, callback: impl Fn(&str) + 'static) -> Subscription {
        self.on(EventKind::UpdateError, move |args| {
            if let Some(message) = args.first().and_then(Value::as_str) {
                callback(message);
            }
        })
    }

    pub fn on_download_progress(&self, callback: impl Fn(&ProgressInfo) + 'static) -> Subscription {
        self.on(EventKind::DownloadProgress, move |args| {
            if let Some(progress) = first_as::<ProgressInfo>(args) {
                callback(&progress);
            }
        })
    }

    /// `callback(feature, enabled)`.
    pub fn on_advanced_markdown_settings_changed(
        &self,
        callback: impl Fn(&str, bool) + 'static,
    ) -> Subscription {
        self.on(EventKind::SettingsChanged, move |args| {
            let name = args.first().and_then(Value::as_str);
            let enabled = args.get(1).and_then(Value::as_bool);
            if let (Some(name), Some(enabled)) = (name, enabled) {
                callback(name, enabled);
            }
        })
    }
}

fn first_as<T: DeserializeOwned>(args: &[Value]) -> Option<T> {
    args.first()
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}
