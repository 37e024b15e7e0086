//! Main-process side of the channel boundary.
//!
//! [`IpcRouter`] owns every manager and dispatches each request channel to
//! exactly one of them. Handlers validate arity and argument types before
//! touching state.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::app::controllers::advanced_markdown::AdvancedMarkdownManager;
use crate::app::controllers::menu::{ApplicationMenu, Menu, MenuCommand};
use crate::app::controllers::search::{GlobalSearchManager, SearchOptions};
use crate::app::controllers::shortcuts::{ShortcutRegistry, parse_action};
use crate::app::controllers::tabs::{TabManager, read_document};
use crate::app::controllers::templates::{TemplateChanges, TemplateManager, TemplateMetadata};
use crate::app::controllers::update::AutoUpdater;
use crate::app::controllers::workspace::WorkspaceManager;
use crate::app::domain::features::Feature;
use crate::app::domain::keybinding::Keybinding;
use crate::app::domain::tab::{CursorPosition, TabId};
use crate::app::domain::update::UpdateState;
use crate::app::infrastructure::config_store::{SharedConfig, keys};
use crate::app::infrastructure::error::{AppError, Result};
use crate::app::infrastructure::platform::Platform;
use crate::app::services::clipboard::save_png;
use crate::app::services::export::{DefaultPostProcessor, PdfPrinter, PostProcessor, export_html};
use crate::app::services::shell::{Dialogs, NoDialogs, Shell, SystemShell, check_external_url};
use crate::app::services::text_ops::is_markdown_file;
use crate::app::services::updater::{UpdateSource, current_timestamp, should_check_now};
use crate::ipc::channel::Channel;
use crate::ipc::events::{Event, EventBus};
use crate::ipc::response::Response;

/// Host-provided collaborators the router calls out to.
pub struct Collaborators {
    pub dialogs: Box<dyn Dialogs>,
    pub shell: Box<dyn Shell>,
    pub printer: Option<Box<dyn PdfPrinter>>,
    pub post_processor: Box<dyn PostProcessor>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            dialogs: Box::new(NoDialogs),
            shell: Box::new(SystemShell),
            printer: None,
            post_processor: Box::new(DefaultPostProcessor),
        }
    }
}

/// Positional arguments of one request. `null` counts as absent.
struct Args<'a> {
    channel: Channel,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    fn arity(&self, max: usize) -> Result<()> {
        if self.values.len() > max {
            return Err(AppError::InvalidArgument(format!(
                "{} takes at most {} argument(s), got {}",
                self.channel.as_str(),
                max,
                self.values.len()
            )));
        }
        Ok(())
    }

    fn get(&self, idx: usize) -> Option<&'a Value> {
        self.values.get(idx).filter(|v| !v.is_null())
    }

    fn invalid(&self, name: &str, expected: &str) -> AppError {
        AppError::InvalidArgument(format!(
            "{}: '{}' must be {}",
            self.channel.as_str(),
            name,
            expected
        ))
    }

    fn required(&self, idx: usize, name: &str) -> Result<&'a Value> {
        self.get(idx).ok_or_else(|| {
            AppError::InvalidArgument(format!("{}: missing '{}'", self.channel.as_str(), name))
        })
    }

    fn str(&self, idx: usize, name: &str) -> Result<&'a str> {
        self.required(idx, name)?
            .as_str()
            .ok_or_else(|| self.invalid(name, "a string"))
    }

    fn opt_str(&self, idx: usize, name: &str) -> Result<Option<&'a str>> {
        match self.get(idx) {
            None => Ok(None),
            Some(v) => v.as_str().map(Some).ok_or_else(|| self.invalid(name, "a string")),
        }
    }

    fn bool(&self, idx: usize, name: &str) -> Result<bool> {
        self.required(idx, name)?
            .as_bool()
            .ok_or_else(|| self.invalid(name, "a boolean"))
    }

    fn f64(&self, idx: usize, name: &str) -> Result<f64> {
        self.required(idx, name)?
            .as_f64()
            .ok_or_else(|| self.invalid(name, "a number"))
    }

    fn tab_id(&self, idx: usize) -> Result<TabId> {
        let raw = self.str(idx, "id")?;
        TabId::parse(raw).ok_or_else(|| AppError::NotFound(format!("tab {}", raw)))
    }

    fn parse<T: DeserializeOwned>(&self, idx: usize, name: &str) -> Result<T> {
        serde_json::from_value(self.required(idx, name)?.clone()).map_err(|e| {
            AppError::InvalidArgument(format!("{}: '{}' {}", self.channel.as_str(), name, e))
        })
    }

    fn parse_or_default<T: DeserializeOwned + Default>(&self, idx: usize, name: &str) -> Result<T> {
        match self.get(idx) {
            None => Ok(T::default()),
            Some(_) => self.parse(idx, name),
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Write `contents` next to `path` first, then rename over it.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| AppError::InvalidArgument(format!("not a file path: {}", path.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".markpad-tmp");
    let temp_path = path.with_file_name(temp_name);
    {
        let mut file = fs::File::create(&temp_path).map_err(|e| AppError::io(&temp_path, e))?;
        file.write_all(contents).map_err(|e| AppError::io(&temp_path, e))?;
        file.sync_all().map_err(|e| AppError::io(&temp_path, e))?;
    }
    fs::rename(&temp_path, path).map_err(|e| AppError::io(path, e))
}

pub struct IpcRouter {
    config: SharedConfig,
    tabs: TabManager,
    workspace: WorkspaceManager,
    search: GlobalSearchManager,
    templates: TemplateManager,
    shortcuts: ShortcutRegistry,
    markdown: AdvancedMarkdownManager,
    updater: AutoUpdater,
    menu: ApplicationMenu,
    events: EventBus,
    collaborators: Collaborators,
}

impl IpcRouter {
    pub fn new(
        config: SharedConfig,
        platform: Platform,
        update_source: Box<dyn UpdateSource>,
        collaborators: Collaborators,
    ) -> Self {
        let events = EventBus::new();
        let shortcuts = ShortcutRegistry::new(config.clone());
        let menu = ApplicationMenu::new(platform, &shortcuts, &config.borrow());
        Self {
            tabs: TabManager::new(config.clone()),
            workspace: WorkspaceManager::new(config.clone()),
            search: GlobalSearchManager::new(),
            templates: TemplateManager::new(config.clone()),
            markdown: AdvancedMarkdownManager::new(config.clone()),
            updater: AutoUpdater::new(update_source, events.clone()),
            shortcuts,
            menu,
            events,
            collaborators,
            config,
        }
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    pub fn menu(&self) -> &Menu {
        self.menu.menu()
    }

    pub fn update_state(&self) -> &UpdateState {
        self.updater.state()
    }

    pub fn config(&self) -> SharedConfig {
        self.config.clone()
    }

    /// Handle one request. Never panics across the boundary: every failure
    /// becomes a structured error response.
    pub fn handle(&mut self, channel: &str, args: &[Value]) -> Response {
        let result = match Channel::from_str(channel) {
            Some(c) => {
                tracing::debug!(channel, args = args.len(), "dispatch");
                self.dispatch(c, &Args { channel: c, values: args })
            }
            None => Err(AppError::UnknownChannel(channel.to_string())),
        };
        match result {
            Ok(data) => Response::Ok(data),
            Err(e) => {
                tracing::warn!(channel, code = e.code(), error = %e, "request failed");
                Response::from(e)
            }
        }
    }

    /// Apply update events reported by worker threads.
    pub fn poll_updates(&mut self) -> usize {
        self.updater.poll()
    }

    /// A native menu item was activated.
    pub fn activate_menu(&mut self, item_id: &str) -> Result<()> {
        let command = self
            .menu
            .resolve(item_id)
            .ok_or_else(|| AppError::NotFound(format!("menu item {}", item_id)))?;
        tracing::debug!(item = item_id, "menu activated");
        match command {
            MenuCommand::Emit(event) => {
                self.events.emit(event);
                Ok(())
            }
            MenuCommand::ClearRecent => {
                self.config.borrow_mut().clear_recent_files()?;
                self.rebuild_menu();
                Ok(())
            }
            MenuCommand::CheckForUpdates => self.check_for_updates(),
        }
    }

    /// Restore workspace and tabs, then open `files` on top.
    pub fn startup(&mut self, files: &[String]) {
        if let Err(e) = self.workspace.restore() {
            tracing::warn!(error = %e, "workspace restore failed");
        }
        if let Err(e) = self.tabs.restore() {
            tracing::warn!(error = %e, "tab restore failed");
        }
        for file in files {
            if let Err(e) = self.open_document(file) {
                tracing::warn!(%file, error = %e, "could not open file from command line");
            }
        }
    }

    /// Check for updates if enabled and the last check is old enough.
    pub fn auto_check_updates(&mut self) {
        let (enabled, last) = {
            let config = self.config.borrow();
            let last = config.get_as::<i64>(keys::UPDATE_LAST_CHECK).unwrap_or(0);
            (config.get_bool(keys::UPDATE_AUTO_CHECK), last)
        };
        if enabled && should_check_now(last) {
            if let Err(e) = self.check_for_updates() {
                tracing::warn!(error = %e, "automatic update check failed");
            }
        }
    }

    /// Persist tabs and run a pending install. Returns `true` when the
    /// program was replaced and should be relaunched.
    pub fn shutdown(&mut self) -> Result<bool> {
        self.tabs.save()?;
        self.updater.finish_install()
    }

    fn check_for_updates(&mut self) -> Result<()> {
        self.updater.check_for_updates()?;
        self.config
            .borrow_mut()
            .set(keys::UPDATE_LAST_CHECK, json!(current_timestamp()))
    }

    fn rebuild_menu(&mut self) {
        let config = self.config.borrow();
        self.menu.rebuild(&self.shortcuts, &config);
    }

    fn record_recent(&mut self, path: &str) -> Result<()> {
        self.config.borrow_mut().add_recent_file(path)?;
        self.rebuild_menu();
        Ok(())
    }

    fn open_document(&mut self, path: &str) -> Result<Value> {
        let tab = self.tabs.create(Some(path), None)?;
        self.record_recent(path)?;
        to_value(tab)
    }

    fn save_document(&mut self, path: &str, content: &str) -> Result<Value> {
        write_atomic(Path::new(path), content.as_bytes())?;
        if let Some(id) = self.tabs.find_by_path(path).map(|t| t.id.clone()) {
            self.tabs.update_content(&id, content.to_string())?;
            self.tabs.mark_modified(&id, false)?;
        }
        self.record_recent(path)?;
        tracing::info!(%path, "document saved");
        Ok(json!({ "path": path }))
    }

    fn pick_save_path(&self, given: Option<&str>, suggested: &str, extension: &str) -> Option<PathBuf> {
        match given {
            Some(p) => Some(PathBuf::from(p)),
            None => self.collaborators.dialogs.save_file(suggested, extension),
        }
    }

    fn dispatch(&mut self, channel: Channel, args: &Args) -> Result<Value> {
        use Channel::*;

        match channel {
            FileOpen => {
                args.arity(1)?;
                let path = match args.opt_str(0, "path")? {
                    Some(p) => p.to_string(),
                    None => match self.collaborators.dialogs.open_file() {
                        Some(p) => path_string(&p),
                        None => return Ok(Value::Null),
                    },
                };
                self.open_document(&path)
            }
            FileOpenRecent => {
                args.arity(1)?;
                let path = args.str(0, "path")?;
                if !Path::new(path).is_file() {
                    self.config.borrow_mut().remove_recent_file(path)?;
                    self.rebuild_menu();
                    return Err(AppError::NotFound(path.to_string()));
                }
                self.open_document(path)
            }
            FileRead => {
                args.arity(1)?;
                Ok(json!(read_document(args.str(0, "path")?)?))
            }
            FileSave => {
                args.arity(2)?;
                let path = args.str(0, "path")?;
                let content = args.str(1, "content")?;
                self.save_document(path, content)
            }
            FileSaveAs => {
                args.arity(2)?;
                let content = args.str(0, "content")?;
                let Some(path) = self.pick_save_path(args.opt_str(1, "path")?, "Untitled.md", "md")
                else {
                    return Ok(Value::Null);
                };
                self.save_document(&path_string(&path), content)
            }
            FileDropped => {
                args.arity(1)?;
                let path = args.str(0, "path")?;
                let accepted = Path::new(path).is_file() && is_markdown_file(Path::new(path));
                if accepted {
                    self.events.emit(Event::FileDropped {
                        path: path.to_string(),
                    });
                }
                Ok(json!(accepted))
            }
            FileGetRecent => {
                args.arity(0)?;
                to_value(self.config.borrow().recent_files())
            }
            FileRemoveRecent => {
                args.arity(1)?;
                let list = self
                    .config
                    .borrow_mut()
                    .remove_recent_file(args.str(0, "path")?)?;
                self.rebuild_menu();
                to_value(list)
            }
            FileClearRecent => {
                args.arity(0)?;
                self.config.borrow_mut().clear_recent_files()?;
                self.rebuild_menu();
                Ok(Value::Null)
            }

            ExportHtml => {
                args.arity(3)?;
                let content = args.str(0, "content")?;
                let title = args.opt_str(2, "title")?.unwrap_or("Untitled");
                let suggested = format!("{}.html", title);
                let Some(path) = self.pick_save_path(args.opt_str(1, "path")?, &suggested, "html")
                else {
                    return Ok(Value::Null);
                };
                let html = export_html(
                    content,
                    title,
                    &self.markdown.all(),
                    self.collaborators.post_processor.as_ref(),
                );
                write_atomic(&path, html.as_bytes())?;
                tracing::info!(path = %path.display(), "exported HTML");
                Ok(json!(path_string(&path)))
            }
            ExportPdf => {
                args.arity(2)?;
                let html = args.str(0, "html")?;
                if self.collaborators.printer.is_none() {
                    return Err(AppError::Unsupported("PDF export is not available".to_string()));
                }
                let Some(path) = self.pick_save_path(args.opt_str(1, "path")?, "Untitled.pdf", "pdf")
                else {
                    return Ok(Value::Null);
                };
                if let Some(printer) = &self.collaborators.printer {
                    printer.print_to_pdf(html, &path)?;
                }
                tracing::info!(path = %path.display(), "exported PDF");
                Ok(json!(path_string(&path)))
            }

            ConfigGet => {
                args.arity(1)?;
                let key = args.str(0, "key")?;
                Ok(self.config.borrow().get(key).unwrap_or(Value::Null))
            }
            ConfigSet => {
                args.arity(2)?;
                let key = args.str(0, "key")?;
                if keys::is_managed(key) {
                    return Err(AppError::InvalidArgument(format!(
                        "{} is managed by its own channels",
                        key
                    )));
                }
                let value = args.values.get(1).cloned().unwrap_or(Value::Null);
                self.config.borrow_mut().set(key, value)?;
                self.rebuild_menu();
                Ok(Value::Null)
            }
            ConfigGetLineNumbers => {
                args.arity(0)?;
                Ok(json!(self.config.borrow().get_bool(keys::LINE_NUMBERS)))
            }
            ConfigToggleLineNumbers => {
                args.arity(0)?;
                let next = !self.config.borrow().get_bool(keys::LINE_NUMBERS);
                self.config.borrow_mut().set(keys::LINE_NUMBERS, json!(next))?;
                self.rebuild_menu();
                Ok(json!(next))
            }

            TabCreate => {
                args.arity(2)?;
                let path = args.opt_str(0, "path")?;
                let content = args.opt_str(1, "content")?.map(str::to_string);
                let tab = self.tabs.create(path, content)?;
                if let Some(path) = path {
                    self.record_recent(path)?;
                }
                to_value(tab)
            }
            TabClose => {
                args.arity(1)?;
                self.tabs.close(&args.tab_id(0)?)?;
                Ok(Value::Null)
            }
            TabSwitch => {
                args.arity(1)?;
                let tab = self.tabs.switch(&args.tab_id(0)?)?;
                if let Some(path) = &tab.file_path {
                    self.workspace.set_last_active_file(path)?;
                }
                to_value(tab)
            }
            TabGet => {
                args.arity(1)?;
                let id = args.tab_id(0)?;
                let tab = self
                    .tabs
                    .get(&id)
                    .ok_or_else(|| AppError::NotFound(format!("tab {}", id)))?;
                to_value(tab)
            }
            TabGetAll => {
                args.arity(0)?;
                to_value(self.tabs.all())
            }
            TabGetModified => {
                args.arity(0)?;
                to_value(self.tabs.modified())
            }
            TabGetActive => {
                args.arity(0)?;
                to_value(self.tabs.active())
            }
            TabMarkModified => {
                args.arity(2)?;
                let id = args.tab_id(0)?;
                self.tabs.mark_modified(&id, args.bool(1, "modified")?)?;
                Ok(Value::Null)
            }
            TabUpdateContent => {
                args.arity(2)?;
                let id = args.tab_id(0)?;
                let content = args.str(1, "content")?.to_string();
                Ok(json!(self.tabs.update_content(&id, content)?))
            }
            TabUpdateScroll => {
                args.arity(2)?;
                let id = args.tab_id(0)?;
                self.tabs.update_scroll(&id, args.f64(1, "scrollPosition")?)?;
                Ok(Value::Null)
            }
            TabUpdateCursor => {
                args.arity(2)?;
                let id = args.tab_id(0)?;
                let cursor: CursorPosition = args.parse(1, "cursor")?;
                self.tabs.update_cursor(&id, cursor)?;
                Ok(Value::Null)
            }
            TabUpdateFilePath => {
                args.arity(2)?;
                let id = args.tab_id(0)?;
                let path = args.str(1, "filePath")?;
                let tab = self.tabs.update_file_path(&id, path)?;
                self.record_recent(path)?;
                to_value(tab)
            }
            TabSave => {
                args.arity(0)?;
                self.tabs.save()?;
                Ok(Value::Null)
            }
            TabRestore => {
                args.arity(0)?;
                to_value(self.tabs.restore()?)
            }
            TabGetNext => {
                args.arity(0)?;
                to_value(self.tabs.next())
            }
            TabGetPrevious => {
                args.arity(0)?;
                to_value(self.tabs.previous())
            }

            ShortcutsGet => {
                args.arity(1)?;
                let action = parse_action(args.str(0, "actionId")?)?;
                to_value(self.shortcuts.get(action))
            }
            ShortcutsSet => {
                args.arity(2)?;
                let action = parse_action(args.str(0, "actionId")?)?;
                let binding = self.shortcuts.set(action, args.str(1, "binding")?)?;
                self.rebuild_menu();
                to_value(binding)
            }
            ShortcutsReset => {
                args.arity(1)?;
                let action = parse_action(args.str(0, "actionId")?)?;
                let binding = self.shortcuts.reset(action)?;
                self.rebuild_menu();
                to_value(binding)
            }
            ShortcutsResetAll => {
                args.arity(0)?;
                self.shortcuts.reset_all()?;
                self.rebuild_menu();
                Ok(Value::Null)
            }
            ShortcutsGetAll => {
                args.arity(0)?;
                to_value(self.shortcuts.all())
            }
            ShortcutsGetAvailableActions => {
                args.arity(0)?;
                to_value(self.shortcuts.available_actions())
            }
            ShortcutsCheckConflict => {
                args.arity(2)?;
                let binding = Keybinding::parse(args.str(0, "binding")?)?;
                let except = args.opt_str(1, "exceptActionId")?.map(parse_action).transpose()?;
                to_value(self.shortcuts.check_conflict(&binding, except))
            }
            ShortcutsGetDefault => {
                args.arity(1)?;
                let action = parse_action(args.str(0, "actionId")?)?;
                to_value(self.shortcuts.default_binding(action))
            }

            TemplateGet => {
                args.arity(1)?;
                to_value(self.templates.get(args.str(0, "id")?))
            }
            TemplateGetAll => {
                args.arity(0)?;
                to_value(self.templates.all())
            }
            TemplateGetBuiltIn => {
                args.arity(0)?;
                to_value(self.templates.built_ins())
            }
            TemplateGetCustom => {
                args.arity(0)?;
                to_value(self.templates.custom())
            }
            TemplateSaveCustom => {
                args.arity(3)?;
                let name = args.str(0, "name")?;
                let content = args.str(1, "content")?;
                let metadata: TemplateMetadata = args.parse_or_default(2, "metadata")?;
                to_value(self.templates.save_custom(name, content, metadata)?)
            }
            TemplateDeleteCustom => {
                args.arity(1)?;
                Ok(json!(self.templates.delete_custom(args.str(0, "id")?)?))
            }
            TemplateUpdateCustom => {
                args.arity(2)?;
                let id = args.str(0, "id")?;
                let changes: TemplateChanges = args.parse(1, "changes")?;
                Ok(json!(self.templates.update_custom(id, changes)?))
            }
            TemplateGetCategories => {
                args.arity(0)?;
                to_value(self.templates.categories())
            }
            TemplateGetByCategory => {
                args.arity(1)?;
                to_value(self.templates.by_category(args.str(0, "category")?))
            }
            TemplateMarkUsed => {
                args.arity(1)?;
                self.templates.mark_used(args.str(0, "id")?)?;
                Ok(Value::Null)
            }
            TemplateFindPlaceholders => {
                args.arity(1)?;
                to_value(self.templates.find_placeholders(args.str(0, "content")?))
            }
            TemplateGetFirstPlaceholderPosition => {
                args.arity(1)?;
                Ok(json!(
                    self.templates
                        .first_placeholder_position(args.str(0, "content")?)
                ))
            }

            AdvancedMarkdownGetSettings => {
                args.arity(0)?;
                to_value(self.markdown.all())
            }
            AdvancedMarkdownToggleFeature => {
                args.arity(2)?;
                let name = args.str(0, "name")?;
                Feature::parse(name)?;
                let enabled = match args.values.get(1) {
                    Some(Value::Bool(b)) => *b,
                    other => {
                        return Err(AppError::InvalidValue(format!(
                            "enabled must be a boolean, got {}",
                            other.map(Value::to_string).unwrap_or_else(|| "nothing".to_string())
                        )));
                    }
                };
                if self.markdown.toggle(name, enabled)? {
                    self.events.emit(Event::SettingsChanged {
                        name: name.to_string(),
                        enabled,
                    });
                }
                to_value(self.markdown.all())
            }

            WorkspaceOpen => {
                args.arity(1)?;
                let path = match args.opt_str(0, "path")? {
                    Some(p) => p.to_string(),
                    None => match self.collaborators.dialogs.open_folder() {
                        Some(p) => path_string(&p),
                        None => return Ok(Value::Null),
                    },
                };
                Ok(json!(self.workspace.open(&path)?))
            }
            WorkspaceClose => {
                args.arity(0)?;
                self.workspace.close()?;
                Ok(Value::Null)
            }
            WorkspaceGetPath => {
                args.arity(0)?;
                Ok(json!(self.workspace.root_string()))
            }
            WorkspaceGetTree => {
                args.arity(0)?;
                to_value(self.workspace.get_tree()?)
            }
            WorkspaceRestore => {
                args.arity(0)?;
                Ok(json!(self.workspace.restore()?))
            }
            WorkspaceToggleFolder => {
                args.arity(2)?;
                let path = args.str(0, "path")?;
                self.workspace.toggle_folder(path, args.bool(1, "expanded")?)?;
                Ok(Value::Null)
            }

            GlobalSearch => {
                args.arity(2)?;
                let text = args.str(0, "text")?;
                let options: SearchOptions = args.parse_or_default(1, "options")?;
                to_value(self.search.search(self.workspace.root(), text, options)?)
            }

            ImageSaveFromClipboard => {
                args.arity(2)?;
                let data = args.str(0, "data")?;
                let base = args
                    .opt_str(1, "documentPath")?
                    .and_then(|doc| Path::new(doc).parent().map(Path::to_path_buf))
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .or_else(|| self.workspace.root().map(Path::to_path_buf))
                    .unwrap_or_else(std::env::temp_dir);
                to_value(save_png(&base, data)?)
            }

            ShellOpenExternal => {
                args.arity(1)?;
                let url = args.str(0, "url")?;
                check_external_url(url)?;
                self.collaborators.shell.open_external(url)?;
                Ok(Value::Null)
            }

            UpdateCheck => {
                args.arity(0)?;
                self.check_for_updates()?;
                to_value(self.updater.state())
            }
            UpdateDownload => {
                args.arity(0)?;
                self.updater.download_update()?;
                to_value(self.updater.state())
            }
            UpdateInstall => {
                args.arity(0)?;
                self.updater.install()?;
                to_value(self.updater.state())
            }
            UpdateGetState => {
                args.arity(0)?;
                to_value(self.updater.state())
            }
            UpdateDismissError => {
                args.arity(0)?;
                self.updater.dismiss_error()?;
                to_value(self.updater.state())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::update::UpdateEvent;
    use crate::app::infrastructure::config_store::ConfigStore;
    use std::sync::mpsc::Sender;
    use tempfile::TempDir;

    struct NullSource;

    impl UpdateSource for NullSource {
        fn check(&mut self, _events: Sender<UpdateEvent>) {}
        fn download(&mut self, _version: &str, _events: Sender<UpdateEvent>) {}
        fn install(&mut self, _artifact: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn router(dir: &TempDir) -> IpcRouter {
        let config = ConfigStore::open(dir.path().join("config.json")).into_shared();
        IpcRouter::new(config, Platform::Linux, Box::new(NullSource), Collaborators::default())
    }

    fn err_code(response: Response) -> String {
        response.into_result().unwrap_err().code
    }

    #[test]
    fn test_unknown_channel() {
        let dir = TempDir::new().unwrap();
        let mut r = router(&dir);
        assert_eq!(err_code(r.handle("tab:explode", &[])), "UNKNOWN_CHANNEL");
    }

    #[test]
    fn test_argument_validation() {
        let dir = TempDir::new().unwrap();
        let mut r = router(&dir);
        assert_eq!(err_code(r.handle("tab:close", &[])), "INVALID_ARGUMENT");
        assert_eq!(err_code(r.handle("tab:close", &[json!(42)])), "INVALID_ARGUMENT");
        assert_eq!(err_code(r.handle("tab:get-all", &[json!(1)])), "INVALID_ARGUMENT");
        assert_eq!(err_code(r.handle("tab:close", &[json!("nope")])), "NOT_FOUND");
    }

    #[test]
    fn test_toggle_feature_value_checks() {
        let dir = TempDir::new().unwrap();
        let mut r = router(&dir);
        let bad = r.handle("advanced-markdown:toggle-feature", &[json!("katex"), json!("no")]);
        assert_eq!(err_code(bad), "INVALID_VALUE");
        let unknown = r.handle("advanced-markdown:toggle-feature", &[json!("plantuml"), json!(true)]);
        assert_eq!(err_code(unknown), "UNKNOWN_FEATURE");

        let ok = r
            .handle("advanced-markdown:toggle-feature", &[json!("katex"), json!(false)])
            .into_result()
            .unwrap();
        assert_eq!(ok["katex"], json!(false));
        assert_eq!(r.events().drain().len(), 1);
        r.handle("advanced-markdown:toggle-feature", &[json!("katex"), json!(false)]);
        assert_eq!(r.events().pending(), 0);
    }

    #[test]
    fn test_cancelled_dialogs_return_null() {
        let dir = TempDir::new().unwrap();
        let mut r = router(&dir);
        assert_eq!(r.handle("file:open", &[]), Response::Ok(Value::Null));
        assert_eq!(r.handle("workspace:open", &[]), Response::Ok(Value::Null));
        assert_eq!(r.handle("file:save-as", &[json!("text")]), Response::Ok(Value::Null));
        assert_eq!(r.handle("export:html", &[json!("# x")]), Response::Ok(Value::Null));
    }

    #[test]
    fn test_save_marks_tab_clean_and_records_recent() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.md");
        fs::write(&file, "old").unwrap();
        let path = file.to_string_lossy().into_owned();
        let mut r = router(&dir);

        let tab = r.handle("tab:create", &[json!(path)]).into_result().unwrap();
        let id = tab["id"].clone();
        r.handle("tab:update-content", &[id.clone(), json!("new")]);
        assert_eq!(r.handle("tab:get-modified", &[]).into_result().unwrap().as_array().unwrap().len(), 1);

        r.handle("file:save", &[json!(path), json!("new")]).into_result().unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "new");
        assert_eq!(r.handle("tab:get-modified", &[]), Response::Ok(json!([])));
        let recent = r.handle("file:get-recent", &[]).into_result().unwrap();
        assert_eq!(recent[0]["path"], json!(path));
    }

    #[test]
    fn test_open_recent_missing_file_prunes_list() {
        let dir = TempDir::new().unwrap();
        let mut r = router(&dir);
        let gone = dir.path().join("gone.md").to_string_lossy().into_owned();
        r.config().borrow_mut().add_recent_file(&gone).unwrap();
        assert_eq!(err_code(r.handle("file:open-recent", &[json!(gone)])), "NOT_FOUND");
        assert_eq!(r.handle("file:get-recent", &[]), Response::Ok(json!([])));
    }

    #[test]
    fn test_pdf_without_printer_unsupported() {
        let dir = TempDir::new().unwrap();
        let mut r = router(&dir);
        assert_eq!(err_code(r.handle("export:pdf", &[json!("<p>x</p>")])), "UNSUPPORTED");
    }

    #[test]
    fn test_export_html_writes_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out.html");
        let mut r = router(&dir);
        let res = r
            .handle("export:html", &[json!("# Title"), json!(out.to_string_lossy()), json!("Doc")])
            .into_result()
            .unwrap();
        assert_eq!(res, json!(out.to_string_lossy()));
        assert!(fs::read_to_string(&out).unwrap().contains("<h1>Title</h1>"));
    }

    #[test]
    fn test_menu_activation() {
        let dir = TempDir::new().unwrap();
        let mut r = router(&dir);
        r.activate_menu("find-in-files").unwrap();
        let events = r.events().drain();
        assert_eq!(
            events,
            vec![Event::MenuAction {
                action: "find-in-files".to_string(),
                payload: None
            }]
        );
        assert_eq!(r.activate_menu("bogus").unwrap_err().code(), "NOT_FOUND");
    }

    #[test]
    fn test_shell_rejects_file_urls() {
        let dir = TempDir::new().unwrap();
        let mut r = router(&dir);
        let res = r.handle("shell:open-external", &[json!("file:///etc/passwd")]);
        assert_eq!(err_code(res), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_file_dropped_emits_for_markdown_only() {
        let dir = TempDir::new().unwrap();
        let md = dir.path().join("n.md");
        let txt = dir.path().join("n.txt");
        fs::write(&md, "").unwrap();
        fs::write(&txt, "").unwrap();
        let mut r = router(&dir);
        assert_eq!(r.handle("file:dropped", &[json!(md.to_string_lossy())]), Response::Ok(json!(true)));
        assert_eq!(r.handle("file:dropped", &[json!(txt.to_string_lossy())]), Response::Ok(json!(false)));
        assert_eq!(r.events().drain().len(), 1);
    }
}
