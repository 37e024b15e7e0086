//! The closed list of request/response channels.

macro_rules! channels {
    ($($variant:ident => $name:literal,)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Channel {
            $($variant,)*
        }

        impl Channel {
            pub const ALL: &'static [Channel] = &[$(Channel::$variant,)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Channel::$variant => $name,)*
                }
            }

            pub fn from_str(name: &str) -> Option<Channel> {
                match name {
                    $($name => Some(Channel::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

channels! {
    FileOpen => "file:open",
    FileOpenRecent => "file:open-recent",
    FileRead => "file:read",
    FileSave => "file:save",
    FileSaveAs => "file:save-as",
    FileDropped => "file:dropped",
    FileGetRecent => "file:get-recent",
    FileRemoveRecent => "file:remove-recent",
    FileClearRecent => "file:clear-recent",

    ExportHtml => "export:html",
    ExportPdf => "export:pdf",

    ConfigGet => "config:get",
    ConfigSet => "config:set",
    ConfigGetLineNumbers => "config:get-line-numbers",
    ConfigToggleLineNumbers => "config:toggle-line-numbers",

    TabCreate => "tab:create",
    TabClose => "tab:close",
    TabSwitch => "tab:switch",
    TabGet => "tab:get",
    TabGetAll => "tab:get-all",
    TabGetModified => "tab:get-modified",
    TabGetActive => "tab:get-active",
    TabMarkModified => "tab:mark-modified",
    TabUpdateContent => "tab:update-content",
    TabUpdateScroll => "tab:update-scroll",
    TabUpdateCursor => "tab:update-cursor",
    TabUpdateFilePath => "tab:update-filepath",
    TabSave => "tab:save",
    TabRestore => "tab:restore",
    TabGetNext => "tab:get-next",
    TabGetPrevious => "tab:get-previous",

    ShortcutsGet => "shortcuts:get",
    ShortcutsSet => "shortcuts:set",
    ShortcutsReset => "shortcuts:reset",
    ShortcutsResetAll => "shortcuts:reset-all",
    ShortcutsGetAll => "shortcuts:get-all",
    ShortcutsGetAvailableActions => "shortcuts:get-available-actions",
    ShortcutsCheckConflict => "shortcuts:check-conflict",
    ShortcutsGetDefault => "shortcuts:get-default",

    TemplateGet => "template:get",
    TemplateGetAll => "template:get-all",
    TemplateGetBuiltIn => "template:get-builtin",
    TemplateGetCustom => "template:get-custom",
    TemplateSaveCustom => "template:save-custom",
    TemplateDeleteCustom => "template:delete-custom",
    TemplateUpdateCustom => "template:update-custom",
    TemplateGetCategories => "template:get-categories",
    TemplateGetByCategory => "template:get-by-category",
    TemplateMarkUsed => "template:mark-used",
    TemplateFindPlaceholders => "template:find-placeholders",
    TemplateGetFirstPlaceholderPosition => "template:get-first-placeholder-position",

    AdvancedMarkdownGetSettings => "advanced-markdown:get-settings",
    AdvancedMarkdownToggleFeature => "advanced-markdown:toggle-feature",

    WorkspaceOpen => "workspace:open",
    WorkspaceClose => "workspace:close",
    WorkspaceGetPath => "workspace:get-path",
    WorkspaceGetTree => "workspace:get-tree",
    WorkspaceRestore => "workspace:restore",
    WorkspaceToggleFolder => "workspace:toggle-folder",

    GlobalSearch => "global-search:search",
    ImageSaveFromClipboard => "image:save-from-clipboard",
    ShellOpenExternal => "shell:open-external",

    UpdateCheck => "update:check",
    UpdateDownload => "update:download",
    UpdateInstall => "update:install",
    UpdateGetState => "update:get-state",
    UpdateDismissError => "update:dismiss-error",
}
