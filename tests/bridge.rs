mod common;

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use serde_json::json;
use tempfile::TempDir;

use common::{harness, path_str};
use markpad::app::controllers::search::SearchOptions;
use markpad::app::controllers::templates::TemplateChanges;
use markpad::app::domain::tab::CursorPosition;
use markpad::app::domain::template::TemplateOrigin;
use markpad::ipc::Transport;

#[test]
fn test_restore_skips_tabs_whose_file_vanished() {
    let config_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let a = docs.path().join("a.md");
    let b = docs.path().join("b.md");
    fs::write(&a, "# A").unwrap();
    fs::write(&b, "# B").unwrap();
    let config = config_dir.path().join("config.json");

    {
        let h = harness(&config);
        h.bridge.open_file(Some(&path_str(&a))).unwrap().unwrap();
        let tab_b = h.bridge.open_file(Some(&path_str(&b))).unwrap().unwrap();
        h.bridge.update_tab_scroll(&tab_b.id, 120.0).unwrap();
        h.bridge.create_tab(None, Some("scratch")).unwrap();
        h.bridge.save_tabs().unwrap();
    }

    fs::remove_file(&b).unwrap();

    let h = harness(&config);
    let restored = h.bridge.restore_tabs().unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].file_path.as_deref(), Some(path_str(&a).as_str()));
    assert_eq!(restored[0].content, "# A");
    assert!(!restored[0].modified);

    let active = h.bridge.get_active_tab().unwrap().unwrap();
    assert_eq!(active.id, restored[0].id);
}

#[test]
fn test_shortcut_conflict_leaves_bindings_untouched() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    let before = h.bridge.get_all_shortcuts().unwrap();

    let err = h.bridge.set_shortcut("new", "Ctrl+S").unwrap_err();
    assert_eq!(err.code, "CONFLICT");
    assert_eq!(err.conflict_with.as_deref(), Some("save"));
    assert_eq!(h.bridge.get_all_shortcuts().unwrap(), before);

    let owner = h.bridge.check_shortcut_conflict("Ctrl+S", None).unwrap();
    assert_eq!(owner.map(|a| a.as_str()), Some("save"));
    assert_eq!(h.bridge.check_shortcut_conflict("Ctrl+S", Some("save")).unwrap(), None);
}

#[test]
fn test_shortcut_change_survives_restart() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    {
        let h = harness(&config);
        assert_eq!(h.bridge.set_shortcut("find", "ctrl+alt+f").unwrap(), "Ctrl+Alt+F");
    }
    let h = harness(&config);
    assert_eq!(h.bridge.get_shortcut("find").unwrap().as_deref(), Some("Ctrl+Alt+F"));
    assert_eq!(h.bridge.reset_shortcut("find").unwrap().as_deref(), Some("Ctrl+F"));
    assert_eq!(h.bridge.get_default_shortcut("find").unwrap().as_deref(), Some("Ctrl+F"));
}

#[test]
fn test_unknown_action_is_rejected() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    let err = h.bridge.get_shortcut("launch-rockets").unwrap_err();
    assert_eq!(err.code, "NOT_FOUND");
}

#[test]
fn test_recent_files_are_most_recent_first() {
    let config_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let paths: Vec<String> = ["x.md", "y.md", "z.md"]
        .iter()
        .map(|name| {
            let p = docs.path().join(name);
            fs::write(&p, name).unwrap();
            path_str(&p)
        })
        .collect();
    let h = harness(&config_dir.path().join("config.json"));

    h.bridge.open_file(Some(&paths[0])).unwrap();
    h.bridge.open_file(Some(&paths[1])).unwrap();
    h.bridge.open_file(Some(&paths[2])).unwrap();
    h.bridge.open_file(Some(&paths[0])).unwrap();

    let recent: Vec<String> = h
        .bridge
        .get_recent_files()
        .unwrap()
        .into_iter()
        .map(|f| f.path)
        .collect();
    assert_eq!(recent, vec![paths[0].clone(), paths[2].clone(), paths[1].clone()]);

    let remaining = h.bridge.remove_recent_file(&paths[2]).unwrap();
    assert_eq!(remaining.len(), 2);
    h.bridge.clear_recent_files().unwrap();
    assert!(h.bridge.get_recent_files().unwrap().is_empty());
}

#[test]
fn test_open_recent_missing_file_drops_entry() {
    let config_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let gone = docs.path().join("gone.md");
    fs::write(&gone, "bye").unwrap();
    let h = harness(&config_dir.path().join("config.json"));
    h.bridge.open_file(Some(&path_str(&gone))).unwrap();
    fs::remove_file(&gone).unwrap();

    let err = h.bridge.open_recent(&path_str(&gone)).unwrap_err();
    assert_eq!(err.code, "NOT_FOUND");
    assert!(h.bridge.get_recent_files().unwrap().is_empty());
}

#[test]
fn test_save_marks_open_tab_clean() {
    let config_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let path = docs.path().join("note.md");
    fs::write(&path, "old").unwrap();
    let h = harness(&config_dir.path().join("config.json"));

    let tab = h.bridge.open_file(Some(&path_str(&path))).unwrap().unwrap();
    assert!(h.bridge.update_tab_content(&tab.id, "new").unwrap());
    assert_eq!(h.bridge.get_modified_tabs().unwrap().len(), 1);

    h.bridge.save_file(&path_str(&path), "new").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    assert!(h.bridge.get_modified_tabs().unwrap().is_empty());
    assert_eq!(h.bridge.read_file(&path_str(&path)).unwrap(), "new");
}

#[test]
fn test_whole_word_search() {
    let config_dir = TempDir::new().unwrap();
    let ws = TempDir::new().unwrap();
    fs::write(ws.path().join("notes.md"), "test testing\n").unwrap();
    let h = harness(&config_dir.path().join("config.json"));
    h.bridge.open_workspace(Some(&path_str(ws.path()))).unwrap();

    let options = SearchOptions {
        whole_word: true,
        ..SearchOptions::default()
    };
    let response = h.bridge.global_search("test", options).unwrap();
    assert!(response.success);
    assert_eq!(response.total_files, 1);
    assert_eq!(response.total_matches, 1);
    let span = &response.results[0].matches[0].matches[0];
    assert_eq!((span.start, span.end), (0, 4));
    assert_eq!(response.results[0].matches[0].line, 1);
}

#[test]
fn test_invalid_regex_falls_back_to_literal() {
    let config_dir = TempDir::new().unwrap();
    let ws = TempDir::new().unwrap();
    fs::write(ws.path().join("brackets.md"), "[x]\n").unwrap();
    let h = harness(&config_dir.path().join("config.json"));
    h.bridge.open_workspace(Some(&path_str(ws.path()))).unwrap();

    let options = SearchOptions {
        use_regex: true,
        ..SearchOptions::default()
    };
    let response = h.bridge.global_search("[", options).unwrap();
    assert_eq!(response.total_matches, 1);
    let span = &response.results[0].matches[0].matches[0];
    assert_eq!((span.start, span.end), (0, 1));
    assert_eq!(span.text, "[");
}

#[test]
fn test_search_without_workspace_fails() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    let err = h
        .bridge
        .global_search("anything", SearchOptions::default())
        .unwrap_err();
    assert_eq!(err.code, "NO_WORKSPACE");
}

#[test]
fn test_workspace_tree_hides_excluded_entries() {
    let config_dir = TempDir::new().unwrap();
    let ws = TempDir::new().unwrap();
    fs::create_dir_all(ws.path().join("docs")).unwrap();
    fs::create_dir_all(ws.path().join("node_modules/pkg")).unwrap();
    fs::create_dir_all(ws.path().join(".git")).unwrap();
    fs::write(ws.path().join("readme.md"), "hi").unwrap();
    fs::write(ws.path().join("docs/guide.md"), "guide").unwrap();
    let h = harness(&config_dir.path().join("config.json"));

    let root = h.bridge.open_workspace(Some(&path_str(ws.path()))).unwrap().unwrap();
    assert_eq!(h.bridge.get_workspace_path().unwrap().as_deref(), Some(root.as_str()));

    let tree = h.bridge.get_workspace_tree().unwrap();
    let mut names = Vec::new();
    tree.walk(&mut |node| names.push(node.name.clone()));
    assert!(names.iter().any(|n| n == "readme.md"));
    assert!(names.iter().any(|n| n == "docs"));
    assert!(!names.iter().any(|n| n == "node_modules" || n == ".git"));

    h.bridge.close_workspace().unwrap();
    assert_eq!(h.bridge.get_workspace_path().unwrap(), None);
}

#[test]
fn test_advanced_markdown_flags_persist() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    {
        let h = harness(&config);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = changes.clone();
        let sub = h
            .bridge
            .on_advanced_markdown_settings_changed(move |name, enabled| {
                sink.borrow_mut().push((name.to_string(), enabled));
            });

        let flags = h
            .bridge
            .toggle_advanced_markdown_feature("mermaid", json!(false))
            .unwrap();
        assert!(!flags.mermaid);
        h.bridge
            .toggle_advanced_markdown_feature("mermaid", json!(false))
            .unwrap();
        assert_eq!(*changes.borrow(), vec![("mermaid".to_string(), false)]);
        assert!(sub.unsubscribe());
    }

    let h = harness(&config);
    let flags = h.bridge.get_advanced_markdown_settings().unwrap();
    assert!(!flags.mermaid);
    assert!(flags.katex);
    assert!(flags.callouts);
}

#[test]
fn test_advanced_markdown_rejects_bad_input() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    let err = h
        .bridge
        .toggle_advanced_markdown_feature("plantuml", json!(true))
        .unwrap_err();
    assert_eq!(err.code, "UNKNOWN_FEATURE");
    let err = h
        .bridge
        .toggle_advanced_markdown_feature("katex", json!("yes"))
        .unwrap_err();
    assert_eq!(err.code, "INVALID_VALUE");
    assert!(h.bridge.get_advanced_markdown_settings().unwrap().katex);
}

#[test]
fn test_menu_action_listener_stops_after_unsubscribe() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let sub = h.bridge.on_menu_action(move |action, _payload| {
        sink.borrow_mut().push(action.to_string());
    });

    let router = h.transport.router();
    router.borrow_mut().activate_menu("save").unwrap();
    h.transport.pump();
    assert_eq!(*seen.borrow(), vec!["save".to_string()]);

    assert!(sub.unsubscribe());
    router.borrow_mut().activate_menu("save").unwrap();
    h.transport.pump();
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_dropped_markdown_file_is_announced() {
    let config_dir = TempDir::new().unwrap();
    let docs = TempDir::new().unwrap();
    let md = docs.path().join("drop.md");
    let txt = docs.path().join("drop.png");
    fs::write(&md, "x").unwrap();
    fs::write(&txt, "x").unwrap();
    let h = harness(&config_dir.path().join("config.json"));

    let dropped = Rc::new(RefCell::new(Vec::new()));
    let sink = dropped.clone();
    let _sub = h.bridge.on_file_dropped(move |p| sink.borrow_mut().push(p.to_string()));

    assert!(h.bridge.file_dropped(&path_str(&md)).unwrap());
    assert!(!h.bridge.file_dropped(&path_str(&txt)).unwrap());
    assert_eq!(*dropped.borrow(), vec![path_str(&md)]);
}

#[test]
fn test_templates_through_bridge() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));

    let built_in = h.bridge.get_built_in_templates().unwrap().len();
    assert!(built_in > 0);
    let saved = h
        .bridge
        .save_custom_template("Standup", "## {{date}}\n{{notes}}", None)
        .unwrap();
    assert_eq!(h.bridge.get_all_templates().unwrap().len(), built_in + 1);
    assert_eq!(
        h.bridge.find_placeholders("## {{date}}\n{{notes}} {{date}}").unwrap(),
        vec!["{{date}}".to_string(), "{{notes}}".to_string()]
    );
    assert_eq!(h.bridge.first_placeholder_position("ab {{x}}").unwrap(), 3);
    assert_eq!(h.bridge.first_placeholder_position("none").unwrap(), -1);
    assert!(h.bridge.delete_custom_template(&saved.id).unwrap());
    assert_eq!(h.bridge.get_custom_templates().unwrap().len(), 0);
}

#[test]
fn test_line_number_toggle_round_trips() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    let initial = h.bridge.get_line_numbers().unwrap();
    assert_eq!(h.bridge.toggle_line_numbers().unwrap(), !initial);
    assert_eq!(h.bridge.config_get("lineNumbers").unwrap(), json!(!initial));
}

#[test]
fn test_export_html_writes_document() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.html");
    let h = harness(&dir.path().join("config.json"));
    let written = h
        .bridge
        .export_html("# Hello\n\n**bold**", Some(&path_str(&out)), Some("Hello"))
        .unwrap();
    assert_eq!(written.as_deref(), Some(path_str(&out).as_str()));
    let html = fs::read_to_string(&out).unwrap();
    assert!(html.contains("<title>Hello</title>"));
    assert!(html.contains("<strong>bold</strong>"));
}

#[test]
fn test_export_pdf_without_printer_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    let err = h.bridge.export_pdf("<p>x</p>", Some("/tmp/never.pdf")).unwrap_err();
    assert_eq!(err.code, "UNSUPPORTED");
}

#[test]
fn test_open_external_rejects_unsafe_scheme() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    let err = h.bridge.open_external("file:///etc/passwd").unwrap_err();
    assert_eq!(err.code, "INVALID_ARGUMENT");
}

#[test]
fn test_tab_navigation_and_close() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    let first = h.bridge.create_tab(None, None).unwrap();
    let second = h.bridge.create_tab(None, Some("draft")).unwrap();
    let third = h.bridge.create_tab(None, None).unwrap();
    assert_eq!(first.title, "Untitled 1");
    assert!(second.modified);
    assert_eq!(h.bridge.get_all_tabs().unwrap().len(), 3);

    h.bridge.switch_tab(&first.id).unwrap();
    assert_eq!(h.bridge.next_tab().unwrap().unwrap().id, second.id);
    assert_eq!(h.bridge.previous_tab().unwrap().unwrap().id, third.id);
    assert_eq!(h.bridge.get_active_tab().unwrap().unwrap().id, first.id);

    h.bridge
        .update_tab_cursor(&second.id, CursorPosition { line: 3, column: 7 })
        .unwrap();
    h.bridge.mark_tab_modified(&second.id, false).unwrap();
    let second_now = h.bridge.get_tab(&second.id).unwrap();
    assert_eq!(second_now.cursor, CursorPosition { line: 3, column: 7 });
    assert!(!second_now.modified);

    h.bridge.close_tab(&first.id).unwrap();
    assert_eq!(h.bridge.get_active_tab().unwrap().unwrap().id, second.id);
    assert_eq!(h.bridge.get_tab(&first.id).unwrap_err().code, "NOT_FOUND");
}

#[test]
fn test_save_as_names_the_tab() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("named.md");
    let h = harness(&dir.path().join("config.json"));
    let tab = h.bridge.create_tab(None, Some("body")).unwrap();

    let written = h.bridge.save_file_as("body", Some(&path_str(&target))).unwrap();
    assert_eq!(written.as_deref(), Some(path_str(&target).as_str()));
    let renamed = h.bridge.update_tab_file_path(&tab.id, &path_str(&target)).unwrap();
    assert_eq!(renamed.title, "named.md");
    assert_eq!(h.bridge.get_recent_files().unwrap()[0].path, path_str(&target));

    // No dialog is available, so an unnamed save is a cancellation.
    assert_eq!(h.bridge.save_file_as("body", None).unwrap(), None);
}

#[test]
fn test_clipboard_image_lands_next_to_document() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("post.md");
    let h = harness(&dir.path().join("config.json"));

    let saved = h
        .bridge
        .save_image_from_clipboard("data:image/png;base64,iVBORw0KGgo=", Some(&path_str(&doc)))
        .unwrap();
    assert!(saved.markdown_path.starts_with("images/pasted-"));
    assert!(saved.path.starts_with(&path_str(dir.path())));
    assert!(std::path::Path::new(&saved.path).is_file());

    let err = h
        .bridge
        .save_image_from_clipboard("bm90IGFuIGltYWdl", Some(&path_str(&doc)))
        .unwrap_err();
    assert_eq!(err.code, "INVALID_ARGUMENT");
}

#[test]
fn test_workspace_is_restored_on_next_run() {
    let config_dir = TempDir::new().unwrap();
    let ws = TempDir::new().unwrap();
    let config = config_dir.path().join("config.json");
    let root = {
        let h = harness(&config);
        h.bridge.open_workspace(Some(&path_str(ws.path()))).unwrap().unwrap()
    };

    let h = harness(&config);
    assert_eq!(h.bridge.restore_workspace().unwrap().as_deref(), Some(root.as_str()));
}

#[test]
fn test_custom_template_edits() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    let saved = h.bridge.save_custom_template("Log", "{{entry}}", None).unwrap();
    h.bridge.mark_template_used(&saved.id).unwrap();

    let changes: TemplateChanges =
        serde_json::from_value(json!({ "name": "Daily log", "category": "journal" })).unwrap();
    assert!(h.bridge.update_custom_template(&saved.id, changes).unwrap());
    let updated = h.bridge.get_template(&saved.id).unwrap().unwrap();
    assert_eq!(updated.name, "Daily log");
    assert!(matches!(
        updated.origin,
        TemplateOrigin::Custom { last_used: Some(_), .. }
    ));

    assert!(h.bridge.get_template_categories().unwrap().contains(&"journal".to_string()));
    assert_eq!(h.bridge.get_templates_by_category("journal").unwrap().len(), 1);

    let err = h.bridge.delete_custom_template("readme").unwrap_err();
    assert_eq!(err.code, "IMMUTABLE");
}

#[test]
fn test_reset_all_restores_every_default() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    h.bridge.set_shortcut("find", "Ctrl+Alt+F").unwrap();
    h.bridge.reset_all_shortcuts().unwrap();
    assert_eq!(h.bridge.get_shortcut("find").unwrap().as_deref(), Some("Ctrl+F"));

    let actions = h.bridge.get_available_actions().unwrap();
    assert!(actions.iter().any(|a| a.id.as_str() == "save"));
    h.bridge.config_set("theme", json!("dark")).unwrap();
    assert_eq!(h.bridge.config_get("theme").unwrap(), json!("dark"));
}

#[test]
fn test_config_set_refuses_keys_owned_by_managers() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));

    let err = h
        .bridge
        .config_set("shortcuts", json!({ "find": "Ctrl+Alt+F" }))
        .unwrap_err();
    assert_eq!(err.code, "INVALID_ARGUMENT");
    assert_eq!(h.bridge.get_shortcut("find").unwrap().as_deref(), Some("Ctrl+F"));

    let err = h
        .bridge
        .config_set("advancedMarkdown.features", json!({ "mermaid": false }))
        .unwrap_err();
    assert_eq!(err.code, "INVALID_ARGUMENT");
    assert!(h.bridge.get_advanced_markdown_settings().unwrap().mermaid);

    for key in ["tabs", "activeTabId", "customTemplates", "recentFiles", "workspace.root"] {
        let err = h.bridge.config_set(key, json!(null)).unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT", "{}", key);
    }
    h.bridge.config_set("lineNumbers", json!(false)).unwrap();
    assert_eq!(h.bridge.config_get("lineNumbers").unwrap(), json!(false));
}

#[test]
fn test_malformed_tab_id_is_not_found() {
    let dir = TempDir::new().unwrap();
    let h = harness(&dir.path().join("config.json"));
    let tab = h.bridge.create_tab(None, Some("x")).unwrap();
    assert_eq!(h.bridge.get_tab(&tab.id).unwrap().id, tab.id);

    let err = h
        .transport
        .invoke("tab:get", vec![json!("tab-1")])
        .into_result()
        .unwrap_err();
    assert_eq!(err.code, "NOT_FOUND");
}
