//! End-to-end tests driving the IPC command handlers against a real
//! temporary file tree and an in-memory store, with the event loop,
//! dialogs and clipboard replaced by test doubles.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use context_dropper::app::events::UserEvent;
use context_dropper::app::file_dialog::DialogService;
use context_dropper::app::hover::UiMode;
use context_dropper::app::proxy::EventProxy;
use context_dropper::app::state::AppState;
use context_dropper::app::{commands, handle_ipc_message};
use context_dropper::config::AppConfig;
use context_dropper::core::ClipboardService;
use context_dropper::store::ProjectStore;

mod helpers {
    use super::*;

    /// A test double for the event loop proxy, collecting every event.
    #[derive(Clone)]
    pub struct TestEventProxy {
        pub events: Arc<Mutex<Vec<UserEvent>>>,
    }

    impl TestEventProxy {
        pub fn new() -> Self {
            Self {
                events: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn notices(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    UserEvent::Notice(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }

        pub fn errors(&self) -> Vec<String> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter_map(|e| match e {
                    UserEvent::ShowError(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl EventProxy for TestEventProxy {
        fn send_event(&self, event: UserEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    /// Dialog double that hands out a preconfigured project root.
    pub struct MockDialogService {
        pub project_root: Option<PathBuf>,
    }

    impl DialogService for MockDialogService {
        fn pick_project_root(&self) -> Option<PathBuf> {
            self.project_root.clone()
        }

        fn pick_selection_files(&self) -> Option<Vec<PathBuf>> {
            None
        }

        fn pick_selection_directory(&self) -> Option<PathBuf> {
            None
        }
    }

    /// Clipboard double that records copied text instead of touching the OS.
    pub struct MockClipboard {
        pub texts: Mutex<Vec<String>>,
    }

    impl MockClipboard {
        pub fn new() -> Self {
            Self {
                texts: Mutex::new(Vec::new()),
            }
        }
    }

    impl ClipboardService for MockClipboard {
        fn set_text(&self, text: &str) -> anyhow::Result<()> {
            self.texts.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    /// An isolated app environment per test case.
    pub struct TestHarness {
        pub state: Arc<Mutex<AppState>>,
        pub proxy: TestEventProxy,
        pub clipboard: Arc<MockClipboard>,
        pub root_path: PathBuf,
        _temp_dir: TempDir,
    }

    impl TestHarness {
        pub fn new() -> Self {
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let root_path = temp_dir.path().to_path_buf();

            let store = ProjectStore::in_memory().expect("Failed to open in-memory store");
            let state = AppState::new(AppConfig::default(), store)
                .expect("Failed to build app state");

            Self {
                state: Arc::new(Mutex::new(state)),
                proxy: TestEventProxy::new(),
                clipboard: Arc::new(MockClipboard::new()),
                root_path,
                _temp_dir: temp_dir,
            }
        }

        /// Creates a project rooted at the temp dir and makes it active.
        pub fn with_project(name: &str) -> Self {
            let harness = Self::new();
            let dialog = MockDialogService {
                project_root: Some(harness.root_path.clone()),
            };
            commands::create_project(
                serde_json::json!({ "name": name }),
                &dialog,
                harness.proxy.clone(),
                harness.state.clone(),
            );
            assert!(harness.state.lock().unwrap().active.is_some());
            harness
        }

        pub fn create_file(&self, path: &str, content: &str) {
            let file_path = self.root_path.join(path);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent dir");
            }
            fs::write(file_path, content).expect("Failed to write file");
        }

        pub fn add_selection(&self, path: &str, filters: &[&str]) {
            commands::add_selection(
                serde_json::json!({
                    "path": self.root_path.join(path),
                    "filters": filters,
                }),
                self.proxy.clone(),
                self.state.clone(),
            );
        }

        pub fn drop_context(&self) {
            commands::drop_context(
                self.proxy.clone(),
                self.state.clone(),
                &*self.clipboard,
            );
        }

        pub fn context_file(&self) -> String {
            fs::read_to_string(self.root_path.join("context.txt"))
                .expect("context.txt was not written")
        }

        pub fn active_project_id(&self) -> i64 {
            self.state
                .lock()
                .unwrap()
                .active
                .as_ref()
                .expect("no active project")
                .project
                .id
        }
    }
}

use helpers::*;

#[test]
fn export_writes_context_file_and_copies_prompt() {
    let harness = TestHarness::with_project("demo");
    harness.create_file("src/app.py", "x=1");
    harness.add_selection("src/app.py", &[]);

    harness.drop_context();

    let content = harness.context_file();
    assert!(content.contains(
        "----- File: src/app.py -----\nx=1\n----- End File: src/app.py -----"
    ));
    let copied = harness.clipboard.texts.lock().unwrap();
    assert_eq!(copied.len(), 1);
    assert!(copied[0].contains("My question is:"));
    assert!(harness.proxy.errors().is_empty());
}

#[test]
fn directory_selection_resolves_extension_filter_recursively() {
    let harness = TestHarness::with_project("demo");
    harness.create_file("src/main.py", "m");
    harness.create_file("src/deep/util.py", "u");
    harness.create_file("src/readme.md", "r");
    harness.add_selection("src", &["py"]);

    harness.drop_context();

    let content = harness.context_file();
    assert!(content.contains("----- File: src/main.py -----"));
    assert!(content.contains("----- File: src/deep/util.py -----"));
    assert!(!content.contains("readme.md -----"));
}

#[test]
fn export_with_no_selections_writes_summary_only() {
    let harness = TestHarness::with_project("empty");

    harness.drop_context();

    let content = harness.context_file();
    assert!(content.starts_with(
        "----- Project Structure (Files included in context file indicated with *) -----"
    ));
    assert!(!content.contains("----- File:"));
}

#[test]
fn category_filter_restricts_export_to_tagged_selections() {
    let harness = TestHarness::with_project("demo");
    harness.create_file("db/schema.sql", "CREATE TABLE t;");
    harness.create_file("api/routes.py", "route");
    harness.add_selection("db", &["sql"]);
    harness.add_selection("api", &["py"]);

    let (db_category, db_selection) = {
        let state = harness.state.lock().unwrap();
        let project_id = state.active.as_ref().unwrap().project.id;
        let category = state.store.add_category(project_id, "DB").unwrap();
        let selection = state
            .store
            .selection_by_path(project_id, &harness.root_path.join("db"))
            .unwrap()
            .unwrap();
        (category, selection.id)
    };
    commands::set_selection_categories(
        serde_json::json!({ "selectionId": db_selection, "categoryIds": [db_category] }),
        harness.proxy.clone(),
        harness.state.clone(),
    );
    commands::set_export_category(
        serde_json::json!({ "categoryId": db_category }),
        harness.proxy.clone(),
        harness.state.clone(),
    );

    harness.drop_context();

    let content = harness.context_file();
    assert!(content.contains("----- File: db/schema.sql -----"));
    assert!(!content.contains("routes.py"));
}

#[test]
fn selection_outside_project_root_is_rejected_with_notice() {
    let harness = TestHarness::with_project("demo");
    let outside = TempDir::new().unwrap();
    let outside_file = outside.path().join("secret.txt");
    fs::write(&outside_file, "s").unwrap();

    commands::add_selection(
        serde_json::json!({ "path": outside_file, "filters": [] }),
        harness.proxy.clone(),
        harness.state.clone(),
    );

    assert!(harness
        .proxy
        .notices()
        .iter()
        .any(|n| n.contains("inside the project root")));
    let state = harness.state.lock().unwrap();
    assert!(state.active.as_ref().unwrap().selections.is_empty());
}

#[test]
fn missing_selection_produces_warning_not_failure() {
    let harness = TestHarness::with_project("demo");
    harness.create_file("keep.py", "k");
    harness.add_selection("keep.py", &[]);
    harness.add_selection("gone.py", &[]);
    // The second add is rejected outright; simulate a file deleted later.
    harness.create_file("later.py", "l");
    harness.add_selection("later.py", &[]);
    fs::remove_file(harness.root_path.join("later.py")).unwrap();

    harness.drop_context();

    let content = harness.context_file();
    assert!(content.contains("----- Warning: Selected path not found: later.py -----"));
    assert!(content.contains("----- File: keep.py -----"));
}

#[test]
fn delete_project_removes_it_and_clears_active_state() {
    let harness = TestHarness::with_project("demo");
    harness.create_file("a.py", "a");
    harness.add_selection("a.py", &[]);
    let project_id = harness.active_project_id();

    commands::delete_project(
        serde_json::json!({ "projectId": project_id }),
        harness.proxy.clone(),
        harness.state.clone(),
    );

    let state = harness.state.lock().unwrap();
    assert!(state.active.is_none());
    assert!(state.store.projects().unwrap().is_empty());
    assert!(state.store.project(project_id).unwrap().is_none());
}

#[test]
fn duplicate_project_name_is_a_notice_not_an_error() {
    let harness = TestHarness::with_project("demo");
    let dialog = MockDialogService {
        project_root: Some(harness.root_path.clone()),
    };

    commands::create_project(
        serde_json::json!({ "name": "demo" }),
        &dialog,
        harness.proxy.clone(),
        harness.state.clone(),
    );

    assert!(harness
        .proxy
        .notices()
        .iter()
        .any(|n| n.contains("already exists")));
    assert_eq!(harness.state.lock().unwrap().store.projects().unwrap().len(), 1);
}

#[test]
fn hover_mode_roundtrip_is_persisted() {
    let harness = TestHarness::with_project("demo");

    commands::collapse_to_hover(harness.proxy.clone(), harness.state.clone());
    {
        let state = harness.state.lock().unwrap();
        assert_eq!(state.hover.mode(), UiMode::Hover);
        assert_eq!(
            state.store.setting("last_ui_mode").unwrap().as_deref(),
            Some("hover")
        );
    }

    commands::expand_from_hover(harness.proxy.clone(), harness.state.clone());
    let state = harness.state.lock().unwrap();
    assert_eq!(state.hover.mode(), UiMode::Full);
    assert_eq!(
        state.store.setting("last_ui_mode").unwrap().as_deref(),
        Some("full")
    );
}

#[test]
fn ipc_dispatch_routes_commands_end_to_end() {
    let harness = TestHarness::with_project("demo");
    harness.create_file("main.py", "print()");

    let dialog: Arc<dyn DialogService> = Arc::new(MockDialogService { project_root: None });
    let clipboard: Arc<dyn ClipboardService> = Arc::new(MockClipboard::new());

    let message = serde_json::json!({
        "command": "addSelection",
        "payload": { "path": harness.root_path.join("main.py"), "filters": [] },
    })
    .to_string();
    handle_ipc_message(
        message,
        dialog.clone(),
        clipboard.clone(),
        harness.proxy.clone(),
        harness.state.clone(),
    );
    assert_eq!(
        harness.state.lock().unwrap().active.as_ref().unwrap().selections.len(),
        1
    );

    handle_ipc_message(
        serde_json::json!({ "command": "dropContext", "payload": {} }).to_string(),
        dialog,
        clipboard,
        harness.proxy.clone(),
        harness.state.clone(),
    );
    assert!(harness.context_file().contains("----- File: main.py -----"));
}

#[test]
fn export_never_includes_the_context_file_itself() {
    let harness = TestHarness::with_project("demo");
    harness.create_file("a.txt", "a");
    harness.add_selection(".", &["txt"]);

    harness.drop_context();
    harness.drop_context();

    let content = harness.context_file();
    assert!(content.contains("----- File: a.txt -----"));
    assert!(!content.contains("----- File: context.txt -----"));
}
