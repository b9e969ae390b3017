#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::sync::{Arc, Mutex};

use tao::{
    event::{Event, StartCause, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder},
    window::WindowBuilder,
};
use wry::WebViewBuilder;

use context_dropper::app;
use context_dropper::app::file_dialog::NativeDialogService;
use context_dropper::app::hover::UiMode;
use context_dropper::config::{self, AppConfig};
use context_dropper::core::SystemClipboard;
use context_dropper::store::ProjectStore;

const HOVER_SIZE: f64 = 72.0;

fn main() {
    tracing_subscriber::fmt::init();

    let initial_config = AppConfig::load().unwrap_or_default();

    let db_path = config::settings::database_path(&initial_config)
        .expect("Failed to resolve database location");
    let store = ProjectStore::open(&db_path).expect("Failed to open project database");

    let state = app::state::AppState::new(initial_config.clone(), store)
        .expect("Failed to initialize application state");
    let initial_mode = state.hover.mode();
    let state = Arc::new(Mutex::new(state));

    let event_loop = EventLoopBuilder::<app::events::UserEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let (width, height) = initial_config.window_size;
    let (pos_x, pos_y) = initial_config.window_position;

    let main_window = WindowBuilder::new()
        .with_title("Context Dropper")
        .with_inner_size(tao::dpi::LogicalSize::new(width, height))
        .with_position(tao::dpi::LogicalPosition::new(pos_x, pos_y))
        .with_min_inner_size(tao::dpi::LogicalSize::new(900, 600))
        .with_visible(initial_mode == UiMode::Full)
        .build(&event_loop)
        .expect("Failed to build main window");
    let main_window = Arc::new(main_window);

    let (hover_x, hover_y) = initial_config.hover_position.unwrap_or((pos_x, pos_y));
    let hover_window = WindowBuilder::new()
        .with_title("Context Dropper")
        .with_inner_size(tao::dpi::LogicalSize::new(HOVER_SIZE, HOVER_SIZE))
        .with_position(tao::dpi::LogicalPosition::new(hover_x, hover_y))
        .with_decorations(false)
        .with_always_on_top(true)
        .with_resizable(false)
        .with_visible(initial_mode == UiMode::Hover)
        .build(&event_loop)
        .expect("Failed to build hover window");
    let hover_window = Arc::new(hover_window);

    let dialog_service: Arc<dyn app::file_dialog::DialogService> = Arc::new(NativeDialogService);
    let clipboard_service: Arc<dyn context_dropper::core::ClipboardService> =
        Arc::new(SystemClipboard);

    // Both webviews share one IPC handler; the hover icon speaks the same
    // command protocol as the main UI.
    let make_ipc_handler = |state: Arc<Mutex<app::state::AppState>>,
                            proxy: tao::event_loop::EventLoopProxy<app::events::UserEvent>,
                            dialog: Arc<dyn app::file_dialog::DialogService>,
                            clipboard: Arc<dyn context_dropper::core::ClipboardService>| {
        move |message: String| {
            app::handle_ipc_message(
                message,
                dialog.clone(),
                clipboard.clone(),
                proxy.clone(),
                state.clone(),
            );
        }
    };

    let drop_handler_state = state.clone();
    let drop_handler_proxy = proxy.clone();
    let file_drop_handler = move |event| {
        use wry::FileDropEvent;
        if let FileDropEvent::Dropped { paths, .. } = event {
            for path in paths {
                app::commands::add_selection(
                    serde_json::json!({ "path": path, "filters": [] }),
                    drop_handler_proxy.clone(),
                    drop_handler_state.clone(),
                );
            }
        }
        true
    };

    let main_webview = WebViewBuilder::new(&*main_window)
        .with_html(include_str!("ui/index.html"))
        .with_ipc_handler(make_ipc_handler(
            state.clone(),
            proxy.clone(),
            dialog_service.clone(),
            clipboard_service.clone(),
        ))
        .with_file_drop_handler(file_drop_handler)
        .build()
        .expect("Failed to build main webview");

    let _hover_webview = WebViewBuilder::new(&*hover_window)
        .with_html(include_str!("ui/hover.html"))
        .with_ipc_handler(make_ipc_handler(
            state.clone(),
            proxy.clone(),
            dialog_service,
            clipboard_service,
        ))
        .build()
        .expect("Failed to build hover webview");

    let state_for_events = state;
    let main_for_events = main_window.clone();
    let hover_for_events = hover_window.clone();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::NewEvents(StartCause::Init) => {
                tracing::info!("Application initialized.");
            }
            Event::WindowEvent {
                event, window_id, ..
            } => {
                let is_main = window_id == main_for_events.id();
                match event {
                    WindowEvent::CloseRequested => {
                        tracing::info!("Close requested. Saving final window state...");
                        let mut state_guard = state_for_events.lock().unwrap();
                        if is_main {
                            let size = main_for_events.inner_size();
                            let position =
                                main_for_events.outer_position().unwrap_or_default();
                            state_guard.config.window_size =
                                (size.width.into(), size.height.into());
                            state_guard.config.window_position =
                                (position.x.into(), position.y.into());
                        }
                        if let Err(e) = config::settings::save_config(&state_guard.config, None)
                        {
                            tracing::error!("Failed to save config on exit: {}", e);
                        }
                        *control_flow = ControlFlow::Exit;
                    }
                    WindowEvent::Resized(size) if is_main => {
                        let mut state_guard = state_for_events.lock().unwrap();
                        state_guard.config.window_size = (size.width.into(), size.height.into());
                    }
                    WindowEvent::Moved(position) => {
                        let mut state_guard = state_for_events.lock().unwrap();
                        if is_main {
                            state_guard.config.window_position =
                                (position.x.into(), position.y.into());
                        } else {
                            state_guard.config.hover_position =
                                Some((position.x.into(), position.y.into()));
                        }
                    }
                    _ => (),
                }
            }
            Event::UserEvent(user_event) => {
                if let app::events::UserEvent::UiModeChanged(mode) = &user_event {
                    match mode {
                        UiMode::Hover => {
                            main_for_events.set_visible(false);
                            hover_for_events.set_visible(true);
                        }
                        UiMode::Full => {
                            hover_for_events.set_visible(false);
                            main_for_events.set_visible(true);
                            main_for_events.set_focus();
                        }
                    }
                }
                app::handle_user_event(user_event, &main_webview);
            }
            _ => (),
        }
    });
}
