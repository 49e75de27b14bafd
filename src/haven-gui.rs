//! Haven Desktop Client GUI Shell
//!
//! Thin egui front end over the lifecycle coordinator. The shell owns no
//! lifecycle logic of its own: every menu action goes through the
//! [`AppViewDelegate`] contract, and every modal surface (errors, sheets,
//! the quit confirmation, preferences) is rendered from coordinator state
//! each frame.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::sync::Arc;

use eframe::egui;
use serde::Deserialize;

use rhaven::{
    Anchor, AppContext, AppCoordinator, AppViewDelegate, BundleResources, NoopApiClient,
    QuitState, RepaintHandle, SessionState, Settings, SheetDisposer, SheetSize, SupportPaths,
    SystemShell, Terminator, UserResponse, ViewDescriptor,
};

const CONFIRM_QUIT_KEY: &str = "confirm_quit";

/// Main application entry point that wires the coordinator and launches the
/// Haven GUI shell.
fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 620.0])
            .with_title("Haven"),
        ..Default::default()
    };

    eframe::run_native(
        "Haven",
        options,
        Box::new(move |cc| Ok(Box::new(HavenApp::new(cc)))),
    )
}

/// Terminator that closes the native viewport instead of killing the
/// process, so eframe gets to run its save/shutdown path.
struct ViewportTerminator {
    ctx: egui::Context,
}

impl Terminator for ViewportTerminator {
    fn terminate(&self) {
        self.ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        self.ctx.request_repaint();
    }
}

/// Wakes the UI loop when background work (logout, URL dispatch) completes.
struct EguiRepaint {
    ctx: egui::Context,
}

impl RepaintHandle for EguiRepaint {
    fn request_repaint(&self) {
        self.ctx.request_repaint();
    }
}

/// Bundled preference defaults, read from `resources/preferences.json`.
#[derive(Deserialize)]
struct PreferenceDefaults {
    confirm_on_quit: bool,
}

/// The Haven GUI shell.
struct HavenApp {
    coordinator: Arc<AppCoordinator>,
    /// Whether the quit menu action asks for confirmation first.
    confirm_quit: bool,
    /// URL entry field in the demo panel.
    url_input: String,
}

impl HavenApp {
    fn new(cc: &eframe::CreationContext) -> Self {
        let support_paths = SupportPaths::for_application("Haven")
            .unwrap_or_else(|| SupportPaths::with_root(std::env::temp_dir().join("Haven")));
        let bundle = bundle_resources();

        let confirm_quit = Settings::try_load(cc.storage, CONFIRM_QUIT_KEY)
            .or_else(|| bundled_confirm_default(&bundle))
            .unwrap_or(true);

        let context = AppContext::new(Arc::new(NoopApiClient), support_paths, bundle);
        let coordinator = Arc::new(
            AppCoordinator::new(
                context,
                Arc::new(SystemShell),
                Box::new(ViewportTerminator {
                    ctx: cc.egui_ctx.clone(),
                }),
            )
            .with_repaint(Arc::new(EguiRepaint {
                ctx: cc.egui_ctx.clone(),
            })),
        );
        AppCoordinator::install(Arc::clone(&coordinator));

        Self {
            coordinator,
            confirm_quit,
            url_input: String::new(),
        }
    }

    fn main_anchor(&self) -> Anchor {
        self.coordinator.main_view()
    }

    /// Routes the native window close button through the quit flow, so
    /// closing the window honors the confirmation preference.
    fn intercept_window_close(&mut self, ctx: &egui::Context) {
        let close_requested = ctx.input(|input| input.viewport().close_requested());
        if close_requested && self.coordinator.quit_state() != QuitState::Terminating {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            if self.confirm_quit {
                self.coordinator.quit_requested(self.main_anchor());
            } else {
                self.coordinator
                    .quit_with_confirmation(false, self.main_anchor());
            }
        }
    }

    fn show_menu_bar(&mut self, ctx: &egui::Context) {
        let anchor = self.main_anchor();
        egui::TopBottomPanel::top("haven_menu").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Preferences").clicked() {
                    self.coordinator.preferences_requested(anchor);
                }

                let logged_in = self.coordinator.session_state() == SessionState::LoggedIn;
                if ui
                    .add_enabled(logged_in, egui::Button::new("Log Out"))
                    .clicked()
                {
                    self.coordinator.logout_requested(anchor);
                }

                if ui.button("Quit").clicked() {
                    if self.confirm_quit {
                        self.coordinator.quit_requested(anchor);
                    } else {
                        self.coordinator.quit_with_confirmation(false, anchor);
                    }
                }

                ui.separator();

                ui.label("URL:");
                ui.text_edit_singleline(&mut self.url_input);
                if ui.button("Open").clicked() && !self.url_input.is_empty() {
                    self.coordinator.url_open_requested(&self.url_input, anchor);
                }
            });
        });
    }

    fn show_main_panel(&mut self, ctx: &egui::Context) {
        let anchor = self.main_anchor();
        egui::CentralPanel::default().show(ctx, |ui| {
            match self.coordinator.session_state() {
                SessionState::LoggedIn => {
                    ui.heading("Haven");
                    ui.label("Connected.");
                }
                SessionState::LoggedOut => {
                    ui.heading("Logged out");
                    ui.label("Sign in again to continue.");
                }
            }

            ui.separator();
            if ui.button("Invite a device...").clicked() {
                // Rejected (and presented) if a sheet is already up here.
                let _ = self.coordinator.sheet_open_requested(
                    ViewDescriptor::new("Invite a device"),
                    SheetSize::new(420.0, 260.0),
                    anchor,
                    true,
                );
            }
        });
    }

    fn show_quit_prompt(&mut self, ctx: &egui::Context) {
        if self.coordinator.quit_prompt().is_none() {
            return;
        }
        egui::Window::new("Quit Haven?")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Are you sure you want to quit?");
                ui.horizontal(|ui| {
                    if ui.button("Quit").clicked() {
                        self.coordinator
                            .quit_confirm_response(UserResponse::Affirmative);
                    }
                    if ui.button("Cancel").clicked() {
                        self.coordinator
                            .quit_confirm_response(UserResponse::Negative);
                    }
                });
            });
    }

    fn show_errors(&mut self, ctx: &egui::Context) {
        for (anchor, message) in self.coordinator.visible_errors() {
            egui::Window::new("Error")
                .id(egui::Id::new(("error", anchor)))
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&message);
                    if ui.button("OK").clicked() {
                        self.coordinator
                            .dismiss_error(anchor, UserResponse::Affirmative);
                    }
                });
        }
    }

    fn show_sheets(&mut self, ctx: &egui::Context) {
        // Snapshot first; windows are created outside the coordinator lock.
        let mut sheets: Vec<(Anchor, String, SheetSize, Option<SheetDisposer>)> = Vec::new();
        self.coordinator.for_each_sheet(|session| {
            let close = session.has_close_control().then(|| session.disposer());
            sheets.push((
                session.anchor(),
                session.descriptor().title.clone(),
                session.size(),
                close,
            ));
        });

        for (anchor, title, size, close) in sheets {
            egui::Window::new(title)
                .id(egui::Id::new(("sheet", anchor)))
                .collapsible(false)
                .fixed_size([size.width, size.height])
                .show(ctx, |ui| {
                    ui.label("(sheet content)");
                    if let Some(disposer) = close {
                        if ui.button("Close").clicked() {
                            disposer.dispose();
                        }
                    }
                });
        }
    }

    fn show_preferences(&mut self, ctx: &egui::Context) {
        if self.coordinator.preferences_surface().is_none() {
            return;
        }
        egui::Window::new("Preferences")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.checkbox(&mut self.confirm_quit, "Confirm before quitting");
                if ui.button("Close").clicked() {
                    self.coordinator.preferences_closed();
                }
            });
    }
}

impl eframe::App for HavenApp {
    /// Called when the app is shutting down - persists preferences.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        Settings::save(storage, CONFIRM_QUIT_KEY, &self.confirm_quit);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Drain background completions and prune disposed sheets first, so
        // this frame renders current state.
        self.coordinator.poll();

        self.intercept_window_close(ctx);
        self.show_menu_bar(ctx);
        self.show_main_panel(ctx);
        self.show_sheets(ctx);
        self.show_preferences(ctx);
        self.show_quit_prompt(ctx);
        // Errors render last so they sit on top of whatever failed.
        self.show_errors(ctx);
    }
}

/// Resources next to the executable, falling back to the source tree when
/// running through cargo.
fn bundle_resources() -> BundleResources {
    if let Ok(bundle) = BundleResources::for_executable() {
        if bundle.root().is_dir() {
            return bundle;
        }
    }
    BundleResources::with_root(concat!(env!("CARGO_MANIFEST_DIR"), "/resources"))
}

fn bundled_confirm_default(bundle: &BundleResources) -> Option<bool> {
    let path = bundle.file("preferences.json").ok()?;
    let json = std::fs::read_to_string(path).ok()?;
    let defaults: PreferenceDefaults = serde_json::from_str(&json).ok()?;
    Some(defaults.confirm_on_quit)
}
