//! Application lifecycle coordination.
//!
//! [`AppCoordinator`] is the process-wide object that mediates quitting,
//! logout, preferences, outbound URLs, error presentation and modal sheets.
//! All presentation state lives behind one mutex owned by the UI context;
//! background work (logout, URL dispatch) runs on plain threads and marshals
//! its completion back through a channel drained by [`AppCoordinator::poll`]
//! once per frame.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::app::AppContext;
use crate::errors::CoordinatorError;
use crate::platform::{parse_url, Shell};
use crate::ui::{
    Anchor, ErrorEvent, ErrorPresenter, SheetController, SheetDisposer, SheetSession, SheetSize,
    UserResponse, ViewDescriptor, ViewHandle,
};

/// Bundled descriptor backing the preferences surface.
const PREFERENCES_DESCRIPTOR: &str = "preferences.json";

/// Ends the process once the coordinator reaches `Terminating`.
pub trait Terminator: Send + Sync {
    fn terminate(&self);
}

/// Terminator that exits the process.
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self) {
        std::process::exit(0);
    }
}

/// Wakes the UI loop after background work completes off-thread.
pub trait RepaintHandle: Send + Sync {
    fn request_repaint(&self);
}

struct NoopRepaint;

impl RepaintHandle for NoopRepaint {
    fn request_repaint(&self) {}
}

/// Quit flow state. `Confirming` covers idle as well as prompt-pending;
/// `Terminating` is entered exactly once and never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitState {
    Confirming,
    Terminating,
}

/// Session status as seen by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    LoggedIn,
    LoggedOut,
}

/// Capability contract the main view drives.
///
/// The UI layer holds the coordinator behind this trait rather than its
/// concrete type, so a test double can stand in for the whole lifecycle
/// machinery.
pub trait AppViewDelegate: Send + Sync {
    /// Opens the preferences surface.
    fn preferences_requested(&self, source: Anchor);

    /// Starts the quit flow with a confirmation prompt.
    fn quit_requested(&self, source: Anchor);

    /// Tears down the session via the API client, off the UI thread.
    fn logout_requested(&self, source: Anchor);

    /// Opens `url` in the default external handler. Parse and dispatch
    /// failures surface through the error presenter, never to the caller.
    fn url_open_requested(&self, url: &str, source: Anchor);

    /// Routes a failure through the error presenter.
    fn error_reported(&self, event: ErrorEvent);

    /// Opens a modal sheet on `source`. Returns None, with the failure
    /// presented, when the anchor already hosts a sheet.
    fn sheet_open_requested(
        &self,
        descriptor: ViewDescriptor,
        size: SheetSize,
        source: Anchor,
        with_close_control: bool,
    ) -> Option<SheetDisposer>;
}

/// Result of background work, marshalled back onto the UI context.
enum BackgroundEvent {
    LogoutFinished {
        result: anyhow::Result<()>,
        anchor: Anchor,
    },
    ShellDispatchFailed {
        url: String,
        source: std::io::Error,
        anchor: Anchor,
    },
}

/// Presentation and flow state owned by the UI context.
struct CoordinatorInner {
    quit_state: QuitState,
    /// Anchor of the pending quit confirmation surface, if one is up.
    pending_quit: Option<Anchor>,
    presenter: ErrorPresenter,
    sheets: SheetController,
    session: SessionState,
    /// Resolved descriptor path while the preferences surface is open.
    preferences: Option<std::path::PathBuf>,
    logout_in_flight: bool,
}

/// The process-wide lifecycle coordinator.
pub struct AppCoordinator {
    context: AppContext,
    shell: Arc<dyn Shell>,
    terminator: Box<dyn Terminator>,
    repaint: Arc<dyn RepaintHandle>,
    events_tx: Sender<BackgroundEvent>,
    events_rx: Mutex<Receiver<BackgroundEvent>>,
    inner: Mutex<CoordinatorInner>,
}

static SHARED: OnceCell<Arc<AppCoordinator>> = OnceCell::new();

impl AppCoordinator {
    pub fn new(context: AppContext, shell: Arc<dyn Shell>, terminator: Box<dyn Terminator>) -> Self {
        let (events_tx, events_rx) = channel();
        let presenter = ErrorPresenter::new(context.main_view());
        Self {
            context,
            shell,
            terminator,
            repaint: Arc::new(NoopRepaint),
            events_tx,
            events_rx: Mutex::new(events_rx),
            inner: Mutex::new(CoordinatorInner {
                quit_state: QuitState::Confirming,
                pending_quit: None,
                presenter,
                sheets: SheetController::new(),
                session: SessionState::LoggedIn,
                preferences: None,
                logout_in_flight: false,
            }),
        }
    }

    /// Attaches the handle used to wake the UI after background work.
    pub fn with_repaint(mut self, repaint: Arc<dyn RepaintHandle>) -> Self {
        self.repaint = repaint;
        self
    }

    // ===== Process-wide instance =====

    /// Registers `coordinator` as the process-wide instance. The instance is
    /// write-once; a second call is a programming error and panics.
    pub fn install(coordinator: Arc<Self>) {
        if SHARED.set(coordinator).is_err() {
            panic!("AppCoordinator::install called twice");
        }
        info!("coordinator installed");
    }

    /// The process-wide instance. Panics if called before [`install`],
    /// i.e. before application launch finished wiring the context.
    pub fn shared() -> Arc<Self> {
        Arc::clone(
            SHARED
                .get()
                .expect("AppCoordinator::shared called before install"),
        )
    }

    pub fn is_installed() -> bool {
        SHARED.get().is_some()
    }

    // ===== Context access =====

    /// Root UI surface, the default anchor for sheets and errors.
    pub fn main_view(&self) -> ViewHandle {
        self.context.main_view()
    }

    pub fn context(&self) -> &AppContext {
        &self.context
    }

    // ===== Quit flow =====

    /// Drives the two-state quit machine.
    ///
    /// Without a prompt this transitions straight to `Terminating`:
    /// force-closes every sheet, tears down pending presentations, and hands
    /// control to the terminator. With a prompt it registers a confirmation
    /// surface anchored at `source` and returns; the response arrives later
    /// through [`quit_confirm_response`](Self::quit_confirm_response).
    /// Requests made while already `Terminating` are no-ops.
    pub fn quit_with_confirmation(&self, prompt: bool, source: Anchor) {
        let torn_down = {
            let mut inner = self.inner.lock().unwrap();
            if inner.quit_state == QuitState::Terminating {
                debug!("quit requested while already terminating");
                return;
            }
            if prompt {
                if inner.pending_quit.is_none() {
                    debug!(?source, "quit confirmation pending");
                    inner.pending_quit = Some(source);
                }
                return;
            }
            inner.quit_state = QuitState::Terminating;
            inner.pending_quit = None;
            inner.sheets.close_all();
            inner.presenter.dismiss_all()
        };

        for presentation in torn_down {
            presentation.finish(UserResponse::Dismissed);
        }
        info!("terminating");
        self.terminator.terminate();
    }

    /// Feeds the user's answer to the pending quit confirmation back in.
    /// Affirmative terminates; anything else leaves the process running.
    /// A no-op when no confirmation is pending.
    pub fn quit_confirm_response(&self, response: UserResponse) {
        let anchor = { self.inner.lock().unwrap().pending_quit.take() };
        let Some(anchor) = anchor else {
            return;
        };
        if response == UserResponse::Affirmative {
            self.quit_with_confirmation(false, anchor);
        } else {
            debug!("quit declined");
        }
    }

    /// Anchor of the pending quit confirmation surface, if one is up.
    pub fn quit_prompt(&self) -> Option<Anchor> {
        self.inner.lock().unwrap().pending_quit
    }

    pub fn quit_state(&self) -> QuitState {
        self.inner.lock().unwrap().quit_state
    }

    // ===== Session =====

    pub fn session_state(&self) -> SessionState {
        self.inner.lock().unwrap().session
    }

    fn begin_logout(&self, source: Anchor) {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.logout_in_flight {
                debug!("logout already in flight");
                return;
            }
            inner.logout_in_flight = true;
        }

        info!("logging out");
        let client = Arc::clone(self.context.api_client());
        let events = self.events_tx.clone();
        let repaint = Arc::clone(&self.repaint);
        thread::spawn(move || {
            let result = client.end_session();
            let _ = events.send(BackgroundEvent::LogoutFinished {
                result,
                anchor: source,
            });
            repaint.request_repaint();
        });
    }

    fn finish_logout(&self, result: anyhow::Result<()>, anchor: Anchor) {
        match result {
            Ok(()) => {
                let torn_down = {
                    let mut inner = self.inner.lock().unwrap();
                    inner.logout_in_flight = false;
                    inner.session = SessionState::LoggedOut;
                    // Surfaces tied to the old session are meaningless now.
                    inner.sheets.close_all();
                    inner.presenter.dismiss_all()
                };
                for presentation in torn_down {
                    presentation.finish(UserResponse::Dismissed);
                }
                info!("logged out");
            }
            Err(source) => {
                self.inner.lock().unwrap().logout_in_flight = false;
                warn!(error = %source, "session teardown failed");
                self.report_error(ErrorEvent::new(
                    CoordinatorError::SessionTeardownFailed {
                        source: source.into(),
                    },
                    Some(anchor),
                ));
            }
        }
    }

    // ===== Preferences =====

    fn open_preferences(&self, source: Anchor) {
        match self.context.bundle().file(PREFERENCES_DESCRIPTOR) {
            Ok(descriptor) => {
                info!(path = %descriptor.display(), "preferences opened");
                self.inner.lock().unwrap().preferences = Some(descriptor);
            }
            Err(error) => {
                warn!(%error, "could not construct preferences surface");
                self.report_error(ErrorEvent::new(error, Some(source)));
            }
        }
    }

    /// Resolved descriptor path while the preferences surface is open.
    pub fn preferences_surface(&self) -> Option<std::path::PathBuf> {
        self.inner.lock().unwrap().preferences.clone()
    }

    pub fn preferences_closed(&self) {
        self.inner.lock().unwrap().preferences = None;
    }

    // ===== URLs =====

    fn open_url_external(&self, url: &str, source: Anchor) {
        let parsed = match parse_url(url) {
            Ok(parsed) => parsed,
            Err(error) => {
                self.report_error(ErrorEvent::new(error, Some(source)));
                return;
            }
        };

        // The launcher may block; dispatch off the UI context and report
        // failure through the event channel.
        let shell = Arc::clone(&self.shell);
        let events = self.events_tx.clone();
        let repaint = Arc::clone(&self.repaint);
        thread::spawn(move || {
            if let Err(err) = shell.open_url(&parsed) {
                let _ = events.send(BackgroundEvent::ShellDispatchFailed {
                    url: parsed.to_string(),
                    source: err,
                    anchor: source,
                });
                repaint.request_repaint();
            }
        });
    }

    // ===== Error presentation =====

    /// Schedules `event` for display and returns immediately.
    pub fn report_error(&self, event: ErrorEvent) {
        self.inner.lock().unwrap().presenter.present(event);
        self.repaint.request_repaint();
    }

    /// Like [`report_error`](Self::report_error), with a completion invoked
    /// exactly once on the UI context after the user dismisses the surface.
    pub fn report_error_with(
        &self,
        event: ErrorEvent,
        completion: impl FnOnce(UserResponse) + Send + 'static,
    ) {
        self.inner
            .lock()
            .unwrap()
            .presenter
            .present_with(event, completion);
        self.repaint.request_repaint();
    }

    /// Dismisses the visible error on `anchor` with the user's response.
    /// Returns false if nothing was visible there.
    pub fn dismiss_error(&self, anchor: Anchor, response: UserResponse) -> bool {
        let dismissed = { self.inner.lock().unwrap().presenter.dismiss(anchor) };
        match dismissed {
            Some(presentation) => {
                presentation.finish(response);
                true
            }
            None => false,
        }
    }

    /// Anchor and message of every currently visible error, for rendering.
    pub fn visible_errors(&self) -> Vec<(Anchor, String)> {
        let inner = self.inner.lock().unwrap();
        inner
            .presenter
            .visible_anchors()
            .into_iter()
            .filter_map(|anchor| {
                inner
                    .presenter
                    .visible(anchor)
                    .map(|event| (anchor, event.message.clone()))
            })
            .collect()
    }

    pub fn queued_error_count(&self, anchor: Anchor) -> usize {
        self.inner.lock().unwrap().presenter.queued_len(anchor)
    }

    // ===== Sheets =====

    /// Opens a modal sheet, rejecting the request if `source` already hosts
    /// one. The strict `Result` flavor of the delegate operation.
    pub fn open_sheet(
        &self,
        descriptor: ViewDescriptor,
        size: SheetSize,
        source: Anchor,
        with_close_control: bool,
    ) -> Result<SheetDisposer, CoordinatorError> {
        self.inner
            .lock()
            .unwrap()
            .sheets
            .open(descriptor, size, source, with_close_control)
    }

    pub fn is_sheet_open(&self, anchor: Anchor) -> bool {
        self.inner.lock().unwrap().sheets.is_open(anchor)
    }

    pub fn open_sheet_count(&self) -> usize {
        self.inner.lock().unwrap().sheets.open_count()
    }

    /// Calls `f` for every open sheet. Rendering hook for the UI loop; `f`
    /// must not call back into the coordinator (disposers are fine, they
    /// do not take the coordinator lock).
    pub fn for_each_sheet(&self, f: impl FnMut(&SheetSession)) {
        self.inner.lock().unwrap().sheets.for_each(f);
    }

    // ===== Frame pump =====

    /// Drains background completions onto the UI context and removes sheets
    /// whose disposer fired. Call once per frame.
    pub fn poll(&self) {
        let events: Vec<BackgroundEvent> =
            { self.events_rx.lock().unwrap().try_iter().collect() };
        for event in events {
            match event {
                BackgroundEvent::LogoutFinished { result, anchor } => {
                    self.finish_logout(result, anchor);
                }
                BackgroundEvent::ShellDispatchFailed {
                    url,
                    source,
                    anchor,
                } => {
                    warn!(%url, error = %source, "shell launch failed");
                    self.report_error(ErrorEvent::new(
                        CoordinatorError::ShellLaunchFailed { url, source },
                        Some(anchor),
                    ));
                }
            }
        }

        self.inner.lock().unwrap().sheets.prune();
    }
}

impl AppViewDelegate for AppCoordinator {
    fn preferences_requested(&self, source: Anchor) {
        self.open_preferences(source);
    }

    fn quit_requested(&self, source: Anchor) {
        self.quit_with_confirmation(true, source);
    }

    fn logout_requested(&self, source: Anchor) {
        self.begin_logout(source);
    }

    fn url_open_requested(&self, url: &str, source: Anchor) {
        self.open_url_external(url, source);
    }

    fn error_reported(&self, event: ErrorEvent) {
        self.report_error(event);
    }

    fn sheet_open_requested(
        &self,
        descriptor: ViewDescriptor,
        size: SheetSize,
        source: Anchor,
        with_close_control: bool,
    ) -> Option<SheetDisposer> {
        match self.open_sheet(descriptor, size, source, with_close_control) {
            Ok(disposer) => Some(disposer),
            Err(error) => {
                self.report_error(ErrorEvent::new(error, Some(source)));
                None
            }
        }
    }
}
