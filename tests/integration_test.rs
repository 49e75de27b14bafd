//! End-to-end tests for the lifecycle coordinator protocol: singleton
//! identity, the quit state machine, error queueing, sheet lifecycle, and
//! path resolution.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tempfile::TempDir;
use url::Url;

use rhaven::{
    Anchor, ApiClient, AppContext, AppCoordinator, AppViewDelegate, BundleResources,
    CoordinatorError, ErrorEvent, QuitState, SessionState, Shell, SheetSize, SupportPaths,
    Terminator, UserResponse, ViewDescriptor,
};

// ===== Test doubles =====

struct MockApiClient {
    fail_logout: bool,
}

impl ApiClient for MockApiClient {
    fn end_session(&self) -> anyhow::Result<()> {
        if self.fail_logout {
            Err(anyhow!("server unreachable"))
        } else {
            Ok(())
        }
    }
}

struct RecordingShell {
    opened: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingShell {
    fn new(fail: bool) -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            fail,
        }
    }
}

impl Shell for RecordingShell {
    fn open_url(&self, url: &Url) -> io::Result<()> {
        if self.fail {
            return Err(io::Error::new(io::ErrorKind::Other, "no handler"));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

struct RecordingTerminator(Arc<AtomicUsize>);

impl Terminator for RecordingTerminator {
    fn terminate(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct Harness {
    coordinator: Arc<AppCoordinator>,
    shell: Arc<RecordingShell>,
    quits: Arc<AtomicUsize>,
    _dirs: TempDir,
}

fn harness(fail_logout: bool, fail_shell: bool) -> Harness {
    let dirs = TempDir::new().unwrap();
    let shell = Arc::new(RecordingShell::new(fail_shell));
    let quits = Arc::new(AtomicUsize::new(0));

    let context = AppContext::new(
        Arc::new(MockApiClient { fail_logout }),
        SupportPaths::with_root(dirs.path().join("support")),
        BundleResources::with_root(dirs.path().join("resources")),
    );
    let coordinator = Arc::new(AppCoordinator::new(
        context,
        Arc::clone(&shell) as Arc<dyn Shell>,
        Box::new(RecordingTerminator(Arc::clone(&quits))),
    ));

    Harness {
        coordinator,
        shell,
        quits,
        _dirs: dirs,
    }
}

/// Pumps the coordinator until `condition` holds or a timeout elapses.
/// Background completions only become visible through `poll`.
fn pump_until(coordinator: &AppCoordinator, mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        coordinator.poll();
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

fn resource_not_found(name: &str, anchor: Anchor) -> ErrorEvent {
    ErrorEvent::new(
        CoordinatorError::ResourceNotFound {
            name: name.to_string(),
        },
        Some(anchor),
    )
}

// ===== Singleton =====

#[test]
fn test_shared_instance_keeps_identity() {
    let h = harness(false, false);
    AppCoordinator::install(Arc::clone(&h.coordinator));

    let first = AppCoordinator::shared();
    let second = AppCoordinator::shared();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &h.coordinator));
    assert_eq!(first.main_view(), second.main_view());
    assert!(AppCoordinator::is_installed());
}

// ===== Quit flow =====

#[test]
fn test_immediate_quit_is_idempotent() {
    let h = harness(false, false);
    let main = h.coordinator.main_view();

    h.coordinator.quit_with_confirmation(false, main);
    h.coordinator.quit_with_confirmation(false, main);

    assert_eq!(h.quits.load(Ordering::SeqCst), 1);
    assert_eq!(h.coordinator.quit_state(), QuitState::Terminating);

    // A prompted request after termination started is a no-op too.
    h.coordinator.quit_requested(main);
    assert!(h.coordinator.quit_prompt().is_none());
}

#[test]
fn test_declining_quit_confirmation_returns_control() {
    let h = harness(false, false);
    let main = h.coordinator.main_view();

    h.coordinator.quit_requested(main);
    assert_eq!(h.coordinator.quit_prompt(), Some(main));

    h.coordinator.quit_confirm_response(UserResponse::Negative);
    assert_eq!(h.quits.load(Ordering::SeqCst), 0);
    assert_eq!(h.coordinator.quit_state(), QuitState::Confirming);

    // The flow can be restarted and confirmed afterwards.
    h.coordinator.quit_requested(main);
    h.coordinator.quit_confirm_response(UserResponse::Affirmative);
    assert_eq!(h.quits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_termination_tears_down_open_surfaces() {
    let h = harness(false, false);
    let main = h.coordinator.main_view();
    let responses = Arc::new(Mutex::new(Vec::new()));

    h.coordinator
        .open_sheet(
            ViewDescriptor::new("invite"),
            SheetSize::new(300.0, 200.0),
            Anchor::new(),
            false,
        )
        .unwrap();

    let sink = Arc::clone(&responses);
    h.coordinator
        .report_error_with(resource_not_found("icon.png", main), move |response| {
            sink.lock().unwrap().push(response);
        });

    h.coordinator.quit_with_confirmation(false, main);

    assert_eq!(h.coordinator.open_sheet_count(), 0);
    assert!(h.coordinator.visible_errors().is_empty());
    // The pending completion fired exactly once, as Dismissed.
    assert_eq!(
        responses.lock().unwrap().as_slice(),
        &[UserResponse::Dismissed]
    );
}

// ===== Error presentation =====

#[test]
fn test_errors_on_one_anchor_display_in_order() {
    let h = harness(false, false);
    let anchor = Anchor::new();

    h.coordinator
        .report_error(ErrorEvent::with_message(
            CoordinatorError::ResourceNotFound {
                name: "a".to_string(),
            },
            "first failure",
            Some(anchor),
        ));
    h.coordinator
        .report_error(ErrorEvent::with_message(
            CoordinatorError::ResourceNotFound {
                name: "b".to_string(),
            },
            "second failure",
            Some(anchor),
        ));

    let visible = h.coordinator.visible_errors();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].1, "first failure");
    assert_eq!(h.coordinator.queued_error_count(anchor), 1);

    assert!(h.coordinator.dismiss_error(anchor, UserResponse::Affirmative));
    let visible = h.coordinator.visible_errors();
    assert_eq!(visible[0].1, "second failure");

    assert!(h.coordinator.dismiss_error(anchor, UserResponse::Affirmative));
    assert!(h.coordinator.visible_errors().is_empty());
}

#[test]
fn test_errors_on_distinct_anchors_show_concurrently() {
    let h = harness(false, false);
    let a = Anchor::new();
    let b = Anchor::new();

    h.coordinator.report_error(resource_not_found("on-a", a));
    h.coordinator.report_error(resource_not_found("on-b", b));

    assert_eq!(h.coordinator.visible_errors().len(), 2);
    assert_eq!(h.coordinator.queued_error_count(a), 0);
    assert_eq!(h.coordinator.queued_error_count(b), 0);
}

#[test]
fn test_error_completion_fires_exactly_once() {
    let h = harness(false, false);
    let anchor = Anchor::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    h.coordinator
        .report_error_with(resource_not_found("boom", anchor), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    assert!(h.coordinator.dismiss_error(anchor, UserResponse::Negative));
    assert!(!h.coordinator.dismiss_error(anchor, UserResponse::Negative));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ===== URL handling =====

#[test]
fn test_invalid_url_is_presented_not_raised() {
    let h = harness(false, false);
    let anchor = Anchor::new();

    h.coordinator.url_open_requested("not a url", anchor);

    let visible = h.coordinator.visible_errors();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].0, anchor);
    assert!(visible[0].1.contains("not a valid URL"));
    assert!(h.shell.opened.lock().unwrap().is_empty());
}

#[test]
fn test_valid_url_reaches_the_shell() {
    let h = harness(false, false);

    h.coordinator
        .url_open_requested("https://example.com/docs", Anchor::new());

    assert!(pump_until(&h.coordinator, || {
        !h.shell.opened.lock().unwrap().is_empty()
    }));
    assert_eq!(
        h.shell.opened.lock().unwrap().as_slice(),
        &["https://example.com/docs".to_string()]
    );
    assert!(h.coordinator.visible_errors().is_empty());
}

#[test]
fn test_shell_launch_failure_is_presented() {
    let h = harness(false, true);
    let anchor = Anchor::new();

    h.coordinator
        .url_open_requested("https://example.com", anchor);

    assert!(pump_until(&h.coordinator, || {
        !h.coordinator.visible_errors().is_empty()
    }));
    let visible = h.coordinator.visible_errors();
    assert_eq!(visible[0].0, anchor);
    assert!(visible[0].1.contains("could not open"));
}

// ===== Sheets =====

#[test]
fn test_sheet_disposer_is_idempotent() {
    let h = harness(false, false);
    let anchor = Anchor::new();

    let disposer = h
        .coordinator
        .open_sheet(
            ViewDescriptor::new("invite"),
            SheetSize::new(420.0, 260.0),
            anchor,
            true,
        )
        .unwrap();
    assert!(h.coordinator.is_sheet_open(anchor));

    disposer.dispose();
    h.coordinator.poll();
    assert!(!h.coordinator.is_sheet_open(anchor));

    // Second dispose: same end state, no error.
    disposer.dispose();
    h.coordinator.poll();
    assert!(!h.coordinator.is_sheet_open(anchor));

    // The anchor is free again.
    assert!(h
        .coordinator
        .open_sheet(
            ViewDescriptor::new("again"),
            SheetSize::new(100.0, 100.0),
            anchor,
            false
        )
        .is_ok());
}

#[test]
fn test_second_sheet_on_same_anchor_is_rejected_and_presented() {
    let h = harness(false, false);
    let anchor = Anchor::new();

    let first = h.coordinator.sheet_open_requested(
        ViewDescriptor::new("first"),
        SheetSize::new(300.0, 200.0),
        anchor,
        false,
    );
    assert!(first.is_some());

    let second = h.coordinator.sheet_open_requested(
        ViewDescriptor::new("second"),
        SheetSize::new(300.0, 200.0),
        anchor,
        false,
    );
    assert!(second.is_none());

    // The rejection surfaced through the presenter, on the same anchor.
    let visible = h.coordinator.visible_errors();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].0, anchor);
    assert!(visible[0].1.contains("already open"));

    // A different anchor is unaffected.
    assert!(h
        .coordinator
        .sheet_open_requested(
            ViewDescriptor::new("elsewhere"),
            SheetSize::new(300.0, 200.0),
            Anchor::new(),
            false,
        )
        .is_some());
}

// ===== Logout =====

#[test]
fn test_successful_logout_closes_session_surfaces() {
    let h = harness(false, false);
    let main = h.coordinator.main_view();

    h.coordinator
        .open_sheet(
            ViewDescriptor::new("invite"),
            SheetSize::new(300.0, 200.0),
            Anchor::new(),
            false,
        )
        .unwrap();
    h.coordinator.report_error(resource_not_found("stale", main));

    h.coordinator.logout_requested(main);
    assert!(pump_until(&h.coordinator, || {
        h.coordinator.session_state() == SessionState::LoggedOut
    }));

    assert_eq!(h.coordinator.open_sheet_count(), 0);
    assert!(h.coordinator.visible_errors().is_empty());
    assert_eq!(h.quits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failed_logout_presents_error_and_keeps_session() {
    let h = harness(true, false);
    let main = h.coordinator.main_view();

    h.coordinator.logout_requested(main);
    assert!(pump_until(&h.coordinator, || {
        !h.coordinator.visible_errors().is_empty()
    }));

    let visible = h.coordinator.visible_errors();
    assert!(visible[0].1.contains("could not log out"));
    assert_eq!(h.coordinator.session_state(), SessionState::LoggedIn);
}

// ===== Preferences =====

#[test]
fn test_preferences_open_with_bundled_descriptor() {
    let h = harness(false, false);
    let resources = h._dirs.path().join("resources");
    std::fs::create_dir_all(&resources).unwrap();
    std::fs::write(
        resources.join("preferences.json"),
        "{\"confirm_on_quit\":true}",
    )
    .unwrap();

    h.coordinator.preferences_requested(h.coordinator.main_view());
    let surface = h.coordinator.preferences_surface().unwrap();
    assert_eq!(surface, resources.join("preferences.json"));

    h.coordinator.preferences_closed();
    assert!(h.coordinator.preferences_surface().is_none());
}

#[test]
fn test_preferences_failure_is_presented_not_silent() {
    // No resources directory at all in this harness.
    let h = harness(false, false);
    let main = h.coordinator.main_view();

    h.coordinator.preferences_requested(main);

    assert!(h.coordinator.preferences_surface().is_none());
    let visible = h.coordinator.visible_errors();
    assert_eq!(visible.len(), 1);
    assert!(visible[0].1.contains("preferences.json"));
}

// ===== Path resolution =====

#[test]
fn test_support_path_round_trip() {
    let dirs = TempDir::new().unwrap();
    let paths = SupportPaths::with_root(dirs.path());

    let created = paths.resolve(&["Haven", "Logs"], true).unwrap();
    assert!(created.is_dir());

    let resolved = paths.resolve(&["Haven", "Logs"], false).unwrap();
    assert_eq!(resolved, created);

    assert!(matches!(
        paths.resolve(&["Haven", "Missing"], false),
        Err(CoordinatorError::NotFound { .. })
    ));
}

#[test]
fn test_coordinator_exposes_path_resolvers() {
    let h = harness(false, false);

    let logs = h
        .coordinator
        .context()
        .support_paths()
        .resolve(&["Logs"], true)
        .unwrap();
    assert!(logs.is_dir());

    assert!(matches!(
        h.coordinator.context().bundle().file("missing.png"),
        Err(CoordinatorError::ResourceNotFound { .. })
    ));
}
