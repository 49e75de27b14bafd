//! Modal sheet lifecycle.
//!
//! A sheet is a transient modal surface hosted by an anchor. The controller
//! linearizes open/close per anchor: an anchor hosts at most one live sheet,
//! and a second open request against an occupied anchor is rejected with
//! [`CoordinatorError::SheetAlreadyOpen`]. Closing goes through a
//! [`SheetDisposer`], a thread-safe idempotent handle; the UI loop observes
//! fired disposers through [`SheetController::prune`] once per frame.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::errors::CoordinatorError;
use crate::ui::{Anchor, SheetSize, ViewDescriptor};

/// Single-use cancellation handle for an open sheet.
///
/// Invoking [`dispose`](Self::dispose) more than once is a no-op. The handle
/// may be cloned so a close control inside the sheet can share it with the
/// original caller; all clones refer to the same sheet.
#[derive(Clone)]
pub struct SheetDisposer {
    close_requested: Arc<AtomicBool>,
}

impl SheetDisposer {
    /// Requests the sheet be closed. Safe from any thread, any number of
    /// times; the sheet is removed by the next `prune` pass.
    pub fn dispose(&self) {
        if !self.close_requested.swap(true, Ordering::SeqCst) {
            debug!("sheet disposer fired");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.close_requested.load(Ordering::SeqCst)
    }
}

/// One open modal sheet bound to an anchor.
pub struct SheetSession {
    descriptor: ViewDescriptor,
    size: SheetSize,
    anchor: Anchor,
    has_close_control: bool,
    close_requested: Arc<AtomicBool>,
}

impl SheetSession {
    pub fn descriptor(&self) -> &ViewDescriptor {
        &self.descriptor
    }

    pub fn size(&self) -> SheetSize {
        self.size
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Whether the sheet was opened with a close control the UI must render.
    pub fn has_close_control(&self) -> bool {
        self.has_close_control
    }

    /// Disposer clone for wiring to the session's close control.
    pub fn disposer(&self) -> SheetDisposer {
        SheetDisposer {
            close_requested: Arc::clone(&self.close_requested),
        }
    }
}

/// Registry of open sheets, at most one per anchor.
pub struct SheetController {
    open: HashMap<Anchor, SheetSession>,
}

impl SheetController {
    pub fn new() -> Self {
        Self {
            open: HashMap::new(),
        }
    }

    /// Opens a sheet hosting `descriptor`, sized `size`, anchored at
    /// `anchor`. When `with_close_control` is set the UI renders a close
    /// control wired to the session's disposer.
    ///
    /// Fails with `SheetAlreadyOpen` if `anchor` already hosts a sheet; the
    /// existing sheet must be disposed first.
    pub fn open(
        &mut self,
        descriptor: ViewDescriptor,
        size: SheetSize,
        anchor: Anchor,
        with_close_control: bool,
    ) -> Result<SheetDisposer, CoordinatorError> {
        if self.open.contains_key(&anchor) {
            return Err(CoordinatorError::SheetAlreadyOpen { anchor });
        }

        debug!(?anchor, title = %descriptor.title, "opening sheet");
        let close_requested = Arc::new(AtomicBool::new(false));
        let disposer = SheetDisposer {
            close_requested: Arc::clone(&close_requested),
        };
        self.open.insert(
            anchor,
            SheetSession {
                descriptor,
                size,
                anchor,
                has_close_control: with_close_control,
                close_requested,
            },
        );
        Ok(disposer)
    }

    pub fn session(&self, anchor: Anchor) -> Option<&SheetSession> {
        self.open.get(&anchor)
    }

    pub fn is_open(&self, anchor: Anchor) -> bool {
        self.open.contains_key(&anchor)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Calls `f` for every open session. Rendering hook for the UI loop.
    pub fn for_each(&self, mut f: impl FnMut(&SheetSession)) {
        for session in self.open.values() {
            f(session);
        }
    }

    /// Removes sessions whose disposer fired since the last pass.
    /// Returns how many were closed.
    pub fn prune(&mut self) -> usize {
        let before = self.open.len();
        self.open
            .retain(|_, session| !session.close_requested.load(Ordering::SeqCst));
        before - self.open.len()
    }

    /// Force-closes every open sheet. Process termination and session
    /// teardown both end up here.
    pub fn close_all(&mut self) {
        if !self.open.is_empty() {
            debug!(count = self.open.len(), "force-closing open sheets");
        }
        self.open.clear();
    }
}

impl Default for SheetController {
    fn default() -> Self {
        Self::new()
    }
}
