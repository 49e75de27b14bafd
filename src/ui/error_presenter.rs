//! Queued, per-anchor error presentation.
//!
//! The presenter owns the policy that makes error display predictable: at
//! most one visible presentation per anchor, strict FIFO among presentations
//! queued against the same anchor, and no ordering at all between distinct
//! anchors. Callers schedule a presentation and return immediately; the GUI
//! layer renders whatever `visible` reports each frame and feeds the user's
//! dismissal back through [`ErrorPresenter::dismiss`].
//!
//! Dismissal returns the [`Presentation`] instead of running its completion
//! in place, so the owner can invoke the completion after releasing any lock
//! guarding the presenter. A completion is therefore free to call back into
//! the coordinator.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::errors::CoordinatorError;
use crate::ui::Anchor;

/// Response chosen by the user when dismissing a presented surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserResponse {
    /// The user confirmed (OK, Quit, ...).
    Affirmative,
    /// The user declined (Cancel, ...).
    Negative,
    /// The surface went away without an explicit choice.
    Dismissed,
}

type Completion = Box<dyn FnOnce(UserResponse) + Send>;

/// A failure waiting to be shown against an anchor.
///
/// Transient: created per failure, consumed once the user dismisses the
/// presented surface. `anchor` is resolved to the presenter's default (the
/// main view) when absent.
#[derive(Debug)]
pub struct ErrorEvent {
    pub error: CoordinatorError,
    pub message: String,
    pub anchor: Option<Anchor>,
}

impl ErrorEvent {
    /// Event whose message is the error's own rendering.
    pub fn new(error: CoordinatorError, anchor: Option<Anchor>) -> Self {
        let message = error.to_string();
        Self {
            error,
            message,
            anchor,
        }
    }

    /// Event with a hand-written message replacing the error's rendering.
    pub fn with_message(
        error: CoordinatorError,
        message: impl Into<String>,
        anchor: Option<Anchor>,
    ) -> Self {
        Self {
            error,
            message: message.into(),
            anchor,
        }
    }
}

/// A scheduled presentation and its at-most-once completion.
///
/// Handed back to the caller on dismissal; [`finish`](Self::finish) fires
/// the completion with the user's response. If the presentation is dropped
/// without finishing (window closed programmatically, shutdown), the drop
/// guard still fires the completion with [`UserResponse::Dismissed`], so the
/// original caller observes exactly one invocation either way.
pub struct Presentation {
    event: ErrorEvent,
    completion: Option<Completion>,
}

impl Presentation {
    pub fn event(&self) -> &ErrorEvent {
        &self.event
    }

    /// Fires the completion, if any, with the user's response.
    pub fn finish(mut self, response: UserResponse) {
        if let Some(completion) = self.completion.take() {
            completion(response);
        }
    }
}

impl Drop for Presentation {
    fn drop(&mut self) {
        if let Some(completion) = self.completion.take() {
            completion(UserResponse::Dismissed);
        }
    }
}

/// Serializes error presentations per anchor.
pub struct ErrorPresenter {
    /// Anchor used when an event does not name one.
    default_anchor: Anchor,

    /// The one visible presentation per anchor, if any.
    visible: HashMap<Anchor, Presentation>,

    /// FIFO of presentations waiting behind the visible one, per anchor.
    queued: HashMap<Anchor, VecDeque<Presentation>>,
}

impl ErrorPresenter {
    /// Creates a presenter that falls back to `default_anchor` (normally the
    /// main view) for events without an explicit anchor.
    pub fn new(default_anchor: Anchor) -> Self {
        Self {
            default_anchor,
            visible: HashMap::new(),
            queued: HashMap::new(),
        }
    }

    /// Schedules `event` for display and returns immediately.
    pub fn present(&mut self, event: ErrorEvent) {
        self.enqueue(Presentation {
            event,
            completion: None,
        });
    }

    /// Schedules `event` and registers a completion invoked exactly once with
    /// the user's response, after the presentation goes away.
    pub fn present_with(
        &mut self,
        event: ErrorEvent,
        completion: impl FnOnce(UserResponse) + Send + 'static,
    ) {
        self.enqueue(Presentation {
            event,
            completion: Some(Box::new(completion)),
        });
    }

    fn enqueue(&mut self, mut presentation: Presentation) {
        let anchor = *presentation
            .event
            .anchor
            .get_or_insert(self.default_anchor);
        if self.visible.contains_key(&anchor) {
            debug!(?anchor, message = %presentation.event.message, "queueing error behind visible one");
            self.queued.entry(anchor).or_default().push_back(presentation);
        } else {
            debug!(?anchor, message = %presentation.event.message, "presenting error");
            self.visible.insert(anchor, presentation);
        }
    }

    /// The event currently visible on `anchor`, if any.
    pub fn visible(&self, anchor: Anchor) -> Option<&ErrorEvent> {
        self.visible.get(&anchor).map(Presentation::event)
    }

    /// Anchors that currently have a visible presentation.
    pub fn visible_anchors(&self) -> Vec<Anchor> {
        let mut anchors: Vec<Anchor> = self.visible.keys().copied().collect();
        anchors.sort();
        anchors
    }

    /// Number of presentations waiting behind the visible one on `anchor`.
    pub fn queued_len(&self, anchor: Anchor) -> usize {
        self.queued.get(&anchor).map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty() && self.queued.is_empty()
    }

    /// Removes the visible presentation on `anchor`, promoting the next
    /// queued one, and hands it back for finishing.
    ///
    /// Returns None if nothing was visible on `anchor`.
    #[must_use = "finish the returned presentation so its completion fires with the user's response"]
    pub fn dismiss(&mut self, anchor: Anchor) -> Option<Presentation> {
        let dismissed = self.visible.remove(&anchor)?;

        if let Some(queue) = self.queued.get_mut(&anchor) {
            if let Some(next) = queue.pop_front() {
                self.visible.insert(anchor, next);
            }
            if self.queued.get(&anchor).is_some_and(VecDeque::is_empty) {
                self.queued.remove(&anchor);
            }
        }
        Some(dismissed)
    }

    /// Tears down every presentation, visible and queued, and hands them all
    /// back for finishing. Used on termination and on session teardown.
    #[must_use = "finish the returned presentations so their completions fire"]
    pub fn dismiss_all(&mut self) -> Vec<Presentation> {
        let mut torn_down: Vec<Presentation> = self.visible.drain().map(|(_, p)| p).collect();
        for (_, queue) in self.queued.drain() {
            torn_down.extend(queue);
        }
        torn_down
    }
}
