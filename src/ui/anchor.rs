//! Anchors and view descriptors.
//!
//! An [`Anchor`] identifies the visual surface a presentation (error, sheet,
//! confirmation) is positioned relative to. The coordinator never interprets
//! anchors beyond equality; the GUI layer decides what each one looks like.

use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identity of a visual surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Anchor(u64);

static NEXT_ANCHOR: AtomicU64 = AtomicU64::new(1);

impl Anchor {
    /// Allocates a fresh anchor, distinct from every previously allocated one.
    pub fn new() -> Self {
        Anchor(NEXT_ANCHOR.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the root UI surface, the default anchor for presentations.
pub type ViewHandle = Anchor;

/// Plain description of the content hosted by a transient surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub title: String,
}

impl ViewDescriptor {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

/// Requested sheet dimensions in logical points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetSize {
    pub width: f32,
    pub height: f32,
}

impl SheetSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}
