//! Presentation protocol: anchors, error presentation, modal sheets.
//!
//! These types hold no rendering logic. The GUI layer reads their state each
//! frame and feeds user responses back in.

mod anchor;
mod error_presenter;
mod sheet_controller;

pub use anchor::{Anchor, SheetSize, ViewDescriptor, ViewHandle};
pub use error_presenter::{ErrorEvent, ErrorPresenter, Presentation, UserResponse};
pub use sheet_controller::{SheetController, SheetDisposer, SheetSession};
