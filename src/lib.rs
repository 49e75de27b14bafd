//! Haven desktop client: application lifecycle coordination.
//!
//! The crate is organized around one process-wide [`AppCoordinator`] that
//! mediates startup/shutdown, error presentation, modal sheets and outbound
//! URL handling, while holding the shared [`ApiClient`] handle the rest of
//! the application talks through:
//! - `app/` - the coordinator, its startup context, settings persistence
//! - `ui/` - anchors, the error presenter, the sheet controller
//! - `platform/` - OS shell, support paths, bundled resources
//!
//! The GUI shell lives in the `haven-gui` binary and drives the coordinator
//! exclusively through the [`AppViewDelegate`] contract.

pub mod api;
pub mod app;
pub mod errors;
pub mod platform;
pub mod ui;

// Export the coordinator surface
pub use app::{
    AppContext, AppCoordinator, AppViewDelegate, ProcessTerminator, QuitState, RepaintHandle,
    SessionState, Settings, Terminator,
};

// Export the presentation protocol
pub use ui::{
    Anchor, ErrorEvent, ErrorPresenter, Presentation, SheetController, SheetDisposer,
    SheetSession, SheetSize, UserResponse, ViewDescriptor, ViewHandle,
};

// Export collaborators and platform seams
pub use api::{ApiClient, NoopApiClient};
pub use errors::CoordinatorError;
pub use platform::{parse_url, BundleResources, Shell, SupportPaths, SystemShell};
