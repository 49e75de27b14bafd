//! Error kinds produced by coordinator operations.
//!
//! Most of these are never returned to the original caller: the coordinator
//! converts them into [`crate::ui::ErrorEvent`]s and routes them through the
//! error presenter. The path and bundle resolvers are the exception — they
//! are usable before any UI exists and return these errors directly.

use std::path::PathBuf;

use crate::ui::Anchor;

/// Failure raised by a coordinator operation or one of its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// The string handed to `url_open_requested` does not parse as a URL.
    #[error("not a valid URL: {input}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    /// The OS shell could not dispatch the URL to the default handler.
    #[error("could not open {url} in the system handler")]
    ShellLaunchFailed {
        url: String,
        #[source]
        source: std::io::Error,
    },

    /// Creating a support directory failed (permissions, disk full, ...).
    #[error("could not create support directory {}", .path.display())]
    PathCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A support path was resolved without `create` and does not exist.
    #[error("support path {} does not exist", .path.display())]
    NotFound { path: PathBuf },

    /// No resource with the given name is bundled with the application.
    #[error("no bundled resource named {name:?}")]
    ResourceNotFound { name: String },

    /// A sheet open request hit an anchor that already hosts a sheet.
    #[error("a sheet is already open on {anchor:?}")]
    SheetAlreadyOpen { anchor: Anchor },

    /// The API client failed to tear down the session during logout.
    #[error("could not log out of the current session")]
    SessionTeardownFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
