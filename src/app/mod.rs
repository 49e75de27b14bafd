//! Application-level coordination for the Haven desktop client.
//!
//! This module contains the lifecycle coordinator, the startup context it
//! owns, and settings persistence for the GUI shell.

mod context;
mod coordinator;
mod settings;

pub use context::AppContext;
pub use coordinator::{
    AppCoordinator, AppViewDelegate, ProcessTerminator, QuitState, RepaintHandle, SessionState,
    Terminator,
};
pub use settings::Settings;
