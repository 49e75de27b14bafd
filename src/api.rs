//! External API-client collaborator.
//!
//! Transport and RPC semantics live in their own subsystem; the coordinator
//! only holds a shared handle and asks for session teardown during logout.

use anyhow::Result;

/// Network/API client the rest of the application talks through.
///
/// Implementations are expected to block; the coordinator always invokes
/// them from a background thread and marshals the result back onto the UI
/// context.
pub trait ApiClient: Send + Sync {
    /// Tears down the authenticated session on the service side.
    fn end_session(&self) -> Result<()>;
}

/// Stand-in client used by the GUI shell until the RPC transport is wired in.
pub struct NoopApiClient;

impl ApiClient for NoopApiClient {
    fn end_session(&self) -> Result<()> {
        Ok(())
    }
}
