//! Process-wide dependencies handed to the coordinator at startup.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::platform::{BundleResources, SupportPaths};
use crate::ui::{Anchor, ViewHandle};

/// Everything the coordinator needs from the surrounding process.
///
/// Built once at application launch and owned by the coordinator for the
/// lifetime of the process. Holding dependencies here, instead of in ambient
/// globals, is what lets the test suite construct throwaway coordinators
/// with doubles.
pub struct AppContext {
    api_client: Arc<dyn ApiClient>,
    main_view: Anchor,
    support_paths: SupportPaths,
    bundle: BundleResources,
}

impl AppContext {
    pub fn new(
        api_client: Arc<dyn ApiClient>,
        support_paths: SupportPaths,
        bundle: BundleResources,
    ) -> Self {
        Self {
            api_client,
            main_view: Anchor::new(),
            support_paths,
            bundle,
        }
    }

    /// Shared handle to the network client. Read-mostly; only the logout
    /// path asks it to tear anything down.
    pub fn api_client(&self) -> &Arc<dyn ApiClient> {
        &self.api_client
    }

    /// Root UI surface, the default anchor for presentations.
    pub fn main_view(&self) -> ViewHandle {
        self.main_view
    }

    pub fn support_paths(&self) -> &SupportPaths {
        &self.support_paths
    }

    pub fn bundle(&self) -> &BundleResources {
        &self.bundle
    }
}
