//! Platform integration: OS shell, support paths, bundled resources.

mod bundle;
mod shell;
mod support_paths;

pub use bundle::BundleResources;
pub use shell::{parse_url, Shell, SystemShell};
pub use support_paths::SupportPaths;
