//! Operating-system shell abstraction.
//!
//! The coordinator never talks to the OS directly; it goes through the
//! [`Shell`] trait so tests can substitute a recording double. The production
//! [`SystemShell`] hands URLs to the platform's default external handler.

use std::io;
use std::process::Command;

use tracing::debug;
use url::Url;

use crate::errors::CoordinatorError;

/// Parses a user- or UI-supplied URL string.
pub fn parse_url(input: &str) -> Result<Url, CoordinatorError> {
    Url::parse(input).map_err(|source| CoordinatorError::InvalidUrl {
        input: input.to_string(),
        source,
    })
}

/// Shell operations the coordinator depends on.
pub trait Shell: Send + Sync {
    /// Opens `url` in the platform's default external handler.
    ///
    /// May block on the launcher process; the coordinator invokes this from
    /// a background thread.
    fn open_url(&self, url: &Url) -> io::Result<()>;
}

/// Shell backed by the platform's own URL dispatcher.
pub struct SystemShell;

impl Shell for SystemShell {
    fn open_url(&self, url: &Url) -> io::Result<()> {
        debug!(%url, "dispatching URL to system handler");
        let status = launcher(url.as_str()).status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!("URL launcher exited with {status}"),
            ))
        }
    }
}

#[cfg(target_os = "macos")]
fn launcher(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(target_os = "windows")]
fn launcher(url: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", url]);
    command
}

#[cfg(all(unix, not(target_os = "macos")))]
fn launcher(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_accepts_absolute_urls() {
        let url = parse_url("https://example.com/docs").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        let err = parse_url("not a url").unwrap_err();
        assert!(matches!(err, CoordinatorError::InvalidUrl { .. }));
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_parse_url_rejects_relative_paths() {
        assert!(parse_url("/just/a/path").is_err());
    }
}
