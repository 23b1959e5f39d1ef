use log::{debug, warn};
use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Refusing to open an empty link")]
    EmptyUrl,
    #[error("Failed to launch {opener} for {url}: {source}")]
    Spawn {
        opener: &'static str,
        url: String,
        #[source]
        source: io::Error,
    },
}

/// Opens anchor links outside the simulation
pub trait Navigator {
    fn open(&mut self, url: &str) -> Result<(), NavigationError>;
}

/// Start `cmd` and wait for it on a background thread so the exited child never lingers
fn spawn_reaped(cmd: &mut Command) -> io::Result<JoinHandle<io::Result<ExitStatus>>> {
    let mut child = cmd.spawn()?;
    Ok(thread::spawn(move || child.wait()))
}

/// Hands the link to the operating system's default opener without waiting on it
#[derive(Debug, Default)]
pub struct SystemNavigator;

impl SystemNavigator {
    fn command(url: &str) -> (&'static str, Command) {
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            ("open", cmd)
        } else if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", url]);
            ("cmd", cmd)
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            ("xdg-open", cmd)
        }
    }
}

impl Navigator for SystemNavigator {
    fn open(&mut self, url: &str) -> Result<(), NavigationError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(NavigationError::EmptyUrl);
        }

        let (opener, mut cmd) = Self::command(url);
        // Opener output would land on top of the TUI
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        spawn_reaped(&mut cmd).map_err(|source| NavigationError::Spawn {
            opener,
            url: url.to_string(),
            source,
        })?;
        debug!("Opened {} with {}", url, opener);
        Ok(())
    }
}

/// Open `url`, logging instead of propagating any failure
pub fn open_logged(navigator: &mut dyn Navigator, url: &str) -> bool {
    match navigator.open(url) {
        Ok(()) => true,
        Err(e) => {
            warn!("Navigation failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Navigator that records links and optionally fails
    #[derive(Debug, Default)]
    pub struct RecordingNavigator {
        pub opened: Vec<String>,
        pub fail: bool,
    }

    impl Navigator for RecordingNavigator {
        fn open(&mut self, url: &str) -> Result<(), NavigationError> {
            if self.fail {
                return Err(NavigationError::Spawn {
                    opener: "test",
                    url: url.to_string(),
                    source: io::Error::new(io::ErrorKind::PermissionDenied, "blocked"),
                });
            }
            self.opened.push(url.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingNavigator;
    use super::*;

    #[test]
    fn test_empty_url_rejected() {
        let mut nav = SystemNavigator;
        assert!(matches!(nav.open("   "), Err(NavigationError::EmptyUrl)));
    }

    #[test]
    fn test_open_logged_swallows_failure() {
        let mut nav = RecordingNavigator {
            fail: true,
            ..Default::default()
        };
        assert!(!open_logged(&mut nav, "https://example.com"));
        assert!(nav.opened.is_empty());

        nav.fail = false;
        assert!(open_logged(&mut nav, "https://example.com"));
        assert_eq!(nav.opened, vec!["https://example.com".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_opener_process_is_reaped() {
        let mut cmd = Command::new("true");
        cmd.stdout(Stdio::null());
        let reaper = spawn_reaped(&mut cmd).unwrap();
        let status = reaper.join().unwrap().unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_missing_opener_fails_to_spawn() {
        let mut cmd = Command::new("wavefunctions-no-such-opener");
        let err = spawn_reaped(&mut cmd).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_spawn_error_message_names_link() {
        let err = NavigationError::Spawn {
            opener: "xdg-open",
            url: "https://example.com".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("xdg-open"));
        assert!(msg.contains("https://example.com"));
    }
}
