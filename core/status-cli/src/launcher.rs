//! Opens `steam://` URIs with the platform's URI handler.

use std::process::{Command, Stdio};

use steam_status_core::{ActionLauncher, Result, StatusError};

/// Hands URIs to `open`, `xdg-open` or `cmd /C start` without waiting for
/// the handler to finish.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

#[cfg(target_os = "macos")]
fn opener(uri: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(uri);
    command
}

#[cfg(target_os = "windows")]
fn opener(uri: &str) -> Command {
    let mut command = Command::new("cmd");
    // The empty argument is the window title `start` expects first.
    command.args(["/C", "start", "", uri]);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener(uri: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(uri);
    command
}

impl ActionLauncher for SystemLauncher {
    fn launch(&self, uri: &str) -> Result<()> {
        let mut command = opener(uri);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
            .spawn()
            .map(|_| tracing::debug!(uri, "Launched status URI"))
            .map_err(|err| StatusError::ExternalAction {
                target: uri.to_string(),
                details: err.to_string(),
            })
    }
}
