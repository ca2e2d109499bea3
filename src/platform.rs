//! Desktop backends that shell out to the platform's automation tools.
//!
//! macOS goes through `osascript` (System Events), Linux through `xdotool`.

use std::io;
use std::process::{Command, Output};

use regex::Regex;

use crate::error::TriggerError;
use crate::trigger::{Activator, Key, KeyAction, KeyEventSink, Modifier};

/// osascript error numbers that mean the process lacks Accessibility trust.
const DENIED_CODES: [i32; 3] = [1002, -1719, -25211];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    AppleScript,
    Xdotool,
    Unsupported,
}

impl Backend {
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Backend::AppleScript
        } else if cfg!(target_os = "linux") {
            Backend::Xdotool
        } else {
            Backend::Unsupported
        }
    }

    fn tool(self) -> &'static str {
        match self {
            Backend::AppleScript => "osascript",
            Backend::Xdotool => "xdotool",
            Backend::Unsupported => "none",
        }
    }

    /// Builds the command that focuses `app`, or `None` if unsupported.
    pub fn activation_command(self, app: &str) -> Option<Command> {
        match self {
            Backend::AppleScript => {
                let mut cmd = Command::new("osascript");
                cmd.arg("-e")
                    .arg(format!("tell application \"{}\" to activate", app));
                Some(cmd)
            }
            Backend::Xdotool => {
                let mut cmd = Command::new("xdotool");
                cmd.args(["search", "--name", app, "windowactivate"]);
                Some(cmd)
            }
            Backend::Unsupported => None,
        }
    }

    /// Builds the command for one key transition, or `None` if unsupported.
    pub fn key_command(self, key: Key, action: KeyAction) -> Option<Command> {
        match self {
            Backend::AppleScript => {
                let verb = match action {
                    KeyAction::Down => "key down",
                    KeyAction::Up => "key up",
                };
                let target = match key {
                    Key::Modifier(Modifier::Command) => "command".to_string(),
                    Key::Modifier(Modifier::Control) => "control".to_string(),
                    Key::Char(c) => format!("\"{}\"", c),
                };
                let mut cmd = Command::new("osascript");
                cmd.arg("-e").arg(format!(
                    "tell application \"System Events\" to {} {}",
                    verb, target
                ));
                Some(cmd)
            }
            Backend::Xdotool => {
                let verb = match action {
                    KeyAction::Down => "keydown",
                    KeyAction::Up => "keyup",
                };
                let target = match key {
                    Key::Modifier(Modifier::Command) => "super".to_string(),
                    Key::Modifier(Modifier::Control) => "ctrl".to_string(),
                    Key::Char(c) => c.to_string(),
                };
                let mut cmd = Command::new("xdotool");
                cmd.arg(verb).arg(target);
                Some(cmd)
            }
            Backend::Unsupported => None,
        }
    }
}

/// Real desktop driven through [`Backend`] commands.
pub struct SystemDesktop {
    backend: Backend,
}

impl SystemDesktop {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    pub fn detect() -> Self {
        Self::new(Backend::detect())
    }
}

impl Activator for SystemDesktop {
    fn activate(&mut self, app: &str) -> Result<(), TriggerError> {
        let failed = |reason: String| TriggerError::Activation {
            app: app.to_string(),
            reason,
        };
        let Some(mut cmd) = self.backend.activation_command(app) else {
            return Err(failed(unsupported()));
        };
        let output = cmd
            .output()
            .map_err(|e| failed(spawn_reason(self.backend, &e)))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(failed(stderr_reason(&output)))
        }
    }
}

impl KeyEventSink for SystemDesktop {
    fn key_event(&mut self, key: Key, action: KeyAction) -> Result<(), TriggerError> {
        let Some(mut cmd) = self.backend.key_command(key, action) else {
            return Err(TriggerError::Synthesis {
                reason: unsupported(),
            });
        };
        let output = cmd.output().map_err(|e| TriggerError::Synthesis {
            reason: spawn_reason(self.backend, &e),
        })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(classify_failure(&stderr_reason(&output)))
        }
    }
}

/// Maps a failed key command's stderr to a trigger error.
pub fn classify_failure(stderr: &str) -> TriggerError {
    let denied = error_number(stderr)
        .map(|code| DENIED_CODES.contains(&code))
        .unwrap_or(false)
        || stderr.contains("not allowed");
    if denied {
        TriggerError::PermissionDenied {
            reason: stderr.to_string(),
        }
    } else {
        TriggerError::Synthesis {
            reason: stderr.to_string(),
        }
    }
}

/// Pulls the trailing `(-1719)` style error number out of osascript output.
fn error_number(stderr: &str) -> Option<i32> {
    Regex::new(r"\((-?\d+)\)\s*$")
        .ok()
        .and_then(|re| re.captures(stderr.trim_end()))
        .and_then(|caps| caps[1].parse().ok())
}

fn stderr_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exited with {}", output.status)
    } else {
        stderr
    }
}

fn spawn_reason(backend: Backend, err: &io::Error) -> String {
    if err.kind() == io::ErrorKind::NotFound {
        format!("{} is not installed or not on PATH", backend.tool())
    } else {
        format!("failed to run {}: {}", backend.tool(), err)
    }
}

fn unsupported() -> String {
    format!("{} is not supported", std::env::consts::OS)
}
