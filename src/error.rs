use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while tracking the watch target.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Cannot watch {}: {source}", .path.display())]
    PathNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No .lua or .p8 files in {}; waiting for new ones", .path.display())]
    EmptyDirectory { path: PathBuf },

    #[error("Cannot read {}: {source}", .path.display())]
    TransientFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl WatchError {
    /// Only a missing watch target stops the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WatchError::PathNotFound { .. })
    }
}

/// Errors raised while bringing the target app forward or sending the
/// reload shortcut.
#[derive(Error, Debug)]
pub enum TriggerError {
    #[error("Could not activate {app}: {reason}")]
    Activation { app: String, reason: String },

    #[error("Not permitted to send keystrokes: {reason}")]
    PermissionDenied { reason: String },

    #[error("Failed to send keystroke: {reason}")]
    Synthesis { reason: String },
}

impl TriggerError {
    /// What the operator has to do out-of-band, if anything.
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            TriggerError::PermissionDenied { .. } if cfg!(target_os = "macos") => Some(
                "Grant Accessibility permission to your terminal in System Settings > \
                 Privacy & Security > Accessibility. No restart is needed.",
            ),
            TriggerError::PermissionDenied { .. } => Some(
                "Make sure the watcher can reach your X display (check $DISPLAY) and \
                 that input injection is allowed.",
            ),
            _ => None,
        }
    }
}
