use thiserror::Error;

/// Failures surfaced by the adb bridge layer.
///
/// `NotFound` and `Unauthorized` are fatal to the current device session;
/// everything else is scoped to a single call and handled by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdbError {
    #[error(
        "adb not found. Install Android SDK platform-tools and ensure 'adb' is on PATH \
         (macOS: brew install android-platform-tools, Linux: sudo apt install adb)"
    )]
    NotFound,

    #[error("adb command timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error(
        "device {device_id} is unauthorized. Accept the USB debugging prompt on the device, \
         then refresh"
    )]
    Unauthorized { device_id: String },

    #[error("device {device_id} disconnected")]
    Unreachable { device_id: String },

    #[error("adb exited with status {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("failed to launch adb: {message}")]
    Spawn { message: String },
}

impl AdbError {
    /// True when the error means the device vanished mid-call and any
    /// in-flight batch must stop enumerating further pairs.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, AdbError::Unreachable { .. })
    }
}

/// Failures writing an audit report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report already exists: {path}")]
    AlreadyExists { path: String },

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Non-fatal note attached to a catalog load when adb output for one item
/// could not be used and a safe default was substituted instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    pub context: String,
    pub snippet: String,
}

impl ParseWarning {
    pub fn new(context: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            snippet: snippet.into(),
        }
    }
}
