use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConnectionState {
    Device,
    Offline,
    Unauthorized,
    Bootloader,
    Recovery,
    Sideload,
    Unknown,
}

impl ConnectionState {
    /// Maps an `adb devices` state token. Unrecognized tokens become
    /// `Unknown` so the device is still listed rather than dropped.
    pub fn parse(token: &str) -> Self {
        match token.to_lowercase().as_str() {
            "device" => ConnectionState::Device,
            "offline" => ConnectionState::Offline,
            "unauthorized" => ConnectionState::Unauthorized,
            "bootloader" => ConnectionState::Bootloader,
            "recovery" => ConnectionState::Recovery,
            "sideload" => ConnectionState::Sideload,
            _ => ConnectionState::Unknown,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Device)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Device => "device",
            ConnectionState::Offline => "offline",
            ConnectionState::Unauthorized => "unauthorized",
            ConnectionState::Bootloader => "bootloader",
            ConnectionState::Recovery => "recovery",
            ConnectionState::Sideload => "sideload",
            ConnectionState::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub state: ConnectionState,
    pub model: String,
    pub manufacturer: String,
    pub android_version: String,
    pub sdk_level: u32,
}

impl Device {
    pub fn new(id: impl Into<String>, state: ConnectionState) -> Self {
        Self {
            id: id.into(),
            state,
            model: String::new(),
            manufacturer: String::new(),
            android_version: String::new(),
            sdk_level: 0,
        }
    }

    pub fn display_name(&self) -> String {
        if !self.manufacturer.is_empty() && !self.model.is_empty() {
            format!("{} {}", self.manufacturer, self.model)
        } else if !self.model.is_empty() {
            self.model.clone()
        } else {
            self.id.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PackageOrigin {
    User,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppPackage {
    pub package: String,
    pub enabled: bool,
    pub origin: PackageOrigin,
    pub size_mb: Option<f64>,
}

impl AppPackage {
    pub fn is_system(&self) -> bool {
        matches!(self.origin, PackageOrigin::System)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Owner,
    Secondary,
    Guest,
    WorkProfile,
}

/// Only the id is load-bearing; the role is informational and derived
/// from the user-record name on a best-effort basis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserAccount {
    pub id: u32,
    pub role: UserRole,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActionKind {
    Enable,
    Disable,
}

impl ActionKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::Enable => "Enable",
            ActionKind::Disable => "Disable",
        }
    }

    pub fn progress_label(&self) -> &'static str {
        match self {
            ActionKind::Enable => "Enabling",
            ActionKind::Disable => "Disabling",
        }
    }
}

/// Frozen input to one engine run. Constructed once at confirmation and
/// never mutated; the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationRequest {
    pub device_id: String,
    pub action: ActionKind,
    pub packages: Vec<String>,
    pub user_ids: Vec<u32>,
}

/// One (user, package) attempt. `message` carries the raw adb output
/// only on failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OperationOutcome {
    pub user_id: u32,
    pub package: String,
    pub succeeded: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Completed,
    Aborted,
}

/// Write-once aggregate of a batch run: every recorded outcome in
/// enumeration order, plus the originating request and the terminal
/// engine state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationResult {
    pub request: OperationRequest,
    pub outcomes: Vec<OperationOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub state: EngineState,
}

impl OperationResult {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{} attempted, {} succeeded, {} failed",
            self.attempted(),
            self.succeeded(),
            self.failed()
        )
    }
}
