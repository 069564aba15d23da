use std::time::Duration;

use crate::app::adb::runner::{run_command_with_timeout, CommandOutput};
use crate::app::error::AdbError;
use crate::app::models::ActionKind;

/// Seam between the components that issue adb commands and the process
/// runner, so catalog and engine can be exercised against fakes.
///
/// `run` resolves to `Ok` only for a zero exit status; non-zero exits are
/// classified into typed errors. No retries at this layer, ever.
pub trait BridgeRunner {
    fn run(&self, args: &[String], timeout: Duration) -> Result<CommandOutput, AdbError>;
}

pub struct AdbClient {
    program: String,
}

impl AdbClient {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl BridgeRunner for AdbClient {
    fn run(&self, args: &[String], timeout: Duration) -> Result<CommandOutput, AdbError> {
        let output = run_command_with_timeout(&self.program, args, timeout)?;
        let exit_code = output.exit_code.unwrap_or(-1);
        if exit_code != 0 {
            return Err(classify_failure(
                device_id_from_args(args),
                exit_code,
                &output.stderr,
            ));
        }
        Ok(output)
    }
}

/// Maps a non-zero adb exit onto the error taxonomy by scanning stderr.
/// adb reports a vanished device and a rejected one through text, not
/// distinct exit codes.
pub fn classify_failure(device_id: Option<&str>, code: i32, stderr: &str) -> AdbError {
    let lower = stderr.to_lowercase();
    let device_id = device_id.unwrap_or("unknown").to_string();

    if lower.contains("device")
        && (lower.contains("not found")
            || lower.contains("offline")
            || lower.contains("disconnected"))
    {
        return AdbError::Unreachable { device_id };
    }
    if lower.contains("unauthorized")
        || lower.contains("permission denied")
        || lower.contains("insufficient permissions")
    {
        return AdbError::Unauthorized { device_id };
    }
    AdbError::NonZeroExit {
        code,
        stderr: stderr.trim().to_string(),
    }
}

fn device_id_from_args(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-s" {
            return iter.next().map(String::as_str);
        }
    }
    None
}

// Argument builders for every call the tool makes. Arguments stay a
// discrete list end to end; a package identifier is always exactly one
// argv entry regardless of its content.

pub fn devices_args() -> Vec<String> {
    vec!["devices".to_string(), "-l".to_string()]
}

pub fn getprop_args(device_id: &str, prop: &str) -> Vec<String> {
    shell_args(device_id, &["getprop", prop])
}

pub fn list_packages_args(device_id: &str) -> Vec<String> {
    shell_args(device_id, &["pm", "list", "packages"])
}

pub fn dump_package_args(device_id: &str, package: &str) -> Vec<String> {
    shell_args(device_id, &["dumpsys", "package", package])
}

pub fn list_users_args(device_id: &str) -> Vec<String> {
    shell_args(device_id, &["pm", "list", "users"])
}

pub fn set_enabled_args(
    device_id: &str,
    package: &str,
    action: ActionKind,
    user_id: u32,
) -> Vec<String> {
    match action {
        ActionKind::Enable => shell_args(device_id, &["pm", "enable", package]),
        ActionKind::Disable => shell_args(
            device_id,
            &["pm", "disable-user", "--user", &user_id.to_string(), package],
        ),
    }
}

pub fn package_path_args(device_id: &str, package: &str) -> Vec<String> {
    shell_args(device_id, &["pm", "path", package])
}

pub fn dir_size_args(device_id: &str, dir: &str) -> Vec<String> {
    shell_args(device_id, &["du", "-sh", dir])
}

fn shell_args(device_id: &str, tail: &[&str]) -> Vec<String> {
    let mut args = vec!["-s".to_string(), device_id.to_string(), "shell".to_string()];
    args.extend(tail.iter().map(|s| s.to_string()));
    args
}
